//! endian — порядок байт медиа-формата.
//!
//! Multibyte-поля заголовков хранятся на носителе big-endian независимо от
//! хоста. Порядок хоста определяется динамически, одним probe-словом при
//! монтировании (не через cfg(target_endian): поведение должно оставаться
//! рантайм-детектируемым).

use byteorder::{ByteOrder, NativeEndian};

/// Порядок байт хоста, определённый probe-словом 0xABCD.
#[derive(Debug, Clone, Copy)]
pub struct HostEndian {
    big: bool,
}

impl HostEndian {
    /// Probe: если первый байт нативного образа 0xABCD равен 0xAB — хост BE.
    pub fn detect() -> Self {
        let probe: u16 = 0xABCD;
        Self {
            big: probe.to_ne_bytes()[0] == 0xAB,
        }
    }

    #[inline]
    pub fn is_big(&self) -> bool {
        self.big
    }

    #[inline]
    pub fn to_media_u16(&self, val: u16) -> u16 {
        if self.big {
            val
        } else {
            val.swap_bytes()
        }
    }

    /// Обратное преобразование совпадает с прямым (swap — инволюция).
    #[inline]
    pub fn from_media_u16(&self, val: u16) -> u16 {
        self.to_media_u16(val)
    }

    #[inline]
    pub fn to_media_u32(&self, val: u32) -> u32 {
        if self.big {
            val
        } else {
            val.swap_bytes()
        }
    }

    #[inline]
    pub fn from_media_u32(&self, val: u32) -> u32 {
        self.to_media_u32(val)
    }

    /// Прочитать u16 из media-байт (нативный образ + условный swap).
    #[inline]
    pub fn read_u16(&self, buf: &[u8]) -> u16 {
        self.from_media_u16(NativeEndian::read_u16(buf))
    }

    #[inline]
    pub fn write_u16(&self, buf: &mut [u8], val: u16) {
        NativeEndian::write_u16(buf, self.to_media_u16(val));
    }

    #[inline]
    pub fn read_u32(&self, buf: &[u8]) -> u32 {
        self.from_media_u32(NativeEndian::read_u32(buf))
    }

    #[inline]
    pub fn write_u32(&self, buf: &mut [u8], val: u32) {
        NativeEndian::write_u32(buf, self.to_media_u32(val));
    }
}
