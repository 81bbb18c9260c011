//! media — драйверы носителей и банки.
//!
//! Разделение:
//! - mod.rs — трейт MediaDriver (bank-absolute read/program/erase) и Bank
//!   (параметры банка + трансляция start_offset, bounds-проверки).
//! - ram.rs  — RamMedia: плоская память, для устройств с отображённым
//!   EEPROM/flash и для тестовых обвязок.
//! - file.rs — FileMedia: mmap-файл (memmap2) для host-side инструментов.
//!
//! Контракт драйвера (erase-before-program семантика):
//! - read никогда не разрушает данные;
//! - program обязан отказать, если хотя бы один целевой байт != erase_val;
//! - erase выставляет диапазон в erase_val;
//! - операции нулевой длины отклоняются.

use crate::error::{Result, StoreError};

pub mod file;
pub mod ram;

pub use file::FileMedia;
pub use ram::RamMedia;

/// Драйвер носителя. Адреса — абсолютные в пределах банка.
pub trait MediaDriver {
    fn read(&self, addr: u32, buf: &mut [u8]) -> Result<()>;
    fn program(&mut self, addr: u32, buf: &[u8]) -> Result<()>;
    fn erase(&mut self, addr: u32, size: u32) -> Result<()>;
}

/// Банк: непрерывный регион носителя с драйвером.
///
/// `start_offset` резервирует префикс банка (например, под код) — хранилище
/// его не трогает; все адреса областей считаются от него.
pub struct Bank {
    pub size: u32,
    pub start_offset: u32,
    pub erase_val: u8,
    driver: Box<dyn MediaDriver>,
}

impl Bank {
    pub fn new(size: u32, start_offset: u32, erase_val: u8, driver: Box<dyn MediaDriver>) -> Self {
        Self {
            size,
            start_offset,
            erase_val,
            driver,
        }
    }

    /// Доступный размер за вычетом зарезервированного префикса.
    #[inline]
    pub fn usable_size(&self) -> u32 {
        self.size.saturating_sub(self.start_offset)
    }

    /// Чтение по адресу относительно start_offset.
    pub(crate) fn read(&self, offset: u32, buf: &mut [u8]) -> Result<()> {
        let addr = self.checked_addr(offset, buf.len(), StoreError::ReadError)?;
        self.driver.read(addr, buf)
    }

    pub(crate) fn program(&mut self, offset: u32, buf: &[u8]) -> Result<()> {
        let addr = self.checked_addr(offset, buf.len(), StoreError::WriteError)?;
        self.driver.program(addr, buf)
    }

    pub(crate) fn erase(&mut self, offset: u32, size: u32) -> Result<()> {
        let addr = self.checked_addr(offset, size as usize, StoreError::WriteError)?;
        self.driver.erase(addr, size)
    }

    #[inline]
    fn checked_addr(&self, offset: u32, len: usize, err: StoreError) -> Result<u32> {
        let end = (self.start_offset as u64) + (offset as u64) + (len as u64);
        if len == 0 || end > self.size as u64 {
            return Err(err);
        }
        Ok(self.start_offset + offset)
    }
}

impl std::fmt::Debug for Bank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bank")
            .field("size", &self.size)
            .field("start_offset", &self.start_offset)
            .field("erase_val", &self.erase_val)
            .finish()
    }
}
