//! record — кодек записей (header + key + data, CRC-защита).
//!
//! Что здесь:
//! - encode_record: собрать полный on-media образ записи (чистая функция —
//!   её используют provisioning и тестовые обвязки).
//! - write_record: запрограммировать запись в область; при replace_current
//!   стирается только хвост от поля flags (data_size/key_size остаются на
//!   носителе, чтобы оборванная перезапись не ломала длину записи — запись
//!   станет локально-битой, но скан сможет пройти дальше).
//! - read_record: декодировать запись с трёхуровневой классификацией:
//!   Valid / Corrupt (длины правдоподобны, CRC не сошёлся) /
//!   TotallyCorrupt (длинам верить нельзя, скан не может продвинуться).

use crate::area::{AreaIndex, AreaMap};
use crate::consts::{
    MAX_DATA_SIZE, MAX_KEY_SIZE, REC_HDR_SIZE, REC_OFF_CRC32, REC_OFF_DATA_SIZE, REC_OFF_FLAGS,
    REC_OFF_KEY_SIZE,
};
use crate::crc::crc32_of_record_parts;
use crate::endian::HostEndian;
use crate::error::{Result, StoreError};

/// Полный размер записи на носителе.
#[inline]
pub fn record_size(key_len: usize, data_len: usize) -> u32 {
    (REC_HDR_SIZE + key_len + data_len) as u32
}

/// Декодированная запись (ключ и данные скопированы с носителя).
#[derive(Debug, Clone)]
pub struct RawRecord {
    pub key: Vec<u8>,
    pub data: Vec<u8>,
    pub flags: u8,
    /// Смещение сразу за записью — кандидат free_space_offset.
    pub next_offset: u32,
}

/// Результат декодирования по смещению.
#[derive(Debug)]
pub enum Decoded {
    /// CRC сошёлся.
    Valid(RawRecord),
    /// Длины правдоподобны, CRC нет; можно продвинуться на next_offset.
    Corrupt(RawRecord),
    /// Заголовок не помещается либо длины вне диапазона; продвигаться нельзя.
    TotallyCorrupt,
}

/// Собрать on-media образ записи: header с CRC + key + data.
pub fn encode_record(endian: &HostEndian, key: &[u8], data: &[u8], flags: u8) -> Vec<u8> {
    debug_assert!(!key.is_empty() && key.len() <= MAX_KEY_SIZE);
    debug_assert!(data.len() <= MAX_DATA_SIZE);

    let mut img = vec![0u8; REC_HDR_SIZE + key.len() + data.len()];
    endian.write_u16(
        &mut img[REC_OFF_DATA_SIZE..REC_OFF_DATA_SIZE + 2],
        data.len() as u16,
    );
    img[REC_OFF_KEY_SIZE] = key.len() as u8;
    img[REC_OFF_FLAGS] = flags;

    // CRC по media-образу header (без поля crc), затем key и data
    let crc = crc32_of_record_parts(&img[..REC_OFF_CRC32], key, data);
    endian.write_u32(&mut img[REC_OFF_CRC32..REC_OFF_CRC32 + 4], crc);

    img[REC_HDR_SIZE..REC_HDR_SIZE + key.len()].copy_from_slice(key);
    img[REC_HDR_SIZE + key.len()..].copy_from_slice(data);
    img
}

/// Записать запись в область по смещению. Возвращает смещение за записью.
///
/// replace_current: цель уже содержит запись того же ключа и той же длины.
/// Стираем и перепрограммируем только от поля flags — ведущие
/// data_size/key_size на носителе не меняются, поэтому обрыв питания между
/// erase и program оставляет запись length-readable.
pub fn write_record(
    media: &mut AreaMap,
    endian: &HostEndian,
    area: AreaIndex,
    key: &[u8],
    data: &[u8],
    flags: u8,
    offset: u32,
    replace_current: bool,
) -> Result<u32> {
    let total = record_size(key.len(), data.len());
    if (offset as u64) + (total as u64) > media.area(area).size as u64 {
        return Err(StoreError::MediaFull);
    }

    let img = encode_record(endian, key, data, flags);

    // Начало стирания/записи заголовка: 0 либо смещение поля flags.
    let hdr_start = if replace_current { REC_OFF_FLAGS } else { 0 };
    if replace_current {
        media.erase(area, offset + hdr_start as u32, total - hdr_start as u32)?;
    }

    media.program(area, offset + hdr_start as u32, &img[hdr_start..REC_HDR_SIZE])?;

    let mut off = offset + REC_HDR_SIZE as u32;
    media.program(area, off, key)?;
    off += key.len() as u32;

    if !data.is_empty() {
        media.program(area, off, data)?;
        off += data.len() as u32;
    }

    Ok(off)
}

/// Декодировать запись по смещению области.
///
/// Err — только ошибки чтения носителя; вся классификация целостности
/// возвращается в Decoded.
pub fn read_record(
    media: &AreaMap,
    endian: &HostEndian,
    area: AreaIndex,
    offset: u32,
) -> Result<Decoded> {
    let area_size = media.area(area).size;

    if (offset as u64) + (REC_HDR_SIZE as u64) > area_size as u64 {
        return Ok(Decoded::TotallyCorrupt);
    }

    let mut hdr = [0u8; REC_HDR_SIZE];
    media.read(area, offset, &mut hdr)?;

    let key_size = hdr[REC_OFF_KEY_SIZE] as usize;
    let data_size = endian.read_u16(&hdr[REC_OFF_DATA_SIZE..REC_OFF_DATA_SIZE + 2]) as usize;

    if key_size == 0 || key_size > MAX_KEY_SIZE || data_size > MAX_DATA_SIZE {
        return Ok(Decoded::TotallyCorrupt);
    }

    let mut off = offset + REC_HDR_SIZE as u32;
    if (off as u64) + ((key_size + data_size) as u64) > area_size as u64 {
        return Ok(Decoded::TotallyCorrupt);
    }

    let mut key = vec![0u8; key_size];
    media.read(area, off, &mut key)?;
    off += key_size as u32;

    let mut data = vec![0u8; data_size];
    if data_size > 0 {
        media.read(area, off, &mut data)?;
    }
    off += data_size as u32;

    let crc = crc32_of_record_parts(&hdr[..REC_OFF_CRC32], &key, &data);
    let stored = endian.read_u32(&hdr[REC_OFF_CRC32..REC_OFF_CRC32 + 4]);

    let rec = RawRecord {
        key,
        data,
        flags: hdr[REC_OFF_FLAGS],
        next_offset: off,
    };
    if crc == stored {
        Ok(Decoded::Valid(rec))
    } else {
        Ok(Decoded::Corrupt(rec))
    }
}
