//! store/kv — операции get / set / remove и поиск записей.
//!
//! Семантика:
//! - lookup идёт по областям в порядке ReadOnly -> Writable (writable
//!   ограничен free_space_offset); побеждает первое вхождение ключа;
//! - set существующего ключа требует равного data_size и заменяет запись
//!   на месте; нового — дописывает в free_space_offset;
//! - remove пишет tombstone (DELETE) поверх записи, сохраняя её данные:
//!   последующий set той же длины может заменить tombstone на месте;
//! - ключ с tombstone для get/remove отсутствует (второй remove -> NotFound);
//! - порча, встреченная при обходе, отдаётся вызывающему как DataCorrupt
//!   (после mount порча в середине области невозможна).

use crate::area::AreaIndex;
use crate::consts::{
    DELETE_FLAG, ILLEGAL_KEY_BYTES, MAX_DATA_SIZE, MAX_KEY_SIZE, RESILIENT_FLAG,
    SUPPORTED_USER_FLAGS,
};
use crate::error::{Result, StoreError};
use crate::record::{record_size, write_record, Decoded, RawRecord};
use crate::scan::AreaScan;

use super::PdbStore;

/// Найденная запись: где лежит и что содержит.
pub(crate) struct FoundRecord {
    pub area: AreaIndex,
    pub offset: u32,
    pub rec: RawRecord,
}

impl PdbStore {
    /// Получить значение ключа (копия данных с носителя).
    pub fn get(&self, key: &str) -> Result<Vec<u8>> {
        validate_key(key)?;
        let found = self.find_record(key.as_bytes())?.ok_or(StoreError::NotFound)?;
        if found.rec.flags & DELETE_FLAG != 0 {
            return Err(StoreError::NotFound);
        }
        Ok(found.rec.data)
    }

    /// Записать значение ключа. flags ⊆ {RESILIENT_FLAG}.
    pub fn set(&mut self, key: &str, data: &[u8], flags: u8) -> Result<()> {
        if flags & !SUPPORTED_USER_FLAGS != 0 {
            return Err(StoreError::InvalidArgument);
        }
        self.do_set(key, data, flags)
    }

    /// Удалить ключ: tombstone на месте записи с сохранением её данных.
    pub fn remove(&mut self, key: &str) -> Result<()> {
        self.do_set(key, &[], DELETE_FLAG)
    }

    fn do_set(&mut self, key: &str, data: &[u8], flags: u8) -> Result<()> {
        validate_key(key)?;
        if data.len() > MAX_DATA_SIZE {
            return Err(StoreError::InvalidArgument);
        }
        let key = key.as_bytes();
        let deleting = flags & DELETE_FLAG != 0;

        match self.find_record(key)? {
            Some(found) => {
                if found.area == AreaIndex::ReadOnly {
                    return Err(StoreError::KeyIsReadonly);
                }
                let tombstoned = found.rec.flags & DELETE_FLAG != 0;
                if deleting {
                    if tombstoned {
                        return Err(StoreError::NotFound);
                    }
                    // Данные записи сохраняются под tombstone
                    let existing = found.rec.data;
                    return self.commit_set(key, &existing, flags, found.offset, true);
                }
                if data.len() != found.rec.data.len() {
                    return Err(StoreError::InvalidArgument);
                }
                // Замена на месте; живая запись или tombstone — неважно,
                // длины совпадают.
                self.commit_set(key, data, flags, found.offset, true)
            }
            None => {
                if deleting {
                    return Err(StoreError::NotFound);
                }
                let writable_size = self.media.area(AreaIndex::Writable).size;
                if self.free_space_offset + record_size(key.len(), data.len()) > writable_size {
                    return Err(StoreError::MediaFull);
                }
                self.commit_set(key, data, flags, self.free_space_offset, false)
            }
        }
    }

    /// Общий хвост мутации: (staging ->) writable (-> очистка staging).
    fn commit_set(
        &mut self,
        key: &[u8],
        data: &[u8],
        flags: u8,
        offset: u32,
        replace_current: bool,
    ) -> Result<()> {
        let resilient = flags & RESILIENT_FLAG != 0;
        if resilient {
            self.stage_record(key, data, flags)?;
        }

        let next = write_record(
            &mut self.media,
            &self.endian,
            AreaIndex::Writable,
            key,
            data,
            flags,
            offset,
            replace_current,
        )?;
        if !replace_current {
            self.free_space_offset = next;
        }

        if resilient {
            self.clear_staging()?;
        }
        Ok(())
    }

    /// Первое вхождение ключа в порядке областей. Err(DataCorrupt) — обход
    /// наткнулся на битую запись.
    pub(crate) fn find_record(&self, key: &[u8]) -> Result<Option<FoundRecord>> {
        for area in [AreaIndex::ReadOnly, AreaIndex::Writable] {
            let limit = if area == AreaIndex::Writable {
                self.free_space_offset
            } else {
                self.media.area(area).size
            };
            let mut scan = AreaScan::new(area, limit);
            while let Some((offset, decoded)) = scan.next(&self.media, &self.endian)? {
                match decoded {
                    Decoded::Valid(rec) => {
                        if rec.key == key {
                            return Ok(Some(FoundRecord { area, offset, rec }));
                        }
                    }
                    Decoded::Corrupt(_) | Decoded::TotallyCorrupt => {
                        return Err(StoreError::DataCorrupt);
                    }
                }
            }
        }
        Ok(None)
    }
}

/// Синтаксис ключа: 1..=16 байт ASCII без " */?:;\"|<>\\".
pub(crate) fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() || key.len() > MAX_KEY_SIZE || !key.is_ascii() {
        return Err(StoreError::InvalidArgument);
    }
    if key.bytes().any(|b| ILLEGAL_KEY_BYTES.contains(&b)) {
        return Err(StoreError::InvalidArgument);
    }
    Ok(())
}
