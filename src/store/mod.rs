//! store — высокоуровневый API хранилища.
//!
//! Разделение по подмодулям:
//! - mod.rs     — хэндл PdbStore (банки, раскладка, free_space_offset),
//!                deinit/reset
//! - init.rs    — mount: скан readonly, раскладка областей, примирение
//!                staging, скан writable с усечением хвоста
//! - kv.rs      — find_record / get / set / remove, валидация ключей
//! - staging.rs — resilience engine: stage → commit → clear
//!
//! Всё скрытое глобальное состояние исходного дизайна (параметры банков,
//! карта областей, free_space_offset, признак endian) живёт в хэндле;
//! внешняя синхронизация — забота вызывающего кода.

pub mod init;
pub mod kv;
pub mod staging;

use crate::area::{AreaIndex, AreaMap};
use crate::endian::HostEndian;
use crate::error::Result;
use crate::media::Bank;

/// Хэндл смонтированного хранилища.
///
/// Конструируется `PdbStore::init` (mount); `deinit` размонтирует и отдаёт
/// банки назад. Данные из `get` копируются с носителя и от последующих
/// мутаций не зависят.
pub struct PdbStore {
    pub(crate) media: AreaMap,
    pub(crate) endian: HostEndian,
    pub(crate) free_space_offset: u32,
}

impl PdbStore {
    /// Размонтировать хранилище. Персистентное состояние не меняется;
    /// банки возвращаются вызывающему для повторного mount.
    pub fn deinit(self) -> Vec<Bank> {
        self.media.into_banks()
    }

    /// Полный сброс: стереть writable-область целиком и перемонтировать.
    /// Остаётся только readonly-представление.
    pub fn reset(&mut self) -> Result<()> {
        self.media.reset_area(AreaIndex::Writable, 0)?;
        self.mount()
    }

    /// Смещение, с которого начнётся следующий append.
    #[inline]
    pub fn free_space_offset(&self) -> u32 {
        self.free_space_offset
    }

    /// Размер writable-области (для расчёта вместимости в обвязках).
    #[inline]
    pub fn writable_size(&self) -> u32 {
        self.media.area(AreaIndex::Writable).size
    }
}
