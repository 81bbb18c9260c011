//! store/staging — resilience engine.
//!
//! Устойчивый set идёт в три шага: stage (копия записи в staging-область) ->
//! commit (запись в writable) -> clear (стирание staging). Обрыв питания в
//! любой точке оставляет носитель в одном из состояний, которые mount
//! (store/init) сводит либо к старому, либо к новому значению — третьего
//! не бывает:
//!
//! - обрыв до/во время stage: staging битый или пустой, writable нетронут;
//! - обрыв между stage и commit: staging валиден, mount делает replay;
//! - обрыв во время commit: запись в writable локально битая, mount
//!   перезаписывает её из staging;
//! - обрыв между commit и clear: replay идемпотентен (или, для нового
//!   ключа, запись уже найдена сканом — staging просто очищается);
//! - обрыв во время clear: mount стирает staging повторно.

use crate::area::AreaIndex;
use crate::error::Result;
use crate::record::{write_record, RawRecord};

use super::PdbStore;

impl PdbStore {
    /// Шаг 1: записать копию в staging (область к этому моменту стёрта).
    pub(crate) fn stage_record(&mut self, key: &[u8], data: &[u8], flags: u8) -> Result<()> {
        write_record(
            &mut self.media,
            &self.endian,
            AreaIndex::Staging,
            key,
            data,
            flags,
            0,
            false,
        )?;
        Ok(())
    }

    /// Шаг 3 (и финал mount): очистить staging. Erase пропускается, если
    /// область уже чистая.
    pub(crate) fn clear_staging(&mut self) -> Result<()> {
        self.media.reset_area(AreaIndex::Staging, 0)
    }

    /// Применить staging-запись к writable по смещению (replay при mount).
    pub(crate) fn apply_staged(
        &mut self,
        staged: &RawRecord,
        offset: u32,
        replace_current: bool,
    ) -> Result<u32> {
        write_record(
            &mut self.media,
            &self.endian,
            AreaIndex::Writable,
            &staged.key,
            &staged.data,
            staged.flags,
            offset,
            replace_current,
        )
    }
}
