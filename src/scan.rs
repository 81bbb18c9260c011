//! scan — последовательный обход записей области.
//!
//! AreaScan выдаёт пары (offset записи, Decoded) от нуля до limit.
//! Сканер не держит заимствование AreaMap между шагами: вызывающий код
//! (mount) может чинить запись на месте и продолжать обход.
//!
//! Правила продвижения:
//! - Valid / Corrupt — позиция смещается на next_offset (длины правдоподобны);
//! - TotallyCorrupt — позиция замирает; дальнейшие next() вернут то же самое,
//!   решение (обычно reset_area + стоп) за вызывающим.

use crate::area::{AreaIndex, AreaMap};
use crate::endian::HostEndian;
use crate::error::Result;
use crate::record::{read_record, Decoded};

pub struct AreaScan {
    area: AreaIndex,
    offset: u32,
    limit: u32,
}

impl AreaScan {
    pub fn new(area: AreaIndex, limit: u32) -> Self {
        Self {
            area,
            offset: 0,
            limit,
        }
    }

    /// Текущая позиция (начало ещё не прочитанной записи).
    #[inline]
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Прочитать следующую запись. None — достигнут limit.
    pub fn next(&mut self, media: &AreaMap, endian: &HostEndian) -> Result<Option<(u32, Decoded)>> {
        if self.offset >= self.limit {
            return Ok(None);
        }
        let start = self.offset;
        let decoded = read_record(media, endian, self.area, start)?;
        match &decoded {
            Decoded::Valid(rec) | Decoded::Corrupt(rec) => {
                self.offset = rec.next_offset;
            }
            Decoded::TotallyCorrupt => {}
        }
        Ok(Some((start, decoded)))
    }
}
