//! store/init — mount: восстановление инвариантов носителя.
//!
//! Порядок mount:
//! 1. probe endian хоста;
//! 2. предварительная readonly-область на банке 0 (полный usable-размер);
//! 3. master record (ключ "PDBS", payload u16 BE = число записей),
//!    затем скан num_keys записей — так находится конец readonly-области;
//!    любая порча здесь фатальна;
//! 4. раскладка writable/staging (area::compute_layout);
//! 5. декодирование staging-записи (валидна <=> CRC сошёлся);
//! 6. скан writable: на каждом шаге кандидат free_space_offset;
//!    совпадение ключа со staging => перезапись на месте из staging
//!    (идемпотентный replay); totally-corrupt или непочиненная порча =>
//!    усечение хвоста (reset_area) и стоп;
//! 7. если staging так и не пристроен — ключ новый, append в конец;
//! 8. очистка staging.
//!
//! Сбой любого шага оставляет хранилище несконструированным.

use log::{info, warn};

use crate::area::{AreaIndex, AreaMap, AreaParams};
use crate::consts::{MASTER_DATA_SIZE, MASTER_KEY, READONLY_BANK};
use crate::endian::HostEndian;
use crate::error::{Result, StoreError};
use crate::media::Bank;
use crate::record::{read_record, Decoded, RawRecord};
use crate::scan::AreaScan;

use super::PdbStore;

impl PdbStore {
    /// Смонтировать хранилище поверх одного (readonly+writable+staging) или
    /// двух (readonly | writable+staging) банков.
    pub fn init(banks: Vec<Bank>) -> Result<Self> {
        let endian = HostEndian::detect();
        let media = AreaMap::new(banks)?;
        let mut store = PdbStore {
            media,
            endian,
            free_space_offset: 0,
        };
        store.mount()?;
        Ok(store)
    }

    pub(crate) fn mount(&mut self) -> Result<()> {
        let readonly_end = self.scan_readonly()?;
        self.media.compute_layout(readonly_end)?;

        let staged = self.read_staging()?;
        let staged = self.scan_writable(staged)?;

        // Staging пережил скан — ключ новый, дописываем в конец лога.
        if let Some(rec) = staged {
            let next = self.apply_staged(&rec, self.free_space_offset, false)?;
            info!(
                "mount: replayed staged record for new key ({} bytes) at offset {}",
                rec.data.len(),
                self.free_space_offset
            );
            self.free_space_offset = next;
        }

        self.clear_staging()?;
        Ok(())
    }

    /// Прочитать master record и провижен-записи; вернуть конец readonly.
    fn scan_readonly(&mut self) -> Result<u32> {
        // До разбора master размер readonly неизвестен — берём весь банк.
        let provisional = self.media.usable_of(READONLY_BANK);
        self.media.set_area(
            AreaIndex::ReadOnly,
            AreaParams {
                address: 0,
                size: provisional,
                bank: READONLY_BANK,
            },
        );

        let master = match read_record(&self.media, &self.endian, AreaIndex::ReadOnly, 0)? {
            Decoded::Valid(rec) => rec,
            _ => return Err(StoreError::DataCorrupt),
        };
        if master.key != MASTER_KEY.as_bytes() || master.data.len() != MASTER_DATA_SIZE {
            return Err(StoreError::DataCorrupt);
        }
        let num_keys = self.endian.read_u16(&master.data);

        let mut offset = master.next_offset;
        for _ in 0..num_keys {
            match read_record(&self.media, &self.endian, AreaIndex::ReadOnly, offset)? {
                Decoded::Valid(rec) => offset = rec.next_offset,
                // Порча readonly-области фатальна (включая num_keys,
                // не помещающийся в область).
                _ => return Err(StoreError::DataCorrupt),
            }
        }
        Ok(offset)
    }

    /// Валидная staging-запись, если есть. Чистая (стёртая) или битая
    /// staging-область — просто None; ошибки чтения носителя фатальны.
    fn read_staging(&self) -> Result<Option<RawRecord>> {
        match read_record(&self.media, &self.endian, AreaIndex::Staging, 0)? {
            Decoded::Valid(rec) => Ok(Some(rec)),
            Decoded::Corrupt(_) | Decoded::TotallyCorrupt => Ok(None),
        }
    }

    /// Скан writable: выставить free_space_offset, применить staging к
    /// совпавшему ключу, усечь битый хвост. Возвращает staging, если его
    /// ключ в области не встретился.
    fn scan_writable(&mut self, mut staged: Option<RawRecord>) -> Result<Option<RawRecord>> {
        self.free_space_offset = 0;
        let limit = self.media.area(AreaIndex::Writable).size;
        let mut scan = AreaScan::new(AreaIndex::Writable, limit);

        while let Some((offset, decoded)) = scan.next(&self.media, &self.endian)? {
            match decoded {
                Decoded::Valid(rec) => {
                    if staged_matches(&staged, &rec) {
                        // Окно «commit сделан, clear нет»: повторное
                        // применение идемпотентно.
                        let rec_staged = staged.take().expect("staged checked above");
                        self.apply_staged(&rec_staged, offset, true)?;
                        info!("mount: re-applied staged record at offset {}", offset);
                    }
                    self.free_space_offset = rec.next_offset;
                }
                Decoded::Corrupt(rec) => {
                    if staged_matches(&staged, &rec) {
                        // Оборванный commit: перезаписываем из staging.
                        let rec_staged = staged.take().expect("staged checked above");
                        self.apply_staged(&rec_staged, offset, true)?;
                        info!("mount: repaired torn record at offset {} from staging", offset);
                        self.free_space_offset = rec.next_offset;
                    } else {
                        warn!("mount: truncating writable tail at offset {}", offset);
                        self.media.reset_area(AreaIndex::Writable, offset)?;
                        self.free_space_offset = offset;
                        break;
                    }
                }
                Decoded::TotallyCorrupt => {
                    self.media.reset_area(AreaIndex::Writable, offset)?;
                    self.free_space_offset = offset;
                    break;
                }
            }
        }
        Ok(staged)
    }
}

#[inline]
fn staged_matches(staged: &Option<RawRecord>, rec: &RawRecord) -> bool {
    staged.as_ref().map_or(false, |s| s.key == rec.key)
}
