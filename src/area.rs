//! area — раскладка трёх логических областей поверх банков.
//!
//! Области (фиксированный порядок индексов):
//! - ReadOnly (0) — master record + provisioned-записи; не мутируется.
//! - Writable (1) — append-лог с выборочной заменой на месте.
//! - Staging  (2) — скретч ровно на одну максимальную запись.
//!
//! AreaMap владеет банками, транслирует (area, offset) в адрес банка
//! (bank.start_offset + area.address + offset) и даёт area-relative
//! read/program/erase + reset_area (erase хвоста только если он грязный).

use crate::consts::{MAX_BANKS, READONLY_BANK, STAGING_SIZE, WORK_BUF_SIZE, WRITABLE_BANK};
use crate::error::{Result, StoreError};
use crate::media::Bank;

pub const NUM_AREAS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaIndex {
    ReadOnly = 0,
    Writable = 1,
    Staging = 2,
}

/// Параметры области: адрес внутри банка (от start_offset) и размер.
#[derive(Debug, Clone, Copy, Default)]
pub struct AreaParams {
    pub address: u32,
    pub size: u32,
    pub bank: usize,
}

pub struct AreaMap {
    banks: Vec<Bank>,
    areas: [AreaParams; NUM_AREAS],
}

impl AreaMap {
    pub fn new(banks: Vec<Bank>) -> Result<Self> {
        if banks.is_empty() || banks.len() > MAX_BANKS {
            return Err(StoreError::InvalidArgument);
        }
        Ok(Self {
            banks,
            areas: [AreaParams::default(); NUM_AREAS],
        })
    }

    #[inline]
    pub fn num_banks(&self) -> usize {
        self.banks.len()
    }

    /// Usable-размер банка (за вычетом start_offset).
    #[inline]
    pub fn usable_of(&self, bank: usize) -> u32 {
        self.banks[bank].usable_size()
    }

    #[inline]
    pub fn area(&self, area: AreaIndex) -> &AreaParams {
        &self.areas[area as usize]
    }

    #[inline]
    pub fn set_area(&mut self, area: AreaIndex, params: AreaParams) {
        self.areas[area as usize] = params;
    }

    #[inline]
    pub fn erase_val(&self, area: AreaIndex) -> u8 {
        self.banks[self.area(area).bank].erase_val
    }

    pub fn into_banks(self) -> Vec<Bank> {
        self.banks
    }

    /// Вычислить раскладку writable/staging после того, как известен конец
    /// readonly-области.
    ///
    /// Требование к размеру (как минимум одна запись + staging-слот):
    /// - dual bank:   usable(bank1) >= 2 * STAGING_SIZE
    /// - single bank: usable(bank0) >= 2 * STAGING_SIZE + readonly_end
    pub fn compute_layout(&mut self, readonly_end: u32) -> Result<()> {
        self.areas[AreaIndex::ReadOnly as usize].size = readonly_end;

        let (writable, bank) = match self.banks.len() {
            1 => {
                let usable = self.banks[READONLY_BANK].usable_size();
                if usable < 2 * STAGING_SIZE + readonly_end {
                    return Err(StoreError::InvalidArgument);
                }
                (
                    AreaParams {
                        address: readonly_end,
                        size: usable - STAGING_SIZE - readonly_end,
                        bank: READONLY_BANK,
                    },
                    READONLY_BANK,
                )
            }
            2 => {
                let usable = self.banks[WRITABLE_BANK].usable_size();
                if usable < 2 * STAGING_SIZE {
                    return Err(StoreError::InvalidArgument);
                }
                (
                    AreaParams {
                        address: 0,
                        size: usable - STAGING_SIZE,
                        bank: WRITABLE_BANK,
                    },
                    WRITABLE_BANK,
                )
            }
            _ => return Err(StoreError::InvalidArgument),
        };

        self.areas[AreaIndex::Writable as usize] = writable;
        self.areas[AreaIndex::Staging as usize] = AreaParams {
            address: writable.address + writable.size,
            size: STAGING_SIZE,
            bank,
        };
        Ok(())
    }

    pub fn read(&self, area: AreaIndex, offset: u32, buf: &mut [u8]) -> Result<()> {
        let params = *self.area(area);
        if (offset as u64) + (buf.len() as u64) > params.size as u64 {
            return Err(StoreError::ReadError);
        }
        self.banks[params.bank].read(params.address + offset, buf)
    }

    pub fn program(&mut self, area: AreaIndex, offset: u32, buf: &[u8]) -> Result<()> {
        let params = *self.area(area);
        if (offset as u64) + (buf.len() as u64) > params.size as u64 {
            return Err(StoreError::WriteError);
        }
        self.banks[params.bank].program(params.address + offset, buf)
    }

    pub fn erase(&mut self, area: AreaIndex, offset: u32, size: u32) -> Result<()> {
        let params = *self.area(area);
        if (offset as u64) + (size as u64) > params.size as u64 {
            return Err(StoreError::WriteError);
        }
        self.banks[params.bank].erase(params.address + offset, size)
    }

    /// Стереть область от offset до конца, но только если хвост не чистый.
    ///
    /// Хвост читается чанками по WORK_BUF_SIZE; если все байты уже равны
    /// erase_val, erase не выполняется (экономия ресурса носителя).
    pub fn reset_area(&mut self, area: AreaIndex, offset: u32) -> Result<()> {
        let erase_val = self.erase_val(area);
        let erase_size = self.area(area).size.saturating_sub(offset);

        let mut work = [0u8; WORK_BUF_SIZE];
        let mut read_offset = offset;
        let mut remaining = erase_size;
        while remaining > 0 {
            let chunk = remaining.min(WORK_BUF_SIZE as u32);
            let buf = &mut work[..chunk as usize];
            self.read(area, read_offset, buf)?;
            if buf.iter().any(|&b| b != erase_val) {
                break;
            }
            read_offset += chunk;
            remaining -= chunk;
        }

        if remaining == 0 {
            return Ok(());
        }
        self.erase(area, offset, erase_size)
    }
}
