//! FileMedia — mmap-файл как носитель (host-side).
//!
//! Для инструментов на хосте: подготовка образов, прогон сценариев без
//! железа. Семантика та же, что у RamMedia (erase-before-program);
//! flush на Drop — best-effort.

use std::fs::OpenOptions;
use std::path::Path;

use anyhow::Context;
use memmap2::MmapMut;

use super::MediaDriver;
use crate::error::{Result, StoreError};

pub struct FileMedia {
    map: MmapMut,
    erase_val: u8,
}

impl FileMedia {
    /// Создать файл размера `size`, стёртый целиком, и отобразить его.
    pub fn create(path: &Path, size: u32, erase_val: u8) -> anyhow::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .with_context(|| format!("create media file {}", path.display()))?;
        file.set_len(size as u64)?;
        let mut map = unsafe { MmapMut::map_mut(&file)? };
        map.fill(erase_val);
        map.flush()?;
        Ok(Self { map, erase_val })
    }

    /// Открыть существующий файл-образ.
    pub fn open(path: &Path, erase_val: u8) -> anyhow::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .with_context(|| format!("open media file {}", path.display()))?;
        let map = unsafe { MmapMut::map_mut(&file)? };
        Ok(Self { map, erase_val })
    }

    pub fn len(&self) -> u32 {
        self.map.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl MediaDriver for FileMedia {
    fn read(&self, addr: u32, buf: &mut [u8]) -> Result<()> {
        let start = addr as usize;
        let end = start.checked_add(buf.len()).ok_or(StoreError::ReadError)?;
        if buf.is_empty() || end > self.map.len() {
            return Err(StoreError::ReadError);
        }
        buf.copy_from_slice(&self.map[start..end]);
        Ok(())
    }

    fn program(&mut self, addr: u32, buf: &[u8]) -> Result<()> {
        let start = addr as usize;
        let end = start.checked_add(buf.len()).ok_or(StoreError::WriteError)?;
        if buf.is_empty() || end > self.map.len() {
            return Err(StoreError::WriteError);
        }
        if self.map[start..end].iter().any(|&b| b != self.erase_val) {
            return Err(StoreError::WriteError);
        }
        self.map[start..end].copy_from_slice(buf);
        Ok(())
    }

    fn erase(&mut self, addr: u32, size: u32) -> Result<()> {
        let start = addr as usize;
        let end = start
            .checked_add(size as usize)
            .ok_or(StoreError::WriteError)?;
        if size == 0 || end > self.map.len() {
            return Err(StoreError::WriteError);
        }
        self.map[start..end].fill(self.erase_val);
        Ok(())
    }
}

impl Drop for FileMedia {
    fn drop(&mut self) {
        let _ = self.map.flush();
    }
}
