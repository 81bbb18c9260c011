//! RamMedia — плоская память как носитель.
//!
//! Модель поведения повторяет типовой EEPROM/flash-симулятор:
//! program проверяет, что цель стёрта (каждый байт == erase_val),
//! erase заливает диапазон erase_val.
//!
//! Буфер разделяемый (Arc<Mutex>): тестовые обвязки держат клон и могут
//! портить байты / снимать образ между unmount и mount — так же, как
//! crash-тесты правят файлы на диске между переоткрытиями БД.

use std::sync::{Arc, Mutex};

use super::MediaDriver;
use crate::error::{Result, StoreError};

pub struct RamMedia {
    buf: Arc<Mutex<Vec<u8>>>,
    erase_val: u8,
}

impl RamMedia {
    /// Новый носитель размера `size`, целиком стёртый.
    pub fn new(size: usize, erase_val: u8) -> Self {
        Self {
            buf: Arc::new(Mutex::new(vec![erase_val; size])),
            erase_val,
        }
    }

    /// Носитель поверх готового образа (например, снятого ранее).
    pub fn from_image(image: Vec<u8>, erase_val: u8) -> Self {
        Self {
            buf: Arc::new(Mutex::new(image)),
            erase_val,
        }
    }

    /// Носитель поверх уже разделяемого буфера: несколько драйверов (или
    /// драйвер и тестовая обвязка) видят одни и те же байты.
    pub fn from_shared(buf: Arc<Mutex<Vec<u8>>>, erase_val: u8) -> Self {
        Self { buf, erase_val }
    }

    /// Разделяемый буфер — для инспекции и порчи байт из тестов.
    pub fn buffer(&self) -> Arc<Mutex<Vec<u8>>> {
        Arc::clone(&self.buf)
    }
}

impl MediaDriver for RamMedia {
    fn read(&self, addr: u32, buf: &mut [u8]) -> Result<()> {
        let mem = self.buf.lock().unwrap();
        let start = addr as usize;
        let end = start.checked_add(buf.len()).ok_or(StoreError::ReadError)?;
        if buf.is_empty() || end > mem.len() {
            return Err(StoreError::ReadError);
        }
        buf.copy_from_slice(&mem[start..end]);
        Ok(())
    }

    fn program(&mut self, addr: u32, buf: &[u8]) -> Result<()> {
        let mut mem = self.buf.lock().unwrap();
        let start = addr as usize;
        let end = start.checked_add(buf.len()).ok_or(StoreError::WriteError)?;
        if buf.is_empty() || end > mem.len() {
            return Err(StoreError::WriteError);
        }
        // program только поверх стёртых байт
        if mem[start..end].iter().any(|&b| b != self.erase_val) {
            return Err(StoreError::WriteError);
        }
        mem[start..end].copy_from_slice(buf);
        Ok(())
    }

    fn erase(&mut self, addr: u32, size: u32) -> Result<()> {
        let mut mem = self.buf.lock().unwrap();
        let start = addr as usize;
        let end = start
            .checked_add(size as usize)
            .ok_or(StoreError::WriteError)?;
        if size == 0 || end > mem.len() {
            return Err(StoreError::WriteError);
        }
        mem[start..end].fill(self.erase_val);
        Ok(())
    }
}
