// tests/resilience.rs
//
// Staging-протокол под сбоями питания.
//
// Два инструмента:
// - HookedMedia — драйвер с отключаемым erase (staging переживает set) и
//   трекингом конца последней записи, чтобы прицельно портить байты;
// - TornMedia — драйвер с байтовым бюджетом: program/erase применяют первые
//   budget байт и отказывают, моделируя обрыв питания на произвольной
//   границе байта. Полный перебор точек обрыва по всем трём шагам
//   resilient-set: после remount наблюдается либо старое, либо новое
//   значение — третьего состояния нет.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;

use PDBStore::{
    provision_readonly, Bank, MediaDriver, PdbStore, RamMedia, StoreError, RESILIENT_FLAG,
};

const EEPROM_SIZE: u32 = 6 * 1024;
const ERASE_VAL: u8 = 0xFF;
const STAGING_SIZE: usize = 8 + 16 + 1024;

const KEY5: &str = "key5";
const KEY5_V1: &[u8] = b"key5_val1                     ";
const KEY5_V2: &[u8] = b"Key 5 has the following value.";
const KEY6: &str = "kk6";
const KEY6_VAL: &[u8] = b"Base value of key6 before appending the number is: ";

// ---------------- драйверы с изъянами ----------------

/// RamMedia + выключатель erase + адрес конца последней записи.
struct HookedMedia {
    inner: RamMedia,
    erase_disabled: Arc<AtomicBool>,
    last_prog_end: Arc<AtomicU32>,
}

impl MediaDriver for HookedMedia {
    fn read(&self, addr: u32, buf: &mut [u8]) -> PDBStore::Result<()> {
        self.inner.read(addr, buf)
    }

    fn program(&mut self, addr: u32, buf: &[u8]) -> PDBStore::Result<()> {
        self.inner.program(addr, buf)?;
        self.last_prog_end
            .store(addr + buf.len() as u32, Ordering::Relaxed);
        Ok(())
    }

    fn erase(&mut self, addr: u32, size: u32) -> PDBStore::Result<()> {
        if self.erase_disabled.load(Ordering::Relaxed) {
            return Ok(());
        }
        self.inner.erase(addr, size)
    }
}

/// Драйвер с бюджетом мутаций: применяет первые budget байт каждой операции,
/// затем отказывает. Чтение бюджета не тратит.
struct TornMedia {
    buf: Arc<Mutex<Vec<u8>>>,
    erase_val: u8,
    budget: Arc<AtomicI64>,
}

impl TornMedia {
    fn spend(&self, want: usize) -> usize {
        let got = self
            .budget
            .fetch_sub(want as i64, Ordering::Relaxed)
            .clamp(0, want as i64);
        got as usize
    }
}

impl MediaDriver for TornMedia {
    fn read(&self, addr: u32, buf: &mut [u8]) -> PDBStore::Result<()> {
        let mem = self.buf.lock().unwrap();
        let start = addr as usize;
        let end = start + buf.len();
        if buf.is_empty() || end > mem.len() {
            return Err(StoreError::ReadError);
        }
        buf.copy_from_slice(&mem[start..end]);
        Ok(())
    }

    fn program(&mut self, addr: u32, buf: &[u8]) -> PDBStore::Result<()> {
        let mut mem = self.buf.lock().unwrap();
        let start = addr as usize;
        let end = start + buf.len();
        if buf.is_empty() || end > mem.len() {
            return Err(StoreError::WriteError);
        }
        if mem[start..end].iter().any(|&b| b != self.erase_val) {
            return Err(StoreError::WriteError);
        }
        let allowed = self.spend(buf.len());
        mem[start..start + allowed].copy_from_slice(&buf[..allowed]);
        if allowed < buf.len() {
            return Err(StoreError::WriteError);
        }
        Ok(())
    }

    fn erase(&mut self, addr: u32, size: u32) -> PDBStore::Result<()> {
        let mut mem = self.buf.lock().unwrap();
        let start = addr as usize;
        let end = start + size as usize;
        if size == 0 || end > mem.len() {
            return Err(StoreError::WriteError);
        }
        let allowed = self.spend(size as usize);
        mem[start..start + allowed].fill(self.erase_val);
        if allowed < size as usize {
            return Err(StoreError::WriteError);
        }
        Ok(())
    }
}

// ---------------- helpers ----------------

fn readonly_entries() -> Vec<(&'static str, &'static [u8])> {
    vec![
        ("key1", b"key1 val1" as &[u8]),
        ("k2", b"This is key2 value"),
        ("keyy3", b"What's the value of key 3?"),
    ]
}

/// Одно-банковый стор с «чистым» образом: readonly + key5=v1 в writable.
/// Возвращает снятый baseline-образ носителя.
fn baseline_image() -> Result<Vec<u8>> {
    let media = RamMedia::new(EEPROM_SIZE as usize, ERASE_VAL);
    let shared = media.buffer();
    let mut bank = Bank::new(EEPROM_SIZE, 0, ERASE_VAL, Box::new(media));
    provision_readonly(&mut bank, &readonly_entries())?;

    let mut store = PdbStore::init(vec![bank])?;
    store.set(KEY5, KEY5_V1, 0)?;
    store.deinit();

    let image = shared.lock().unwrap().clone();
    Ok(image)
}

/// Смонтировать стор поверх разделяемого буфера обычным драйвером.
fn mount_shared(buf: &Arc<Mutex<Vec<u8>>>) -> PDBStore::Result<PdbStore> {
    let bank = Bank::new(
        EEPROM_SIZE,
        0,
        ERASE_VAL,
        Box::new(RamMedia::from_shared(Arc::clone(buf), ERASE_VAL)),
    );
    PdbStore::init(vec![bank])
}

/// Сколько байт мутаций стоит данный set поверх baseline.
fn measure_mutation_bytes(image: &[u8], key: &str, val: &[u8]) -> Result<i64> {
    let buf = Arc::new(Mutex::new(image.to_vec()));
    let budget = Arc::new(AtomicI64::new(i64::MAX));
    let bank = Bank::new(
        EEPROM_SIZE,
        0,
        ERASE_VAL,
        Box::new(TornMedia {
            buf,
            erase_val: ERASE_VAL,
            budget: Arc::clone(&budget),
        }),
    );
    let mut store = PdbStore::init(vec![bank])?;
    let before = budget.load(Ordering::Relaxed);
    store.set(key, val, RESILIENT_FLAG)?;
    let after = budget.load(Ordering::Relaxed);
    Ok(before - after)
}

// ---------------- сценарии ----------------

// Staging остаётся на носителе (erase отключён), хвостовая запись портится:
// get видит порчу, mount делает replay из staging и чинит запись.
#[test]
fn staged_record_repairs_torn_write() -> Result<()> {
    let media = RamMedia::new(EEPROM_SIZE as usize, ERASE_VAL);
    let shared = media.buffer();
    let erase_disabled = Arc::new(AtomicBool::new(false));
    let last_prog_end = Arc::new(AtomicU32::new(0));
    let mut bank = Bank::new(
        EEPROM_SIZE,
        0,
        ERASE_VAL,
        Box::new(HookedMedia {
            inner: RamMedia::from_shared(Arc::clone(&shared), ERASE_VAL),
            erase_disabled: Arc::clone(&erase_disabled),
            last_prog_end: Arc::clone(&last_prog_end),
        }),
    );
    provision_readonly(&mut bank, &readonly_entries())?;

    let mut store = PdbStore::init(vec![bank])?;

    // erase отключён => clear_staging (шаг 3) не срабатывает
    erase_disabled.store(true, Ordering::Relaxed);
    store.set(KEY6, KEY6_VAL, RESILIENT_FLAG)?;
    erase_disabled.store(false, Ordering::Relaxed);

    // Портим последний байт только что записанной writable-записи
    let end = last_prog_end.load(Ordering::Relaxed) as usize;
    shared.lock().unwrap()[end - 1] ^= 0x01;

    assert_eq!(store.get(KEY6), Err(StoreError::DataCorrupt));

    // «Сброс»: remount делает replay из staging
    let banks = store.deinit();
    let store = PdbStore::init(banks)?;
    assert_eq!(store.get(KEY6)?, KEY6_VAL);
    assert_eq!(store.get("key1")?, b"key1 val1");

    // Staging очищен после mount
    let mem = shared.lock().unwrap();
    let staging_start = EEPROM_SIZE as usize - STAGING_SIZE;
    assert!(mem[staging_start..].iter().all(|&b| b == ERASE_VAL));
    Ok(())
}

// Окно «commit сделан, clear нет» для нового ключа: запись уже в логе,
// staging с тем же ключом уцелел. Mount обязан распознать ключ при скане,
// идемпотентно переналожить запись и просто очистить staging — повторный
// append на нестёртую область не происходит.
#[test]
fn replay_after_commit_is_idempotent() -> Result<()> {
    let media = RamMedia::new(EEPROM_SIZE as usize, ERASE_VAL);
    let shared = media.buffer();
    let erase_disabled = Arc::new(AtomicBool::new(false));
    let mut bank = Bank::new(
        EEPROM_SIZE,
        0,
        ERASE_VAL,
        Box::new(HookedMedia {
            inner: RamMedia::from_shared(Arc::clone(&shared), ERASE_VAL),
            erase_disabled: Arc::clone(&erase_disabled),
            last_prog_end: Arc::new(AtomicU32::new(0)),
        }),
    );
    provision_readonly(&mut bank, &readonly_entries())?;
    let mut store = PdbStore::init(vec![bank])?;
    store.set(KEY5, KEY5_V1, 0)?;

    // Append нового ключа: шаг 3 (clear staging) подавлен
    erase_disabled.store(true, Ordering::Relaxed);
    store.set(KEY6, KEY6_VAL, RESILIENT_FLAG)?;
    erase_disabled.store(false, Ordering::Relaxed);
    let fso = store.free_space_offset();

    let banks = store.deinit();
    let store = PdbStore::init(banks)?;
    assert_eq!(store.get(KEY6)?, KEY6_VAL);
    assert_eq!(store.get(KEY5)?, KEY5_V1);
    // Запись не задублировалась
    assert_eq!(store.free_space_offset(), fso);

    let mem = shared.lock().unwrap();
    let staging_start = EEPROM_SIZE as usize - STAGING_SIZE;
    assert!(mem[staging_start..].iter().all(|&b| b == ERASE_VAL));
    Ok(())
}

// Полный перебор точек обрыва для replace-пути: после remount get(key5)
// равен строго v1 либо v2.
#[test]
fn crash_sweep_replace_path() -> Result<()> {
    let image = baseline_image()?;
    let total = measure_mutation_bytes(&image, KEY5, KEY5_V2)?;
    assert!(total > 0);

    for cut in 0..=total {
        let buf = Arc::new(Mutex::new(image.clone()));
        {
            let bank = Bank::new(
                EEPROM_SIZE,
                0,
                ERASE_VAL,
                Box::new(TornMedia {
                    buf: Arc::clone(&buf),
                    erase_val: ERASE_VAL,
                    budget: Arc::new(AtomicI64::new(cut)),
                }),
            );
            let mut store = PdbStore::init(vec![bank])?;
            let _ = store.set(KEY5, KEY5_V2, RESILIENT_FLAG);
        }

        let store = mount_shared(&buf).unwrap_or_else(|e| {
            panic!("mount must succeed after crash at byte {cut}: {e}");
        });
        let got = store
            .get(KEY5)
            .unwrap_or_else(|e| panic!("get(key5) after crash at byte {cut}: {e}"));
        assert!(
            got == KEY5_V1 || got == KEY5_V2,
            "crash at byte {cut} left a third state: {:?}",
            String::from_utf8_lossy(&got)
        );
        // Соседние ключи не задеты
        assert_eq!(store.get("key1")?, b"key1 val1");
    }
    Ok(())
}

// То же для append-пути (новый ключ): после remount ключ либо отсутствует,
// либо полностью записан; существующие данные не задеты.
#[test]
fn crash_sweep_append_path() -> Result<()> {
    let image = baseline_image()?;
    let total = measure_mutation_bytes(&image, KEY6, KEY6_VAL)?;

    for cut in 0..=total {
        let buf = Arc::new(Mutex::new(image.clone()));
        {
            let bank = Bank::new(
                EEPROM_SIZE,
                0,
                ERASE_VAL,
                Box::new(TornMedia {
                    buf: Arc::clone(&buf),
                    erase_val: ERASE_VAL,
                    budget: Arc::new(AtomicI64::new(cut)),
                }),
            );
            let mut store = PdbStore::init(vec![bank])?;
            let _ = store.set(KEY6, KEY6_VAL, RESILIENT_FLAG);
        }

        let store = mount_shared(&buf).unwrap_or_else(|e| {
            panic!("mount must succeed after crash at byte {cut}: {e}");
        });
        match store.get(KEY6) {
            Ok(v) => assert_eq!(v, KEY6_VAL, "partial value visible after crash at byte {cut}"),
            Err(StoreError::NotFound) => {}
            Err(e) => panic!("unexpected get(kk6) status after crash at byte {cut}: {e}"),
        }
        assert_eq!(store.get(KEY5)?, KEY5_V1);
    }
    Ok(())
}
