#![allow(non_snake_case)]

// Базовые модули
pub mod consts;
pub mod crc;
pub mod endian;
pub mod error;

// Носители и раскладка областей
pub mod area;
pub mod media;

// Кодек записей и обход
pub mod record;
pub mod scan;

// Хранилище (mount, get/set/remove, resilience)
pub mod store; // src/store/{mod,init,kv,staging}.rs

// Host-side подготовка readonly-области
pub mod provision;

// Удобные реэкспорты
pub use consts::{MAX_BANKS, MAX_DATA_SIZE, MAX_KEY_SIZE, RESILIENT_FLAG};
pub use error::{Result, StoreError};
pub use media::{Bank, FileMedia, MediaDriver, RamMedia};
pub use provision::{build_readonly_image, provision_readonly};
pub use store::PdbStore;
