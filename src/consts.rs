//! Общие константы формата (record header, области, флаги).

// -------- Banks --------
pub const MAX_BANKS: usize = 2;

// Dual bank: bank 0 = readonly (code flash), bank 1 = writable (EEPROM/data flash).
// Single bank: bank 0 несёт все три области.
pub const READONLY_BANK: usize = 0;
pub const WRITABLE_BANK: usize = 1;

// -------- Limits --------
pub const MAX_KEY_SIZE: usize = 16;
pub const MAX_DATA_SIZE: usize = 1024;

// -------- Record header --------
// Формат записи (on media, multibyte поля — big-endian):
// [data_size u16]
// [key_size u8]       -- 1..=MAX_KEY_SIZE
// [flags u8]
// [crc u32]           -- rolling CRC-32 over header[0..crc) + key + data
// [key ...]           -- key_size байт, ASCII, без терминатора
// [data ...]          -- data_size байт
//
// Total header size = 2 + 1 + 1 + 4 = 8 bytes.
pub const REC_HDR_SIZE: usize = 8;

// Offsets inside record header
pub const REC_OFF_DATA_SIZE: usize = 0;
pub const REC_OFF_KEY_SIZE: usize = 2;
pub const REC_OFF_FLAGS: usize = 3;
pub const REC_OFF_CRC32: usize = 4;

// -------- Flags --------
// Пользовательский флаг: запись через staging-протокол (устойчивость к сбросу питания).
pub const RESILIENT_FLAG: u8 = 0x01;
// Внутренний tombstone; от вызывающего кода не принимается.
pub const DELETE_FLAG: u8 = 0x80;
pub const SUPPORTED_USER_FLAGS: u8 = RESILIENT_FLAG;

// -------- CRC --------
// Вариант CRC-32: reflected poly 0xEDB88320, init 0xFFFFFFFF, без final xor.
pub const INITIAL_CRC: u32 = 0xFFFF_FFFF;

// -------- Master record --------
// Первая запись readonly-области: ключ "PDBS", payload = u16 BE
// (число последующих provisioned-записей).
pub const MASTER_KEY: &str = "PDBS";
pub const MASTER_DATA_SIZE: usize = 2;

// -------- Staging --------
// Staging-область вмещает ровно одну максимальную запись.
pub const STAGING_SIZE: u32 = (REC_HDR_SIZE + MAX_KEY_SIZE + MAX_DATA_SIZE) as u32;

// Размер чанка blank-check при reset_area (экономим erase, если хвост уже чистый).
pub const WORK_BUF_SIZE: usize = 16;

// Байты, запрещённые в ключах.
pub const ILLEGAL_KEY_BYTES: &[u8] = b" */?:;\"|<>\\";
