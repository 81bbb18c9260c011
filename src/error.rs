//! Error taxonomy for store operations.
//!
//! One variant per externally observable status. Variants are plain
//! (no payload) so tests can assert on exact statuses, mirroring the
//! on-device status-code surface this store replaces.

use thiserror::Error;

/// Result type alias using StoreError
pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// Media read failed or read range left the area.
    #[error("media read error")]
    ReadError,

    /// Media program/erase failed (includes program over non-erased bytes).
    #[error("media write error")]
    WriteError,

    /// Key absent, or present only as a tombstone.
    #[error("key not found")]
    NotFound,

    /// CRC mismatch or structurally impossible record.
    #[error("data corrupt")]
    DataCorrupt,

    /// Caller violated input constraints (key syntax/length, reserved
    /// flags, data size mismatch on update, oversized data).
    #[error("invalid argument")]
    InvalidArgument,

    /// Mutation attempted on a factory-provisioned key.
    #[error("key is readonly")]
    KeyIsReadonly,

    /// Writable area cannot hold the record.
    #[error("media full")]
    MediaFull,
}
