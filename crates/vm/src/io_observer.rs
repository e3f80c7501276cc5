//! The persistent key/value observer contract.
//!
//! The host provides an implementation per run; the VM calls it from the
//! `State`/`ShardedState` library types and never retries a failed call. A
//! `PermissionDenied` on read means "key not present" to the state library.

/// Status of one observer operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoStatus {
    Ok,
    BufferTooSmall,
    PermissionDenied,
    Error,
}

/// Host-provided persistent key→bytes storage.
pub trait IoObserver {
    /// Copies the value of `key` into `data` and sets `size` to the number
    /// of bytes copied. When `data` is too small, returns `BufferTooSmall`
    /// with `size` set to the required size. Returns `PermissionDenied` when
    /// the key is absent.
    fn read(&self, key: &str, data: &mut [u8], size: &mut u64) -> IoStatus;

    /// Stores `data` under `key`.
    fn write(&mut self, key: &str, data: &[u8]) -> IoStatus;

    /// Returns `Ok` when the key is present and `Error` otherwise.
    fn exists(&self, key: &str) -> IoStatus;
}
