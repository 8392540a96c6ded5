//! Persistent byte storage abstractions
//!
//! The settings store treats non-volatile memory like a classic EEPROM:
//! a small, byte-addressed array where every write costs wear. Chips with
//! real EEPROM implement this directly; flash-only chips emulate it.

/// Errors from persistent storage operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageError {
    /// Address is beyond the storage capacity
    OutOfRange,
    /// Underlying storage layer (wear leveling, item map) failed
    Storage,
    /// Raw flash operation failed
    Flash,
}

/// Byte-addressed persistent storage
///
/// Implementations should handle:
/// - Persisting each written byte across power cycles
/// - Returning the erased value (typically `0xFF`) for never-written bytes
///
/// Callers are expected to avoid rewriting unchanged bytes.
pub trait ByteStorage {
    /// Read the byte stored at `address`
    fn read(&mut self, address: u16) -> impl core::future::Future<Output = Result<u8, StorageError>>;

    /// Write `value` at `address`
    fn write(
        &mut self,
        address: u16,
        value: u8,
    ) -> impl core::future::Future<Output = Result<(), StorageError>>;

    /// Make previous writes durable
    ///
    /// Storage that persists every write immediately keeps the default.
    /// Emulation layers that buffer writes commit them here.
    fn flush(&mut self) -> impl core::future::Future<Output = Result<(), StorageError>> {
        async { Ok(()) }
    }

    /// Number of addressable bytes
    fn capacity(&self) -> usize;
}

/// Value of a byte that has never been written
pub const ERASED_BYTE: u8 = 0xFF;

/// RAM-backed storage
///
/// Behaves like a freshly erased EEPROM of `N` bytes. Used by host tests and
/// as the working image for flash emulation layers.
#[derive(Debug, Clone)]
pub struct MemoryStorage<const N: usize> {
    bytes: [u8; N],
    writes: usize,
    flushes: usize,
}

impl<const N: usize> Default for MemoryStorage<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> MemoryStorage<N> {
    /// Create an erased storage image
    pub const fn new() -> Self {
        Self {
            bytes: [ERASED_BYTE; N],
            writes: 0,
            flushes: 0,
        }
    }

    /// Create a storage image from existing contents
    pub const fn from_bytes(bytes: [u8; N]) -> Self {
        Self {
            bytes,
            writes: 0,
            flushes: 0,
        }
    }

    /// Raw contents
    pub fn as_bytes(&self) -> &[u8; N] {
        &self.bytes
    }

    /// Number of byte writes performed since creation
    pub fn write_count(&self) -> usize {
        self.writes
    }

    /// Number of flushes performed since creation
    pub fn flush_count(&self) -> usize {
        self.flushes
    }
}

impl<const N: usize> ByteStorage for MemoryStorage<N> {
    async fn read(&mut self, address: u16) -> Result<u8, StorageError> {
        self.bytes
            .get(address as usize)
            .copied()
            .ok_or(StorageError::OutOfRange)
    }

    async fn write(&mut self, address: u16, value: u8) -> Result<(), StorageError> {
        let slot = self
            .bytes
            .get_mut(address as usize)
            .ok_or(StorageError::OutOfRange)?;
        *slot = value;
        self.writes += 1;
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), StorageError> {
        self.flushes += 1;
        Ok(())
    }

    fn capacity(&self) -> usize {
        N
    }
}
