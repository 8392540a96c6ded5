//! Emulated EEPROM in RP2040 flash
//!
//! The whole EEPROM image lives in RAM. Reads and writes touch only the
//! image; [`ByteStorage::flush`] stores it as one item in a
//! sequential-storage map in the last 64KB of flash, which spreads erase
//! cycles over the partition.

use embassy_rp::dma::Channel;
use embassy_rp::flash::{Async, Flash};
use embassy_rp::peripherals::FLASH;
use embassy_rp::Peri;
use embedded_storage_async::nor_flash::NorFlash;
use sequential_storage::cache::NoCache;
use sequential_storage::map;
use selene_hal::{ByteStorage, StorageError, ERASED_BYTE};

/// Flash storage configuration
pub const FLASH_SIZE: usize = 2 * 1024 * 1024; // 2MB on the Pico
pub const CONFIG_PARTITION_SIZE: usize = 64 * 1024;
pub const CONFIG_PARTITION_START: usize = FLASH_SIZE - CONFIG_PARTITION_SIZE;

/// Flash range for the config partition
pub const CONFIG_RANGE: core::ops::Range<u32> =
    (CONFIG_PARTITION_START as u32)..(FLASH_SIZE as u32);

/// Emulated EEPROM size in bytes
pub const EEPROM_SIZE: usize = 64;

/// Map key of the EEPROM image item
const EEPROM_KEY: u8 = 0;

/// Scratch space for one map item (key, length prefix, image)
const ITEM_BUFFER_SIZE: usize = 128;

/// RP2040 emulated EEPROM
pub struct Rp2040Eeprom<'d> {
    flash: Flash<'d, FLASH, Async, FLASH_SIZE>,
    image: [u8; EEPROM_SIZE],
    dirty: bool,
}

impl<'d> Rp2040Eeprom<'d> {
    /// Create an emulated EEPROM with an erased image
    ///
    /// Call [`Rp2040Eeprom::load`] before use to pick up stored contents.
    pub fn new(flash: Peri<'d, FLASH>, dma: Peri<'d, impl Channel>) -> Self {
        Self {
            flash: Flash::new(flash, dma),
            image: [ERASED_BYTE; EEPROM_SIZE],
            dirty: false,
        }
    }

    /// Read the stored image from flash
    ///
    /// Leaves the image erased if nothing has been stored yet.
    pub async fn load(&mut self) -> Result<(), StorageError> {
        let mut buffer = [0u8; ITEM_BUFFER_SIZE];

        let stored = map::fetch_item::<u8, &[u8], _>(
            &mut self.flash,
            CONFIG_RANGE,
            &mut NoCache::new(),
            &mut buffer,
            &EEPROM_KEY,
        )
        .await
        .map_err(|_| StorageError::Storage)?;

        if let Some(data) = stored {
            let len = data.len().min(EEPROM_SIZE);
            self.image[..len].copy_from_slice(&data[..len]);
        }
        self.dirty = false;
        Ok(())
    }

    /// Erase the whole config partition and reset the image
    pub async fn erase_all(&mut self) -> Result<(), StorageError> {
        self.flash
            .erase(CONFIG_RANGE.start, CONFIG_RANGE.end)
            .await
            .map_err(|_| StorageError::Flash)?;
        self.image = [ERASED_BYTE; EEPROM_SIZE];
        self.dirty = false;
        Ok(())
    }
}

impl<'d> ByteStorage for Rp2040Eeprom<'d> {
    async fn read(&mut self, address: u16) -> Result<u8, StorageError> {
        self.image
            .get(address as usize)
            .copied()
            .ok_or(StorageError::OutOfRange)
    }

    async fn write(&mut self, address: u16, value: u8) -> Result<(), StorageError> {
        let slot = self
            .image
            .get_mut(address as usize)
            .ok_or(StorageError::OutOfRange)?;
        if *slot != value {
            *slot = value;
            self.dirty = true;
        }
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), StorageError> {
        if !self.dirty {
            return Ok(());
        }

        let mut buffer = [0u8; ITEM_BUFFER_SIZE];
        let image: &[u8] = &self.image;

        map::store_item(
            &mut self.flash,
            CONFIG_RANGE,
            &mut NoCache::new(),
            &mut buffer,
            &EEPROM_KEY,
            &image,
        )
        .await
        .map_err(|_| StorageError::Storage)?;

        self.dirty = false;
        Ok(())
    }

    fn capacity(&self) -> usize {
        EEPROM_SIZE
    }
}
