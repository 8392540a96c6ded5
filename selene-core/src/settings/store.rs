//! Settings store over byte-addressed storage

use selene_hal::{ByteStorage, StorageError};

use super::record::{PersistedSettings, SettingsError, RECORD_SIZE};

/// Loads and saves [`PersistedSettings`] at a fixed base address
pub struct SettingsStore<S: ByteStorage> {
    storage: S,
    base_address: u16,
}

impl<S: ByteStorage> SettingsStore<S> {
    /// Create a store for the record at `base_address`
    pub fn new(storage: S, base_address: u16) -> Self {
        Self {
            storage,
            base_address,
        }
    }

    /// Load the stored settings
    ///
    /// If storage does not hold a valid record, it is rewritten with the
    /// defaults and the defaults are returned. A failed repair is logged
    /// and the defaults are still returned.
    pub async fn load(&mut self) -> PersistedSettings {
        match self.read_record().await {
            Ok(settings) => {
                info!("settings loaded");
                return settings;
            }
            Err(SettingsError::Uninitialized) => {
                info!("settings uninitialized, writing defaults");
            }
            Err(SettingsError::Storage(err)) => {
                warn!("settings read failed: {:?}", err);
            }
        }

        let defaults = PersistedSettings::DEFAULT;
        if let Err(err) = self.save(&defaults).await {
            warn!("writing default settings failed: {:?}", err);
        }
        defaults
    }

    /// Save settings, writing only bytes that differ from storage
    ///
    /// Storage is flushed only when something changed. Returns the number
    /// of bytes written.
    pub async fn save(&mut self, settings: &PersistedSettings) -> Result<usize, SettingsError> {
        self.check_fits()?;
        let encoded = settings.encode();
        let mut written = 0;

        for (offset, &value) in encoded.iter().enumerate() {
            let address = self.address(offset)?;
            if self.storage.read(address).await? != value {
                self.storage.write(address, value).await?;
                written += 1;
            }
        }

        if written > 0 {
            self.storage.flush().await?;
            debug!("settings saved, {} bytes changed", written);
        }
        Ok(written)
    }

    /// The underlying storage
    pub fn storage(&self) -> &S {
        &self.storage
    }

    async fn read_record(&mut self) -> Result<PersistedSettings, SettingsError> {
        self.check_fits()?;
        let mut bytes = [0u8; RECORD_SIZE];
        for (offset, byte) in bytes.iter_mut().enumerate() {
            let address = self.address(offset)?;
            *byte = self.storage.read(address).await?;
        }
        PersistedSettings::decode(&bytes)
    }

    /// The whole record must lie inside storage before any byte is touched
    fn check_fits(&self) -> Result<(), SettingsError> {
        if usize::from(self.base_address) + RECORD_SIZE > self.storage.capacity() {
            return Err(SettingsError::Storage(StorageError::OutOfRange));
        }
        Ok(())
    }

    fn address(&self, offset: usize) -> Result<u16, SettingsError> {
        u16::try_from(offset)
            .ok()
            .and_then(|offset| self.base_address.checked_add(offset))
            .ok_or(SettingsError::Storage(StorageError::OutOfRange))
    }
}
