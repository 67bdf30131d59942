// nvs.rs
//
// EEPROM emulation on top of an ESP-IDF NVS namespace: the whole image is
// one sealed blob, rewritten on commit.

use esp_idf_svc::nvs::{EspNvs, NvsDefault};

use crate::*;

const IMAGE_KEY: &str = "eeprom";
// postcard length prefix plus CRC-32
const SEAL_OVERHEAD: usize = 16;

pub struct NvsBacking {
    nvs: EspNvs<NvsDefault>,
    image: EepromImage,
}

impl NvsBacking {
    pub fn open(nvs: EspNvs<NvsDefault>, capacity: usize) -> Result<Self, StoreError> {
        let mut buf = vec![0u8; capacity + SEAL_OVERHEAD];
        let stored = nvs
            .get_blob(IMAGE_KEY, &mut buf)
            .map_err(|e| StoreError::CommitFailed(format!("nvs read: {e:?}")))?;
        let image = match stored {
            None => {
                info!("No configuration image in nvs yet, starting blank");
                EepromImage::blank(capacity)
            }
            Some(sealed) => match open_image(sealed, capacity) {
                Some(data) => EepromImage::from_vec(data),
                None => {
                    error!("Configuration image in nvs is damaged, starting blank");
                    EepromImage::blank(capacity)
                }
            },
        };
        Ok(Self { nvs, image })
    }
}

impl Backing for NvsBacking {
    fn capacity(&self) -> usize {
        self.image.capacity()
    }

    fn read(&self, offset: usize, buf: &mut [u8]) -> Result<(), StoreError> {
        self.image.read(offset, buf)
    }

    fn write(&mut self, offset: usize, bytes: &[u8]) -> Result<(), StoreError> {
        self.image.write(offset, bytes)
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        if !self.image.is_dirty() {
            return Ok(());
        }
        let sealed = seal_image(self.image.as_bytes())?;
        self.nvs
            .set_blob(IMAGE_KEY, &sealed)
            .map_err(|e| StoreError::CommitFailed(format!("nvs write: {e:?}")))?;
        self.image.mark_clean();
        Ok(())
    }
}

// EOF
