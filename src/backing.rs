// backing.rs
//
// Byte-addressable non-volatile storage as seen by the record store. All
// implementations follow the EEPROM emulation model: writes land in a RAM
// image and only become durable once commit() returns.

use std::{
    fs,
    path::{Path, PathBuf},
};

use crc::{Crc, CRC_32_ISO_HDLC};
use serde::{Deserialize, Serialize};

use crate::*;

const IMAGE_CRC: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

pub trait Backing {
    fn capacity(&self) -> usize;
    fn read(&self, offset: usize, buf: &mut [u8]) -> Result<(), StoreError>;
    fn write(&mut self, offset: usize, bytes: &[u8]) -> Result<(), StoreError>;
    /// Flush pending writes. Nothing is durable before this returns.
    fn commit(&mut self) -> Result<(), StoreError>;
}

/// RAM copy of the emulated EEPROM with a dirty marker.
#[derive(Clone, Debug)]
pub struct EepromImage {
    data: Vec<u8>,
    dirty: bool,
}

impl EepromImage {
    pub fn blank(capacity: usize) -> Self {
        Self {
            data: vec![0; capacity],
            dirty: false,
        }
    }

    pub fn from_vec(data: Vec<u8>) -> Self {
        Self { data, dirty: false }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn check_range(&self, offset: usize, len: usize) -> Result<(), StoreError> {
        match offset.checked_add(len) {
            Some(end) if end <= self.data.len() => Ok(()),
            _ => Err(StoreError::OutOfRange {
                offset,
                len,
                capacity: self.data.len(),
            }),
        }
    }

    pub fn read(&self, offset: usize, buf: &mut [u8]) -> Result<(), StoreError> {
        self.check_range(offset, buf.len())?;
        buf.copy_from_slice(&self.data[offset..offset + buf.len()]);
        Ok(())
    }

    /// Bytes that already hold the requested value do not mark the image
    /// dirty, so rewriting an unchanged field never reaches flash.
    pub fn write(&mut self, offset: usize, bytes: &[u8]) -> Result<(), StoreError> {
        self.check_range(offset, bytes.len())?;
        let dst = &mut self.data[offset..offset + bytes.len()];
        if dst[..] != bytes[..] {
            dst.copy_from_slice(bytes);
            self.dirty = true;
        }
        Ok(())
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }
}

#[derive(Serialize, Deserialize)]
struct SealedImage<'a> {
    #[serde(borrow)]
    data: &'a [u8],
}

/// Wrap the image in a postcard frame with a trailing CRC-32.
pub fn seal_image(image: &[u8]) -> Result<Vec<u8>, StoreError> {
    postcard::to_allocvec_crc32(&SealedImage { data: image }, IMAGE_CRC.digest())
        .map_err(|e| StoreError::CommitFailed(format!("image encode: {e:?}")))
}

/// Inverse of [`seal_image`]. Anything that fails the CRC or has the wrong
/// size yields `None` and is treated as a blank device by the callers.
pub fn open_image(sealed: &[u8], capacity: usize) -> Option<Vec<u8>> {
    let image: SealedImage = postcard::from_bytes_crc32(sealed, IMAGE_CRC.digest()).ok()?;
    (image.data.len() == capacity).then(|| image.data.to_vec())
}

/// Volatile backing, mostly for tests and host-side simulation.
#[derive(Clone, Debug)]
pub struct MemBacking {
    image: EepromImage,
    commits: usize,
}

impl MemBacking {
    pub fn new(capacity: usize) -> Self {
        Self {
            image: EepromImage::blank(capacity),
            commits: 0,
        }
    }

    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self {
            image: EepromImage::from_vec(data),
            commits: 0,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.image.as_bytes()
    }

    /// Number of commits that actually flushed something.
    pub fn flushes(&self) -> usize {
        self.commits
    }
}

impl Default for MemBacking {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl Backing for MemBacking {
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
        if self.image.is_dirty() {
            self.commits += 1;
            self.image.mark_clean();
        }
        Ok(())
    }
}

/// Sealed image kept in a regular file. Commit writes a sibling temp file
/// and renames it over the old one.
#[derive(Debug)]
pub struct FileBacking {
    path: PathBuf,
    image: EepromImage,
}

impl FileBacking {
    pub fn open<P: AsRef<Path>>(path: P, capacity: usize) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let image = match fs::read(&path) {
            Ok(sealed) => match open_image(&sealed, capacity) {
                Some(data) => EepromImage::from_vec(data),
                None => {
                    warn!("{}: bad image checksum or size, starting blank", path.display());
                    EepromImage::blank(capacity)
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("{}: no image yet, starting blank", path.display());
                EepromImage::blank(capacity)
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, image })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Backing for FileBacking {
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
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, &sealed)?;
        fs::rename(&tmp, &self.path)?;
        self.image.mark_clean();
        Ok(())
    }
}


// EOF
