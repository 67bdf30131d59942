// store.rs

use std::fmt;

use crate::*;

/// The only path between a [`ConfigRecord`] and the backing bytes.
///
/// Offsets taken by [`RomStore::write_field`] and [`RomStore::erase`] are
/// absolute positions in the backing store; use [`RomStore::field_offset`]
/// to turn a field constant from [`offset`] into one.
pub struct RomStore<B: Backing> {
    backing: B,
    base: usize,
}

impl<B: Backing> RomStore<B> {
    pub fn new(backing: B) -> Result<Self, StoreError> {
        Self::with_base(backing, DEFAULT_BASE_OFFSET)
    }

    pub fn with_base(backing: B, base: usize) -> Result<Self, StoreError> {
        if base % 8 != 0 {
            return Err(StoreError::Misaligned(base));
        }
        if base.checked_add(RECORD_SIZE).filter(|end| *end <= backing.capacity()).is_none() {
            return Err(StoreError::OutOfRange {
                offset: base,
                len: RECORD_SIZE,
                capacity: backing.capacity(),
            });
        }
        Ok(Self { backing, base })
    }

    pub fn base(&self) -> usize {
        self.base
    }

    pub fn field_offset(&self, field: usize) -> usize {
        self.base + field
    }

    pub fn backing(&self) -> &B {
        &self.backing
    }

    pub fn into_backing(self) -> B {
        self.backing
    }

    /// Zero `size` bytes starting at `offset` and commit. Destructive, meant
    /// for full wipes only.
    pub fn erase(&mut self, size: usize, offset: usize) -> Result<(), StoreError> {
        let capacity = self.backing.capacity();
        if offset.checked_add(size).filter(|end| *end <= capacity).is_none() {
            return Err(StoreError::OutOfRange {
                offset,
                len: size,
                capacity,
            });
        }
        let zeros = vec![0u8; size];
        self.backing.write(offset, &zeros)?;
        self.backing.commit()?;
        info!("Erased {size} bytes at offset {offset}");
        Ok(())
    }

    /// Fill `record` with the factory defaults and store it as one block at
    /// the base offset. `None` is accepted and does nothing.
    pub fn initialize_defaults(&mut self, record: Option<&mut ConfigRecord>) -> Result<(), StoreError> {
        let Some(record) = record else {
            warn!("initialize_defaults: no record given, nothing written");
            return Ok(());
        };
        *record = ConfigRecord::defaults();
        self.backing.write(self.base, &record.to_bytes())?;
        self.backing.commit()?;
        info!("Default configuration written at offset {}", self.base);
        Ok(())
    }

    /// Store `bytes` at absolute `offset` and commit. This is the primitive
    /// every configuration change goes through.
    ///
    /// Offsets below the record base are refused without touching the store.
    pub fn write_field(&mut self, offset: usize, bytes: &[u8]) -> Result<(), StoreError> {
        if offset < self.base {
            warn!(
                "write_field: offset {offset} is below record base {}, ignored",
                self.base
            );
            return Err(StoreError::BelowBase {
                offset,
                base: self.base,
            });
        }
        debug!("write_field: offset = {offset} size = {} value = {:?}", bytes.len(), Hex(bytes));
        self.backing.write(offset, bytes)?;
        self.backing.commit()
    }

    pub fn read_record(&self) -> Result<ConfigRecord, StoreError> {
        Ok(ConfigRecord::from_bytes(&self.read_raw()?))
    }

    /// The stored record bytes, undecoded.
    pub fn read_raw(&self) -> Result<[u8; RECORD_SIZE], StoreError> {
        let mut buf = [0u8; RECORD_SIZE];
        self.backing.read(self.base, &mut buf)?;
        Ok(buf)
    }

    /// Copy of the whole backing store.
    pub fn snapshot(&self) -> Result<Vec<u8>, StoreError> {
        let mut buf = vec![0u8; self.backing.capacity()];
        self.backing.read(0, &mut buf)?;
        Ok(buf)
    }
}

/// Log every field of `record`, preceded by `label` when given.
pub fn dump_to_diagnostics(record: Option<&ConfigRecord>, label: Option<&str>) {
    if let Some(record) = record {
        for line in record.diagnostics(label).to_string().lines() {
            info!("{line}");
        }
    }
}

struct Hex<'a>(&'a [u8]);

impl fmt::Debug for Hex<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_must_be_aligned_and_fit() {
        assert!(matches!(
            RomStore::with_base(MemBacking::default(), 4),
            Err(StoreError::Misaligned(4))
        ));
        assert!(matches!(
            RomStore::with_base(MemBacking::new(RECORD_SIZE + 7), 8),
            Err(StoreError::OutOfRange { .. })
        ));
        assert!(RomStore::with_base(MemBacking::new(RECORD_SIZE + 8), 8).is_ok());
        assert!(matches!(
            RomStore::with_base(MemBacking::default(), usize::MAX & !7),
            Err(StoreError::OutOfRange { .. })
        ));
    }

    #[test]
    fn erase_zeroes_only_the_requested_range() {
        let mut store = RomStore::new(MemBacking::from_bytes(vec![0xaa; 256])).unwrap();
        store.erase(4, 10).unwrap();
        let snap = store.snapshot().unwrap();
        assert_eq!(&snap[8..16], &[0xaa, 0xaa, 0, 0, 0, 0, 0xaa, 0xaa]);
        assert_eq!(store.backing().flushes(), 1);

        assert!(store.erase(8, 250).is_err());
        assert_eq!(store.snapshot().unwrap(), snap);

        assert!(matches!(
            store.erase(usize::MAX, 0),
            Err(StoreError::OutOfRange { .. })
        ));
        assert!(store.erase(2, usize::MAX).is_err());
        assert_eq!(store.snapshot().unwrap(), snap);
        assert_eq!(store.backing().flushes(), 1);

        store.erase(256, 0).unwrap();
        assert!(store.snapshot().unwrap().iter().all(|b| *b == 0));
    }

    #[test]
    fn defaults_are_written_at_the_base() {
        let mut store = RomStore::with_base(MemBacking::default(), 16).unwrap();
        let mut record = ConfigRecord::defaults();
        record.temp_high_limit = 100;
        store.initialize_defaults(Some(&mut record)).unwrap();
        assert_eq!(record, ConfigRecord::defaults());

        let snap = store.snapshot().unwrap();
        assert!(snap[..16].iter().all(|b| *b == 0));
        assert_eq!(&snap[16..16 + RECORD_SIZE], &ConfigRecord::defaults().to_bytes()[..]);
        assert_eq!(store.read_record().unwrap(), ConfigRecord::defaults());
    }

    #[test]
    fn missing_record_writes_nothing() {
        let mut store = RomStore::new(MemBacking::default()).unwrap();
        store.initialize_defaults(None).unwrap();
        assert!(store.snapshot().unwrap().iter().all(|b| *b == 0));
        assert_eq!(store.backing().flushes(), 0);
    }

    #[test]
    fn empty_write_commits_nothing() {
        let mut store = RomStore::new(MemBacking::default()).unwrap();
        store.write_field(offset::LABEL, &[]).unwrap();
        assert_eq!(store.backing().flushes(), 0);
    }

    #[test]
    fn hex_formats_bytes() {
        assert_eq!(format!("{:?}", Hex(&[0x0a, 0xff, 0])), "0a ff 00");
    }
}

// EOF
