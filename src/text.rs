// text.rs

use std::borrow::Cow;

use heapless::Vec;

use crate::{TextError, MAX_TEXT_LEN, TEXT_BUF_LEN};

/// Short text kept in a fixed 32 byte buffer with a separate length byte.
///
/// The stored length is authoritative. The terminator written after the
/// content only helps code that treats the buffer as a C string.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FixedText {
    bytes: Vec<u8, MAX_TEXT_LEN>,
}

impl FixedText {
    pub fn new(s: &str) -> Result<Self, TextError> {
        let raw = s.as_bytes();
        if raw.len() > MAX_TEXT_LEN {
            return Err(TextError::TooLong(raw.len()));
        }
        if raw.contains(&0) {
            return Err(TextError::InteriorNul);
        }
        let bytes = Vec::from_slice(raw).map_err(|_| TextError::TooLong(raw.len()))?;
        Ok(Self { bytes })
    }

    /// Rebuild from a stored buffer and its length byte. A length larger
    /// than the buffer can hold is clamped.
    pub fn from_stored(buf: &[u8; TEXT_BUF_LEN], len: u8) -> Self {
        let len = (len as usize).min(MAX_TEXT_LEN);
        let mut bytes = Vec::new();
        // cannot overflow: len <= MAX_TEXT_LEN
        let _ = bytes.extend_from_slice(&buf[..len]);
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> u8 {
        self.bytes.len() as u8
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn to_str_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }

    /// Zero-filled buffer holding the content and its terminator.
    pub fn to_buffer(&self) -> [u8; TEXT_BUF_LEN] {
        let mut buf = [0u8; TEXT_BUF_LEN];
        buf[..self.bytes.len()].copy_from_slice(&self.bytes);
        buf
    }
}

impl PartialEq<str> for FixedText {
    fn eq(&self, other: &str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}


// EOF
