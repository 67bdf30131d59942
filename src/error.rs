// error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("write of {len} bytes at offset {offset} exceeds capacity {capacity}")]
    OutOfRange {
        offset: usize,
        len: usize,
        capacity: usize,
    },
    #[error("offset {offset} is below the record base offset {base}")]
    BelowBase { offset: usize, base: usize },
    #[error("record base offset {0} is not 8-byte aligned")]
    Misaligned(usize),
    #[error("storage commit failed: {0}")]
    CommitFailed(String),
    #[error("storage i/o error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextError {
    #[error("text is too long ({0} bytes)")]
    TooLong(usize),
    #[error("text contains a NUL byte")]
    InteriorNul,
}

// EOF
