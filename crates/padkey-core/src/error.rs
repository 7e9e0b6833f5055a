//! Error types for `padkey-core`.

use thiserror::Error;

/// Errors produced by key generation and padding operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// A caller-supplied parameter is outside its valid domain
    /// (AES bit length, IV length, block size).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Input to unpad does not conform to PKCS#7 structure.
    #[error("invalid padding: {0}")]
    InvalidPadding(#[from] PaddingFault),

    /// The secure random source could not produce bytes.
    #[error("secure random source unavailable: {0}")]
    RandomSourceUnavailable(String),
}

/// The specific way a buffer failed PKCS#7 validation.
///
/// Variants are listed in the order `unpad` checks them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PaddingFault {
    /// Nothing to unpad.
    #[error("cannot unpad an empty message")]
    EmptyMessage,

    /// Buffer length is not a whole number of blocks.
    #[error("length {len} is not a multiple of block size {block_size}")]
    MisalignedLength {
        /// Length of the rejected buffer.
        len: usize,
        /// Block size the buffer was checked against.
        block_size: u8,
    },

    /// The trailing marker byte is zero or larger than the block size.
    #[error("pad length {pad_len} out of range 1..={block_size}")]
    PadLengthOutOfRange {
        /// Value of the final byte.
        pad_len: u8,
        /// Block size the marker was checked against.
        block_size: u8,
    },

    /// At least one of the trailing `pad_len` bytes differs from `pad_len`.
    #[error("padding bytes malformed")]
    MalformedPaddingBytes,
}

impl CryptoError {
    /// Returns the padding fault if this is an [`CryptoError::InvalidPadding`].
    #[must_use]
    pub const fn padding_fault(&self) -> Option<PaddingFault> {
        match self {
            Self::InvalidPadding(fault) => Some(*fault),
            _ => None,
        }
    }
}
