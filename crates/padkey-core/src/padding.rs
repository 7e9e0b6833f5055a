//! PKCS#7 block padding (RFC 5652 §6.3).
//!
//! This module provides:
//! - [`pkcs7_pad`] / [`pkcs7_unpad`]: byte slice in, byte vector out
//! - [`pkcs7_unpad_in_place`]: truncates a vector after full validation
//! - [`Pkcs7Padder`]: the same operations bound to a validated [`BlockSize`]
//! - [`PaddedBuffer`]: output of [`Pkcs7Padder::pad`], always block-aligned
//!
//! # Rules
//!
//! `pad` appends `N` bytes of value `N`, where `N` is the distance to the
//! next block boundary. Block-aligned input gets a full block of padding,
//! so `N` is always in `1..=block_size` and padding is always present.
//!
//! `unpad` checks, in order: block size, emptiness, alignment, the marker
//! range, then every one of the last `N` bytes. Nothing is returned unless
//! all checks pass.

use std::num::{NonZeroU8, NonZeroUsize};

use serde::{Deserialize, Serialize};

use crate::error::{CryptoError, PaddingFault};

/// Block size used by [`Pkcs7Padder::default`] (one DES block).
pub const DEFAULT_BLOCK_SIZE: usize = 8;

const DEFAULT_BLOCK: NonZeroU8 = match NonZeroU8::new(8) {
    Some(size) => size,
    None => panic!("default block size must be non-zero"),
};

// ---------------------------------------------------------------------------
// BlockSize
// ---------------------------------------------------------------------------

/// A PKCS#7 block size in `1..=255`.
///
/// The upper bound comes from the marker: the pad length is stored in a
/// single byte and can be as large as the block size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct BlockSize(NonZeroU8);

impl BlockSize {
    /// Smallest valid block size.
    pub const MIN: usize = 1;

    /// Largest valid block size.
    pub const MAX: usize = 255;

    /// Validate a block size.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParameter`] if `size` is outside `1..=255`.
    pub fn new(size: usize) -> Result<Self, CryptoError> {
        u8::try_from(size)
            .ok()
            .and_then(NonZeroU8::new)
            .map(Self)
            .ok_or_else(|| {
                CryptoError::InvalidParameter(format!(
                    "block size must be between {} and {}, got {size}",
                    Self::MIN,
                    Self::MAX
                ))
            })
    }

    /// Block size in bytes.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0.get() as usize
    }

    /// Block size as the single byte a full block of padding is made of.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self.0.get()
    }

    /// Number of padding bytes `pad` appends to `data_len` bytes.
    #[must_use]
    pub fn pad_len_for(self, data_len: usize) -> u8 {
        let rem = data_len % NonZeroUsize::from(self.0);
        if rem == 0 {
            return self.as_u8();
        }
        // rem < block size <= 255
        #[allow(clippy::cast_possible_truncation)]
        let rem = rem as u8;
        self.as_u8().saturating_sub(rem)
    }

    fn divides(self, len: usize) -> bool {
        len % NonZeroUsize::from(self.0) == 0
    }
}

impl Default for BlockSize {
    fn default() -> Self {
        Self(DEFAULT_BLOCK)
    }
}

impl TryFrom<usize> for BlockSize {
    type Error = CryptoError;

    fn try_from(size: usize) -> Result<Self, Self::Error> {
        Self::new(size)
    }
}

impl From<BlockSize> for usize {
    fn from(size: BlockSize) -> Self {
        size.get()
    }
}

// ---------------------------------------------------------------------------
// PaddedBuffer
// ---------------------------------------------------------------------------

/// Bytes ending in valid PKCS#7 padding for a known block size.
///
/// Its length is always a positive multiple of the block size.
#[must_use = "padded data must be encrypted or stored"]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaddedBuffer {
    bytes: Vec<u8>,
    block_size: BlockSize,
}

impl PaddedBuffer {
    /// The padded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Total length, padding included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always `false`: padding is never empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Block size the buffer is aligned to.
    #[must_use]
    pub const fn block_size(&self) -> BlockSize {
        self.block_size
    }

    /// Number of trailing padding bytes.
    #[must_use]
    pub fn pad_len(&self) -> u8 {
        self.bytes.last().copied().unwrap_or(0)
    }

    /// Unwrap into the underlying vector.
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.bytes
    }
}

impl AsRef<[u8]> for PaddedBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl From<PaddedBuffer> for Vec<u8> {
    fn from(buf: PaddedBuffer) -> Self {
        buf.bytes
    }
}

// ---------------------------------------------------------------------------
// Pkcs7Padder
// ---------------------------------------------------------------------------

/// PKCS#7 padding for one block size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pkcs7Padder {
    block_size: BlockSize,
}

impl Pkcs7Padder {
    /// Padder for a block size in `1..=255`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParameter`] if `block_size` is out of range.
    pub fn new(block_size: usize) -> Result<Self, CryptoError> {
        Ok(Self::with_block_size(BlockSize::new(block_size)?))
    }

    /// Padder for an already validated block size.
    #[must_use]
    pub const fn with_block_size(block_size: BlockSize) -> Self {
        Self { block_size }
    }

    /// The block size.
    #[must_use]
    pub const fn block_size(&self) -> BlockSize {
        self.block_size
    }

    /// Length of `pad` output for `data_len` input bytes.
    #[must_use]
    pub fn padded_len(&self, data_len: usize) -> usize {
        data_len.saturating_add(usize::from(self.block_size.pad_len_for(data_len)))
    }

    /// Append PKCS#7 padding.
    pub fn pad(&self, data: &[u8]) -> PaddedBuffer {
        let pad_len = self.block_size.pad_len_for(data.len());
        let total = self.padded_len(data.len());
        let mut bytes = Vec::with_capacity(total);
        bytes.extend_from_slice(data);
        bytes.resize(total, pad_len);
        debug_assert!(self.block_size.divides(bytes.len()));
        PaddedBuffer {
            bytes,
            block_size: self.block_size,
        }
    }

    /// Strip and validate PKCS#7 padding, returning a borrowed view.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidPadding`] with the first failing check.
    pub fn strip<'a>(&self, data: &'a [u8]) -> Result<&'a [u8], CryptoError> {
        let content_len = self.content_len(data)?;
        Ok(&data[..content_len])
    }

    /// Strip and validate PKCS#7 padding.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidPadding`] with the first failing check.
    pub fn unpad(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        self.strip(data).map(<[u8]>::to_vec)
    }

    /// Validate padding, then truncate `data` to its content.
    ///
    /// On error `data` is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidPadding`] with the first failing check.
    pub fn unpad_in_place(&self, data: &mut Vec<u8>) -> Result<(), CryptoError> {
        let content_len = self.content_len(data.as_slice())?;
        data.truncate(content_len);
        Ok(())
    }

    /// Length of the content before the padding, after full validation.
    fn content_len(&self, data: &[u8]) -> Result<usize, PaddingFault> {
        let block_size = self.block_size.as_u8();

        if data.is_empty() {
            return Err(PaddingFault::EmptyMessage);
        }
        if !self.block_size.divides(data.len()) {
            return Err(PaddingFault::MisalignedLength {
                len: data.len(),
                block_size,
            });
        }

        let Some(&pad_len) = data.last() else {
            return Err(PaddingFault::EmptyMessage);
        };
        if pad_len == 0 || pad_len > block_size {
            return Err(PaddingFault::PadLengthOutOfRange {
                pad_len,
                block_size,
            });
        }

        // Cannot underflow: data.len() >= block_size >= pad_len.
        let content_len = data
            .len()
            .checked_sub(usize::from(pad_len))
            .ok_or(PaddingFault::PadLengthOutOfRange {
                pad_len,
                block_size,
            })?;
        if data[content_len..].iter().any(|&b| b != pad_len) {
            return Err(PaddingFault::MalformedPaddingBytes);
        }

        Ok(content_len)
    }
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Pad `data` to a multiple of `block_size` per PKCS#7.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidParameter`] if `block_size` is outside `1..=255`.
pub fn pkcs7_pad(data: &[u8], block_size: usize) -> Result<Vec<u8>, CryptoError> {
    Ok(Pkcs7Padder::new(block_size)?.pad(data).into_vec())
}

/// Remove PKCS#7 padding from `data`.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidParameter`] if `block_size` is outside
/// `1..=255`, or [`CryptoError::InvalidPadding`] if `data` is empty,
/// misaligned, ends in an out-of-range marker, or has malformed padding bytes.
pub fn pkcs7_unpad(data: &[u8], block_size: usize) -> Result<Vec<u8>, CryptoError> {
    Pkcs7Padder::new(block_size)?.unpad(data)
}

/// Remove PKCS#7 padding from `data` without reallocating.
///
/// # Errors
///
/// Same as [`pkcs7_unpad`]. `data` is unchanged on error.
pub fn pkcs7_unpad_in_place(data: &mut Vec<u8>, block_size: usize) -> Result<(), CryptoError> {
    Pkcs7Padder::new(block_size)?.unpad_in_place(data)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
