//! Random symmetric keys and initialization vectors.
//!
//! This module provides:
//! - [`generate_des_key`], [`generate_3des_key`], [`generate_aes_key`],
//!   [`generate_iv`]: one-shot helpers backed by the OS CSPRNG
//! - [`KeyMaterialGenerator`]: the same operations over an injected
//!   [`SecureRandom`] and [`VariantChooser`]
//! - [`KeySpec`]: a serializable key request resolved to a byte length
//!
//! Every operation validates its parameters before drawing a single byte.
//! If the secure source fails, the error is returned as-is; there is no
//! retry and no fallback source.

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::choice::{ThreadRngChooser, VariantChooser};
use crate::error::CryptoError;
use crate::material::KeyMaterial;
use crate::rng::{OsSecureRandom, SecureRandom};

/// DES key length in bytes (56 effective bits plus 8 parity bits).
pub const DES_KEY_LEN: usize = 8;

/// AES key size used by [`generate_aes_key_default`].
pub const DEFAULT_AES_KEY_BITS: u32 = 256;

/// IV length used by [`generate_iv_default`] (one DES block).
pub const DEFAULT_IV_LEN: usize = 8;

/// 3DES variant used by [`generate_3des_key_default`].
pub const DEFAULT_TRIPLE_DES_VARIANT: TripleDesVariant = TripleDesVariant::TwoKey;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// 3DES keying option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TripleDesVariant {
    /// Keying option 2: K1, K2, K1 (16 bytes).
    TwoKey,
    /// Keying option 1: K1, K2, K3 (24 bytes).
    ThreeKey,
}

impl TripleDesVariant {
    /// Map a key count (2 or 3) to a variant. Any other value yields `None`.
    #[must_use]
    pub const fn from_key_count(count: u8) -> Option<Self> {
        match count {
            2 => Some(Self::TwoKey),
            3 => Some(Self::ThreeKey),
            _ => None,
        }
    }

    /// Number of independent DES keys.
    #[must_use]
    pub const fn key_count(self) -> u8 {
        match self {
            Self::TwoKey => 2,
            Self::ThreeKey => 3,
        }
    }

    /// Key length in bytes.
    #[must_use]
    pub const fn key_len(self) -> usize {
        match self {
            Self::TwoKey => 16,
            Self::ThreeKey => 24,
        }
    }
}

/// AES key size. Serialized as its bit length (`128`, `192`, `256`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum AesKeySize {
    /// AES-128 (16 bytes).
    Aes128,
    /// AES-192 (24 bytes).
    Aes192,
    /// AES-256 (32 bytes).
    Aes256,
}

impl AesKeySize {
    /// Validate a bit length.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParameter`] unless `bits` is 128, 192 or 256.
    pub fn from_bits(bits: u32) -> Result<Self, CryptoError> {
        match bits {
            128 => Ok(Self::Aes128),
            192 => Ok(Self::Aes192),
            256 => Ok(Self::Aes256),
            other => Err(CryptoError::InvalidParameter(format!(
                "AES key size must be 128, 192 or 256 bits, got {other}"
            ))),
        }
    }

    /// Key size in bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::Aes128 => 128,
            Self::Aes192 => 192,
            Self::Aes256 => 256,
        }
    }

    /// Key length in bytes.
    #[must_use]
    pub const fn key_len(self) -> usize {
        match self {
            Self::Aes128 => 16,
            Self::Aes192 => 24,
            Self::Aes256 => 32,
        }
    }
}

impl TryFrom<u32> for AesKeySize {
    type Error = CryptoError;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        Self::from_bits(bits)
    }
}

impl From<AesKeySize> for u32 {
    fn from(size: AesKeySize) -> Self {
        size.bits()
    }
}

/// Block ciphers whose block size determines an IV length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockCipher {
    /// DES, 64-bit block.
    Des,
    /// Triple DES, 64-bit block.
    TripleDes,
    /// AES, 128-bit block regardless of key size.
    Aes,
}

impl BlockCipher {
    /// Block size in bytes.
    #[must_use]
    pub const fn block_size(self) -> usize {
        match self {
            Self::Des | Self::TripleDes => 8,
            Self::Aes => 16,
        }
    }
}

/// A request for random key material.
///
/// Sizes are validated when the spec is built (or deserialized), so a
/// `KeySpec` always resolves to a positive byte length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "camelCase")]
pub enum KeySpec {
    /// Single DES key.
    Des,
    /// Triple DES key.
    TripleDes {
        /// Keying option.
        variant: TripleDesVariant,
    },
    /// AES key.
    Aes {
        /// Key size.
        size: AesKeySize,
    },
    /// Initialization vector.
    Iv {
        /// Length in bytes.
        len: NonZeroUsize,
    },
}

impl KeySpec {
    /// AES spec from a bit length.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParameter`] unless `bits` is 128, 192 or 256.
    pub fn aes(bits: u32) -> Result<Self, CryptoError> {
        Ok(Self::Aes {
            size: AesKeySize::from_bits(bits)?,
        })
    }

    /// IV spec from a byte length.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParameter`] if `len` is zero.
    pub fn iv(len: usize) -> Result<Self, CryptoError> {
        Ok(Self::Iv {
            len: iv_len(len)?,
        })
    }

    /// Number of bytes this spec resolves to.
    #[must_use]
    pub const fn byte_len(&self) -> usize {
        match self {
            Self::Des => DES_KEY_LEN,
            Self::TripleDes { variant } => variant.key_len(),
            Self::Aes { size } => size.key_len(),
            Self::Iv { len } => len.get(),
        }
    }

    const fn label(&self) -> &'static str {
        match self {
            Self::Des => "des",
            Self::TripleDes { .. } => "3des",
            Self::Aes { .. } => "aes",
            Self::Iv { .. } => "iv",
        }
    }
}

fn iv_len(len: usize) -> Result<NonZeroUsize, CryptoError> {
    NonZeroUsize::new(len).ok_or_else(|| {
        CryptoError::InvalidParameter("IV block size must be greater than zero, got 0".into())
    })
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

/// Key and IV generator over an injectable secure source.
///
/// The default instance uses [`OsSecureRandom`] for key bytes and
/// [`ThreadRngChooser`] for the non-secret 3DES variant fallback.
#[derive(Debug, Clone, Default)]
pub struct KeyMaterialGenerator<R = OsSecureRandom, C = ThreadRngChooser> {
    rng: R,
    chooser: C,
}

impl KeyMaterialGenerator {
    /// Generator over the OS CSPRNG with a thread-RNG variant fallback.
    #[must_use]
    pub const fn os() -> Self {
        Self {
            rng: OsSecureRandom,
            chooser: ThreadRngChooser,
        }
    }
}

impl<R: SecureRandom, C: VariantChooser> KeyMaterialGenerator<R, C> {
    /// Build a generator from a secure source and a variant chooser.
    pub const fn new(rng: R, chooser: C) -> Self {
        Self { rng, chooser }
    }

    /// 8 random bytes for a DES key.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::RandomSourceUnavailable`] if the source fails.
    pub fn des_key(&mut self) -> Result<KeyMaterial, CryptoError> {
        self.generate(&KeySpec::Des)
    }

    /// 16 or 24 random bytes for a 3DES key.
    ///
    /// `key_count` of `Some(2)` or `Some(3)` selects the variant. Anything
    /// else, including `None`, defers to the non-cryptographic chooser.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::RandomSourceUnavailable`] if the source fails.
    pub fn triple_des_key(&mut self, key_count: Option<u8>) -> Result<KeyMaterial, CryptoError> {
        let variant = match key_count.and_then(TripleDesVariant::from_key_count) {
            Some(variant) => variant,
            None => {
                let chosen = self.chooser.choose_variant();
                tracing::debug!(
                    requested = ?key_count,
                    chosen = chosen.key_count(),
                    "3DES variant not specified, chose one"
                );
                chosen
            }
        };
        self.generate(&KeySpec::TripleDes { variant })
    }

    /// `bits / 8` random bytes for an AES key.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParameter`] unless `bits` is 128, 192
    /// or 256 (nothing is drawn in that case), and
    /// [`CryptoError::RandomSourceUnavailable`] if the source fails.
    pub fn aes_key(&mut self, bits: u32) -> Result<KeyMaterial, CryptoError> {
        let spec = KeySpec::aes(bits)?;
        self.generate(&spec)
    }

    /// `block_size` random bytes for an IV.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParameter`] if `block_size` is zero
    /// (nothing is drawn in that case), and
    /// [`CryptoError::RandomSourceUnavailable`] if the source fails.
    pub fn iv(&mut self, block_size: usize) -> Result<KeyMaterial, CryptoError> {
        let spec = KeySpec::iv(block_size)?;
        self.generate(&spec)
    }

    /// IV sized to `cipher`'s block.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::RandomSourceUnavailable`] if the source fails.
    pub fn iv_for(&mut self, cipher: BlockCipher) -> Result<KeyMaterial, CryptoError> {
        self.iv(cipher.block_size())
    }

    /// Random bytes for any [`KeySpec`].
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::RandomSourceUnavailable`] if the source fails.
    pub fn generate(&mut self, spec: &KeySpec) -> Result<KeyMaterial, CryptoError> {
        let len = spec.byte_len();
        let mut bytes = vec![0u8; len];
        if let Err(e) = self.rng.fill_secure(&mut bytes) {
            bytes.zeroize();
            return Err(e);
        }
        tracing::trace!(algorithm = spec.label(), len, "drew key material");
        Ok(KeyMaterial::from_vec(bytes))
    }
}

// ---------------------------------------------------------------------------
// One-shot helpers
// ---------------------------------------------------------------------------

/// Random DES key (8 bytes) from the OS CSPRNG.
///
/// # Errors
///
/// Returns [`CryptoError::RandomSourceUnavailable`] if the CSPRNG fails.
pub fn generate_des_key() -> Result<KeyMaterial, CryptoError> {
    KeyMaterialGenerator::os().des_key()
}

/// Random 3DES key: 16 bytes for `Some(2)`, 24 bytes for `Some(3)`.
///
/// Any other input picks one of the two variants at random using a
/// non-cryptographic RNG; the key bytes still come from the OS CSPRNG.
///
/// # Errors
///
/// Returns [`CryptoError::RandomSourceUnavailable`] if the CSPRNG fails.
pub fn generate_3des_key(key_count: Option<u8>) -> Result<KeyMaterial, CryptoError> {
    KeyMaterialGenerator::os().triple_des_key(key_count)
}

/// Random two-key 3DES key (16 bytes).
///
/// Never consults the variant chooser.
///
/// # Errors
///
/// Returns [`CryptoError::RandomSourceUnavailable`] if the CSPRNG fails.
pub fn generate_3des_key_default() -> Result<KeyMaterial, CryptoError> {
    generate(&KeySpec::TripleDes {
        variant: DEFAULT_TRIPLE_DES_VARIANT,
    })
}

/// Random AES key of `bits` bits.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidParameter`] unless `bits` is 128, 192 or 256.
/// Returns [`CryptoError::RandomSourceUnavailable`] if the CSPRNG fails.
pub fn generate_aes_key(bits: u32) -> Result<KeyMaterial, CryptoError> {
    KeyMaterialGenerator::os().aes_key(bits)
}

/// Random AES-256 key.
///
/// # Errors
///
/// Returns [`CryptoError::RandomSourceUnavailable`] if the CSPRNG fails.
pub fn generate_aes_key_default() -> Result<KeyMaterial, CryptoError> {
    generate_aes_key(DEFAULT_AES_KEY_BITS)
}

/// Random IV of `block_size` bytes.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidParameter`] if `block_size` is zero.
/// Returns [`CryptoError::RandomSourceUnavailable`] if the CSPRNG fails.
pub fn generate_iv(block_size: usize) -> Result<KeyMaterial, CryptoError> {
    KeyMaterialGenerator::os().iv(block_size)
}

/// Random 8-byte IV.
///
/// # Errors
///
/// Returns [`CryptoError::RandomSourceUnavailable`] if the CSPRNG fails.
pub fn generate_iv_default() -> Result<KeyMaterial, CryptoError> {
    generate_iv(DEFAULT_IV_LEN)
}

/// Random IV matching `cipher`'s block size.
///
/// # Errors
///
/// Returns [`CryptoError::RandomSourceUnavailable`] if the CSPRNG fails.
pub fn generate_iv_for(cipher: BlockCipher) -> Result<KeyMaterial, CryptoError> {
    KeyMaterialGenerator::os().iv_for(cipher)
}

/// Random bytes for any [`KeySpec`].
///
/// # Errors
///
/// Returns [`CryptoError::RandomSourceUnavailable`] if the CSPRNG fails.
pub fn generate(spec: &KeySpec) -> Result<KeyMaterial, CryptoError> {
    KeyMaterialGenerator::os().generate(spec)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
