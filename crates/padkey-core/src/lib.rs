//! `padkey-core`: symmetric key material generation and PKCS#7 padding.
//!
//! Pure functions only: zero network, zero async, no persisted state.
//! Key and IV bytes come exclusively from a [`SecureRandom`] source; the
//! non-cryptographic 3DES variant fallback lives apart in [`choice`].

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

pub mod error;
pub mod rng;

pub mod choice;
pub mod material;

pub mod keygen;

pub mod padding;

pub use choice::{FixedVariant, ThreadRngChooser, VariantChooser};
pub use error::{CryptoError, PaddingFault};
pub use keygen::{
    generate, generate_3des_key, generate_3des_key_default, generate_aes_key,
    generate_aes_key_default, generate_des_key, generate_iv, generate_iv_default, generate_iv_for,
    AesKeySize, BlockCipher, KeyMaterialGenerator, KeySpec, TripleDesVariant, DEFAULT_AES_KEY_BITS,
    DEFAULT_IV_LEN, DEFAULT_TRIPLE_DES_VARIANT, DES_KEY_LEN,
};
pub use material::KeyMaterial;
pub use padding::{
    pkcs7_pad, pkcs7_unpad, pkcs7_unpad_in_place, BlockSize, PaddedBuffer, Pkcs7Padder,
    DEFAULT_BLOCK_SIZE,
};
pub use rng::{OsSecureRandom, SecureRandom};
