//! Secure randomness seam.
//!
//! Every key and IV byte in this crate comes through [`SecureRandom`]. The
//! production implementation is [`OsSecureRandom`], backed by the operating
//! system CSPRNG (`OsRng`). Tests inject deterministic or failing sources.
//!
//! The non-cryptographic choice used for the 3DES variant fallback lives in
//! [`crate::choice`] and never touches this module.

use crate::error::CryptoError;
use rand::rngs::OsRng;
use rand::RngCore;

/// A source of cryptographically secure random bytes.
///
/// Implementations must either fill the whole buffer or return an error.
/// They must never fall back to a weaker source.
pub trait SecureRandom {
    /// Fill `dest` entirely with secure random bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::RandomSourceUnavailable`] if the source cannot
    /// produce bytes.
    fn fill_secure(&mut self, dest: &mut [u8]) -> Result<(), CryptoError>;
}

impl<R: SecureRandom + ?Sized> SecureRandom for &mut R {
    fn fill_secure(&mut self, dest: &mut [u8]) -> Result<(), CryptoError> {
        (**self).fill_secure(dest)
    }
}

/// Operating-system CSPRNG (`getrandom` via `rand::rngs::OsRng`).
#[derive(Debug, Clone, Copy, Default)]
pub struct OsSecureRandom;

impl SecureRandom for OsSecureRandom {
    fn fill_secure(&mut self, dest: &mut [u8]) -> Result<(), CryptoError> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| CryptoError::RandomSourceUnavailable(format!("CSPRNG fill failed: {e}")))
    }
}
