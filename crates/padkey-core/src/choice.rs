//! NON-CRYPTOGRAPHIC choice of 3DES keying variant.
//!
//! When a caller asks for a 3DES key without naming a valid variant, one of
//! the two variants is picked here. The pick is not secret and does not need
//! to be unpredictable; only the key bytes do, and those never come from
//! this module.
//!
//! Nothing in this module may be used to produce key or IV bytes. Secure
//! bytes come from [`crate::rng::SecureRandom`] only.

use crate::keygen::TripleDesVariant;
use rand::Rng;

/// Decides which 3DES variant to use when the caller did not specify one.
pub trait VariantChooser {
    /// Pick a variant.
    fn choose_variant(&mut self) -> TripleDesVariant;
}

impl<C: VariantChooser + ?Sized> VariantChooser for &mut C {
    fn choose_variant(&mut self) -> TripleDesVariant {
        (**self).choose_variant()
    }
}

/// Coin flip on the thread-local, non-cryptographic-purpose RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngChooser;

impl VariantChooser for ThreadRngChooser {
    fn choose_variant(&mut self) -> TripleDesVariant {
        if rand::thread_rng().gen_bool(0.5) {
            TripleDesVariant::TwoKey
        } else {
            TripleDesVariant::ThreeKey
        }
    }
}

/// Always returns the same variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedVariant(pub TripleDesVariant);

impl VariantChooser for FixedVariant {
    fn choose_variant(&mut self) -> TripleDesVariant {
        self.0
    }
}
