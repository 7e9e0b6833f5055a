//! Container for generated key material.
//!
//! [`KeyMaterial`] owns the random bytes returned by every generator in
//! [`crate::keygen`]. It:
//! - zeroes the bytes on drop (via `secrecy`/`zeroize`)
//! - locks the pages under the heap allocation in RAM via `mlock` where
//!   available
//! - masks its contents in `Debug`/`Display`
//!
//! `mlock` works on whole pages and does not nest, while small keys share
//! pages freely. Locked pages are therefore reference-counted process-wide:
//! a page is locked by its first holder and unlocked by its last.

use secrecy::{ExposeSecret, ExposeSecretMut, SecretSlice};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use zeroize::{Zeroize, Zeroizing};

// ---------------------------------------------------------------------------
// Page registry
// ---------------------------------------------------------------------------

/// Page start address -> number of live `KeyMaterial` values on that page.
static LOCKED_PAGES: Mutex<BTreeMap<usize, usize>> = Mutex::new(BTreeMap::new());

fn locked_pages() -> MutexGuard<'static, BTreeMap<usize, usize>> {
    // The map is consistent between statements; a panic elsewhere cannot
    // leave it half-updated.
    LOCKED_PAGES.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Pages covering `len` bytes at `addr`, as (first page, page count).
fn page_span(addr: usize, len: usize, page: usize) -> Option<(usize, usize)> {
    let last = addr.checked_add(len.checked_sub(1)?)?;
    let mask = !page.checked_sub(1)?;
    let first = addr & mask;
    let count = (last & mask)
        .checked_sub(first)?
        .checked_div(page)?
        .checked_add(1)?;
    Some((first, count))
}

fn pages(first: usize, count: usize, page: usize) -> impl Iterator<Item = usize> {
    std::iter::successors(Some(first), move |p| p.checked_add(page)).take(count)
}

/// Drop one reference to each page, unlocking pages nobody holds any more.
fn release_pages(map: &mut BTreeMap<usize, usize>, first: usize, count: usize, page: usize) {
    for addr in pages(first, count, page) {
        match map.get(&addr).copied() {
            Some(held) if held > 1 => {
                map.insert(addr, held.saturating_sub(1));
            }
            Some(_) => {
                map.remove(&addr);
                platform::try_munlock(addr, page);
            }
            None => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Memory locking
// ---------------------------------------------------------------------------

/// RAII guard holding one registry reference per page of an allocation.
///
/// Must be dropped while the allocation is still live.
struct LockedRegion {
    first: usize,
    count: usize,
    page: usize,
    locked: bool,
}

impl LockedRegion {
    const UNLOCKED: Self = Self {
        first: 0,
        count: 0,
        page: 0,
        locked: false,
    };

    /// Lock the pages under `bytes`. A failed lock is not an error.
    fn try_lock(bytes: &[u8]) -> Self {
        let page = platform::page_size();
        let Some((first, count)) = page_span(bytes.as_ptr() as usize, bytes.len(), page) else {
            return Self::UNLOCKED;
        };

        let mut map = locked_pages();
        for (taken, addr) in pages(first, count, page).enumerate() {
            let held = map.get(&addr).copied().unwrap_or(0);
            if held == 0 && !platform::try_mlock(addr, page) {
                release_pages(&mut map, first, taken, page);
                drop(map);
                warn_lock_failed(bytes.len());
                return Self::UNLOCKED;
            }
            map.insert(addr, held.saturating_add(1));
        }

        Self {
            first,
            count,
            page,
            locked: true,
        }
    }

    const fn is_locked(&self) -> bool {
        self.locked
    }
}

impl Drop for LockedRegion {
    fn drop(&mut self) {
        if self.locked {
            release_pages(&mut locked_pages(), self.first, self.count, self.page);
        }
    }
}

fn warn_lock_failed(len: usize) {
    static WARNED: std::sync::Once = std::sync::Once::new();
    WARNED.call_once(|| {
        tracing::warn!(
            len,
            "mlock failed; key material may be swapped to disk (check RLIMIT_MEMLOCK)"
        );
    });
}

// ---------------------------------------------------------------------------
// KeyMaterial
// ---------------------------------------------------------------------------

/// Fixed-length random bytes for a key or IV.
///
/// Immutable once produced. The generator keeps no copy; dropping the value
/// erases the only one.
#[must_use = "generated key material should be used or explicitly dropped"]
pub struct KeyMaterial {
    // Field order matters: the pages are released before `inner` frees the
    // allocation. `Drop` wipes the bytes before either.
    lock: LockedRegion,
    inner: SecretSlice<u8>,
}

impl KeyMaterial {
    /// Take ownership of freshly generated bytes.
    ///
    /// The vector is converted into the secret allocation without copying
    /// when its capacity equals its length, which is the case for buffers
    /// built with `vec![0; n]`.
    pub(crate) fn from_vec(bytes: Vec<u8>) -> Self {
        let inner: SecretSlice<u8> = bytes.into();
        let lock = LockedRegion::try_lock(inner.expose_secret());
        Self { lock, inner }
    }

    /// Expose the raw bytes.
    ///
    /// Keep the borrow short; avoid binding it to a long-lived variable.
    #[must_use]
    pub fn expose(&self) -> &[u8] {
        self.inner.expose_secret()
    }

    /// Number of bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.expose().len()
    }

    /// Always `false` for material produced by this crate.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if every page under the bytes is `mlock`'d.
    ///
    /// Stays accurate while other key material on the same pages is
    /// dropped.
    #[must_use]
    pub const fn is_mlocked(&self) -> bool {
        self.lock.is_locked()
    }

    /// Copy the bytes into a self-zeroizing vector and erase the original.
    ///
    /// The returned vector is a fresh heap allocation and is NOT
    /// `mlock`'d. The locked secret allocation is wiped and unlocked when
    /// `self` drops at the end of this call.
    #[must_use]
    pub fn into_zeroizing(self) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(self.expose().to_vec())
    }

    fn wipe(&mut self) {
        self.inner.expose_secret_mut().zeroize();
    }
}

impl Drop for KeyMaterial {
    fn drop(&mut self) {
        // Zero while the pages are still locked; `secrecy` zeroes again on
        // free.
        self.wipe();
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyMaterial({} bytes, ***)", self.len())
    }
}

impl fmt::Display for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyMaterial({} bytes, ***)", self.len())
    }
}

// ---------------------------------------------------------------------------
// Platform-specific implementations
// ---------------------------------------------------------------------------

#[cfg(unix)]
mod platform {
    use std::sync::OnceLock;

    const FALLBACK_PAGE_SIZE: usize = 4096;

    pub(super) fn page_size() -> usize {
        static PAGE_SIZE: OnceLock<usize> = OnceLock::new();
        *PAGE_SIZE.get_or_init(|| {
            // SAFETY: sysconf has no preconditions.
            let raw = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
            usize::try_from(raw)
                .ok()
                .filter(|size| size.is_power_of_two())
                .unwrap_or(FALLBACK_PAGE_SIZE)
        })
    }

    /// Lock one page-aligned range.
    pub(super) fn try_mlock(addr: usize, len: usize) -> bool {
        // SAFETY: mlock accepts any address range; an unmapped range makes
        // the kernel return an error, which we report as "not locked".
        unsafe { libc::mlock(addr as *const libc::c_void, len) == 0 }
    }

    /// Unlock a range previously locked by `try_mlock`. Failure is ignored.
    pub(super) fn try_munlock(addr: usize, len: usize) {
        // SAFETY: as for mlock; the range is still mapped because the
        // owning allocation has not been freed yet.
        unsafe {
            libc::munlock(addr as *const libc::c_void, len);
        }
    }
}

#[cfg(not(unix))]
mod platform {
    pub(super) const fn page_size() -> usize {
        4096
    }

    pub(super) const fn try_mlock(_addr: usize, _len: usize) -> bool {
        false
    }

    pub(super) const fn try_munlock(_addr: usize, _len: usize) {}
}
