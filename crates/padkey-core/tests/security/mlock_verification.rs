//! Verify that key material stays `mlock`'d for as long as it is alive.
//!
//! Small keys share pages, and `mlock` does not nest, so dropping one key
//! must not unlock a page another live key still sits on.
//!
//! Locking can legitimately fail in containers with a low
//! `RLIMIT_MEMLOCK`; the checks skip themselves when it does.

use padkey_core::keygen::{generate_aes_key, generate_des_key};

#[cfg(unix)]
#[test]
fn key_material_reports_mlock_status() {
    let key = generate_aes_key(256).expect("aes");
    eprintln!("mlock status: {}", key.is_mlocked());
}

#[cfg(target_os = "linux")]
#[test]
fn locked_key_shows_up_in_vmlck() {
    let key = generate_aes_key(256).expect("aes");
    if !key.is_mlocked() {
        eprintln!("mlock failed (likely insufficient quota), skipping VmLck check");
        return;
    }
    let vmlck = read_vmlck_kb();
    assert!(vmlck > 0, "key reports mlock but VmLck is {vmlck} kB");
}

#[cfg(target_os = "linux")]
#[test]
fn dropping_a_neighbour_keeps_shared_page_locked() {
    let first = generate_des_key().expect("des");
    let second = generate_des_key().expect("des");
    if !(first.is_mlocked() && second.is_mlocked()) {
        eprintln!("mlock failed (likely insufficient quota), skipping VmLck check");
        return;
    }
    let same_page = page_of(first.expose()) == page_of(second.expose());
    let before = read_vmlck_kb();

    drop(first);

    let after = read_vmlck_kb();
    assert!(second.is_mlocked());
    assert!(
        after > 0,
        "VmLck dropped to 0 kB with a locked key still alive (same_page={same_page}, before={before} kB)"
    );
}

#[cfg(target_os = "linux")]
#[test]
fn concurrent_churn_leaves_survivor_locked() {
    let survivor = generate_des_key().expect("des");
    if !survivor.is_mlocked() {
        eprintln!("mlock failed (likely insufficient quota), skipping VmLck check");
        return;
    }

    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                for _ in 0..500 {
                    let key = generate_des_key().expect("des");
                    drop(key);
                }
            });
        }
    });

    assert!(survivor.is_mlocked());
    let vmlck = read_vmlck_kb();
    assert!(vmlck > 0, "VmLck is 0 kB after churn with a locked key alive");
}

#[cfg(target_os = "linux")]
fn page_of(bytes: &[u8]) -> usize {
    // SAFETY: sysconf has no preconditions.
    let page = usize::try_from(unsafe { libc::sysconf(libc::_SC_PAGESIZE) }).unwrap_or(4096);
    bytes.as_ptr() as usize / page
}

#[cfg(target_os = "linux")]
fn read_vmlck_kb() -> u64 {
    let status =
        std::fs::read_to_string("/proc/self/status").expect("failed to read /proc/self/status");
    for line in status.lines() {
        if let Some(rest) = line.strip_prefix("VmLck:") {
            let trimmed = rest.trim().trim_end_matches(" kB").trim();
            return trimmed.parse().unwrap_or(0);
        }
    }
    0
}
