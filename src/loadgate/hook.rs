// Process-wide dlopen interposition
//
// Compiled only into the dedicated gate builds (`gate-hook`). The strict
// allowlist variant is selected with `gate-strict`; without it the hook is
// the redirect-only gate shipped alongside the bundled Qt libraries.
//
// Diagnostics go straight to stderr: the hook runs inside the loader path,
// possibly before any logging is set up, and must never allocate a logging
// pipeline of its own.

use std::cell::Cell;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_void};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::sync::OnceLock;

use super::{decide, GateConfig, GateMode, LoadDecision};

#[cfg(feature = "gate-strict")]
const MODE: GateMode = GateMode::Strict;
#[cfg(not(feature = "gate-strict"))]
const MODE: GateMode = GateMode::RedirectOnly;

type DlopenFn = unsafe extern "C" fn(*const c_char, c_int) -> *mut c_void;

static REAL_DLOPEN: OnceLock<Option<DlopenFn>> = OnceLock::new();

thread_local! {
    // Reentrancy flag: a loader call made from within the gate on this
    // thread must delegate unchanged without re-applying policy.
    static IN_GATE: Cell<bool> = const { Cell::new(false) };
}

fn real_dlopen() -> Option<DlopenFn> {
    *REAL_DLOPEN.get_or_init(|| {
        let sym = unsafe { libc::dlsym(libc::RTLD_NEXT, b"dlopen\0".as_ptr().cast()) };
        if sym.is_null() {
            eprintln!("openterface-media: cannot resolve the underlying dlopen; refusing all library loads");
            None
        } else {
            Some(unsafe { std::mem::transmute::<*mut c_void, DlopenFn>(sym) })
        }
    })
}

fn gate_config() -> &'static GateConfig {
    static CONFIG: OnceLock<GateConfig> = OnceLock::new();
    CONFIG.get_or_init(GateConfig::default)
}

/// dlopen interposer installed for the whole process
///
/// # Safety
///
/// Called by arbitrary foreign code with the contract of `dlopen(3)`:
/// `filename` is either null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn dlopen(filename: *const c_char, flags: c_int) -> *mut c_void {
    let Some(real) = real_dlopen() else {
        return std::ptr::null_mut();
    };

    if IN_GATE.with(Cell::get) {
        return real(filename, flags);
    }

    IN_GATE.with(|flag| flag.set(true));
    let handle = apply_policy(real, filename, flags);
    IN_GATE.with(|flag| flag.set(false));
    handle
}

unsafe fn apply_policy(real: DlopenFn, filename: *const c_char, flags: c_int) -> *mut c_void {
    if filename.is_null() {
        // Handle to the main program; never subject to policy
        return real(filename, flags);
    }

    let name = CStr::from_ptr(filename).to_string_lossy();
    match decide(gate_config(), MODE, &name, |p: &Path| p.exists()) {
        LoadDecision::Delegate => real(filename, flags),
        LoadDecision::Redirect(path) => {
            eprintln!(
                "openterface-media: redirecting {} -> {}",
                name,
                path.display()
            );
            match CString::new(path.as_os_str().as_bytes()) {
                Ok(c_path) => real(c_path.as_ptr(), flags),
                Err(_) => real(filename, flags),
            }
        }
        LoadDecision::Deny => std::ptr::null_mut(),
    }
}
