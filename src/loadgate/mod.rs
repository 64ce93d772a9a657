// Dynamic-library load gate
//
// The statically-built distribution must not pull arbitrary system
// libraries into the process. This module holds the load policy as a pure
// decision function; the process-wide dlopen interposition lives in `hook`
// and is only compiled into the dedicated gate builds.

#[cfg(all(target_os = "linux", feature = "gate-hook"))]
pub mod hook;

use std::path::{Path, PathBuf};

/// Directory holding the bundled Qt 6 libraries shipped with the client
pub const BUNDLED_QT_PREFIX: &str = "/usr/lib/openterfaceqt/qt6";

/// Base names of bundled libraries whose system copies are redirected
const REDIRECT_NAMES: &[&str] = &[
    "libQt6Core",
    "libQt6Gui",
    "libQt6Widgets",
    "libQt6Network",
    "libQt6Multimedia",
    "libQt6MultimediaWidgets",
    "libQt6SerialPort",
    "libQt6Svg",
    "libQt6OpenGL",
    "libQt6OpenGLWidgets",
    "libQt6Concurrent",
    "libQt6DBus",
    "libQt6XcbQpa",
];

/// Directory substrings identifying system copies to redirect away from
const SYSTEM_PREFIXES: &[&str] = &[
    "/lib64/libQt6",
    "/usr/lib64/libQt6",
    "/usr/lib/libQt6",
    "/usr/lib/x86_64-linux-gnu/libQt6",
    "/usr/lib/aarch64-linux-gnu/libQt6",
];

/// Hardware-acceleration libraries that must remain loadable
const ACCEL_ALLOWLIST: &[&str] = &[
    "libva", "va.so", "va-drm", "va-x11", "vaapi", "libdrm", "libEGL", "libGL",
];

/// Load policy configuration, constructed once and injected into [`decide`]
#[derive(Debug, Clone, PartialEq)]
pub struct GateConfig {
    /// Absolute directory holding the bundled toolkit libraries
    pub bundled_prefix: PathBuf,
    /// Library base names subject to redirection
    pub redirect_names: Vec<String>,
    /// Directory substrings identifying system copies
    pub system_prefixes: Vec<String>,
    /// Substrings naming always-loadable hardware-accel libraries
    pub accel_allowlist: Vec<String>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            bundled_prefix: PathBuf::from(BUNDLED_QT_PREFIX),
            redirect_names: REDIRECT_NAMES.iter().map(|s| s.to_string()).collect(),
            system_prefixes: SYSTEM_PREFIXES.iter().map(|s| s.to_string()).collect(),
            accel_allowlist: ACCEL_ALLOWLIST.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Gate operating mode, fixed per build of the hook
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateMode {
    /// Deny everything the policy does not name (static distribution)
    Strict,
    /// Redirect bundled-toolkit loads, pass everything else through
    RedirectOnly,
}

/// Outcome of evaluating one load request against the policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadDecision {
    /// Hand the original filename to the underlying loader
    Delegate,
    /// Hand the substituted path to the underlying loader
    Redirect(PathBuf),
    /// Return the "not loaded" sentinel without invoking the loader
    Deny,
}

/// Evaluate a load request
///
/// Pure apart from the injected existence probe, so the policy can be
/// exercised without touching the real loader. Policy order: the
/// hardware-accel allowlist, then toolkit redirection, then the
/// mode-dependent default. Reentrancy is the hook's concern, not this
/// function's.
pub fn decide<F>(
    config: &GateConfig,
    mode: GateMode,
    filename: &str,
    exists: F,
) -> LoadDecision
where
    F: Fn(&Path) -> bool,
{
    if filename.is_empty() {
        // dlopen(NULL): handle to the main program
        return LoadDecision::Delegate;
    }

    if config
        .accel_allowlist
        .iter()
        .any(|needle| filename.contains(needle.as_str()))
    {
        return LoadDecision::Delegate;
    }

    let is_redirect_name = config
        .redirect_names
        .iter()
        .any(|name| filename.contains(name.as_str()));
    let under_system_prefix = config
        .system_prefixes
        .iter()
        .any(|prefix| filename.contains(prefix.as_str()));

    if is_redirect_name && under_system_prefix {
        if let Some(basename) = Path::new(filename).file_name() {
            let candidate = config.bundled_prefix.join(basename);
            if exists(&candidate) {
                return LoadDecision::Redirect(candidate);
            }
        }
        return LoadDecision::Delegate;
    }

    match mode {
        GateMode::Strict => LoadDecision::Deny,
        GateMode::RedirectOnly => LoadDecision::Delegate,
    }
}
