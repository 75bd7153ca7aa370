//! Process environment isolation for tests that load configuration layers.

use std::ffi::OsString;
use std::sync::{Mutex, MutexGuard, PoisonError};

use once_cell::sync::Lazy;
use tempfile::TempDir;

static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

const CONFIG_PREFIX: &str = "DBGX_";
const DISCOVERY_VARS: [&str; 3] = ["HOME", "XDG_CONFIG_HOME", "XDG_CONFIG_DIRS"];

/// Clears `DBGX_*` variables and points file discovery at an empty
/// directory until dropped.
pub struct IsolatedEnvironment {
    saved: Vec<(OsString, Option<OsString>)>,
    _home: TempDir,
    _guard: MutexGuard<'static, ()>,
}

impl IsolatedEnvironment {
    pub fn new() -> Self {
        let guard = ENV_MUTEX.lock().unwrap_or_else(PoisonError::into_inner);
        let home = TempDir::new().expect("create empty home directory");

        let mut saved: Vec<(OsString, Option<OsString>)> = std::env::vars_os()
            .filter(|(key, _)| key.to_string_lossy().starts_with(CONFIG_PREFIX))
            .map(|(key, value)| (key, Some(value)))
            .collect();
        saved.extend(
            DISCOVERY_VARS
                .iter()
                .map(|key| (OsString::from(key), std::env::var_os(key))),
        );

        // Environment mutation is `unsafe` on edition 2024; `ENV_MUTEX` is
        // held for the guard's lifetime and every variable is restored on drop.
        for (key, _) in &saved {
            unsafe { std::env::remove_var(key) };
        }
        unsafe {
            std::env::set_var("HOME", home.path());
            std::env::set_var("XDG_CONFIG_HOME", home.path());
        }

        Self {
            saved,
            _home: home,
            _guard: guard,
        }
    }
}

impl Drop for IsolatedEnvironment {
    fn drop(&mut self) {
        for (key, value) in self.saved.drain(..) {
            match value {
                Some(previous) => unsafe { std::env::set_var(&key, previous) },
                None => unsafe { std::env::remove_var(&key) },
            }
        }
    }
}
