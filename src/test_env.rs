//! Process-environment fixture shared by every unit test that reads `COAH_*`.

use std::env;
use std::sync::{Mutex, OnceLock};

const COAH_KEYS: [&str; 9] = [
    "COAH_LOCK_DAYS",
    "COAH_TIME_ZONE",
    "COAH_SHEET_URL",
    "COAH_ITEMS_CSV",
    "COAH_ADDR",
    "COAH_HTTP_TIMEOUT_MS",
    "COAH_LOG_LEVEL",
    "COAH_LOG_FORMAT",
    "COAH_LOG_TARGET",
];

fn env_lock() -> &'static Mutex<()> {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    ENV_LOCK.get_or_init(|| Mutex::new(()))
}

/// Runs `f` with every `COAH_*` variable unset except `vars`, then restores
/// the previous environment.
pub(crate) fn with_coah_env<R>(vars: &[(&str, &str)], f: impl FnOnce() -> R) -> R {
    // Every call scrubs the managed keys first, so a poisoned lock is safe.
    let _guard = env_lock()
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let saved: Vec<(&str, Option<String>)> = COAH_KEYS
        .iter()
        .map(|key| (*key, env::var(key).ok()))
        .collect();

    for key in COAH_KEYS {
        env::remove_var(key);
    }
    for (key, value) in vars {
        assert!(COAH_KEYS.contains(key), "unmanaged variable {key}");
        env::set_var(key, value);
    }

    let output = f();

    for (key, value) in saved {
        match value {
            Some(value) => env::set_var(key, value),
            None => env::remove_var(key),
        }
    }
    output
}
