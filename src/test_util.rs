#[cfg(test)]
static ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Runs `func` with HOME pointed at a fresh temporary directory.
#[cfg(test)]
pub(crate) fn with_temp_home<F, R>(func: F) -> R
where
    F: FnOnce(&std::path::Path) -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let dir = tempfile::tempdir().expect("tempdir");
    let old_home = std::env::var("HOME").ok();
    let home = dir.path().to_string_lossy().to_string();
    set_env("HOME", Some(home.as_str()));
    let result = func(dir.path());
    set_env("HOME", old_home.as_deref());
    result
}

/// Environment writes are only made while `ENV_MUTEX` is held.
#[cfg(test)]
pub(crate) fn set_env(key: &str, value: Option<&str>) {
    unsafe {
        match value {
            Some(value) => std::env::set_var(key, value),
            None => std::env::remove_var(key),
        }
    }
}
