use std::path::{Path, PathBuf};

/// Directory named by `key`, if set to something other than whitespace.
#[must_use]
pub fn dir_override(key: &str) -> Option<PathBuf> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// First of `candidates` that exists or can be created; the last one is returned
/// unchecked when none can.
pub fn first_writable(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates
        .iter()
        .find(|dir| ensure_dir(dir))
        .or_else(|| candidates.last())
        .cloned()
}

fn ensure_dir(dir: &Path) -> bool {
    std::fs::create_dir_all(dir).is_ok() && dir.is_dir()
}

/// Tests that touch the process environment hold this lock for their whole body.
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Sets or removes an environment variable and restores the previous value on drop.
#[cfg(test)]
pub(crate) struct EnvGuard {
    key: &'static str,
    previous: Option<String>,
}

#[cfg(test)]
impl EnvGuard {
    pub(crate) fn set(key: &'static str, value: Option<&str>) -> Self {
        let previous = std::env::var(key).ok();
        match value {
            Some(value) => std::env::set_var(key, value),
            None => std::env::remove_var(key),
        }
        Self { key, previous }
    }
}

#[cfg(test)]
impl Drop for EnvGuard {
    fn drop(&mut self) {
        if let Some(previous) = &self.previous {
            std::env::set_var(self.key, previous);
        } else {
            std::env::remove_var(self.key);
        }
    }
}
