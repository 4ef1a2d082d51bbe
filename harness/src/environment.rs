//! Environment-variable access for test-mode flags.
//!
//! Cases never touch ambient global state directly: they go through an
//! [`EnvAccessor`] handed to them in their context. `ProcessEnv` is the
//! real process environment (visible to every concurrent case in the
//! process); `MemoryEnv` is a private in-memory map. Mutation of shared
//! environments belongs inside a [`ScopedVar`], which restores the prior
//! state on every exit path.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

pub trait EnvAccessor: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// The process environment. Process-wide: concurrent cases all observe
/// the same variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvAccessor for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn set(&self, key: &str, value: &str) {
        std::env::set_var(key, value);
    }

    fn remove(&self, key: &str) {
        std::env::remove_var(key);
    }
}

/// In-memory environment for cases that need private flag storage.
#[derive(Debug, Default)]
pub struct MemoryEnv {
    vars: Mutex<HashMap<String, String>>,
}

impl MemoryEnv {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EnvAccessor for MemoryEnv {
    fn get(&self, key: &str) -> Option<String> {
        self.vars.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut vars) = self.vars.lock() {
            vars.insert(key.to_string(), value.to_string());
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut vars) = self.vars.lock() {
            vars.remove(key);
        }
    }
}

/// RAII guard around one variable: captures the prior value when created
/// and restores it (or removes the variable) on drop.
pub struct ScopedVar {
    env: Arc<dyn EnvAccessor>,
    key: String,
    saved: Option<String>,
}

impl ScopedVar {
    pub fn set(env: Arc<dyn EnvAccessor>, key: impl Into<String>, value: &str) -> Self {
        let key = key.into();
        let saved = env.get(&key);
        debug!(key = %key, value, "setting scoped variable");
        env.set(&key, value);
        Self { env, key, saved }
    }
}

impl Drop for ScopedVar {
    fn drop(&mut self) {
        match self.saved.take() {
            Some(previous) => self.env.set(&self.key, &previous),
            None => self.env.remove(&self.key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_memory_env_roundtrip() {
        let env = MemoryEnv::new();
        assert_eq!(env.get("FLAG"), None);

        env.set("FLAG", "on");
        assert_eq!(env.get("FLAG"), Some("on".to_string()));

        env.remove("FLAG");
        assert_eq!(env.get("FLAG"), None);
    }

    #[test]
    fn test_scoped_var_restores_prior_value() {
        let env: Arc<dyn EnvAccessor> = Arc::new(MemoryEnv::new());
        env.set("MODE", "normal");

        {
            let _guard = ScopedVar::set(Arc::clone(&env), "MODE", "testing");
            assert_eq!(env.get("MODE"), Some("testing".to_string()));
        }

        assert_eq!(env.get("MODE"), Some("normal".to_string()));
    }

    #[test]
    fn test_scoped_var_removes_previously_absent_value() {
        let env: Arc<dyn EnvAccessor> = Arc::new(MemoryEnv::new());

        {
            let _guard = ScopedVar::set(Arc::clone(&env), "MODE", "testing");
            assert_eq!(env.get("MODE"), Some("testing".to_string()));
        }

        assert_eq!(env.get("MODE"), None);
    }

    #[test]
    fn test_scoped_var_restores_on_early_exit() {
        let env: Arc<dyn EnvAccessor> = Arc::new(MemoryEnv::new());
        env.set("MODE", "normal");

        let run = |env: &Arc<dyn EnvAccessor>| -> Result<(), String> {
            let _guard = ScopedVar::set(Arc::clone(env), "MODE", "testing");
            Err("case failed".to_string())
        };
        assert!(run(&env).is_err());

        assert_eq!(env.get("MODE"), Some("normal".to_string()));
    }

    #[test]
    #[serial]
    fn test_process_env_scoped_var() {
        let env: Arc<dyn EnvAccessor> = Arc::new(ProcessEnv);
        let key = "CALC_HARNESS_SCOPED_VAR_TEST";
        assert_eq!(env.get(key), None);

        {
            let _guard = ScopedVar::set(Arc::clone(&env), key, "1");
            assert_eq!(std::env::var(key).as_deref(), Ok("1"));
        }

        assert!(std::env::var(key).is_err());
    }
}
