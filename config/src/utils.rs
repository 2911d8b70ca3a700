use std::{
    collections::HashMap,
    env,
    ffi::{OsStr, OsString},
    mem,
    sync::{Mutex, MutexGuard, PoisonError},
};

/// Serializes tests that touch process environment.
pub(crate) struct EnvMutex(Mutex<()>);

impl EnvMutex {
    pub const fn new() -> Self {
        Self(Mutex::new(()))
    }

    pub fn lock(&self) -> EnvMutexGuard<'_> {
        let guard = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        EnvMutexGuard {
            redefined_vars: HashMap::new(),
            _guard: guard,
        }
    }
}

/// Restores redefined variables on drop.
pub(crate) struct EnvMutexGuard<'a> {
    redefined_vars: HashMap<OsString, Option<OsString>>,
    _guard: MutexGuard<'a, ()>,
}

impl Drop for EnvMutexGuard<'_> {
    fn drop(&mut self) {
        for (env_name, value) in mem::take(&mut self.redefined_vars) {
            if let Some(value) = value {
                env::set_var(env_name, value);
            } else {
                env::remove_var(env_name);
            }
        }
    }
}

impl EnvMutexGuard<'_> {
    pub fn set_env(&mut self, fixture: &str) {
        for line in fixture.split('\n').map(str::trim) {
            if line.is_empty() {
                continue;
            }

            let (name, value) = line
                .split_once('=')
                .unwrap_or_else(|| panic!("Invalid env fixture line: {line}"));
            let variable_name: &OsStr = name.as_ref();
            let variable_value: &OsStr = value.trim_matches('"').as_ref();

            self.remember(variable_name);
            env::set_var(variable_name, variable_value);
        }
    }

    pub fn remove_env(&mut self, var_names: &[&str]) {
        for &var_name in var_names {
            let variable_name: &OsStr = var_name.as_ref();
            self.remember(variable_name);
            env::remove_var(variable_name);
        }
    }

    fn remember(&mut self, variable_name: &OsStr) {
        if !self.redefined_vars.contains_key(variable_name) {
            let prev_value = env::var_os(variable_name);
            self.redefined_vars
                .insert(variable_name.to_os_string(), prev_value);
        }
    }
}
