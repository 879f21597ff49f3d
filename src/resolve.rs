//! Value resolution: turn a field's parameters into the raw string to parse.
//!
//! Steps, in order:
//!
//! 1. Look the key up, falling back to the declared default
//! 2. Expand `$VAR` references (`expand`)
//! 3. Record the value in the raw-value table under the field's own key
//! 4. Schedule removal of the variable (`unset`)
//! 5. Check `required` and `notEmpty`
//! 6. Replace the value with the contents of the file it names (`file`)
//! 7. Notify the on-set observer

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::env::Environment;
use crate::error::EnvError;
use crate::expand::expand;
use crate::options::Options;
use crate::tags::FieldParams;

/// Per-bind mutable state: the environment snapshot, the raw values read so
/// far (for expansion) and the variables to unset once the bind is over.
#[derive(Debug)]
pub struct BindState {
    env: Arc<Environment>,
    raw: HashMap<String, String>,
    unset: Vec<String>,
}

impl BindState {
    pub fn new(env: Arc<Environment>) -> Self {
        Self {
            env,
            raw: HashMap::new(),
            unset: Vec::new(),
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Value recorded for an own key during this bind.
    pub fn raw_value(&self, own_key: &str) -> Option<&str> {
        self.raw.get(own_key).map(String::as_str)
    }

    pub fn scheduled_unsets(&self) -> &[String] {
        &self.unset
    }

    /// Remove every variable scheduled by an `unset` field from the process
    /// environment.
    pub fn finish(self) {
        for key in self.unset {
            debug!(key = %key, "unsetting variable");
            // SAFETY: binding is single-threaded and callers must not access
            // the process environment from other threads while it runs.
            unsafe { std::env::remove_var(&key) };
        }
    }
}

struct Lookup {
    value: String,
    exists: bool,
    is_default: bool,
}

fn get_or(key: &str, default: Option<&str>, env: &Environment) -> Lookup {
    let found = env.get(key);
    if let Some(default) = default
        && (key.is_empty() || found.is_none_or(str::is_empty))
    {
        return Lookup {
            value: default.to_string(),
            exists: true,
            is_default: true,
        };
    }
    Lookup {
        value: found.unwrap_or_default().to_string(),
        exists: found.is_some(),
        is_default: false,
    }
}

/// Resolve the raw value for one field. An empty result means "leave the
/// field alone".
pub fn resolve_value(
    params: &FieldParams,
    opts: &Options,
    state: &mut BindState,
) -> Result<String, EnvError> {
    let Lookup {
        mut value,
        exists,
        is_default,
    } = get_or(
        &params.key,
        params.default_value.as_deref(),
        &state.env,
    );

    if params.expand {
        value = expand_references(&value, state);
    }

    state.raw.insert(params.own_key.clone(), value.clone());

    if params.unset {
        debug!(key = %params.key, "scheduling unset");
        state.unset.push(params.key.clone());
    }

    if params.required && !exists && !params.own_key.is_empty() {
        return Err(EnvError::RequiredVariableMissing {
            key: params.key.clone(),
        });
    }

    if params.not_empty && value.is_empty() {
        return Err(EnvError::EmptyVariable {
            key: params.key.clone(),
        });
    }

    if params.load_file && !value.is_empty() {
        let path = PathBuf::from(&value);
        let bytes = fs::read(&path).map_err(|source| EnvError::FileLoadError {
            key: params.key.clone(),
            path,
            source,
        })?;
        // Invalid UTF-8 sequences are replaced, not rejected.
        value = String::from_utf8_lossy(&bytes).into_owned();
    }

    if !params.own_key.is_empty() {
        debug!(key = %params.key, is_default, "resolved variable");
        if let Some(on_set) = &opts.on_set {
            on_set(&params.key, &value, is_default);
        }
    }

    Ok(value)
}

/// Expand references against the raw-value table first (non-empty entries
/// only), then the environment. Substituted values are inserted as-is.
fn expand_references(value: &str, state: &BindState) -> String {
    expand(value, |name| {
        state
            .raw
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
            .or_else(|| state.env.get(name))
            .unwrap_or("")
            .to_string()
    })
}
