//! Bind environment variables into typed Rust structs. Declare the fields,
//! tag them, and parse.
//!
//! envbind walks a struct's fields, looks every tagged key up in the
//! environment, converts the raw string into the field's type and writes it
//! back. Defaults, required and non-empty checks, `$VAR` expansion, file
//! indirection and unset-after-read are all driven by per-field tags.
//!
//! ```
//! use envbind::{EnvError, EnvStruct, Environment, Options, Walker, tags};
//!
//! #[derive(Debug, Default)]
//! struct Config {
//!     host: String,
//!     port: u16,
//!     hosts: Vec<String>,
//! }
//!
//! impl EnvStruct for Config {
//!     fn bind(&mut self, w: &mut Walker<'_>) -> Result<(), EnvError> {
//!         w.field("host", tags!(env = "HOST,required"), &mut self.host)?;
//!         w.field("port", tags!(env = "PORT", envDefault = "8080"), &mut self.port)?;
//!         w.field("hosts", tags!(env = "HOSTS", envSeparator = ";"), &mut self.hosts)
//!     }
//! }
//!
//! let config: Config = Options::new()
//!     .environment(Environment::from_pairs([("HOST", "0.0.0.0"), ("HOSTS", "a;b")]))
//!     .parse_as()?;
//!
//! assert_eq!(config.host, "0.0.0.0");
//! assert_eq!(config.port, 8080);
//! assert_eq!(config.hosts, ["a", "b"]);
//! # Ok::<(), EnvError>(())
//! ```
//!
//! # Design: descriptors instead of reflection
//!
//! A struct takes part in a bind by implementing [`EnvStruct`]. Its `bind`
//! method hands every field to the [`Walker`] together with its name and
//! static [`Tags`]. Fields that are not registered are never touched, which
//! plays the role of unexported fields.
//!
//! Field types describe themselves through [`Bindable`]:
//!
//! - **Scalars** (`bool`, `String`, every integer and float width) accept a
//!   built-in kind parser.
//! - **`Duration`**, **`url::Url`** and **`chrono_tz::Tz`** are parsed by the
//!   default parser registry (the last two behind the `url` and `tz`
//!   features, both on by default).
//! - **Text types** (`PathBuf`, IP and socket addresses, or any type of yours
//!   returning [`parse_text`] from `text_unmarshaler`) parse themselves.
//! - **`Option<T>`** is a pointer: it wraps the parsed value, and an
//!   `Option` holding a struct is descended into.
//! - **`Vec<T>`**, **`HashMap<K, V>`** and **`BTreeMap<K, V>`** split the raw
//!   value on separators.
//! - Every **`EnvStruct + Default`** is nested, groupable as a struct slice
//!   and allocatable by `init`.
//!
//! # Tags
//!
//! | Tag | Meaning |
//! |-----|---------|
//! | `env` | Key, then comma-separated options |
//! | `envDefault` | Value used when the key is absent or empty |
//! | `envPrefix` | Prefix for a nested struct or struct slice |
//! | `envSeparator` | Slice and map entry separator (default `,`) |
//! | `envKeyValSeparator` | Map key/value separator (default `:`) |
//!
//! Options of the `env` tag:
//!
//! - **`required`**: the key must be present (an empty value counts).
//! - **`notEmpty`**: the resolved value must not be empty.
//! - **`expand`**: substitute `$VAR` and `${VAR}` references.
//! - **`file`**: the value is a path; the field gets the file's contents.
//! - **`unset`**: remove the variable from the process once the bind ends.
//! - **`init`**: allocate a nil `Option` holding a struct and bind into it.
//! - **`-`** (or `-` as the key): ignore the field.
//!
//! Any other option fails the bind with
//! [`UnsupportedTagOption`](EnvError::UnsupportedTagOption). Every tag name can
//! be changed through [`Options`].
//!
//! # Prefixes and struct slices
//!
//! Nested structs accumulate prefixes: a `Database` field tagged
//! `envPrefix = "DB_"` under `Options::prefix("APP_")` reads `APP_DB_URL`.
//!
//! A field of type `Vec<S>` (or `Vec<Option<S>>`, or `Option<Vec<S>>`) where
//! `S` is a struct with no parser becomes an index-addressed group:
//!
//! ```text
//! SERVERS_0_HOST=a   SERVERS_0_PORT=1
//! SERVERS_1_HOST=b
//! ```
//!
//! The group size is the first index with no variable at all, so numbering
//! must be contiguous from zero. Elements the slice already holds are kept
//! and re-bound, and the slice never shrinks.
//!
//! # Errors
//!
//! Per-field failures (missing required keys, parse errors, unreadable
//! files) do not stop the walk. They are collected across sibling fields,
//! nested structs and slice elements and returned as one
//! [`EnvError::Multiple`] (or the bare error when there is only one).
//! Structural problems, a bad tag option or a non-struct target, abort
//! immediately.
//!
//! # Introspection
//!
//! [`field_params`] walks a struct without resolving any value and returns
//! the [`FieldParams`] of every keyed field: fully-qualified key, default and
//! options. [`ops::env_template`] renders them as a `.env` template and
//! [`ops::params_json`] exports them as JSON.
//!
//! # Logging
//!
//! The walk emits `tracing` events: `debug` for resolved keys, struct slice
//! sizes and scheduled unsets, `trace` for prefix descent. Values are never
//! logged. No subscriber is installed by this crate.

pub mod env;
pub mod error;
pub mod ops;
pub mod parser;
pub mod telemetry;

mod duration;
mod expand;
mod options;
mod resolve;
mod slice;
mod tags;
mod value;
mod walk;

#[cfg(test)]
mod fixtures;

pub use duration::{DurationError, parse_duration};
pub use env::Environment;
pub use error::{BoxError, EnvError};
pub use expand::expand;
pub use options::{OnSet, Options};
pub use parser::{Kind, Parsers, Scalar};
pub use resolve::BindState;
pub use slice::count_instances;
pub use tags::{FieldDecl, FieldParams, Tags, to_env_name};
pub use value::{Bindable, ElementFn, EnvStruct, ParseCx, Slot, parse_text, parse_value};
pub use walk::{CollectParams, FieldAction, SetField, Walker};

/// Bind `target` from the process environment with default options.
pub fn parse<T: Bindable>(target: &mut T) -> Result<(), EnvError> {
    parse_with_options(target, Options::new())
}

pub fn parse_with_options<T: Bindable>(target: &mut T, opts: Options) -> Result<(), EnvError> {
    opts.parse(target)
}

/// Build a `T::default()` and bind it from the process environment.
pub fn parse_as<T: Bindable + Default>() -> Result<T, EnvError> {
    parse_as_with_options(Options::new())
}

pub fn parse_as_with_options<T: Bindable + Default>(opts: Options) -> Result<T, EnvError> {
    opts.parse_as()
}

/// Parameters of every keyed field of `target`. No value is resolved or
/// assigned.
pub fn field_params<T: Bindable>(target: &mut T) -> Result<Vec<FieldParams>, EnvError> {
    field_params_with_options(target, Options::new())
}

pub fn field_params_with_options<T: Bindable>(
    target: &mut T,
    opts: Options,
) -> Result<Vec<FieldParams>, EnvError> {
    opts.field_params(target)
}

/// Unwrap a bind result, panicking with the error message on failure.
///
/// Meant for start-up code where a bad configuration is fatal.
pub fn must<T>(result: Result<T, EnvError>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => panic!("{err}"),
    }
}
