use std::fmt;
use std::sync::Arc;

use crate::env::Environment;
use crate::error::{BoxError, EnvError};
use crate::parser::{Kind, Parsers, Scalar};
use crate::tags::{FieldDecl, FieldParams};
use crate::value::Bindable;
use crate::walk::{self, CollectParams, SetField};

/// Observer called with `(key, value, is_default)` for every keyed field.
pub type OnSet = Arc<dyn Fn(&str, &str, bool) + Send + Sync>;

/// Options for one bind.
///
/// Cheap to clone: the environment and the parser registry are shared, and
/// every nested struct gets its own clone differing only in
/// [`prefix`](Self::prefix).
///
/// ```
/// use envbind::{Environment, Options};
///
/// let opts = Options::new()
///     .environment(Environment::from_pairs([("APP_PORT", "9000")]))
///     .prefix("APP_")
///     .required_if_no_default(true);
/// # let _ = opts;
/// ```
#[derive(Clone)]
pub struct Options {
    pub(crate) environment: Option<Arc<Environment>>,
    pub(crate) tag_name: String,
    pub(crate) prefix_tag_name: String,
    pub(crate) default_value_tag_name: String,
    pub(crate) separator_tag_name: String,
    pub(crate) key_value_separator_tag_name: String,
    pub(crate) required_if_no_default: bool,
    pub(crate) on_set: Option<OnSet>,
    pub(crate) prefix: String,
    pub(crate) use_field_name_by_default: bool,
    pub(crate) parsers: Arc<Parsers>,
}

impl Default for Options {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("environment", &self.environment.as_ref().map(|env| env.len()))
            .field("tag_name", &self.tag_name)
            .field("prefix_tag_name", &self.prefix_tag_name)
            .field("default_value_tag_name", &self.default_value_tag_name)
            .field("separator_tag_name", &self.separator_tag_name)
            .field(
                "key_value_separator_tag_name",
                &self.key_value_separator_tag_name,
            )
            .field("required_if_no_default", &self.required_if_no_default)
            .field("on_set", &self.on_set.is_some())
            .field("prefix", &self.prefix)
            .field("use_field_name_by_default", &self.use_field_name_by_default)
            .field("parsers", &self.parsers)
            .finish()
    }
}

impl Options {
    pub fn new() -> Self {
        Self {
            environment: None,
            tag_name: "env".into(),
            prefix_tag_name: "envPrefix".into(),
            default_value_tag_name: "envDefault".into(),
            separator_tag_name: "envSeparator".into(),
            key_value_separator_tag_name: "envKeyValSeparator".into(),
            required_if_no_default: false,
            on_set: None,
            prefix: String::new(),
            use_field_name_by_default: false,
            parsers: Arc::new(Parsers::default()),
        }
    }

    /// Bind from this environment instead of the process environment,
    /// which is otherwise snapshotted when the bind starts.
    pub fn environment(mut self, env: impl Into<Environment>) -> Self {
        self.environment = Some(Arc::new(env.into()));
        self
    }

    /// Tag holding the key and its options (default: `env`).
    pub fn tag_name(mut self, name: &str) -> Self {
        self.tag_name = name.to_string();
        self
    }

    /// Tag holding a nested struct's key prefix (default: `envPrefix`).
    pub fn prefix_tag_name(mut self, name: &str) -> Self {
        self.prefix_tag_name = name.to_string();
        self
    }

    /// Tag holding the default value (default: `envDefault`).
    pub fn default_value_tag_name(mut self, name: &str) -> Self {
        self.default_value_tag_name = name.to_string();
        self
    }

    /// Tag holding the slice and map entry separator (default: `envSeparator`).
    pub fn separator_tag_name(mut self, name: &str) -> Self {
        self.separator_tag_name = name.to_string();
        self
    }

    /// Tag holding the map key/value separator (default: `envKeyValSeparator`).
    pub fn key_value_separator_tag_name(mut self, name: &str) -> Self {
        self.key_value_separator_tag_name = name.to_string();
        self
    }

    /// Treat every field without a default as `required`.
    pub fn required_if_no_default(mut self, enabled: bool) -> Self {
        self.required_if_no_default = enabled;
        self
    }

    /// Observe every keyed field once its value is resolved. The value is
    /// passed as resolved, so observers must not log it for secret fields.
    pub fn on_set<F>(mut self, observer: F) -> Self
    where
        F: Fn(&str, &str, bool) + Send + Sync + 'static,
    {
        self.on_set = Some(Arc::new(observer));
        self
    }

    /// Prefix prepended to every key.
    pub fn prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_string();
        self
    }

    /// Derive a key from the field name when the key tag leaves it empty.
    pub fn use_field_name_by_default(mut self, enabled: bool) -> Self {
        self.use_field_name_by_default = enabled;
        self
    }

    /// Register a parser for the concrete type `T`.
    pub fn parser<T, E, F>(mut self, parser: F) -> Self
    where
        T: std::any::Any,
        E: Into<BoxError>,
        F: Fn(&str) -> Result<T, E> + Send + Sync + 'static,
    {
        Arc::make_mut(&mut self.parsers).register(parser);
        self
    }

    /// Replace the built-in parser for a kind.
    pub fn kind_parser<E, F>(mut self, kind: Kind, parser: F) -> Self
    where
        E: Into<BoxError>,
        F: Fn(&str) -> Result<Scalar, E> + Send + Sync + 'static,
    {
        Arc::make_mut(&mut self.parsers).register_kind(kind, parser);
        self
    }

    /// Layer a set of custom parsers over the current registry.
    pub fn parsers(mut self, custom: &Parsers) -> Self {
        Arc::make_mut(&mut self.parsers).merge(custom);
        self
    }

    /// Options for a nested struct: the field's prefix tag is appended.
    pub(crate) fn nested(&self, field: &FieldDecl) -> Self {
        self.with_prefix(format!(
            "{}{}",
            self.prefix,
            field.tags.get(&self.prefix_tag_name)
        ))
    }

    pub(crate) fn with_prefix(&self, prefix: String) -> Self {
        Self {
            prefix,
            ..self.clone()
        }
    }

    /// Bind `target` with these options.
    pub fn parse<T: Bindable>(self, target: &mut T) -> Result<(), EnvError> {
        walk::bind(target, self, &mut SetField)
    }

    /// Build a `T::default()` and bind it.
    pub fn parse_as<T: Bindable + Default>(self) -> Result<T, EnvError> {
        let mut target = T::default();
        self.parse(&mut target)?;
        Ok(target)
    }

    /// Parameters of every keyed field of `target`, without resolving values.
    pub fn field_params<T: Bindable>(self, target: &mut T) -> Result<Vec<FieldParams>, EnvError> {
        let mut collect = CollectParams::default();
        walk::bind(target, self, &mut collect)?;
        Ok(collect.into_params())
    }
}
