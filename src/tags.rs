//! Field tags and the parameter record derived from them.
//!
//! A field declares its tags as static `name → value` pairs, usually via the
//! [`tags!`](crate::tags!) macro:
//!
//! ```
//! use envbind::tags;
//!
//! let t = tags!(env = "PORT,required", envDefault = "8080");
//! assert_eq!(t.get("env"), "PORT,required");
//! assert_eq!(t.lookup("envPrefix"), None);
//! ```
//!
//! Which tag name plays which role (key, prefix, default, separators) is
//! decided by [`Options`](crate::Options), so the same declaration can be
//! read with a different vocabulary.

use serde::Serialize;

use crate::error::EnvError;
use crate::options::Options;

/// Static tag declarations of one field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tags(&'static [(&'static str, &'static str)]);

impl Tags {
    pub const NONE: Tags = Tags(&[]);

    pub const fn new(pairs: &'static [(&'static str, &'static str)]) -> Self {
        Tags(pairs)
    }

    /// Value of the tag `name`, or `""` when it is not declared.
    pub fn get(&self, name: &str) -> &'static str {
        self.lookup(name).unwrap_or("")
    }

    /// Value of the tag `name`, distinguishing "absent" from "declared empty".
    pub fn lookup(&self, name: &str) -> Option<&'static str> {
        self.0.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
    }
}

/// Build [`Tags`] from `name = "value"` pairs.
#[macro_export]
macro_rules! tags {
    () => {
        $crate::Tags::NONE
    };
    ($($name:ident = $value:literal),+ $(,)?) => {
        $crate::Tags::new(&[$((stringify!($name), $value)),+])
    };
}

/// Declaration of one struct field as seen by the walker.
#[derive(Debug, Clone, Copy)]
pub struct FieldDecl {
    pub name: &'static str,
    pub tags: Tags,
    pub type_name: &'static str,
}

/// Parameters of one field, resolved from its tags and the current options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldParams {
    /// Key declared on (or derived for) the field, before prefixing.
    pub own_key: String,
    /// Fully-qualified lookup key: accumulated prefix + own key.
    pub key: String,
    /// Declared default. `Some("")` is a declared empty default.
    pub default_value: Option<String>,
    pub required: bool,
    pub load_file: bool,
    pub unset: bool,
    pub not_empty: bool,
    pub expand: bool,
    pub init: bool,
    pub ignored: bool,
}

impl FieldParams {
    pub fn resolve(field: &FieldDecl, opts: &Options) -> Result<Self, EnvError> {
        let (declared_key, flags) = split_key(field.tags.get(&opts.tag_name));

        let own_key = if declared_key.is_empty() && opts.use_field_name_by_default {
            to_env_name(field.name)
        } else {
            declared_key.to_string()
        };

        let default_value = field
            .tags
            .lookup(&opts.default_value_tag_name)
            .map(str::to_string);

        let mut params = FieldParams {
            key: format!("{}{own_key}", opts.prefix),
            required: opts.required_if_no_default && default_value.is_none(),
            ignored: own_key == "-",
            own_key,
            default_value,
            ..FieldParams::default()
        };

        for flag in flags {
            match flag {
                "" => continue,
                "file" => params.load_file = true,
                "required" => params.required = true,
                "unset" => params.unset = true,
                "notEmpty" => params.not_empty = true,
                "expand" => params.expand = true,
                "init" => params.init = true,
                "-" => params.ignored = true,
                other => {
                    return Err(EnvError::UnsupportedTagOption {
                        field: field.name,
                        option: other.to_string(),
                    });
                }
            }
        }

        Ok(params)
    }

    pub fn has_default(&self) -> bool {
        self.default_value.is_some()
    }
}

/// Split a key tag into the key and its comma-separated options.
fn split_key(tag: &str) -> (&str, impl Iterator<Item = &str>) {
    let mut parts = tag.split(',');
    let key = parts.next().unwrap_or("");
    (key, parts)
}

/// Derive an environment variable name from a field name.
///
/// Upper-cases the name and separates words with `_`. Word boundaries are
/// existing underscores, a lower-case letter followed by an upper-case one,
/// and the last capital of an acronym when a lower-case letter follows it:
/// `ServicePort` → `SERVICE_PORT`, `HTTPServer` → `HTTP_SERVER`,
/// `pool_size` → `POOL_SIZE`.
///
/// A single capital ending the name is its own word, so `portA` becomes
/// `PORT_A` rather than `PORTA`.
pub fn to_env_name(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c == '_' {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            continue;
        }
        if c.is_uppercase() && !out.is_empty() && !out.ends_with('_') {
            let prev_lower = i > 0 && chars[i - 1].is_lowercase();
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev_lower || next_lower {
                out.push('_');
            }
        }
        out.extend(c.to_uppercase());
    }

    while out.ends_with('_') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(name: &'static str, tags: Tags) -> FieldDecl {
        FieldDecl {
            name,
            tags,
            type_name: "String",
        }
    }

    fn opts() -> Options {
        Options::new().environment(crate::Environment::default())
    }

    #[test]
    fn env_names() {
        assert_eq!(to_env_name("ServicePort"), "SERVICE_PORT");
        assert_eq!(to_env_name("HTTPServer"), "HTTP_SERVER");
        assert_eq!(to_env_name("pool_size"), "POOL_SIZE");
        assert_eq!(to_env_name("Foo"), "FOO");
        assert_eq!(to_env_name("ID"), "ID");
        assert_eq!(to_env_name("userID"), "USER_ID");
        assert_eq!(to_env_name("portA"), "PORT_A");
        assert_eq!(to_env_name("a__b_"), "A_B");
    }

    #[test]
    fn key_and_flags() {
        let t = tags!(env = "PORT,required,notEmpty,expand,file,unset,init");
        let p = FieldParams::resolve(&decl("port", t), &opts()).unwrap();
        assert_eq!(p.own_key, "PORT");
        assert_eq!(p.key, "PORT");
        assert!(p.required && p.not_empty && p.expand && p.load_file && p.unset && p.init);
        assert!(!p.ignored);
        assert!(!p.has_default());
    }

    #[test]
    fn prefix_is_prepended() {
        let p = FieldParams::resolve(&decl("port", tags!(env = "PORT")), &opts().prefix("APP_"))
            .unwrap();
        assert_eq!(p.own_key, "PORT");
        assert_eq!(p.key, "APP_PORT");
    }

    #[test]
    fn default_presence_is_tracked() {
        let p = FieldParams::resolve(&decl("x", tags!(env = "X", envDefault = "")), &opts())
            .unwrap();
        assert_eq!(p.default_value.as_deref(), Some(""));
        assert!(p.has_default());
    }

    #[test]
    fn dash_key_is_ignored() {
        let p = FieldParams::resolve(&decl("x", tags!(env = "-,required")), &opts()).unwrap();
        assert!(p.ignored);
        let p = FieldParams::resolve(&decl("x", tags!(env = "X,-")), &opts()).unwrap();
        assert!(p.ignored);
    }

    #[test]
    fn unknown_option_fails() {
        let err = FieldParams::resolve(&decl("key", tags!(env = "KEY,bogus")), &opts()).unwrap_err();
        match err {
            EnvError::UnsupportedTagOption { field, option } => {
                assert_eq!(field, "key");
                assert_eq!(option, "bogus");
            }
            other => panic!("Expected UnsupportedTagOption, got: {other:?}"),
        }
    }

    #[test]
    fn empty_option_segments_skipped() {
        let p = FieldParams::resolve(&decl("k", tags!(env = "K,,required,")), &opts()).unwrap();
        assert!(p.required);
    }

    #[test]
    fn field_name_fallback() {
        let p = FieldParams::resolve(&decl("ServicePort", Tags::NONE), &opts()).unwrap();
        assert_eq!(p.own_key, "");

        let o = opts().use_field_name_by_default(true);
        let p = FieldParams::resolve(&decl("ServicePort", Tags::NONE), &o).unwrap();
        assert_eq!(p.own_key, "SERVICE_PORT");

        let p = FieldParams::resolve(&decl("ServicePort", tags!(env = ",required")), &o).unwrap();
        assert_eq!(p.own_key, "SERVICE_PORT");
        assert!(p.required);
    }

    #[test]
    fn required_if_no_default() {
        let o = opts().required_if_no_default(true);
        let p = FieldParams::resolve(&decl("a", tags!(env = "A")), &o).unwrap();
        assert!(p.required);
        let p = FieldParams::resolve(&decl("b", tags!(env = "B", envDefault = "1")), &o).unwrap();
        assert!(!p.required);
    }

    #[test]
    fn custom_tag_names() {
        let o = opts().tag_name("cfg").default_value_tag_name("cfgDefault");
        let t = tags!(env = "IGNORED", cfg = "HOST", cfgDefault = "localhost");
        let p = FieldParams::resolve(&decl("host", t), &o).unwrap();
        assert_eq!(p.own_key, "HOST");
        assert_eq!(p.default_value.as_deref(), Some("localhost"));
    }

    #[test]
    fn tags_macro_empty() {
        let t: Tags = tags!();
        assert_eq!(t, Tags::NONE);
        assert_eq!(t.get("env"), "");
    }
}
