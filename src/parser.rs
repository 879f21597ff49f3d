//! Type parser registry: converts raw strings into typed values.
//!
//! Two tiers, checked in order:
//!
//! 1. **Concrete type overrides**, keyed by [`TypeId`]. Seeded with
//!    [`Duration`], and with `url::Url` / `chrono_tz::Tz` when the matching
//!    features are enabled.
//! 2. **Kind fallbacks**, keyed by [`Kind`]. Seeded with bool, string and
//!    every integer and float width. A kind parser yields a [`Scalar`], which
//!    the field type then converts into itself, so newtypes over primitives
//!    can reuse the built-ins.
//!
//! Registering a parser replaces any previous one for the same key; nothing
//! is ever removed, so custom parsers layer over the defaults.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::duration::parse_duration;
use crate::error::BoxError;

/// Primitive kinds with a built-in fallback parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Bool,
    String,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float32,
    Float64,
}

/// Value produced by a kind parser.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    String(String),
    Int(isize),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Uint(usize),
    Uint8(u8),
    Uint16(u16),
    Uint32(u32),
    Uint64(u64),
    Float32(f32),
    Float64(f64),
}

impl Scalar {
    pub fn kind(&self) -> Kind {
        match self {
            Scalar::Bool(_) => Kind::Bool,
            Scalar::String(_) => Kind::String,
            Scalar::Int(_) => Kind::Int,
            Scalar::Int8(_) => Kind::Int8,
            Scalar::Int16(_) => Kind::Int16,
            Scalar::Int32(_) => Kind::Int32,
            Scalar::Int64(_) => Kind::Int64,
            Scalar::Uint(_) => Kind::Uint,
            Scalar::Uint8(_) => Kind::Uint8,
            Scalar::Uint16(_) => Kind::Uint16,
            Scalar::Uint32(_) => Kind::Uint32,
            Scalar::Uint64(_) => Kind::Uint64,
            Scalar::Float32(_) => Kind::Float32,
            Scalar::Float64(_) => Kind::Float64,
        }
    }
}

pub type KindParser = Arc<dyn Fn(&str) -> Result<Scalar, BoxError> + Send + Sync>;

type TypeParser = Arc<dyn Fn(&str) -> Result<Box<dyn Any>, BoxError> + Send + Sync>;

#[derive(Clone)]
pub struct Parsers {
    by_type: HashMap<TypeId, TypeParser>,
    by_kind: HashMap<Kind, KindParser>,
}

impl fmt::Debug for Parsers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<&Kind> = self.by_kind.keys().collect();
        kinds.sort_by_key(|k| format!("{k:?}"));
        f.debug_struct("Parsers")
            .field("types", &self.by_type.len())
            .field("kinds", &kinds)
            .finish()
    }
}

impl Default for Parsers {
    fn default() -> Self {
        let mut parsers = Self::empty();
        parsers.seed_kinds();
        parsers.register(|raw: &str| parse_duration(raw));
        #[cfg(feature = "url")]
        parsers.register(|raw: &str| url::Url::parse(raw));
        #[cfg(feature = "tz")]
        parsers.register(|raw: &str| raw.parse::<chrono_tz::Tz>());
        parsers
    }
}

impl Parsers {
    /// A registry with no parsers at all. Mostly useful as a container for
    /// custom parsers that get merged over [`Parsers::default`].
    pub fn empty() -> Self {
        Self {
            by_type: HashMap::new(),
            by_kind: HashMap::new(),
        }
    }

    /// Register a parser for the concrete type `T`, replacing any existing one.
    pub fn register<T, E, F>(&mut self, parser: F) -> &mut Self
    where
        T: Any,
        E: Into<BoxError>,
        F: Fn(&str) -> Result<T, E> + Send + Sync + 'static,
    {
        let erased: TypeParser = Arc::new(move |raw: &str| {
            parser(raw)
                .map(|value| Box::new(value) as Box<dyn Any>)
                .map_err(Into::into)
        });
        self.by_type.insert(TypeId::of::<T>(), erased);
        self
    }

    /// Register a fallback parser for every field of the given kind.
    pub fn register_kind<E, F>(&mut self, kind: Kind, parser: F) -> &mut Self
    where
        E: Into<BoxError>,
        F: Fn(&str) -> Result<Scalar, E> + Send + Sync + 'static,
    {
        self.by_kind
            .insert(kind, Arc::new(move |raw: &str| parser(raw).map_err(Into::into)));
        self
    }

    /// Layer `other` over `self`: entries in `other` win, entries only in
    /// `self` are kept.
    pub fn merge(&mut self, other: &Parsers) -> &mut Self {
        for (id, parser) in &other.by_type {
            self.by_type.insert(*id, Arc::clone(parser));
        }
        for (kind, parser) in &other.by_kind {
            self.by_kind.insert(*kind, Arc::clone(parser));
        }
        self
    }

    /// Whether a concrete parser is registered for `T`.
    pub fn has<T: Any>(&self) -> bool {
        self.by_type.contains_key(&TypeId::of::<T>())
    }

    pub fn has_kind(&self, kind: Kind) -> bool {
        self.by_kind.contains_key(&kind)
    }

    /// Run the concrete parser for `T`, if one is registered.
    pub fn parse_type<T: Any>(&self, raw: &str) -> Option<Result<T, BoxError>> {
        let parser = self.by_type.get(&TypeId::of::<T>())?;
        Some(parser(raw).and_then(|value| {
            value
                .downcast::<T>()
                .map(|boxed| *boxed)
                .map_err(|_| "registered parser produced a value of another type".into())
        }))
    }

    /// Run the fallback parser for `kind`, if one is registered.
    pub fn parse_kind(&self, kind: Kind, raw: &str) -> Option<Result<Scalar, BoxError>> {
        self.by_kind.get(&kind).map(|parser| parser(raw))
    }

    fn seed_kinds(&mut self) {
        self.register_kind(Kind::Bool, |raw| parse_bool(raw).map(Scalar::Bool));
        self.register_kind(Kind::String, |raw| {
            Ok::<_, BoxError>(Scalar::String(raw.to_string()))
        });
        self.register_kind(Kind::Int, |raw| raw.parse().map(Scalar::Int));
        self.register_kind(Kind::Int8, |raw| raw.parse().map(Scalar::Int8));
        self.register_kind(Kind::Int16, |raw| raw.parse().map(Scalar::Int16));
        self.register_kind(Kind::Int32, |raw| raw.parse().map(Scalar::Int32));
        self.register_kind(Kind::Int64, |raw| raw.parse().map(Scalar::Int64));
        self.register_kind(Kind::Uint, |raw| raw.parse().map(Scalar::Uint));
        self.register_kind(Kind::Uint8, |raw| raw.parse().map(Scalar::Uint8));
        self.register_kind(Kind::Uint16, |raw| raw.parse().map(Scalar::Uint16));
        self.register_kind(Kind::Uint32, |raw| raw.parse().map(Scalar::Uint32));
        self.register_kind(Kind::Uint64, |raw| raw.parse().map(Scalar::Uint64));
        self.register_kind(Kind::Float32, |raw| raw.parse().map(Scalar::Float32));
        self.register_kind(Kind::Float64, |raw| raw.parse().map(Scalar::Float64));
    }
}

/// Accepts the spellings `1 t T TRUE true True 0 f F FALSE false False`.
fn parse_bool(raw: &str) -> Result<bool, BoxError> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(format!("invalid boolean {raw:?}").into()),
    }
}
