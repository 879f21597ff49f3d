//! Binding descriptors: how a Rust type takes part in a bind.
//!
//! There is no runtime reflection, so every type that can sit in a bound
//! struct describes itself through [`Bindable`]: which [`Kind`] parser it
//! accepts, whether it parses itself from text, and the structural hooks the
//! walker needs (nested structs, `Option` pointers, repeated struct groups).
//!
//! Structs opt in by implementing [`EnvStruct`]; a blanket impl then makes
//! every `EnvStruct + Default` type bindable as a nested field, an `Option`
//! pointee or a slice element.
//!
//! ```
//! use envbind::{Bindable, BoxError, EnvError, EnvStruct, Walker, parse_text, tags};
//!
//! #[derive(Debug, PartialEq)]
//! struct Level(String);
//!
//! impl std::str::FromStr for Level {
//!     type Err = std::convert::Infallible;
//!     fn from_str(s: &str) -> Result<Self, Self::Err> {
//!         Ok(Level(s.to_lowercase()))
//!     }
//! }
//!
//! impl Bindable for Level {
//!     fn text_unmarshaler() -> Option<fn(&str) -> Result<Self, BoxError>> {
//!         Some(parse_text::<Self>)
//!     }
//! }
//!
//! #[derive(Default)]
//! struct Cfg {
//!     level: Option<Level>,
//! }
//!
//! impl EnvStruct for Cfg {
//!     fn bind(&mut self, w: &mut Walker<'_>) -> Result<(), EnvError> {
//!         w.field("level", tags!(env = "LEVEL"), &mut self.level)
//!     }
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{BoxError, EnvError};
use crate::options::Options;
use crate::parser::{Kind, Parsers, Scalar};
use crate::tags::FieldDecl;
use crate::walk::Walker;

/// A struct whose fields can be bound from the environment.
///
/// `bind` registers every bindable field with the walker, in declaration
/// order. Fields that are not registered are never touched.
pub trait EnvStruct {
    fn bind(&mut self, w: &mut Walker<'_>) -> Result<(), EnvError>;
}

/// Callback the slice assembler runs for every element of a struct slice.
pub type ElementFn<'f> = dyn FnMut(usize, &mut dyn EnvStruct) -> Result<(), EnvError> + 'f;

/// Compile-time descriptor of a field type.
///
/// Every method has a default, so leaf types only override what they
/// support: a scalar sets [`kind`](Self::kind) and
/// [`from_scalar`](Self::from_scalar), a text-parsed type sets
/// [`text_unmarshaler`](Self::text_unmarshaler), and a type handled purely
/// by a registered parser needs an empty impl.
pub trait Bindable: Sized + 'static {
    /// Built-in kind parser this type accepts.
    fn kind() -> Option<Kind> {
        None
    }

    /// Convert the output of the kind parser into `Self`.
    fn from_scalar(_scalar: Scalar) -> Option<Self> {
        None
    }

    /// Parse-from-text capability.
    fn text_unmarshaler() -> Option<fn(&str) -> Result<Self, BoxError>> {
        None
    }

    /// Last step of the lookup chain, used by collections and pointers.
    fn parse_composite(_raw: &str, cx: &ParseCx<'_>) -> Result<Self, EnvError> {
        Err(cx.no_parser())
    }

    /// Fresh value used to fill new slice positions and `init` pointers.
    fn allocate() -> Option<Self> {
        None
    }

    fn is_struct() -> bool {
        false
    }

    /// A struct, or an `Option` pointing at one.
    fn struct_target() -> bool {
        Self::is_struct()
    }

    /// Whether a parser (registered type, kind or text) handles this type.
    fn claimed(parsers: &Parsers) -> bool {
        parsers.has::<Self>()
            || Self::kind().is_some_and(|kind| parsers.has_kind(kind))
            || Self::text_unmarshaler().is_some()
    }

    fn as_struct(&mut self) -> Option<&mut dyn EnvStruct> {
        None
    }

    /// Pointee of a non-nil pointer to struct.
    fn pointee(&mut self) -> Option<&mut dyn EnvStruct> {
        None
    }

    /// Allocate a nil pointer to struct and return the pointee to descend
    /// into, unless the pointee type has a registered parser.
    fn init_pointer(&mut self, _parsers: &Parsers) -> Option<&mut dyn EnvStruct> {
        None
    }

    /// A slice (or pointer to slice) of structs that no parser claims.
    fn is_struct_slice(_parsers: &Parsers) -> bool {
        false
    }

    /// Grow a struct slice to at least `count` elements and run `each` over
    /// every element. Returns the resulting length.
    fn assemble(&mut self, _count: usize, _each: &mut ElementFn<'_>) -> Result<usize, EnvError> {
        Ok(0)
    }
}

/// Type-erased assignment of a parsed raw value.
pub trait Slot {
    fn assign(&mut self, raw: &str, cx: &ParseCx<'_>) -> Result<(), EnvError>;
}

impl<T: Bindable> Slot for T {
    fn assign(&mut self, raw: &str, cx: &ParseCx<'_>) -> Result<(), EnvError> {
        *self = parse_value::<T>(raw, cx)?;
        Ok(())
    }
}

/// Everything a parse needs to know about the field being set.
pub struct ParseCx<'a> {
    pub field: &'a FieldDecl,
    pub parsers: &'a Parsers,
    pub separator: &'static str,
    pub key_value_separator: &'static str,
}

impl<'a> ParseCx<'a> {
    pub fn new(field: &'a FieldDecl, opts: &'a Options) -> Self {
        let tag_or = |name: &str, fallback: &'static str| match field.tags.get(name) {
            "" => fallback,
            declared => declared,
        };
        Self {
            field,
            parsers: &opts.parsers,
            separator: tag_or(&opts.separator_tag_name, ","),
            key_value_separator: tag_or(&opts.key_value_separator_tag_name, ":"),
        }
    }

    pub fn parse_error(&self, source: impl Into<BoxError>) -> EnvError {
        EnvError::ParseError {
            field: self.field.name,
            type_name: self.field.type_name,
            source: source.into(),
        }
    }

    pub fn no_parser(&self) -> EnvError {
        EnvError::NoParserFound {
            field: self.field.name,
            type_name: self.field.type_name,
        }
    }
}

/// Parse `raw` into `T`: registered type parser, then kind parser, then
/// text unmarshaling, then the type's composite handling.
pub fn parse_value<T: Bindable>(raw: &str, cx: &ParseCx<'_>) -> Result<T, EnvError> {
    if let Some(result) = cx.parsers.parse_type::<T>(raw) {
        return result.map_err(|err| cx.parse_error(err));
    }
    if let Some(kind) = T::kind()
        && let Some(result) = cx.parsers.parse_kind(kind, raw)
    {
        let scalar = result.map_err(|err| cx.parse_error(err))?;
        let produced = scalar.kind();
        return T::from_scalar(scalar).ok_or_else(|| {
            cx.parse_error(format!("{kind:?} parser produced a {produced:?} value"))
        });
    }
    if let Some(unmarshal) = T::text_unmarshaler() {
        return unmarshal(raw).map_err(|err| cx.parse_error(err));
    }
    T::parse_composite(raw, cx)
}

/// Text unmarshaling through [`FromStr`], for use in
/// [`Bindable::text_unmarshaler`].
pub fn parse_text<T>(raw: &str) -> Result<T, BoxError>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse::<T>().map_err(Into::into)
}

macro_rules! scalar_bindable {
    ($($ty:ty => $kind:ident),* $(,)?) => {$(
        impl Bindable for $ty {
            fn kind() -> Option<Kind> {
                Some(Kind::$kind)
            }

            fn from_scalar(scalar: Scalar) -> Option<Self> {
                match scalar {
                    Scalar::$kind(value) => Some(value),
                    _ => None,
                }
            }
        }
    )*};
}

scalar_bindable! {
    bool => Bool,
    String => String,
    isize => Int,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    usize => Uint,
    u8 => Uint8,
    u16 => Uint16,
    u32 => Uint32,
    u64 => Uint64,
    f32 => Float32,
    f64 => Float64,
}

macro_rules! text_bindable {
    ($($ty:ty),* $(,)?) => {$(
        impl Bindable for $ty {
            fn text_unmarshaler() -> Option<fn(&str) -> Result<Self, BoxError>> {
                Some(parse_text::<Self>)
            }
        }
    )*};
}

text_bindable!(PathBuf, IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr);

// Handled by the default registry.
impl Bindable for Duration {}

#[cfg(feature = "url")]
impl Bindable for url::Url {}

#[cfg(feature = "tz")]
impl Bindable for chrono_tz::Tz {}

impl<T: EnvStruct + Default + 'static> Bindable for T {
    fn allocate() -> Option<Self> {
        Some(T::default())
    }

    fn is_struct() -> bool {
        true
    }

    fn as_struct(&mut self) -> Option<&mut dyn EnvStruct> {
        Some(self)
    }
}

impl<T: Bindable> Bindable for Option<T> {
    fn parse_composite(raw: &str, cx: &ParseCx<'_>) -> Result<Self, EnvError> {
        parse_value::<T>(raw, cx).map(Some)
    }

    fn allocate() -> Option<Self> {
        T::allocate().map(Some)
    }

    fn struct_target() -> bool {
        T::is_struct()
    }

    fn claimed(parsers: &Parsers) -> bool {
        T::claimed(parsers)
    }

    fn pointee(&mut self) -> Option<&mut dyn EnvStruct> {
        self.as_mut().and_then(|inner| inner.as_struct())
    }

    fn init_pointer(&mut self, parsers: &Parsers) -> Option<&mut dyn EnvStruct> {
        if self.is_some() || !T::is_struct() {
            return None;
        }
        let inner = self.insert(T::allocate()?);
        if parsers.has::<T>() {
            return None;
        }
        inner.as_struct()
    }

    fn is_struct_slice(parsers: &Parsers) -> bool {
        T::is_struct_slice(parsers)
    }

    /// A pointer to a slice is always rebuilt from scratch and only stored
    /// when at least one element was found.
    fn assemble(&mut self, count: usize, each: &mut ElementFn<'_>) -> Result<usize, EnvError> {
        let Some(mut fresh) = T::allocate() else {
            return Ok(0);
        };
        let len = fresh.assemble(count, each)?;
        if len > 0 {
            *self = Some(fresh);
        }
        Ok(len)
    }
}

impl<T: Bindable> Bindable for Vec<T> {
    fn parse_composite(raw: &str, cx: &ParseCx<'_>) -> Result<Self, EnvError> {
        raw.split(cx.separator)
            .map(|part| parse_value::<T>(part, cx))
            .collect()
    }

    fn allocate() -> Option<Self> {
        Some(Vec::new())
    }

    fn is_struct_slice(parsers: &Parsers) -> bool {
        T::struct_target() && !T::claimed(parsers)
    }

    fn assemble(&mut self, count: usize, each: &mut ElementFn<'_>) -> Result<usize, EnvError> {
        while self.len() < count {
            match T::allocate() {
                Some(item) => self.push(item),
                None => break,
            }
        }

        let mut errors = Vec::new();
        for (i, item) in self.iter_mut().enumerate() {
            if !T::is_struct()
                && item.pointee().is_none()
                && let Some(fresh) = T::allocate()
            {
                *item = fresh;
            }
            let target = if T::is_struct() {
                item.as_struct()
            } else {
                item.pointee()
            };
            let Some(target) = target else { continue };
            if let Err(err) = each(i, target) {
                if err.is_structural() {
                    return Err(err);
                }
                errors.push(err);
            }
        }

        match EnvError::join(errors) {
            Some(err) => Err(err),
            None => Ok(self.len()),
        }
    }
}

impl<K, V> Bindable for HashMap<K, V>
where
    K: Bindable + Eq + Hash,
    V: Bindable,
{
    fn parse_composite(raw: &str, cx: &ParseCx<'_>) -> Result<Self, EnvError> {
        parse_map(raw, cx)
    }
}

impl<K, V> Bindable for BTreeMap<K, V>
where
    K: Bindable + Ord,
    V: Bindable,
{
    fn parse_composite(raw: &str, cx: &ParseCx<'_>) -> Result<Self, EnvError> {
        parse_map(raw, cx)
    }
}

fn parse_map<K, V, M>(raw: &str, cx: &ParseCx<'_>) -> Result<M, EnvError>
where
    K: Bindable,
    V: Bindable,
    M: FromIterator<(K, V)>,
{
    raw.split(cx.separator)
        .map(|part| {
            let pieces: Vec<&str> = part.split(cx.key_value_separator).collect();
            let &[key, value] = pieces.as_slice() else {
                return Err(cx.parse_error(format!(
                    "{part:?} should be in \"key{}value\" format",
                    cx.key_value_separator
                )));
            };
            Ok((parse_value::<K>(key, cx)?, parse_value::<V>(value, cx)?))
        })
        .collect()
}
