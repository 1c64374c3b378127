//! Type-keyed parser registry
//!
//! A [`ParserRegistry`] maps a Rust type to the function that turns an
//! environment string into a value of that type. Registries are independent
//! of each other: registering a parser in one never makes it visible through
//! another.

use crate::error::BoxError;
use chrono::{DateTime, FixedOffset, Utc};
use std::{
    any::{Any, TypeId},
    collections::HashMap,
    fmt,
};
use url::Url;
use uuid::Uuid;

type ParseFn<T> = Box<dyn Fn(&str) -> Result<T, BoxError> + Send + Sync>;

/// A parser for one target type
pub struct Parser {
    type_name: &'static str,
    func: Box<dyn Any + Send + Sync>,
}

impl Parser {
    /// Wrap a parsing function for `T`
    pub fn new<T, E, F>(f: F) -> Self
    where
        T: Any,
        E: Into<BoxError>,
        F: Fn(&str) -> Result<T, E> + Send + Sync + 'static,
    {
        let func: ParseFn<T> = Box::new(move |s: &str| f(s).map_err(Into::into));
        Self {
            type_name: std::any::type_name::<T>(),
            func: Box::new(func),
        }
    }

    /// Human-readable name of the target type
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Run the parser, returning `None` if this parser does not produce `T`
    pub fn parse<T: Any>(&self, raw: &str) -> Option<Result<T, BoxError>> {
        self.func
            .downcast_ref::<ParseFn<T>>()
            .map(|parse| parse(raw))
    }
}

impl fmt::Debug for Parser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// Collection of parsers keyed by target type
///
/// # Example
/// ```rust
/// use genv::ParserRegistry;
///
/// #[derive(Debug, PartialEq)]
/// struct Level(u8);
///
/// let registry = ParserRegistry::new()
///     .with_parser(|s: &str| s.parse::<u8>().map(Level));
///
/// assert!(registry.contains::<Level>());
/// assert!(!registry.contains::<String>());
/// ```
#[derive(Debug)]
pub struct ParserRegistry {
    parsers: HashMap<TypeId, Parser>,
}

impl ParserRegistry {
    /// Create a registry with no parsers at all
    pub fn new() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    /// Create a registry seeded with the built-in parsers
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        register_builtins(&mut registry);
        registry
    }

    /// Register a parser for `T`
    ///
    /// # Panics
    ///
    /// Panics if this registry already has a parser for `T`. Registering a
    /// type twice is a programming error, even if both parsers behave the
    /// same.
    pub fn register<T, E, F>(&mut self, f: F)
    where
        T: Any,
        E: Into<BoxError>,
        F: Fn(&str) -> Result<T, E> + Send + Sync + 'static,
    {
        let type_id = TypeId::of::<T>();
        if self.parsers.contains_key(&type_id) {
            panic!(
                "parser for type {} is already registered",
                std::any::type_name::<T>()
            );
        }
        self.parsers.insert(type_id, Parser::new(f));
    }

    /// Builder form of [`register`](Self::register)
    pub fn with_parser<T, E, F>(mut self, f: F) -> Self
    where
        T: Any,
        E: Into<BoxError>,
        F: Fn(&str) -> Result<T, E> + Send + Sync + 'static,
    {
        self.register(f);
        self
    }

    /// Look up the parser for `T`
    pub fn get<T: Any>(&self) -> Option<&Parser> {
        self.parsers.get(&TypeId::of::<T>())
    }

    /// Whether a parser for `T` is registered
    pub fn contains<T: Any>(&self) -> bool {
        self.get::<T>().is_some()
    }

    /// Number of registered parsers
    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    /// Whether no parser is registered
    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }

    /// Names of every registered type, sorted
    pub fn type_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.parsers.values().map(Parser::type_name).collect();
        names.sort_unstable();
        names
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

macro_rules! register_from_str {
    ($registry:expr, $($ty:ty),+ $(,)?) => {
        $( $registry.register(|s: &str| s.parse::<$ty>()); )+
    };
}

fn register_builtins(registry: &mut ParserRegistry) {
    registry.register(|s: &str| Ok::<_, BoxError>(s.to_string()));
    registry.register(parse_bool);
    register_from_str!(
        registry, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64
    );
    registry.register(|s: &str| Url::parse(s));
    registry.register(parse_uuid);
    registry.register(parse_timestamp);
    registry.register(|s: &str| parse_timestamp(s).map(|t| t.with_timezone(&Utc)));
}

/// Strict boolean literals, no `yes`/`no`/`on`/`off`
pub fn parse_bool(s: &str) -> Result<bool, BoxError> {
    match s {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(format!("invalid boolean '{}'", s).into()),
    }
}

/// Canonical hyphenated form only (`xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`)
pub fn parse_uuid(s: &str) -> Result<Uuid, BoxError> {
    if s.len() != 36 {
        return Err(format!("invalid UUID '{}': expected 36 characters", s).into());
    }
    Ok(Uuid::try_parse(s)?)
}

/// RFC 3339 timestamp preserving its offset
pub type Timestamp = DateTime<FixedOffset>;

/// Strict RFC 3339: uppercase `T` between date and time, uppercase `Z` for UTC
pub fn parse_timestamp(s: &str) -> Result<Timestamp, BoxError> {
    if s.as_bytes().get(10) != Some(&b'T') || s.ends_with('z') {
        return Err(format!("invalid RFC 3339 timestamp '{}'", s).into());
    }
    Ok(DateTime::parse_from_rfc3339(s)?)
}
