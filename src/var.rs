use crate::{
    allow::AllowDefault,
    builder::Genv,
    error::Error,
    registry::Parser,
    slot::Slot,
};
use std::{any::Any, env};
use tracing::{debug, trace};

/// Default value attached to a variable
#[derive(Debug, Clone)]
pub struct Fallback {
    value: String,
    allow: Option<AllowDefault>,
}

impl Fallback {
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Per-call policy, if one overrides the variable's own
    pub fn allow(&self) -> Option<&AllowDefault> {
        self.allow.as_ref()
    }
}

/// One declared environment variable
///
/// The raw value is read from the process environment when the descriptor is
/// created and never re-read.
#[derive(Debug, Clone)]
pub struct Descriptor {
    key: String,
    value: String,
    found: bool,
    optional: bool,
    allow: AllowDefault,
    split_key: String,
    fallback: Option<Fallback>,
}

impl Descriptor {
    pub(crate) fn lookup(key: String, allow: AllowDefault, split_key: String) -> Self {
        let (value, found) = match env::var(&key) {
            Ok(value) => (value, true),
            Err(env::VarError::NotPresent) => (String::new(), false),
            Err(env::VarError::NotUnicode(raw)) => (raw.to_string_lossy().into_owned(), true),
        };
        Self {
            key,
            value,
            found,
            optional: false,
            allow,
            split_key,
            fallback: None,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Raw value as read from the environment, empty when absent
    pub fn raw_value(&self) -> &str {
        &self.value
    }

    pub fn is_found(&self) -> bool {
        self.found
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn split_key(&self) -> &str {
        &self.split_key
    }

    pub fn fallback(&self) -> Option<&Fallback> {
        self.fallback.as_ref()
    }

    /// Resolve the string value, consulting the fallback only when the
    /// variable is absent from the environment
    pub fn resolve(&self, genv: &Genv) -> Result<String, Error> {
        if self.found {
            return Ok(self.value.clone());
        }
        let Some(fallback) = &self.fallback else {
            return Ok(String::new());
        };

        let allow = fallback.allow.as_ref().unwrap_or(&self.allow);
        let allowed = allow
            .evaluate(genv)
            .map_err(|e| Error::default_policy(&self.key, e))?;
        if allowed {
            debug!(key = %self.key, "using default value");
            Ok(fallback.value.clone())
        } else {
            Ok(String::new())
        }
    }

    /// Resolve and parse a single value, absent optional values becoming
    /// `T::default()`
    pub fn parse_value<T: Any + Default>(&self, genv: &Genv) -> Result<T, Error> {
        self.parse_opt::<T>(genv).map(Option::unwrap_or_default)
    }

    /// Resolve and parse a single value, absent optional values becoming `None`
    pub fn parse_opt<T: Any>(&self, genv: &Genv) -> Result<Option<T>, Error> {
        let parser = self.parser::<T>(genv)?;
        let value = self.resolve(genv)?;
        if value.is_empty() {
            return self.empty();
        }
        self.parse_with(parser, &value).map(Some)
    }

    /// Resolve once, split on the split key and parse every non-empty token
    pub fn parse_values<T: Any>(&self, genv: &Genv) -> Result<Vec<T>, Error> {
        let parser = self.parser::<T>(genv)?;
        let value = self.resolve(genv)?;
        if value.is_empty() {
            return self.empty();
        }
        if self.split_key.is_empty() {
            return Err(Error::EmptySplitKey {
                key: self.key.clone(),
            });
        }

        let tokens: Vec<&str> = value
            .split(self.split_key.as_str())
            .filter(|token| !token.is_empty())
            .collect();
        if tokens.is_empty() {
            return self.empty();
        }
        tokens
            .into_iter()
            .map(|token| self.parse_with(parser, token))
            .collect()
    }

    fn parser<'r, T: Any>(&self, genv: &'r Genv) -> Result<&'r Parser, Error> {
        genv.registry()
            .get::<T>()
            .ok_or_else(|| Error::no_parser::<T>(&self.key))
    }

    fn empty<T: Default>(&self) -> Result<T, Error> {
        if self.optional {
            Ok(T::default())
        } else {
            Err(Error::missing(&self.key))
        }
    }

    fn parse_with<T: Any>(&self, parser: &Parser, value: &str) -> Result<T, Error> {
        match parser.parse::<T>(value) {
            Some(Ok(parsed)) => Ok(parsed),
            Some(Err(e)) => Err(Error::parse::<T>(&self.key, value, e)),
            None => Err(Error::no_parser::<T>(&self.key)),
        }
    }
}

/// Builder for a variable declared on a [`Genv`]
///
/// Modifiers consume and return the builder; the terminal methods
/// ([`value`](Var::value), [`values`](Var::values) and their `_into` forms)
/// freeze the descriptor and queue it for the next [`Genv::parse`].
///
/// # Example
/// ```rust
/// use genv::{AllowDefault, Genv};
///
/// let mut genv = Genv::builder().allow_default(AllowDefault::always()).build();
/// let port = genv.var("GENV_DOC_PORT").default("8080").value::<u16>();
/// let hosts = genv.var("GENV_DOC_HOSTS").optional().values::<String>();
///
/// genv.parse().unwrap();
/// assert_eq!(port.get(), 8080);
/// assert!(hosts.get().is_empty());
/// ```
#[must_use = "a variable is only parsed once a value method queues it"]
pub struct Var<'g> {
    genv: &'g mut Genv,
    desc: Descriptor,
}

impl<'g> Var<'g> {
    pub(crate) fn new(genv: &'g mut Genv, desc: Descriptor) -> Self {
        Self { genv, desc }
    }

    /// Resolve an absent value to the type's default instead of failing
    pub fn optional(mut self) -> Self {
        self.desc.optional = true;
        self
    }

    /// Use `value` when the variable is absent and the variable's policy allows it
    pub fn default(mut self, value: impl Into<String>) -> Self {
        self.desc.fallback = Some(Fallback {
            value: value.into(),
            allow: None,
        });
        self
    }

    /// Use `value` when the variable is absent and `allow` permits it
    pub fn default_with(mut self, value: impl Into<String>, allow: AllowDefault) -> Self {
        self.desc.fallback = Some(Fallback {
            value: value.into(),
            allow: Some(allow),
        });
        self
    }

    /// Override the instance policy for this variable
    pub fn allow_default(mut self, allow: AllowDefault) -> Self {
        self.desc.allow = allow;
        self
    }

    /// Override the separator used by [`values`](Var::values)
    pub fn split_key(mut self, split_key: impl Into<String>) -> Self {
        self.desc.split_key = split_key.into();
        self
    }

    pub fn descriptor(&self) -> &Descriptor {
        &self.desc
    }

    /// Queue a single value and return the slot it will be stored in
    pub fn value<T: Any + Default>(self) -> Slot<T> {
        let slot = Slot::new();
        self.value_into(&slot);
        slot
    }

    /// Queue a single value to be stored in an existing slot
    pub fn value_into<T: Any + Default>(self, slot: &Slot<T>) {
        let slot = slot.clone();
        let desc = self.desc;
        self.genv.enqueue(move |genv| {
            let parsed = desc.parse_value::<T>(genv)?;
            trace!(key = %desc.key, "parsed variable");
            slot.replace(parsed);
            Ok(())
        });
    }

    /// Queue a single value for types without a meaningful default
    pub fn value_opt<T: Any>(self) -> Slot<Option<T>> {
        let slot = Slot::new();
        self.value_opt_into(&slot);
        slot
    }

    /// Queue a single value to be stored in an existing optional slot
    pub fn value_opt_into<T: Any>(self, slot: &Slot<Option<T>>) {
        let slot = slot.clone();
        let desc = self.desc;
        self.genv.enqueue(move |genv| {
            let parsed = desc.parse_opt::<T>(genv)?;
            trace!(key = %desc.key, found = parsed.is_some(), "parsed variable");
            slot.replace(parsed);
            Ok(())
        });
    }

    /// Queue a separated list and return the slot it will be stored in
    pub fn values<T: Any>(self) -> Slot<Vec<T>> {
        let slot = Slot::new();
        self.values_into(&slot);
        slot
    }

    /// Queue a separated list to be stored in an existing slot
    pub fn values_into<T: Any>(self, slot: &Slot<Vec<T>>) {
        let slot = slot.clone();
        let desc = self.desc;
        self.genv.enqueue(move |genv| {
            let parsed = desc.parse_values::<T>(genv)?;
            trace!(key = %desc.key, count = parsed.len(), "parsed variable list");
            slot.replace(parsed);
            Ok(())
        });
    }
}
