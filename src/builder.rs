use crate::{
    allow::AllowDefault,
    error::Error,
    registry::ParserRegistry,
    var::{Descriptor, Var},
};
use std::{fmt, sync::Arc};
use tracing::debug;

/// Separator used by multi-value variables unless overridden
pub const DEFAULT_SPLIT_KEY: &str = ",";

type Action = Box<dyn FnOnce(&Genv) -> Result<(), Error>>;

/// Configuration instance collecting declared variables until [`parse`](Genv::parse)
///
/// Declaring a variable reads the environment right away but parses nothing.
/// `parse` then runs every queued variable in declaration order and stops at
/// the first error. Values stored before the failure are kept.
///
/// # Example
/// ```rust
/// use genv::Genv;
///
/// std::env::set_var("GENV_DOC_WORKERS", "4");
///
/// let mut genv = Genv::new();
/// let workers = genv.var("GENV_DOC_WORKERS").value::<usize>();
/// let debug = genv.var("GENV_DOC_DEBUG").optional().value::<bool>();
///
/// genv.parse().unwrap();
/// assert_eq!(workers.get(), 4);
/// assert!(!debug.get());
/// ```
pub struct Genv {
    allow_default: AllowDefault,
    split_key: String,
    registry: Arc<ParserRegistry>,
    pending: Vec<Action>,
}

impl Genv {
    /// Instance with the default registry, `,` as split key and defaults
    /// governed by [`ALLOW_DEFAULT_KEY`](crate::ALLOW_DEFAULT_KEY)
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> GenvBuilder {
        GenvBuilder::new()
    }

    /// Declare a variable, reading its current value from the environment
    pub fn var(&mut self, key: impl Into<String>) -> Var<'_> {
        let desc = Descriptor::lookup(
            key.into(),
            self.allow_default.clone(),
            self.split_key.clone(),
        );
        Var::new(self, desc)
    }

    pub(crate) fn enqueue(&mut self, action: impl FnOnce(&Genv) -> Result<(), Error> + 'static) {
        self.pending.push(Box::new(action));
    }

    /// Number of variables waiting for the next [`parse`](Genv::parse)
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Parse every queued variable in declaration order
    ///
    /// The queue is emptied whether or not parsing succeeds, so the instance
    /// can be reused for another batch.
    pub fn parse(&mut self) -> Result<(), Error> {
        let pending = std::mem::take(&mut self.pending);
        debug!(count = pending.len(), "parsing environment variables");

        for action in pending {
            action(self)?;
        }
        Ok(())
    }

    /// Copy of this instance sharing its policy, split key and registry but
    /// with an empty queue
    pub fn detached(&self) -> Genv {
        Genv {
            allow_default: self.allow_default.clone(),
            split_key: self.split_key.clone(),
            registry: Arc::clone(&self.registry),
            pending: Vec::new(),
        }
    }

    pub fn registry(&self) -> &ParserRegistry {
        &self.registry
    }

    pub fn split_key(&self) -> &str {
        &self.split_key
    }

    pub fn allow_default(&self) -> &AllowDefault {
        &self.allow_default
    }
}

impl Default for Genv {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Genv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Genv")
            .field("split_key", &self.split_key)
            .field("registry", &self.registry.type_names())
            .field("pending", &self.pending.len())
            .finish()
    }
}

/// Builder for a [`Genv`]
///
/// # Example
/// ```rust
/// use genv::{AllowDefault, Genv, ParserRegistry};
/// use std::sync::Arc;
///
/// let registry = Arc::new(ParserRegistry::with_defaults());
/// let genv = Genv::builder()
///     .allow_default(AllowDefault::always())
///     .split_key(";")
///     .registry(Arc::clone(&registry))
///     .build();
///
/// assert_eq!(genv.split_key(), ";");
/// ```
#[derive(Debug, Default)]
pub struct GenvBuilder {
    allow_default: Option<AllowDefault>,
    split_key: Option<String>,
    registry: Option<Arc<ParserRegistry>>,
}

impl GenvBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instance-wide default policy
    pub fn allow_default(mut self, allow: AllowDefault) -> Self {
        self.allow_default = Some(allow);
        self
    }

    pub fn split_key(mut self, split_key: impl Into<String>) -> Self {
        self.split_key = Some(split_key.into());
        self
    }

    /// Share a registry instead of creating a fresh default one
    pub fn registry(mut self, registry: Arc<ParserRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn build(self) -> Genv {
        Genv {
            allow_default: self.allow_default.unwrap_or_default(),
            split_key: self
                .split_key
                .unwrap_or_else(|| DEFAULT_SPLIT_KEY.to_string()),
            registry: self
                .registry
                .unwrap_or_else(|| Arc::new(ParserRegistry::with_defaults())),
            pending: Vec::new(),
        }
    }
}
