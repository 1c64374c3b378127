//! Declarative bindings resolved against a [`Genv`] at the very end
//!
//! [`bind`] and [`bind_many`] describe a variable and the place its value
//! goes without needing an instance. [`parse`] attaches every binding to an
//! instance, runs the batch and writes the results back:
//!
//! ```rust
//! use genv::{bind, bind_many, AllowDefault, Genv};
//!
//! std::env::set_var("GENV_DOC_BIND_TAGS", "api,web,,production,");
//!
//! let mut port = 0u16;
//! let mut tags: Vec<String> = Vec::new();
//! let mut genv = Genv::builder().allow_default(AllowDefault::always()).build();
//!
//! genv::parse(
//!     &mut genv,
//!     vec![
//!         bind("GENV_DOC_BIND_PORT", &mut port).default("8080").into(),
//!         bind_many("GENV_DOC_BIND_TAGS", &mut tags).into(),
//!     ],
//! )
//! .unwrap();
//!
//! assert_eq!(port, 8080);
//! assert_eq!(tags, ["api", "web", "production"]);
//! ```

use crate::{
    allow::AllowDefault,
    builder::Genv,
    error::Error,
    slot::Slot,
    var::Var,
};
use std::any::Any;

/// A binding that can be attached to an instance and later committed
pub trait Binding {
    /// Declare the variable on `genv`, queueing its parse
    fn attach(&mut self, genv: &mut Genv);

    /// Write the parsed value into the target, if one was produced
    fn commit(self: Box<Self>);
}

#[derive(Default)]
struct Modifiers {
    optional: bool,
    fallback: Option<(String, Option<AllowDefault>)>,
    allow: Option<AllowDefault>,
    split_key: Option<String>,
}

impl Modifiers {
    fn apply<'g>(&self, mut var: Var<'g>) -> Var<'g> {
        if self.optional {
            var = var.optional();
        }
        if let Some(allow) = &self.allow {
            var = var.allow_default(allow.clone());
        }
        if let Some(split_key) = &self.split_key {
            var = var.split_key(split_key.clone());
        }
        match &self.fallback {
            Some((value, Some(allow))) => var.default_with(value.clone(), allow.clone()),
            Some((value, None)) => var.default(value.clone()),
            None => var,
        }
    }
}

macro_rules! modifiers {
    ($name:ident) => {
        impl<'a, T> $name<'a, T> {
            /// Resolve an absent value instead of failing
            pub fn optional(mut self) -> Self {
                self.modifiers.optional = true;
                self
            }

            pub fn default(mut self, value: impl Into<String>) -> Self {
                self.modifiers.fallback = Some((value.into(), None));
                self
            }

            pub fn default_with(mut self, value: impl Into<String>, allow: AllowDefault) -> Self {
                self.modifiers.fallback = Some((value.into(), Some(allow)));
                self
            }

            pub fn allow_default(mut self, allow: AllowDefault) -> Self {
                self.modifiers.allow = Some(allow);
                self
            }
        }
    };
}

/// Binding of one variable to a single value
#[must_use = "bindings do nothing until passed to genv::parse"]
pub struct Bind<'a, T> {
    key: String,
    target: &'a mut T,
    modifiers: Modifiers,
    slot: Slot<T>,
}

/// Bind `key` to `target`
pub fn bind<'a, T: Any + Default>(key: impl Into<String>, target: &'a mut T) -> Bind<'a, T> {
    Bind {
        key: key.into(),
        target,
        modifiers: Modifiers::default(),
        slot: Slot::new(),
    }
}

modifiers!(Bind);

impl<'a, T: Any + Default> Binding for Bind<'a, T> {
    fn attach(&mut self, genv: &mut Genv) {
        self.modifiers
            .apply(genv.var(self.key.as_str()))
            .value_into(&self.slot);
    }

    fn commit(self: Box<Self>) {
        let Self { target, slot, .. } = *self;
        if slot.is_assigned() {
            *target = slot.take();
        }
    }
}

impl<'a, T: Any + Default> From<Bind<'a, T>> for Box<dyn Binding + 'a> {
    fn from(bind: Bind<'a, T>) -> Self {
        Box::new(bind)
    }
}

/// Binding of one variable to an `Option`, for types without a default
#[must_use = "bindings do nothing until passed to genv::parse"]
pub struct BindOpt<'a, T> {
    key: String,
    target: &'a mut Option<T>,
    modifiers: Modifiers,
    slot: Slot<Option<T>>,
}

/// Bind `key` to `target`; an absent optional variable stores `None`
pub fn bind_opt<'a, T: Any>(key: impl Into<String>, target: &'a mut Option<T>) -> BindOpt<'a, T> {
    BindOpt {
        key: key.into(),
        target,
        modifiers: Modifiers::default(),
        slot: Slot::new(),
    }
}

modifiers!(BindOpt);

impl<'a, T: Any> Binding for BindOpt<'a, T> {
    fn attach(&mut self, genv: &mut Genv) {
        self.modifiers
            .apply(genv.var(self.key.as_str()))
            .value_opt_into(&self.slot);
    }

    fn commit(self: Box<Self>) {
        let Self { target, slot, .. } = *self;
        if slot.is_assigned() {
            *target = slot.take();
        }
    }
}

impl<'a, T: Any> From<BindOpt<'a, T>> for Box<dyn Binding + 'a> {
    fn from(bind: BindOpt<'a, T>) -> Self {
        Box::new(bind)
    }
}

/// Binding of one variable to a separated list of values
#[must_use = "bindings do nothing until passed to genv::parse"]
pub struct BindMany<'a, T> {
    key: String,
    target: &'a mut Vec<T>,
    modifiers: Modifiers,
    slot: Slot<Vec<T>>,
}

/// Bind `key` to `target`, splitting the value on the split key
pub fn bind_many<'a, T: Any>(key: impl Into<String>, target: &'a mut Vec<T>) -> BindMany<'a, T> {
    BindMany {
        key: key.into(),
        target,
        modifiers: Modifiers::default(),
        slot: Slot::new(),
    }
}

modifiers!(BindMany);

impl<'a, T> BindMany<'a, T> {
    pub fn split_key(mut self, split_key: impl Into<String>) -> Self {
        self.modifiers.split_key = Some(split_key.into());
        self
    }
}

impl<'a, T: Any> Binding for BindMany<'a, T> {
    fn attach(&mut self, genv: &mut Genv) {
        self.modifiers
            .apply(genv.var(self.key.as_str()))
            .values_into(&self.slot);
    }

    fn commit(self: Box<Self>) {
        let Self { target, slot, .. } = *self;
        if slot.is_assigned() {
            *target = slot.take();
        }
    }
}

impl<'a, T: Any> From<BindMany<'a, T>> for Box<dyn Binding + 'a> {
    fn from(bind: BindMany<'a, T>) -> Self {
        Box::new(bind)
    }
}

/// Attach `bindings` to `genv`, parse, and write back every produced value
///
/// Variables already queued on `genv` are parsed first. Targets whose
/// variable was parsed before a failure keep their new value.
pub fn parse<'a>(genv: &mut Genv, mut bindings: Vec<Box<dyn Binding + 'a>>) -> Result<(), Error> {
    for binding in &mut bindings {
        binding.attach(genv);
    }

    let result = genv.parse();
    for binding in bindings {
        binding.commit();
    }
    result
}
