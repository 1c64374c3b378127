//! Typed environment variable parsing
//!
//! Declare variables on a [`Genv`], call [`Genv::parse`] once, and read the
//! typed results from the returned [`Slot`]s. Or describe the whole schema
//! with [`bind`], [`bind_opt`] or [`bind_many`] and hand it to [`parse`], or
//! generate it with [`define_config!`].
//!
//! Values are parsed through a [`ParserRegistry`]; register parsers for your
//! own types on a registry and share it with [`GenvBuilder::registry`].
//! Defaults are only used when the variable is absent and the active
//! [`AllowDefault`] policy permits it. Unless configured otherwise that policy
//! reads the boolean [`ALLOW_DEFAULT_KEY`] (`GENV_ALLOW_DEFAULT`).

pub mod allow;
pub mod bind;
pub mod builder;
pub mod environment;
pub mod error;
pub mod registry;
pub mod slot;
pub mod var;

pub use allow::{ALLOW_DEFAULT_KEY, AllowDefault};
pub use bind::{Bind, BindMany, BindOpt, Binding, bind, bind_many, bind_opt, parse};
pub use builder::{DEFAULT_SPLIT_KEY, Genv, GenvBuilder};
pub use environment::{ENVIRONMENT_KEY, Environment};
pub use error::{BoxError, Error};
pub use registry::{Parser, ParserRegistry, Timestamp};
pub use slot::Slot;
pub use var::{Descriptor, Fallback, Var};

// Re-export macro
pub use genv_macros::define_config;

/// Trait for loading a configuration struct from environment variables
pub trait Load: Sized {
    /// Declare and parse every field on `genv`
    fn load_from(genv: &mut Genv) -> Result<Self, Error>;

    /// Load `.env` if present, then parse with a fresh [`Genv`]
    fn load() -> Result<Self, Error> {
        let _ = dotenvy::dotenv();
        Self::load_from(&mut Genv::new())
    }
}
