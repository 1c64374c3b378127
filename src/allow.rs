//! Policies deciding whether a configured default may replace a missing value

use crate::{builder::Genv, error::Error};
use std::{fmt, sync::Arc};

/// Environment variable consulted by [`AllowDefault::from_env`]
pub const ALLOW_DEFAULT_KEY: &str = "GENV_ALLOW_DEFAULT";

type Predicate = dyn Fn(&Genv) -> Result<bool, Error> + Send + Sync;

/// Predicate deciding whether a fallback value may be used
///
/// The predicate receives the configuration instance the variable belongs
/// to, so it can itself read and parse other variables through
/// [`Genv::detached`].
#[derive(Clone)]
pub struct AllowDefault(Arc<Predicate>);

impl AllowDefault {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Genv) -> Result<bool, Error> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Defaults are always allowed
    pub fn always() -> Self {
        Self::new(|_| Ok(true))
    }

    /// Defaults are never allowed
    pub fn never() -> Self {
        Self::new(|_| Ok(false))
    }

    /// Fixed answer
    pub fn from_bool(allowed: bool) -> Self {
        Self::new(move |_| Ok(allowed))
    }

    /// Read [`ALLOW_DEFAULT_KEY`] as a boolean, treating absence as `false`
    pub fn from_env() -> Self {
        Self::from_env_key(ALLOW_DEFAULT_KEY)
    }

    /// Read `key` as a boolean, treating absence as `false`
    ///
    /// The switch is parsed on a detached copy of the instance so the
    /// caller's pending variables are untouched. The switch itself may always
    /// fall back to its own default, otherwise evaluating it would recurse.
    pub fn from_env_key(key: impl Into<String>) -> Self {
        let key = key.into();
        Self::new(move |genv| {
            let mut nested = genv.detached();
            let allowed = nested
                .var(&key)
                .optional()
                .default_with("false", AllowDefault::always())
                .value::<bool>();
            nested.parse()?;
            Ok(allowed.take())
        })
    }

    pub fn evaluate(&self, genv: &Genv) -> Result<bool, Error> {
        (self.0)(genv)
    }
}

impl Default for AllowDefault {
    fn default() -> Self {
        Self::from_env()
    }
}

impl fmt::Debug for AllowDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AllowDefault(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    #[test]
    fn test_always_and_never() {
        let genv = Genv::new();
        assert!(AllowDefault::always().evaluate(&genv).unwrap());
        assert!(!AllowDefault::never().evaluate(&genv).unwrap());
        assert!(AllowDefault::from_bool(true).evaluate(&genv).unwrap());
    }

    #[test]
    #[serial]
    fn test_from_env_absent_is_false() {
        env::remove_var(ALLOW_DEFAULT_KEY);
        let genv = Genv::new();
        assert!(!AllowDefault::from_env().evaluate(&genv).unwrap());
    }

    #[test]
    #[serial]
    fn test_from_env_reads_switch() {
        env::set_var(ALLOW_DEFAULT_KEY, "true");
        let genv = Genv::new();
        assert!(AllowDefault::from_env().evaluate(&genv).unwrap());

        env::set_var(ALLOW_DEFAULT_KEY, "0");
        assert!(!AllowDefault::from_env().evaluate(&genv).unwrap());
        env::remove_var(ALLOW_DEFAULT_KEY);
    }

    #[test]
    #[serial]
    fn test_from_env_invalid_switch_fails() {
        env::set_var(ALLOW_DEFAULT_KEY, "maybe");
        let genv = Genv::new();
        let err = AllowDefault::from_env().evaluate(&genv).unwrap_err();
        assert!(matches!(err, Error::Parse { ref key, .. } if key == ALLOW_DEFAULT_KEY));
        env::remove_var(ALLOW_DEFAULT_KEY);
    }

    #[test]
    #[serial]
    fn test_from_env_key_custom_switch() {
        env::set_var("ALLOW_DEFAULT_TEST_SWITCH", "T");
        let genv = Genv::new();
        let allow = AllowDefault::from_env_key("ALLOW_DEFAULT_TEST_SWITCH");
        assert!(allow.evaluate(&genv).unwrap());
        env::remove_var("ALLOW_DEFAULT_TEST_SWITCH");
    }

    #[test]
    #[serial]
    fn test_from_env_leaves_outer_queue_alone() {
        env::remove_var(ALLOW_DEFAULT_KEY);
        let mut genv = Genv::new();
        let _slot = genv.var("ALLOW_DEFAULT_TEST_OUTER").optional().value::<String>();
        assert_eq!(genv.pending(), 1);

        AllowDefault::from_env().evaluate(&genv).unwrap();
        assert_eq!(genv.pending(), 1);
    }
}
