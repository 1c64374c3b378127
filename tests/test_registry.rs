use genv::{Error, Genv, ParserRegistry, bind};
use serial_test::serial;
use std::env;
use std::sync::Arc;

#[derive(Debug, Default, Clone, Copy, PartialEq)]
enum LogLevel {
    #[default]
    Info,
    Debug,
    Warn,
}

fn parse_level(s: &str) -> Result<LogLevel, String> {
    match s {
        "info" => Ok(LogLevel::Info),
        "debug" => Ok(LogLevel::Debug),
        "warn" => Ok(LogLevel::Warn),
        other => Err(format!("unknown log level '{}'", other)),
    }
}

fn shared_registry() -> Arc<ParserRegistry> {
    Arc::new(ParserRegistry::with_defaults().with_parser(parse_level))
}

#[test]
#[serial]
fn test_custom_parser_shared_between_instances() {
    env::set_var("REGISTRY_TEST_LEVEL", "debug");
    env::set_var("REGISTRY_TEST_LEVELS", "warn,info");
    let registry = shared_registry();

    let mut first = Genv::builder().registry(registry.clone()).build();
    let level = first.var("REGISTRY_TEST_LEVEL").value::<LogLevel>();
    first.parse().unwrap();

    let mut second = Genv::builder().registry(registry).build();
    let levels = second.var("REGISTRY_TEST_LEVELS").values::<LogLevel>();
    second.parse().unwrap();

    assert_eq!(level.get(), LogLevel::Debug);
    assert_eq!(levels.get(), vec![LogLevel::Warn, LogLevel::Info]);

    env::remove_var("REGISTRY_TEST_LEVEL");
    env::remove_var("REGISTRY_TEST_LEVELS");
}

#[test]
#[serial]
fn test_custom_parser_error_is_wrapped() {
    env::set_var("REGISTRY_TEST_BAD_LEVEL", "verbose");
    colored::control::set_override(false);

    let mut level = LogLevel::Info;
    let mut genv = Genv::builder().registry(shared_registry()).build();
    let err = genv::parse(&mut genv, vec![bind("REGISTRY_TEST_BAD_LEVEL", &mut level).into()])
        .unwrap_err();

    match &err {
        Error::Parse { key, value, .. } => {
            assert_eq!(key, "REGISTRY_TEST_BAD_LEVEL");
            assert_eq!(value, "verbose");
        }
        other => panic!("Expected Parse error, got {:?}", other),
    }
    let cause = std::error::Error::source(&err).unwrap().to_string();
    assert!(cause.contains("unknown log level 'verbose'"));
    assert_eq!(level, LogLevel::Info);

    env::remove_var("REGISTRY_TEST_BAD_LEVEL");
}

#[test]
#[serial]
fn test_default_instance_does_not_see_custom_parser() {
    env::set_var("REGISTRY_TEST_ISOLATED", "warn");

    let mut genv = Genv::new();
    let _level = genv.var("REGISTRY_TEST_ISOLATED").value::<LogLevel>();
    let err = genv.parse().unwrap_err();

    assert!(matches!(err, Error::NoParser { ref key, .. } if key == "REGISTRY_TEST_ISOLATED"));
    env::remove_var("REGISTRY_TEST_ISOLATED");
}
