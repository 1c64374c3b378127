use genv::{AllowDefault, Genv, Load, define_config};
use serial_test::serial;
use std::env;

define_config! {
    #[derive(Debug)]
    pub struct ServerConfig {
        #[field(env = "MACRO_TEST_HOST", doc = "Server host")]
        pub host: String,

        #[field(env = "MACRO_TEST_PORT", doc = "Server port", default = 8080u16)]
        pub port: u16,

        #[field(env = "MACRO_TEST_DEBUG", doc = "Enable debug mode", optional)]
        pub debug: bool,

        #[field(env = "MACRO_TEST_TAGS", doc = "Service tags", optional)]
        pub tags: Vec<String>,

        #[field(env = "MACRO_TEST_WEIGHTS", doc = "Backend weights", split = ";", default = "1;2;3")]
        pub weights: Vec<u32>,

        #[field(env = "MACRO_TEST_UPSTREAM", doc = "Upstream URL", optional)]
        pub upstream: Option<url::Url>,
    }
}

define_config! {
    #[allow(missing_docs)]
    pub struct ConfigWithoutDocs {
        #[field(env = "MACRO_TEST_NO_DOCS_NAME", default = "service")]
        pub name: String,
    }
}

define_config! {
    pub struct WorkerConfig {
        #[field(env = "MACRO_TEST_WORKER_QUEUE", doc = "Queue name")]
        pub queue: String,

        #[field(env = "MACRO_TEST_WORKER_THREADS", doc = "Worker threads", default = 4usize)]
        pub threads: usize,
    }
}

fn clear() {
    for key in [
        "MACRO_TEST_HOST",
        "MACRO_TEST_PORT",
        "MACRO_TEST_DEBUG",
        "MACRO_TEST_TAGS",
        "MACRO_TEST_WEIGHTS",
        "MACRO_TEST_UPSTREAM",
        "MACRO_TEST_NO_DOCS_NAME",
        "MACRO_TEST_WORKER_QUEUE",
        "MACRO_TEST_WORKER_THREADS",
        genv::ALLOW_DEFAULT_KEY,
    ] {
        env::remove_var(key);
    }
}

fn permissive() -> Genv {
    Genv::builder().allow_default(AllowDefault::always()).build()
}

#[test]
#[serial]
fn test_macro_defaults() {
    clear();
    env::set_var("MACRO_TEST_HOST", "localhost");

    let config = ServerConfig::load_from(&mut permissive()).unwrap();
    assert_eq!(config.host, "localhost");
    assert_eq!(config.port, 8080);
    assert!(!config.debug);
    assert!(config.tags.is_empty());
    assert_eq!(config.weights, vec![1, 2, 3]);
    assert_eq!(config.upstream, None);
    clear();
}

#[test]
#[serial]
fn test_macro_load_from_env() {
    clear();
    env::set_var("MACRO_TEST_HOST", "0.0.0.0");
    env::set_var("MACRO_TEST_PORT", "9090");
    env::set_var("MACRO_TEST_DEBUG", "true");
    env::set_var("MACRO_TEST_TAGS", "api,web,,production,");
    env::set_var("MACRO_TEST_WEIGHTS", "5;;7");
    env::set_var("MACRO_TEST_UPSTREAM", "http://backend:3000/");

    let config = ServerConfig::load_from(&mut Genv::new()).unwrap();
    assert_eq!(config.host, "0.0.0.0");
    assert_eq!(config.port, 9090);
    assert!(config.debug);
    assert_eq!(config.tags, vec!["api", "web", "production"]);
    assert_eq!(config.weights, vec![5, 7]);
    assert_eq!(config.upstream.unwrap().port(), Some(3000));
    clear();
}

#[test]
#[serial]
fn test_macro_missing_required() {
    clear();

    let err = ServerConfig::load_from(&mut permissive()).unwrap_err();
    assert_eq!(err.key(), "MACRO_TEST_HOST");
    assert!(err.is_missing());
}

#[test]
#[serial]
fn test_macro_defaults_need_permission() {
    clear();
    env::set_var("MACRO_TEST_HOST", "localhost");

    let mut genv = Genv::builder().allow_default(AllowDefault::never()).build();
    let err = ServerConfig::load_from(&mut genv).unwrap_err();
    assert_eq!(err.key(), "MACRO_TEST_PORT");
    clear();
}

#[test]
#[serial]
fn test_macro_wrong_type() {
    clear();
    env::set_var("MACRO_TEST_HOST", "localhost");
    env::set_var("MACRO_TEST_PORT", "eighty");

    let err = ServerConfig::load_from(&mut permissive()).unwrap_err();
    assert!(matches!(err, genv::Error::Parse { ref key, .. } if key == "MACRO_TEST_PORT"));
    clear();
}

#[test]
#[serial]
fn test_allow_missing_docs() {
    clear();

    let config = ConfigWithoutDocs::load_from(&mut permissive()).unwrap();
    assert_eq!(config.name, "service");
}

#[test]
#[serial]
fn test_load_without_dotenv_file() {
    clear();
    assert!(!std::path::Path::new(".env").exists());
    env::set_var("MACRO_TEST_WORKER_QUEUE", "jobs");
    env::set_var(genv::ALLOW_DEFAULT_KEY, "true");

    let config = WorkerConfig::load().unwrap();
    assert_eq!(config.queue, "jobs");
    assert_eq!(config.threads, 4);
    clear();
}
