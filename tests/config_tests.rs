use std::io::Write;
use std::sync::Mutex;

use tempfile::NamedTempFile;
use webapi_router::config::{ServerConfig, DEFAULT_ADDR, DEFAULT_STACK_SIZE};
use webapi_router::logging::LogFormat;

// Tests in this file read and write process-wide environment variables.
static ENV_LOCK: Mutex<()> = Mutex::new(());

const ENV_VARS: &[&str] = &[
    "WEBAPI_ADDR",
    "WEBAPI_STACK_SIZE",
    "WEBAPI_LOG_LEVEL",
    "WEBAPI_LOG_FORMAT",
    "WEBAPI_LOG_ASYNC",
    "WEBAPI_LOG_FILTER",
    "WEBAPI_LOG_LOCATION",
];

fn clear_env() {
    for var in ENV_VARS {
        std::env::remove_var(var);
    }
}

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_without_file_uses_defaults() {
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();

    let config = ServerConfig::load(None).unwrap();
    assert_eq!(config.addr, DEFAULT_ADDR);
    assert_eq!(config.stack_size, DEFAULT_STACK_SIZE);
}

#[test]
fn test_load_from_file() {
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();

    let file = write_config(
        r#"
addr = "127.0.0.1:3002"
stack_size = "0x10000"

[log]
level = "debug"
format = "pretty"
async_logging = false
"#,
    );
    let config = ServerConfig::load(Some(file.path())).unwrap();
    assert_eq!(config.addr, "127.0.0.1:3002");
    assert_eq!(config.stack_size, 0x10000);

    let log = config.log_config();
    assert_eq!(log.log_level, "debug");
    assert_eq!(log.format, LogFormat::Pretty);
    assert!(!log.async_logging);
}

#[test]
fn test_env_overrides_file() {
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();

    let file = write_config(
        r#"
addr = "127.0.0.1:3002"

[log]
level = "debug"
"#,
    );
    std::env::set_var("WEBAPI_ADDR", "0.0.0.0:9000");
    std::env::set_var("WEBAPI_STACK_SIZE", "32768");
    std::env::set_var("WEBAPI_LOG_LEVEL", "warn");

    let config = ServerConfig::load(Some(file.path())).unwrap();
    let log = config.log_config();
    clear_env();

    assert_eq!(config.addr, "0.0.0.0:9000");
    assert_eq!(config.stack_size, 32768);
    assert_eq!(log.log_level, "warn");
}

#[test]
fn test_bad_env_stack_size_ignored() {
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();

    std::env::set_var("WEBAPI_STACK_SIZE", "huge");
    let config = ServerConfig::load(None).unwrap();
    clear_env();

    assert_eq!(config.stack_size, DEFAULT_STACK_SIZE);
}

#[test]
fn test_missing_or_invalid_file_is_error() {
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();

    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");
    let err = ServerConfig::load(Some(&missing)).unwrap_err();
    assert!(err.to_string().contains("absent.toml"));

    let file = write_config("addr = [1, 2]");
    assert!(ServerConfig::load(Some(file.path())).is_err());
}
