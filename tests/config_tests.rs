//! 配置驱动的 registry：配置格式、文件输出、全局 registry

mod common;

use common::CapturingBackend;
use logfacade::log::{global, LogError, LogLevel, LoggerRegistry, LoggerRegistryConfig};
use serial_test::serial;
use std::sync::Arc;
use tempfile::TempDir;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("logfacade=debug")
        .with_test_writer()
        .try_init();
}

#[test]
fn test_file_backend_from_json_config() -> anyhow::Result<()> {
    init_tracing();
    let dir = TempDir::new()?;
    let path = dir.path().join("logs").join("app.log");

    let config = LoggerRegistryConfig::from_json(&format!(
        r#"
        {{
            root: {{ level: "warn" }},
            loggers: {{
                "app": {{
                    level: "info",
                    backends: [{{
                        name: "file",
                        formatter: {{ type: "JsonFormatter" }},
                        appender: {{ type: "FileAppender", options: {{ file_path: "{}" }} }},
                    }}],
                }},
            }},
        }}
        "#,
        path.display()
    ))?;
    let registry = LoggerRegistry::from_config(&config)?;

    let logger = registry.get("app.http");
    logger.info("request served");
    logger.debug("not written");
    logfacade::warn!(logger, "slow request: {}ms", 1200);
    registry.flush();

    let content = std::fs::read_to_string(&path)?;
    let lines: Vec<serde_json::Value> = content
        .lines()
        .map(serde_json::from_str)
        .collect::<Result<_, _>>()?;
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["message"], "request served");
    assert_eq!(lines[0]["logger"], "app.http");
    assert_eq!(lines[1]["message"], "slow request: 1200ms");
    assert!(lines[0]["sequence"].as_u64().unwrap() < lines[1]["sequence"].as_u64().unwrap());
    Ok(())
}

#[test]
fn test_yaml_config_with_filters() -> anyhow::Result<()> {
    let config = LoggerRegistryConfig::from_yaml(
        r#"
root:
  level: info
loggers:
  audit:
    level: trace
    include_location: true
    filter:
      type: CompoundFilter
      options:
        filters:
          - type: LevelFilter
            options: { level: debug, when_matched: neutral, when_differ: deny }
          - type: MarkerFilter
            options: { marker: CONFIG_TEST_AUDIT, when_matched: accept, when_differ: deny }
  noisy.lib:
    level: error
    log_to_parent: false
"#,
    )?;
    let registry = LoggerRegistry::from_config(&config)?;
    let capture = Arc::new(CapturingBackend::default());
    registry.add_backend("", capture.clone())?;

    let audit = registry.get("audit.login");
    let marker = logfacade::log::marker("CONFIG_TEST_AUDIT");
    audit.log_marker(LogLevel::Info, &marker, "accepted");
    audit.log_marker(LogLevel::Trace, &marker, "below filter level");
    audit.info("without marker");

    registry.get("noisy.lib.io").error("kept local");

    let records = capture.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].message(), "accepted");
    assert!(records[0].location().is_some());

    assert_eq!(registry.level("noisy.lib"), Some(LogLevel::Error));
    assert!(!registry.resolve("noisy.lib.io").log_to_parent());
    Ok(())
}

#[test]
fn test_toml_config() -> anyhow::Result<()> {
    let config = LoggerRegistryConfig::from_toml(
        r#"
max_message_capacity = 4096

[root]
level = "ERROR"

[loggers."svc.db"]
level = "debug"
"#,
    )?;
    assert_eq!(config.max_message_capacity, Some(4096));

    let registry = LoggerRegistry::from_config(&config)?;
    assert_eq!(registry.effective_level("svc.db.pool"), LogLevel::Debug);
    assert_eq!(registry.effective_level("svc.http"), LogLevel::Error);
    Ok(())
}

#[test]
fn test_apply_is_idempotent() -> anyhow::Result<()> {
    let config = LoggerRegistryConfig::from_json(
        r#"{
            root: { level: "info" },
            loggers: {
                "a": { level: "warn" },
                "a.b.c": { level: "trace", include_location: true },
            },
        }"#,
    )?;
    let registry = LoggerRegistry::from_config(&config)?;
    let logger = registry.get("a.b.c.d");

    let snapshot = |registry: &LoggerRegistry| {
        registry
            .node_names()
            .into_iter()
            .map(|name| {
                let node = registry.resolve(&name);
                (name, node.level(), node.include_location(), node.backends().len())
            })
            .collect::<Vec<_>>()
    };

    let first = snapshot(&registry);
    registry.apply(&config)?;
    assert_eq!(snapshot(&registry), first);
    assert_eq!(logger.effective_level(), LogLevel::Trace);
    assert!(logger.include_location());
    Ok(())
}

#[test]
fn test_config_errors() {
    let bad_name = LoggerRegistryConfig::from_json(r#"{ loggers: { "a..b": { level: "info" } } }"#).unwrap();
    assert!(matches!(
        LoggerRegistry::from_config(&bad_name),
        Err(LogError::InvalidLoggerName { .. })
    ));

    let missing_marker = LoggerRegistryConfig::from_json(
        r#"{ root: { filter: { type: "MarkerFilter" } } }"#,
    )
    .unwrap();
    assert!(matches!(
        LoggerRegistry::from_config(&missing_marker),
        Err(LogError::MissingMarker)
    ));

    assert!(LoggerRegistryConfig::from_json(r#"{ root: { level: "loud" } }"#).is_err());
}

#[test]
#[serial]
fn test_global_registry() -> anyhow::Result<()> {
    global::reset();
    let logger = global::logger("global.test");
    assert_eq!(logger.effective_level(), LogLevel::Info);

    let config = LoggerRegistryConfig::from_json(r#"{ root: { level: "error" } }"#)?;
    global::init(&config)?;
    assert_eq!(logger.effective_level(), LogLevel::Error);

    let capture = Arc::new(CapturingBackend::default());
    global::registry().add_backend("global", capture.clone())?;
    logger.warn("filtered");
    logger.error("captured");
    assert_eq!(capture.messages(), vec!["captured"]);

    global::reset();
    assert_eq!(logger.effective_level(), LogLevel::Info);
    assert!(global::registry().node_names().is_empty());
    Ok(())
}
