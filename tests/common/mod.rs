//! 集成测试共用的后端与辅助函数

#![allow(dead_code)]

use logfacade::log::{Backend, LogLevel, LogRecord, LoggerRegistry};
use std::sync::{Arc, Mutex};

/// 保存收到的记录副本
#[derive(Default)]
pub struct CapturingBackend {
    name: String,
    records: Mutex<Vec<LogRecord>>,
}

impl CapturingBackend {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.message().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

impl Backend for CapturingBackend {
    fn name(&self) -> &str {
        if self.name.is_empty() {
            "capturing"
        } else {
            &self.name
        }
    }

    fn accept(&self, record: &LogRecord) -> anyhow::Result<()> {
        self.records.lock().unwrap().push(record.copy());
        Ok(())
    }
}

/// root 配置了捕获后端和级别的 registry
pub fn registry_with_root(level: LogLevel) -> (LoggerRegistry, Arc<CapturingBackend>) {
    let registry = LoggerRegistry::new();
    let capture = Arc::new(CapturingBackend::named("root"));
    registry.add_backend("", capture.clone()).unwrap();
    registry.set_level("", level).unwrap();
    (registry, capture)
}
