use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;
use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::cfg::TypeOptions;
use crate::log::appender::{create_appender_from_options, LogAppender};
use crate::log::formatter::{create_formatter_from_options, LogFormatter};
use crate::log::level::LogLevel;
use crate::log::record::LogRecord;

/// 日志后端
///
/// 节点在级别检查和过滤通过后把记录交给后端。
/// `accept` 只在调用期间借用记录，需要保留数据时必须先 [`LogRecord::copy`]
pub trait Backend: Send + Sync {
    /// 后端名称，用于错误报告和按名称移除
    fn name(&self) -> &str;

    /// 后端自身的快速预过滤，节点的级别检查仍然先执行
    fn is_loggable(&self, _logger_name: &str, _level: LogLevel) -> bool {
        true
    }

    /// 处理一条记录
    fn accept(&self, record: &LogRecord) -> Result<()>;

    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// 后端错误报告接口
///
/// 后端的 `accept` 返回错误或 panic 时由节点调用，日志调用方不会感知这些错误
pub trait ErrorSink: Send + Sync {
    fn report(&self, node_name: &str, backend_name: &str, error: &anyhow::Error);
}

/// 通过 tracing 输出后端错误
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingErrorSink;

impl ErrorSink for TracingErrorSink {
    fn report(&self, node_name: &str, backend_name: &str, error: &anyhow::Error) {
        tracing::error!(node = node_name, backend = backend_name, error = %error, "log backend failed");
    }
}

/// 同一个 registry 下所有节点共享的错误出口
pub(crate) struct ErrorReporter {
    sink: ArcSwap<Box<dyn ErrorSink>>,
    failures: AtomicU64,
}

impl ErrorReporter {
    pub(crate) fn new(sink: Box<dyn ErrorSink>) -> Self {
        Self {
            sink: ArcSwap::from_pointee(sink),
            failures: AtomicU64::new(0),
        }
    }

    pub(crate) fn report(&self, node_name: &str, backend_name: &str, error: &anyhow::Error) {
        self.failures.fetch_add(1, Ordering::Relaxed);
        self.sink.load().report(node_name, backend_name, error);
    }

    pub(crate) fn set_sink(&self, sink: Box<dyn ErrorSink>) {
        self.sink.store(Arc::new(sink));
    }

    pub(crate) fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new(Box::new(TracingErrorSink))
    }
}

/// 把 panic 负载转换为错误
pub(crate) fn panic_to_error(payload: Box<dyn Any + Send>) -> anyhow::Error {
    let message = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    };
    anyhow!("backend panicked: {}", message)
}

/// FormattingBackend 配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SmartDefault)]
#[serde(default)]
pub struct BackendConfig {
    /// 后端名称，缺省时使用 appender 的类型名
    pub name: Option<String>,

    /// 后端自身的最低级别
    #[default(LogLevel::All)]
    pub level: LogLevel,

    /// Formatter 配置
    #[default(TypeOptions::of("TextFormatter"))]
    pub formatter: TypeOptions,

    /// Appender 配置
    #[default(TypeOptions::of("ConsoleAppender"))]
    pub appender: TypeOptions,
}

/// 由 formatter 和 appender 组合而成的后端
pub struct FormattingBackend {
    name: String,
    level: LogLevel,
    formatter: Box<dyn LogFormatter>,
    appender: Box<dyn LogAppender>,
}

impl FormattingBackend {
    /// 从配置创建，formatter 与 appender 通过已注册的类型名构造
    pub fn new(config: BackendConfig) -> Result<Self> {
        let formatter = create_formatter_from_options(&config.formatter)?;
        let appender = create_appender_from_options(&config.appender)?;
        let name = config
            .name
            .unwrap_or_else(|| config.appender.type_name.clone());

        Ok(Self {
            name,
            level: config.level,
            formatter,
            appender,
        })
    }

    pub fn from_parts(
        name: impl Into<String>,
        formatter: Box<dyn LogFormatter>,
        appender: Box<dyn LogAppender>,
    ) -> Self {
        Self {
            name: name.into(),
            level: LogLevel::All,
            formatter,
            appender,
        }
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }
}

impl Backend for FormattingBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_loggable(&self, _logger_name: &str, level: LogLevel) -> bool {
        self.level.admits(level)
    }

    fn accept(&self, record: &LogRecord) -> Result<()> {
        let formatted = self.formatter.format(record)?;
        self.appender.append(&formatted)
    }

    fn flush(&self) -> Result<()> {
        self.appender.flush()
    }
}

crate::impl_from!(BackendConfig => FormattingBackend, try);

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// 保存收到的记录副本
    #[derive(Default)]
    pub(crate) struct CapturingBackend {
        pub(crate) records: Mutex<Vec<LogRecord>>,
    }

    impl CapturingBackend {
        pub(crate) fn messages(&self) -> Vec<String> {
            self.records
                .lock()
                .unwrap()
                .iter()
                .map(|r| r.message().to_string())
                .collect()
        }

        pub(crate) fn len(&self) -> usize {
            self.records.lock().unwrap().len()
        }
    }

    impl Backend for CapturingBackend {
        fn name(&self) -> &str {
            "capturing"
        }

        fn accept(&self, record: &LogRecord) -> Result<()> {
            self.records.lock().unwrap().push(record.copy());
            Ok(())
        }
    }

    /// 总是失败或 panic 的后端
    pub(crate) struct FailingBackend {
        pub(crate) panic: bool,
    }

    impl Backend for FailingBackend {
        fn name(&self) -> &str {
            "failing"
        }

        fn accept(&self, _record: &LogRecord) -> Result<()> {
            if self.panic {
                panic!("backend exploded");
            }
            Err(anyhow!("disk full"))
        }
    }

    /// 记录收到的错误报告
    #[derive(Default)]
    pub(crate) struct CollectingSink {
        pub(crate) reports: Arc<Mutex<Vec<(String, String, String)>>>,
    }

    impl ErrorSink for CollectingSink {
        fn report(&self, node_name: &str, backend_name: &str, error: &anyhow::Error) {
            self.reports.lock().unwrap().push((
                node_name.to_string(),
                backend_name.to_string(),
                error.to_string(),
            ));
        }
    }
}
