//! 日志模块
//!
//! 应用代码通过按名称获取的 [`Logger`] 打日志，实际输出由运行时配置的后端决定。
//!
//! # 特性
//!
//! - 按点分名称组织的层级：级别、过滤器、位置记录和后端沿最近的已配置祖先继承
//! - 配置节点只在第一次写配置时创建，logger 句柄在层级变化后自动指向新的节点
//! - 每个线程复用一个日志记录，同一线程重入时退化为新分配
//! - 过滤链（ACCEPT / NEUTRAL / DENY）、marker、可插拔的 formatter 与 appender
//! - 后端错误和 panic 被捕获并报告，从不传播到调用方
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use logfacade::log::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = LoggerRegistryConfig::from_json(r#"
//!         {
//!             root: {
//!                 level: "info",
//!                 backends: [{
//!                     formatter: { type: "TextFormatter", options: { colored: false } },
//!                     appender: { type: "ConsoleAppender", options: { target: "stdout" } },
//!                 }],
//!             },
//!             loggers: {
//!                 "app.db": { level: "debug", include_location: true },
//!             },
//!         }
//!     "#)?;
//!
//!     let registry = LoggerRegistry::from_config(&config)?;
//!     let logger = registry.get("app.db.pool");
//!
//!     logger.info("Application started");
//!     logfacade::debug!(logger, "pool size: {}", 16);
//!
//!     Ok(())
//! }
//! ```

pub mod appender;
pub mod backend;
pub mod bridge;
pub mod error;
pub mod filter;
pub mod formatter;
pub mod global;
pub mod hierarchy;
pub mod level;
pub mod logger;
pub mod macros;
pub mod marker;
pub mod record;
pub mod registry;

// 重新导出核心类型
pub use backend::{Backend, BackendConfig, ErrorSink, FormattingBackend, TracingErrorSink};
pub use bridge::Bridge;
pub use error::{validate_logger_name, LogError};
pub use hierarchy::{parent_name, HierarchyIndex};
pub use level::LogLevel;
pub use logger::Logger;
pub use marker::{marker, markers, Marker, MarkerFactory};
pub use record::{
    LogRecord, MetadataValue, PooledRecord, RecordPool, Thrown, DEFAULT_MAX_MESSAGE_CAPACITY,
    DEFAULT_MESSAGE_CAPACITY,
};
pub use registry::{LoggerNodeConfig, LoggerRegistry, LoggerRegistryConfig};

// 重新导出可插拔组件
pub use appender::{
    register_appenders, ConsoleAppender, ConsoleAppenderConfig, ConsoleTarget, FileAppender,
    FileAppenderConfig, LogAppender,
};
pub use filter::{
    register_filters, AlwaysNeutralFilter, CompoundFilter, CompoundFilterConfig, FilterResult,
    LevelFilter, LevelFilterConfig, LoggerFilter, MarkerFilter, MarkerFilterBuilder,
    MarkerFilterConfig,
};
pub use formatter::{
    register_formatters, JsonFormatter, JsonFormatterConfig, LogFormatter, TextFormatter,
    TextFormatterConfig,
};
