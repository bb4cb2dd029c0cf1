//! logfacade - 分层命名的日志门面
//!
//! 应用代码按点分名称获取 logger 打日志，级别、过滤器、位置记录和输出后端在运行时配置，
//! 并沿名称层级继承。
//!
//! ## 模块
//!
//! - **cfg**: 组件配置（`TypeOptions` + 类型注册表）
//! - **log**: 日志门面、配置层级、记录池与可插拔的 formatter / appender / filter
//!
//! ## 设计理念
//!
//! - 🌲 **层级继承**: 未配置的名称沿最近的已配置祖先解析
//! - 🚀 **热路径无锁**: 级别检查与节点读取只做原子加载
//! - ♻️ **记录复用**: 每个线程复用一个日志记录，重入时退化为新分配
//! - 🛡️ **故障隔离**: 后端错误与 panic 被捕获并报告，不影响调用方

pub mod cfg;
pub mod log;

// 重新导出主要的公共 API
pub use cfg::{create_trait_from_type_options, register_trait, register_trait_try, TypeOptions};

pub use log::{
    Backend, BackendConfig, FilterResult, LogAppender, LogError, LogFormatter, LogLevel, LogRecord,
    Logger, LoggerFilter, LoggerRegistry, LoggerRegistryConfig, Marker, MetadataValue, RecordPool,
    Thrown,
};
