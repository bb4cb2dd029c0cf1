//! 日志宏模块
//!
//! 先做级别检查，通过后才对参数求值并直接格式化到池化记录的缓冲区。
//! 调用位置通过 `#[track_caller]` 记录，只有节点开启了位置记录时才会填充
//!
//! # 示例
//!
//! ```ignore
//! use logfacade::{info, warn};
//!
//! let logger = logfacade::log::global::logger("app.http");
//!
//! info!(logger, "server started on port {}", 8080);
//! warn!(logger, "slow request: {}ms", elapsed);
//! ```

/// 以指定级别记录日志
///
/// ```ignore
/// log!(logger, LogLevel::Warn, "retry {} of {}", attempt, max);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        let logger = &$logger;
        let level: $crate::log::LogLevel = $level;
        if logger.is_loggable(level) {
            logger.log_fmt(level, ::std::format_args!($($arg)+));
        }
    }};
}

/// 记录 TRACE 级别日志
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::log::LogLevel::Trace, $($arg)+)
    };
}

/// 记录 DEBUG 级别日志
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::log::LogLevel::Debug, $($arg)+)
    };
}

/// 记录 INFO 级别日志
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::log::LogLevel::Info, $($arg)+)
    };
}

/// 记录 WARN 级别日志
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::log::LogLevel::Warn, $($arg)+)
    };
}

/// 记录 ERROR 级别日志
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::log::LogLevel::Error, $($arg)+)
    };
}

/// 记录 CRITICAL 级别日志
#[macro_export]
macro_rules! critical {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::log::LogLevel::Critical, $($arg)+)
    };
}
