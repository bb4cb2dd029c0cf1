use crate::log::formatter::LogFormatter;
use crate::log::level::LogLevel;
use crate::log::record::LogRecord;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use smart_default::SmartDefault;
use std::fmt::Write;

/// TextFormatter 配置
#[derive(Debug, Clone, Deserialize, SmartDefault)]
#[serde(default)]
pub struct TextFormatterConfig {
    /// 是否启用颜色输出
    #[default = false]
    pub colored: bool,

    /// 时间戳格式（chrono 格式串，UTC）
    #[default = "%Y-%m-%dT%H:%M:%S%.3fZ"]
    pub time_format: String,

    /// 是否输出线程名
    #[default = true]
    pub show_thread: bool,
}

/// 文本格式化器
///
/// 格式：`[时间] [线程] 级别 [logger] {marker} [文件:行] 消息 | 参数 | thrown=异常`
pub struct TextFormatter {
    config: TextFormatterConfig,
}

impl TextFormatter {
    pub fn new(config: TextFormatterConfig) -> Self {
        Self { config }
    }

    fn dimmed(&self, buffer: &mut String, f: impl FnOnce(&mut String)) {
        if self.config.colored {
            buffer.push_str("\x1b[2m");
        }
        f(buffer);
        if self.config.colored {
            buffer.push_str("\x1b[0m");
        }
    }
}

impl LogFormatter for TextFormatter {
    fn format(&self, record: &LogRecord) -> Result<String> {
        let mut result = String::with_capacity(64 + record.logger_name().len() + record.message().len());

        let timestamp: DateTime<Utc> = record.timestamp().into();
        result.push('[');
        self.dimmed(&mut result, |buf| {
            let _ = write!(buf, "{}", timestamp.format(&self.config.time_format));
        });
        result.push_str("] ");

        if self.config.show_thread {
            result.push('[');
            self.dimmed(&mut result, |buf| buf.push_str(record.thread_name()));
            result.push_str("] ");
        }

        if self.config.colored {
            write!(result, "{:<5} ", colored_level(record.level()))?;
        } else {
            write!(result, "{:<5} ", record.level())?;
        }

        if !record.logger_name().is_empty() {
            result.push('[');
            result.push_str(record.logger_name());
            result.push_str("] ");
        }

        if let Some(marker) = record.marker() {
            write!(result, "{{{}}} ", marker)?;
        }

        if let Some(location) = record.location() {
            result.push('[');
            self.dimmed(&mut result, |buf| {
                let _ = write!(buf, "{}:{}", location.file(), location.line());
            });
            result.push_str("] ");
        }

        if self.config.colored {
            result.push_str("\x1b[97m");
        }
        result.push_str(record.message());
        if self.config.colored {
            result.push_str("\x1b[0m");
        }

        if !record.parameters().is_empty() {
            result.push_str(" |");
            for (i, value) in record.parameters().iter().enumerate() {
                result.push_str(if i == 0 { " " } else { ", " });
                if self.config.colored {
                    result.push_str("\x1b[36m");
                }
                write!(result, "{}", value)?;
                if self.config.colored {
                    result.push_str("\x1b[0m");
                }
            }
        }

        if let Some(thrown) = record.thrown() {
            write!(result, " | thrown={}", thrown)?;
        }

        Ok(result)
    }
}

/// 带颜色的日志级别字符串
fn colored_level(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Critical => "\u{1b}[35;1mCRITICAL\u{1b}[0m",
        LogLevel::Error => "\u{1b}[31mERROR\u{1b}[0m",
        LogLevel::Warn => "\u{1b}[33mWARN \u{1b}[0m",
        LogLevel::Info => "\u{1b}[32mINFO \u{1b}[0m",
        LogLevel::Debug => "\u{1b}[36mDEBUG\u{1b}[0m",
        LogLevel::Trace => "\u{1b}[37;2mTRACE\u{1b}[0m",
        LogLevel::All => "\u{1b}[37;2mALL  \u{1b}[0m",
        LogLevel::None => "\u{1b}[37;2mNONE \u{1b}[0m",
    }
}

crate::impl_from!(TextFormatterConfig => TextFormatter);
crate::impl_box_from!(TextFormatter => dyn LogFormatter);
