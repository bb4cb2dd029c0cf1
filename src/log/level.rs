use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

use crate::log::error::LogError;

/// 日志级别
///
/// 按严重程度全序排列，`All` 与 `None` 为哨兵值：
/// 阈值为 `All` 时记录一切，阈值为 `None` 时不记录任何日志
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum LogLevel {
    /// 记录一切
    All = 0,
    /// 最详细的日志
    Trace = 1,
    /// 调试信息
    Debug = 2,
    /// 一般信息
    Info = 3,
    /// 警告信息
    Warn = 4,
    /// 错误信息
    Error = 5,
    /// 严重错误
    Critical = 6,
    /// 不记录
    None = 7,
}

impl LogLevel {
    /// 所有级别，按严重程度升序
    pub const VALUES: [LogLevel; 8] = [
        LogLevel::All,
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Critical,
        LogLevel::None,
    ];

    /// 当前级别是否不低于 `threshold`
    #[inline]
    pub fn is_at_least(self, threshold: LogLevel) -> bool {
        self >= threshold
    }

    /// 阈值为 `self` 时，级别为 `level` 的日志是否可以输出
    ///
    /// `None` 阈值拒绝一切（包括 `None` 级别本身），`None` 级别的日志也永远不会输出
    #[inline]
    pub fn admits(self, level: LogLevel) -> bool {
        self != LogLevel::None && level != LogLevel::None && level.is_at_least(self)
    }

    pub(crate) fn as_u8(self) -> u8 {
        self as u8
    }

    pub(crate) fn from_u8(value: u8) -> Option<LogLevel> {
        LogLevel::VALUES.get(value as usize).copied()
    }

    /// 大写名称
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::All => "ALL",
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
            LogLevel::None => "NONE",
        }
    }
}

impl FromStr for LogLevel {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(LogLevel::All),
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "critical" | "fatal" | "wtf" => Ok(LogLevel::Critical),
            "none" | "off" => Ok(LogLevel::None),
            _ => Err(LogError::InvalidLevel(s.to_string())),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // 使用 pad 以支持 `{:<5}` 之类的对齐
        f.pad(self.as_str())
    }
}

impl Serialize for LogLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_from_str() {
        assert_eq!(LogLevel::from_str("trace").unwrap(), LogLevel::Trace);
        assert_eq!(LogLevel::from_str("DEBUG").unwrap(), LogLevel::Debug);
        assert_eq!(LogLevel::from_str("Info").unwrap(), LogLevel::Info);
        assert_eq!(LogLevel::from_str("WARN").unwrap(), LogLevel::Warn);
        assert_eq!(LogLevel::from_str("error").unwrap(), LogLevel::Error);
        assert_eq!(LogLevel::from_str("critical").unwrap(), LogLevel::Critical);
        assert_eq!(LogLevel::from_str("wtf").unwrap(), LogLevel::Critical);
        assert_eq!(LogLevel::from_str("off").unwrap(), LogLevel::None);
        assert_eq!(LogLevel::from_str("ALL").unwrap(), LogLevel::All);
    }

    #[test]
    fn test_log_level_from_str_invalid() {
        let err = LogLevel::from_str("verbose").unwrap_err();
        assert!(matches!(err, LogError::InvalidLevel(ref s) if s == "verbose"));
    }

    #[test]
    fn test_log_level_display() {
        assert_eq!(LogLevel::Trace.to_string(), "TRACE");
        assert_eq!(LogLevel::Critical.to_string(), "CRITICAL");
        assert_eq!(format!("{:<5}|", LogLevel::Info), "INFO |");
    }

    #[test]
    fn test_log_level_total_order() {
        for pair in LogLevel::VALUES.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        // 传递性
        for a in LogLevel::VALUES {
            for b in LogLevel::VALUES {
                for c in LogLevel::VALUES {
                    if a <= b && b <= c {
                        assert!(a <= c);
                    }
                }
            }
        }
    }

    #[test]
    fn test_admits_sentinels() {
        for level in LogLevel::VALUES {
            assert!(!LogLevel::None.admits(level));
            if level != LogLevel::None {
                assert!(LogLevel::All.admits(level));
            }
        }
        assert!(LogLevel::Warn.admits(LogLevel::Error));
        assert!(LogLevel::Warn.admits(LogLevel::Warn));
        assert!(!LogLevel::Warn.admits(LogLevel::Info));
    }

    #[test]
    fn test_u8_round_trip() {
        for level in LogLevel::VALUES {
            assert_eq!(LogLevel::from_u8(level.as_u8()), Some(level));
        }
        assert_eq!(LogLevel::from_u8(42), None);
    }

    #[test]
    fn test_serde() {
        let json = serde_json::to_string(&LogLevel::Warn).unwrap();
        assert_eq!(json, "\"WARN\"");
        let level: LogLevel = serde_json::from_str("\"debug\"").unwrap();
        assert_eq!(level, LogLevel::Debug);
        assert!(serde_json::from_str::<LogLevel>("\"loud\"").is_err());
    }
}
