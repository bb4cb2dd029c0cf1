use serde::Deserialize;
use smart_default::SmartDefault;

use crate::log::filter::{FilterResult, LoggerFilter};
use crate::log::level::LogLevel;
use crate::log::marker::Marker;
use crate::log::record::Thrown;

/// LevelFilter 配置
#[derive(Debug, Clone, Deserialize, SmartDefault)]
#[serde(default)]
pub struct LevelFilterConfig {
    /// 阈值
    #[default(LogLevel::All)]
    pub level: LogLevel,

    #[default(FilterResult::Neutral)]
    pub when_matched: FilterResult,

    #[default(FilterResult::Deny)]
    pub when_differ: FilterResult,
}

/// 基于级别阈值的过滤器，日志级别不低于阈值视为匹配
pub struct LevelFilter {
    config: LevelFilterConfig,
}

impl LevelFilter {
    pub fn new(config: LevelFilterConfig) -> Self {
        Self { config }
    }

    pub fn at_least(level: LogLevel) -> Self {
        Self::new(LevelFilterConfig {
            level,
            ..Default::default()
        })
    }
}

impl LoggerFilter for LevelFilter {
    fn is_loggable(&self, _: &str, level: LogLevel, _: Option<&Marker>, _: Option<&Thrown>) -> FilterResult {
        if level.is_at_least(self.config.level) {
            self.config.when_matched
        } else {
            self.config.when_differ
        }
    }
}

crate::impl_from!(LevelFilterConfig => LevelFilter);
crate::impl_box_from!(LevelFilter => dyn LoggerFilter);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_filter() {
        let filter = LevelFilter::at_least(LogLevel::Warn);
        assert_eq!(filter.is_loggable("a", LogLevel::Error, None, None), FilterResult::Neutral);
        assert_eq!(filter.is_loggable("a", LogLevel::Warn, None, None), FilterResult::Neutral);
        assert_eq!(filter.is_loggable("a", LogLevel::Info, None, None), FilterResult::Deny);
    }

    #[test]
    fn test_level_filter_config() {
        let config: LevelFilterConfig =
            json5::from_str(r#"{ level: "error", when_matched: "accept", when_differ: "neutral" }"#).unwrap();
        let filter = LevelFilter::new(config);
        assert_eq!(filter.is_loggable("a", LogLevel::Critical, None, None), FilterResult::Accept);
        assert_eq!(filter.is_loggable("a", LogLevel::Debug, None, None), FilterResult::Neutral);
    }
}
