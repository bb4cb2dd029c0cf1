use serde::Deserialize;

use crate::log::level::LogLevel;
use crate::log::marker::Marker;
use crate::log::record::Thrown;

/// 过滤结果
///
/// `Accept` 与 `Deny` 在过滤链中是终结性的，`Neutral` 交给下一个过滤器或调用方的默认行为
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterResult {
    #[serde(alias = "ACCEPT")]
    Accept,
    #[serde(alias = "DENY")]
    Deny,
    #[serde(alias = "NEUTRAL")]
    Neutral,
}

impl FilterResult {
    /// 只有 `Deny` 会阻止日志输出
    #[inline]
    pub fn should_proceed(self) -> bool {
        self != FilterResult::Deny
    }

    /// 将 `Neutral` 视为 `Accept`
    #[inline]
    pub fn accept_if_neutral(self) -> FilterResult {
        match self {
            FilterResult::Neutral => FilterResult::Accept,
            other => other,
        }
    }
}

/// 日志过滤器 trait
///
/// 在级别检查通过之后调用，可以基于 logger 名称、级别、marker 和异常做进一步判断
pub trait LoggerFilter: Send + Sync {
    fn is_loggable(
        &self,
        logger_name: &str,
        level: LogLevel,
        marker: Option<&Marker>,
        thrown: Option<&Thrown>,
    ) -> FilterResult;
}

/// 总是返回 `Neutral` 的过滤器，节点的默认过滤器
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysNeutralFilter;

/// AlwaysNeutralFilter 配置（无参数）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlwaysNeutralFilterConfig {}

impl AlwaysNeutralFilter {
    pub fn new(_: AlwaysNeutralFilterConfig) -> Self {
        AlwaysNeutralFilter
    }
}

impl LoggerFilter for AlwaysNeutralFilter {
    fn is_loggable(&self, _: &str, _: LogLevel, _: Option<&Marker>, _: Option<&Thrown>) -> FilterResult {
        FilterResult::Neutral
    }
}

crate::impl_from!(AlwaysNeutralFilterConfig => AlwaysNeutralFilter);
crate::impl_box_from!(AlwaysNeutralFilter => dyn LoggerFilter);
