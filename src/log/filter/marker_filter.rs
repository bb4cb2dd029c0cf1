use anyhow::Result;
use serde::Deserialize;
use smart_default::SmartDefault;

use crate::log::error::LogError;
use crate::log::filter::{FilterResult, LoggerFilter};
use crate::log::level::LogLevel;
use crate::log::marker::{self, Marker};
use crate::log::record::Thrown;

/// MarkerFilter 配置
#[derive(Debug, Clone, Deserialize, SmartDefault)]
#[serde(default)]
pub struct MarkerFilterConfig {
    /// marker 名称（从全局 marker 工厂获取），必填
    pub marker: Option<String>,

    /// 匹配时的结果
    #[default(FilterResult::Neutral)]
    pub when_matched: FilterResult,

    /// 不匹配时的结果
    #[default(FilterResult::Deny)]
    pub when_differ: FilterResult,
}

/// 基于 marker 的过滤器
///
/// 当日志携带的 marker 被过滤器的 marker 引用（或就是它）时视为匹配，
/// 未携带 marker 视为不匹配
pub struct MarkerFilter {
    marker: Marker,
    when_matched: FilterResult,
    when_differ: FilterResult,
}

impl MarkerFilter {
    pub fn new(config: MarkerFilterConfig) -> Result<Self> {
        let mut builder = MarkerFilter::builder()
            .when_matched(config.when_matched)
            .when_differ(config.when_differ);
        if let Some(name) = config.marker {
            builder = builder.marker(marker::marker(&name));
        }
        Ok(builder.build()?)
    }

    pub fn builder() -> MarkerFilterBuilder {
        MarkerFilterBuilder::default()
    }

    pub fn marker(&self) -> &Marker {
        &self.marker
    }
}

impl LoggerFilter for MarkerFilter {
    fn is_loggable(&self, _: &str, _: LogLevel, marker: Option<&Marker>, _: Option<&Thrown>) -> FilterResult {
        let matched = marker.is_some_and(|m| self.marker.is_or_contains(m));
        if matched {
            self.when_matched
        } else {
            self.when_differ
        }
    }
}

/// MarkerFilter 构建器
#[derive(SmartDefault)]
pub struct MarkerFilterBuilder {
    marker: Option<Marker>,
    #[default(FilterResult::Neutral)]
    when_matched: FilterResult,
    #[default(FilterResult::Deny)]
    when_differ: FilterResult,
}

impl MarkerFilterBuilder {
    pub fn marker(mut self, marker: Marker) -> Self {
        self.marker = Some(marker);
        self
    }

    pub fn when_matched(mut self, result: FilterResult) -> Self {
        self.when_matched = result;
        self
    }

    pub fn when_differ(mut self, result: FilterResult) -> Self {
        self.when_differ = result;
        self
    }

    pub fn build(self) -> Result<MarkerFilter, LogError> {
        Ok(MarkerFilter {
            marker: self.marker.ok_or(LogError::MissingMarker)?,
            when_matched: self.when_matched,
            when_differ: self.when_differ,
        })
    }
}

crate::impl_from!(MarkerFilterConfig => MarkerFilter, try);
crate::impl_box_from!(MarkerFilter => dyn LoggerFilter);
