use anyhow::Result;
use arc_swap::ArcSwap;
use serde::Deserialize;
use std::sync::Arc;

use crate::cfg::{create_trait_from_type_options, TypeOptions};
use crate::log::filter::{FilterResult, LoggerFilter};
use crate::log::level::LogLevel;
use crate::log::marker::Marker;
use crate::log::record::Thrown;

/// CompoundFilter 配置
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CompoundFilterConfig {
    /// 按顺序执行的子过滤器
    pub filters: Vec<TypeOptions>,
}

/// 组合过滤器
///
/// 按添加顺序依次询问子过滤器，返回第一个非 `Neutral` 的结果，
/// 之后的过滤器不再被调用；全部为 `Neutral` 时返回 `Neutral`
#[derive(Default)]
pub struct CompoundFilter {
    filters: ArcSwap<Vec<Arc<dyn LoggerFilter>>>,
}

impl CompoundFilter {
    pub fn new(config: CompoundFilterConfig) -> Result<Self> {
        let filters = config
            .filters
            .iter()
            .map(|opts| create_trait_from_type_options::<dyn LoggerFilter>(opts).map(Arc::from))
            .collect::<Result<Vec<Arc<dyn LoggerFilter>>>>()?;
        Ok(Self::from_filters(filters))
    }

    pub fn from_filters(filters: impl IntoIterator<Item = Arc<dyn LoggerFilter>>) -> Self {
        Self {
            filters: ArcSwap::from_pointee(filters.into_iter().collect()),
        }
    }

    /// 追加过滤器，已存在（同一实例）时返回 false
    pub fn add(&self, filter: Arc<dyn LoggerFilter>) -> bool {
        let mut added = false;
        self.filters.rcu(|filters| {
            added = !filters.iter().any(|f| same_filter(f, &filter));
            let mut next = Vec::clone(filters);
            if added {
                next.push(Arc::clone(&filter));
            }
            next
        });
        added
    }

    /// 移除过滤器（同一实例），存在时返回 true
    pub fn remove(&self, filter: &Arc<dyn LoggerFilter>) -> bool {
        let mut removed = false;
        self.filters.rcu(|filters| {
            removed = filters.iter().any(|f| same_filter(f, filter));
            filters
                .iter()
                .filter(|f| !same_filter(f, filter))
                .cloned()
                .collect::<Vec<_>>()
        });
        removed
    }

    pub fn clear(&self) {
        self.filters.store(Arc::new(Vec::new()));
    }

    pub fn len(&self) -> usize {
        self.filters.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn same_filter(a: &Arc<dyn LoggerFilter>, b: &Arc<dyn LoggerFilter>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

impl LoggerFilter for CompoundFilter {
    fn is_loggable(
        &self,
        logger_name: &str,
        level: LogLevel,
        marker: Option<&Marker>,
        thrown: Option<&Thrown>,
    ) -> FilterResult {
        for filter in self.filters.load().iter() {
            let result = filter.is_loggable(logger_name, level, marker, thrown);
            if result != FilterResult::Neutral {
                return result;
            }
        }
        FilterResult::Neutral
    }
}

crate::impl_from!(CompoundFilterConfig => CompoundFilter, try);
crate::impl_box_from!(CompoundFilter => dyn LoggerFilter);
