use anyhow::Result;

use crate::cfg::{create_trait_from_type_options, register_trait, register_trait_try, TypeOptions};
use crate::log::filter::{
    compound_filter::{CompoundFilter, CompoundFilterConfig},
    core::{AlwaysNeutralFilter, AlwaysNeutralFilterConfig},
    level_filter::{LevelFilter, LevelFilterConfig},
    marker_filter::{MarkerFilter, MarkerFilterConfig},
    LoggerFilter,
};

/// 注册所有 Filter 实现
pub fn register_filters() -> Result<()> {
    register_trait::<AlwaysNeutralFilter, dyn LoggerFilter, AlwaysNeutralFilterConfig>("AlwaysNeutralFilter")?;
    register_trait::<LevelFilter, dyn LoggerFilter, LevelFilterConfig>("LevelFilter")?;
    register_trait_try::<MarkerFilter, dyn LoggerFilter, MarkerFilterConfig>("MarkerFilter")?;
    register_trait_try::<CompoundFilter, dyn LoggerFilter, CompoundFilterConfig>("CompoundFilter")?;
    Ok(())
}

/// 从 TypeOptions 创建 Filter
pub fn create_filter_from_options(options: &TypeOptions) -> Result<Box<dyn LoggerFilter>> {
    create_trait_from_type_options(options)
}
