mod compound_filter;
mod core;
mod level_filter;
mod marker_filter;
mod registry;

pub use self::core::{AlwaysNeutralFilter, AlwaysNeutralFilterConfig, FilterResult, LoggerFilter};
pub use compound_filter::{CompoundFilter, CompoundFilterConfig};
pub use level_filter::{LevelFilter, LevelFilterConfig};
pub use marker_filter::{MarkerFilter, MarkerFilterBuilder, MarkerFilterConfig};
pub use registry::{create_filter_from_options, register_filters};
