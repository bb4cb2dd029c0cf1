//! cfg 模块 - 组件配置
//!
//! 通过 `TypeOptions`（类型名 + 参数）描述可插拔组件，并通过注册表在运行时创建 trait object

#[macro_use]
pub mod macros;
pub mod registry;
pub mod type_options;

// 重新导出公共 API
pub use registry::{create_trait_from_type_options, register_trait, register_trait_try};
pub use type_options::TypeOptions;
