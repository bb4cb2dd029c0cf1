//! 配置相关的宏定义
//!
//! 提供简化 From / TryFrom 实现的宏，配合 [`register_trait`](crate::cfg::register_trait)
//! 与 [`register_trait_try`](crate::cfg::register_trait_try) 使用

/// 为配置类型自动实现 From / TryFrom trait
///
/// 支持两种模式：
/// 1. `impl_from!(ConfigType => Type)` - 调用 `Type::new(config)`
/// 2. `impl_from!(ConfigType => Type, try)` - 调用返回 `anyhow::Result<Type>` 的 `Type::new(config)`，实现 `TryFrom`
#[macro_export]
macro_rules! impl_from {
    // 模式1: 直接调用 new 方法
    ($config_type:ty => $target_type:ty) => {
        impl From<$config_type> for $target_type {
            fn from(config: $config_type) -> Self {
                <$target_type>::new(config)
            }
        }
    };

    // 模式2: new 方法可能失败，错误交给调用方
    ($config_type:ty => $target_type:ty, try) => {
        impl TryFrom<$config_type> for $target_type {
            type Error = anyhow::Error;

            fn try_from(config: $config_type) -> anyhow::Result<Self> {
                <$target_type>::new(config)
            }
        }
    };
}

/// 为 Box<T> 类型自动实现到 Box<dyn Trait> 的转换
///
/// 用法：`impl_box_from!(Type => dyn TraitName)`
#[macro_export]
macro_rules! impl_box_from {
    ($source_type:ty => dyn $trait_name:path) => {
        impl From<Box<$source_type>> for Box<dyn $trait_name> {
            fn from(source: Box<$source_type>) -> Self {
                source as Box<dyn $trait_name>
            }
        }
    };
}
