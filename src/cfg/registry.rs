// 组件注册表和工厂函数

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use super::type_options::TypeOptions;

// Trait-based 构造函数类型
// 注意：这里返回 Box<dyn Any>，但实际上它包含的是 Box<dyn Trait>
// 构造函数可能递归创建子组件，调用前必须先释放注册表的锁
type TraitConstructor = Arc<dyn Fn(JsonValue) -> Result<Box<dyn Any + Send + Sync>> + Send + Sync>;

// Trait 注册表：为每个 Trait 类型维护一个独立的注册表
// 外层 HashMap 的 key 是 Trait 的 TypeId，内层 HashMap 的 key 是类型名称
static TRAIT_REGISTRY: Lazy<RwLock<HashMap<TypeId, HashMap<String, TraitConstructor>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

fn insert_constructor<Trait>(type_name: &str, constructor: TraitConstructor) -> Result<()>
where
    Trait: ?Sized + Send + Sync + 'static,
{
    let mut registry = TRAIT_REGISTRY
        .write()
        .map_err(|_| anyhow!("Failed to acquire write lock"))?;
    registry
        .entry(TypeId::of::<Trait>())
        .or_default()
        .insert(type_name.to_string(), constructor);
    Ok(())
}

/// 为实现特定 Trait 的类型注册构造函数
///
/// 允许注册多个实现同一 Trait 的不同类型，并在运行时根据配置创建 trait object
///
/// # 类型参数
/// - `T`: 具体实现类型
/// - `Trait`: 目标 trait（使用 `dyn Trait` 形式）
/// - `Config`: 配置类型
///
/// # 示例
/// ```ignore
/// register_trait::<ConsoleAppender, dyn LogAppender, ConsoleAppenderConfig>("ConsoleAppender")?;
///
/// let appender: Box<dyn LogAppender> = create_trait_from_type_options(&type_options)?;
/// ```
pub fn register_trait<T, Trait, Config>(type_name: &str) -> Result<()>
where
    T: Send + Sync + 'static,
    Trait: ?Sized + Send + Sync + 'static,
    Config: DeserializeOwned + Send + Sync + 'static,
    T: From<Config>,
    Box<T>: Into<Box<Trait>>,
{
    let constructor: TraitConstructor = Arc::new(|value| {
        let config: Config = serde_json::from_value(value)?;
        let trait_object: Box<Trait> = Box::new(T::from(config)).into();
        // 将 Box<dyn Trait> 包装成 Box<dyn Any>
        Ok(Box::new(trait_object) as Box<dyn Any + Send + Sync>)
    });

    insert_constructor::<Trait>(type_name, constructor)
}

/// 为构造可能失败的类型注册构造函数
///
/// 与 [`register_trait`] 相同，但使用 `TryFrom<Config>`，构造失败时
/// 错误会在 [`create_trait_from_type_options`] 中返回，而不是 panic
pub fn register_trait_try<T, Trait, Config>(type_name: &str) -> Result<()>
where
    T: Send + Sync + 'static,
    Trait: ?Sized + Send + Sync + 'static,
    Config: DeserializeOwned + Send + Sync + 'static,
    T: TryFrom<Config, Error = anyhow::Error>,
    Box<T>: Into<Box<Trait>>,
{
    let constructor: TraitConstructor = Arc::new(|value| {
        let config: Config = serde_json::from_value(value)?;
        let trait_object: Box<Trait> = Box::new(T::try_from(config)?).into();
        Ok(Box::new(trait_object) as Box<dyn Any + Send + Sync>)
    });

    insert_constructor::<Trait>(type_name, constructor)
}

/// 根据 TypeOptions 创建 trait object
///
/// # 示例
/// ```ignore
/// let type_options = TypeOptions::from_json(r#"{"type": "TextFormatter", "options": {}}"#)?;
/// let formatter: Box<dyn LogFormatter> = create_trait_from_type_options(&type_options)?;
/// ```
pub fn create_trait_from_type_options<Trait>(type_options: &TypeOptions) -> Result<Box<Trait>>
where
    Trait: ?Sized + Send + Sync + 'static,
{
    let constructor = {
        let registry = TRAIT_REGISTRY
            .read()
            .map_err(|_| anyhow!("Failed to acquire read lock"))?;

        registry
            .get(&TypeId::of::<Trait>())
            .and_then(|trait_registry| trait_registry.get(&type_options.type_name))
            .cloned()
            .ok_or_else(|| {
                anyhow!(
                    "Type '{}' not registered for this trait",
                    type_options.type_name
                )
            })?
    };

    let any_box = constructor(type_options.options.clone())?;

    // 从 Box<dyn Any> 中取回 Box<dyn Trait>
    any_box
        .downcast::<Box<Trait>>()
        .map(|boxed| *boxed)
        .map_err(|_| anyhow!("Failed to downcast to target trait type"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    trait Sink: Send + Sync {
        fn describe(&self) -> String;
    }

    #[derive(Debug, Clone, Deserialize)]
    struct PrefixSinkConfig {
        prefix: String,
    }

    struct PrefixSink {
        prefix: String,
    }

    impl From<PrefixSinkConfig> for PrefixSink {
        fn from(config: PrefixSinkConfig) -> Self {
            Self {
                prefix: config.prefix,
            }
        }
    }

    impl Sink for PrefixSink {
        fn describe(&self) -> String {
            format!("prefix:{}", self.prefix)
        }
    }

    crate::impl_box_from!(PrefixSink => dyn Sink);

    #[derive(Debug, Clone, Deserialize)]
    struct CheckedSinkConfig {
        capacity: usize,
    }

    struct CheckedSink {
        capacity: usize,
    }

    impl TryFrom<CheckedSinkConfig> for CheckedSink {
        type Error = anyhow::Error;

        fn try_from(config: CheckedSinkConfig) -> Result<Self> {
            if config.capacity == 0 {
                return Err(anyhow!("capacity must be positive"));
            }
            Ok(Self {
                capacity: config.capacity,
            })
        }
    }

    impl Sink for CheckedSink {
        fn describe(&self) -> String {
            format!("checked:{}", self.capacity)
        }
    }

    crate::impl_box_from!(CheckedSink => dyn Sink);

    #[test]
    fn test_register_trait_basic() -> Result<()> {
        register_trait::<PrefixSink, dyn Sink, PrefixSinkConfig>("PrefixSink")?;

        let opts = TypeOptions::new("PrefixSink", serde_json::json!({"prefix": "app"}));
        let sink: Box<dyn Sink> = create_trait_from_type_options(&opts)?;
        assert_eq!(sink.describe(), "prefix:app");

        Ok(())
    }

    #[test]
    fn test_register_trait_try() -> Result<()> {
        register_trait_try::<CheckedSink, dyn Sink, CheckedSinkConfig>("CheckedSink")?;

        let ok = TypeOptions::new("CheckedSink", serde_json::json!({"capacity": 8}));
        let sink: Box<dyn Sink> = create_trait_from_type_options(&ok)?;
        assert_eq!(sink.describe(), "checked:8");

        let bad = TypeOptions::new("CheckedSink", serde_json::json!({"capacity": 0}));
        let result: Result<Box<dyn Sink>> = create_trait_from_type_options(&bad);
        let err = result.err().unwrap();
        assert!(err.to_string().contains("capacity"));

        Ok(())
    }

    #[test]
    fn test_unregistered_type() {
        let opts = TypeOptions::of("NoSuchSink");
        let result: Result<Box<dyn Sink>> = create_trait_from_type_options(&opts);
        let err = result.err().unwrap();
        assert!(err.to_string().contains("not registered"));
    }

    /// 由子组件组合而成，构造时递归调用 create_trait_from_type_options
    struct NestedSink {
        inner: Vec<Box<dyn Sink>>,
    }

    #[derive(Debug, Clone, Deserialize)]
    struct NestedSinkConfig {
        inner: Vec<TypeOptions>,
    }

    impl TryFrom<NestedSinkConfig> for NestedSink {
        type Error = anyhow::Error;

        fn try_from(config: NestedSinkConfig) -> Result<Self> {
            let inner = config
                .inner
                .iter()
                .map(create_trait_from_type_options::<dyn Sink>)
                .collect::<Result<Vec<_>>>()?;
            Ok(Self { inner })
        }
    }

    impl Sink for NestedSink {
        fn describe(&self) -> String {
            let parts: Vec<String> = self.inner.iter().map(|s| s.describe()).collect();
            format!("nested:[{}]", parts.join(","))
        }
    }

    crate::impl_box_from!(NestedSink => dyn Sink);

    #[test]
    fn test_nested_create_with_concurrent_register() -> Result<()> {
        register_trait::<PrefixSink, dyn Sink, PrefixSinkConfig>("NestedPrefixSink")?;
        register_trait_try::<NestedSink, dyn Sink, NestedSinkConfig>("NestedSink")?;

        let opts = TypeOptions::new(
            "NestedSink",
            serde_json::json!({
                "inner": [
                    {"type": "NestedPrefixSink", "options": {"prefix": "a"}},
                    {"type": "NestedSink", "options": {"inner": [
                        {"type": "NestedPrefixSink", "options": {"prefix": "b"}}
                    ]}},
                ]
            }),
        );

        // 另一个线程不断写注册表，嵌套构造不能阻塞在排队的写锁之后
        let writer = std::thread::spawn(|| {
            for _ in 0..2000 {
                register_trait::<PrefixSink, dyn Sink, PrefixSinkConfig>("NestedPrefixSink").unwrap();
            }
        });

        for _ in 0..2000 {
            let sink: Box<dyn Sink> = create_trait_from_type_options(&opts)?;
            assert_eq!(sink.describe(), "nested:[prefix:a,nested:[prefix:b]]");
        }
        writer.join().unwrap();

        Ok(())
    }

    #[test]
    fn test_invalid_config() -> Result<()> {
        register_trait::<PrefixSink, dyn Sink, PrefixSinkConfig>("PrefixSink2")?;

        let opts = TypeOptions::new("PrefixSink2", serde_json::json!({"wrong_field": 1}));
        let result: Result<Box<dyn Sink>> = create_trait_from_type_options(&opts);
        assert!(result.is_err());

        Ok(())
    }
}
