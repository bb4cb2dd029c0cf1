// TypeOptions：组件的类型名 + 构造参数

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// 类型选项结构
///
/// 用于在配置中描述一个可插拔组件（formatter、appender、filter），
/// `type` 为注册时使用的名称，`options` 为该组件自身的配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeOptions {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default = "empty_options")]
    pub options: JsonValue,
}

fn empty_options() -> JsonValue {
    JsonValue::Object(serde_json::Map::new())
}

impl TypeOptions {
    /// 创建 TypeOptions
    pub fn new(type_name: impl Into<String>, options: JsonValue) -> Self {
        Self {
            type_name: type_name.into(),
            options,
        }
    }

    /// 创建不带参数的 TypeOptions
    pub fn of(type_name: impl Into<String>) -> Self {
        Self::new(type_name, empty_options())
    }

    /// 从 JSON 字符串创建 TypeOptions（支持 JSON5 格式）
    pub fn from_json(json_str: &str) -> Result<Self> {
        // 使用 json5 解析（支持注释、尾随逗号、未引用的键等）
        Ok(json5::from_str(json_str)?)
    }

    /// 从 YAML 字符串创建 TypeOptions
    pub fn from_yaml(yaml_str: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml_str)?)
    }

    /// 从 TOML 字符串创建 TypeOptions
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// 导出为 JSON 字符串
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_options_of() {
        let opts = TypeOptions::of("AlwaysNeutralFilter");
        assert_eq!(opts.type_name, "AlwaysNeutralFilter");
        assert!(opts.options.as_object().unwrap().is_empty());
    }

    #[test]
    fn test_type_options_partial_eq() {
        let a = TypeOptions::new("ConsoleAppender", serde_json::json!({"target": "stderr"}));
        let b = TypeOptions::new("ConsoleAppender", serde_json::json!({"target": "stderr"}));
        let c = TypeOptions::new("ConsoleAppender", serde_json::json!({"target": "stdout"}));

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, TypeOptions::new("FileAppender", serde_json::json!({"target": "stderr"})));
    }

    #[test]
    fn test_json5_support() -> Result<()> {
        // JSON5 支持注释
        let json5_str = r#"
        {
            // 文本格式化器
            type: "TextFormatter",
            options: {
                /* 多行注释 */
                colored: true,   // 尾随逗号
            }
        }"#;

        let type_options = TypeOptions::from_json(json5_str)?;
        assert_eq!(type_options.type_name, "TextFormatter");
        assert_eq!(type_options.options["colored"], true);

        Ok(())
    }

    #[test]
    fn test_missing_options_defaults_to_empty_object() -> Result<()> {
        let type_options = TypeOptions::from_json(r#"{ "type": "JsonFormatter" }"#)?;
        assert_eq!(type_options.type_name, "JsonFormatter");
        assert!(type_options.options.is_object());

        Ok(())
    }

    #[test]
    fn test_yaml_and_toml() -> Result<()> {
        let yaml = TypeOptions::from_yaml(
            r#"
type: FileAppender
options:
  file_path: /tmp/app.log
"#,
        )?;
        assert_eq!(yaml.type_name, "FileAppender");
        assert_eq!(yaml.options["file_path"], "/tmp/app.log");

        let toml = TypeOptions::from_toml(
            r#"
type = "MarkerFilter"

[options]
marker = "AUDIT"
when_matched = "accept"
"#,
        )?;
        assert_eq!(toml.type_name, "MarkerFilter");
        assert_eq!(toml.options["marker"], "AUDIT");

        Ok(())
    }

    #[test]
    fn test_to_json_reparse() -> Result<()> {
        let opts = TypeOptions::new("LevelFilter", serde_json::json!({"level": "warn"}));
        let reparsed = TypeOptions::from_json(&opts.to_json()?)?;
        assert_eq!(reparsed, opts);

        Ok(())
    }

    #[test]
    fn test_invalid_json_error() {
        let result = TypeOptions::from_json(r#"{ "type": "TextFormatter", "options": { "colored": "#);
        assert!(result.is_err());
    }
}
