use crate::log::formatter::LogFormatter;
use crate::log::record::LogRecord;
use anyhow::Result;
use serde::Deserialize;
use smart_default::SmartDefault;

/// JsonFormatter 配置
#[derive(Debug, Clone, Deserialize, PartialEq, SmartDefault)]
#[serde(default)]
pub struct JsonFormatterConfig {
    /// 是否缩进输出
    #[default = false]
    pub pretty: bool,
}

/// JSON 格式化器
///
/// 将日志记录格式化为一行 JSON
pub struct JsonFormatter {
    config: JsonFormatterConfig,
}

impl JsonFormatter {
    pub fn new(config: JsonFormatterConfig) -> Self {
        Self { config }
    }
}

impl LogFormatter for JsonFormatter {
    fn format(&self, record: &LogRecord) -> Result<String> {
        // 直接序列化 LogRecord，复用其 Serialize 实现
        if self.config.pretty {
            Ok(serde_json::to_string_pretty(record)?)
        } else {
            Ok(serde_json::to_string(record)?)
        }
    }
}

crate::impl_from!(JsonFormatterConfig => JsonFormatter);
crate::impl_box_from!(JsonFormatter => dyn LogFormatter);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::level::LogLevel;
    use crate::log::record::MetadataValue;
    use serde_json::{json, Value};

    #[test]
    fn test_json_formatter_format() {
        let formatter = JsonFormatter::new(JsonFormatterConfig::default());
        let record = LogRecord::standalone(LogLevel::Info, "x.y", "test message");

        let formatted = formatter.format(&record).unwrap();
        assert!(!formatted.contains('\n'));

        let value: Value = serde_json::from_str(&formatted).unwrap();
        assert_eq!(value["level"], "INFO");
        assert_eq!(value["logger"], "x.y");
        assert_eq!(value["message"], "test message");
        assert_eq!(value["sequence"], record.sequence_number());
        assert!(value["timestamp"].is_number());
        assert!(value.get("parameters").is_none());
    }

    #[test]
    fn test_json_formatter_with_json_parameter() {
        let formatter = JsonFormatter::new(JsonFormatterConfig::default());
        let mut record = LogRecord::standalone(LogLevel::Debug, "svc", "complex data");
        record.push_parameter(MetadataValue::from(json!({"nested": {"value": 123}})));

        let value: Value = serde_json::from_str(&formatter.format(&record).unwrap()).unwrap();
        assert_eq!(value["parameters"][0]["nested"]["value"], 123);
    }

    #[test]
    fn test_json_formatter_pretty() {
        let formatter = JsonFormatter::new(JsonFormatterConfig { pretty: true });
        let record = LogRecord::standalone(LogLevel::Warn, "a", "m");
        assert!(formatter.format(&record).unwrap().contains('\n'));
    }
}
