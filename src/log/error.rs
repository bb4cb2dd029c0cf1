use thiserror::Error;

/// 日志门面的配置错误
///
/// 仅在配置阶段返回，日志调用本身从不失败
#[derive(Error, Debug)]
pub enum LogError {
    #[error("无效的 logger 名称: '{name}'")]
    InvalidLoggerName { name: String },

    #[error("无效的日志级别: {0}")]
    InvalidLevel(String),

    #[error("MarkerFilter 缺少 marker")]
    MissingMarker,

    #[error("LoggerRegistry 已被释放")]
    RegistryDropped,

    #[error("配置错误: {0}")]
    Config(#[from] anyhow::Error),
}

impl LogError {
    /// 组件构造失败时保留其中的 LogError，其余错误归为配置错误
    pub(crate) fn from_component(err: anyhow::Error) -> Self {
        match err.downcast::<LogError>() {
            Ok(err) => err,
            Err(err) => LogError::Config(err),
        }
    }
}

/// 校验 logger 名称
///
/// 空字符串表示 root；其余名称必须由非空、不含空白的段以 `.` 连接而成
pub fn validate_logger_name(name: &str) -> Result<(), LogError> {
    if name.is_empty() {
        return Ok(());
    }
    let valid = name
        .split('.')
        .all(|segment| !segment.is_empty() && !segment.chars().any(char::is_whitespace));
    if valid {
        Ok(())
    } else {
        Err(LogError::InvalidLoggerName {
            name: name.to_string(),
        })
    }
}
