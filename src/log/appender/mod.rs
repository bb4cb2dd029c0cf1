mod console_appender;
mod core;
mod file_appender;
mod registry;

pub use self::core::LogAppender;
pub use console_appender::{ConsoleAppender, ConsoleAppenderConfig, ConsoleTarget};
pub use file_appender::{FileAppender, FileAppenderConfig};
pub use registry::{create_appender_from_options, register_appenders};
