use crate::log::appender::LogAppender;
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// FileAppender 配置
#[derive(Debug, Clone, Deserialize)]
pub struct FileAppenderConfig {
    /// 日志文件路径
    pub file_path: String,

    /// 每行输出后是否立即刷新
    #[serde(default = "default_auto_flush")]
    pub auto_flush: bool,
}

fn default_auto_flush() -> bool {
    true
}

/// 文件输出器
///
/// 以追加模式写入文件，父目录不存在时自动创建
pub struct FileAppender {
    path: PathBuf,
    auto_flush: bool,
    writer: Mutex<BufWriter<File>>,
}

impl FileAppender {
    pub fn new(config: FileAppenderConfig) -> Result<Self> {
        let path = PathBuf::from(&config.file_path);

        // 确保父目录存在
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("创建日志目录失败: {}", parent.display()))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("打开日志文件失败: {}", path.display()))?;

        Ok(Self {
            path,
            auto_flush: config.auto_flush,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    /// 当前写入的文件路径
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogAppender for FileAppender {
    fn append(&self, formatted_message: &str) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| anyhow!("Failed to acquire file lock"))?;
        writer.write_all(formatted_message.as_bytes())?;
        writer.write_all(b"\n")?;
        if self.auto_flush {
            writer.flush()?;
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| anyhow!("Failed to acquire file lock"))?;
        writer.flush()?;
        Ok(())
    }
}

crate::impl_from!(FileAppenderConfig => FileAppender, try);
crate::impl_box_from!(FileAppender => dyn LogAppender);
