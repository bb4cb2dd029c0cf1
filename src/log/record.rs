use serde::{Serialize, Serializer};
use serde_json::Value;
use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::panic::Location;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::log::level::LogLevel;
use crate::log::marker::Marker;

/// 随日志传入的异常（错误）
///
/// 日志系统只持有引用，从不修改或重新抛出
pub type Thrown = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// 消息缓冲区的初始容量，也是可配置上限的下限
pub const DEFAULT_MESSAGE_CAPACITY: usize = 1024;

/// 消息缓冲区的默认容量上限
pub const DEFAULT_MAX_MESSAGE_CAPACITY: usize = 2048;

/// 参数值，支持多种类型
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    String(String),
    I64(i64),
    U64(u64),
    F64(f64),
    Bool(bool),
    Null,
    /// 任意 JSON 兼容的数据
    Json(Value),
}

impl Serialize for MetadataValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            MetadataValue::String(s) => serializer.serialize_str(s),
            MetadataValue::I64(n) => serializer.serialize_i64(*n),
            MetadataValue::U64(n) => serializer.serialize_u64(*n),
            MetadataValue::F64(n) => serializer.serialize_f64(*n),
            MetadataValue::Bool(b) => serializer.serialize_bool(*b),
            MetadataValue::Null => serializer.serialize_none(),
            MetadataValue::Json(v) => v.serialize(serializer),
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::String(s) => write!(f, "{}", s),
            MetadataValue::I64(n) => write!(f, "{}", n),
            MetadataValue::U64(n) => write!(f, "{}", n),
            MetadataValue::F64(n) => write!(f, "{}", n),
            MetadataValue::Bool(b) => write!(f, "{}", b),
            MetadataValue::Null => write!(f, "null"),
            MetadataValue::Json(v) => write!(f, "'{}'", v),
        }
    }
}

impl MetadataValue {
    /// 从任意实现了 Serialize 的结构体创建参数值
    pub fn from_struct<T: serde::Serialize>(value: T) -> Self {
        match serde_json::to_value(value) {
            Ok(json_value) => MetadataValue::Json(json_value),
            Err(_) => MetadataValue::Null,
        }
    }
}

impl From<String> for MetadataValue {
    fn from(s: String) -> Self {
        MetadataValue::String(s)
    }
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self {
        MetadataValue::String(s.to_string())
    }
}

impl From<i64> for MetadataValue {
    fn from(n: i64) -> Self {
        MetadataValue::I64(n)
    }
}

impl From<i32> for MetadataValue {
    fn from(n: i32) -> Self {
        MetadataValue::I64(n as i64)
    }
}

impl From<u64> for MetadataValue {
    fn from(n: u64) -> Self {
        MetadataValue::U64(n)
    }
}

impl From<u32> for MetadataValue {
    fn from(n: u32) -> Self {
        MetadataValue::U64(n as u64)
    }
}

impl From<usize> for MetadataValue {
    fn from(n: usize) -> Self {
        MetadataValue::U64(n as u64)
    }
}

impl From<f64> for MetadataValue {
    fn from(n: f64) -> Self {
        MetadataValue::F64(n)
    }
}

impl From<bool> for MetadataValue {
    fn from(b: bool) -> Self {
        MetadataValue::Bool(b)
    }
}

impl From<Value> for MetadataValue {
    fn from(v: Value) -> Self {
        MetadataValue::Json(v)
    }
}

/// 日志记录
///
/// 每个线程缓存一个实例并在日志调用之间复用（见 [`RecordPool`]）。
/// backend 只能在 `accept` 调用期间借用它，需要保留数据时使用 [`LogRecord::copy`]
pub struct LogRecord {
    level: LogLevel,
    logger_name: String,
    marker: Option<Marker>,
    thrown: Option<Thrown>,
    location: Option<&'static Location<'static>>,
    thread_name: String,
    thread_id: String,
    timestamp: SystemTime,
    sequence: u64,
    message: String,
    parameters: Vec<MetadataValue>,
}

impl LogRecord {
    fn new() -> Self {
        let thread = std::thread::current();
        Self {
            level: LogLevel::None,
            logger_name: String::new(),
            marker: None,
            thrown: None,
            location: None,
            thread_name: thread.name().unwrap_or("<unnamed>").to_string(),
            // 缓存 thread_id 的字符串表示，避免每次格式化时转换
            thread_id: format!("{:?}", thread.id()),
            timestamp: SystemTime::now(),
            sequence: 0,
            message: String::with_capacity(DEFAULT_MESSAGE_CAPACITY),
            parameters: Vec::new(),
        }
    }

    /// 创建一个不属于池的独立记录（测试、backend 自行构造记录时使用）
    pub fn standalone(level: LogLevel, logger_name: &str, message: &str) -> Self {
        let mut record = Self::new();
        record.reset(DEFAULT_MAX_MESSAGE_CAPACITY);
        record.prepare(level, logger_name, None, None);
        record.message.push_str(message);
        record
    }

    // 复用前清理上一次调用留下的字段
    fn reset(&mut self, max_message_capacity: usize) {
        self.level = LogLevel::None;
        self.logger_name.clear();
        self.marker = None;
        self.thrown = None;
        self.location = None;
        self.parameters.clear();
        self.timestamp = SystemTime::now();
        self.sequence = SEQUENCE.fetch_add(1, Ordering::Relaxed);
        self.message.clear();
        if self.message.capacity() > max_message_capacity {
            self.message.shrink_to(max_message_capacity);
        }
    }

    pub(crate) fn prepare(
        &mut self,
        level: LogLevel,
        logger_name: &str,
        marker: Option<Marker>,
        thrown: Option<Thrown>,
    ) {
        self.level = level;
        self.logger_name.push_str(logger_name);
        self.marker = marker;
        self.thrown = thrown;
    }

    pub(crate) fn set_location(&mut self, location: &'static Location<'static>) {
        self.location = Some(location);
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn logger_name(&self) -> &str {
        &self.logger_name
    }

    pub fn marker(&self) -> Option<&Marker> {
        self.marker.as_ref()
    }

    /// 设置 marker，传入 None 时清除
    pub fn set_marker(&mut self, marker: Option<Marker>) -> &mut Self {
        self.marker = marker;
        self
    }

    pub fn thrown(&self) -> Option<&Thrown> {
        self.thrown.as_ref()
    }

    pub fn set_thrown(&mut self, thrown: Option<Thrown>) -> &mut Self {
        self.thrown = thrown;
        self
    }

    /// 调用位置，只有节点要求记录位置时才会填充
    pub fn location(&self) -> Option<&'static Location<'static>> {
        self.location
    }

    pub fn thread_name(&self) -> &str {
        &self.thread_name
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    pub fn timestamp(&self) -> SystemTime {
        self.timestamp
    }

    /// 自 Unix 纪元以来的毫秒数
    pub fn millis(&self) -> u64 {
        self.timestamp
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }

    /// 进程内全局递增的序号，用于区分同一毫秒内的记录
    pub fn sequence_number(&self) -> u64 {
        self.sequence
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// 当前消息缓冲区容量
    pub fn message_capacity(&self) -> usize {
        self.message.capacity()
    }

    /// 替换消息内容
    pub fn set_message(&mut self, message: &str) -> &mut Self {
        self.message.clear();
        self.message.push_str(message);
        self
    }

    /// 追加到消息末尾
    pub fn append(&mut self, s: &str) -> &mut Self {
        self.message.push_str(s);
        self
    }

    /// 将格式化参数直接写入消息缓冲区
    pub fn append_fmt(&mut self, args: fmt::Arguments<'_>) -> &mut Self {
        // 写入 String 不会失败
        let _ = fmt::Write::write_fmt(&mut self.message, args);
        self
    }

    /// 清空消息
    pub fn reset_message(&mut self) -> &mut Self {
        self.message.clear();
        self
    }

    pub fn parameters(&self) -> &[MetadataValue] {
        &self.parameters
    }

    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    /// 替换参数列表，复用已有的存储
    pub fn set_parameters<I>(&mut self, parameters: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<MetadataValue>,
    {
        self.parameters.clear();
        self.parameters.extend(parameters.into_iter().map(Into::into));
        self
    }

    pub fn push_parameter(&mut self, value: impl Into<MetadataValue>) -> &mut Self {
        self.parameters.push(value.into());
        self
    }

    /// 复制出一个独立的记录，供需要跨越 `accept` 调用保留数据的 backend 使用
    pub fn copy(&self) -> LogRecord {
        LogRecord {
            level: self.level,
            logger_name: self.logger_name.clone(),
            marker: self.marker.clone(),
            thrown: self.thrown.clone(),
            location: self.location,
            thread_name: self.thread_name.clone(),
            thread_id: self.thread_id.clone(),
            timestamp: self.timestamp,
            sequence: self.sequence,
            message: self.message.clone(),
            parameters: self.parameters.clone(),
        }
    }
}

impl Clone for LogRecord {
    fn clone(&self) -> Self {
        self.copy()
    }
}

impl fmt::Write for LogRecord {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.message.push_str(s);
        Ok(())
    }
}

impl fmt::Debug for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogRecord")
            .field("level", &self.level)
            .field("logger_name", &self.logger_name)
            .field("marker", &self.marker)
            .field("sequence", &self.sequence)
            .field("message", &self.message)
            .field("parameters", &self.parameters)
            .finish()
    }
}

impl Serialize for LogRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("timestamp", &self.millis())?;
        map.serialize_entry("sequence", &self.sequence)?;
        map.serialize_entry("level", &self.level)?;
        map.serialize_entry("logger", &self.logger_name)?;
        map.serialize_entry("message", &self.message)?;
        map.serialize_entry("thread_name", &self.thread_name)?;
        map.serialize_entry("thread_id", &self.thread_id)?;
        if let Some(marker) = &self.marker {
            map.serialize_entry("marker", marker)?;
        }
        if let Some(location) = self.location {
            map.serialize_entry("file", location.file())?;
            map.serialize_entry("line", &location.line())?;
        }
        if !self.parameters.is_empty() {
            map.serialize_entry("parameters", &self.parameters)?;
        }
        if let Some(thrown) = &self.thrown {
            map.serialize_entry("thrown", &thrown.to_string())?;
        }
        map.end()
    }
}

// ========== 记录池 ==========

static SEQUENCE: AtomicU64 = AtomicU64::new(1);
static OVERFLOW_ALLOCATIONS: AtomicU64 = AtomicU64::new(0);
static MAX_MESSAGE_CAPACITY: AtomicUsize = AtomicUsize::new(DEFAULT_MAX_MESSAGE_CAPACITY);

struct CachedSlot {
    record: Option<Box<LogRecord>>,
    reserved: bool,
}

thread_local! {
    static CACHED: RefCell<CachedSlot> = const {
        RefCell::new(CachedSlot {
            record: None,
            reserved: false,
        })
    };
}

/// 线程级日志记录池
///
/// 每个线程持有一个可复用的 [`LogRecord`]，首次使用时创建。
/// 同一线程在释放之前再次获取（例如在 backend 回调中打日志）时，
/// 会分配一个新的记录而不是破坏正在使用的那个，这种情况通过 [`RecordPool::overflow_count`] 计数
pub struct RecordPool;

impl RecordPool {
    /// 获取一个已重置并保留的记录
    pub fn acquire() -> PooledRecord {
        let cached = CACHED.try_with(|slot| {
            let mut slot = slot.borrow_mut();
            if slot.reserved {
                return None;
            }
            slot.reserved = true;
            Some(slot.record.take().unwrap_or_else(|| Box::new(LogRecord::new())))
        });

        let (mut record, from_cache) = match cached {
            Ok(Some(record)) => (record, true),
            Ok(None) => {
                let count = OVERFLOW_ALLOCATIONS.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::trace!(count, "log record already reserved on this thread, allocating a new one");
                (Box::new(LogRecord::new()), false)
            }
            // 线程局部存储已销毁（线程退出阶段）
            Err(_) => (Box::new(LogRecord::new()), false),
        };

        record.reset(Self::max_message_capacity());
        PooledRecord {
            record: Some(record),
            from_cache,
            _not_send: PhantomData,
        }
    }

    /// 因重入而额外分配的记录数（进程级）
    pub fn overflow_count() -> u64 {
        OVERFLOW_ALLOCATIONS.load(Ordering::Relaxed)
    }

    /// 设置缓存消息缓冲区的容量上限，返回实际生效的值（不低于 [`DEFAULT_MESSAGE_CAPACITY`]）
    ///
    /// 每个打日志的线程都会保留这么多内存，不宜设置过大
    pub fn set_max_message_capacity(max: usize) -> usize {
        let max = max.max(DEFAULT_MESSAGE_CAPACITY);
        MAX_MESSAGE_CAPACITY.store(max, Ordering::Relaxed);
        max
    }

    pub fn max_message_capacity() -> usize {
        MAX_MESSAGE_CAPACITY.load(Ordering::Relaxed)
    }

    /// 当前线程缓存的记录是否正在使用
    pub fn is_reserved() -> bool {
        CACHED
            .try_with(|slot| slot.borrow().reserved)
            .unwrap_or(false)
    }

    /// 丢弃当前线程缓存的记录，下次获取时重新创建
    pub fn clear_cached() {
        let _ = CACHED.try_with(|slot| slot.borrow_mut().record = None);
    }
}

/// 从 [`RecordPool`] 获取的记录
///
/// drop（或调用 [`PooledRecord::release`]）时归还：线程缓存的实例回到池中，
/// 重入时额外分配的实例直接释放。不能跨线程移动
pub struct PooledRecord {
    record: Option<Box<LogRecord>>,
    from_cache: bool,
    _not_send: PhantomData<*const ()>,
}

impl PooledRecord {
    /// 是否为线程缓存的实例（否则为重入时分配的实例）
    pub fn is_cached(&self) -> bool {
        self.from_cache
    }

    /// 归还记录，等价于 drop
    pub fn release(self) {}
}

impl Deref for PooledRecord {
    type Target = LogRecord;

    fn deref(&self) -> &LogRecord {
        match self.record.as_deref() {
            Some(record) => record,
            None => unreachable!("pooled record accessed after release"),
        }
    }
}

impl DerefMut for PooledRecord {
    fn deref_mut(&mut self) -> &mut LogRecord {
        match self.record.as_deref_mut() {
            Some(record) => record,
            None => unreachable!("pooled record accessed after release"),
        }
    }
}

impl Drop for PooledRecord {
    fn drop(&mut self) {
        let Some(record) = self.record.take() else {
            return;
        };
        if self.from_cache {
            let _ = CACHED.try_with(move |slot| {
                let mut slot = slot.borrow_mut();
                slot.record = Some(record);
                slot.reserved = false;
            });
        }
    }
}
