use arc_swap::ArcSwap;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use serde::{Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

/// 日志标记
///
/// 命名的、可组合的标签。一个 marker 可以引用其他 marker，
/// `is_or_contains` 的匹配沿引用关系传递。引用是弱引用：marker 不持有其子 marker，
/// 子 marker 的最后一个持有者释放后，引用自动失效
///
/// marker 的相等性基于实例身份：同名 marker 由 [`MarkerFactory`] 保证唯一，
/// 通过 [`MarkerFactory::make_orphan`] 创建的同名 marker 与之并不相等
#[derive(Clone)]
pub struct Marker(Arc<MarkerInner>);

struct MarkerInner {
    name: String,
    // 写少读多，按 copy-on-write 方式替换
    children: ArcSwap<Vec<Weak<MarkerInner>>>,
}

impl Marker {
    fn new(name: &str) -> Self {
        Marker(Arc::new(MarkerInner {
            name: name.to_string(),
            children: ArcSwap::from_pointee(Vec::new()),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    fn refers_to(child: &Weak<MarkerInner>, marker: &Marker) -> bool {
        std::ptr::eq(child.as_ptr(), Arc::as_ptr(&marker.0))
    }

    /// 添加引用，若此前未引用 `marker` 则返回 true
    ///
    /// 顺便清理已失效的引用
    pub fn add(&self, marker: &Marker) -> bool {
        let mut added = false;
        self.0.children.rcu(|children| {
            added = !children.iter().any(|c| Self::refers_to(c, marker));
            let mut next: Vec<Weak<MarkerInner>> = children
                .iter()
                .filter(|c| c.strong_count() > 0)
                .cloned()
                .collect();
            if added {
                next.push(Arc::downgrade(&marker.0));
            }
            next
        });
        added
    }

    /// 移除引用，若此前引用了 `marker` 则返回 true
    pub fn remove(&self, marker: &Marker) -> bool {
        let mut removed = false;
        self.0.children.rcu(|children| {
            removed = children.iter().any(|c| Self::refers_to(c, marker));
            children
                .iter()
                .filter(|c| !Self::refers_to(c, marker) && c.strong_count() > 0)
                .cloned()
                .collect::<Vec<_>>()
        });
        removed
    }

    /// 当前仍然有效的子 marker（快照）
    pub fn children(&self) -> Vec<Marker> {
        self.0
            .children
            .load()
            .iter()
            .filter_map(Weak::upgrade)
            .map(Marker)
            .collect()
    }

    /// 自身就是 `marker`，或直接/间接引用了 `marker`
    pub fn is_or_contains(&self, marker: &Marker) -> bool {
        self.find(&mut Vec::new(), &|m: &Marker| m == marker)
    }

    /// 自身名为 `name`，或直接/间接引用了名为 `name` 的 marker
    pub fn is_or_contains_name(&self, name: &str) -> bool {
        self.find(&mut Vec::new(), &|m: &Marker| m.name() == name)
    }

    // 深度优先搜索，visited 防止引用成环时无限递归
    fn find(&self, visited: &mut Vec<*const MarkerInner>, matches: &dyn Fn(&Marker) -> bool) -> bool {
        let ptr = Arc::as_ptr(&self.0);
        if visited.contains(&ptr) {
            return false;
        }
        visited.push(ptr);
        if matches(self) {
            return true;
        }
        self.children()
            .iter()
            .any(|child| child.find(visited, matches))
    }

    fn write_to(&self, f: &mut fmt::Formatter<'_>, visited: &mut Vec<*const MarkerInner>) -> fmt::Result {
        f.write_str(self.name())?;
        let ptr = Arc::as_ptr(&self.0);
        let children = self.children();
        if children.is_empty() || visited.contains(&ptr) {
            return Ok(());
        }
        visited.push(ptr);
        f.write_str("[")?;
        for (i, child) in children.iter().enumerate() {
            if i != 0 {
                f.write_str(",")?;
            }
            child.write_to(f, visited)?;
        }
        visited.pop();
        f.write_str("]")
    }
}

impl PartialEq for Marker {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Marker {}

impl Hash for Marker {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.0).hash(state)
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_to(f, &mut Vec::new())
    }
}

impl fmt::Debug for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Marker({})", self)
    }
}

impl Serialize for Marker {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Marker 工厂
///
/// 按名称驻留 marker：同一名称总是返回同一个实例
#[derive(Default)]
pub struct MarkerFactory {
    markers: DashMap<String, Marker>,
}

impl MarkerFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取名为 `name` 的 marker，不存在时创建并注册
    pub fn get(&self, name: &str) -> Marker {
        if let Some(marker) = self.markers.get(name) {
            return marker.clone();
        }
        self.markers
            .entry(name.to_string())
            .or_insert_with(|| Marker::new(name))
            .clone()
    }

    /// 是否已注册名为 `name` 的 marker
    pub fn exists(&self, name: &str) -> bool {
        self.markers.contains_key(name)
    }

    /// 从工厂中移除名为 `name` 的 marker，已持有的实例不受影响
    pub fn orphan(&self, name: &str) -> bool {
        self.markers.remove(name).is_some()
    }

    /// 创建一个不注册到工厂的 marker
    pub fn make_orphan(&self, name: &str) -> Marker {
        Marker::new(name)
    }
}

static MARKERS: Lazy<MarkerFactory> = Lazy::new(MarkerFactory::new);

/// 全局 marker 工厂
pub fn markers() -> &'static MarkerFactory {
    &MARKERS
}

/// 从全局工厂获取 marker
pub fn marker(name: &str) -> Marker {
    MARKERS.get(name)
}
