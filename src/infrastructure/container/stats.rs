use std::sync::atomic::{AtomicU64, Ordering};

/// 容器统计信息快照
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerStats {
    /// 总解析次数
    pub total_resolutions: u64,
    /// 单例缓存命中次数
    pub singleton_cache_hits: u64,
    /// 单例缓存未命中次数
    pub singleton_cache_misses: u64,
    /// 瞬态服务创建次数
    pub transient_creations: u64,
    /// 作用域服务创建次数
    pub scoped_creations: u64,
    /// 已创建的作用域数量
    pub scopes_created: u64,
    /// 已释放的作用域数量
    pub scopes_disposed: u64,
    /// 服务注册数量
    pub registered_services: usize,
}

impl ContainerStats {
    /// 获取缓存命中率（百分比）
    pub fn cache_hit_rate(&self) -> f64 {
        let total = self.singleton_cache_hits + self.singleton_cache_misses;
        if total == 0 {
            0.0
        } else {
            (self.singleton_cache_hits as f64 / total as f64) * 100.0
        }
    }

    /// 仍未释放的作用域数量
    pub fn active_scopes(&self) -> u64 {
        self.scopes_created.saturating_sub(self.scopes_disposed)
    }

    /// 获取性能指标摘要
    pub fn performance_summary(&self) -> String {
        format!(
            "Container Performance: {} total resolutions, {:.1}% cache hit rate, {} registered services, {} active scopes",
            self.total_resolutions,
            self.cache_hit_rate(),
            self.registered_services,
            self.active_scopes()
        )
    }
}

/// 内部原子计数器
#[derive(Default)]
pub(crate) struct StatsCounters {
    total_resolutions: AtomicU64,
    singleton_cache_hits: AtomicU64,
    singleton_cache_misses: AtomicU64,
    transient_creations: AtomicU64,
    scoped_creations: AtomicU64,
    scopes_created: AtomicU64,
    scopes_disposed: AtomicU64,
}

impl StatsCounters {
    pub(crate) fn record_resolution(&self) {
        self.total_resolutions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_singleton_hit(&self) {
        self.singleton_cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_singleton_miss(&self) {
        self.singleton_cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_transient(&self) {
        self.transient_creations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_scoped(&self) {
        self.scoped_creations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_scope_created(&self) {
        self.scopes_created.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_scope_disposed(&self) {
        self.scopes_disposed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, registered_services: usize) -> ContainerStats {
        ContainerStats {
            total_resolutions: self.total_resolutions.load(Ordering::Relaxed),
            singleton_cache_hits: self.singleton_cache_hits.load(Ordering::Relaxed),
            singleton_cache_misses: self.singleton_cache_misses.load(Ordering::Relaxed),
            transient_creations: self.transient_creations.load(Ordering::Relaxed),
            scoped_creations: self.scoped_creations.load(Ordering::Relaxed),
            scopes_created: self.scopes_created.load(Ordering::Relaxed),
            scopes_disposed: self.scopes_disposed.load(Ordering::Relaxed),
            registered_services,
        }
    }
}
