#![allow(clippy::uninlined_format_args)]
//! 命令调度的性能基准测试：作用域路径与根路径对比

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hostdi::errors::CommandError;
use hostdi::host::{ActiveHostHandle, SimulatedHost};
use hostdi::infrastructure::{ContainerError, Resolver};
use hostdi::{
    Command, CommandDescriptor, ContainerBuilder, DiCommand, HostContext, ResultCode,
    ScopedCommandExecutor, ServiceProvider,
};
use std::sync::Arc;

/// 共享配置（单例）
struct Settings {
    factor: u64,
}

/// 每次调用独占的工作单元
struct UnitOfWork {
    items: Vec<u64>,
}

struct ScopedSum {
    unit: Arc<UnitOfWork>,
    settings: Arc<Settings>,
}

impl Command for ScopedSum {
    fn execute(&self) -> Result<ResultCode, CommandError> {
        black_box(self.unit.items.iter().sum::<u64>() * self.settings.factor);
        Ok(ResultCode::Succeeded)
    }
}

impl DiCommand for ScopedSum {
    const ID: &'static str = "scoped-sum";
    const NAME: &'static str = "Scoped Sum";
    const EXECUTE_WITHIN_SCOPE: bool = true;

    fn register_dependencies(services: &mut ContainerBuilder) {
        services
            .try_add_singleton(|_| Ok(Settings { factor: 3 }))
            .try_add_scoped(|_| Ok(UnitOfWork { items: (0..16).collect() }));
    }

    fn construct(r: &Resolver<'_>) -> Result<Self, ContainerError> {
        Ok(Self {
            unit: r.resolve()?,
            settings: r.resolve()?,
        })
    }
}

struct RootSum {
    settings: Arc<Settings>,
}

impl Command for RootSum {
    fn execute(&self) -> Result<ResultCode, CommandError> {
        black_box((0..16u64).sum::<u64>() * self.settings.factor);
        Ok(ResultCode::Succeeded)
    }
}

impl DiCommand for RootSum {
    const ID: &'static str = "root-sum";
    const NAME: &'static str = "Root Sum";

    fn register_dependencies(services: &mut ContainerBuilder) {
        services.try_add_singleton(|_| Ok(Settings { factor: 3 }));
    }

    fn construct(r: &Resolver<'_>) -> Result<Self, ContainerError> {
        Ok(Self { settings: r.resolve()? })
    }
}

fn host() -> HostContext {
    HostContext::new(
        SimulatedHost::new("Bench").with_active_application(ActiveHostHandle::new("Bench", "1.0")),
    )
}

fn provider() -> ServiceProvider {
    let mut services = ContainerBuilder::new();
    services
        .add_host_capabilities(&host())
        .add_command(&CommandDescriptor::of::<ScopedSum>())
        .add_command(&CommandDescriptor::of::<RootSum>());
    services.build()
}

/// 基准测试：作用域路径与根路径的单次调度
fn bench_dispatch(c: &mut Criterion) {
    let provider = provider();
    let executor = ScopedCommandExecutor::new(&provider);
    let scoped = CommandDescriptor::of::<ScopedSum>();
    let root = CommandDescriptor::of::<RootSum>();

    let mut group = c.benchmark_group("dispatch");
    group.bench_function("scoped", |b| {
        b.iter(|| black_box(executor.run(&scoped).unwrap()))
    });
    group.bench_function("root", |b| {
        b.iter(|| black_box(executor.run(&root).unwrap()))
    });
    group.bench_function("scoped_traced", |b| {
        b.iter(|| black_box(executor.run_traced(&scoped).transitions.len()))
    });
    group.finish();
}

/// 基准测试：构建包含不同数量命令依赖的容器
fn bench_container_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("container_build");

    for repeats in [1usize, 10, 100].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(repeats), repeats, |b, &repeats| {
            let host = host();
            b.iter(|| {
                let mut services = ContainerBuilder::new();
                services.add_host_capabilities(&host);
                // 重复添加同一命令不会产生新注册
                for _ in 0..repeats {
                    services
                        .add_command(&CommandDescriptor::of::<ScopedSum>())
                        .add_command(&CommandDescriptor::of::<RootSum>());
                }
                black_box(services.build().len())
            });
        });
    }
    group.finish();
}

/// 基准测试：单例缓存命中
fn bench_singleton_resolution(c: &mut Criterion) {
    let provider = provider();
    provider.resolve::<Settings>().unwrap();

    c.bench_function("singleton_cache_hit", |b| {
        b.iter(|| black_box(provider.resolve::<Settings>().unwrap().factor))
    });
}

criterion_group!(
    benches,
    bench_dispatch,
    bench_container_build,
    bench_singleton_resolution
);
criterion_main!(benches);
