//! Decision view benchmarks
//!
//! Memoized vs fresh evaluation over catalogs of increasing size, plus a
//! full session round trip through the in-memory directory.

use adminkit_access::engine::{CacheConfig, DecisionInputs};
use adminkit_access::types::{IdentityPayload, PermissionGrant, RolePayload};
use adminkit_access::{
    AccessConfig, AccessSession, CatalogResolver, Credential, DecisionView, InMemoryDirectory, ModuleDescriptor,
    PermissionSnapshot,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use tokio::runtime::Runtime;

fn create_modules(count: usize) -> Vec<ModuleDescriptor> {
    (0..count)
        .map(|i| ModuleDescriptor::new(format!("module-{}", i), format!("Module {}", i)))
        .collect()
}

fn create_grants(count: usize) -> Vec<PermissionGrant> {
    (0..count)
        .filter(|i| i % 2 == 0)
        .map(|i| PermissionGrant::new(format!("module-{}", i), true, i % 4 == 0, false, false))
        .collect()
}

fn create_payload(role: &str, grants: Vec<PermissionGrant>) -> IdentityPayload {
    IdentityPayload {
        id: "u-bench".into(),
        name: "Bench".into(),
        email: None,
        role_id: "r-bench".into(),
        status: true,
        role: Some(RolePayload {
            id: "r-bench".into(),
            name: role.into(),
            description: String::new(),
            status: true,
            permissions: grants,
        }),
    }
}

fn bench_decide(c: &mut Criterion) {
    let mut group = c.benchmark_group("decide");

    for module_count in [10, 100, 1000].iter() {
        let snapshot = PermissionSnapshot::from_payload(create_payload("Staff", create_grants(*module_count)))
            .expect("valid payload");
        let catalog = CatalogResolver::loaded(create_modules(*module_count));
        let inputs = DecisionInputs {
            snapshot: Some(&snapshot),
            catalog: &catalog,
            authenticated: true,
        };
        let target = format!("Module {}", module_count - 2);

        let memoized = DecisionView::new(CacheConfig::default(), None);
        group.bench_with_input(BenchmarkId::new("memoized", module_count), &target, |b, target| {
            b.iter(|| black_box(memoized.decide(&inputs, black_box(target))));
        });

        let fresh = DecisionView::new(
            CacheConfig {
                enabled: false,
                ..Default::default()
            },
            None,
        );
        group.bench_with_input(BenchmarkId::new("fresh", module_count), &target, |b, target| {
            b.iter(|| black_box(fresh.decide(&inputs, black_box(target))));
        });
    }

    group.finish();
}

fn bench_decide_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("decide_all");

    for module_count in [10, 100, 1000].iter() {
        let snapshot = PermissionSnapshot::from_payload(create_payload("Staff", create_grants(*module_count)))
            .expect("valid payload");
        let catalog = CatalogResolver::loaded(create_modules(*module_count));
        let inputs = DecisionInputs {
            snapshot: Some(&snapshot),
            catalog: &catalog,
            authenticated: true,
        };
        let view = DecisionView::new(CacheConfig::default(), None);

        group.bench_function(BenchmarkId::new("modules", module_count), |b| {
            b.iter(|| black_box(view.decide_all(&inputs)));
        });
    }

    group.finish();
}

fn bench_force_sync(c: &mut Criterion) {
    let rt = Runtime::new().expect("runtime");

    let session = rt.block_on(async {
        let directory = Arc::new(InMemoryDirectory::new());
        directory.set_modules(create_modules(100)).await;
        directory
            .put_identity("bench-token", create_payload("Staff", create_grants(100)))
            .await;

        let session = AccessSession::new(&AccessConfig::default(), directory.clone(), directory);
        session.sign_in(Credential::new("bench-token"));
        session.load_catalog().await;
        session
    });

    c.bench_function("force_sync_in_memory", |b| {
        b.to_async(&rt).iter(|| async {
            black_box(session.force_sync().await);
        });
    });
}

criterion_group!(benches, bench_decide, bench_decide_all, bench_force_sync);
criterion_main!(benches);
