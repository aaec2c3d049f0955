//! Access layer benchmarks
//!
//! Run with: cargo bench --features=benchmarks

use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use tokio::runtime::Runtime;

use profile_authz::auth::AccessComponents;
use profile_authz::cache::{CacheConfig, TtlCache};
use profile_authz::config::CacheSettings;
use profile_authz::models::{Role, UserProfile};
use profile_authz::store::InMemoryProfileStore;

fn seeded_components(users: usize) -> AccessComponents {
    let store = InMemoryProfileStore::new()
        .with_profiles((0..users).map(|i| UserProfile::new(format!("user{}", i), format!("User {}", i))))
        .with_role("user0", Role::admin());
    AccessComponents::new(Arc::new(store), &CacheSettings::default())
}

fn bench_cache_operations(c: &mut Criterion) {
    let rt = Runtime::new().expect("runtime");
    let cache: TtlCache<String> = TtlCache::new("bench", CacheConfig {
        ttl: Duration::from_secs(300),
        max_entries: 1000,
    });

    c.bench_function("ttl_cache_set", |b| {
        let mut counter = 0usize;
        b.to_async(&rt).iter(|| {
            counter += 1;
            let key = format!("user{}", counter % 500);
            let cache = cache.clone();
            async move { cache.set(key, "value".to_string()).await }
        })
    });

    c.bench_function("ttl_cache_get", |b| {
        let mut counter = 0usize;
        b.to_async(&rt).iter(|| {
            counter += 1;
            let key = format!("user{}", counter % 500);
            let cache = cache.clone();
            async move { black_box(cache.get(&key).await) }
        })
    });
}

fn bench_profile_resolution(c: &mut Criterion) {
    let rt = Runtime::new().expect("runtime");
    let mut group = c.benchmark_group("resolve_profiles_warm");

    for batch in [1usize, 10, 50] {
        let components = seeded_components(100);
        let ids: Vec<String> = (0..batch).map(|i| format!("user{}", i)).collect();
        rt.block_on(components.profiles.resolve_profiles(&ids));

        group.bench_with_input(BenchmarkId::from_parameter(batch), &ids, |b, ids| {
            b.to_async(&rt).iter(|| {
                let components = components.clone();
                async move { black_box(components.profiles.resolve_profiles(ids).await) }
            })
        });
    }

    group.finish();
}

fn bench_authorization(c: &mut Criterion) {
    let rt = Runtime::new().expect("runtime");
    let components = seeded_components(10);

    c.bench_function("check_authorization_owner", |b| {
        b.to_async(&rt).iter(|| {
            let components = components.clone();
            async move {
                black_box(components.authorizer.check_authorization("user1", "user1").await)
            }
        })
    });

    c.bench_function("check_authorization_cached_admin", |b| {
        b.to_async(&rt).iter(|| {
            let components = components.clone();
            async move {
                black_box(components.authorizer.check_authorization("user0", "user1").await)
            }
        })
    });
}

criterion_group!(
    benches,
    bench_cache_operations,
    bench_profile_resolution,
    bench_authorization
);
criterion_main!(benches);
