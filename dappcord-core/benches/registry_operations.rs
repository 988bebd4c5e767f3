use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use dappcord_core::core_registry::{AccessRegistry, Address, Amount, ChannelId, InMemoryLedger};
use std::time::Duration;

fn owner() -> Address {
    Address::from_bytes([0xDC; 20])
}

fn holder(i: u32) -> Address {
    let mut bytes = [0u8; 20];
    bytes[..4].copy_from_slice(&i.to_be_bytes());
    bytes[19] = 1;
    Address::from_bytes(bytes)
}

fn registry_with_channels(count: u64) -> AccessRegistry {
    let mut registry = AccessRegistry::new("Dappcord", "DC", owner()).unwrap();
    for i in 0..count {
        registry
            .create_channel(&owner(), format!("channel-{}", i), Amount::from_tokens(1))
            .unwrap();
    }
    registry
}

fn bench_create_channel(c: &mut Criterion) {
    let mut group = c.benchmark_group("create_channel");
    group.measurement_time(Duration::from_secs(5));

    for count in [10u64, 100, 1_000] {
        group.throughput(Throughput::Elements(count));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| black_box(registry_with_channels(count)));
        });
    }

    group.finish();
}

fn bench_mint(c: &mut Criterion) {
    let mut group = c.benchmark_group("mint");
    group.measurement_time(Duration::from_secs(5));

    for members in [100u32, 1_000, 10_000] {
        group.throughput(Throughput::Elements(members as u64));
        group.bench_with_input(BenchmarkId::from_parameter(members), &members, |b, &members| {
            b.iter(|| {
                let mut registry = registry_with_channels(1);
                for i in 0..members {
                    registry
                        .mint(&holder(i), ChannelId(1), Amount::from_tokens(1))
                        .unwrap();
                }
                black_box(registry.total_supply())
            });
        });
    }

    group.finish();
}

fn bench_has_joined(c: &mut Criterion) {
    let mut registry = registry_with_channels(10);
    for i in 0..10_000u32 {
        let channel = ChannelId(u64::from(i % 10) + 1);
        registry
            .mint(&holder(i), channel, Amount::from_tokens(1))
            .unwrap();
    }

    c.bench_function("has_joined_10k", |b| {
        let mut i = 0u32;
        b.iter(|| {
            i = (i + 1) % 10_000;
            black_box(registry.has_joined(ChannelId(u64::from(i % 10) + 1), &holder(i)))
        });
    });
}

fn bench_withdraw(c: &mut Criterion) {
    c.bench_function("mint_then_withdraw", |b| {
        let ledger = InMemoryLedger::new();
        b.iter(|| {
            let mut registry = registry_with_channels(1);
            registry
                .mint(&holder(1), ChannelId(1), Amount::from_tokens(1))
                .unwrap();
            black_box(registry.withdraw(&owner(), &ledger).unwrap())
        });
    });
}

criterion_group!(
    benches,
    bench_create_channel,
    bench_mint,
    bench_has_joined,
    bench_withdraw
);
criterion_main!(benches);
