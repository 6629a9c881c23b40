use std::collections::BTreeMap;

use chrono::{TimeZone, Utc};
use common::Money;
use criterion::{Criterion, criterion_group, criterion_main};
use inventory::{Batch, BatchId, BatchItem, Fabric, FabricId, InventoryAllocator, SaleLine};
use store::{InMemoryLockService, InMemoryStore, Store};

fn make_fabric(batch_count: u32, per_batch: f64) -> Fabric {
    let batches: BTreeMap<BatchId, Batch> = (0..batch_count)
        .map(|n| {
            (
                BatchId::new(format!("k{n:08}")),
                Batch {
                    items: vec![BatchItem::new("Black", per_batch)],
                    purchase_date: Utc
                        .with_ymd_and_hms(2024, 1, 1 + (n % 27), 0, 0, 0)
                        .unwrap(),
                    unit_cost: Money::from_cents(1250),
                    supplier: "Bench Supplier".to_string(),
                    created_at: Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
                },
            )
        })
        .collect();

    Fabric {
        name: "Linen".to_string(),
        category: "Natural".to_string(),
        unit: "m".to_string(),
        batches,
    }
}

fn bench_fifo_candidates(c: &mut Criterion) {
    let fabric = make_fabric(100, 10.0);

    c.bench_function("inventory/fifo_candidates_100_batches", |b| {
        b.iter(|| fabric.fifo_candidates("Black"));
    });
}

fn bench_reduce_single_batch(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("inventory/reduce_single_batch", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryStore::new();
                let locks = InMemoryLockService::new();
                let fabric_id = FabricId::new();
                store
                    .set(
                        &format!("fabrics/{fabric_id}"),
                        serde_json::to_value(make_fabric(1, 100.0)).unwrap(),
                    )
                    .await
                    .unwrap();

                let allocator = InventoryAllocator::new(store, locks);
                allocator
                    .reduce_inventory(&[SaleLine::new(fabric_id, "Black", 10.0)])
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_reduce_across_batches(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("inventory/reduce_across_20_batches", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryStore::new();
                let locks = InMemoryLockService::new();
                let fabric_id = FabricId::new();
                store
                    .set(
                        &format!("fabrics/{fabric_id}"),
                        serde_json::to_value(make_fabric(20, 5.0)).unwrap(),
                    )
                    .await
                    .unwrap();

                let allocator = InventoryAllocator::new(store, locks);
                allocator
                    .reduce_inventory(&[SaleLine::new(fabric_id, "Black", 90.0)])
                    .await
                    .unwrap();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_fifo_candidates,
    bench_reduce_single_batch,
    bench_reduce_across_batches
);
criterion_main!(benches);
