use chrono::{TimeZone, Utc};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use eventstore::prelude::*;
use serde_json::{Map, json};

fn event(i: i64) -> Event {
    let ts = Utc.timestamp_opt(1_700_000_000 + i, 0).unwrap();
    Event::with_json_details(ts, "audioBait", &json!({"fileId": format!("file{i}"), "volume": "2"}))
        .unwrap()
}

fn legacy_payload(i: i64) -> Vec<u8> {
    let mut details = Map::new();
    details.insert("fileId".into(), json!(format!("file{i}")));
    LegacyEvent::new("audioBait", details).to_bytes().unwrap()
}

fn bench_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("event_add");

    for size in [100i64, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("add", size), size, |b, &size| {
            b.iter(|| {
                let temp_dir = tempfile::TempDir::new().unwrap();
                let store = EventStore::open(temp_dir.path().join("bench.redb")).unwrap();
                for i in 0..size {
                    store.add(&event(i)).unwrap();
                }
                black_box(store.len().unwrap());
            });
        });
    }

    group.finish();
}

fn bench_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("event_drain");

    for size in [100i64, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("get_then_delete", size), size, |b, &size| {
            b.iter(|| {
                let temp_dir = tempfile::TempDir::new().unwrap();
                let store = EventStore::open(temp_dir.path().join("bench.redb")).unwrap();
                for i in 0..size {
                    store.add(&event(i)).unwrap();
                }
                for key in store.get_keys().unwrap() {
                    black_box(store.get(&key).unwrap());
                    store.delete(&key).unwrap();
                }
            });
        });
    }

    group.finish();
}

fn bench_migration(c: &mut Criterion) {
    let mut group = c.benchmark_group("legacy_migration");

    for size in [100i64, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("reopen", size), size, |b, &size| {
            b.iter(|| {
                let temp_dir = tempfile::TempDir::new().unwrap();
                let path = temp_dir.path().join("bench.redb");
                let store = EventStore::open(&path).unwrap();
                for i in 0..size {
                    let ts = Utc.timestamp_opt(1_700_000_000 + i, 0).unwrap();
                    store.queue(&legacy_payload(i), ts).unwrap();
                }
                store.close().unwrap();

                let store = EventStore::open(&path).unwrap();
                black_box(store.last_migration().records_migrated);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_add, bench_drain, bench_migration);
criterion_main!(benches);
