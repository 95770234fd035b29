use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fieldmind::{MemoryConfig, MemoryStore, TermVectorizer};

fn seeded_store(entries: usize) -> MemoryStore {
    let store = MemoryStore::new(MemoryConfig::in_memory()).unwrap();
    let topics = ["garden", "music", "weather", "cooking", "travel"];
    for i in 0..entries {
        let topic = topics[i % topics.len()];
        store
            .store_memory(
                &format!("note {} about {} and related {} ideas", i, topic, topic),
                topic,
                0.5,
                vec![],
            )
            .unwrap();
    }
    store
}

fn bench_store_memory(c: &mut Criterion) {
    let store = MemoryStore::new(MemoryConfig::in_memory()).unwrap();
    let mut i = 0u64;
    c.bench_function("store_memory", |b| {
        b.iter(|| {
            i += 1;
            store
                .store_memory(
                    black_box(&format!("benchmark entry {} about various topics", i)),
                    "bench",
                    0.5,
                    vec![],
                )
                .unwrap()
        })
    });
}

fn bench_recall(c: &mut Criterion) {
    let store = seeded_store(500);
    c.bench_function("recall_memories_500", |b| {
        b.iter(|| {
            store
                .recall_memories(black_box("ideas about the garden"), 5, 0.0)
                .unwrap()
        })
    });
}

fn bench_consolidation(c: &mut Criterion) {
    c.bench_function("consolidate_200", |b| {
        b.iter_with_setup(
            || seeded_store(200),
            |store| store.consolidate_memories(black_box(0.8)).unwrap(),
        )
    });
}

fn bench_tfidf(c: &mut Criterion) {
    let corpus: Vec<String> = (0..300)
        .map(|i| format!("document number {} mentions topic {} repeatedly", i, i % 20))
        .collect();
    c.bench_function("tfidf_fit_transform_300", |b| {
        b.iter(|| {
            let mut v = TermVectorizer::new();
            v.fit_transform(black_box(&corpus)).unwrap()
        })
    });
}

criterion_group!(
    benches,
    bench_store_memory,
    bench_recall,
    bench_consolidation,
    bench_tfidf
);
criterion_main!(benches);
