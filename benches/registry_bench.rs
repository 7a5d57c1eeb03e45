//! Criterion benchmark untuk registry lookup dan envelope codec
//!
//! Run dengan: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use worker_wire::protocol::{Decoder, Encoder};
use worker_wire::registry::{self, MessageKind, Registry};

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry");
    group.throughput(Throughput::Elements(1));

    // Paksa init sebelum diukur
    registry::init().unwrap();

    group.bench_function("kind_of_hit", |b| {
        b.iter(|| registry::kind_of(black_box(5)));
    });

    group.bench_function("kind_of_miss", |b| {
        b.iter(|| registry::kind_of(black_box(99)));
    });

    group.bench_function("code_of", |b| {
        b.iter(|| registry::code_of(black_box(MessageKind::GetShape)));
    });

    group.bench_function("build_reference", |b| {
        b.iter(|| Registry::build(black_box(MessageKind::reference_table())));
    });

    group.finish();
}

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("envelope");
    let payload = [0u8; 64];

    for batch_size in [10usize, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*batch_size as u64));

        let mut encoder = Encoder::new(batch_size * 128);
        group.bench_function(format!("encode_{}", batch_size), |b| {
            b.iter(|| {
                encoder.reset();
                for i in 0..*batch_size {
                    let _ = encoder.encode(MessageKind::Object, black_box(i as u64), &payload);
                }
            });
        });

        let bytes = encoder.as_bytes().to_vec();
        group.bench_function(format!("decode_{}", batch_size), |b| {
            b.iter(|| {
                let mut decoder = Decoder::new(black_box(&bytes));
                while let Ok(Some(envelope)) = decoder.next_frame() {
                    black_box(envelope.kind);
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_lookup, bench_codec);
criterion_main!(benches);
