//! Notification dispatch benchmark suite.
//!
//! Measures the cost of the emitter every socket and transport raises its
//! notifications through:
//! - Dispatch to 1, 10, 100 durable listeners
//! - One-shot registration followed by dispatch
//! - Register/remove churn
//!
//! Run with: cargo bench --bench emitter
//! Results saved to: target/criterion/

use std::hint::black_box;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use engine_socket::{Emitter, Packet, TransportEvent, TransportEventKind};

// ============================================================================
// Benchmark Parameters
// ============================================================================

const LISTENER_COUNTS: &[usize] = &[1, 10, 100];

// ============================================================================
// Benchmark: Dispatch
// ============================================================================

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("emit");
    let event = TransportEvent::Packet(Packet::message("payload"));

    for &count in LISTENER_COUNTS {
        let emitter = Emitter::<TransportEvent>::new();
        let hits = Arc::new(AtomicUsize::new(0));
        for _ in 0..count {
            let hits = Arc::clone(&hits);
            emitter.on(TransportEventKind::Packet, move |_| {
                hits.fetch_add(1, Ordering::Relaxed);
            });
        }

        group.bench_with_input(BenchmarkId::new("durable", count), &count, |b, _| {
            b.iter(|| black_box(emitter.emit(black_box(&event))));
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: One-shot
// ============================================================================

fn bench_once(c: &mut Criterion) {
    let emitter = Emitter::<TransportEvent>::new();

    c.bench_function("once_then_emit", |b| {
        b.iter(|| {
            emitter.once(TransportEventKind::Drain, |_| {});
            black_box(emitter.emit(&TransportEvent::Drain))
        });
    });
}

// ============================================================================
// Benchmark: Registration Churn
// ============================================================================

fn bench_churn(c: &mut Criterion) {
    let emitter: Emitter<TransportEvent> = Emitter::new();

    c.bench_function("on_off", |b| {
        b.iter(|| {
            let id = emitter.on(TransportEventKind::Error, |_| {});
            black_box(emitter.off(id))
        });
    });
}

criterion_group!(benches, bench_dispatch, bench_once, bench_churn);
criterion_main!(benches);
