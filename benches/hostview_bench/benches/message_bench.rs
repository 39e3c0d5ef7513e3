//! WebSocket message benchmarks
//!
//! Covers handshake key derivation, JSON payloads and conversion to and from
//! tungstenite frames.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use hostview_ws::hyper_host::generate_accept_key;
use hostview_ws::Message;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
struct ChatEvent {
    room: String,
    author: String,
    body: String,
    seq: u64,
}

fn event() -> ChatEvent {
    ChatEvent {
        room: "general".into(),
        author: "ada".into(),
        body: "the analytical engine weaves algebraic patterns".into(),
        seq: 42,
    }
}

fn bench_handshake(c: &mut Criterion) {
    c.bench_function("accept_key", |b| {
        b.iter(|| generate_accept_key(black_box("dGhlIHNhbXBsZSBub25jZQ==")))
    });
}

fn bench_json(c: &mut Criterion) {
    let mut group = c.benchmark_group("json_message");

    group.bench_function("encode", |b| {
        let event = event();
        b.iter(|| Message::json(black_box(&event)).ok())
    });

    group.bench_function("decode", |b| {
        let msg = Message::json(&event()).unwrap_or_else(|_| Message::text("{}"));
        b.iter(|| black_box(&msg).to_json::<ChatEvent>().ok())
    });

    group.finish();
}

fn bench_conversion(c: &mut Criterion) {
    let mut group = c.benchmark_group("tungstenite_conversion");

    for size in [64usize, 1024, 16 * 1024] {
        let payload = vec![0xA5u8; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("binary", size), &payload, |b, payload| {
            b.iter(|| {
                let wire: tungstenite::Message = Message::binary(payload.clone()).into();
                Message::from(wire)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_handshake, bench_json, bench_conversion);
criterion_main!(benches);
