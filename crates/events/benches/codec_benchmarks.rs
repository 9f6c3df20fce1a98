use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use courier_events::{
    BinaryCodec, Binding, CloudEvent, Codec, CodecConfig, ContentMode, ReceivedMessage,
    StructuredCodec, Uri,
};

fn sample_event(payload_bytes: usize) -> CloudEvent {
    let body = format!(r#"{{"blob":"{}"}}"#, "x".repeat(payload_bytes));
    let mut event = CloudEvent::with_binding(Binding::Default)
        .with_source(Uri::parse("https://bench.example/source").unwrap())
        .with_type("bench.event")
        .with_subject("bench/1")
        .with_data(body);
    event.set_attribute("correlationid", "bench-correlation").unwrap();
    event.set_attribute("partitionkey", "bench-partition").unwrap();
    // Pin lazy defaults so every iteration encodes the same envelope.
    let _ = (event.id(), event.time());
    event
}

fn bench_binary_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("binary_codec");

    for binding in Binding::ALL {
        let codec = BinaryCodec::new(binding);
        let event = sample_event(256);
        let message = ReceivedMessage::from(codec.encode(&event));

        group.bench_with_input(BenchmarkId::new("encode", binding), &event, |b, event| {
            b.iter(|| black_box(codec.encode(black_box(event))));
        });
        group.bench_with_input(BenchmarkId::new("decode", binding), &message, |b, message| {
            b.iter(|| black_box(codec.decode(black_box(message)).unwrap()));
        });
    }

    group.finish();
}

fn bench_structured_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("structured_codec");
    let codec = StructuredCodec::new(Binding::Default);

    for payload_bytes in [0usize, 1_024, 16_384].iter() {
        let event = sample_event(*payload_bytes);
        let json = codec.encode(&event).unwrap();
        group.throughput(Throughput::Bytes(json.len() as u64));

        group.bench_with_input(BenchmarkId::new("encode", payload_bytes), &event, |b, event| {
            b.iter(|| black_box(codec.encode(black_box(event)).unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("decode", payload_bytes), &json, |b, json| {
            b.iter(|| black_box(codec.decode(black_box(json)).unwrap()));
        });
    }

    group.finish();
}

fn bench_kafka_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("kafka_round_trip");
    group.sample_size(500);

    for mode in [ContentMode::Binary, ContentMode::Structured] {
        let codec = Codec::new(CodecConfig::default().with_binding(Binding::Kafka).with_mode(mode));
        let event = sample_event(256);

        group.bench_function(mode.to_string(), |b| {
            b.iter(|| {
                let message = codec.encode(black_box(&event)).unwrap();
                black_box(codec.decode(ReceivedMessage::from(message)).unwrap())
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_binary_codec,
    bench_structured_codec,
    bench_kafka_round_trip
);
criterion_main!(benches);
