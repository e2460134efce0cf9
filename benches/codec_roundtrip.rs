use cas_graph::types::builtin::{ANNOTATION, INITIAL_VIEW_NAME, STRING};
use cas_graph::{Cas, JsonCasCodec, Span, TypeSystem};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;

fn build_graph(tokens: i32) -> Cas {
    let mut ts = TypeSystem::new();
    let token = ts.add_type("bench.Token", ANNOTATION).unwrap();
    ts.add_feature(token, "pos", STRING).unwrap();
    ts.add_feature(token, "next", token).unwrap();
    ts.commit().unwrap();

    let mut cas = Cas::new(Arc::new(ts)).unwrap();
    cas.set_document_text(INITIAL_VIEW_NAME, &"word ".repeat(tokens as usize)).unwrap();
    let mut previous = None;
    for i in 0..tokens {
        let id = cas.create_instance(token).unwrap();
        cas.set_span(id, Span::new(i * 5, i * 5 + 4)).unwrap();
        cas.set_value(id, "pos", "NN").unwrap();
        cas.add_to_indexes(id, INITIAL_VIEW_NAME).unwrap();
        if let Some(prev) = previous {
            cas.set_value(prev, "next", id).unwrap();
        }
        previous = Some(id);
    }
    cas
}

fn codec_roundtrip(c: &mut Criterion) {
    let cas = build_graph(5_000);
    let codec = JsonCasCodec::default();
    let payload = codec.serialize(&cas).unwrap();

    c.bench_function("serialize_5k_tokens", |b| {
        b.iter(|| black_box(codec.serialize(&cas).unwrap().len()))
    });
    c.bench_function("deserialize_5k_tokens", |b| {
        b.iter(|| {
            let mut target = cas.new_instance();
            codec.deserialize(&mut target, &payload).unwrap();
            black_box(target.len())
        })
    });
}

criterion_group!(benches, codec_roundtrip);
criterion_main!(benches);
