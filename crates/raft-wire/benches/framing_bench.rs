//! Performance benchmarks for message framing
//!
//! Measures send, receive and round trip of bincode-encoded Raft messages
//! over the in-memory pipe, so only framing and codec cost is counted.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use raft_wire::{
    AppendEntriesRequest, BincodeCodec, FrameReader, FrameWriter, LogEntry, NoopSink, RaftMessage,
    pipe,
};

fn append_with_payload(size: usize) -> RaftMessage {
    RaftMessage::AppendEntriesRequest(AppendEntriesRequest {
        term: 1,
        prev_log_index: 0,
        prev_log_term: 0,
        commit_index: 0,
        leader_id: "leader".to_string(),
        log_entries: vec![LogEntry {
            index: 1,
            term: 1,
            command_name: "x".repeat(size),
        }],
    })
}

fn bench_send(c: &mut Criterion) {
    let (mut left, mut right) = pipe::pair();
    let writer = FrameWriter::new(BincodeCodec::<RaftMessage>::new()).with_sink(NoopSink);
    let reader = FrameReader::new(BincodeCodec::<RaftMessage>::new()).with_sink(NoopSink);
    let msg = append_with_payload(1024);

    c.bench_function("send_1kb", |b| {
        b.iter(|| {
            writer.send(&mut left, black_box(&msg)).unwrap();
            // Drain so the pipe buffer does not grow across iterations
            reader.receive(&mut right).unwrap()
        });
    });
}

fn bench_round_trip_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("round_trip");

    for size in [64, 1024, 100 * 1024] {
        let (mut left, mut right) = pipe::pair();
        let writer = FrameWriter::new(BincodeCodec::<RaftMessage>::new()).with_sink(NoopSink);
        let reader = FrameReader::new(BincodeCodec::<RaftMessage>::new()).with_sink(NoopSink);
        let msg = append_with_payload(size);

        group.bench_with_input(BenchmarkId::from_parameter(size), &msg, |b, msg| {
            b.iter(|| {
                writer.send(&mut left, msg).unwrap();
                reader.receive(&mut right).unwrap()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_send, bench_round_trip_sizes);
criterion_main!(benches);
