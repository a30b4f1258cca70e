use criterion::{Criterion, criterion_group, criterion_main};
use msntp::codec::{decode_response, encode_request, write_timestamp};
use msntp::{
    NTP_PACKET_SIZE, RECEIVE_TIME_OFFSET, TRANSMIT_TIME_OFFSET, TransactionRecord,
    process_response,
};
use std::hint::black_box;

const T: i64 = 1_700_000_000_000;

fn response() -> [u8; NTP_PACKET_SIZE] {
    let mut buf = encode_request(T).0;
    buf[0] = 0x1c;
    write_timestamp(&mut buf, RECEIVE_TIME_OFFSET, T + 10);
    write_timestamp(&mut buf, TRANSMIT_TIME_OFFSET, T + 15);
    buf
}

fn criterion_benchmark(c: &mut Criterion) {
    let packet = response();
    let record = TransactionRecord {
        request_time: T,
        request_tick: 1_000,
        response_tick: 1_040,
        ..TransactionRecord::default()
    };

    c.bench_function("encode_request", |b| {
        b.iter(|| black_box(encode_request(black_box(T))));
    });
    c.bench_function("decode_response", |b| {
        b.iter(|| black_box(decode_response(black_box(&packet))));
    });
    c.bench_function("process_response", |b| {
        let timestamps = decode_response(&packet).unwrap();
        b.iter(|| black_box(process_response(black_box(record), black_box(timestamps))));
    });
}

criterion_group!(codec_benches, criterion_benchmark);
criterion_main!(codec_benches);
