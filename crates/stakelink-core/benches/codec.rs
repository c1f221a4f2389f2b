//! Codec benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use stakelink_core::{
    AccelerationSample, DownlinkCommand, Flag, Frequency, Level, SessionCredentials, UplinkFrame,
};

fn encode_benchmark(c: &mut Criterion) {
    let overall = DownlinkCommand::OverallSetting {
        color: Flag::On,
        frequency: Frequency::Hz60,
        level: Level::L2000,
        manner: Flag::Off,
    };
    let join = DownlinkCommand::JoinMulticastGroup(
        SessionCredentials::from_hex("01020304", &"11".repeat(16), &"22".repeat(16)).unwrap(),
    );

    c.bench_function("encode_overall_setting", |b| {
        b.iter(|| black_box(overall.encode()))
    });
    c.bench_function("encode_join_multicast", |b| {
        b.iter(|| black_box(join.encode()))
    });
}

fn decode_benchmark(c: &mut Criterion) {
    c.bench_function("decode_acceleration_uplink", |b| {
        b.iter(|| {
            let frame = UplinkFrame::from_base64("0102030405060708", "BWQAzv/IAA==").unwrap();
            black_box(AccelerationSample::decode(&frame.payload).unwrap())
        })
    });
}

criterion_group!(benches, encode_benchmark, decode_benchmark);
criterion_main!(benches);
