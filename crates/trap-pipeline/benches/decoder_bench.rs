//! 트랩 디코더/워커 벤치마크

use std::sync::Arc;

use bytes::Bytes;
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use mibtrap_mib_catalog::MibCatalog;
use mibtrap_trap_pipeline::decoder::encode;
use mibtrap_trap_pipeline::worker::{PipelineStats, TrapContext, process_datagram};
use mibtrap_trap_pipeline::{
    NoopResolver, Oid, PduType, SinkSet, SnmpDecoder, TrapDecoder, V1Trap, V2Trap, Value, VarBind,
};

const MIB: &str = include_str!("../../mib-catalog/tests/fixtures/contoso-board.mib");

fn varbinds(count: u32) -> Vec<VarBind> {
    (0..count)
        .map(|i| {
            VarBind::new(
                Oid::new(vec![1, 3, 6, 1, 4, 1, 55011, 1, i, 0]),
                Value::OctetString(Bytes::from(format!("sensor-{i}"))),
            )
        })
        .collect()
}

fn v1_datagram(bindings: u32) -> Vec<u8> {
    encode::v1_trap(&V1Trap {
        community: "public".to_owned(),
        enterprise: "1.3.6.1.4.1.55011.2".parse().unwrap(),
        agent_addr: "10.0.0.1".parse().unwrap(),
        generic: 6,
        specific: 2,
        timestamp: 123_456,
        varbinds: varbinds(bindings),
    })
}

fn bench_decode(c: &mut Criterion) {
    let decoder = SnmpDecoder::new();

    let mut group = c.benchmark_group("decode_v1");
    for bindings in [1u32, 10, 50] {
        let datagram = v1_datagram(bindings);
        group.throughput(Throughput::Bytes(datagram.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(bindings),
            &datagram,
            |b, datagram| b.iter(|| decoder.decode_v1(black_box(datagram)).unwrap()),
        );
    }
    group.finish();

    let v2 = encode::v2_pdu(&V2Trap {
        community: "public".to_owned(),
        pdu_type: PduType::V2Trap,
        request_id: 1,
        error_status: 0,
        error_index: 0,
        varbinds: varbinds(10),
    });
    c.bench_function("decode_v2_10_bindings", |b| {
        b.iter(|| decoder.decode_v2(black_box(&v2)).unwrap())
    });
}

fn bench_process(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let ctx = TrapContext {
        catalog: Arc::new(MibCatalog::parse(MIB).unwrap()),
        decoder: Arc::new(SnmpDecoder::new()),
        resolver: Arc::new(NoopResolver),
        sinks: SinkSet::new(),
        stats: Arc::new(PipelineStats::default()),
    };
    let datagram = Bytes::from(v1_datagram(10));
    let source = "10.0.0.1:162".parse().unwrap();

    c.bench_function("process_v1_datagram", |b| {
        b.iter(|| {
            runtime
                .block_on(process_datagram(&ctx, datagram.clone(), source))
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_decode, bench_process);
criterion_main!(benches);
