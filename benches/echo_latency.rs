use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use netdog::EchoClient;
use netdog::common::{connect_test_client, create_controlled_test_server_with_limit};
use tokio::runtime::Runtime;

fn bench_round_trip(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    // One server and one connection for the whole group; only round trips are measured
    let (server_handle, mut client) = rt.block_on(async {
        let (server_handle, addr) = create_controlled_test_server_with_limit(10).await.unwrap();
        let client = connect_test_client(addr).await.unwrap();
        (server_handle, client)
    });

    let mut group = c.benchmark_group("quic_round_trip");

    for size in [6, 256, 1024, 4096, 16384] {
        let data = vec![b'x'; size];
        // Warm the stream up the same way a client run does
        rt.block_on(client.echo(&data)).unwrap();

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("echo", size), &data, |b, data| {
            b.iter(|| {
                let response = rt.block_on(client.echo(black_box(data))).unwrap();
                assert_eq!(response.len(), data.len());
            });
        });
    }

    group.finish();

    rt.block_on(client.close());
    server_handle.abort();
}

fn bench_run(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    c.bench_function("client_run_10", |b| {
        b.iter(|| {
            rt.block_on(async {
                let (server_handle, addr) = create_controlled_test_server_with_limit(10).await.unwrap();
                let mut client = connect_test_client(addr).await.unwrap();
                let report = client.run(black_box(b"foobar".to_vec()), 10).await.unwrap();
                client.close().await;
                server_handle.abort();
                report
            })
        });
    });
}

criterion_group!(benches, bench_round_trip, bench_run);
criterion_main!(benches);
