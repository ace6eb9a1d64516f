use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use geoprep_3d::{io::ply, pointcloud::PointCloud, sampling::PointCloudSampler};

fn make_pointcloud(num_points: usize) -> PointCloud {
    let points = (0..num_points)
        .map(|i| [i as f64, (i % 7) as f64, (i % 13) as f64])
        .collect();
    let colors = (0..num_points).map(|i| [(i % 256) as u8, 0, 0]).collect();
    PointCloud::new(points, Some(colors), None)
}

fn bench_sampling(c: &mut Criterion) {
    let mut group = c.benchmark_group("sample_pointcloud");

    for num_points in [200_000, 1_000_000, 5_000_000].iter() {
        group.throughput(criterion::Throughput::Elements(*num_points as u64));
        let parameter_string = format!("{}", num_points);
        let pointcloud = make_pointcloud(*num_points);
        let sampler = PointCloudSampler::new(100_000)
            .expect("valid target")
            .with_seed(0);

        group.bench_with_input(
            BenchmarkId::new("uniform_without_replacement", &parameter_string),
            &pointcloud,
            |b, pointcloud| {
                b.iter(|| black_box(sampler.sample(pointcloud)));
            },
        );
    }
    group.finish();
}

fn bench_ply_roundtrip(c: &mut Criterion) {
    let mut group = c.benchmark_group("ply_binary");
    let pointcloud = make_pointcloud(100_000);

    let mut buffer = Vec::new();
    ply::write_ply_to_writer(&mut buffer, &pointcloud).expect("write ply");

    group.bench_function("write_100k", |b| {
        b.iter(|| {
            let mut out = Vec::with_capacity(buffer.len());
            ply::write_ply_to_writer(&mut out, &pointcloud).expect("write ply");
            black_box(out);
        });
    });

    group.bench_function("read_100k", |b| {
        b.iter(|| {
            let mut reader = std::io::BufReader::new(buffer.as_slice());
            black_box(ply::read_ply_from_reader(&mut reader).expect("read ply"));
        });
    });
    group.finish();
}

criterion_group!(benches, bench_sampling, bench_ply_roundtrip);
criterion_main!(benches);
