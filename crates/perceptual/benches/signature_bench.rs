use canonical::CanonicalText;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use perceptual::{compute_signature, PerceptualConfig};

fn bench_signature(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_signature");
    let text = CanonicalText::new(&"the water cycle moves water between oceans and sky ".repeat(40));
    group.throughput(Throughput::Bytes(text.len() as u64));

    for num_hashes in [64usize, 128, 256] {
        for parallel in [false, true] {
            let cfg = PerceptualConfig::new()
                .with_num_hashes(num_hashes)
                .with_parallel(parallel);
            let id = BenchmarkId::new(if parallel { "parallel" } else { "sequential" }, num_hashes);
            group.bench_with_input(id, &cfg, |b, cfg| {
                b.iter(|| compute_signature(black_box(&text), cfg))
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_signature);
criterion_main!(benches);
