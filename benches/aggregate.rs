use criterion::{black_box, criterion_group, criterion_main, Criterion};

use splicing_outlier::models::encode_dna;
use splicing_outlier::result::SplicingOutlierResult;

fn predictions(n_rows: usize) -> String {
    let mut data = String::from(
        "variant,junction,event_type,Chromosome,Start,End,Strand,splice_site,gene_id,samples,ref_psi,delta_logit_psi,delta_psi\n",
    );
    for i in 0..n_rows {
        let start = 1000 + (i % 50) * 100;
        data.push_str(&format!(
            "1:{}:A>G,1:{}-{}:+,psi5,1,{},{},+,1:{}:+,G{},S{};S{},0.5,{},{}\n",
            start + i % 7,
            start,
            start + 500,
            start,
            start + 500,
            start,
            i % 20,
            i % 30,
            (i + 1) % 30,
            (i % 11) as f64 / 10.0 - 0.5,
            (i % 13) as f64 / 30.0 - 0.2,
        ));
    }
    data
}

fn aggregate(data: &[u8]) {
    let result = SplicingOutlierResult::from_reader(data).unwrap();
    assert!(!result.gene().is_empty());
    assert!(!result.splice_site().is_empty());
}

fn aggregate_bench(c: &mut Criterion) {
    c.bench_function("aggregate 5000 predictions", |b| {
        let data = predictions(5000);
        b.iter(|| aggregate(black_box(data.as_bytes())))
    });
}

fn encode_bench(c: &mut Criterion) {
    c.bench_function("one-hot encode 200bp", |b| {
        let seq = "ACGTN".repeat(40);
        b.iter(|| encode_dna(black_box(&seq)))
    });
}

criterion_group!(aggregate_benches, aggregate_bench, encode_bench);
criterion_main!(aggregate_benches);
