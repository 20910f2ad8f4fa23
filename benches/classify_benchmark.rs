use criterion::{Criterion, black_box, criterion_group, criterion_main};
use browser_qa::EnvironmentMarkers;
use browser_qa::harness::{Evidence, classify};

fn benchmark_classify(c: &mut Criterion) {
    let markers = EnvironmentMarkers::defaults();
    let console: Vec<String> = (0..10_000)
        .map(|i| format!("[engine] frame {} rendered in 16ms", i))
        .collect();
    let body_text = "Loading objective flow... ".repeat(40);

    c.bench_function("classify_no_marker_10k_console_lines", |b| {
        b.iter(|| {
            let verdict = classify(
                black_box(&Evidence {
                    payload: None,
                    error: Some("Timeout 45000ms exceeded while waiting for readiness signal"),
                    body_text: &body_text,
                    console_lines: &console,
                }),
                black_box(&markers),
            );
            assert!(!verdict.ok);
        })
    });
}

criterion_group!(benches, benchmark_classify);
criterion_main!(benches);
