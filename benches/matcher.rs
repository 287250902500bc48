use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pedal_macro::model::{Action, ActionFilter, ButtonEvent};
use test_helpers::{down, elem, matcher, tap_sequence, up};

fn bench_ingest_single_tap(c: &mut Criterion) {
    c.bench_function("matcher::ingest_tap", |b| {
        b.iter(|| {
            let mut m = matcher(vec![test_helpers::rule(tap_sequence(1), "true")]);
            black_box(m.ingest(down(1, 0)));
            black_box(m.ingest(up(1, 10)));
        })
    });
}

fn bench_ingest_no_match(c: &mut Criterion) {
    c.bench_function("matcher::ingest_no_match", |b| {
        b.iter(|| {
            let mut m = matcher(vec![test_helpers::rule(tap_sequence(1), "true")]);
            for t in 0..100u64 {
                black_box(m.ingest(ButtonEvent {
                    button: 2,
                    action: if t % 2 == 0 { Action::Down } else { Action::Up },
                    t: t * 1000,
                }));
            }
        })
    });
}

fn bench_ingest_many_rules(c: &mut Criterion) {
    let rules: Vec<_> = (0..64)
        .map(|i| test_helpers::rule(vec![elem(i, ActionFilter::DownOnly, None)], "true"))
        .collect();

    c.bench_function("matcher::ingest_many_rules", |b| {
        b.iter(|| {
            let mut m = matcher(rules.clone());
            for t in 0..64u32 {
                black_box(m.ingest(down(t, t as u64 * 1000)));
            }
        })
    });
}

criterion_group!(
    benches,
    bench_ingest_single_tap,
    bench_ingest_no_match,
    bench_ingest_many_rules
);
criterion_main!(benches);
