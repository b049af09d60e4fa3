use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use RustedFormulaPlot::numerical::sampler::{Domain, sample};
use RustedFormulaPlot::numerical::simpson::integrate;
use RustedFormulaPlot::symbolic::evaluator::Evaluator;

fn bench_integrate(c: &mut Criterion) {
    let f = match Evaluator::new().compile("exp(-x^2) * sin(3x) + 1/x") {
        Ok(f) => f,
        Err(err) => panic!("{}", err),
    };
    c.bench_function("simpson 1000 segments", |b| {
        b.iter(|| integrate(&f, black_box(-2.0), black_box(3.0), 1000))
    });
}

fn bench_sample(c: &mut Criterion) {
    let f = match Evaluator::new().compile("sin(x) + 0.5 * x") {
        Ok(f) => f,
        Err(err) => panic!("{}", err),
    };
    let domain = Domain::new(-10.0, 10.0, 2000);
    c.bench_function("sample 2000 points", |b| b.iter(|| sample(&f, black_box(&domain))));
}

criterion_group!(benches, bench_integrate, bench_sample);
criterion_main!(benches);
