use RustedShooting::Examples::shooting_examples::ShootingExample;
use RustedShooting::numerical::ShootingBVP::RK4_fixed::{Direction, rk4_ivp_solver};
use RustedShooting::numerical::ShootingBVP::Shooting_simple::State2;
use criterion::{Criterion, criterion_group, criterion_main};
use nalgebra::DVector;
use std::hint::black_box;

fn bench_slope_squared(c: &mut Criterion) {
    let task = ShootingExample::SlopeSquared;
    c.bench_function("shooting u'' = -(u')^2/u", |b| {
        b.iter(|| task.solver().solve(black_box(&task.problem())))
    });
}

fn bench_all_examples(c: &mut Criterion) {
    let mut group = c.benchmark_group("Shooting examples");
    for task in [
        ShootingExample::HyperbolicSine,
        ShootingExample::ExponentialNeumann,
        ShootingExample::HarmonicOscillator,
        ShootingExample::LinearNeumannDirichlet,
    ] {
        group.bench_function(task.to_string(), |b| b.iter(|| task.solve()));
    }
    group.finish();
}

fn bench_rk4(c: &mut Criterion) {
    let f = |_x: f64, y: &State2, _p: &DVector<f64>| -> State2 { State2::new(y[1], -y[0]) };
    let params = DVector::zeros(0);
    c.bench_function("RK4 harmonic, 1000 steps", |b| {
        b.iter(|| {
            rk4_ivp_solver(
                f,
                black_box(State2::new(1.0, 0.0)),
                0.0,
                10.0,
                0.01,
                &params,
                Direction::Forward,
            )
        })
    });
}

criterion_group!(benches, bench_slope_squared, bench_all_examples, bench_rk4);
criterion_main!(benches);
