// Copyright (c)  by Gleb E. Zaslavkiy
//MIT License
use crate::Utils::convergence_table::print_convergence_table;
use crate::numerical::ShootingBVP::Shooting_error::ShootingError;
use crate::numerical::ShootingBVP::Shooting_simple::{
    BoundaryCondition, BoundaryValueProblem, ShootingMethodSolver, ShootingOutcome,
    ShootingReport, State2,
};
use nalgebra::DVector;
use simplelog::LevelFilter;
use std::f64::consts::FRAC_PI_2;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

pub type Rhs = fn(f64, &State2, &DVector<f64>) -> State2;

// u'' = -(u')^2/u
fn slope_squared(_x: f64, y: &State2, _p: &DVector<f64>) -> State2 {
    State2::new(y[1], -y[1] * y[1] / y[0])
}

// y'' = y
fn hyperbolic(_x: f64, y: &State2, _p: &DVector<f64>) -> State2 {
    State2::new(y[1], y[0])
}

// y'' = -omega^2 y, omega = p[0]
fn harmonic(_x: f64, y: &State2, p: &DVector<f64>) -> State2 {
    State2::new(y[1], -p[0] * p[0] * y[0])
}

// y'' = 0
fn linear(_x: f64, y: &State2, _p: &DVector<f64>) -> State2 {
    State2::new(y[1], 0.0)
}

/// BVPs with known closed-form solutions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum ShootingExample {
    /// u'' = -(u')²/u, u(0) = 1, u(1) = 2; u = sqrt(1 + 3x)
    SlopeSquared,
    /// y'' = y, y(0) = 0, y(1) = sinh(1); y = sinh(x)
    HyperbolicSine,
    /// y'' = y, y(0) = 1, y'(1) = e; y = exp(x)
    ExponentialNeumann,
    /// y'' = -ω²y with ω = 1 passed as a parameter, y(0) = 0, y(π/2) = 1; y = sin(x)
    HarmonicOscillator,
    /// y'' = 0, y'(0) = 3, y(1) = 5; y = 3x + 2
    LinearNeumannDirichlet,
}

impl ShootingExample {
    pub fn from_index(index: usize) -> Option<Self> {
        Self::iter().nth(index)
    }

    pub fn problem(&self) -> BoundaryValueProblem<Rhs> {
        match self {
            ShootingExample::SlopeSquared => {
                BoundaryValueProblem::dirichlet(slope_squared as Rhs, 0.0, 1.0, 1.0, 2.0)
            }
            ShootingExample::HyperbolicSine => {
                BoundaryValueProblem::dirichlet(hyperbolic as Rhs, 0.0, 1.0, 0.0, 1.0_f64.sinh())
            }
            ShootingExample::ExponentialNeumann => BoundaryValueProblem::new(
                hyperbolic as Rhs,
                0.0,
                1.0,
                BoundaryCondition::dirichlet(1.0),
                BoundaryCondition::neumann(1.0_f64.exp()),
            ),
            ShootingExample::HarmonicOscillator => {
                BoundaryValueProblem::dirichlet(harmonic as Rhs, 0.0, FRAC_PI_2, 0.0, 1.0)
                    .with_params(DVector::from_vec(vec![1.0]))
            }
            ShootingExample::LinearNeumannDirichlet => BoundaryValueProblem::new(
                linear as Rhs,
                0.0,
                1.0,
                BoundaryCondition::neumann(3.0),
                BoundaryCondition::dirichlet(5.0),
            ),
        }
    }

    pub fn guesses(&self) -> (f64, f64) {
        match self {
            ShootingExample::SlopeSquared => (0.1, 3.0),
            ShootingExample::HyperbolicSine => (0.0, 2.0),
            ShootingExample::ExponentialNeumann => (0.5, 2.0),
            ShootingExample::HarmonicOscillator => (0.5, 1.5),
            ShootingExample::LinearNeumannDirichlet => (0.0, 1.0),
        }
    }

    pub fn exact_solution(&self, x: f64) -> f64 {
        match self {
            ShootingExample::SlopeSquared => (1.0 + 3.0 * x).sqrt(),
            ShootingExample::HyperbolicSine => x.sinh(),
            ShootingExample::ExponentialNeumann => x.exp(),
            ShootingExample::HarmonicOscillator => x.sin(),
            ShootingExample::LinearNeumannDirichlet => 3.0 * x + 2.0,
        }
    }

    /// exact value of the initial condition the secant method looks for
    pub fn exact_slope(&self) -> f64 {
        match self {
            ShootingExample::SlopeSquared => 1.5,
            ShootingExample::HyperbolicSine => 1.0,
            ShootingExample::ExponentialNeumann => 1.0,
            ShootingExample::HarmonicOscillator => 1.0,
            ShootingExample::LinearNeumannDirichlet => 2.0,
        }
    }

    /// largest deviation of the computed y from the closed form over the mesh
    pub fn max_error(&self, report: &ShootingReport) -> f64 {
        report
            .trajectory
            .iter()
            .map(|(x, y)| (y[0] - self.exact_solution(x)).abs())
            .fold(0.0, f64::max)
    }

    pub fn solver(&self) -> ShootingMethodSolver {
        let (c1, c2) = self.guesses();
        ShootingMethodSolver::new()
            .with_initial_guesses(c1, c2)
            .with_tolerance(1e-6)
            .with_max_iterations(10)
            .with_step_size(0.01)
    }

    pub fn solve(&self) -> Result<ShootingOutcome, ShootingError> {
        self.solver().solve(&self.problem())
    }
}

/// Solves example number `example` (see `ShootingExample`), prints the result and saves it
/// to `<example name>.csv`
pub fn shooting_examples(example: usize) -> Result<ShootingOutcome, ShootingError> {
    let Some(task) = ShootingExample::from_index(example) else {
        return Err(ShootingError::InvalidConfig(format!(
            "no example number {}, there are {}",
            example,
            ShootingExample::iter().count()
        )));
    };
    let mut solver = task.solver();
    solver.set_log_level(LevelFilter::Info);
    solver.postprocessing.save_to_csv = true;
    solver.postprocessing.filename = task.to_string();
    let outcome = solver.solve(&task.problem())?;
    let report = outcome.report();
    println!("{}: {}", task, outcome);
    println!("{}", report.summary());
    print_convergence_table(&report.history);
    println!(
        "exact initial condition = {}, max |y - y_exact| = {:e}",
        task.exact_slope(),
        task.max_error(report)
    );
    solver.run_postprocessing(&outcome)?;
    Ok(outcome)
}
