// Copyright (c)  by Gleb E. Zaslavkiy
//MIT License
//! # Shooting Method for Boundary Value Problems (BVP)
//!
//! Solves second-order boundary value problems written as a first-order system
//! (y, y')' = f(x, (y, y'), p) on [a, b] by turning them into a family of initial value
//! problems, integrated with fixed-step RK4, and resolving the free initial value with
//! the two-point secant method.
//!
//! ## Supported Boundary Conditions
//! 1. **Dirichlet-Dirichlet**: y(a) = α, y(b) = β
//! 2. **Dirichlet-Neumann**: y(a) = α, y'(b) = γ
//! 3. **Neumann-Dirichlet**: y'(a) = α, y(b) = β
//! 4. **Neumann-Neumann**: y'(a) = α, y'(b) = γ
//!
//! ## Method Overview
//! With g(c) the mismatch at x = b of the IVP started from the guess c:
//! 1. g is evaluated at two guesses c1, c2 (run 1 of 2, run 2 of 2)
//! 2. while |c1 - c2| > tolerance and the iteration count is <= the cap:
//!    c_new = c1 - g(c1)·(c2 - c1)/(g(c2) - g(c1)); c1 ← c2; c2 ← c_new;
//!    both guesses are integrated again
//! 3. the trajectory of the latest guess is returned
//!
//! Convergence is judged on the guesses (|c1 - c2|), not on the residual. Running out of
//! iterations is reported as `ShootingOutcome::MaxIterationsReached`, a vanishing secant
//! denominator or a non-finite residual as a `ShootingError`.
//!
//! ## Usage Example
//! ```rust, ignore
//! use nalgebra::DVector;
//! use RustedShooting::numerical::ShootingBVP::Shooting_simple::*;
//! // u'' = -(u')^2/u, u(0) = 1, u(1) = 2
//! let ode_system = |_x: f64, y: &State2, _p: &DVector<f64>| -> State2 {
//!     State2::new(y[1], -y[1] * y[1] / y[0])
//! };
//! let problem = BoundaryValueProblem::dirichlet(ode_system, 0.0, 1.0, 1.0, 2.0);
//! let mut solver = ShootingMethodSolver::new()
//!     .with_initial_guesses(0.1, 3.0)
//!     .with_tolerance(1e-6)
//!     .with_max_iterations(10)
//!     .with_step_size(0.01);
//! let outcome = solver.solve(&problem).unwrap();
//! assert!(outcome.is_converged());
//! println!("{}", outcome.report().summary());
//! ```
use crate::numerical::ShootingBVP::RK4_fixed::{Direction, Trajectory, rk4_ivp_solver};
use crate::numerical::ShootingBVP::Shooting_error::ShootingError;
use chrono::Local;
use log::{debug, error, info, warn};
use nalgebra::{DMatrix, DVector, Vector2};
use simplelog::*;
use std::fs::File;
use std::time::{Duration, Instant};
use strum_macros::Display;

/// state of a second-order problem: (y, y')
pub type State2 = Vector2<f64>;

/// Boundary condition types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum BoundaryConditionType {
    /// Dirichlet: y = value
    Dirichlet,
    /// Neumann: y' = value
    Neumann,
}

impl BoundaryConditionType {
    /// index of the state component the condition is imposed on
    pub fn component(&self) -> usize {
        match self {
            BoundaryConditionType::Dirichlet => 0,
            BoundaryConditionType::Neumann => 1,
        }
    }
}

/// Boundary condition specification
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryCondition {
    pub value: f64,
    pub bc_type: BoundaryConditionType,
}

impl BoundaryCondition {
    pub fn dirichlet(value: f64) -> Self {
        Self {
            value,
            bc_type: BoundaryConditionType::Dirichlet,
        }
    }
    pub fn neumann(value: f64) -> Self {
        Self {
            value,
            bc_type: BoundaryConditionType::Neumann,
        }
    }
}

/// Represents the BVP problem: y'' = f(x, y, y') on [a, b] with boundary conditions at both ends.
/// `b < a` is allowed, the IVPs are then integrated backward.
pub struct BoundaryValueProblem<F> {
    /// The ODE system in 1st-order form: d(y, y')/dx = f(x, (y, y'), params)
    pub ode_system: F,
    pub a: f64,
    pub b: f64,
    pub left_bc: BoundaryCondition,
    pub right_bc: BoundaryCondition,
    pub params: DVector<f64>,
}

impl<F> BoundaryValueProblem<F>
where
    F: Fn(f64, &State2, &DVector<f64>) -> State2,
{
    pub fn new(
        ode_system: F,
        a: f64,
        b: f64,
        left_bc: BoundaryCondition,
        right_bc: BoundaryCondition,
    ) -> Self {
        Self {
            ode_system,
            a,
            b,
            left_bc,
            right_bc,
            params: DVector::zeros(0),
        }
    }

    /// Dirichlet-Dirichlet problem: y(a) = alpha, y(b) = beta
    pub fn dirichlet(ode_system: F, a: f64, b: f64, alpha: f64, beta: f64) -> Self {
        Self::new(
            ode_system,
            a,
            b,
            BoundaryCondition::dirichlet(alpha),
            BoundaryCondition::dirichlet(beta),
        )
    }

    pub fn with_params(mut self, params: DVector<f64>) -> Self {
        self.params = params;
        self
    }

    pub fn direction(&self) -> Direction {
        Direction::from_interval(self.a, self.b)
    }

    /// initial state at x = a: the left condition fixes one component, the guess is the other
    pub fn initial_state(&self, guess: f64) -> State2 {
        match self.left_bc.bc_type {
            // y(a) = known, y'(a) = guess
            BoundaryConditionType::Dirichlet => State2::new(self.left_bc.value, guess),
            // y'(a) = known, y(a) = guess
            BoundaryConditionType::Neumann => State2::new(guess, self.left_bc.value),
        }
    }

    /// mismatch of the final state against the right boundary condition
    pub fn residual(&self, final_state: &State2) -> f64 {
        final_state[self.right_bc.bc_type.component()] - self.right_bc.value
    }

    /// integrates the IVP started from `guess` and returns its residual and trajectory
    pub fn shoot(
        &self,
        guess: f64,
        step_size: f64,
    ) -> Result<(f64, Trajectory<2>), ShootingError> {
        let trajectory = rk4_ivp_solver(
            &self.ode_system,
            self.initial_state(guess),
            self.a,
            self.b,
            step_size,
            &self.params,
            self.direction(),
        )?;
        let residual = self.residual(&trajectory.final_state());
        Ok((residual, trajectory))
    }
}

/// Loop state of the secant iteration: the two current guesses, their residuals and the
/// number of secant updates performed so far.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SecantState {
    pub c_prev: f64,
    pub c_curr: f64,
    pub residual_prev: f64,
    pub residual_curr: f64,
    pub iterations: usize,
}

impl SecantState {
    /// |c1 - c2|, the convergence criterion
    pub fn cauchy_error(&self) -> f64 {
        (self.c_prev - self.c_curr).abs()
    }

    /// ITERATING while |c1 - c2| > tolerance and iterations <= cap: a cap of N allows N + 1 updates
    pub fn is_iterating(&self, tolerance: f64, max_iterations: usize) -> bool {
        self.cauchy_error() > tolerance && self.iterations <= max_iterations
    }

    /// Secant update. Returns the shifted pair (old c2, c_new); the old c1 is discarded.
    pub fn next_guesses(&self) -> Result<(f64, f64), ShootingError> {
        let iteration = self.iterations + 1;
        let denominator = self.residual_curr - self.residual_prev;
        if denominator == 0.0 {
            return Err(ShootingError::SecantStagnation { iteration });
        }
        let c_new =
            self.c_prev - self.residual_prev * (self.c_curr - self.c_prev) / denominator;
        if !c_new.is_finite() {
            return Err(ShootingError::Singular { iteration });
        }
        Ok((self.c_curr, c_new))
    }
}

/// One row of the convergence history
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SecantIteration {
    pub iteration: usize,
    pub c_prev: f64,
    pub c_curr: f64,
    pub residual_prev: f64,
    pub residual_curr: f64,
    pub cauchy_error: f64,
}

impl From<&SecantState> for SecantIteration {
    fn from(state: &SecantState) -> Self {
        Self {
            iteration: state.iterations,
            c_prev: state.c_prev,
            c_curr: state.c_curr,
            residual_prev: state.residual_prev,
            residual_curr: state.residual_curr,
            cauchy_error: state.cauchy_error(),
        }
    }
}

/// Payload shared by converged and exhausted runs
#[derive(Debug, Clone)]
pub struct ShootingReport {
    /// latest estimate of the unknown initial condition (c2)
    pub slope: f64,
    pub iterations: usize,
    /// g(c2)
    pub residual: f64,
    /// |c1 - c2| at termination
    pub cauchy_error: f64,
    /// final state (y(b), y'(b)) of the returned trajectory
    pub bound_values: State2,
    pub trajectory: Trajectory<2>,
    /// initial pair (iteration 0) followed by one entry per secant update
    pub history: Vec<SecantIteration>,
    pub elapsed: Duration,
}

impl ShootingReport {
    pub fn x_mesh(&self) -> DVector<f64> {
        self.trajectory.x_mesh_dvector()
    }
    /// solution matrix, rows (y, y'), one column per mesh point
    pub fn y(&self) -> DMatrix<f64> {
        self.trajectory.to_matrix()
    }
    pub fn summary(&self) -> String {
        format!(
            "initial condition = {}, boundary values y(b) = {}, y'(b) = {}, iterations = {}, |c1 - c2| = {:e}, residual = {:e}",
            self.slope,
            self.bound_values[0],
            self.bound_values[1],
            self.iterations,
            self.cauchy_error,
            self.residual
        )
    }
}

/// Termination of the secant loop
#[derive(Debug, Clone, Display)]
pub enum ShootingOutcome {
    /// |c1 - c2| <= tolerance
    #[strum(to_string = "converged")]
    Converged(ShootingReport),
    /// the iteration cap was reached first
    #[strum(to_string = "maximum iterations reached")]
    MaxIterationsReached(ShootingReport),
}

impl ShootingOutcome {
    pub fn is_converged(&self) -> bool {
        matches!(self, ShootingOutcome::Converged(_))
    }
    pub fn report(&self) -> &ShootingReport {
        match self {
            ShootingOutcome::Converged(report) => report,
            ShootingOutcome::MaxIterationsReached(report) => report,
        }
    }
    pub fn into_report(self) -> ShootingReport {
        match self {
            ShootingOutcome::Converged(report) => report,
            ShootingOutcome::MaxIterationsReached(report) => report,
        }
    }
}

/// What to do with the solution after a solve
#[derive(Debug, Clone, PartialEq)]
pub struct PostprocessingOptions {
    pub plot: bool,
    /// tab-separated text file `<filename>.txt`
    pub save: bool,
    /// `<filename>.csv`
    pub save_to_csv: bool,
    pub filename: String,
    /// name of the independent variable
    pub arg: String,
    /// names of (y, y')
    pub values: Vec<String>,
}

impl Default for PostprocessingOptions {
    fn default() -> Self {
        Self {
            plot: false,
            save: false,
            save_to_csv: false,
            filename: "shooting_result".to_string(),
            arg: "x".to_string(),
            values: vec!["y".to_string(), "z".to_string()],
        }
    }
}

/// Configuration for the shooting method solver.
#[derive(Debug, Clone)]
pub struct ShootingMethodSolver {
    /// two guesses (c1, c2) of the unknown initial condition
    pub initial_guesses: (f64, f64),
    pub tolerance: f64,
    pub max_iterations: usize,
    pub step_size: f64,
    pub postprocessing: PostprocessingOptions,
    log_level: Option<LevelFilter>,
    log_to_file: Option<String>,
    log_to_console: bool,
    result: Option<ShootingOutcome>,
}

impl Default for ShootingMethodSolver {
    fn default() -> Self {
        Self {
            initial_guesses: (0.1, 3.0),
            tolerance: 1e-6,
            max_iterations: 10,
            step_size: 0.01,
            postprocessing: PostprocessingOptions::default(),
            log_level: None,
            log_to_file: None,
            log_to_console: true,
            result: None,
        }
    }
}

impl ShootingMethodSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial_guesses(mut self, c1: f64, c2: f64) -> Self {
        self.initial_guesses = (c1, c2);
        self
    }
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
    pub fn with_step_size(mut self, step_size: f64) -> Self {
        self.step_size = step_size;
        self
    }

    fn validate(&self) -> Result<(), ShootingError> {
        if !(self.tolerance.is_finite() && self.tolerance >= 0.0) {
            return Err(ShootingError::InvalidTolerance(self.tolerance));
        }
        if !(self.step_size.is_finite() && self.step_size > 0.0) {
            return Err(ShootingError::InvalidStepSize(self.step_size));
        }
        let (c1, c2) = self.initial_guesses;
        if !(c1.is_finite() && c2.is_finite()) {
            return Err(ShootingError::InvalidConfig(format!(
                "initial guesses must be finite, got ({}, {})",
                c1, c2
            )));
        }
        if c1 == c2 {
            return Err(ShootingError::DegenerateGuesses(c1));
        }
        Ok(())
    }

    /// one integration run, `run` is 1 or 2 of the pair evaluated per iteration
    fn evaluate<F>(
        &self,
        problem: &BoundaryValueProblem<F>,
        guess: f64,
        run: usize,
        iteration: usize,
    ) -> Result<(f64, Trajectory<2>), ShootingError>
    where
        F: Fn(f64, &State2, &DVector<f64>) -> State2,
    {
        let begin = Instant::now();
        let (residual, trajectory) = problem.shoot(guess, self.step_size)?;
        let bound = trajectory.final_state();
        debug!(
            "iteration {}, run {} of 2: guess = {}, y(b) = {}, y'(b) = {}, residual = {}, elapsed {:?}",
            iteration,
            run,
            guess,
            bound[0],
            bound[1],
            residual,
            begin.elapsed()
        );
        if !residual.is_finite() {
            error!(
                "non-finite residual for guess {} at iteration {}",
                guess, iteration
            );
            return Err(ShootingError::Singular { iteration });
        }
        Ok((residual, trajectory))
    }

    /// Solves the BVP using the shooting method.
    pub fn solve<F>(
        &mut self,
        problem: &BoundaryValueProblem<F>,
    ) -> Result<ShootingOutcome, ShootingError>
    where
        F: Fn(f64, &State2, &DVector<f64>) -> State2,
    {
        self.init_logger()?;
        info!("Starting shooting method solver");
        debug!(
            "Problem parameters: a={}, b={}, left_bc={:?}, right_bc={:?}",
            problem.a, problem.b, problem.left_bc, problem.right_bc
        );
        debug!(
            "Solver parameters: initial_guesses={:?}, tolerance={}, max_iterations={}, step_size={}",
            self.initial_guesses, self.tolerance, self.max_iterations, self.step_size
        );
        self.validate()?;
        let begin = Instant::now();

        let (c1, c2) = self.initial_guesses;
        let (g1, _) = self.evaluate(problem, c1, 1, 0)?;
        let (g2, mut trajectory) = self.evaluate(problem, c2, 2, 0)?;
        let mut state = SecantState {
            c_prev: c1,
            c_curr: c2,
            residual_prev: g1,
            residual_curr: g2,
            iterations: 0,
        };
        let mut history = vec![SecantIteration::from(&state)];

        while state.is_iterating(self.tolerance, self.max_iterations) {
            let (c_prev, c_curr) = match state.next_guesses() {
                Ok(guesses) => guesses,
                Err(e) => {
                    error!("{}", e);
                    return Err(e);
                }
            };
            let iteration = state.iterations + 1;
            let (residual_prev, _) = self.evaluate(problem, c_prev, 1, iteration)?;
            let (residual_curr, latest) = self.evaluate(problem, c_curr, 2, iteration)?;
            state = SecantState {
                c_prev,
                c_curr,
                residual_prev,
                residual_curr,
                iterations: iteration,
            };
            trajectory = latest;
            history.push(SecantIteration::from(&state));
            debug!(
                "Iteration {}: c1 = {}, c2 = {}, |c1 - c2| = {:e}",
                iteration,
                c_prev,
                c_curr,
                state.cauchy_error()
            );
        }

        let report = ShootingReport {
            slope: state.c_curr,
            iterations: state.iterations,
            residual: state.residual_curr,
            cauchy_error: state.cauchy_error(),
            bound_values: trajectory.final_state(),
            trajectory,
            history,
            elapsed: begin.elapsed(),
        };
        let outcome = if state.cauchy_error() <= self.tolerance {
            info!(
                "Secant method converged after {} iterations: {}",
                report.iterations,
                report.summary()
            );
            ShootingOutcome::Converged(report)
        } else {
            warn!(
                "Secant method did not converge after {} iterations (cap {}): {}",
                report.iterations,
                self.max_iterations,
                report.summary()
            );
            ShootingOutcome::MaxIterationsReached(report)
        };
        self.result = Some(outcome.clone());
        Ok(outcome)
    }

    pub fn get_solution(&self) -> Option<ShootingOutcome> {
        self.result.clone()
    }
    pub fn get_y(&self) -> Option<DMatrix<f64>> {
        self.result.as_ref().map(|outcome| outcome.report().y())
    }
    pub fn get_x(&self) -> Option<DVector<f64>> {
        self.result.as_ref().map(|outcome| outcome.report().x_mesh())
    }

    ////////////////////////////////logging functions
    /// Set logging level (Off, Error, Warn, Info, Debug, Trace)
    pub fn set_log_level(&mut self, level: LevelFilter) {
        self.log_level = Some(level);
    }

    /// no logger is installed by `solve`
    pub fn disable_logging(&mut self) {
        self.log_level = None;
    }

    /// Enable logging to file
    pub fn set_log_file(&mut self, filename: String) {
        self.log_to_file = Some(filename);
    }

    /// log file named after the current date and time
    pub fn set_timestamped_log_file(&mut self) {
        let date_and_time = Local::now().format("%Y-%m-%d_%H-%M-%S");
        self.log_to_file = Some(format!("shooting_log_{}.txt", date_and_time));
    }

    /// Enable/disable console logging
    pub fn set_console_logging(&mut self, enabled: bool) {
        self.log_to_console = enabled;
    }

    pub fn log_level(&self) -> Option<LevelFilter> {
        self.log_level
    }

    pub fn log_file(&self) -> Option<&String> {
        self.log_to_file.as_ref()
    }

    /// Logger is only installed when a level was set; a logger installed elsewhere wins.
    /// A log file that cannot be created is an `Io` error.
    fn init_logger(&self) -> Result<(), ShootingError> {
        let Some(level) = self.log_level else {
            return Ok(());
        };

        let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();

        if self.log_to_console {
            loggers.push(TermLogger::new(
                level,
                Config::default(),
                TerminalMode::Mixed,
                ColorChoice::Auto,
            ));
        }

        if let Some(ref filename) = self.log_to_file {
            let file = File::create(filename).map_err(|e| {
                ShootingError::Io(format!("cannot create log file {}: {}", filename, e))
            })?;
            loggers.push(WriteLogger::new(level, Config::default(), file));
        }

        if !loggers.is_empty() {
            let _ = CombinedLogger::init(loggers);
        }
        Ok(())
    }
}

/// Flat entry point: Dirichlet-Dirichlet BVP y(a) = alpha, y(b) = beta.
pub fn shoot<F>(
    ode_system: F,
    alpha: f64,
    beta: f64,
    borders: (f64, f64),
    step_size: f64,
    initial_guesses: (f64, f64),
    max_iterations: usize,
    tolerance: f64,
) -> Result<ShootingOutcome, ShootingError>
where
    F: Fn(f64, &State2, &DVector<f64>) -> State2,
{
    let problem = BoundaryValueProblem::dirichlet(ode_system, borders.0, borders.1, alpha, beta);
    let mut solver = ShootingMethodSolver::new()
        .with_initial_guesses(initial_guesses.0, initial_guesses.1)
        .with_step_size(step_size)
        .with_max_iterations(max_iterations)
        .with_tolerance(tolerance);
    solver.solve(&problem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_initial_state_and_residual() {
        let f = |_x: f64, y: &State2, _p: &DVector<f64>| -> State2 { State2::new(y[1], 0.0) };
        let dd = BoundaryValueProblem::dirichlet(f, 0.0, 1.0, 1.0, 2.0);
        assert_eq!(dd.initial_state(0.5), State2::new(1.0, 0.5));
        assert_eq!(dd.residual(&State2::new(2.5, 7.0)), 0.5);

        let nn = BoundaryValueProblem::new(
            f,
            0.0,
            1.0,
            BoundaryCondition::neumann(3.0),
            BoundaryCondition::neumann(4.0),
        );
        assert_eq!(nn.initial_state(0.5), State2::new(0.5, 3.0));
        assert_eq!(nn.residual(&State2::new(2.5, 7.0)), 3.0);
    }

    #[test]
    fn test_secant_state_update() {
        // g(c) = c - 2 is linear, one update hits the root exactly
        let state = SecantState {
            c_prev: 0.0,
            c_curr: 1.0,
            residual_prev: -2.0,
            residual_curr: -1.0,
            iterations: 0,
        };
        assert_eq!(state.cauchy_error(), 1.0);
        assert!(state.is_iterating(1e-6, 10));
        // the cap itself is still an iterating count
        assert!(state.is_iterating(1e-6, 0));
        let capped = SecantState {
            iterations: 1,
            ..state
        };
        assert!(!capped.is_iterating(1e-6, 0));
        assert!(!state.is_iterating(1.0, 10));
        let (c_prev, c_new) = state.next_guesses().unwrap();
        assert_eq!(c_prev, 1.0);
        assert_abs_diff_eq!(c_new, 2.0, epsilon = 1e-15);
    }

    #[test]
    fn test_secant_state_stagnation() {
        let state = SecantState {
            c_prev: 0.0,
            c_curr: 1.0,
            residual_prev: 0.5,
            residual_curr: 0.5,
            iterations: 4,
        };
        assert_eq!(
            state.next_guesses(),
            Err(ShootingError::SecantStagnation { iteration: 5 })
        );
    }

    #[test]
    fn test_outcome_accessors() {
        let f = |_x: f64, y: &State2, _p: &DVector<f64>| -> State2 { State2::new(y[1], 0.0) };
        let outcome = shoot(f, 0.0, 1.0, (0.0, 1.0), 0.1, (0.0, 2.0), 10, 1e-9).unwrap();
        assert!(outcome.is_converged());
        assert_eq!(outcome.to_string(), "converged");
        let report = outcome.report().clone();
        assert_abs_diff_eq!(report.slope, 1.0, epsilon = 1e-12);
        assert_eq!(report.x_mesh().len(), 11);
        assert_eq!(report.y().shape(), (2, 11));
        assert_eq!(report.history[0].iteration, 0);
        assert_eq!(report.history.len(), report.iterations + 1);
        assert!(report.summary().contains("iterations = "));
    }

    #[test]
    fn test_solver_defaults() {
        let solver = ShootingMethodSolver::default();
        assert_eq!(solver.initial_guesses, (0.1, 3.0));
        assert_eq!(solver.tolerance, 1e-6);
        assert_eq!(solver.max_iterations, 10);
        assert_eq!(solver.step_size, 0.01);
        assert!(solver.get_solution().is_none());
        assert!(solver.log_level().is_none());
    }
}
