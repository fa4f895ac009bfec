// Copyright (c)  by Gleb E. Zaslavkiy
//MIT License
//! # Fixed-step classical Runge-Kutta (RK4) integrator
//!
//! Integrates dy/dx = f(x, y, p) for a state of fixed dimension `N` (`SVector<f64, N>`),
//! so the right-hand side and the state it operates on always agree in size.
//!
//! ```text
//! k1 = h·f(x, y)
//! k2 = h·f(x + h/2, y + k1/2)
//! k3 = h·f(x + h/2, y + k2/2)
//! k4 = h·f(x + h, y + k3)
//! y ← y + (k1 + 2k2 + 2k3 + k4)/6,   x ← x + h
//! ```
//!
//! The number of samples depends only on the span and the step:
//! `floor(|x_end - x0| / h) + 1`, the initial state included. The last abscissa is
//! therefore `x0 ± floor(|x_end - x0| / h)·h`, which equals `x_end` when the span is a
//! multiple of the step. Runs of more than `MAX_STEPS` steps are rejected with
//! `ShootingError::TooManySteps` before anything is allocated.
//!
//! A right-hand side that evaluates to NaN/Inf is not detected here: the non-finite
//! values propagate through the rest of the trajectory. The shooting driver checks the
//! residual instead.
//!
//! ## Usage Example
//! ```rust, ignore
//! use nalgebra::{DVector, SVector};
//! use RustedShooting::numerical::ShootingBVP::RK4_fixed::{rk4_ivp_solver, Direction};
//! // y' = y, y(0) = 1
//! let f = |_x: f64, y: &SVector<f64, 1>, _p: &DVector<f64>| -> SVector<f64, 1> { *y };
//! let y0 = SVector::<f64, 1>::new(1.0);
//! let trajectory = rk4_ivp_solver(f, y0, 0.0, 1.0, 0.01, &DVector::zeros(0), Direction::Forward).unwrap();
//! assert_eq!(trajectory.len(), 101);
//! ```
use crate::Utils::logger::{save_matrix_to_csv, save_matrix_to_file};
use crate::numerical::ShootingBVP::Shooting_error::ShootingError;
use log::debug;
use nalgebra::{DMatrix, DVector, SVector};
use std::time::Instant;
use strum_macros::Display;

/// Integration direction. `Backward` negates the step size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    pub fn sign(&self) -> f64 {
        match self {
            Direction::Forward => 1.0,
            Direction::Backward => -1.0,
        }
    }
    /// direction that carries `start` towards `end`
    pub fn from_interval(start: f64, end: f64) -> Self {
        if end < start {
            Direction::Backward
        } else {
            Direction::Forward
        }
    }
}

/// Sequence of (x, state) samples produced by one integration run.
/// Never empty: the initial state is always the first sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory<const N: usize> {
    x_mesh: Vec<f64>,
    y: Vec<SVector<f64, N>>,
}

impl<const N: usize> Trajectory<N> {
    pub fn len(&self) -> usize {
        self.x_mesh.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x_mesh.is_empty()
    }

    pub fn x_mesh(&self) -> &[f64] {
        &self.x_mesh
    }

    pub fn states(&self) -> &[SVector<f64, N>] {
        &self.y
    }

    pub fn initial_state(&self) -> SVector<f64, N> {
        self.y[0]
    }

    pub fn final_state(&self) -> SVector<f64, N> {
        self.y[self.y.len() - 1]
    }

    pub fn final_x(&self) -> f64 {
        self.x_mesh[self.x_mesh.len() - 1]
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, &SVector<f64, N>)> {
        self.x_mesh.iter().copied().zip(self.y.iter())
    }

    /// values of one state component along the mesh
    pub fn component(&self, i: usize) -> DVector<f64> {
        DVector::from_iterator(self.y.len(), self.y.iter().map(|y| y[i]))
    }

    pub fn x_mesh_dvector(&self) -> DVector<f64> {
        DVector::from_column_slice(&self.x_mesh)
    }

    /// Matrix where each column is the solution at a mesh point (N rows)
    pub fn to_matrix(&self) -> DMatrix<f64> {
        DMatrix::from_fn(N, self.y.len(), |i, j| self.y[j][i])
    }

    pub fn into_parts(self) -> (Vec<f64>, Vec<SVector<f64, N>>) {
        (self.x_mesh, self.y)
    }

    /// save as tab-separated text: header `arg values...`, one row per mesh point
    pub fn save_to_file(
        &self,
        arg: &str,
        values: &[String],
        filename: &str,
    ) -> Result<(), ShootingError> {
        self.check_headers(values)?;
        save_matrix_to_file(&self.to_matrix(), values, filename, &self.x_mesh_dvector(), arg)?;
        Ok(())
    }

    pub fn save_to_csv(
        &self,
        arg: &str,
        values: &[String],
        filename: &str,
    ) -> Result<(), ShootingError> {
        self.check_headers(values)?;
        save_matrix_to_csv(&self.to_matrix(), values, filename, &self.x_mesh_dvector(), arg)?;
        Ok(())
    }

    fn check_headers(&self, values: &[String]) -> Result<(), ShootingError> {
        if values.len() != N {
            return Err(ShootingError::InvalidConfig(format!(
                "expected {} variable names, got {}",
                N,
                values.len()
            )));
        }
        Ok(())
    }
}

/// upper bound on the number of RK4 steps of a single run
pub const MAX_STEPS: usize = 100_000_000;

/// Number of samples (initial point included) of a run over `[x0, x_end]` with step `step_size`.
/// `None` when the step count is not finite or exceeds `MAX_STEPS`.
pub fn number_of_samples(x0: f64, x_end: f64, step_size: f64) -> Option<usize> {
    let steps = ((x_end - x0).abs() / step_size.abs()).floor();
    if !steps.is_finite() || steps > MAX_STEPS as f64 {
        return None;
    }
    (steps as usize).checked_add(1)
}

fn validate_interval(
    x0: f64,
    x_end: f64,
    step_size: f64,
    direction: Direction,
) -> Result<usize, ShootingError> {
    if !(step_size.is_finite() && step_size > 0.0) {
        return Err(ShootingError::InvalidStepSize(step_size));
    }
    if !(x0.is_finite() && x_end.is_finite()) {
        return Err(ShootingError::InvalidInterval {
            start: x0,
            end: x_end,
        });
    }
    let span = x_end - x0;
    if span != 0.0 && span.signum() != direction.sign() {
        return Err(ShootingError::DirectionMismatch {
            start: x0,
            end: x_end,
            direction,
        });
    }
    number_of_samples(x0, x_end, step_size).ok_or(ShootingError::TooManySteps {
        span: span.abs(),
        step_size,
    })
}

/// One classical RK4 step of signed size `h`.
pub fn rk4_step<F, const N: usize>(
    ode_system: &F,
    x: f64,
    y: &SVector<f64, N>,
    h: f64,
    params: &DVector<f64>,
) -> SVector<f64, N>
where
    F: Fn(f64, &SVector<f64, N>, &DVector<f64>) -> SVector<f64, N>,
{
    let k1 = h * ode_system(x, y, params);
    let k2 = h * ode_system(x + h / 2.0, &(y + k1 / 2.0), params);
    let k3 = h * ode_system(x + h / 2.0, &(y + k2 / 2.0), params);
    let k4 = h * ode_system(x + h, &(y + k3), params);
    y + (k1 + 2.0 * k2 + 2.0 * k3 + k4) / 6.0
}

/// Solves an initial value problem (IVP) using the 4th-order Runge-Kutta method.
///
/// # Arguments
/// * `ode_system` - Function defining the ODE system: dy/dx = f(x, y, params).
/// * `y0` - Initial state vector.
/// * `x0` - Initial x value.
/// * `x_end` - End of the integration interval.
/// * `step_size` - Positive step size, negated for `Direction::Backward`.
/// * `params` - Parameter vector passed to every evaluation (may be empty).
/// * `direction` - must carry `x0` towards `x_end`.
pub fn rk4_ivp_solver<F, const N: usize>(
    ode_system: F,
    y0: SVector<f64, N>,
    x0: f64,
    x_end: f64,
    step_size: f64,
    params: &DVector<f64>,
    direction: Direction,
) -> Result<Trajectory<N>, ShootingError>
where
    F: Fn(f64, &SVector<f64, N>, &DVector<f64>) -> SVector<f64, N>,
{
    let n_samples = validate_interval(x0, x_end, step_size, direction)?;
    let begin = Instant::now();
    let h = direction.sign() * step_size;

    let mut x_mesh = Vec::with_capacity(n_samples);
    let mut solution = Vec::with_capacity(n_samples);
    let mut x = x0;
    let mut y = y0;
    x_mesh.push(x);
    solution.push(y);
    for _ in 1..n_samples {
        y = rk4_step(&ode_system, x, &y, h, params);
        x += h;
        x_mesh.push(x);
        solution.push(y);
    }
    debug!(
        "RK4: {} steps of h = {} from x = {} to x = {}, elapsed {:?}",
        n_samples - 1,
        h,
        x0,
        x,
        begin.elapsed()
    );
    Ok(Trajectory {
        x_mesh,
        y: solution,
    })
}

/// dynamic output for export and plotting: solution matrix (N rows, one column per mesh point) and mesh
pub fn rk4_ivp_solver_and_mesh<F, const N: usize>(
    ode_system: F,
    y0: SVector<f64, N>,
    x0: f64,
    x_end: f64,
    step_size: f64,
    params: &DVector<f64>,
) -> Result<(DMatrix<f64>, DVector<f64>), ShootingError>
where
    F: Fn(f64, &SVector<f64, N>, &DVector<f64>) -> SVector<f64, N>,
{
    let direction = Direction::from_interval(x0, x_end);
    let (x_mesh, states) =
        rk4_ivp_solver(ode_system, y0, x0, x_end, step_size, params, direction)?.into_parts();
    let solution = DMatrix::from_fn(N, states.len(), |i, j| states[j][i]);
    Ok((solution, DVector::from_vec(x_mesh)))
}

/////////////////////////////////////////////////////////////////////////
//          tests
//////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::{Vector1, Vector2};

    fn no_params() -> DVector<f64> {
        DVector::zeros(0)
    }

    #[test]
    fn test_rk4_exponential_growth() {
        // y' = y, y(0) = 1, exact: y(1) = e
        let f = |_x: f64, y: &Vector1<f64>, _p: &DVector<f64>| -> Vector1<f64> { *y };
        let trajectory = rk4_ivp_solver(
            f,
            Vector1::new(1.0),
            0.0,
            1.0,
            0.01,
            &no_params(),
            Direction::Forward,
        )
        .unwrap();
        assert_eq!(trajectory.len(), 101);
        assert_abs_diff_eq!(trajectory.final_x(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(trajectory.final_state()[0], 1.0_f64.exp(), epsilon = 1e-7);
    }

    #[test]
    fn test_rk4_error_is_fourth_order() {
        let f = |_x: f64, y: &Vector1<f64>, _p: &DVector<f64>| -> Vector1<f64> { *y };
        let error = |h: f64| {
            let t = rk4_ivp_solver(f, Vector1::new(1.0), 0.0, 1.0, h, &no_params(), Direction::Forward)
                .unwrap();
            (t.final_state()[0] - 1.0_f64.exp()).abs()
        };
        // halving the step reduces the global error by ~2^4
        let ratio = error(0.1) / error(0.05);
        assert!(ratio > 14.0 && ratio < 18.0, "ratio = {}", ratio);
    }

    #[test]
    fn test_trajectory_length_invariant() {
        let f = |_x: f64, y: &Vector2<f64>, _p: &DVector<f64>| -> Vector2<f64> {
            Vector2::new(y[1], -y[0])
        };
        let cases = [
            (1.0, 0.01, 101),
            (1.0, 0.25, 5),
            (1.0, 0.3, 4),
            (3.0, 0.5, 7),
            (0.7, 1.0, 1),
            (2.0, 0.125, 17),
        ];
        for (span, h, expected) in cases {
            let t = rk4_ivp_solver(
                f,
                Vector2::new(1.0, 0.0),
                0.0,
                span,
                h,
                &no_params(),
                Direction::Forward,
            )
            .unwrap();
            assert_eq!(t.len(), expected, "span = {}, h = {}", span, h);
            assert_eq!(Some(t.len()), number_of_samples(0.0, span, h));
            assert_eq!(t.states().len(), t.x_mesh().len());
        }
    }

    #[test]
    fn test_step_count_limit() {
        let f = |_x: f64, y: &Vector1<f64>, _p: &DVector<f64>| -> Vector1<f64> { *y };
        // span / h overflows to infinity
        assert_eq!(number_of_samples(0.0, 1e300, 1e-300), None);
        assert_eq!(
            rk4_ivp_solver(
                f,
                Vector1::new(1.0),
                0.0,
                1e300,
                1e-300,
                &no_params(),
                Direction::Forward
            )
            .unwrap_err(),
            ShootingError::TooManySteps {
                span: 1e300,
                step_size: 1e-300
            }
        );
        // finite but far above the limit
        assert!(matches!(
            rk4_ivp_solver(
                f,
                Vector1::new(1.0),
                0.0,
                1.0,
                1e-12,
                &no_params(),
                Direction::Forward
            ),
            Err(ShootingError::TooManySteps { .. })
        ));
        assert_eq!(number_of_samples(0.0, 1e8, 1.0), Some(MAX_STEPS + 1));
        assert_eq!(number_of_samples(0.0, 1e8 + 1.0, 1.0), None);
    }

    #[test]
    fn test_zero_span_returns_initial_state() {
        let f = |_x: f64, y: &Vector2<f64>, _p: &DVector<f64>| -> Vector2<f64> {
            Vector2::new(y[1], 0.0)
        };
        let y0 = Vector2::new(0.5, 2.0);
        for direction in [Direction::Forward, Direction::Backward] {
            let t = rk4_ivp_solver(f, y0, 1.0, 1.0, 0.1, &no_params(), direction).unwrap();
            assert_eq!(t.len(), 1);
            assert_eq!(t.final_state(), y0);
        }
    }

    #[test]
    fn test_rk4_linear_system() {
        // y1' = y2, y2' = -y1, y1(0) = 1, y2(0) = 0: y1 = cos(x), y2 = -sin(x)
        let f = |_x: f64, y: &Vector2<f64>, _p: &DVector<f64>| -> Vector2<f64> {
            Vector2::new(y[1], -y[0])
        };
        let t = rk4_ivp_solver(
            f,
            Vector2::new(1.0, 0.0),
            0.0,
            2.0,
            0.001,
            &no_params(),
            Direction::Forward,
        )
        .unwrap();
        for (x, y) in t.iter() {
            assert_abs_diff_eq!(y[0], x.cos(), epsilon = 1e-9);
            assert_abs_diff_eq!(y[1], -x.sin(), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_forward_then_backward_returns_to_initial_state() {
        let f = |_x: f64, y: &Vector2<f64>, _p: &DVector<f64>| -> Vector2<f64> {
            Vector2::new(y[1], -y[0].sin())
        };
        let y0 = Vector2::new(0.3, 1.1);
        // h = 1/64 keeps every abscissa exact
        let h = 0.015625;
        let forward =
            rk4_ivp_solver(f, y0, 0.0, 2.0, h, &no_params(), Direction::Forward).unwrap();
        assert_eq!(forward.final_x(), 2.0);
        let backward = rk4_ivp_solver(
            f,
            forward.final_state(),
            2.0,
            0.0,
            h,
            &no_params(),
            Direction::Backward,
        )
        .unwrap();
        assert_eq!(forward.len(), backward.len());
        assert_eq!(backward.final_x(), 0.0);
        assert_abs_diff_eq!(backward.final_state()[0], y0[0], epsilon = 1e-6);
        assert_abs_diff_eq!(backward.final_state()[1], y0[1], epsilon = 1e-6);
    }

    #[test]
    fn test_parameter_vector_reaches_rhs() {
        // y' = k*y, k = -2
        let f = |_x: f64, y: &Vector1<f64>, p: &DVector<f64>| -> Vector1<f64> { p[0] * y };
        let params = DVector::from_vec(vec![-2.0]);
        let t = rk4_ivp_solver(f, Vector1::new(1.0), 0.0, 1.0, 0.01, &params, Direction::Forward)
            .unwrap();
        assert_abs_diff_eq!(t.final_state()[0], (-2.0_f64).exp(), epsilon = 1e-7);
    }

    #[test]
    fn test_non_finite_rhs_propagates_silently() {
        // sqrt of a negative state component
        let f = |_x: f64, y: &Vector2<f64>, _p: &DVector<f64>| -> Vector2<f64> {
            Vector2::new(y[1], (-y[0]).sqrt())
        };
        let t = rk4_ivp_solver(
            f,
            Vector2::new(1.0, 0.0),
            0.0,
            1.0,
            0.1,
            &no_params(),
            Direction::Forward,
        )
        .unwrap();
        assert_eq!(t.len(), 11);
        assert!(t.initial_state()[0].is_finite());
        for y in &t.states()[1..] {
            assert!(y[1].is_nan());
        }
    }

    #[test]
    fn test_invalid_input() {
        let f = |_x: f64, y: &Vector1<f64>, _p: &DVector<f64>| -> Vector1<f64> { *y };
        let y0 = Vector1::new(1.0);
        assert_eq!(
            rk4_ivp_solver(f, y0, 0.0, 1.0, 0.0, &no_params(), Direction::Forward),
            Err(ShootingError::InvalidStepSize(0.0))
        );
        assert_eq!(
            rk4_ivp_solver(f, y0, 0.0, 1.0, -0.1, &no_params(), Direction::Forward),
            Err(ShootingError::InvalidStepSize(-0.1))
        );
        assert!(matches!(
            rk4_ivp_solver(f, y0, 0.0, f64::INFINITY, 0.1, &no_params(), Direction::Forward),
            Err(ShootingError::InvalidInterval { .. })
        ));
        assert_eq!(
            rk4_ivp_solver(f, y0, 0.0, 1.0, 0.1, &no_params(), Direction::Backward),
            Err(ShootingError::DirectionMismatch {
                start: 0.0,
                end: 1.0,
                direction: Direction::Backward
            })
        );
    }

    #[test]
    fn test_matrix_layout() {
        let f = |_x: f64, y: &Vector2<f64>, _p: &DVector<f64>| -> Vector2<f64> {
            Vector2::new(y[1], 0.0)
        };
        let (matrix, x_mesh) =
            rk4_ivp_solver_and_mesh(f, Vector2::new(2.0, 3.0), 0.0, 1.0, 0.25, &no_params())
                .unwrap();
        assert_eq!(matrix.nrows(), 2);
        assert_eq!(matrix.ncols(), 5);
        assert_eq!(x_mesh.len(), 5);
        // y = 3x + 2
        for j in 0..x_mesh.len() {
            assert_abs_diff_eq!(matrix[(0, j)], 3.0 * x_mesh[j] + 2.0, epsilon = 1e-12);
            assert_abs_diff_eq!(matrix[(1, j)], 3.0, epsilon = 1e-12);
        }
    }
}
