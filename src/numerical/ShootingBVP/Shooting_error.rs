// Copyright (c)  by Gleb E. Zaslavkiy
//MIT License
//! Error types of the RK4 integrator and of the shooting driver.
//!
//! Reaching the iteration cap is not an error: it is reported as
//! `ShootingOutcome::MaxIterationsReached` with the same payload as a converged run.
use crate::numerical::ShootingBVP::RK4_fixed::Direction;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ShootingError {
    /// step size must be finite and strictly positive
    InvalidStepSize(f64),
    /// start or end of the integration interval is not finite
    InvalidInterval { start: f64, end: f64 },
    /// direction flag does not carry `start` towards `end`
    DirectionMismatch {
        start: f64,
        end: f64,
        direction: Direction,
    },
    /// |end - start| / step_size is not finite or exceeds `RK4_fixed::MAX_STEPS`
    TooManySteps { span: f64, step_size: f64 },
    /// tolerance must be finite and non-negative
    InvalidTolerance(f64),
    /// both initial guesses are equal, the secant denominator vanishes at once
    DegenerateGuesses(f64),
    /// two consecutive residuals are equal, g(c2) - g(c1) = 0
    SecantStagnation { iteration: usize },
    /// residual or slope estimate became NaN/Inf; iteration 0 is the initial pair of guesses
    Singular { iteration: usize },
    InvalidConfig(String),
    Io(String),
}

impl fmt::Display for ShootingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ShootingError::InvalidStepSize(h) => {
                write!(f, "Invalid step size {}: must be finite and positive", h)
            }
            ShootingError::InvalidInterval { start, end } => {
                write!(f, "Invalid integration interval [{}, {}]", start, end)
            }
            ShootingError::DirectionMismatch {
                start,
                end,
                direction,
            } => write!(
                f,
                "Direction {} does not lead from {} to {}",
                direction, start, end
            ),
            ShootingError::TooManySteps { span, step_size } => write!(
                f,
                "Span {} with step size {} needs more than {} RK4 steps",
                span,
                step_size,
                crate::numerical::ShootingBVP::RK4_fixed::MAX_STEPS
            ),
            ShootingError::InvalidTolerance(tol) => {
                write!(f, "Invalid tolerance {}: must be finite and non-negative", tol)
            }
            ShootingError::DegenerateGuesses(c) => write!(
                f,
                "Initial guesses are equal (c1 = c2 = {}), secant denominator is zero",
                c
            ),
            ShootingError::SecantStagnation { iteration } => write!(
                f,
                "Secant method stagnated at iteration {}: consecutive residuals are equal",
                iteration
            ),
            ShootingError::Singular { iteration } => write!(
                f,
                "Non-finite residual or slope estimate at iteration {}",
                iteration
            ),
            ShootingError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            ShootingError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for ShootingError {}

impl From<std::io::Error> for ShootingError {
    fn from(e: std::io::Error) -> Self {
        ShootingError::Io(e.to_string())
    }
}
