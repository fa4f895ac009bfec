// Copyright (c)  by Gleb E. Zaslavkiy
//MIT License
/// Shooting method for boundary value problems: a second-order BVP y'' = f(x, y, y') (written as
/// a first-order system) is turned into initial value problems integrated with fixed-step RK4, and
/// the unknown initial condition is found with the secant method.
/// Example#1
/// ```rust, ignore
/// use nalgebra::DVector;
/// use RustedShooting::numerical::ShootingBVP::Shooting_simple::{shoot, State2};
/// // u'' = -(u')^2/u, u(0) = 1, u(1) = 2
/// let ode_system = |_x: f64, y: &State2, _p: &DVector<f64>| -> State2 {
///     State2::new(y[1], -y[1] * y[1] / y[0])
/// };
/// let outcome = shoot(ode_system, 1.0, 2.0, (0.0, 1.0), 0.01, (0.1, 3.0), 10, 1e-6).unwrap();
/// let report = outcome.report();
/// println!("slope = {}, y(b) = {}", report.slope, report.bound_values[0]);
/// ```
pub mod ShootingBVP;
