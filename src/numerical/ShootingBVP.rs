// Copyright (c)  by Gleb E. Zaslavkiy
//MIT License
/// fixed-step RK4 integrator and its trajectory type
pub mod RK4_fixed;
/// error type of the integrator, the secant driver and the task parser
pub mod Shooting_error;
/// shooting method for second-order BVPs
pub mod Shooting_simple;
/// setting the solver from task files (custom format or TOML)
pub mod task_parser_shooting;
