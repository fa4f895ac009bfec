// Copyright (c)  by Gleb E. Zaslavkiy
//MIT License
/*
Pretty printing of the secant convergence history: one row per iteration.
*/
use crate::numerical::ShootingBVP::Shooting_simple::SecantIteration;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Debug, PartialEq, Tabled)]
pub struct ConvergenceRow {
    #[tabled(rename = "iteration")]
    iteration: usize,
    #[tabled(rename = "c1")]
    c_prev: String,
    #[tabled(rename = "c2")]
    c_curr: String,
    #[tabled(rename = "g(c1)")]
    residual_prev: String,
    #[tabled(rename = "g(c2)")]
    residual_curr: String,
    #[tabled(rename = "|c1 - c2|")]
    cauchy_error: String,
}

impl From<&SecantIteration> for ConvergenceRow {
    fn from(it: &SecantIteration) -> Self {
        Self {
            iteration: it.iteration,
            c_prev: format!("{:.10}", it.c_prev),
            c_curr: format!("{:.10}", it.c_curr),
            residual_prev: format!("{:.3e}", it.residual_prev),
            residual_curr: format!("{:.3e}", it.residual_curr),
            cauchy_error: format!("{:.3e}", it.cauchy_error),
        }
    }
}

pub fn convergence_table(history: &[SecantIteration]) -> String {
    let rows: Vec<ConvergenceRow> = history.iter().map(ConvergenceRow::from).collect();
    let mut table = Table::new(&rows);
    table.with(Style::modern_rounded());
    table.to_string()
}

pub fn print_convergence_table(history: &[SecantIteration]) {
    println!("Secant iterations\n");
    println!("{}", convergence_table(history));
}
