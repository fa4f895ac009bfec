// Copyright (c)  by Gleb E. Zaslavkiy
//MIT License
//! # Shooting Task Parser Module
//!
//! Fills a `ShootingMethodSolver` from a task document (`title key: value, value` format of
//! `Utils::task_parser`) or from the same sections written as TOML. Both formats are turned
//! into a `DocumentMap` first and share one mapping into the solver.
//!
//! ## Configuration Structure
//!
//! ### solver_settings Section
//! - `initial_guesses`: two guesses of the unknown initial condition
//! - `tolerance`: bound on |c1 - c2|
//! - `max_iterations`: cap on secant updates
//! - `step_size`: RK4 step
//! - `loglevel`: `None` or `Some(Info)`, `Debug`, ... (Optional)
//!
//! ### boundary_conditions Section (Optional)
//! - `borders`: a, b
//! - `left`, `right`: condition type (`dirichlet` or `neumann`), value
//! - `params`: parameter vector passed to the right-hand side (Optional)
//!
//! ### postprocessing Section (Optional)
//! - `plot`, `save`, `save_to_csv`: booleans
//! - `filename`: stem of the saved files, plots go to its directory
//!
//! Common typos of titles and keys are accepted (`solve_settings`, `max_iter`, `tol`, ...).
//!
//! ## Usage Example
//! ```rust, ignore
//! let mut solver = ShootingMethodSolver::default();
//! let boundary = solver.parse_settings_from_str(task)?.unwrap();
//! let problem = boundary.into_problem(ode_system);
//! let outcome = solver.solve(&problem)?;
//! solver.run_postprocessing(&outcome)?;
//! ```
use crate::Utils::plots::plots;
use crate::Utils::task_parser::{
    DocumentMap, SectionMap, Value, keys_to_lower_case, parse_document_as, with_pseudonyms,
};
use crate::numerical::ShootingBVP::Shooting_error::ShootingError;
use crate::numerical::ShootingBVP::Shooting_simple::{
    BoundaryCondition, BoundaryConditionType, BoundaryValueProblem, ShootingMethodSolver,
    ShootingOutcome, State2,
};
use log::info;
use nalgebra::DVector;
use simplelog::LevelFilter;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Interval and boundary conditions read from the `boundary_conditions` section
#[derive(Debug, Clone, PartialEq)]
pub struct BoundarySettings {
    pub a: f64,
    pub b: f64,
    pub left_bc: BoundaryCondition,
    pub right_bc: BoundaryCondition,
    pub params: DVector<f64>,
}

impl BoundarySettings {
    pub fn into_problem<F>(self, ode_system: F) -> BoundaryValueProblem<F>
    where
        F: Fn(f64, &State2, &DVector<f64>) -> State2,
    {
        BoundaryValueProblem::new(ode_system, self.a, self.b, self.left_bc, self.right_bc)
            .with_params(self.params)
    }
}

fn invalid(title: &str, key: &str, expected: &str, got: &[Value]) -> ShootingError {
    let got: Vec<String> = got.iter().map(|v| v.to_string()).collect();
    ShootingError::InvalidConfig(format!(
        "{}.{}: expected {}, got [{}]",
        title,
        key,
        expected,
        got.join(", ")
    ))
}

/// values of a key; a missing key, `key: None` and `key:` all mean "not given"
fn values<'a>(section: &'a SectionMap, key: &str) -> Option<&'a [Value]> {
    match section.get(key) {
        Some(Some(values)) if !values.is_empty() => Some(values.as_slice()),
        _ => None,
    }
}

fn single<'a>(
    section: &'a SectionMap,
    title: &str,
    key: &str,
    expected: &str,
) -> Result<Option<&'a Value>, ShootingError> {
    match values(section, key) {
        None => Ok(None),
        Some([value]) => Ok(Some(value)),
        Some(other) => Err(invalid(title, key, expected, other)),
    }
}

fn float_value(section: &SectionMap, title: &str, key: &str) -> Result<Option<f64>, ShootingError> {
    let Some(value) = single(section, title, key, "a number")? else {
        return Ok(None);
    };
    value
        .as_float()
        .map(Some)
        .ok_or_else(|| invalid(title, key, "a number", std::slice::from_ref(value)))
}

fn usize_value(section: &SectionMap, title: &str, key: &str) -> Result<Option<usize>, ShootingError> {
    let Some(value) = single(section, title, key, "a non-negative integer")? else {
        return Ok(None);
    };
    value.as_usize().map(Some).ok_or_else(|| {
        invalid(
            title,
            key,
            "a non-negative integer",
            std::slice::from_ref(value),
        )
    })
}

fn bool_value(section: &SectionMap, title: &str, key: &str) -> Result<Option<bool>, ShootingError> {
    let Some(value) = single(section, title, key, "true or false")? else {
        return Ok(None);
    };
    value
        .as_boolean()
        .map(Some)
        .ok_or_else(|| invalid(title, key, "true or false", std::slice::from_ref(value)))
}

fn float_list(section: &SectionMap, title: &str, key: &str) -> Result<Option<Vec<f64>>, ShootingError> {
    let Some(list) = values(section, key) else {
        return Ok(None);
    };
    list.iter()
        .map(|v| v.as_float().ok_or_else(|| invalid(title, key, "numbers", list)))
        .collect::<Result<Vec<f64>, _>>()
        .map(Some)
}

fn boundary_condition(section: &SectionMap, key: &str) -> Result<BoundaryCondition, ShootingError> {
    let title = "boundary_conditions";
    let expected = "condition type and value, e.g. dirichlet, 1.0";
    let Some(list) = values(section, key) else {
        return Err(ShootingError::InvalidConfig(format!(
            "{}.{} is required",
            title, key
        )));
    };
    let [kind, value] = list else {
        return Err(invalid(title, key, expected, list));
    };
    let value = value
        .as_float()
        .ok_or_else(|| invalid(title, key, expected, list))?;
    let kind = kind
        .as_string()
        .map(|s| s.to_lowercase())
        .ok_or_else(|| invalid(title, key, expected, list))?;
    let bc_type = match kind.as_str() {
        "dirichlet" | "d" => BoundaryConditionType::Dirichlet,
        "neumann" | "n" => BoundaryConditionType::Neumann,
        _ => return Err(invalid(title, key, expected, list)),
    };
    Ok(BoundaryCondition { value, bc_type })
}

fn parse_log_level(values: &[Value]) -> Result<Option<LevelFilter>, ShootingError> {
    let error = || invalid("solver_settings", "loglevel", "None or Some(level)", values);
    let [value] = values else {
        return Err(error());
    };
    match value.as_option_string().ok_or_else(error)? {
        None => Ok(None),
        Some(level) => LevelFilter::from_str(&level).map(Some).map_err(|_| error()),
    }
}

fn header_pseudonyms() -> HashMap<String, Vec<String>> {
    HashMap::from([
        (
            "solver_settings".to_string(),
            vec!["solve_settings".to_string(), "solving_settings".to_string()],
        ),
        (
            "boundary_conditions".to_string(),
            vec![
                "boundary".to_string(),
                "boundaries".to_string(),
                "bc".to_string(),
            ],
        ),
        (
            "postprocessing".to_string(),
            vec!["postprocess".to_string(), "post_processing".to_string()],
        ),
    ])
}

fn field_pseudonyms() -> HashMap<String, Vec<String>> {
    HashMap::from([
        (
            "tolerance".to_string(),
            vec!["tol".to_string(), "abs_tolerance".to_string()],
        ),
        (
            "max_iterations".to_string(),
            vec!["max_iter".to_string(), "max_iterations_number".to_string()],
        ),
        (
            "step_size".to_string(),
            vec!["step".to_string(), "h".to_string()],
        ),
        (
            "initial_guesses".to_string(),
            vec!["guesses".to_string(), "initial_guess".to_string()],
        ),
        (
            "save_to_csv".to_string(),
            vec!["csv".to_string(), "save_csv".to_string()],
        ),
    ])
}

fn normalize(document: DocumentMap) -> DocumentMap {
    with_pseudonyms(
        keys_to_lower_case(document),
        &header_pseudonyms(),
        &field_pseudonyms(),
    )
}

fn toml_scalar(title: &str, key: &str, value: &toml::Value) -> Result<Value, ShootingError> {
    match value {
        toml::Value::String(s) => Ok(Value::String(s.clone())),
        toml::Value::Integer(i) => Ok(Value::Integer(*i)),
        toml::Value::Float(f) => Ok(Value::Float(*f)),
        toml::Value::Boolean(b) => Ok(Value::Boolean(*b)),
        toml::Value::Datetime(d) => Ok(Value::String(d.to_string())),
        toml::Value::Array(_) | toml::Value::Table(_) => Err(ShootingError::InvalidConfig(
            format!("{}.{}: nested arrays and tables are not supported", title, key),
        )),
    }
}

/// `[title]` tables of scalars or flat arrays into a DocumentMap
pub fn toml_to_document(input: &str) -> Result<DocumentMap, ShootingError> {
    let table: toml::Table = toml::from_str(input)
        .map_err(|e| ShootingError::InvalidConfig(format!("TOML parsing error: {}", e)))?;
    let mut document = DocumentMap::new();
    for (title, section) in &table {
        let toml::Value::Table(section) = section else {
            return Err(ShootingError::InvalidConfig(format!(
                "top-level key {} must be a [section]",
                title
            )));
        };
        let mut map = SectionMap::new();
        for (key, value) in section {
            let values = match value {
                toml::Value::Array(items) => items
                    .iter()
                    .map(|item| toml_scalar(title, key, item))
                    .collect::<Result<Vec<Value>, _>>()?,
                scalar => vec![toml_scalar(title, key, scalar)?],
            };
            map.insert(key.clone(), Some(values));
        }
        document.insert(title.clone(), map);
    }
    Ok(document)
}

impl ShootingMethodSolver {
    /// Maps `solver_settings` onto the solver; keys that are not given keep their values.
    pub fn set_params_from_hashmap(&mut self, document: &DocumentMap) -> Result<(), ShootingError> {
        let title = "solver_settings";
        let Some(settings) = document.get(title) else {
            return Err(ShootingError::InvalidConfig(format!(
                "section {} is missing",
                title
            )));
        };
        if let Some(guesses) = float_list(settings, title, "initial_guesses")? {
            let [c1, c2] = guesses[..] else {
                return Err(ShootingError::InvalidConfig(format!(
                    "{}.initial_guesses: expected two guesses, got {}",
                    title,
                    guesses.len()
                )));
            };
            self.initial_guesses = (c1, c2);
        }
        if let Some(tolerance) = float_value(settings, title, "tolerance")? {
            self.tolerance = tolerance;
        }
        if let Some(max_iterations) = usize_value(settings, title, "max_iterations")? {
            self.max_iterations = max_iterations;
        }
        if let Some(step_size) = float_value(settings, title, "step_size")? {
            self.step_size = step_size;
        }
        if let Some(loglevel) = values(settings, "loglevel") {
            match parse_log_level(loglevel)? {
                Some(level) => self.set_log_level(level),
                None => self.disable_logging(),
            }
        }
        Ok(())
    }

    /// Reads the `postprocessing` flags. Nothing is written until `run_postprocessing`.
    pub fn set_postprocessing_from_hashmap(
        &mut self,
        document: &DocumentMap,
    ) -> Result<(), ShootingError> {
        let title = "postprocessing";
        let Some(section) = document.get(title) else {
            return Ok(());
        };
        if let Some(plot) = bool_value(section, title, "plot")? {
            self.postprocessing.plot = plot;
        }
        if let Some(save) = bool_value(section, title, "save")? {
            self.postprocessing.save = save;
        }
        if let Some(save_to_csv) = bool_value(section, title, "save_to_csv")? {
            self.postprocessing.save_to_csv = save_to_csv;
        }
        if let Some(name) = single(section, title, "filename", "a file name")? {
            if let Some(Some(name)) = name.as_option_string() {
                self.postprocessing.filename = name;
            }
        }
        Ok(())
    }

    /// Applies an already parsed document and returns its boundary conditions, if any.
    pub fn apply_document(
        &mut self,
        document: DocumentMap,
    ) -> Result<Option<BoundarySettings>, ShootingError> {
        let document = normalize(document);
        self.set_params_from_hashmap(&document)?;
        self.set_postprocessing_from_hashmap(&document)?;
        let Some(section) = document.get("boundary_conditions") else {
            return Ok(None);
        };
        let title = "boundary_conditions";
        let borders = float_list(section, title, "borders")?.unwrap_or_default();
        let [a, b] = borders[..] else {
            return Err(ShootingError::InvalidConfig(format!(
                "{}.borders: expected a, b",
                title
            )));
        };
        let params = float_list(section, title, "params")?.unwrap_or_default();
        Ok(Some(BoundarySettings {
            a,
            b,
            left_bc: boundary_condition(section, "left")?,
            right_bc: boundary_condition(section, "right")?,
            params: DVector::from_vec(params),
        }))
    }

    /// Parses a task document in the `title key: value` format
    pub fn parse_settings_from_str(
        &mut self,
        input: &str,
    ) -> Result<Option<BoundarySettings>, ShootingError> {
        let document = parse_document_as(input, None).map_err(ShootingError::InvalidConfig)?;
        self.apply_document(document)
    }

    pub fn parse_settings_from_toml(
        &mut self,
        input: &str,
    ) -> Result<Option<BoundarySettings>, ShootingError> {
        let document = toml_to_document(input)?;
        self.apply_document(document)
    }

    /// `.toml` files are read as TOML, anything else as a task document
    pub fn parse_file(&mut self, path: &Path) -> Result<Option<BoundarySettings>, ShootingError> {
        let input = fs::read_to_string(path)?;
        info!("reading task from {}", path.display());
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => self.parse_settings_from_toml(&input),
            _ => self.parse_settings_from_str(&input),
        }
    }

    /// Saves and plots the solution as requested by `self.postprocessing`
    pub fn run_postprocessing(&self, outcome: &ShootingOutcome) -> Result<(), ShootingError> {
        let options = &self.postprocessing;
        let report = outcome.report();
        if options.save {
            let filename = format!("{}.txt", options.filename);
            report
                .trajectory
                .save_to_file(&options.arg, &options.values, &filename)?;
            info!("solution saved to {}", filename);
        }
        if options.save_to_csv {
            let filename = format!("{}.csv", options.filename);
            report
                .trajectory
                .save_to_csv(&options.arg, &options.values, &filename)?;
            info!("solution saved to {}", filename);
        }
        if options.plot {
            let directory = Path::new(&options.filename)
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            plots(
                &options.arg,
                &options.values,
                &report.x_mesh(),
                &report.y(),
                directory,
            )?;
            info!("plots saved to {}", directory.display());
        }
        Ok(())
    }
}

const TEMPLATE: &str = r#"// shooting method task
solver_settings
// two guesses of the unknown initial condition
initial_guesses: 0.1, 3.0
tolerance: 1e-6
max_iterations: 10
step_size: 0.01
// None or Some(Off), Some(Error), Some(Warn), Some(Info), Some(Debug), Some(Trace)
loglevel: None
boundary_conditions
// a, b
borders: 0.0, 1.0
// dirichlet (y = value) or neumann (y' = value), value
left: dirichlet, 1.0
right: dirichlet, 2.0
postprocessing
plot: false
save: false
save_to_csv: false
filename: shooting_result
"#;

/// Writes a task file with every option and a comment on each
pub fn create_template_file(path: &Path) -> Result<(), ShootingError> {
    fs::write(path, TEMPLATE)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use tempfile::tempdir;

    fn linear(_x: f64, y: &State2, _p: &DVector<f64>) -> State2 {
        State2::new(y[1], 0.0)
    }

    #[test]
    fn test_parse_settings_from_str() {
        let task = "
        solver_settings
        initial_guesses: 0.5, 2
        tolerance: 1e-8
        max_iterations: 20
        step_size: 0.05
        loglevel: Some(Debug)
        postprocessing
        save_to_csv: true
        filename: results/run
        ";
        let mut solver = ShootingMethodSolver::default();
        let boundary = solver.parse_settings_from_str(task).unwrap();
        assert!(boundary.is_none());
        assert_eq!(solver.initial_guesses, (0.5, 2.0));
        assert_eq!(solver.tolerance, 1e-8);
        assert_eq!(solver.max_iterations, 20);
        assert_eq!(solver.step_size, 0.05);
        assert_eq!(solver.log_level(), Some(LevelFilter::Debug));
        assert!(solver.postprocessing.save_to_csv);
        assert!(!solver.postprocessing.plot);
        assert_eq!(solver.postprocessing.filename, "results/run");
    }

    #[test]
    fn test_missing_keys_keep_defaults_and_typos_are_accepted() {
        let mut solver = ShootingMethodSolver::default();
        solver
            .parse_settings_from_str("Solve_Settings max_iter: 3 tol: 1e-4")
            .unwrap();
        assert_eq!(solver.max_iterations, 3);
        assert_eq!(solver.tolerance, 1e-4);
        assert_eq!(solver.initial_guesses, (0.1, 3.0));
        assert_eq!(solver.step_size, 0.01);
    }

    #[test]
    fn test_boundary_section_builds_problem() {
        let task = "
        solver_settings
        initial_guesses: 0, 2
        boundary_conditions
        borders: 0, 1
        left: Dirichlet, 0.0
        right: neumann, 3
        ";
        let mut solver = ShootingMethodSolver::default();
        let boundary = solver.parse_settings_from_str(task).unwrap().unwrap();
        assert_eq!(boundary.left_bc, BoundaryCondition::dirichlet(0.0));
        assert_eq!(boundary.right_bc, BoundaryCondition::neumann(3.0));
        assert_eq!(boundary.params.len(), 0);
        let problem = boundary.into_problem(linear);
        let outcome = solver.solve(&problem).unwrap();
        assert!(outcome.is_converged());
        assert_abs_diff_eq!(outcome.report().slope, 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_invalid_settings() {
        let mut solver = ShootingMethodSolver::default();
        let cases = [
            "solver_settings initial_guesses: 0.1, 0.2, 0.3",
            "solver_settings max_iterations: 2.5",
            "solver_settings tolerance: small",
            "solver_settings loglevel: Some(Loud)",
            "postprocessing plot: true",
            "solver_settings step_size: 0.1 boundary_conditions borders: 0 left: robin, 1 right: d, 1",
            "solver_settings step_size: 0.1 boundary_conditions borders: 0, 1 left: dirichlet, 1",
        ];
        for task in cases {
            assert!(
                matches!(
                    solver.parse_settings_from_str(task),
                    Err(ShootingError::InvalidConfig(_))
                ),
                "accepted: {}",
                task
            );
        }
    }

    #[test]
    fn test_parse_settings_from_toml() {
        let task = r#"
        [solver_settings]
        initial_guesses = [0.1, 3.0]
        max_iterations = 15
        step_size = 0.02
        loglevel = "None"

        [boundary_conditions]
        borders = [1.0, 0.0]
        left = ["dirichlet", 2.0]
        right = ["dirichlet", 1.0]
        params = [0.5]

        [postprocessing]
        save = true
        "#;
        let mut solver = ShootingMethodSolver::default();
        solver.set_log_level(LevelFilter::Info);
        let boundary = solver.parse_settings_from_toml(task).unwrap().unwrap();
        assert_eq!(solver.max_iterations, 15);
        assert_eq!(solver.step_size, 0.02);
        assert!(solver.log_level().is_none());
        assert!(solver.postprocessing.save);
        assert_eq!((boundary.a, boundary.b), (1.0, 0.0));
        assert_eq!(boundary.params, DVector::from_vec(vec![0.5]));
    }

    #[test]
    fn test_toml_rejects_nested_tables() {
        assert!(matches!(
            toml_to_document("[solver_settings.inner]\nstep_size = 0.1"),
            Err(ShootingError::InvalidConfig(_))
        ));
        assert!(matches!(
            toml_to_document("step_size = 0.1"),
            Err(ShootingError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_template_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("task.txt");
        create_template_file(&path).unwrap();
        let mut solver = ShootingMethodSolver::default();
        solver.set_log_level(LevelFilter::Warn);
        let boundary = solver.parse_file(&path).unwrap().unwrap();
        assert_eq!(solver.initial_guesses, (0.1, 3.0));
        assert_eq!(solver.tolerance, 1e-6);
        assert!(solver.log_level().is_none());
        assert_eq!(boundary.left_bc, BoundaryCondition::dirichlet(1.0));
        assert_eq!(boundary.right_bc, BoundaryCondition::dirichlet(2.0));
        assert_eq!(solver.postprocessing.filename, "shooting_result");
    }

    #[test]
    fn test_parse_missing_file() {
        let dir = tempdir().unwrap();
        let mut solver = ShootingMethodSolver::default();
        assert!(matches!(
            solver.parse_file(&dir.path().join("absent.toml")),
            Err(ShootingError::Io(_))
        ));
    }

    #[test]
    fn test_run_postprocessing_writes_files() {
        let dir = tempdir().unwrap();
        let stem = dir.path().join("linear");
        let mut solver = ShootingMethodSolver::default().with_step_size(0.25);
        solver.postprocessing.save = true;
        solver.postprocessing.save_to_csv = true;
        solver.postprocessing.filename = stem.to_str().unwrap().to_string();
        let problem = BoundaryValueProblem::dirichlet(linear, 0.0, 1.0, 0.0, 1.0);
        let outcome = solver.solve(&problem).unwrap();
        solver.run_postprocessing(&outcome).unwrap();
        let csv = fs::read_to_string(dir.path().join("linear.csv")).unwrap();
        assert_eq!(csv.lines().count(), 6);
        assert_eq!(csv.lines().next(), Some("x,y,z"));
        assert!(dir.path().join("linear.txt").exists());
    }
}
