// Copyright (c)  by Gleb E. Zaslavkiy
//MIT License
use crate::numerical::ShootingBVP::Shooting_error::ShootingError;
use nalgebra::{DMatrix, DVector};
use plotters::prelude::*;
use std::path::Path;

fn plot_error<E: std::fmt::Display>(e: E) -> ShootingError {
    ShootingError::Io(format!("plotting failed: {}", e))
}

/// axis range with 5% margin; a flat curve gets a unit range around its value
fn padded_range(min: f64, max: f64) -> std::ops::Range<f64> {
    let width = max - min;
    if width.abs() < f64::EPSILON * (1.0 + min.abs()) {
        return (min - 1.0)..(max + 1.0);
    }
    (min - 0.05 * width)..(max + 0.05 * width)
}

/// One png per variable, `<directory>/<variable>.png`.
/// `y_result` has one row per variable and one column per mesh point.
pub fn plots(
    arg: &str,
    values: &[String],
    t_result: &DVector<f64>,
    y_result: &DMatrix<f64>,
    directory: &Path,
) -> Result<(), ShootingError> {
    if y_result.nrows() != values.len() || y_result.ncols() != t_result.len() {
        return Err(ShootingError::InvalidConfig(format!(
            "cannot plot {}x{} solution with {} names and {} mesh points",
            y_result.nrows(),
            y_result.ncols(),
            values.len(),
            t_result.len()
        )));
    }
    let x = t_result;
    let x_range = padded_range(x.min(), x.max());
    for (row, varname) in values.iter().enumerate() {
        let y_row = y_result.row(row);
        let y_range = padded_range(y_row.min(), y_row.max());
        let filename = directory.join(format!("{}.png", varname));
        let root_area = BitMapBackend::new(&filename, (800, 600)).into_drawing_area();
        root_area.fill(&WHITE).map_err(plot_error)?;

        let mut chart = ChartBuilder::on(&root_area)
            .caption(varname, ("sans-serif", 50))
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(30)
            .build_cartesian_2d(x_range.clone(), y_range)
            .map_err(plot_error)?;

        chart
            .configure_mesh()
            .x_desc(arg)
            .y_desc(varname)
            .draw()
            .map_err(plot_error)?;

        let series: Vec<(f64, f64)> = x.iter().zip(y_row.iter()).map(|(&x, &y)| (x, y)).collect();
        chart
            .draw_series(LineSeries::new(series, &Palette99::pick(row)))
            .map_err(plot_error)?
            .label(format!(" {}", varname))
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], &Palette99::pick(row))
            });

        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(plot_error)?;
        root_area.present().map_err(plot_error)?;
    }
    Ok(())
}
