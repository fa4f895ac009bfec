// Copyright (c)  by Gleb E. Zaslavkiy
//MIT License
//! Saving of a solution matrix into a text or csv file.
//! The matrix has one row per variable and one column per mesh point;
//! files get one line per mesh point: `x value_1 ... value_n`.
use csv::Writer;
use nalgebra::{DMatrix, DVector};
use std::fs::File;
use std::io::{self, Write};

fn check_shapes(matrix: &DMatrix<f64>, headers: &[String], x_mesh: &DVector<f64>) -> io::Result<()> {
    if matrix.nrows() != headers.len() || matrix.ncols() != x_mesh.len() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "matrix {}x{} does not fit {} headers and {} mesh points",
                matrix.nrows(),
                matrix.ncols(),
                headers.len(),
                x_mesh.len()
            ),
        ));
    }
    Ok(())
}

fn header_row(headers: &[String], arg: &str) -> Vec<String> {
    let mut headers_with_x = Vec::with_capacity(headers.len() + 1);
    headers_with_x.push(arg.to_string());
    headers_with_x.extend(headers.iter().cloned());
    headers_with_x
}

fn data_row(matrix: &DMatrix<f64>, x_mesh: &DVector<f64>, j: usize) -> Vec<String> {
    let mut row_data = Vec::with_capacity(matrix.nrows() + 1);
    row_data.push(x_mesh[j].to_string());
    row_data.extend(matrix.column(j).iter().map(|val| val.to_string()));
    row_data
}

/// tab-separated text file
pub fn save_matrix_to_file(
    matrix: &DMatrix<f64>,
    headers: &[String],
    filename: &str,
    x_mesh: &DVector<f64>,
    arg: &str,
) -> io::Result<()> {
    check_shapes(matrix, headers, x_mesh)?;
    let mut file = File::create(filename)?;
    writeln!(file, "{}", header_row(headers, arg).join("\t"))?;
    for j in 0..matrix.ncols() {
        writeln!(file, "{}", data_row(matrix, x_mesh, j).join("\t"))?;
    }
    Ok(())
}

pub fn save_matrix_to_csv(
    matrix: &DMatrix<f64>,
    headers: &[String],
    filename: &str,
    x_mesh: &DVector<f64>,
    arg: &str,
) -> io::Result<()> {
    check_shapes(matrix, headers, x_mesh)?;
    let file = File::create(filename)?;
    let mut writer = Writer::from_writer(file);
    writer.write_record(&header_row(headers, arg))?;
    for j in 0..matrix.ncols() {
        writer.write_record(&data_row(matrix, x_mesh, j))?;
    }
    writer.flush()?;
    Ok(())
}
