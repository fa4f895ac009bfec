// Copyright (c)  by Gleb E. Zaslavkiy
//MIT License
#![allow(non_snake_case)]
use RustedShooting::Examples::shooting_examples::shooting_examples;
use std::process::ExitCode;

fn main() -> ExitCode {
    // example number can be passed as the first argument
    let example = match std::env::args().nth(1).map(|arg| arg.parse::<usize>()) {
        None => 0,
        Some(Ok(example)) => example,
        Some(Err(e)) => {
            eprintln!("example number must be a non-negative integer: {}", e);
            return ExitCode::FAILURE;
        }
    };
    match shooting_examples(example) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
