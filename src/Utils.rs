// Copyright (c)  by Gleb E. Zaslavkiy
//MIT License
/// pretty printing of the secant iteration history
pub mod convergence_table;
/// saving solution matrices to txt and csv
pub mod logger;
/// png plots of the solution components
pub mod plots;
/// parser of the solver task documents
pub mod task_parser;
