// Copyright (c)  by Gleb E. Zaslavkiy
//MIT License
//! examples of usage of RustedShooting
/// BVPs solved with the shooting method
pub mod shooting_examples;
