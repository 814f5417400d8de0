//! Command implementations for sna CLI
//!
//! Each command module provides a `run` function that executes the command logic.

pub mod cliques;
pub mod prepare;
pub mod run;
