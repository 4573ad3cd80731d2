//! Tests for the interpreter
//!
//! Organized by feature area

mod error_tests;
mod helpers;
mod trace_tests;
