//! Type definitions of the HogQL AST and helpers to build and print it.

pub mod ast;
pub mod helpers;
pub mod string;
pub mod symbols;
