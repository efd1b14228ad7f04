//! The HogQL syntax tree, the symbols resolution attaches to it, and the low-level
//! representation of printed SQL.

pub mod sql;
