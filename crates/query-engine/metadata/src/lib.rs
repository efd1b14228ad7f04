//! The schema catalog HogQL queries are resolved against.

pub mod metadata;
