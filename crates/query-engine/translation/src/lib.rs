//! Translation of HogQL queries into executable ClickHouse SQL.

pub mod translation;
