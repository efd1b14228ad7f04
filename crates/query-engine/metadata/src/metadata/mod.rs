//! Metadata information regarding the virtual HogQL database.

pub mod database;
pub mod hogql;

// re-export without modules
pub use database::*;
pub use hogql::{hogql_database, TEAM_ID_COLUMN};
