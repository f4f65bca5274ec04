//! SeaORM entity definitions
//!
//! Table mappings for the relational schema in `migrations/001_initial.sql`.

pub mod accounts;
pub mod investments;
pub mod transactions;
pub mod users;
