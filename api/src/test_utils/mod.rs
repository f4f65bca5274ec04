//! Test utilities
//!
//! Hand-written in-memory implementations of every port, plus fixtures.
//! The account and transaction mocks share storage so ledger effects land on
//! the same accounts a service reads back.

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
