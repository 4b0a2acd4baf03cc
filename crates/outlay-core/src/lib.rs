//! # Outlay Core
//!
//! Core types for the Outlay expense service.
//!
//! This crate provides the foundations shared across the Outlay crates:
//! - The unified error type
//! - The `Expense` record and partial-update type
//! - The field validation rules applied at the request boundary

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod expense;

pub use error::{Error, Result};
pub use expense::{Expense, ExpenseUpdate, DEFAULT_CATEGORY};
