//! # Outlay Server
//!
//! HTTP API server for the Outlay expense service.
//!
//! The surface is one resource (`/expenses`) with create, list, partial
//! update, and delete. Handlers live in [`server`] alongside the routing
//! configuration; the system is a thin validation-and-passthrough layer over
//! a single document collection, so there is no deeper component breakdown.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod server;
pub mod store;

pub use server::{Server, ServerConfig};
pub use store::{ExpenseStore, MemoryStore, MongoStore};
