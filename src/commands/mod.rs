//! Command handlers.
//!
//! Each handler has a store-agnostic core so the same flow runs against
//! Cosmos DB and the in-memory store.

pub mod demo;
pub mod generate;
pub mod load;
pub mod query;
