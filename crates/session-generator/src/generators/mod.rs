//! Individual value generators for the fields of a session record.

pub mod activity;
pub mod identifiers;
pub mod timestamp;
