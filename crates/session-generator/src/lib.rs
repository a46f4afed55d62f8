//! Synthetic session generator.
//!
//! This crate provides the [`SessionGenerator`] which produces
//! [`UserSession`](hpk_core::UserSession) records consistent with a
//! [`TenantCatalog`](hpk_core::TenantCatalog). Each record is drawn
//! independently of every other record, so generation can be split across
//! batches or workers freely.
//!
//! # Architecture
//!
//! ```text
//! TenantCatalog
//!        │
//!        ▼
//! ┌──────────────────┐
//! │ SessionGenerator │
//! │                  │
//! │  - catalog       │
//! │  - rng (StdRng)  │
//! │  - window_days   │
//! └────────┬─────────┘
//!          │
//!          ▼
//!    UserSession { id, tenantId, userId, sessionId, activity, timestamp }
//! ```
//!
//! # Example
//!
//! ```rust
//! use hpk_core::TenantCatalog;
//! use session_generator::SessionGenerator;
//!
//! let mut generator = SessionGenerator::with_seed(TenantCatalog::builtin(), 42);
//! let session = generator.generate();
//! assert!(session.user_id.starts_with("user-"));
//! assert!(session.session_id.starts_with("session-"));
//! ```
//!
//! # Generators
//!
//! - `identifiers` - record ids, `user-<n>` and `session-<8 hex>` key segments
//! - `timestamp` - timestamps inside a trailing window of days
//! - `activity` - one name out of the activity vocabulary

pub mod generator;
pub mod generators;

// Re-exports for convenience
pub use generator::{GeneratorError, SessionGenerator, SessionIterator, DEFAULT_WINDOW_DAYS};
