//! Reading sessions back by whatever part of the key the caller holds.
//!
//! The cheapest read is chosen from the segments available:
//!
//! | Held | Pattern | Store operation |
//! |---|---|---|
//! | tenant, user, session, id | [`QueryPattern::PointRead`] | lookup by id in one partition |
//! | tenant, user, session | [`QueryPattern::FullKey`] | query scoped to one partition |
//! | tenant, user | [`QueryPattern::TenantAndUser`] | query scoped to a key prefix |
//! | exactly one key field | [`QueryPattern::SingleField`] | cross-partition fan-out |
//!
//! Anything else (no key, or a lower level without the one above it) is
//! rejected before the store is contacted.

mod dispatcher;
mod error;
mod pattern;

pub use dispatcher::{QueryDispatcher, QueryItem, ResultPage};
pub use error::QueryError;
pub use pattern::{KeyFilter, QueryPattern};
