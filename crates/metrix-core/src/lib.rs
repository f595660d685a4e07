//! metrix core: metric schema, validation, error taxonomy, and stores.
//!
//! Transport-agnostic. The HTTP surface lives in `metrix-api`; this crate
//! only knows what a valid metric is and how to keep a collection of them.
//!
//! Panics, `unwrap`, and `expect` are compile-denied here. All fallible paths
//! surface as `MetrixError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod metric;
pub mod store;

/// Shared result type.
pub use error::{MetrixError, Result};
pub use metric::{CalculationType, Metric, MetricDraft, MetricId, ValidationErrors};
pub use store::{MetricStore, StoreUrl};
