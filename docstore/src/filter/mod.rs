//! Backend-agnostic query filters.
//!
//! A [Filter] is a binary expression tree: leaf nodes are single
//! field-operator-value comparisons, composite nodes combine two filters with
//! logical AND/OR. Filters are immutable and composable through the
//! [Filter::and] / [Filter::or] combinators, and are lowered to backend-native
//! predicates by each storage backend.
//!
//! ```rust
//! use docstore::filter::field;
//!
//! let filter = field("status").eq("ACTIVE").and(field("retries").lt(3));
//! ```

mod filter;
mod fluent;

pub use filter::*;
pub use fluent::*;
