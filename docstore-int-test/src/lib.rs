//! Integration-test support for the document store.
//!
//! The crate hosts the in-memory postgres double and shared test helpers; the
//! actual integration suites live under `tests/`.

pub mod predicate;
pub mod server;
pub mod test_util;
