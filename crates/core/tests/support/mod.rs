//! Shared test helpers for `securecache-core` integration tests.
//!
//! In-memory doubles for the cache, queue and scheduler ports that record
//! exactly what crosses the port boundary.

#![allow(dead_code)]

pub mod backends;

pub const TEST_KEY: &str = "kPEDO_pSrPh3qGJVfGAflLZXKAh4AuHU64tTlP-f_PY=";
