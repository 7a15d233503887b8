//! Time abstractions
//!
//! - **Clock abstractions**: [`SystemClock`] for production and [`MockClock`]
//!   for deterministic tests of anything that stamps or ages data
//!
//! ## Usage
//!
//! ```rust
//! use std::time::Duration;
//!
//! use securecache_common::time::{Clock, MockClock};
//!
//! let clock = MockClock::at_unix_secs(1_700_000_000);
//! clock.advance(Duration::from_secs(5));
//! assert_eq!(clock.secs_since_epoch(), 1_700_000_005);
//! ```

pub mod clock;

pub use clock::{Clock, MockClock, SystemClock};
