//! Cache client wrapper and its backend port.

mod client;
mod key;
pub mod ports;

pub use client::CacheClient;
pub use key::KeyFunction;
