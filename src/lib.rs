//! Account state synchronization for Pulse.
//!
//! - [`account`]: domain types and the seeded default account
//! - [`mapper`]: lenient payload decoding and normalization
//! - [`transport`]: backend calls behind the [`transport::AccountTransport`] trait
//! - [`store`]: the observable account container

pub mod account;
pub mod config;
pub mod mapper;
pub mod store;
pub mod transport;
pub mod util;
