//! Client toolkit for the VAI token-and-referral platform.
//!
//! The crate wraps the platform's three on-chain contracts (VAI token,
//! membership, bootstrap bay) behind typed accessors and composes their raw
//! reads into ready-to-render views: portfolio, affiliate standing, bootstrap
//! round state, and transaction history. Writes go through single-purpose
//! dispatchers that return the transaction hash as soon as the node accepts
//! it. A small polling cache keeps the views fresh and drops out-of-order
//! responses.
//!
//! Contract addresses come from the environment per chain id (see
//! [`config`]); the `vai` binary is a thin CLI over the same library surface.

pub mod aggregate;
pub mod cache;
pub mod config;
pub mod contracts;
pub mod dispatch;
pub mod referral;
pub mod rpc;
pub mod units;

mod error;

pub use error::ClientError;
