//! Scripts for deploying and initializing the stablecoin contracts and their
//! Uniswap V3 liquidity.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod artifacts;
pub mod calldata;
pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod constants;
pub mod errors;
pub mod executor;
pub mod pipeline;
pub mod record;
pub mod solidity;
pub mod ticks;
pub mod types;

#[cfg(test)]
mod test_helpers;
