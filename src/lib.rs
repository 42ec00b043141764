//! Terminal block browser for Ethereum: pick a block number, list its
//! transactions in a grid, inspect the selected one as JSON.

pub mod config;
pub mod core;
pub mod ui;
pub mod utils;
