pub mod advisor;
pub mod arbitrage;
pub mod config;
pub mod error;
pub mod jupiter;
pub mod price;
pub mod solana;
pub mod utils;
