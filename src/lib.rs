pub mod classifier;
pub mod config;
pub mod error;
pub mod payload;
pub mod preprocess;
pub mod server;
pub mod torch;

#[cfg(test)]
mod testutil;
