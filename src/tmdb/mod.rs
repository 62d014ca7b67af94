pub mod client;
pub mod types;

#[cfg(test)]
pub mod fake;

pub use client::*;
pub use types::*;
