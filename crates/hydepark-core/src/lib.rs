pub mod config;
pub mod deploy;
pub mod error;
pub mod host;
pub mod io;
pub mod network;
pub mod poll;
pub mod step;
pub mod systemd;
pub mod verify;

#[cfg(test)]
mod testing;

pub use error::{DeployError, Result};
