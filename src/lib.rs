pub mod anidb;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

pub use error::{AnicatError, Result};
