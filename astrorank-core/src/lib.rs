pub mod catalog;
pub mod config;
pub mod coords;
pub mod error;
pub mod keys;
pub mod logging;
pub mod secondary;
pub mod session;
pub mod store;

#[cfg(test)]
mod test_support;

pub use error::{AstroError, Result};
