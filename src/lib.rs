pub mod error;
pub mod models;
pub mod output;
pub mod parser;
pub mod plot;
pub mod stats;

pub use error::{Error, Result};
