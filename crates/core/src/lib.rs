pub mod config;
pub mod decode;
pub mod error;
pub mod layout;
pub mod model;
pub mod time;
pub mod tree;

pub use error::{Result, TracefallError};
