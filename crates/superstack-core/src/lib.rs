pub mod active;
pub mod catalog;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod feedback;
pub mod format;
pub mod group;
pub mod io;
pub mod paths;
pub mod recommend;
pub mod split;
pub mod store;
pub mod tokens;

pub use error::{Result, SuperstackError};
