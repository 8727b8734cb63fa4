pub mod config;
pub mod context;
pub mod feedback;
pub mod formatters;
pub mod group;
pub mod modules;
pub mod push;
pub mod recommend;
pub mod split;
pub mod tokens;

use std::path::Path;
use superstack_core::{config::Config, store::JsonStore};

/// Everything a command needs that was resolved before dispatch.
pub struct Env<'a> {
    pub modules_root: &'a Path,
    pub store: &'a dyn JsonStore,
    pub config: &'a Config,
}
