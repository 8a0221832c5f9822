pub mod common;
pub mod config;
pub mod daemon;
pub mod item;
pub mod prompt;
pub mod sync;
