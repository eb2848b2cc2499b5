pub mod affect;
pub mod cognition;
pub mod config;
pub mod emotes;
pub mod entropy;
pub mod humanize;
pub mod io;
pub mod memory;
pub mod runtime;
pub mod sensory;
pub mod state;
pub mod types;
