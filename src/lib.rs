pub mod cleanup;
pub mod cli;
pub mod config;
pub mod error;
pub mod organizer;
pub mod prompt;
pub mod relocator;
pub mod scanner;

pub use astro_sort_common as common;
