//! Engine module: CLI parsing, command handling, progress display and path helpers

pub mod arg_parser;
pub mod handlers;
pub mod progress;
pub mod tools;

// Re-export commonly used functions
pub use arg_parser::Cli;
pub use handlers::{handle_run, setup_opts};
pub use tools::{
    glob_match, is_os_hidden_file, path_relative_to, path_to_slash_string, series_folder,
    should_include_in_walk,
};
