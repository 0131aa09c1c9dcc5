pub mod config;
pub mod fd_limit;
pub mod imgtools_toml;
pub mod logger;

pub use config::*;
pub use fd_limit::{FDS_PER_WORKER, cap_workers_by_fd_limit, max_open_fds, max_workers_by_fd_limit};
pub use imgtools_toml::{apply_file_to_opts, load_imgtools_toml};
pub use logger::setup_logging;
