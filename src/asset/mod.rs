//! Asset classification, path mapping and processing.

mod kind;
pub mod minify;
mod process;
mod route;

// Types
pub use kind::Strategy;
pub use route::{AssetRoute, output_path};

// Processing (side effects)
pub use process::{process_file, remove_output};
