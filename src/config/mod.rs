pub mod env;
mod loader;

pub use env::{AppConfig, DirectoryConfig, EmailConfig, FetchConfig, TargetConfig};
pub use loader::load_config;
