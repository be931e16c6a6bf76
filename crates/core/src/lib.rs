pub mod config;
pub mod discovery;
pub mod error;
pub mod sitemap;
pub mod types;

pub use config::{Config, load_config, parse_config_str};
pub use discovery::{Discovery, RouteSource, discover_routes};
pub use error::{Error, Result};
pub use types::*;
