pub mod config;
pub mod credentials;
pub mod error;
pub mod paths;

pub use config::Config;
pub use credentials::Credentials;
pub use error::{Error, Result};
pub use paths::Paths;
