pub mod chrome_finder;
pub mod error;
pub mod profile;
pub mod provider;

pub use chrome_finder::ChromeFinder;
pub use error::{Error, Result};
pub use profile::ProfileManager;
pub use provider::{ChromeOptions, ChromeSurfaceProvider, ProfileChoice};
