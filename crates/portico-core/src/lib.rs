//! Portal automation engine: one shared session, a login coordinator and
//! the list extraction pipeline, all driven through an injectable
//! [`SurfaceProvider`].

pub mod auth;
pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod extract;
pub mod outcome;
pub mod record;
mod script;
pub mod session;
pub mod surface;

#[cfg(test)]
mod testing;

pub use client::{PortalClient, PortalClientBuilder};
pub use codec::{Base64Codec, CredentialCodec, CredentialStore, Credentials};
pub use config::{PortalConfig, SettleBudget, Timings};
pub use error::{Error, ErrorKind, Result};
pub use outcome::{AuthResult, FetchResult};
pub use record::ExtractedRecord;
pub use session::{Session, SessionState};
pub use surface::{SurfaceHandle, SurfaceProvider};
