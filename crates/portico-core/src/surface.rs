use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

use crate::Result;

/// Opaque reference to one page surface held by a provider
///
/// Only `Session` asks a provider for new handles or destroys them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceHandle(u64);

impl SurfaceHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SurfaceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface#{}", self.0)
    }
}

/// Supplies isolated, navigable, script-injectable pages
#[async_trait]
pub trait SurfaceProvider: Send + Sync {
    /// Open a new blank surface
    async fn create(&self) -> Result<SurfaceHandle>;

    /// Load `url` and return once the navigation has committed
    async fn navigate(&self, handle: SurfaceHandle, url: &str) -> Result<()>;

    /// False once the surface was closed, including by someone else
    async fn is_open(&self, handle: SurfaceHandle) -> bool;

    async fn current_url(&self, handle: SurfaceHandle) -> Result<String>;

    /// Evaluate `code` in the page and return its JSON value
    async fn inject_script(&self, handle: SurfaceHandle, code: &str) -> Result<Value>;

    /// Close the surface; closing an already-closed surface is not an error
    async fn destroy(&self, handle: SurfaceHandle) -> Result<()>;

    /// Show or hide the surface to the user
    async fn set_visible(&self, handle: Option<SurfaceHandle>, visible: bool) -> Result<()>;
}
