use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::{
    Bounds, GetWindowForTargetParams, SetWindowBoundsParams, WindowState,
};
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::{Handler, Page};
use futures::StreamExt;
use portico_core::{SurfaceHandle, SurfaceProvider};
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::{ChromeFinder, Error, ProfileManager, Result};

/// Which profile directory a launched browser uses
#[derive(Debug, Clone, Default)]
pub enum ProfileChoice {
    #[default]
    Temporary,
    Named(String),
    Path(PathBuf),
}

/// How the provider obtains its browser
#[derive(Debug, Clone)]
pub struct ChromeOptions {
    pub chrome_path: Option<PathBuf>,
    pub profile: ProfileChoice,
    /// Attach to an already running Chrome (`http://localhost:9222`) instead of launching
    pub connect_url: Option<String>,
    /// Start with a visible window
    pub visible: bool,
    pub window_size: (u32, u32),
}

impl Default for ChromeOptions {
    fn default() -> Self {
        Self {
            chrome_path: None,
            profile: ProfileChoice::Temporary,
            connect_url: None,
            visible: false,
            window_size: (1280, 900),
        }
    }
}

struct Running {
    browser: Browser,
    handler_task: JoinHandle<()>,
    alive: Arc<AtomicBool>,
    headless: bool,
    launched: bool,
    _profile: Option<ProfileManager>,
}

struct State {
    running: Option<Running>,
    pages: HashMap<u64, Page>,
    next_id: u64,
    visible: bool,
}

/// Surface provider backed by Chrome over the DevTools protocol
///
/// One browser process serves every surface; each surface is a page. The
/// browser is started on the first `create` and shut down when its last
/// surface is destroyed.
pub struct ChromeSurfaceProvider {
    options: ChromeOptions,
    state: Mutex<State>,
}

impl ChromeSurfaceProvider {
    pub fn new(options: ChromeOptions) -> Self {
        let visible = options.visible;
        Self {
            options,
            state: Mutex::new(State {
                running: None,
                pages: HashMap::new(),
                next_id: 1,
                visible,
            }),
        }
    }

    async fn start(&self, visible: bool) -> Result<Running> {
        let (browser, handler, launched, profile) = match &self.options.connect_url {
            Some(url) => {
                let (browser, handler) = connect_with_retries(url).await?;
                (browser, handler, false, None)
            }
            None => {
                let chrome = ChromeFinder::new(self.options.chrome_path.clone()).find()?;
                let profile = match &self.options.profile {
                    ProfileChoice::Temporary => ProfileManager::temporary()?,
                    ProfileChoice::Named(name) => ProfileManager::named(name)?,
                    ProfileChoice::Path(path) => ProfileManager::persistent(path.clone())?,
                };
                let (width, height) = self.options.window_size;
                let mut builder = BrowserConfig::builder()
                    .chrome_executable(chrome)
                    .user_data_dir(profile.path())
                    .window_size(width, height);
                if visible {
                    builder = builder.with_head();
                }
                let config = builder.build().map_err(Error::Browser)?;

                tracing::info!(
                    "Launching Chrome ({}) with profile {}",
                    if visible { "visible" } else { "headless" },
                    profile.path().display()
                );
                let (browser, handler) = Browser::launch(config).await?;
                (browser, handler, true, Some(profile))
            }
        };

        let alive = Arc::new(AtomicBool::new(true));
        let handler_task = spawn_handler(handler, alive.clone());

        Ok(Running {
            browser,
            handler_task,
            alive,
            headless: !visible && launched,
            launched,
            _profile: profile,
        })
    }

    async fn page(&self, handle: SurfaceHandle) -> Result<Page> {
        let state = self.state.lock().await;
        let alive = state
            .running
            .as_ref()
            .is_some_and(|r| r.alive.load(Ordering::SeqCst));
        if !alive {
            return Err(Error::Browser("browser is no longer running".to_string()));
        }
        state
            .pages
            .get(&handle.id())
            .cloned()
            .ok_or(Error::UnknownSurface(handle.id()))
    }

    async fn create_page(&self) -> Result<SurfaceHandle> {
        let mut state = self.state.lock().await;

        let stale = state
            .running
            .as_ref()
            .is_some_and(|r| !r.alive.load(Ordering::SeqCst));
        if stale {
            tracing::warn!("Browser went away, starting a new one");
            if let Some(running) = state.running.take() {
                running.handler_task.abort();
            }
            state.pages.clear();
        }

        if state.running.is_none() {
            let visible = state.visible;
            state.running = Some(self.start(visible).await?);
        }

        let Some(running) = state.running.as_ref() else {
            return Err(Error::Browser("browser failed to start".to_string()));
        };
        let page = running.browser.new_page("about:blank").await?;

        let id = state.next_id;
        state.next_id += 1;
        state.pages.insert(id, page);
        tracing::debug!("Opened page for surface#{}", id);
        Ok(SurfaceHandle::new(id))
    }

    async fn close_page(&self, handle: SurfaceHandle) -> Result<()> {
        let mut state = self.state.lock().await;
        if let Some(page) = state.pages.remove(&handle.id()) {
            if let Err(e) = page.close().await {
                tracing::debug!("Closing surface#{} failed (already gone?): {}", handle.id(), e);
            }
        }

        if state.pages.is_empty() {
            if let Some(mut running) = state.running.take() {
                if running.launched && running.alive.load(Ordering::SeqCst) {
                    tracing::info!("Last surface closed, shutting Chrome down");
                    if let Err(e) = running.browser.close().await {
                        tracing::debug!("Chrome close command failed: {}", e);
                    }
                    let _ = running.browser.wait().await;
                }
                running.handler_task.abort();
            }
        }
        Ok(())
    }

    async fn evaluate(&self, handle: SurfaceHandle, code: &str) -> Result<Value> {
        let page = self.page(handle).await?;
        let params = EvaluateParams::builder()
            .expression(code)
            .return_by_value(true)
            .await_promise(true)
            .build()
            .map_err(Error::Cdp)?;
        let result = page.evaluate_expression(params).await?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn apply_visibility(&self, handle: Option<SurfaceHandle>, visible: bool) -> Result<()> {
        let page = {
            let mut state = self.state.lock().await;
            state.visible = visible;
            let headless = state.running.as_ref().is_some_and(|r| r.headless);
            if headless {
                tracing::warn!(
                    "Browser runs headless; visibility applies to the next surface"
                );
                return Ok(());
            }
            match handle.and_then(|h| state.pages.get(&h.id()).cloned()) {
                Some(page) => page,
                None => return Ok(()),
            }
        };

        let window = page
            .execute(GetWindowForTargetParams {
                target_id: Some(page.target_id().clone()),
            })
            .await?;
        let bounds = Bounds {
            window_state: Some(if visible {
                WindowState::Normal
            } else {
                WindowState::Minimized
            }),
            ..Default::default()
        };
        page.execute(SetWindowBoundsParams::new(window.result.window_id.clone(), bounds))
            .await?;
        Ok(())
    }
}

/// Drive CDP messages until the connection ends, then mark the browser gone
fn spawn_handler(mut handler: Handler, alive: Arc<AtomicBool>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                // Some CDP events are not fully parseable; keep going
                tracing::debug!("CDP handler event error (continuing): {}", e);
            }
        }
        alive.store(false, Ordering::SeqCst);
        tracing::debug!("CDP handler finished");
    })
}

async fn connect_with_retries(url: &str) -> Result<(Browser, Handler)> {
    let mut retries = 5;
    loop {
        tracing::debug!("Attempting CDP connection to {}...", url);
        match Browser::connect(url).await {
            Ok(result) => {
                tracing::info!("CDP connection established");
                return Ok(result);
            }
            Err(e) => {
                retries -= 1;
                if retries == 0 {
                    return Err(Error::Cdp(format!(
                        "Failed to connect to Chrome after 5 attempts: {}",
                        e
                    )));
                }
                tracing::info!("CDP connection attempt failed, retrying... ({} left)", retries);
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
        }
    }
}

#[async_trait]
impl SurfaceProvider for ChromeSurfaceProvider {
    async fn create(&self) -> portico_core::Result<SurfaceHandle> {
        Ok(self.create_page().await?)
    }

    async fn navigate(&self, handle: SurfaceHandle, url: &str) -> portico_core::Result<()> {
        let page = self.page(handle).await?;
        page.goto(url).await.map_err(Error::from)?;
        Ok(())
    }

    async fn is_open(&self, handle: SurfaceHandle) -> bool {
        match self.page(handle).await {
            // A page closed by the user fails every command
            Ok(page) => page.url().await.is_ok(),
            Err(_) => false,
        }
    }

    async fn current_url(&self, handle: SurfaceHandle) -> portico_core::Result<String> {
        let page = self.page(handle).await?;
        let url = page.url().await.map_err(Error::from)?;
        Ok(url.unwrap_or_default())
    }

    async fn inject_script(&self, handle: SurfaceHandle, code: &str) -> portico_core::Result<Value> {
        Ok(self.evaluate(handle, code).await?)
    }

    async fn destroy(&self, handle: SurfaceHandle) -> portico_core::Result<()> {
        Ok(self.close_page(handle).await?)
    }

    async fn set_visible(
        &self,
        handle: Option<SurfaceHandle>,
        visible: bool,
    ) -> portico_core::Result<()> {
        Ok(self.apply_visibility(handle, visible).await?)
    }
}
