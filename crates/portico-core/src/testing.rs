//! Scripted surface provider used by the unit tests.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use crate::{Error, Result};
use crate::surface::{SurfaceHandle, SurfaceProvider};

#[derive(Default)]
struct State {
    next_id: u64,
    open: HashSet<u64>,
    url: String,
    interactions: usize,
    created: usize,
    destroyed: usize,
    navigations: Vec<String>,
    scripts: Vec<String>,
    responses: HashMap<String, VecDeque<Value>>,
    redirects: HashMap<String, String>,
    failures: HashMap<String, String>,
    visible: Option<bool>,
}

/// Answers injected scripts by their `/* portico:<tag> */` marker
pub struct ScriptedSurface {
    state: Mutex<State>,
}

impl ScriptedSurface {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_id: 1,
                url: "about:blank".to_string(),
                ..State::default()
            }),
        }
    }

    /// Queue answers for a tag; the last one repeats once the queue drains
    pub fn respond(&self, tag: &str, values: Vec<Value>) {
        self.state
            .lock()
            .unwrap()
            .responses
            .insert(tag.to_string(), values.into());
    }

    /// Running a script with `tag` moves the page to `url`
    pub fn redirect_on(&self, tag: &str, url: &str) {
        self.state
            .lock()
            .unwrap()
            .redirects
            .insert(tag.to_string(), url.to_string());
    }

    /// Scripts with `tag` fail the way a page-side exception does
    pub fn fail_on(&self, tag: &str, message: &str) {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert(tag.to_string(), message.to_string());
    }

    pub fn set_url(&self, url: &str) {
        self.state.lock().unwrap().url = url.to_string();
    }

    pub fn close_externally(&self, handle: SurfaceHandle) {
        self.state.lock().unwrap().open.remove(&handle.id());
    }

    pub fn interactions(&self) -> usize {
        self.state.lock().unwrap().interactions
    }

    pub fn created(&self) -> usize {
        self.state.lock().unwrap().created
    }

    pub fn destroyed(&self) -> usize {
        self.state.lock().unwrap().destroyed
    }

    pub fn navigations(&self) -> Vec<String> {
        self.state.lock().unwrap().navigations.clone()
    }

    pub fn visible(&self) -> Option<bool> {
        self.state.lock().unwrap().visible
    }

    /// How many injected scripts carried `tag`
    pub fn script_count(&self, tag: &str) -> usize {
        let marker = format!("portico:{} ", tag);
        self.state
            .lock()
            .unwrap()
            .scripts
            .iter()
            .filter(|s| s.contains(&marker))
            .count()
    }

    /// The most recent script carrying `tag`
    pub fn last_script(&self, tag: &str) -> Option<String> {
        let marker = format!("portico:{} ", tag);
        self.state
            .lock()
            .unwrap()
            .scripts
            .iter()
            .rev()
            .find(|s| s.contains(&marker))
            .cloned()
    }
}

#[async_trait]
impl SurfaceProvider for ScriptedSurface {
    async fn create(&self) -> Result<SurfaceHandle> {
        let mut state = self.state.lock().unwrap();
        state.interactions += 1;
        state.created += 1;
        let id = state.next_id;
        state.next_id += 1;
        state.open.insert(id);
        Ok(SurfaceHandle::new(id))
    }

    async fn navigate(&self, handle: SurfaceHandle, url: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.interactions += 1;
        if !state.open.contains(&handle.id()) {
            return Err(Error::Surface(format!("{} is closed", handle)));
        }
        state.navigations.push(url.to_string());
        state.url = url.to_string();
        Ok(())
    }

    async fn is_open(&self, handle: SurfaceHandle) -> bool {
        self.state.lock().unwrap().open.contains(&handle.id())
    }

    async fn current_url(&self, _handle: SurfaceHandle) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.interactions += 1;
        Ok(state.url.clone())
    }

    async fn inject_script(&self, _handle: SurfaceHandle, code: &str) -> Result<Value> {
        let mut state = self.state.lock().unwrap();
        state.interactions += 1;
        state.scripts.push(code.to_string());

        let tag = code
            .split("portico:")
            .nth(1)
            .and_then(|rest| rest.split_whitespace().next())
            .unwrap_or_default()
            .to_string();

        if let Some(message) = state.failures.get(&tag) {
            return Err(Error::Surface(message.clone()));
        }

        if let Some(url) = state.redirects.get(&tag).cloned() {
            state.url = url;
        }

        let value = match state.responses.get_mut(&tag) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or(Value::Null),
            Some(queue) => queue.front().cloned().unwrap_or(Value::Null),
            None => Value::Null,
        };
        Ok(value)
    }

    async fn destroy(&self, handle: SurfaceHandle) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.interactions += 1;
        if state.open.remove(&handle.id()) {
            state.destroyed += 1;
        }
        Ok(())
    }

    async fn set_visible(&self, _handle: Option<SurfaceHandle>, visible: bool) -> Result<()> {
        self.state.lock().unwrap().visible = Some(visible);
        Ok(())
    }
}
