use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::PortalConfig;

/// An `<input>` as reported by the snapshot script
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct InputInfo {
    /// Position in `document.querySelectorAll('input')`
    pub index: usize,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub id: String,
    pub placeholder: String,
    pub visible: bool,
    /// Position of the enclosing form in `document.forms`
    pub form: Option<usize>,
}

impl InputInfo {
    fn is_password(&self) -> bool {
        self.kind.eq_ignore_ascii_case("password")
    }

    fn is_text_like(&self) -> bool {
        let kind = self.kind.to_ascii_lowercase();
        kind.is_empty() || kind == "text" || kind == "email" || kind == "tel"
    }

    fn has_identity_hint(&self, hints: &[String]) -> bool {
        let haystack = format!("{} {} {}", self.name, self.id, self.placeholder).to_lowercase();
        hints.iter().any(|hint| haystack.contains(&hint.to_lowercase()))
    }
}

/// A clickable element as reported by the snapshot script
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ControlInfo {
    /// Position in the snapshot script's clickable selector list
    pub index: usize,
    pub tag: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Visible text, `value` or `title`, whichever was non-empty
    pub text: String,
    pub visible: bool,
    pub form: Option<usize>,
}

impl ControlInfo {
    fn is_submit(&self) -> bool {
        self.kind.eq_ignore_ascii_case("submit")
            || (self.tag.eq_ignore_ascii_case("button") && self.kind.is_empty())
    }
}

/// Everything the login strategies look at
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PageSnapshot {
    pub inputs: Vec<InputInfo>,
    pub controls: Vec<ControlInfo>,
    pub forms: usize,
}

impl PageSnapshot {
    pub fn counts(&self) -> InputCounts {
        InputCounts {
            total: self.inputs.len(),
            visible: self.inputs.iter().filter(|i| i.visible).count(),
            text: self.inputs.iter().filter(|i| i.is_text_like()).count(),
            password: self.inputs.iter().filter(|i| i.is_password()).count(),
        }
    }

    fn input(&self, index: usize) -> Option<&InputInfo> {
        self.inputs.iter().find(|i| i.index == index)
    }
}

/// Input tallies attached to structural login errors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputCounts {
    pub total: usize,
    pub visible: usize,
    pub text: usize,
    pub password: usize,
}

impl fmt::Display for InputCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "inputs total={} visible={} text={} password={}",
            self.total, self.visible, self.text, self.password
        )
    }
}

/// Where the credentials go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPair {
    pub username: usize,
    pub password: usize,
}

/// How the filled form gets sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// Click the control at this snapshot index
    Click(usize),
    /// Submit `document.forms[n]` directly
    SubmitForm(usize),
}

/// One way of finding the username/password inputs
pub trait FieldStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn locate(&self, page: &PageSnapshot, config: &PortalConfig) -> Option<FieldPair>;
}

/// One way of finding the control that submits the login
pub trait SubmitStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn locate(
        &self,
        page: &PageSnapshot,
        fields: FieldPair,
        config: &PortalConfig,
    ) -> Option<Submission>;
}

/// Visible text-like or hinted input, paired with a visible password input
pub struct TypedFields;

impl FieldStrategy for TypedFields {
    fn name(&self) -> &'static str {
        "typed"
    }

    fn locate(&self, page: &PageSnapshot, config: &PortalConfig) -> Option<FieldPair> {
        let password = page.inputs.iter().find(|i| i.visible && i.is_password())?;
        let username = page.inputs.iter().find(|i| {
            i.visible
                && !i.is_password()
                && (i.is_text_like() || i.has_identity_hint(&config.identity_hints))
        })?;
        Some(FieldPair {
            username: username.index,
            password: password.index,
        })
    }
}

/// First two visible inputs, in page order
pub struct PositionalFields;

impl FieldStrategy for PositionalFields {
    fn name(&self) -> &'static str {
        "positional"
    }

    fn locate(&self, page: &PageSnapshot, _config: &PortalConfig) -> Option<FieldPair> {
        let mut visible = page.inputs.iter().filter(|i| i.visible);
        let username = visible.next()?;
        let password = visible.next()?;
        Some(FieldPair {
            username: username.index,
            password: password.index,
        })
    }
}

/// Visible control whose text reads like "log in"
pub struct LexiconButton;

impl SubmitStrategy for LexiconButton {
    fn name(&self) -> &'static str {
        "lexicon"
    }

    fn locate(
        &self,
        page: &PageSnapshot,
        _fields: FieldPair,
        config: &PortalConfig,
    ) -> Option<Submission> {
        page.controls
            .iter()
            .filter(|c| c.visible)
            .find(|c| matches_lexicon(&c.text, &config.login_lexicon))
            .map(|c| Submission::Click(c.index))
    }
}

/// Submit control inside the password field's form
pub struct FormSubmitButton;

impl SubmitStrategy for FormSubmitButton {
    fn name(&self) -> &'static str {
        "form-submit"
    }

    fn locate(
        &self,
        page: &PageSnapshot,
        fields: FieldPair,
        _config: &PortalConfig,
    ) -> Option<Submission> {
        let form = page.input(fields.password)?.form?;
        page.controls
            .iter()
            .find(|c| c.form == Some(form) && c.is_submit())
            .map(|c| Submission::Click(c.index))
    }
}

/// Anything visible and clickable
pub struct FirstClickable;

impl SubmitStrategy for FirstClickable {
    fn name(&self) -> &'static str {
        "first-clickable"
    }

    fn locate(
        &self,
        page: &PageSnapshot,
        _fields: FieldPair,
        _config: &PortalConfig,
    ) -> Option<Submission> {
        page.controls
            .iter()
            .find(|c| c.visible)
            .map(|c| Submission::Click(c.index))
    }
}

/// `form.submit()` on the form holding either credential field
pub struct ProgrammaticSubmit;

impl SubmitStrategy for ProgrammaticSubmit {
    fn name(&self) -> &'static str {
        "programmatic"
    }

    fn locate(
        &self,
        page: &PageSnapshot,
        fields: FieldPair,
        _config: &PortalConfig,
    ) -> Option<Submission> {
        page.input(fields.password)
            .and_then(|i| i.form)
            .or_else(|| page.input(fields.username).and_then(|i| i.form))
            .map(Submission::SubmitForm)
    }
}

pub fn default_field_strategies() -> Vec<Box<dyn FieldStrategy>> {
    vec![Box::new(TypedFields), Box::new(PositionalFields)]
}

pub fn default_submit_strategies() -> Vec<Box<dyn SubmitStrategy>> {
    vec![
        Box::new(LexiconButton),
        Box::new(FormSubmitButton),
        Box::new(FirstClickable),
        Box::new(ProgrammaticSubmit),
    ]
}

/// Case-insensitive containment against any lexicon entry
pub fn matches_lexicon(text: &str, lexicon: &[String]) -> bool {
    let text = text.trim().to_lowercase();
    !text.is_empty() && lexicon.iter().any(|word| text.contains(&word.to_lowercase()))
}
