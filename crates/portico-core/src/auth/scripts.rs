use crate::config::PortalConfig;
use crate::script::{VISIBLE_FN, literal, tagged};

use super::discovery::{FieldPair, Submission};

pub const READY: &str = "login-ready";
pub const SNAPSHOT: &str = "login-snapshot";
pub const FILL: &str = "login-fill";
pub const SUBMIT: &str = "login-submit";
pub const OUTCOME: &str = "login-outcome";

const CONTROLS: &str = "button, input[type=submit], input[type=button], input[type=image], a, [role=button], [onclick]";

/// True once a username-like and a password input are both visible
pub fn readiness(config: &PortalConfig) -> String {
    tagged(
        READY,
        &format!(
            "{VISIBLE_FN} \
const hints = {hints}; \
const inputs = Array.from(document.querySelectorAll('input')).filter(visible); \
const hasPassword = inputs.some((i) => i.type === 'password'); \
const hasUser = inputs.some((i) => i.type !== 'password' && (['text', 'email', 'tel', ''].includes(i.type) || \
hints.some((h) => ((i.name || '') + ' ' + (i.id || '')).toLowerCase().includes(h)))); \
return hasUser && hasPassword;",
            hints = literal(&config.identity_hints),
        ),
    )
}

/// Describe inputs, clickable controls and forms without touching them
pub fn snapshot() -> String {
    tagged(
        SNAPSHOT,
        &format!(
            "{VISIBLE_FN} \
const forms = Array.from(document.forms); \
const formOf = (el) => {{ const i = forms.indexOf(el.form || el.closest('form')); return i < 0 ? null : i; }}; \
const inputs = Array.from(document.querySelectorAll('input')).map((el, index) => ({{ \
index, type: (el.getAttribute('type') || '').toLowerCase(), name: el.name || '', id: el.id || '', \
placeholder: el.placeholder || '', visible: visible(el), form: formOf(el) }})); \
const controls = Array.from(document.querySelectorAll({controls})).map((el, index) => ({{ \
index, tag: el.tagName.toLowerCase(), type: (el.getAttribute('type') || '').toLowerCase(), \
text: ((el.innerText || el.value || el.title || el.getAttribute('aria-label') || '') + '').trim().slice(0, 80), \
visible: visible(el), form: formOf(el) }})); \
return {{ inputs, controls, forms: forms.length }};",
            controls = literal(CONTROLS),
        ),
    )
}

/// Type the credentials into the located inputs the way a user would
pub fn fill(fields: FieldPair, username: &str, password: &str) -> String {
    tagged(
        FILL,
        &format!(
            "const inputs = document.querySelectorAll('input'); \
const setter = Object.getOwnPropertyDescriptor(HTMLInputElement.prototype, 'value').set; \
const type = (el, value) => {{ if (!el) return false; el.focus(); setter.call(el, value); \
for (const name of ['input', 'change', 'keyup', 'blur']) {{ \
const ev = name === 'keyup' && typeof KeyboardEvent === 'function' ? new KeyboardEvent(name, {{ bubbles: true }}) : new Event(name, {{ bubbles: true }}); \
el.dispatchEvent(ev); }} return true; }}; \
return type(inputs[{user}], {username}) && type(inputs[{pass}], {password});",
            user = fields.username,
            pass = fields.password,
            username = literal(username),
            password = literal(password),
        ),
    )
}

pub fn submit(submission: Submission) -> String {
    let body = match submission {
        Submission::Click(index) => format!(
            "const el = document.querySelectorAll({controls})[{index}]; \
if (!el) return false; el.click(); return true;",
            controls = literal(CONTROLS),
        ),
        Submission::SubmitForm(index) => format!(
            "const form = document.forms[{index}]; if (!form) return false; \
if (typeof form.requestSubmit === 'function') form.requestSubmit(); else form.submit(); return true;"
        ),
    };
    tagged(SUBMIT, &body)
}

/// Current URL plus the visible text of any error marker
pub fn outcome(config: &PortalConfig) -> String {
    tagged(
        OUTCOME,
        &format!(
            "{VISIBLE_FN} \
const selectors = {selectors}; \
const errors = []; \
for (const sel of selectors) {{ try {{ for (const el of document.querySelectorAll(sel)) {{ \
if (visible(el)) {{ const text = (el.innerText || el.textContent || '').trim(); if (text) errors.push(text.slice(0, 200)); }} }} }} catch (e) {{}} }} \
return {{ url: location.href, errors }};",
            selectors = literal(&config.error_selectors),
        ),
    )
}
