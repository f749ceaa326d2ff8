use crate::config::PortalConfig;
use crate::script::{VISIBLE_FN, literal, tagged};

use super::query::QueryParams;

pub const MENU: &str = "menu-candidates";
pub const ACTIVATE: &str = "menu-activate";
pub const FRAME: &str = "frame-probe";
pub const CONFIGURE: &str = "query-configure";
pub const TOGGLE: &str = "handler-toggle";
pub const TRIGGER: &str = "search-trigger";
pub const HARVEST: &str = "grid-harvest";

const MENU_ELEMENTS: &str = "a, li, span, button, [role=menuitem], [role=tab], [title], [name]";
const CLICKABLES: &str = "button, input[type=button], input[type=submit], a, [role=button], [onclick]";

/// Resolves a tab key to the window of the frame it opened, or null
const FRAME_FN: &str = "const frameWindow = (key) => { \
for (const f of document.querySelectorAll('iframe, frame')) { \
const src = f.getAttribute('src') || ''; \
if (f.name === key || f.id === key || f.id === 'iframe-' + key || f.id === key + '-frame' || src.includes(key)) { \
try { if (f.contentWindow && f.contentWindow.document) return f.contentWindow; } catch (e) {} } } \
return null; };";

fn in_frame(tag: &str, tab: &str, missing: &str, body: &str) -> String {
    tagged(
        tag,
        &format!(
            "{FRAME_FN} {VISIBLE_FN} const win = frameWindow({tab}); if (!win) return {missing}; {body}",
            tab = literal(tab),
        ),
    )
}

/// Like `in_frame`, but a page-side exception returns `on_error` instead of throwing
fn soft_in_frame(tag: &str, tab: &str, missing: &str, body: &str, on_error: &str) -> String {
    in_frame(
        tag,
        tab,
        missing,
        &format!("try {{ {body} }} catch (e) {{ return {on_error}; }}"),
    )
}

fn lowercase(words: &[String]) -> Vec<String> {
    words.iter().map(|w| w.to_lowercase()).collect()
}

/// Visible elements that could be the menu entry, with their tab keys
pub fn menu_candidates(config: &PortalConfig) -> String {
    tagged(
        MENU,
        &format!(
            "{VISIBLE_FN} \
const attr = {attr}; \
const out = []; \
document.querySelectorAll({elements}).forEach((el, index) => {{ \
if (!visible(el)) return; \
const text = (el.innerText || el.textContent || '').trim().slice(0, 120); \
let holder = null; try {{ holder = attr ? el.closest('[' + attr + ']') : null; }} catch (e) {{}} \
const leaf = !Array.from(el.children).some((c) => (c.innerText || c.textContent || '').trim() === text); \
out.push({{ index, text, title: el.getAttribute('title') || '', name: el.getAttribute('name') || '', \
tab: holder ? holder.getAttribute(attr) : null, leaf }}); }}); \
return out;",
            attr = literal(&config.tab_attribute),
            elements = literal(MENU_ELEMENTS),
        ),
    )
}

pub fn activate_menu(index: usize) -> String {
    tagged(
        ACTIVATE,
        &format!(
            "const el = document.querySelectorAll({elements})[{index}]; \
if (!el) return false; el.click(); return true;",
            elements = literal(MENU_ELEMENTS),
        ),
    )
}

/// True when the frame for `tab` is attached and same-origin
pub fn frame_probe(tab: &str) -> String {
    in_frame(FRAME, tab, "false", "return true;")
}

/// Push the query into the frame's configuration object, if it has one
pub fn configure(tab: &str, params: &QueryParams, config: &PortalConfig) -> String {
    soft_in_frame(
        CONFIGURE,
        tab,
        "false",
        &format!(
            "const api = win[{api}]; if (!api) return false; \
const params = {params}; \
if (typeof api.set === 'function') {{ for (const [k, v] of Object.entries(params)) api.set(k, v); }} \
else {{ Object.assign(api, params); }} \
return true;",
            api = literal(&config.config_api),
            params = literal(params),
        ),
        "false",
    )
}

/// Tick the "search by handler" checkbox when the frame shows one
pub fn toggle_handler(tab: &str, config: &PortalConfig) -> String {
    soft_in_frame(
        TOGGLE,
        tab,
        "false",
        &format!(
            "const wanted = {label}; \
for (const box of win.document.querySelectorAll('input[type=checkbox]')) {{ \
const text = ((box.labels && box.labels[0] && box.labels[0].innerText) || \
(box.parentElement && box.parentElement.innerText) || box.title || '').toLowerCase(); \
if (wanted && text.includes(wanted)) {{ if (!box.checked) box.click(); return true; }} }} \
return false;",
            label = literal(&config.handler_toggle_label.to_lowercase()),
        ),
        "false",
    )
}

/// Start the search: named function, then inline handler, then mouse events
pub fn trigger(tab: &str, config: &PortalConfig) -> String {
    soft_in_frame(
        TRIGGER,
        tab,
        "{ via: null }",
        &format!(
            "for (const name of {functions}) {{ \
if (typeof win[name] === 'function') {{ win[name](); return {{ via: 'function', detail: name }}; }} }} \
const lexicon = {lexicon}; \
for (const el of win.document.querySelectorAll({clickables})) {{ \
if (!visible(el)) continue; \
const text = ((el.innerText || el.value || el.title || el.getAttribute('aria-label') || '') + '').trim().toLowerCase(); \
if (!text || !lexicon.some((w) => text.includes(w))) continue; \
if (el.getAttribute('onclick') && typeof el.onclick === 'function') {{ \
el.onclick.call(el, new win.MouseEvent('click', {{ bubbles: true }})); return {{ via: 'inline', detail: text }}; }} \
for (const type of ['mousedown', 'mouseup', 'click']) {{ \
el.dispatchEvent(new win.MouseEvent(type, {{ bubbles: true, cancelable: true, view: win }})); }} \
el.click(); \
return {{ via: 'mouse', detail: text }}; }} \
return {{ via: null }};",
            functions = literal(&config.search_functions),
            lexicon = literal(&lowercase(&config.search_lexicon)),
            clickables = literal(CLICKABLES),
        ),
        "{ via: null, detail: String(e) }",
    )
}

/// Rows from the frame's grid accessor, detached from the page
pub fn harvest(tab: &str, config: &PortalConfig) -> String {
    in_frame(
        HARVEST,
        tab,
        "{ found: false, rows: [] }",
        &format!(
            "const accessor = win[{grid}]; \
let rows; \
if (typeof accessor === 'function') rows = accessor.call(win); \
else if (accessor && typeof accessor.getData === 'function') rows = accessor.getData(); \
else return {{ found: false, rows: [] }}; \
if (rows && !Array.isArray(rows)) rows = rows.rows || rows.data || []; \
return {{ found: true, rows: JSON.parse(JSON.stringify(rows || [])) }};",
            grid = literal(&config.grid_accessor),
        ),
    )
}
