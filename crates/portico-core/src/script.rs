use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::Result;

/// Shared visibility check prepended to DOM-inspecting scripts
pub(crate) const VISIBLE_FN: &str = "const visible = (el) => { \
if (!el || !el.ownerDocument) return false; \
const view = el.ownerDocument.defaultView; \
const style = view ? view.getComputedStyle(el) : null; \
if (style && (style.visibility === 'hidden' || style.display === 'none')) return false; \
return !!(el.offsetWidth || el.offsetHeight || el.getClientRects().length); };";

/// Render a value as a JavaScript literal
pub(crate) fn literal<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}

/// Wrap a body into a tagged, self-invoking expression
pub(crate) fn tagged(tag: &str, body: &str) -> String {
    format!("/* portico:{} */ (() => {{ {} }})()", tag, body)
}

/// Decode a script's return value; `null` (nothing returned) is the default
pub(crate) fn decode<T: DeserializeOwned + Default>(value: Value) -> Result<T> {
    if value.is_null() {
        return Ok(T::default());
    }
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_escapes_quotes() {
        assert_eq!(literal(r#"a"b'c"#), r#""a\"b'c""#);
        assert_eq!(literal(&["x", "y"]), r#"["x","y"]"#);
    }

    #[test]
    fn test_decode_null_is_default() {
        let values: Vec<String> = decode(Value::Null).unwrap();
        assert!(values.is_empty());
        assert!(decode::<Vec<String>>(serde_json::json!(42)).is_err());
    }

    #[test]
    fn test_tagged_is_self_invoking() {
        let code = tagged("probe", "return 1;");
        assert!(code.starts_with("/* portico:probe */"));
        assert!(code.ends_with("})()"));
    }
}
