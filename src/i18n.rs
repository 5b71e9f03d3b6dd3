//! Localized message catalog.
//!
//! Catalogs live in `assets/i18n/<lang>.json` and are embedded at compile
//! time. Keys use dotted paths (`error.NOT_FOUND`). Resolution order:
//! requested language, configured fallback language, then the key itself
//! so a missing translation never turns into a panic or an empty message.

use once_cell::sync::{Lazy, OnceCell};
use serde_json::Value;
use std::collections::HashMap;

use crate::context::RequestContext;

static CATALOGS: Lazy<HashMap<&'static str, Value>> = Lazy::new(|| {
    let mut catalogs = HashMap::new();
    for (lang, raw) in [
        ("en", include_str!("../assets/i18n/en.json")),
        ("id", include_str!("../assets/i18n/id.json")),
    ] {
        let parsed: Value = serde_json::from_str(raw)
            .unwrap_or_else(|e| panic!("invalid i18n catalog for {lang}: {e}"));
        catalogs.insert(lang, parsed);
    }
    catalogs
});

static FALLBACK_LANG: OnceCell<String> = OnceCell::new();

/// Set the fallback language once at startup. Later calls are ignored.
pub fn init(fallback_lang: &str) {
    let _ = FALLBACK_LANG.set(fallback_lang.to_string());
}

pub fn fallback_lang() -> &'static str {
    FALLBACK_LANG.get().map(String::as_str).unwrap_or("id")
}

fn lookup(lang: &str, key: &str) -> Option<String> {
    let mut node = CATALOGS.get(lang)?;
    for segment in key.split('.') {
        node = node.get(segment)?;
    }
    node.as_str().map(str::to_string)
}

/// Resolve `key` for `lang`, falling back to the configured fallback
/// language and finally to the key itself.
pub fn translate(key: &str, lang: Option<&str>) -> String {
    lang.and_then(|l| lookup(l, key))
        .or_else(|| lookup(fallback_lang(), key))
        .unwrap_or_else(|| key.to_string())
}

/// Resolve `key` for the current request's language.
pub fn translate_current(key: &str) -> String {
    let lang = RequestContext::current_lang();
    translate(key, lang.as_deref())
}

/// Resolve a validation message for `code`, substituting the field name.
pub fn validation_message(code: &str, field: &str, lang: Option<&str>) -> String {
    translate(&format!("validation.{code}"), lang).replace("{field}", field)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_requested_language() {
        assert_eq!(
            translate("error.NOT_FOUND", Some("en")),
            "Resource not found"
        );
        assert_eq!(
            translate("error.NOT_FOUND", Some("id")),
            "Data tidak ditemukan"
        );
    }

    #[test]
    fn test_translate_falls_back_for_unknown_language() {
        // "fr" has no catalog, resolution drops to the fallback language
        let message = translate("error.NOT_FOUND", Some("fr"));
        assert_eq!(message, translate("error.NOT_FOUND", Some(fallback_lang())));
    }

    #[test]
    fn test_translate_unknown_key_returns_key() {
        assert_eq!(translate("error.NO_SUCH_KEY", Some("en")), "error.NO_SUCH_KEY");
    }

    #[test]
    fn test_validation_message_substitutes_field() {
        let message = validation_message("range", "limit", Some("en"));
        assert_eq!(message, "limit is out of the allowed range");
    }

    #[tokio::test]
    async fn test_translate_current_reads_request_language() {
        let ctx = RequestContext {
            lang: Some("en".to_string()),
            ..Default::default()
        };
        let message =
            RequestContext::scope(ctx, async { translate_current("error.NOT_FOUND") }).await;
        assert_eq!(message, "Resource not found");
    }
}
