//! Text normalization for term weighting. Steps run in a fixed order that must match the
//! preprocessing the vocabulary was built with: markup → URLs → addresses → noise → case.

use regex::{Captures, Regex};
use std::sync::OnceLock;

struct Patterns {
    comment: Regex,
    raw_text_element: Regex,
    tag: Regex,
    char_ref: Regex,
    url: Regex,
    address: Regex,
    noise: Regex,
}

static PATTERNS: OnceLock<Patterns> = OnceLock::new();

fn patterns() -> &'static Patterns {
    PATTERNS.get_or_init(|| Patterns {
        comment: Regex::new(r"(?s)<!--.*?-->").expect("comment pattern"),
        raw_text_element: Regex::new(
            r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>",
        )
        .expect("script/style pattern"),
        tag: Regex::new(r"</?[A-Za-z][^>]*>|<![^>]*>|<\?[^>]*>").expect("tag pattern"),
        char_ref: Regex::new(r"&(?:#(\d+)|#[xX]([0-9A-Fa-f]+)|([A-Za-z][A-Za-z0-9]*));")
            .expect("char ref pattern"),
        // Case-insensitive so that lowercasing can never expose a new URL on a second pass.
        url: Regex::new(r"(?i)http\S+|www\S+|https\S+").expect("url pattern"),
        address: Regex::new(r"\S+@\S+").expect("address pattern"),
        noise: Regex::new(r"[^a-zA-Z0-9.!?]+").expect("noise pattern"),
    })
}

fn decode_char_ref(caps: &Captures<'_>) -> String {
    let decoded = if let Some(dec) = caps.get(1) {
        dec.as_str().parse::<u32>().ok().and_then(char::from_u32)
    } else if let Some(hex) = caps.get(2) {
        u32::from_str_radix(hex.as_str(), 16).ok().and_then(char::from_u32)
    } else {
        match caps.get(3).map(|m| m.as_str()) {
            Some("amp") => Some('&'),
            Some("lt") => Some('<'),
            Some("gt") => Some('>'),
            Some("quot") => Some('"'),
            Some("apos") => Some('\''),
            Some("nbsp") => Some('\u{a0}'),
            _ => None,
        }
    };
    match decoded {
        Some(c) => c.to_string(),
        None => caps[0].to_string(),
    }
}

/// Visible text of an HTML fragment: comments, script/style bodies and tags are dropped
/// without a separator, then character references are decoded.
fn strip_markup(raw: &str) -> String {
    let p = patterns();
    let text = p.comment.replace_all(raw, "");
    let text = p.raw_text_element.replace_all(&text, "");
    let text = p.tag.replace_all(&text, "");
    p.char_ref.replace_all(&text, decode_char_ref).into_owned()
}

/// Canonical lowercase form of `raw` used only for vocabulary weighting.
///
/// Output contains only `[a-z0-9.!?]` tokens separated by single spaces; empty or
/// whitespace-only input yields `""`. `normalize(normalize(t)) == normalize(t)`.
///
/// URLs are matched regardless of case, so `HTTPS://X.COM` is removed whole. A
/// case-sensitive preprocessor would keep it and emit an `https` token after lowercasing.
/// Vocabularies built that way may carry weight on such tokens that never fire here.
/// Idempotence requires the case-insensitive match.
pub fn normalize(raw: &str) -> String {
    let p = patterns();
    let text = strip_markup(raw);
    let text = p.url.replace_all(&text, "");
    let text = p.address.replace_all(&text, "");
    let text = p.noise.replace_all(&text, " ");
    text.trim().to_ascii_lowercase()
}
