//! Content classification for clipboard items
//!
//! Assigns semantic tags (links, emails, code, API keys, passwords, phone
//! numbers) to captured content. Rules are independent, so one item may carry
//! several tags. The result is never empty.

use crate::interface::ClipboardPayload;
use crate::models::TagSet;
use crate::tags::TagCategory;
use once_cell::sync::Lazy;
use regex::Regex;

/// local-part@domain.tld anywhere in the text
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap()
});

/// Opaque token: the whole string is 20+ key-safe characters
static API_KEY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]{20,}$").unwrap()
});

/// Phone-like: digits, spaces, dashes and parentheses with an optional leading +
static PHONE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+?[0-9\s\-()]{7,}$").unwrap()
});

/// Any Unicode decimal digit (general category Nd), not fractions or numerals
static DECIMAL_DIGIT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\p{Nd}").unwrap()
});

const LINK_MARKERS: &[&str] = &["http://", "https://", "www."];

const CODE_TOKENS: &[&str] = &[
    "function", "class", "import", "let ", "var ", "def ", "<?php", "<!DOCTYPE",
];

fn is_link(text: &str) -> bool {
    LINK_MARKERS.iter().any(|m| text.contains(m))
}

fn is_email(text: &str) -> bool {
    EMAIL_REGEX.is_match(text)
}

/// A `{` with a `}` somewhere after it, or a well-known keyword
fn is_code(text: &str) -> bool {
    let has_braces = match (text.find('{'), text.rfind('}')) {
        (Some(open), Some(close)) => open < close,
        _ => false,
    };
    has_braces || CODE_TOKENS.iter().any(|t| text.contains(t))
}

fn is_api_key(text: &str) -> bool {
    API_KEY_REGEX.is_match(text)
}

fn is_password(text: &str) -> bool {
    let len = text.chars().count();
    len > 8
        && len < 50
        && text.chars().any(char::is_alphabetic)
        && DECIMAL_DIGIT_REGEX.is_match(text)
}

fn is_phone(text: &str) -> bool {
    PHONE_REGEX.is_match(text) || (text.starts_with('+') && text.chars().count() > 7)
}

/// Classify text content
pub fn classify_text(text: &str) -> TagSet {
    let rules: [(fn(&str) -> bool, TagCategory); 6] = [
        (is_link, TagCategory::Links),
        (is_email, TagCategory::Emails),
        (is_code, TagCategory::Code),
        (is_api_key, TagCategory::Apis),
        (is_password, TagCategory::Passwords),
        (is_phone, TagCategory::Numbers),
    ];

    let mut tags: TagSet = rules
        .iter()
        .filter(|(rule, _)| rule(text))
        .map(|(_, category)| category.name().to_string())
        .collect();

    if tags.is_empty() {
        tags.insert(TagCategory::Text.name());
    }
    tags
}

/// Classify any payload. Images are always tagged `Images` and nothing else.
pub fn classify(payload: &ClipboardPayload) -> TagSet {
    match payload {
        ClipboardPayload::Text(text) => classify_text(text),
        ClipboardPayload::Image(_) => {
            let mut tags = TagSet::new();
            tags.insert(TagCategory::Images.name());
            tags
        }
    }
}
