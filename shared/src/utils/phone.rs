//! Phone number utilities

use once_cell::sync::Lazy;
use regex::Regex;

// E.164: leading '+', non-zero country digit, at most 15 digits in total
static E164_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+[1-9]\d{1,14}$").expect("E.164 pattern is valid")
});

/// Strip formatting characters, keeping digits and a leading '+'
pub fn normalize_phone_number(phone: &str) -> String {
    let trimmed = phone.trim();
    let mut normalized: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
    if trimmed.starts_with('+') {
        normalized.insert(0, '+');
    }
    normalized
}

/// Check if a phone number is in international E.164 format after normalization
pub fn is_valid_international_phone(phone: &str) -> bool {
    E164_REGEX.is_match(&normalize_phone_number(phone))
}

/// Normalize a phone number, returning `None` unless the result is E.164
pub fn to_e164(phone: &str) -> Option<String> {
    let normalized = normalize_phone_number(phone);
    E164_REGEX.is_match(&normalized).then_some(normalized)
}

/// Mask a phone number for logs (e.g. +15****1234)
pub fn mask_phone_number(phone: &str) -> String {
    let normalized = normalize_phone_number(phone);
    if normalized.len() >= 7 {
        format!(
            "{}****{}",
            &normalized[0..3],
            &normalized[normalized.len() - 4..]
        )
    } else {
        "****".to_string()
    }
}
