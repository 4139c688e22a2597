//! # String Formats
//!
//! Syntactic checks for the recognized `format` values. Only the string
//! shape is checked; `date`/`date-time` additionally require the calendar
//! date to exist.

use std::sync::OnceLock;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use dtoschema_core::temporal::{is_iso_date, is_iso_date_time};
use dtoschema_core::StringFormat;
use regex::Regex;

fn email_regex() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok())
        .as_ref()
}

pub fn is_email(s: &str) -> bool {
    email_regex().is_some_and(|re| re.is_match(s))
}

/// Hyphenated 8-4-4-4-12 form only.
pub fn is_uuid(s: &str) -> bool {
    s.len() == 36 && uuid::Uuid::parse_str(s).is_ok()
}

/// Standard-alphabet, padded base64.
pub fn is_base64(s: &str) -> bool {
    STANDARD.decode(s).is_ok()
}

/// Whether `s` satisfies `format`.
pub fn matches_format(format: StringFormat, s: &str) -> bool {
    match format {
        StringFormat::Date => is_iso_date(s),
        StringFormat::DateTime => is_iso_date_time(s),
        StringFormat::Email => is_email(s),
        StringFormat::Uuid => is_uuid(s),
        StringFormat::Byte => is_base64(s),
    }
}

/// The message reported when a value fails `format`.
pub fn format_message(format: StringFormat) -> String {
    match format {
        StringFormat::Byte => "must be a valid base64 string".to_string(),
        other => format!("must be a valid {other}"),
    }
}
