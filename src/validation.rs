//! Field-level checks for incoming payloads.
//!
//! Every check records into a [`FieldErrors`] map keyed by field name so a
//! single response can carry all problems with a payload.

use std::{collections::BTreeMap, fmt, net::IpAddr, sync::LazyLock};

use regex::Regex;
use serde::Serialize;

use crate::error::{AppError, AppResult};

static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("slug pattern compiles"));

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$")
        .expect("email pattern compiles")
});

pub const SLUG_MAX_LEN: usize = 100;
pub const EMAIL_MAX_LEN: usize = 254;
pub const MEDIA_PATH_MAX_LEN: usize = 100;
pub const IP_MAX_LEN: usize = 15;
pub const SMALL_UINT_MAX: i64 = 32_767;
pub const UINT_MAX: i64 = 2_147_483_647;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[cfg(test)]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    #[cfg(test)]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn merge(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    pub fn into_result(self) -> AppResult<()> {
        if self.is_empty() { Ok(()) } else { Err(AppError::Validation(self)) }
    }

    /// Non-blank and at most `max` characters.
    pub fn required(&mut self, field: &str, value: &str, max: Option<usize>) {
        if value.trim().is_empty() {
            self.add(field, "This field is required.");
            return;
        }
        if let Some(max) = max {
            self.max_len(field, value, max);
        }
    }

    pub fn max_len(&mut self, field: &str, value: &str, max: usize) {
        let len = value.chars().count();
        if len > max {
            self.add(field, format!("Ensure this value has at most {max} characters (it has {len})."));
        }
    }

    pub fn range(&mut self, field: &str, value: i64, min: i64, max: i64) {
        if value < min {
            self.add(field, format!("Ensure this value is greater than or equal to {min}."));
        } else if value > max {
            self.add(field, format!("Ensure this value is less than or equal to {max}."));
        }
    }

    pub fn slug(&mut self, field: &str, value: &str) {
        self.required(field, value, Some(SLUG_MAX_LEN));
        if !value.is_empty() && !SLUG_RE.is_match(value) {
            self.add(
                field,
                "Enter a valid slug consisting of letters, numbers, underscores or hyphens.",
            );
        }
    }

    pub fn email(&mut self, field: &str, value: &str) {
        self.required(field, value, Some(EMAIL_MAX_LEN));
        if !value.trim().is_empty() && !EMAIL_RE.is_match(value) {
            self.add(field, "Enter a valid email address.");
        }
    }

    /// Any IP address whose text fits `IP_MAX_LEN`.
    pub fn ip(&mut self, field: &str, value: &str) {
        self.required(field, value, Some(IP_MAX_LEN));
        if !value.trim().is_empty() && value.trim().parse::<IpAddr>().is_err() {
            self.add(field, "Enter a valid IPv4 or IPv6 address.");
        }
    }

    /// Parses a civil date, recording an error when it is malformed.
    pub fn date(&mut self, field: &str, value: &str) -> Option<jiff::civil::Date> {
        match value.trim().parse::<jiff::civil::Date>() {
            Ok(date) => Some(date),
            Err(_) => {
                self.add(field, "Enter a valid date in YYYY-MM-DD format.");
                None
            },
        }
    }

    /// Media references are stored relative to the media root, under the
    /// entity's upload directory.
    pub fn media_path(&mut self, field: &str, value: &str, upload_to: &str) -> String {
        let value = value.trim();
        if value.is_empty() {
            self.add(field, "This field is required.");
            return String::new();
        }
        if value.starts_with('/') || value.split('/').any(|part| part == "..") {
            self.add(field, "Enter a relative media path.");
            return String::new();
        }
        let path = if value.starts_with(upload_to) {
            value.to_string()
        } else {
            format!("{upload_to}{value}")
        };
        self.max_len(field, &path, MEDIA_PATH_MAX_LEN);
        path
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_rejects_blank_and_long_values() {
        let mut errors = FieldErrors::new();
        errors.required("name", "   ", Some(10));
        errors.required("title", &"x".repeat(11), Some(10));
        errors.required("country", "France", Some(30));

        assert_eq!(errors.get("name"), Some(&["This field is required.".to_string()][..]));
        assert!(errors.get("title").unwrap()[0].contains("at most 10"));
        assert!(!errors.contains("country"));
    }

    #[test]
    fn slug_allows_only_url_safe_characters() {
        let mut errors = FieldErrors::new();
        errors.slug("ok", "the-dark_knight-2008");
        errors.slug("spaces", "the dark knight");
        errors.slug("unicode", "начало");

        assert!(!errors.contains("ok"));
        assert!(errors.contains("spaces"));
        assert!(errors.contains("unicode"));
    }

    #[test]
    fn email_and_ip_formats() {
        let mut errors = FieldErrors::new();
        errors.email("good", "viewer@example.com");
        errors.email("bad", "viewer@");
        errors.ip("ip", "192.168.0.1");
        errors.ip("loopback_v6", "::1");
        errors.ip("bad_ip", "999.1.1.1");
        errors.ip("long_v6", "2001:db8:85a3::8a2e:370:7334");

        assert!(!errors.contains("good"));
        assert!(errors.contains("bad"));
        assert!(!errors.contains("ip"));
        assert!(!errors.contains("loopback_v6"));
        assert!(errors.contains("bad_ip"));
        assert!(errors.get("long_v6").unwrap()[0].contains("at most 15"));
    }

    #[test]
    fn range_reports_lower_and_upper_bounds() {
        let mut errors = FieldErrors::new();
        errors.range("budget", -1, 0, UINT_MAX);
        errors.range("age", SMALL_UINT_MAX + 1, 0, SMALL_UINT_MAX);
        errors.range("fees_in_usa", 0, 0, UINT_MAX);

        assert!(errors.get("budget").unwrap()[0].contains("greater than or equal to 0"));
        assert!(errors.get("age").unwrap()[0].contains("less than or equal to"));
        assert!(!errors.contains("fees_in_usa"));
    }

    #[test]
    fn media_path_is_placed_under_upload_dir() {
        let mut errors = FieldErrors::new();
        assert_eq!(errors.media_path("poster", "inception.jpg", "movies/"), "movies/inception.jpg");
        assert_eq!(errors.media_path("poster", "movies/a.jpg", "movies/"), "movies/a.jpg");
        assert!(errors.is_empty());

        errors.media_path("image", "../etc/passwd", "actors/");
        assert!(errors.contains("image"));
    }

    #[test]
    fn display_joins_all_messages() {
        let mut errors = FieldErrors::single("url", "taken");
        errors.add("name", "missing");
        assert_eq!(errors.to_string(), "name: missing; url: taken");
        assert!(errors.into_result().is_err());
        assert!(FieldErrors::new().into_result().is_ok());
    }
}
