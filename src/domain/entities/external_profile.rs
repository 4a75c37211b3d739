use std::borrow::Cow;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::entities::skill::MAX_LIST_ITEMS;

const MAX_HANDLE_LENGTH: u64 = 100;
const MAX_URL_LENGTH: u64 = 2048;

static HANDLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.\-]*$").expect("valid handle regex")
});

static FEDIVERSE_HANDLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)+$").expect("valid fediverse regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "external_platform", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Github,
    Gitlab,
    Linkedin,
    Stackoverflow,
    Twitter,
    Mastodon,
    Dev,
    Website,
}

impl Platform {
    /// Canonical profile URL for a normalized handle, when the platform has one.
    pub fn profile_url(self, handle: &str) -> Option<String> {
        let encoded = urlencoding::encode(handle);
        match self {
            Platform::Github => Some(format!("https://github.com/{encoded}")),
            Platform::Gitlab => Some(format!("https://gitlab.com/{encoded}")),
            Platform::Linkedin => Some(format!("https://www.linkedin.com/in/{encoded}")),
            Platform::Stackoverflow => Some(format!("https://stackoverflow.com/users/{encoded}")),
            Platform::Twitter => Some(format!("https://x.com/{encoded}")),
            Platform::Dev => Some(format!("https://dev.to/{encoded}")),
            Platform::Mastodon => {
                let (user, instance) = handle.split_once('@')?;
                Some(format!("https://{instance}/@{}", urlencoding::encode(user)))
            }
            Platform::Website => None,
        }
    }

    /// Strips decoration users commonly paste along with the handle.
    pub fn normalize_handle(self, raw: &str) -> String {
        raw.trim().trim_start_matches('@').to_string()
    }

    pub fn validate_handle(self, handle: &str) -> Result<(), ValidationError> {
        let valid = match self {
            Platform::Mastodon => FEDIVERSE_HANDLE_RE.is_match(handle),
            _ => HANDLE_RE.is_match(handle),
        };

        if valid {
            Ok(())
        } else {
            let message = match self {
                Platform::Mastodon => "Handle must look like user@instance.social",
                _ => "Handle may only contain letters, digits, '.', '_' or '-'",
            };
            Err(new_validation_error("invalid_handle", message))
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ExternalProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub platform: Platform,
    pub handle: String,
    pub url: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewExternalProfileRequest {
    pub platform: Platform,

    #[validate(length(min = 1, max = MAX_HANDLE_LENGTH, message = "Handle must be between 1 and 100 characters"))]
    pub handle: String,

    #[validate(
        length(max = MAX_URL_LENGTH, message = "URL is too long"),
        custom(function = "validate_profile_url")
    )]
    pub url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ExternalProfileInsert {
    pub user_id: Uuid,
    pub platform: Platform,
    pub handle: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct UpdateExternalProfileRequest {
    #[validate(length(min = 1, max = MAX_HANDLE_LENGTH, message = "Handle must be between 1 and 100 characters"))]
    pub handle: Option<String>,

    #[validate(
        length(max = MAX_URL_LENGTH, message = "URL is too long"),
        custom(function = "validate_profile_url")
    )]
    pub url: Option<String>,
}

/// Fully resolved values written by an update.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalProfileChanges {
    pub handle: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReorderExternalProfilesRequest {
    #[validate(length(max = MAX_LIST_ITEMS, message = "Too many profiles in one request"))]
    pub profile_ids: Vec<Uuid>,
}

/// Normalizes the handle and settles the URL for `platform`.
///
/// An explicit URL always wins; otherwise the platform's canonical URL is
/// derived from the handle. Platforms without one require an explicit URL.
pub fn resolve_link(
    platform: Platform,
    raw_handle: &str,
    explicit_url: Option<&str>,
) -> Result<(String, String), (&'static str, ValidationError)> {
    let handle = platform.normalize_handle(raw_handle);
    platform.validate_handle(&handle).map_err(|e| ("handle", e))?;

    let url = match explicit_url.map(str::trim).filter(|u| !u.is_empty()) {
        Some(url) => url.to_string(),
        None => platform.profile_url(&handle).ok_or_else(|| {
            ("url", new_validation_error("url_required", "A URL is required for this platform"))
        })?,
    };

    Ok((handle, url))
}

pub fn validate_profile_url(url: &str) -> Result<(), ValidationError> {
    match url::Url::parse(url.trim()) {
        Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => Ok(()),
        Ok(_) => Err(new_validation_error("invalid_url_scheme", "URL must start with http:// or https://")),
        Err(_) => Err(new_validation_error("invalid_url", "Invalid URL format")),
    }
}

fn new_validation_error(code: &'static str, msg: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(msg));
    err
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn github_url_is_derived_from_handle() {
        let (handle, url) = resolve_link(Platform::Github, " @octocat ", None).unwrap();
        assert_eq!(handle, "octocat");
        assert_eq!(url, "https://github.com/octocat");
    }

    #[test]
    fn mastodon_url_points_at_instance() {
        let (handle, url) = resolve_link(Platform::Mastodon, "@alice@hachyderm.io", None).unwrap();
        assert_eq!(handle, "alice@hachyderm.io");
        assert_eq!(url, "https://hachyderm.io/@alice");
    }

    #[test]
    fn explicit_url_wins() {
        let (_, url) = resolve_link(Platform::Github, "octocat", Some("https://octo.example")).unwrap();
        assert_eq!(url, "https://octo.example");
    }

    #[test]
    fn website_requires_url() {
        let (field, _) = resolve_link(Platform::Website, "me", None).unwrap_err();
        assert_eq!(field, "url");
    }

    #[test]
    fn handles_with_spaces_are_rejected() {
        let (field, _) = resolve_link(Platform::Gitlab, "two words", None).unwrap_err();
        assert_eq!(field, "handle");
    }

    #[test]
    fn non_http_urls_are_rejected() {
        assert!(validate_profile_url("ftp://example.com").is_err());
        assert!(validate_profile_url("https://example.com/me").is_ok());
    }
}
