//! Localized client-facing error messages.
//!
//! Errors carry a stable message id (see `AuthError::message_id`). The id is
//! turned into text only at the edge, in the language negotiated from the
//! request's `Accept-Language` header.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Languages the message catalog has entries for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "ja")]
    Japanese,
}

impl Language {
    /// Primary language subtag, e.g. `en`.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Japanese => "ja",
        }
    }

    /// Match a BCP 47 tag on its primary subtag (`en-GB` is English).
    pub fn from_tag(tag: &str) -> Option<Self> {
        let primary = tag.split(['-', '_']).next()?.trim();

        if primary.eq_ignore_ascii_case("en") {
            Some(Self::English)
        } else if primary.eq_ignore_ascii_case("ja") {
            Some(Self::Japanese)
        } else {
            None
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s).ok_or_else(|| format!("unsupported language: {}", s))
    }
}

/// Pick the best supported language from an `Accept-Language` value.
///
/// Entries are ranked by their `q` weight; ties keep header order. Entries
/// with `q=0`, wildcards and unsupported tags are skipped. A malformed weight
/// discards the whole header and yields `default`.
pub fn resolve_accept_language(header: Option<&str>, default: Language) -> Language {
    let Some(header) = header else {
        return default;
    };

    let mut best: Option<(f32, Language)> = None;

    for entry in header.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let mut parts = entry.split(';').map(str::trim);
        let tag = parts.next().unwrap_or_default();

        let mut weight = 1.0_f32;
        for param in parts {
            if let Some(q) = param.strip_prefix("q=") {
                match q.parse::<f32>() {
                    Ok(q) if (0.0..=1.0).contains(&q) => weight = q,
                    _ => return default,
                }
            }
        }

        if weight <= 0.0 {
            continue;
        }
        let Some(language) = Language::from_tag(tag) else {
            continue;
        };

        if best.is_none_or(|(w, _)| weight > w) {
            best = Some((weight, language));
        }
    }

    best.map(|(_, language)| language).unwrap_or(default)
}

/// Message lookup by id.
pub trait Localize: Send + Sync {
    fn localize(&self, language: Language, message_id: &str) -> String;
}

/// Built-in catalog covering every authentication error.
#[derive(Debug, Clone, Copy, Default)]
pub struct Catalog;

impl Catalog {
    fn lookup(language: Language, message_id: &str) -> Option<&'static str> {
        let text = match (language, message_id) {
            (Language::English, "token_not_set") => "Token is not set.",
            (Language::English, "token_invalid") => "Token is invalid or has expired.",
            (Language::English, "session_not_found") => "Session not found. Please sign in again.",
            (Language::English, "token_not_found") => "Refresh token not found. Please sign in again.",
            (Language::English, "token_mismatch") => "Access token and refresh token do not match.",
            (Language::English, "invalid_access_token") => "Access token is invalid.",
            (Language::English, "invalid_refresh_token") => "Refresh token is invalid.",
            (Language::English, "password_not_match") => "Email or password is incorrect.",
            (Language::English, "no_access_token") => "No access token found.",
            (Language::English, "user_not_found") => "User not found.",
            (Language::English, "invalid_oauth_payload") => "Sign-in provider response is incomplete.",
            (Language::English, "oauth_rejected") => "Sign-in with the provider was rejected.",
            (Language::English, "invalid_request") => "Request body is invalid.",
            (Language::English, "internal") => "An internal error occurred.",

            (Language::Japanese, "token_not_set") => "トークンが設定されていません。",
            (Language::Japanese, "token_invalid") => "トークンが無効か、有効期限が切れています。",
            (Language::Japanese, "session_not_found") => "セッションが見つかりません。再度ログインしてください。",
            (Language::Japanese, "token_not_found") => "リフレッシュトークンが見つかりません。再度ログインしてください。",
            (Language::Japanese, "token_mismatch") => "アクセストークンとリフレッシュトークンが一致しません。",
            (Language::Japanese, "invalid_access_token") => "アクセストークンが無効です。",
            (Language::Japanese, "invalid_refresh_token") => "リフレッシュトークンが無効です。",
            (Language::Japanese, "password_not_match") => "メールアドレスまたはパスワードが正しくありません。",
            (Language::Japanese, "no_access_token") => "アクセストークンが見つかりません。",
            (Language::Japanese, "user_not_found") => "ユーザーが見つかりません。",
            (Language::Japanese, "invalid_oauth_payload") => "認証プロバイダーの応答が不完全です。",
            (Language::Japanese, "oauth_rejected") => "認証プロバイダーでのログインが拒否されました。",
            (Language::Japanese, "invalid_request") => "リクエストの形式が正しくありません。",
            (Language::Japanese, "internal") => "内部エラーが発生しました。",

            _ => return None,
        };
        Some(text)
    }
}

impl Localize for Catalog {
    /// Unknown ids fall back to English, then to the id itself.
    fn localize(&self, language: Language, message_id: &str) -> String {
        Self::lookup(language, message_id)
            .or_else(|| Self::lookup(Language::English, message_id))
            .map(str::to_string)
            .unwrap_or_else(|| message_id.to_string())
    }
}
