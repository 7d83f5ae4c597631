//! Signed-cookie sessions.
//!
//! The cookie carries an HS256 token whose claims hold the two role flags and
//! any pending flash notices. Every request decodes it once into a [`Session`]
//! value that handlers take as an argument and hand back in their response,
//! which re-signs it with a fresh expiry.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::{IntoResponseParts, ResponseParts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::auth::AppState;

pub const SESSION_COOKIE: &str = "querydesk_session";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Error,
}

/// One-shot notice shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    /// Admin username when the admin flag is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin: Option<String>,
    /// Student identifier when the student flag is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flashes: Vec<Flash>,
}

impl SessionData {
    pub fn is_empty(&self) -> bool {
        self.admin.is_none() && self.student.is_none() && self.flashes.is_empty()
    }
}

#[derive(Serialize, Deserialize)]
struct SessionClaims {
    #[serde(flatten)]
    data: SessionData,
    exp: usize,
}

/// Signing material and lifetime for session tokens.
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: chrono::Duration,
}

impl SessionKeys {
    pub fn new(secret: &str, ttl: chrono::Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn encode(&self, data: &SessionData) -> anyhow::Result<String> {
        let claims = SessionClaims {
            data: data.clone(),
            exp: (chrono::Utc::now() + self.ttl).timestamp().max(0) as usize,
        };
        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    /// `None` for a bad signature, a malformed token or an expired session.
    pub fn decode(&self, token: &str) -> Option<SessionData> {
        match decode::<SessionClaims>(token, &self.decoding, &Validation::default()) {
            Ok(token_data) => Some(token_data.claims.data),
            Err(e) => {
                debug!("Discarding session cookie: {}", e);
                None
            }
        }
    }
}

/// Per-request authentication context.
pub struct Session {
    data: SessionData,
    keys: Arc<SessionKeys>,
    /// Whether the request carried a session cookie at all.
    had_cookie: bool,
}

impl Session {
    pub fn new(data: SessionData, keys: Arc<SessionKeys>) -> Self {
        Self {
            data,
            keys,
            had_cookie: false,
        }
    }

    pub fn data(&self) -> &SessionData {
        &self.data
    }

    pub fn admin(&self) -> Option<&str> {
        self.data.admin.as_deref()
    }

    pub fn is_admin(&self) -> bool {
        self.data.admin.is_some()
    }

    pub fn student_id(&self) -> Option<&str> {
        self.data.student.as_deref()
    }

    pub fn is_student(&self) -> bool {
        self.data.student.is_some()
    }

    pub fn login_admin(&mut self, username: impl Into<String>) {
        self.data.admin = Some(username.into());
    }

    pub fn login_student(&mut self, student_id: impl Into<String>) {
        self.data.student = Some(student_id.into());
    }

    /// Clears both role flags. Pending flashes survive so the next page can
    /// still show them.
    pub fn logout(&mut self) {
        self.data.admin = None;
        self.data.student = None;
    }

    pub fn flash(&mut self, level: FlashLevel, message: impl Into<String>) {
        self.data.flashes.push(Flash {
            level,
            message: message.into(),
        });
    }

    pub fn take_flashes(&mut self) -> Vec<Flash> {
        std::mem::take(&mut self.data.flashes)
    }

    /// `None` when there is nothing to store and nothing to clear.
    fn into_cookie(self) -> Option<Cookie<'static>> {
        if self.data.is_empty() {
            return self.had_cookie.then(removal_cookie);
        }

        let cookie = match self.keys.encode(&self.data) {
            Ok(token) => Cookie::build((SESSION_COOKIE, token))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .build(),
            Err(e) => {
                error!("Failed to sign session: {}", e);
                removal_cookie()
            }
        };
        Some(cookie)
    }
}

fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build((SESSION_COOKIE, "")).path("/").build();
    cookie.make_removal();
    cookie
}

impl FromRequestParts<AppState> for Session {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let cookie = jar.get(SESSION_COOKIE);
        let data = cookie
            .as_ref()
            .and_then(|cookie| state.session.decode(cookie.value()))
            .unwrap_or_default();

        Ok(Session {
            data,
            keys: state.session.clone(),
            had_cookie: cookie.is_some(),
        })
    }
}

impl IntoResponseParts for Session {
    type Error = Infallible;

    fn into_response_parts(self, res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        match self.into_cookie() {
            Some(cookie) => CookieJar::new().add(cookie).into_response_parts(res),
            None => Ok(res),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> SessionKeys {
        SessionKeys::new("test-secret", chrono::Duration::hours(1))
    }

    #[test]
    fn token_round_trips_flags_and_flashes() {
        let data = SessionData {
            admin: Some("admin".into()),
            student: Some("s-17".into()),
            flashes: vec![Flash {
                level: FlashLevel::Success,
                message: "Saved".into(),
            }],
        };
        let token = keys().encode(&data).unwrap();
        assert_eq!(keys().decode(&token), Some(data));
    }

    #[test]
    fn tampered_or_foreign_tokens_are_rejected() {
        let data = SessionData {
            admin: Some("admin".into()),
            ..SessionData::default()
        };
        let token = keys().encode(&data).unwrap();

        let other = SessionKeys::new("another-secret", chrono::Duration::hours(1));
        assert_eq!(other.decode(&token), None);

        let mut tampered = token.clone();
        tampered.push('x');
        assert_eq!(keys().decode(&tampered), None);
        assert_eq!(keys().decode("not-a-token"), None);
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let stale = SessionKeys::new("test-secret", chrono::Duration::hours(-2));
        let token = stale
            .encode(&SessionData {
                student: Some("s-1".into()),
                ..SessionData::default()
            })
            .unwrap();
        assert_eq!(keys().decode(&token), None);
    }

    #[test]
    fn logout_clears_both_flags_but_keeps_flashes() {
        let mut session = Session::new(SessionData::default(), Arc::new(keys()));
        session.login_admin("admin");
        session.login_student("s-1");
        session.flash(FlashLevel::Info, "bye");

        session.logout();

        assert!(!session.is_admin());
        assert!(!session.is_student());
        assert_eq!(session.take_flashes().len(), 1);
        assert!(session.data().is_empty());
    }

    #[test]
    fn empty_session_only_clears_a_cookie_it_was_sent() {
        let anonymous = Session::new(SessionData::default(), Arc::new(keys()));
        assert!(anonymous.into_cookie().is_none());

        let returning = Session {
            data: SessionData::default(),
            keys: Arc::new(keys()),
            had_cookie: true,
        };
        let cookie = returning.into_cookie().expect("removal cookie");
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "");
    }
}
