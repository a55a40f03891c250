use axum::http::{header, HeaderMap};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const SESSION_COOKIE: &str = "fieldops_session";

/// The signed-in technician as carried by the session cookie.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
    pub name: String,
    pub level: i64,
}

/// Signs and verifies the session cookie: base64 JSON payload plus a
/// SHA-256 digest over the server secret and the payload. There is no
/// server-side session state.
#[derive(Clone)]
pub struct SessionSigner {
    secret: String,
}

impl SessionSigner {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    fn signature(&self, payload: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(b".");
        hasher.update(payload.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn encode(&self, session: &Session) -> String {
        // serializing a struct of strings and an int cannot fail
        let json = serde_json::to_string(session).unwrap_or_default();
        let payload = URL_SAFE_NO_PAD.encode(json);
        let signature = self.signature(&payload);
        format!("{payload}.{signature}")
    }

    pub fn decode(&self, value: &str) -> Option<Session> {
        let (payload, signature) = value.split_once('.')?;
        if self.signature(payload) != signature {
            return None;
        }
        let json = URL_SAFE_NO_PAD.decode(payload).ok()?;
        serde_json::from_slice(&json).ok()
    }

    pub fn cookie(&self, session: &Session) -> String {
        format!(
            "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax",
            self.encode(session)
        )
    }

    pub fn clear_cookie() -> String {
        format!("{SESSION_COOKIE}=; Path=/; HttpOnly; Max-Age=0")
    }

    /// Extracts and verifies the session from the request cookies.
    pub fn session_from_headers(&self, headers: &HeaderMap) -> Option<Session> {
        let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
        cookies.split(';').find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            if name != SESSION_COOKIE {
                return None;
            }
            self.decode(value)
        })
    }
}
