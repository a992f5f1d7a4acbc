//! Bearer tokens: `base64(user_id:email:issued_at:hex(hmac_sha256(tag)))`.
//!
//! The tag is computed over `user_id:email:issued_at` with the server secret,
//! so possession of the string is only worth anything if it came from this
//! server. Verification rejects tampered, malformed and expired tokens with
//! the same `None` — a caller cannot tell which case it hit.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Rolling expiry window, measured from issuance.
pub const TOKEN_TTL_SECS: i64 = 7 * 24 * 3600;

#[derive(Debug, Clone, PartialEq)]
pub struct TokenPayload {
    pub user_id: String,
    pub email: String,
}

pub fn issue(secret: &str, user_id: Uuid, email: &str) -> String {
    issue_at(secret, user_id, email, chrono::Utc::now().timestamp())
}

pub fn issue_at(secret: &str, user_id: Uuid, email: &str, issued_at: i64) -> String {
    let payload = format!("{user_id}:{email}:{issued_at}");
    let tag = sign(secret, payload.as_bytes());
    B64.encode(format!("{payload}:{tag}"))
}

pub fn verify(secret: &str, token: &str) -> Option<TokenPayload> {
    verify_at(secret, token, chrono::Utc::now().timestamp())
}

pub fn verify_at(secret: &str, token: &str, now: i64) -> Option<TokenPayload> {
    let decoded = B64.decode(token).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;

    // user_id : email (may itself contain ':') : issued_at : tag
    let parts: Vec<&str> = decoded.split(':').collect();
    if parts.len() < 4 {
        return None;
    }
    let tag = parts[parts.len() - 1];
    let issued_at: i64 = parts[parts.len() - 2].parse().ok()?;

    let payload = &decoded[..decoded.len() - tag.len() - 1];
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(payload.as_bytes());
    mac.verify_slice(&hex::decode(tag).ok()?).ok()?;

    if now - issued_at >= TOKEN_TTL_SECS {
        return None;
    }

    Some(TokenPayload {
        user_id: parts[0].to_string(),
        email: parts[1..parts.len() - 2].join(":"),
    })
}

fn sign(secret: &str, payload: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}
