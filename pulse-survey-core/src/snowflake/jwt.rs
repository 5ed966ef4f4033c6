//! Key-pair JWT issuance for Snowflake authentication.
//!
//! Tokens follow the Snowflake key-pair scheme: the subject is
//! `<ACCOUNT>.<USER>` and the issuer appends the public-key fingerprint.
//! The account is upper-cased and any region suffix after the first `.` is
//! dropped, matching what the official connectors send.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{PulseSurveyError, Result};
use crate::keypair::KeyPair;

/// Token lifetime. Snowflake caps key-pair JWTs at one hour; staying under
/// the cap avoids clock-skew rejections.
const TOKEN_LIFETIME_SECS: i64 = 55 * 60;

#[derive(Serialize)]
struct Claims {
    iss: String,
    sub: String,
    iat: i64,
    exp: i64,
}

/// `ACCOUNT.USER` with the account region suffix stripped, upper-cased.
fn qualified_user(account: &str, user: &str) -> String {
    let account = account.split('.').next().unwrap_or(account).to_uppercase();
    format!("{account}.{}", user.to_uppercase())
}

/// Issues a key-pair JWT valid from now.
pub fn issue_token(keypair: &KeyPair, account: &str, user: &str) -> Result<String> {
    issue_token_at(keypair, account, user, Utc::now())
}

/// Issues a key-pair JWT with an explicit issue instant. Token contents are
/// fully determined by the key, the identity, and `issued_at`.
pub fn issue_token_at(
    keypair: &KeyPair,
    account: &str,
    user: &str,
    issued_at: DateTime<Utc>,
) -> Result<String> {
    let subject = qualified_user(account, user);
    let issued = issued_at.timestamp();
    let claims = Claims {
        iss: format!("{subject}.{}", keypair.fingerprint()),
        sub: subject,
        iat: issued,
        exp: issued + TOKEN_LIFETIME_SECS,
    };

    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let payload = serde_json::to_vec(&claims)
        .map_err(|e| PulseSurveyError::serialization("JWT claims", e))?;
    let signing_input = format!("{header}.{}", URL_SAFE_NO_PAD.encode(payload));
    let signature = keypair.sign_base64url(signing_input.as_bytes())?;

    Ok(format!("{signing_input}.{signature}"))
}
