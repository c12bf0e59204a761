use base64::{Engine, engine::general_purpose::STANDARD};
use sha2::{Digest, Sha256};

/// Answer an obs-websocket authentication challenge.
///
/// `base64(sha256(base64(sha256(password + salt)) + challenge))`
pub(crate) fn authentication_string(password: &str, salt: &str, challenge: &str) -> String {
    let secret = STANDARD.encode(Sha256::digest(format!("{password}{salt}").as_bytes()));
    STANDARD.encode(Sha256::digest(format!("{secret}{challenge}").as_bytes()))
}
