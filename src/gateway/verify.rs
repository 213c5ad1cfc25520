use std::collections::HashMap;
use subtle::ConstantTimeEq;

/// Result of a subscription verification handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// Token matched — echo the challenge back with a success status.
    Accepted(String),
    /// Token mismatched or absent.
    Forbidden,
    /// Required mode/challenge parameters missing or wrong mode.
    BadRequest,
}

/// Answer a Meta-style subscription challenge. Stateless: nothing is kept
/// between handshake calls.
pub fn check(params: &HashMap<String, String>, expected_token: &str) -> VerifyOutcome {
    let (Some(mode), Some(challenge)) = (params.get("hub.mode"), params.get("hub.challenge"))
    else {
        return VerifyOutcome::BadRequest;
    };
    if mode != "subscribe" {
        return VerifyOutcome::BadRequest;
    }

    let supplied = params.get("hub.verify_token").map(String::as_str).unwrap_or("");
    let matches: bool = supplied
        .as_bytes()
        .ct_eq(expected_token.as_bytes())
        .into();
    if matches && !expected_token.is_empty() {
        VerifyOutcome::Accepted(challenge.clone())
    } else {
        VerifyOutcome::Forbidden
    }
}
