use base64::Engine;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use std::collections::HashMap;
use subtle::ConstantTimeEq;

type HmacSha1 = Hmac<Sha1>;

/// Validate Twilio's X-Twilio-Signature header: HMAC-SHA1 over the public
/// webhook URL concatenated with the sorted form parameters (key then value),
/// base64-encoded, compared in constant time.
pub fn validate_twilio_signature(
    auth_token: &str,
    signature: &str,
    webhook_url: &str,
    params: &HashMap<String, String>,
) -> bool {
    let mut data = webhook_url.to_string();
    let mut keys: Vec<&String> = params.keys().collect();
    keys.sort();
    for key in keys {
        data.push_str(key);
        data.push_str(&params[key]);
    }

    let Ok(mut mac) = HmacSha1::new_from_slice(auth_token.as_bytes()) else {
        return false;
    };
    mac.update(data.as_bytes());
    let expected = base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes());

    expected.as_bytes().ct_eq(signature.as_bytes()).into()
}
