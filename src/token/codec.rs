//! Public string form of a split token.
//!
//! The token is the encoded selector followed directly by the base64url
//! encoding of the verifier. Both halves have fixed lengths, so no separator is
//! needed and the result only uses URL-safe characters.

use base64ct::{Base64UrlUnpadded, Encoding};
use secrecy::SecretString;
use zeroize::Zeroize;

use super::error::TokenError;
use super::verifier::{
    SELECTOR_ENCODED_LEN, Selector, VERIFIER_ENCODED_LEN, VERIFIER_LEN, Verifier,
};

/// Length of an encoded token.
pub const TOKEN_LEN: usize = SELECTOR_ENCODED_LEN + VERIFIER_ENCODED_LEN;

/// Encode both halves into the token handed to the user.
#[must_use]
pub fn encode(selector: &Selector, verifier: &Verifier) -> SecretString {
    // Reserve up front so the buffer holding the secret never reallocates.
    let mut token = String::with_capacity(TOKEN_LEN);
    token.push_str(selector.as_str());

    let mut encoded = Base64UrlUnpadded::encode_string(verifier.expose());
    token.push_str(&encoded);
    encoded.zeroize();

    SecretString::from(token)
}

/// Split a submitted token back into its selector and verifier.
///
/// # Errors
/// Returns `TokenError::MalformedToken` if the string does not have the exact
/// token length or either half is not canonical base64url of the right size.
pub fn decode(token: &str) -> Result<(Selector, Verifier), TokenError> {
    if token.len() != TOKEN_LEN || !token.is_ascii() {
        return Err(TokenError::MalformedToken);
    }

    let (selector, verifier) = token.split_at(SELECTOR_ENCODED_LEN);
    let selector = Selector::parse(selector)?;

    let mut bytes = [0u8; VERIFIER_LEN];
    let decoded_len = match Base64UrlUnpadded::decode(verifier, &mut bytes) {
        Ok(decoded) => decoded.len(),
        Err(_) => {
            bytes.zeroize();
            return Err(TokenError::MalformedToken);
        }
    };
    if decoded_len != VERIFIER_LEN {
        bytes.zeroize();
        return Err(TokenError::MalformedToken);
    }

    Ok((selector, Verifier::take(&mut bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::verifier::SELECTOR_LEN;
    use secrecy::ExposeSecret;

    fn parts() -> (Selector, Verifier) {
        let selector = Selector::from_bytes(&[0xA5u8; SELECTOR_LEN]);
        let verifier = Verifier::take(&mut [0x3Cu8; VERIFIER_LEN]);
        (selector, verifier)
    }

    #[test]
    fn encode_is_url_safe_and_fixed_length() {
        let (selector, verifier) = parts();
        let token = encode(&selector, &verifier);
        let token = token.expose_secret();
        assert_eq!(token.len(), TOKEN_LEN);
        assert!(token.starts_with(selector.as_str()));
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn decode_recovers_both_halves() {
        let (selector, verifier) = parts();
        let token = encode(&selector, &verifier);
        let decoded = decode(token.expose_secret());
        assert!(decoded.is_ok());
        if let Ok((decoded_selector, decoded_verifier)) = decoded {
            assert_eq!(decoded_selector, selector);
            assert_eq!(decoded_verifier.expose(), verifier.expose());
        }
    }

    #[test]
    fn decode_rejects_wrong_length() {
        let (selector, verifier) = parts();
        let token = encode(&selector, &verifier);
        let token = token.expose_secret();
        assert!(matches!(
            decode(&token[..TOKEN_LEN - 1]),
            Err(TokenError::MalformedToken)
        ));
        assert!(matches!(
            decode(&format!("{token}A")),
            Err(TokenError::MalformedToken)
        ));
        assert!(matches!(decode(""), Err(TokenError::MalformedToken)));
    }

    #[test]
    fn decode_rejects_bad_charset() {
        let bad = "+".repeat(TOKEN_LEN);
        assert!(matches!(decode(&bad), Err(TokenError::MalformedToken)));

        // Multi-byte characters must not trip the split point.
        let mut unicode = "é".to_string();
        unicode.push_str(&"A".repeat(TOKEN_LEN - 2));
        assert_eq!(unicode.len(), TOKEN_LEN);
        assert!(matches!(decode(&unicode), Err(TokenError::MalformedToken)));
    }
}
