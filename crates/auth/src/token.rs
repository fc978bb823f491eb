use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use rand::rngs::OsRng;

/// Bytes of entropy per magic-link token.
pub const TOKEN_BYTES: usize = 32;

/// Generate an opaque, URL-safe token from the operating system's CSPRNG.
///
/// 32 bytes encode to 43 characters of unpadded URL-safe base64, so the token
/// can be dropped into a query string as-is.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_length_and_alphabet() {
        let token = generate_token();
        assert_eq!(token.len(), 43);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'), "{token}");
    }

    #[test]
    fn test_decodes_to_full_entropy() {
        let decoded = URL_SAFE_NO_PAD.decode(generate_token()).unwrap();
        assert_eq!(decoded.len(), TOKEN_BYTES);
    }

    #[test]
    fn test_uniqueness() {
        let tokens = (0..1000).map(|_| generate_token()).collect::<HashSet<_>>();
        assert_eq!(tokens.len(), 1000);
    }
}
