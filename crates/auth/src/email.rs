use crate::error::{Error, ErrorKind, Result};
use std::fmt;
use std::str::FromStr;

const MAX_LENGTH: usize = 254;

/// A normalized (trimmed, lower-cased) email address.
///
/// Validation is intentionally shallow: the only real proof that an address
/// works is the magic link arriving in its inbox.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Email(String);
impl Email {
    pub fn parse(raw: impl AsRef<str>) -> Result<Self> {
        let email = raw.as_ref().trim().to_lowercase();
        if email.is_empty() || email.len() > MAX_LENGTH || email.chars().any(char::is_whitespace) {
            exn::bail!(ErrorKind::InvalidEmail);
        }
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
                Ok(Self(email))
            },
            _ => exn::bail!(ErrorKind::InvalidEmail),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
impl FromStr for Email {
    type Err = Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s)
    }
}
impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("a@b.com", "a@b.com")]
    #[case("  A@B.com ", "a@b.com")]
    #[case("First.Last+tag@Example.ORG", "first.last+tag@example.org")]
    fn test_normalizes(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(Email::parse(raw).unwrap().as_str(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("no-at-sign")]
    #[case("@b.com")]
    #[case("a@")]
    #[case("a@b@c.com")]
    #[case("a b@c.com")]
    fn test_rejects(#[case] raw: &str) {
        let err = Email::parse(raw).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidEmail));
    }

    #[test]
    fn test_rejects_overlong() {
        let raw = format!("{}@example.com", "a".repeat(MAX_LENGTH));
        assert!(Email::parse(raw).is_err());
    }
}
