//! Stateless session credentials.
//!
//! Sessions are HS256-signed JWTs and are never stored. A credential is valid
//! while its signature checks out and its expiry is in the future; there is no
//! revocation, so a leaked credential stays valid until it expires.

use crate::error::{ErrorKind, Result};
use audiotube_store::UserId;
use exn::ResultExt;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, UtcDateTime};

pub const DEFAULT_TTL: Duration = Duration::days(30);

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    user_id: UserId,
    iat: i64,
    exp: i64,
}

/// A verified session.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Session {
    pub user_id: UserId,
    pub issued_at: UtcDateTime,
    pub expires_at: UtcDateTime,
}

/// Signs and verifies session credentials with a single shared secret.
#[derive(Clone)]
pub struct Sessions {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}
impl std::fmt::Debug for Sessions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material.
        f.debug_struct("Sessions").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}
impl Sessions {
    pub fn new(secret: impl AsRef<[u8]>, ttl: Duration) -> Self {
        let secret = secret.as_ref();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);
        Self { encoding: EncodingKey::from_secret(secret), decoding: DecodingKey::from_secret(secret), validation, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn sign(&self, user_id: UserId) -> Result<String> {
        self.sign_at(user_id, UtcDateTime::now())
    }

    /// Sign a credential for `user_id` as if issued at `issued_at`.
    pub fn sign_at(&self, user_id: UserId, issued_at: UtcDateTime) -> Result<String> {
        let claims = Claims {
            user_id,
            iat: issued_at.unix_timestamp(),
            exp: (issued_at + self.ttl).unix_timestamp(),
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).or_raise(|| ErrorKind::Session)
    }

    /// Verify signature and expiry against the current wall clock.
    ///
    /// Every failure (malformed, forged, expired) is [`ErrorKind::Unauthenticated`].
    pub fn verify(&self, credential: impl AsRef<str>) -> Result<Session> {
        let data = jsonwebtoken::decode::<Claims>(credential.as_ref(), &self.decoding, &self.validation)
            .or_raise(|| ErrorKind::Unauthenticated)?;
        let claims = data.claims;
        Ok(Session {
            user_id: claims.user_id,
            issued_at: UtcDateTime::from_unix_timestamp(claims.iat).or_raise(|| ErrorKind::Unauthenticated)?,
            expires_at: UtcDateTime::from_unix_timestamp(claims.exp).or_raise(|| ErrorKind::Unauthenticated)?,
        })
    }
}
