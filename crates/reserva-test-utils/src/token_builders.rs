//! Builder patterns for test tokens
//!
//! Produces real HS256 JWTs so the client's unverified claim decoding sees
//! the same shape the backend issues.

use crate::test_ids::TEST_SIGNING_SECRET;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Map, Value};
use uuid::Uuid;

/// Builder for test access tokens
///
/// # Example
/// ```rust,ignore
/// let token = TestTokenBuilder::new()
///     .for_user("alice@example.com")
///     .with_roles(&["ROLE_ADMIN"])
///     .expires_in(3600)
///     .build();
/// ```
pub struct TestTokenBuilder {
    sub: String,
    roles: Vec<String>,
    exp: Option<i64>,
    iat: i64,
    jti: Uuid,
    extra: Map<String, Value>,
}

impl TestTokenBuilder {
    /// Create a new token builder: regular user, expires in an hour
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            sub: "test-user@example.com".to_string(),
            roles: vec!["ROLE_USER".to_string()],
            exp: Some((now + Duration::seconds(3600)).timestamp()),
            iat: now.timestamp(),
            jti: Uuid::new_v4(),
            extra: Map::new(),
        }
    }

    /// Set the subject
    pub fn for_user(mut self, subject: &str) -> Self {
        self.sub = subject.to_string();
        self
    }

    /// Replace the roles claim
    pub fn with_roles(mut self, roles: &[&str]) -> Self {
        self.roles = roles.iter().map(ToString::to_string).collect();
        self
    }

    /// Set expiration in seconds from now (negative for already expired)
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.exp = Some((Utc::now() + Duration::seconds(seconds)).timestamp());
        self
    }

    /// Omit the `exp` claim entirely
    pub fn without_expiry(mut self) -> Self {
        self.exp = None;
        self
    }

    /// Set issued-at timestamp
    pub fn issued_at(mut self, timestamp: i64) -> Self {
        self.iat = timestamp;
        self
    }

    /// Add or override an arbitrary claim
    pub fn with_claim(mut self, name: &str, value: Value) -> Self {
        self.extra.insert(name.to_string(), value);
        self
    }

    /// Build the claims as a JSON value
    pub fn claims(&self) -> Value {
        let mut claims = json!({
            "sub": self.sub,
            "roles": self.roles,
            "iat": self.iat,
            "jti": self.jti,
        });
        if let Some(exp) = self.exp {
            claims["exp"] = json!(exp);
        }
        if let Value::Object(map) = &mut claims {
            map.extend(self.extra.clone());
        }
        claims
    }

    /// Build the signed compact JWT
    pub fn build(self) -> String {
        encode(
            &Header::default(),
            &self.claims(),
            &EncodingKey::from_secret(TEST_SIGNING_SECRET),
        )
        .expect("test token encodes")
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}
