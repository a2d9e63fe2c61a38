//! Bearer token verification.
//!
//! Tokens are issued by the accounts service and signed with the shared
//! `JWT_SECRET_KEY` (HS256). The `sub` claim carries the numeric user id, either as
//! a JSON number or as a numeric string; `role` is optional.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use crate::domain::value_objects::UserId;
use crate::{Error, Result};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Role {
    #[default]
    Customer,
    Admin,
}

impl Role {
    fn from_claim(claim: Option<&str>) -> Self {
        match claim {
            Some(r) if r.eq_ignore_ascii_case("admin") => Self::Admin,
            _ => Self::Customer,
        }
    }
}

/// Verified caller identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool { self.role == Role::Admin }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Subject {
    Number(i64),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: Subject,
    #[serde(default)]
    role: Option<String>,
}

pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn hs256(secret: &[u8]) -> Self {
        Self { key: DecodingKey::from_secret(secret), validation: Validation::new(Algorithm::HS256) }
    }

    pub fn verify(&self, token: &str) -> Result<Identity> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "rejected bearer token");
            Error::Unauthorized
        })?;
        let user_id = match data.claims.sub {
            Subject::Number(id) => id,
            Subject::Text(s) => s.trim().parse().map_err(|_| Error::Unauthorized)?,
        };
        Ok(Identity { user_id, role: Role::from_claim(data.claims.role.as_deref()) })
    }
}
