//! Manage json web tokens.

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
};
use serde::{Deserialize, Serialize};

use crate::config::Jwt;
use crate::error::Result;

/// Lifetime of issued tokens, in seconds.
pub const EXPIRATION_TIME: u64 = 60 * 60 * 3; // 3 hours.

/// Pieces of information asserted on a JWT.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Claims {
    /// Recipients that the JWT is intended for.
    pub aud: String,
    /// Identifies the expiration time on or after which the JWT must not be
    /// accepted for processing.
    pub exp: u64,
    /// Identifies the time at which the JWT was issued.
    pub iat: u64,
    /// Identifies the organization that issued the JWT.
    pub iss: String,
    /// Username.
    pub sub: String,
    /// Email address of the subject.
    pub email: String,
    /// Unique token identifier, fresh per issuance.
    pub jti: String,
}

/// Issue and check HS256 JWT tokens.
///
/// Tokens stay valid until natural expiry: there is no refresh and no
/// revocation list.
#[derive(Clone)]
pub struct TokenIssuer {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
}

impl TokenIssuer {
    /// Create a new [`TokenIssuer`] from the `jwt` configuration section.
    pub fn new(config: &Jwt) -> Self {
        Self {
            algorithm: Algorithm::HS256,
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            issuer: config.valid_issuer.clone(),
            audience: config.valid_audience.clone(),
        }
    }

    /// Sign a new token for a user, expiring in [`EXPIRATION_TIME`] seconds.
    pub fn issue(&self, username: &str, email: &str) -> Result<String> {
        let time = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
        let header = Header::new(self.algorithm);
        let claims = Claims {
            aud: self.audience.clone(),
            exp: time + EXPIRATION_TIME,
            iat: time,
            iss: self.issuer.clone(),
            sub: username.to_owned(),
            email: email.to_owned(),
            jti: crate::crypto::random_hex(),
        };

        Ok(encode(&header, &claims, &self.encoding_key)?)
    }

    /// Decode and check a token: signature, expiry, issuer and audience.
    pub fn decode(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(self.algorithm);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);

        Ok(decode::<Claims>(token, &self.decoding_key, &validation)?.claims)
    }
}
