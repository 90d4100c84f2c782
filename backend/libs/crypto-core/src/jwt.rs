/// RS256 bearer tokens shared by backend services
///
/// Keys are installed once at startup into process-wide cells. Services that
/// only check tokens install the public key alone with
/// `initialize_jwt_validation_only`; issuers install both halves with
/// `initialize_jwt_keys`.
///
/// The subject claim carries the numeric user id in decimal form.
///
/// ```rust,no_run
/// use crypto_core::jwt;
///
/// let public_key = std::env::var("JWT_PUBLIC_KEY_PEM").unwrap_or_default();
/// jwt::initialize_jwt_validation_only(&public_key)?;
/// # Ok::<(), anyhow::Error>(())
/// ```
use anyhow::{anyhow, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation,
};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

const ACCESS_TOKEN_EXPIRY_HOURS: i64 = 1;

/// Only asymmetric signatures are accepted.
const JWT_ALGORITHM: Algorithm = Algorithm::RS256;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// User id, decimal
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub username: String,
}

impl Claims {
    /// Access-token claims for `user_id`, valid from now.
    pub fn access(user_id: i64, username: &str) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(ACCESS_TOKEN_EXPIRY_HOURS)).timestamp(),
            username: username.to_string(),
        }
    }

    pub fn user_id(&self) -> Result<i64> {
        self.sub
            .parse::<i64>()
            .map_err(|e| anyhow!("Invalid user ID format in token: {e}"))
    }
}

static JWT_ENCODING_KEY: OnceCell<EncodingKey> = OnceCell::new();
static JWT_DECODING_KEY: OnceCell<DecodingKey> = OnceCell::new();

/// Install signing and verification keys. Fails if either is already set.
pub fn initialize_jwt_keys(private_key_pem: &str, public_key_pem: &str) -> Result<()> {
    let encoding_key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
        .map_err(|e| anyhow!("Failed to parse RSA private key: {e}"))?;

    JWT_ENCODING_KEY
        .set(encoding_key)
        .map_err(|_| anyhow!("JWT encoding key already initialized"))?;

    initialize_jwt_validation_only(public_key_pem)
}

/// Install the verification key only.
pub fn initialize_jwt_validation_only(public_key_pem: &str) -> Result<()> {
    let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
        .map_err(|e| anyhow!("Failed to parse RSA public key: {e}"))?;

    JWT_DECODING_KEY
        .set(decoding_key)
        .map_err(|_| anyhow!("JWT decoding key already initialized"))?;

    Ok(())
}

fn get_encoding_key() -> Result<&'static EncodingKey> {
    JWT_ENCODING_KEY.get().ok_or_else(|| {
        anyhow!("JWT signing key not initialized. Call initialize_jwt_keys() during startup.")
    })
}

fn get_decoding_key() -> Result<&'static DecodingKey> {
    JWT_DECODING_KEY.get().ok_or_else(|| {
        anyhow!("JWT verification key not initialized. Call initialize_jwt_validation_only() during startup.")
    })
}

/// Sign arbitrary claims.
pub fn sign_claims(claims: &Claims) -> Result<String> {
    encode(&Header::new(JWT_ALGORITHM), claims, get_encoding_key()?)
        .map_err(|e| anyhow!("Failed to sign token: {e}"))
}

/// Short-lived access token for `user_id`.
pub fn generate_access_token(user_id: i64, username: &str) -> Result<String> {
    sign_claims(&Claims::access(user_id, username))
}

/// Verify signature and expiry, then decode the claims.
pub fn validate_token(token: &str) -> Result<TokenData<Claims>> {
    let mut validation = Validation::new(JWT_ALGORITHM);
    validation.validate_exp = true;

    decode::<Claims>(token, get_decoding_key()?, &validation)
        .map_err(|e| anyhow!("Token validation failed: {e}"))
}

/// Validated numeric user id of a token.
pub fn get_user_id_from_token(token: &str) -> Result<i64> {
    validate_token(token)?.claims.user_id()
}
