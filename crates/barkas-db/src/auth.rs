//! # Auth Service
//!
//! Password sign-in and revocable session tokens.
//!
//! ## Session Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sign_in(email, password)                                               │
//! │       │                                                                 │
//! │       ├── unknown email ──────────┐                                     │
//! │       ├── wrong password ─────────┴──► InvalidCredentials (same error)  │
//! │       ▼                                                                 │
//! │  JWT { sub, email, role, iat, exp, jti }   (HS256)                      │
//! │       │                                                                 │
//! │       └──► auth_sessions row keyed by jti                               │
//! │                                                                         │
//! │  get_session(token)                                                     │
//! │       ├── bad signature / unknown jti ──► InvalidToken                  │
//! │       ├── exp passed ───────────────────► SessionExpired                │
//! │       └── revoked_at set ───────────────► SessionRevoked                │
//! │                                                                         │
//! │  sign_out(token) ──► revoked_at = now (idempotent)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use barkas_core::validation::{validate_email, validate_password, validate_required};
use barkas_core::{Role, Session, User, ValidationError};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::user::UserRepository;

// =============================================================================
// Errors
// =============================================================================

/// Authentication failures.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown email or wrong password. The two are deliberately identical.
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid session token")]
    InvalidToken,

    #[error("Session expired")]
    SessionExpired,

    #[error("Session has been signed out")]
    SessionRevoked,

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Token signing failed: {0}")]
    Signing(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Database(#[from] DbError),
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        AuthError::Database(err.into())
    }
}

pub type AuthResult<T> = Result<T, AuthError>;

// =============================================================================
// Configuration & Claims
// =============================================================================

/// Token settings.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC secret for HS256.
    pub jwt_secret: String,
    /// Session lifetime in seconds.
    pub session_lifetime_secs: i64,
}

/// JWT claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    pub email: String,
    pub role: Role,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
    /// JWT ID, also the `auth_sessions` primary key
    pub jti: String,
}

// =============================================================================
// Service
// =============================================================================

/// Sign-in, sign-out and session validation.
#[derive(Debug, Clone)]
pub struct AuthService {
    pool: SqlitePool,
    users: UserRepository,
    secret: String,
    lifetime: Duration,
}

impl AuthService {
    pub fn new(pool: SqlitePool, config: AuthConfig) -> Self {
        AuthService {
            users: UserRepository::new(pool.clone()),
            pool,
            secret: config.jwt_secret,
            lifetime: Duration::seconds(config.session_lifetime_secs),
        }
    }

    /// Creates a staff account.
    ///
    /// ## Rules
    /// - valid email, not already registered
    /// - password of at least 8 characters
    /// - non-blank name
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
        role: Role,
    ) -> AuthResult<User> {
        validate_email(email)?;
        validate_password(password)?;
        validate_required("name", name)?;

        let hash = Self::hash_password(password)?;
        let user = self.users.insert(email, name, role, &hash).await?;

        info!(user_id = %user.id, role = %role, "Account registered");
        Ok(user)
    }

    /// Verifies credentials and issues a session.
    pub async fn sign_in(&self, email: &str, password: &str) -> AuthResult<Session> {
        let Some((user, hash)) = self.users.get_credentials(email).await? else {
            debug!("Sign-in for unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !Self::verify_password(password, &hash) {
            warn!(user_id = %user.id, "Sign-in with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let session = self.issue(user).await?;
        info!(user_id = %session.user.id, "Signed in");
        Ok(session)
    }

    /// Revokes the session behind `token`.
    ///
    /// Revoking an already revoked (or expired) session succeeds.
    pub async fn sign_out(&self, token: &str) -> AuthResult<()> {
        let claims = self.decode(token, false)?;

        let result = sqlx::query(
            "UPDATE auth_sessions SET revoked_at = ? WHERE id = ? AND revoked_at IS NULL",
        )
        .bind(Utc::now())
        .bind(&claims.jti)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            info!(user_id = %claims.sub, "Signed out");
        }
        Ok(())
    }

    /// Validates `token` and returns its session with a fresh user record.
    pub async fn get_session(&self, token: &str) -> AuthResult<Session> {
        let claims = self.decode(token, true)?;

        let revoked_at: Option<Option<DateTime<Utc>>> =
            sqlx::query_scalar("SELECT revoked_at FROM auth_sessions WHERE id = ?")
                .bind(&claims.jti)
                .fetch_optional(&self.pool)
                .await?;

        match revoked_at {
            None => return Err(AuthError::InvalidToken),
            Some(Some(_)) => return Err(AuthError::SessionRevoked),
            Some(None) => {}
        }

        let user = self
            .users
            .get_by_id(&claims.sub)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        Ok(Session {
            user,
            access_token: token.to_string(),
            expires_at: DateTime::from_timestamp(claims.exp, 0).ok_or(AuthError::InvalidToken)?,
        })
    }

    /// Hashes a password into a PHC string.
    pub fn hash_password(password: &str) -> AuthResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Hashing(e.to_string()))
    }

    /// Checks a password against a PHC string. Malformed hashes never match.
    pub fn verify_password(password: &str, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    // -------------------------------------------------------------------------
    // Tokens
    // -------------------------------------------------------------------------

    async fn issue(&self, user: User) -> AuthResult<Session> {
        let now = Utc::now();
        let expires_at = now + self.lifetime;
        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = self.encode(&claims)?;

        sqlx::query(
            "INSERT INTO auth_sessions (id, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&claims.jti)
        .bind(&user.id)
        .bind(now)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(Session {
            user,
            access_token: token,
            expires_at: DateTime::from_timestamp(claims.exp, 0).unwrap_or(expires_at),
        })
    }

    fn encode(&self, claims: &Claims) -> AuthResult<String> {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AuthError::Signing(e.to_string()))
    }

    fn decode(&self, token: &str, check_expiry: bool) -> AuthResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = check_expiry;

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::SessionExpired,
            _ => AuthError::InvalidToken,
        })
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn service() -> (Database, AuthService) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let auth = db.auth(AuthConfig {
            jwt_secret: "test-secret".to_string(),
            session_lifetime_secs: 3600,
        });
        (db, auth)
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = AuthService::hash_password("rahasia123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(AuthService::verify_password("rahasia123", &hash));
        assert!(!AuthService::verify_password("salah", &hash));
        assert!(!AuthService::verify_password("rahasia123", "not-a-hash"));
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
        assert_eq!(extract_bearer_token("Bearer  "), None);
    }

    #[tokio::test]
    async fn test_sign_in_and_session() {
        let (_db, auth) = service().await;
        auth.register("admin@barkas.id", "rahasia123", "Admin", Role::Admin)
            .await
            .unwrap();

        let session = auth.sign_in("ADMIN@barkas.id", "rahasia123").await.unwrap();
        assert_eq!(session.user.role, Role::Admin);
        assert!(session.expires_at > Utc::now());

        let restored = auth.get_session(&session.access_token).await.unwrap();
        assert_eq!(restored.user.id, session.user.id);
    }

    #[tokio::test]
    async fn test_rejections_are_indistinguishable() {
        let (_db, auth) = service().await;
        auth.register("kasir@barkas.id", "rahasia123", "Kasir", Role::Employee)
            .await
            .unwrap();

        let wrong_password = auth.sign_in("kasir@barkas.id", "salah-banget").await.unwrap_err();
        let unknown_user = auth.sign_in("siapa@barkas.id", "rahasia123").await.unwrap_err();

        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(unknown_user, AuthError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }

    #[tokio::test]
    async fn test_register_validates() {
        let (_db, auth) = service().await;
        let short = auth.register("a@barkas.id", "pendek", "A", Role::Admin).await;
        assert!(matches!(short, Err(AuthError::Validation(_))));

        let bad_email = auth.register("bukan-email", "rahasia123", "A", Role::Admin).await;
        assert!(matches!(bad_email, Err(AuthError::Validation(_))));
    }

    #[tokio::test]
    async fn test_sign_out_revokes_and_is_idempotent() {
        let (_db, auth) = service().await;
        auth.register("m@barkas.id", "rahasia123", "M", Role::Manager)
            .await
            .unwrap();
        let session = auth.sign_in("m@barkas.id", "rahasia123").await.unwrap();

        auth.sign_out(&session.access_token).await.unwrap();
        auth.sign_out(&session.access_token).await.unwrap();

        let err = auth.get_session(&session.access_token).await.unwrap_err();
        assert!(matches!(err, AuthError::SessionRevoked));
    }

    #[tokio::test]
    async fn test_expired_and_forged_tokens() {
        let (_db, auth) = service().await;
        let user = auth
            .register("e@barkas.id", "rahasia123", "E", Role::Employee)
            .await
            .unwrap();

        let past = Utc::now() - Duration::hours(2);
        let expired = auth
            .encode(&Claims {
                sub: user.id.clone(),
                email: user.email.clone(),
                role: user.role,
                iat: past.timestamp(),
                exp: (past + Duration::minutes(30)).timestamp(),
                jti: Uuid::new_v4().to_string(),
            })
            .unwrap();
        assert!(matches!(
            auth.get_session(&expired).await.unwrap_err(),
            AuthError::SessionExpired
        ));

        // valid signature but never issued
        let unissued = auth
            .encode(&Claims {
                sub: user.id,
                email: user.email,
                role: user.role,
                iat: Utc::now().timestamp(),
                exp: (Utc::now() + Duration::hours(1)).timestamp(),
                jti: Uuid::new_v4().to_string(),
            })
            .unwrap();
        assert!(matches!(
            auth.get_session(&unissued).await.unwrap_err(),
            AuthError::InvalidToken
        ));

        assert!(matches!(
            auth.get_session("garbage").await.unwrap_err(),
            AuthError::InvalidToken
        ));
    }
}
