use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use huddle_config::AuthConfig;
use rand::RngCore;
use serde::Serialize;
use sqlx::{Row, SqlitePool, Transaction};
use thiserror::Error;
use tracing::debug;

#[derive(Clone)]
pub struct Authenticator {
    pool: SqlitePool,
    session_ttl: Duration,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("user already exists")]
    UserExists,
    #[error("invalid credential")]
    InvalidCredential,
    #[error("unknown user")]
    UnknownUser,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("password hashing failed: {0}")]
    PasswordHash(#[from] argon2::password_hash::Error),
}

/// Process-wide role of a user, as recorded by the membership authority.
/// Distinct from per-team roles, which live on the membership rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    User,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::User => "user",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "admin" => Some(UserRole::Admin),
            "user" => Some(UserRole::User),
            _ => None,
        }
    }
}

/// The identity bound to a connection after credential validation.
/// Constructed once per bind; never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct Identity {
    #[serde(skip_serializing)]
    pub user_id: i64,
    pub public_id: String,
    pub role: UserRole,
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    #[serde(skip_serializing)]
    pub id: i64,
    pub public_id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    #[serde(skip_serializing)]
    pub is_admin: bool,
}

#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
}

/// Resolve the effective role from a (possibly absent or stale) claim and
/// the authoritative flag. The authoritative side always wins; the claim is
/// only kept when it already agrees.
pub fn reconcile(claimed: Option<UserRole>, authoritative: UserRole) -> UserRole {
    match claimed {
        Some(claim) if claim == authoritative => claim,
        _ => authoritative,
    }
}

impl Authenticator {
    pub fn new(pool: SqlitePool, config: AuthConfig) -> Self {
        let session_ttl = Duration::seconds(config.session_ttl_seconds as i64);
        Self { pool, session_ttl }
    }

    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    pub async fn register_with_password(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<User, AuthError> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query("SELECT id FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&mut *tx)
            .await?;

        if existing.is_some() {
            return Err(AuthError::UserExists);
        }

        let now = Utc::now();
        let password_hash = self.hash_password(password)?;

        let user = self
            .insert_user(&mut tx, Some(email.to_owned()), display_name.map(str::to_owned))
            .await?;

        sqlx::query(
            "INSERT INTO user_identities (user_id, provider, provider_uid, secret, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(user.id)
        .bind("password")
        .bind(email)
        .bind(password_hash)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(user)
    }

    pub async fn login_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        let identity = sqlx::query(
            "SELECT user_id, secret FROM user_identities WHERE provider = 'password' AND provider_uid = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = identity else {
            return Err(AuthError::InvalidCredential);
        };

        let secret: String = row.try_get("secret")?;
        let stored_hash = PasswordHash::new(&secret)?;
        Argon2::default()
            .verify_password(password.as_bytes(), &stored_hash)
            .map_err(|_| AuthError::InvalidCredential)?;

        let user_id: i64 = row.try_get("user_id")?;
        let user = self.fetch_user(user_id).await?;

        self.issue_session(&user).await
    }

    /// Validate a session token and return the reconciled identity.
    ///
    /// The role claim captured at login is compared against the current
    /// `users.is_admin` flag; callers always receive the reconciled role,
    /// never the raw claim.
    pub async fn bind_identity(&self, token: &str) -> Result<Identity, AuthError> {
        let row = sqlx::query("SELECT user_id, role_claim, expires_at FROM sessions WHERE token = ?")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Err(AuthError::InvalidCredential);
        };

        let user_id: i64 = row.try_get("user_id")?;
        let expires_at: String = row.try_get("expires_at")?;
        let role_claim: Option<String> = row.try_get("role_claim")?;

        let expires_at = DateTime::parse_from_rfc3339(&expires_at)
            .map_err(|_| AuthError::InvalidCredential)?
            .with_timezone(&Utc);

        if expires_at <= Utc::now() {
            sqlx::query("DELETE FROM sessions WHERE token = ?")
                .bind(token)
                .execute(&self.pool)
                .await?;
            return Err(AuthError::InvalidCredential);
        }

        let user = match self.fetch_user(user_id).await {
            Ok(user) => user,
            Err(AuthError::Database(sqlx::Error::RowNotFound)) => {
                return Err(AuthError::UnknownUser)
            }
            Err(err) => return Err(err),
        };

        let authoritative = if user.is_admin {
            UserRole::Admin
        } else {
            UserRole::User
        };
        let claimed = role_claim.as_deref().and_then(UserRole::parse);
        let role = reconcile(claimed, authoritative);

        if claimed != Some(role) {
            debug!(user = %user.public_id, ?claimed, effective = role.as_str(), "reconciled stale role claim");
        }

        Ok(Identity {
            user_id: user.id,
            public_id: user.public_id,
            role,
        })
    }

    pub async fn user_profile(&self, user_id: i64) -> Result<User, AuthError> {
        match self.fetch_user(user_id).await {
            Err(AuthError::Database(sqlx::Error::RowNotFound)) => Err(AuthError::UnknownUser),
            other => other,
        }
    }

    pub async fn find_user_by_public_id(&self, public_id: &str) -> Result<Option<User>, AuthError> {
        let row = sqlx::query(
            "SELECT id, public_id, email, display_name, is_admin FROM users WHERE public_id = ?",
        )
        .bind(public_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(user_from_row).transpose()
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let row = sqlx::query(
            "SELECT id, public_id, email, display_name, is_admin FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(user_from_row).transpose()
    }

    async fn insert_user(
        &self,
        tx: &mut Transaction<'_, sqlx::Sqlite>,
        email: Option<String>,
        display_name: Option<String>,
    ) -> Result<User, AuthError> {
        let now = Utc::now().to_rfc3339();
        let public_id = new_public_id();

        sqlx::query(
            "INSERT INTO users (public_id, email, display_name, is_admin, created_at, updated_at) VALUES (?, ?, ?, 0, ?, ?)",
        )
        .bind(&public_id)
        .bind(email.as_deref())
        .bind(display_name.as_deref())
        .bind(&now)
        .bind(&now)
        .execute(&mut **tx)
        .await?;

        let row = sqlx::query("SELECT id FROM users WHERE public_id = ?")
            .bind(&public_id)
            .fetch_one(&mut **tx)
            .await?;

        Ok(User {
            id: row.try_get("id")?,
            public_id,
            email,
            display_name,
            is_admin: false,
        })
    }

    async fn fetch_user(&self, id: i64) -> Result<User, AuthError> {
        let row = sqlx::query(
            "SELECT id, public_id, email, display_name, is_admin FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        user_from_row(row)
    }

    async fn issue_session(&self, user: &User) -> Result<AuthSession, AuthError> {
        let token = generate_session_token();
        let now = Utc::now();
        let expires_at = now + self.session_ttl;
        let role_claim = if user.is_admin {
            UserRole::Admin
        } else {
            UserRole::User
        };

        sqlx::query(
            "INSERT INTO sessions (user_id, token, role_claim, created_at, expires_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user.id)
        .bind(&token)
        .bind(role_claim.as_str())
        .bind(now.to_rfc3339())
        .bind(expires_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(AuthSession {
            token,
            user_id: user.id,
            expires_at,
        })
    }

    fn hash_password(&self, password: &str) -> Result<String, argon2::password_hash::Error> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
        Ok(hash.to_string())
    }
}

fn user_from_row(row: sqlx::sqlite::SqliteRow) -> Result<User, AuthError> {
    let is_admin: i64 = row.try_get("is_admin")?;
    Ok(User {
        id: row.try_get("id")?,
        public_id: row.try_get("public_id")?,
        email: row.try_get("email")?,
        display_name: row.try_get("display_name")?,
        is_admin: is_admin != 0,
    })
}

fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn new_public_id() -> String {
    cuid2::create_id()
}
