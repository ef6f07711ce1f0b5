// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{Claims, User},
};

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_secret: String,
    token_ttl: Duration,
    pool: PgPool,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, jwt_secret: String, token_ttl: Duration, pool: PgPool) -> Self {
        Self { user_repo, jwt_secret, token_ttl, pool }
    }

    pub async fn register_user(&self, email: &str, password: &str) -> Result<String, AppError> {
        // bcrypt é CPU-bound: roda fora do executor assíncrono
        let password_clone = password.to_owned();
        let hashed_password = tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        let new_user = self
            .user_repo
            .create_user(&self.pool, &email.to_lowercase(), &hashed_password)
            .await?;

        tracing::info!(user_id = %new_user.id, "👤 Usuário registrado");
        self.create_token(new_user.id)
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<String, AppError> {
        let user = self
            .user_repo
            .find_by_email(&email.to_lowercase())
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        self.create_token(user.id)
    }

    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let claims = self.decode_token(token)?;

        self.user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    fn decode_token(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|_| AppError::InvalidToken)
    }

    fn create_token(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + self.token_ttl;

        let claims = Claims {
            sub: user_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    fn service(secret: &str, ttl: Duration) -> AuthService {
        // Pool preguiçosa: nenhum teste aqui chega a tocar no banco
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        AuthService::new(UserRepository::new(pool.clone()), secret.into(), ttl, pool)
    }

    #[tokio::test]
    async fn issued_token_carries_the_user_id() {
        let auth = service("segredo", Duration::hours(1));
        let user_id = Uuid::new_v4();

        let token = auth.create_token(user_id).unwrap();
        let claims = auth.decode_token(&token).unwrap();

        assert_eq!(claims.sub, user_id);
        assert!(claims.exp > claims.iat);
    }

    #[tokio::test]
    async fn token_signed_with_another_secret_is_rejected() {
        let issuer = service("segredo-a", Duration::hours(1));
        let verifier = service("segredo-b", Duration::hours(1));

        let token = issuer.create_token(Uuid::new_v4()).unwrap();

        assert!(matches!(verifier.decode_token(&token), Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        // Bem além da tolerância padrão de 60s do jsonwebtoken
        let auth = service("segredo", Duration::hours(-2));
        let token = auth.create_token(Uuid::new_v4()).unwrap();

        assert!(matches!(auth.decode_token(&token), Err(AppError::InvalidToken)));
    }
}
