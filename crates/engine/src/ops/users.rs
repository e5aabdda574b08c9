use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, TransactionTrait, prelude::*};

use crate::{EngineError, ResultEngine, User, users};

use super::{Engine, normalize_required_name, with_tx};

/// Registration input. The password arrives raw and is hashed here; only the
/// PHC hash string is stored.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

fn hash_password(password: &str) -> ResultEngine<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| EngineError::Hashing(err.to_string()))
}

fn verify_password(hash: &str, password: &str) -> ResultEngine<bool> {
    let parsed = PasswordHash::new(hash).map_err(|err| EngineError::Hashing(err.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

fn validate_password(password: &str) -> ResultEngine<()> {
    let len = password.chars().count();
    if !(8..=128).contains(&len) {
        return Err(EngineError::Validation(
            "password must be 8 to 128 characters".to_string(),
        ));
    }
    Ok(())
}

fn normalize_email(value: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    let well_formed = trimmed.chars().count() <= 100
        && trimmed
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !well_formed {
        return Err(EngineError::Validation("invalid email address".to_string()));
    }
    Ok(trimmed.to_lowercase())
}

impl Engine {
    /// Registers a new account.
    ///
    /// Username and email must both be free; collisions report which field
    /// clashed without leaking the other account's data.
    pub async fn register_user(&self, new: NewUser) -> ResultEngine<User> {
        let username = normalize_required_name(&new.username, "username", 50)?;
        if username.chars().count() < 3 {
            return Err(EngineError::Validation(
                "username must be at least 3 characters".to_string(),
            ));
        }
        let email = normalize_email(&new.email)?;
        validate_password(&new.password)?;
        let hashed_password = hash_password(&new.password)?;

        with_tx!(self, |db_tx| {
            let username_taken = users::Entity::find()
                .filter(users::Column::Username.eq(username.as_str()))
                .one(&db_tx)
                .await?
                .is_some();
            if username_taken {
                return Err(EngineError::ExistingKey(username));
            }

            let email_taken = users::Entity::find()
                .filter(users::Column::Email.eq(email.as_str()))
                .one(&db_tx)
                .await?
                .is_some();
            if email_taken {
                return Err(EngineError::ExistingKey(email));
            }

            let active = users::ActiveModel {
                username: ActiveValue::Set(username.clone()),
                email: ActiveValue::Set(email.clone()),
                hashed_password: ActiveValue::Set(hashed_password.clone()),
                is_active: ActiveValue::Set(true),
                created_at: ActiveValue::Set(Utc::now()),
                ..Default::default()
            };
            let model = active.insert(&db_tx).await?;
            Ok(User::from(model))
        })
    }

    /// Resolves a username/password pair to an account.
    ///
    /// Unknown user, wrong password and deactivated account all fail with the
    /// same [`EngineError::Credentials`].
    pub async fn authenticate(&self, username: &str, password: &str) -> ResultEngine<User> {
        let model = users::Entity::find()
            .filter(users::Column::Username.eq(username.trim()))
            .one(&self.database)
            .await?
            .ok_or(EngineError::Credentials)?;

        if !verify_password(&model.hashed_password, password)? {
            return Err(EngineError::Credentials);
        }
        if !model.is_active {
            return Err(EngineError::Credentials);
        }

        Ok(User::from(model))
    }

    pub async fn user_by_id(&self, id: i32) -> ResultEngine<User> {
        users::Entity::find_by_id(id)
            .one(&self.database)
            .await?
            .map(User::from)
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_round_trip() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(verify_password(&hash, "correct horse battery").unwrap());
        assert!(!verify_password(&hash, "wrong password").unwrap());
    }

    #[test]
    fn email_is_normalized() {
        assert_eq!(
            normalize_email(" Alice@Example.COM ").unwrap(),
            "alice@example.com"
        );
        assert!(normalize_email("not-an-email").is_err());
        assert!(normalize_email("@example.com").is_err());
    }
}
