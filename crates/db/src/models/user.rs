use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::entities::user;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found")]
    UserNotFound,
    #[error("Username is already taken")]
    UsernameTaken,
    #[error("Email is already registered")]
    EmailTaken,
    #[error(transparent)]
    Database(#[from] DbErr),
}

/// Public view of a user. The password hash never leaves the model layer
/// except through `UserCredentials`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Login lookup result: the user plus the stored hash to verify against.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    /// Already hashed by the caller; this layer never sees the plaintext.
    pub password_hash: String,
}

impl User {
    fn from_model(model: user::Model) -> Self {
        Self {
            id: model.uuid,
            username: model.username,
            email: model.email,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateUser,
        user_id: Uuid,
    ) -> Result<Self, UserError> {
        let username_taken = user::Entity::find()
            .filter(user::Column::Username.eq(&data.username))
            .one(db)
            .await?
            .is_some();
        if username_taken {
            return Err(UserError::UsernameTaken);
        }

        let email_taken = user::Entity::find()
            .filter(user::Column::Email.eq(&data.email))
            .one(db)
            .await?
            .is_some();
        if email_taken {
            return Err(UserError::EmailTaken);
        }

        let now = Utc::now();
        let active = user::ActiveModel {
            uuid: Set(user_id),
            username: Set(data.username.clone()),
            email: Set(data.email.clone()),
            password_hash: Set(data.password_hash.clone()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active.insert(db).await?;
        Ok(Self::from_model(model))
    }

    pub async fn find_by_id<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
    ) -> Result<Option<Self>, DbErr> {
        let record = user::Entity::find()
            .filter(user::Column::Uuid.eq(id))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    pub async fn find_credentials_by_username<C: ConnectionTrait>(
        db: &C,
        username: &str,
    ) -> Result<Option<UserCredentials>, DbErr> {
        let record = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(db)
            .await?;

        Ok(record.map(|model| {
            let password_hash = model.password_hash.clone();
            UserCredentials {
                user: Self::from_model(model),
                password_hash,
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    use super::*;

    async fn setup_db() -> sea_orm::DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    fn create_request(username: &str, email: &str) -> CreateUser {
        CreateUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$stub".to_string(),
        }
    }

    #[tokio::test]
    async fn create_and_lookup() {
        let db = setup_db().await;
        let user_id = Uuid::new_v4();

        let created = User::create(&db, &create_request("alice", "alice@example.com"), user_id)
            .await
            .unwrap();
        assert_eq!(created.id, user_id);
        assert_eq!(created.username, "alice");

        let found = User::find_by_id(&db, user_id).await.unwrap().unwrap();
        assert_eq!(found.username, "alice");
        assert_eq!(found.email, "alice@example.com");

        let credentials = User::find_credentials_by_username(&db, "alice")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(credentials.user.id, user_id);
        assert_eq!(credentials.password_hash, "$argon2id$stub");
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let db = setup_db().await;
        User::create(
            &db,
            &create_request("alice", "alice@example.com"),
            Uuid::new_v4(),
        )
        .await
        .unwrap();

        let result = User::create(
            &db,
            &create_request("alice", "other@example.com"),
            Uuid::new_v4(),
        )
        .await;
        assert!(matches!(result, Err(UserError::UsernameTaken)));
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let db = setup_db().await;
        User::create(
            &db,
            &create_request("alice", "alice@example.com"),
            Uuid::new_v4(),
        )
        .await
        .unwrap();

        let result = User::create(
            &db,
            &create_request("bob", "alice@example.com"),
            Uuid::new_v4(),
        )
        .await;
        assert!(matches!(result, Err(UserError::EmailTaken)));
    }

    #[tokio::test]
    async fn unknown_username_yields_none() {
        let db = setup_db().await;
        assert!(
            User::find_credentials_by_username(&db, "nobody")
                .await
                .unwrap()
                .is_none()
        );
    }
}
