use std::sync::Arc;

use chrono::Duration;
use sea_orm::DatabaseConnection;
use utils_jwt::JwtService;

pub mod error;
pub mod http;
pub mod middleware;
pub mod routes;

#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
    jwt: Arc<JwtService>,
    token_ttl: Duration,
}

impl AppState {
    pub fn new(db: DatabaseConnection, jwt: JwtService, token_ttl: Duration) -> Self {
        Self {
            db,
            jwt: Arc::new(jwt),
            token_ttl,
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }

    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }
}
