use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

pub mod entities;
pub mod models;
pub mod query;
pub mod scoring;
pub mod stats;
pub mod types;

pub use sea_orm::{DbErr, TransactionTrait};

#[derive(Clone)]
pub struct DbService {
    pub conn: DatabaseConnection,
}

impl DbService {
    /// Connects to the given database URL and brings the schema up to date.
    pub async fn connect(database_url: &str) -> Result<DbService, DbErr> {
        let mut options = ConnectOptions::new(database_url.to_string());
        options.sqlx_logging(false);
        let conn = Database::connect(options).await?;
        db_migration::Migrator::up(&conn, None).await?;
        tracing::debug!("Database schema is up to date");
        Ok(DbService { conn })
    }
}
