//! Database infrastructure using SeaORM

use sea_orm::{ConnectOptions, Database as SeaDatabase, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod entities;
pub mod migration;

/// Database wrapper for a photo library
#[derive(Debug, Clone)]
pub struct Database {
	/// SeaORM database connection
	conn: DatabaseConnection,
}

impl Database {
	/// Create the database at the specified path, or open it if it already exists
	pub async fn create(path: &Path) -> Result<Self, DbErr> {
		// Ensure parent directory exists
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent)
				.map_err(|e| DbErr::Custom(format!("Failed to create directory: {e}")))?;
		}

		let conn = connect(format!("sqlite://{}?mode=rwc", path.display())).await?;

		info!("Created database at {:?}", path);

		Ok(Self { conn })
	}

	/// Run migrations
	pub async fn migrate(&self) -> Result<(), DbErr> {
		migration::Migrator::up(&self.conn, None).await?;
		info!("Database migrations completed successfully");
		Ok(())
	}

	/// Get the database connection
	pub fn conn(&self) -> &DatabaseConnection {
		&self.conn
	}
}

async fn connect(db_url: String) -> Result<DatabaseConnection, DbErr> {
	let mut opt = ConnectOptions::new(db_url);
	opt.max_connections(10)
		.min_connections(1)
		.connect_timeout(Duration::from_secs(8))
		.idle_timeout(Duration::from_secs(8))
		.sqlx_logging(false); // We'll use tracing instead

	SeaDatabase::connect(opt).await
}
