use migration::Migrator;
use sea_orm::{
    ConnectOptions, Database, DatabaseConnection,
    sqlx::sqlite::{SqliteJournalMode, SqliteSynchronous},
};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::error::AppResult;

/// Connection settings are applied to every pooled connection as it opens.
pub async fn connect_and_migrate(
    database_url: &str,
    max_connections: u32,
) -> AppResult<DatabaseConnection> {
    let mut opts = ConnectOptions::new(database_url.to_string());
    opts.max_connections(max_connections.max(1)).sqlx_logging(false).map_sqlx_sqlite_opts(|sqlite| {
        sqlite
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
    });

    let db = Database::connect(opts).await?;

    Migrator::up(&db, None).await?;
    info!(url = %database_url, "database ready");

    Ok(db)
}

/// Fresh in-memory catalog with the full schema applied.
#[cfg(test)]
pub async fn test_db() -> DatabaseConnection {
    connect_and_migrate("sqlite::memory:", 1).await.expect("in-memory database")
}

#[cfg(test)]
mod tests {
    use sea_orm::{ConnectionTrait, Statement, TransactionTrait};

    use super::*;

    #[tokio::test]
    async fn migrations_create_every_table_with_foreign_keys_on() {
        let db = test_db().await;

        let rows = db
            .query_all(Statement::from_string(
                db.get_database_backend(),
                "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name".to_string(),
            ))
            .await
            .unwrap();
        let tables: Vec<String> =
            rows.iter().map(|r| r.try_get::<String>("", "name").unwrap()).collect();

        for table in [
            "actor",
            "category",
            "genre",
            "movie",
            "movie_actors",
            "movie_directors",
            "movie_genres",
            "movie_shots",
            "rating",
            "rating_star",
            "reviews",
        ] {
            assert!(tables.iter().any(|t| t == table), "missing table {table}");
        }

        let fk = db
            .query_one(Statement::from_string(
                db.get_database_backend(),
                "PRAGMA foreign_keys".to_string(),
            ))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fk.try_get_by_index::<i32>(0).unwrap(), 1);
    }

    #[tokio::test]
    async fn foreign_keys_are_on_for_every_pooled_connection() {
        let path = std::env::temp_dir().join(format!("movies-fk-{}.db", std::process::id()));
        let url = format!("sqlite://{}?mode=rwc", path.display());
        let db = connect_and_migrate(&url, 3).await.unwrap();

        let mut open = Vec::new();
        for _ in 0..3 {
            let txn = db.begin().await.unwrap();
            let row = txn
                .query_one(Statement::from_string(
                    txn.get_database_backend(),
                    "PRAGMA foreign_keys".to_string(),
                ))
                .await
                .unwrap()
                .unwrap();
            assert_eq!(row.try_get_by_index::<i32>(0).unwrap(), 1);
            open.push(txn);
        }

        for txn in open {
            txn.rollback().await.unwrap();
        }
        db.close().await.unwrap();
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
        }
    }
}
