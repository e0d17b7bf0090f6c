//! Embedded schema migrations.

use anyhow::anyhow;
use diesel::connection::SimpleConnection;
use diesel::{Connection, SqliteConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

/// Embedded Diesel migrations bundled with this crate.
///
/// Applied by [`run_sqlite`] to bring the cache schema up to date.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Runs pending migrations on the SQLite database at the given path.
pub fn run_sqlite(url: &str) -> anyhow::Result<()> {
    let mut conn = SqliteConnection::establish(url)?;
    conn.batch_execute("PRAGMA journal_mode=WAL;")?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow!(e))?;

    Ok(())
}

#[cfg(test)]
mod test {
    use diesel::connection::SimpleConnection;
    use diesel::{Connection, SqliteConnection};

    #[test]
    fn migrations_apply_on_temp_file() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        let path = temp.path().to_string_lossy().to_string();

        super::run_sqlite(&path).expect("migration run");

        let mut conn = SqliteConnection::establish(&path).unwrap();

        conn.batch_execute(
            "INSERT INTO items (item_id, active, available_quantity, title, sku, \
             start_date, end_date, category_id, category_name) \
             VALUES (1, 'Active', 1, 't', 's', '2020-03-01 00:00:00', '2020-04-01 00:00:00', 7, 'c')",
        )
        .unwrap();
        conn.batch_execute("UPDATE sync_cursor SET requests_today = 3 WHERE id = 1")
            .unwrap();
    }
}
