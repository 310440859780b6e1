//! SQLite schema for the shared crawl store

use rusqlite::Connection;

/// Creates the three collections and their indexes if absent
pub fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS hosts (
            id              INTEGER PRIMARY KEY,
            hostname        TEXT NOT NULL UNIQUE,
            status          TEXT,
            robots_txt      TEXT,
            last_fetched_at INTEGER,
            last_updated_at INTEGER
        );

        CREATE INDEX IF NOT EXISTS idx_hosts_status_fetched
            ON hosts(status, last_fetched_at);

        CREATE INDEX IF NOT EXISTS idx_hosts_updated
            ON hosts(last_updated_at);

        CREATE TABLE IF NOT EXISTS urls (
            id      INTEGER PRIMARY KEY,
            url     TEXT NOT NULL UNIQUE,
            host    TEXT NOT NULL,
            status  TEXT,
            content BLOB
        );

        CREATE INDEX IF NOT EXISTS idx_urls_host_status
            ON urls(host, status);

        CREATE INDEX IF NOT EXISTS idx_urls_status
            ON urls(status);

        CREATE TABLE IF NOT EXISTS microdata (
            digest    TEXT PRIMARY KEY,
            url       TEXT NOT NULL,
            item_type TEXT,
            document  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_microdata_type
            ON microdata(item_type);
        ",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_initializes_on_fresh_db() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert!(tables.contains(&"hosts".to_string()));
        assert!(tables.contains(&"urls".to_string()));
        assert!(tables.contains(&"microdata".to_string()));
    }

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        initialize_schema(&conn).unwrap();
    }
}
