use crate::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            name        TEXT NOT NULL,
            email       TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            role        TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS applications (
            id                      INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id                 INTEGER NOT NULL REFERENCES users(id),
            conference_name         TEXT NOT NULL,
            conference_acronym      TEXT NOT NULL DEFAULT '',
            core_ranking            TEXT NOT NULL DEFAULT '',
            start_date              TEXT NOT NULL,
            end_date                TEXT NOT NULL,
            paper_title             TEXT NOT NULL,
            author                  TEXT NOT NULL,
            grant_amount_requested  REAL NOT NULL CHECK (grant_amount_requested >= 0),
            justification           TEXT NOT NULL,
            pdf_url                 TEXT NOT NULL,
            status                  TEXT NOT NULL DEFAULT 'Submitted',
            created_at              TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_applications_status
            ON applications(status, id);

        CREATE TABLE IF NOT EXISTS comments (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            application_id  INTEGER NOT NULL REFERENCES applications(id),
            user_id         INTEGER NOT NULL REFERENCES users(id),
            parent_id       INTEGER REFERENCES comments(id),
            comment_text    TEXT NOT NULL,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_comments_application
            ON comments(application_id, created_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
