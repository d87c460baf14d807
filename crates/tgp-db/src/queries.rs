use crate::models::{ApplicationRow, CommentRow, NewApplication, UserRow};
use crate::{Database, Result, StoreError};
use rusqlite::{Connection, OptionalExtension};

impl Database {
    // -- Users --

    pub fn create_user(&self, name: &str, email: &str, password_hash: &str, role: &str) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (name, email, password, role) VALUES (?1, ?2, ?3, ?4)",
                (name, email, password_hash, role),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email = ?1", (email,)))
    }

    /// Login looks users up by email and role together; the same email may
    /// not hold two accounts, but the role gate is part of the login path.
    pub fn get_user_by_email_and_role(&self, email: &str, role: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email = ?1 AND role = ?2", (email, role)))
    }

    // -- Applications --

    pub fn insert_application(&self, app: &NewApplication) -> Result<ApplicationRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO applications (user_id, conference_name, conference_acronym,
                    core_ranking, start_date, end_date, paper_title, author,
                    grant_amount_requested, justification, pdf_url)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                rusqlite::params![
                    app.user_id,
                    app.conference_name,
                    app.conference_acronym,
                    app.core_ranking,
                    app.start_date,
                    app.end_date,
                    app.paper_title,
                    app.author,
                    app.grant_amount_requested,
                    app.justification,
                    app.pdf_url,
                ],
            )?;
            let id = conn.last_insert_rowid();
            query_application(conn, id)?.ok_or(StoreError::NotFound)
        })
    }

    /// Applications with the given status, newest first.
    pub fn list_applications_by_status(&self, status: &str) -> Result<Vec<ApplicationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{APPLICATION_SELECT} WHERE a.status = ?1 ORDER BY a.id DESC"
            ))?;
            let rows = stmt
                .query_map((status,), map_application)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_application(&self, id: i64) -> Result<Option<ApplicationRow>> {
        self.with_conn(|conn| query_application(conn, id))
    }

    /// Atomic single-row status update. Last writer wins; there is no
    /// version column and no terminal-state lock.
    pub fn update_application_status(&self, id: i64, status: &str) -> Result<ApplicationRow> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE applications SET status = ?1 WHERE id = ?2",
                rusqlite::params![status, id],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound);
            }
            query_application(conn, id)?.ok_or(StoreError::NotFound)
        })
    }

    // -- Comments --

    /// Insert a comment. Existence checks and the insert run in one
    /// transaction so a concurrent delete cannot slip between them.
    ///
    /// A parent must be a root comment on the same application: replies to
    /// replies are rejected rather than stored at arbitrary depth.
    pub fn add_comment(
        &self,
        application_id: i64,
        user_id: i64,
        parent_id: Option<i64>,
        text: &str,
    ) -> Result<CommentRow> {
        let text = text.trim();
        if text.is_empty() {
            return Err(StoreError::EmptyText);
        }

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let app_exists: Option<i64> = tx
                .query_row(
                    "SELECT id FROM applications WHERE id = ?1",
                    (application_id,),
                    |row| row.get(0),
                )
                .optional()?;
            if app_exists.is_none() {
                return Err(StoreError::NotFound);
            }

            if let Some(pid) = parent_id {
                match query_comment_link(&tx, pid)? {
                    None => return Err(StoreError::NotFound),
                    Some((app, _)) if app != application_id => return Err(StoreError::NotFound),
                    Some((_, Some(_))) => return Err(StoreError::ReplyDepth),
                    Some((_, None)) => {}
                }
            }

            tx.execute(
                "INSERT INTO comments (application_id, user_id, parent_id, comment_text)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![application_id, user_id, parent_id, text],
            )?;
            let id = tx.last_insert_rowid();
            let row = query_comment(&tx, id)?.ok_or(StoreError::NotFound)?;

            tx.commit()?;
            Ok(row)
        })
    }

    /// All comments for an application: roots in id order, each root's
    /// replies following it in creation order. The grouping key is the
    /// comment's own id for roots and the parent id for replies.
    pub fn list_comments(&self, application_id: i64) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{COMMENT_SELECT}
                 WHERE c.application_id = ?1
                 ORDER BY COALESCE(c.parent_id, c.id) ASC, c.created_at ASC, c.id ASC"
            ))?;
            let rows = stmt
                .query_map((application_id,), map_comment)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Author-only text edit; the creation timestamp is untouched.
    pub fn edit_comment(&self, id: i64, caller_id: i64, text: &str) -> Result<CommentRow> {
        let text = text.trim();
        if text.is_empty() {
            return Err(StoreError::EmptyText);
        }

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            check_comment_owner(&tx, id, caller_id)?;
            tx.execute(
                "UPDATE comments SET comment_text = ?1 WHERE id = ?2",
                rusqlite::params![text, id],
            )?;
            let row = query_comment(&tx, id)?.ok_or(StoreError::NotFound)?;

            tx.commit()?;
            Ok(row)
        })
    }

    /// Author-only delete of a comment and its direct replies (one level,
    /// not transitive). Returns the number of rows removed.
    pub fn delete_comment(&self, id: i64, caller_id: i64) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            check_comment_owner(&tx, id, caller_id)?;
            let replies = tx.execute("DELETE FROM comments WHERE parent_id = ?1", (id,))?;
            tx.execute("DELETE FROM comments WHERE id = ?1", (id,))?;

            tx.commit()?;
            Ok(replies + 1)
        })
    }

    pub fn count_comments(&self, application_id: i64) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM comments WHERE application_id = ?1",
                (application_id,),
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }
}

const APPLICATION_SELECT: &str = "SELECT a.id, a.user_id, u.name, a.conference_name,
    a.conference_acronym, a.core_ranking, a.start_date, a.end_date, a.paper_title,
    a.author, a.grant_amount_requested, a.justification, a.pdf_url, a.status, a.created_at
    FROM applications a LEFT JOIN users u ON a.user_id = u.id";

const COMMENT_SELECT: &str = "SELECT c.id, c.application_id, c.user_id, u.name,
    c.parent_id, c.comment_text, c.created_at
    FROM comments c LEFT JOIN users u ON c.user_id = u.id";

fn map_user(row: &rusqlite::Row) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        role: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn query_user<P: rusqlite::Params>(
    conn: &Connection,
    where_clause: &str,
    params: P,
) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, name, email, password, role, created_at FROM users WHERE {where_clause}"
    ))?;
    let row = stmt.query_row(params, map_user).optional()?;
    Ok(row)
}

fn map_application(row: &rusqlite::Row) -> rusqlite::Result<ApplicationRow> {
    Ok(ApplicationRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        applicant_name: row
            .get::<_, Option<String>>(2)?
            .unwrap_or_else(|| "unknown".to_string()),
        conference_name: row.get(3)?,
        conference_acronym: row.get(4)?,
        core_ranking: row.get(5)?,
        start_date: row.get(6)?,
        end_date: row.get(7)?,
        paper_title: row.get(8)?,
        author: row.get(9)?,
        grant_amount_requested: row.get(10)?,
        justification: row.get(11)?,
        pdf_url: row.get(12)?,
        status: row.get(13)?,
        created_at: row.get(14)?,
    })
}

fn map_comment(row: &rusqlite::Row) -> rusqlite::Result<CommentRow> {
    Ok(CommentRow {
        id: row.get(0)?,
        application_id: row.get(1)?,
        user_id: row.get(2)?,
        user_name: row
            .get::<_, Option<String>>(3)?
            .unwrap_or_else(|| "unknown".to_string()),
        parent_id: row.get(4)?,
        comment_text: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn query_application(conn: &Connection, id: i64) -> Result<Option<ApplicationRow>> {
    let mut stmt = conn.prepare(&format!("{APPLICATION_SELECT} WHERE a.id = ?1"))?;
    let row = stmt.query_row((id,), map_application).optional()?;
    Ok(row)
}

fn query_comment(conn: &Connection, id: i64) -> Result<Option<CommentRow>> {
    let mut stmt = conn.prepare(&format!("{COMMENT_SELECT} WHERE c.id = ?1"))?;
    let row = stmt.query_row((id,), map_comment).optional()?;
    Ok(row)
}

/// (application_id, parent_id) of a comment, for parent validation.
fn query_comment_link(conn: &Connection, id: i64) -> Result<Option<(i64, Option<i64>)>> {
    let row = conn
        .query_row(
            "SELECT application_id, parent_id FROM comments WHERE id = ?1",
            (id,),
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    Ok(row)
}

fn check_comment_owner(conn: &Connection, id: i64, caller_id: i64) -> Result<()> {
    let owner: Option<i64> = conn
        .query_row("SELECT user_id FROM comments WHERE id = ?1", (id,), |row| {
            row.get(0)
        })
        .optional()?;
    match owner {
        None => Err(StoreError::NotFound),
        Some(uid) if uid != caller_id => Err(StoreError::NotOwner),
        Some(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn seed_user(db: &Database, name: &str, email: &str, role: &str) -> i64 {
        db.create_user(name, email, "hash", role).unwrap()
    }

    fn sample_application(user_id: i64) -> NewApplication {
        NewApplication {
            user_id,
            conference_name: "ICSE".into(),
            conference_acronym: "ICSE".into(),
            core_ranking: "A*".into(),
            start_date: "2025-06-01".into(),
            end_date: "2025-06-05".into(),
            paper_title: "X".into(),
            author: "A. Bee".into(),
            grant_amount_requested: 500.0,
            justification: "travel".into(),
            pdf_url: "/files/doc.pdf".into(),
        }
    }

    #[test]
    fn insert_then_get_preserves_fields() {
        let db = db();
        let uid = seed_user(&db, "Ada", "ada@example.com", "Applicant");

        let created = db.insert_application(&sample_application(uid)).unwrap();
        let fetched = db.get_application(created.id).unwrap().unwrap();

        assert_eq!(fetched.status, "Submitted");
        assert_eq!(fetched.conference_name, "ICSE");
        assert_eq!(fetched.paper_title, "X");
        assert_eq!(fetched.author, "A. Bee");
        assert_eq!(fetched.grant_amount_requested, 500.0);
        assert_eq!(fetched.justification, "travel");
        assert_eq!(fetched.applicant_name, "Ada");
    }

    #[test]
    fn list_by_status_is_newest_first_and_repeatable() {
        let db = db();
        let uid = seed_user(&db, "Ada", "ada@example.com", "Applicant");

        let a = db.insert_application(&sample_application(uid)).unwrap();
        let b = db.insert_application(&sample_application(uid)).unwrap();
        let c = db.insert_application(&sample_application(uid)).unwrap();

        let first = db.list_applications_by_status("Submitted").unwrap();
        let second = db.list_applications_by_status("Submitted").unwrap();

        let ids: Vec<i64> = first.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![c.id, b.id, a.id]);
        assert_eq!(
            ids,
            second.iter().map(|r| r.id).collect::<Vec<_>>(),
            "re-query must return identical ordering"
        );
    }

    #[test]
    fn transition_updates_status() {
        let db = db();
        let uid = seed_user(&db, "Ada", "ada@example.com", "Applicant");
        let app = db.insert_application(&sample_application(uid)).unwrap();

        let updated = db.update_application_status(app.id, "Approved").unwrap();
        assert_eq!(updated.status, "Approved");
        assert_eq!(
            db.get_application(app.id).unwrap().unwrap().status,
            "Approved"
        );
    }

    #[test]
    fn transition_overwrites_terminal_status() {
        // No terminal lock: the portal allows re-transitioning, last writer
        // wins.
        let db = db();
        let uid = seed_user(&db, "Ada", "ada@example.com", "Applicant");
        let app = db.insert_application(&sample_application(uid)).unwrap();

        db.update_application_status(app.id, "Approved").unwrap();
        let updated = db.update_application_status(app.id, "Rejected").unwrap();
        assert_eq!(updated.status, "Rejected");
    }

    #[test]
    fn transition_on_unknown_id_is_not_found() {
        let db = db();
        let err = db.update_application_status(42, "Approved").unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
        assert!(db.list_applications_by_status("Approved").unwrap().is_empty());
    }

    #[test]
    fn comment_requires_existing_application() {
        let db = db();
        let uid = seed_user(&db, "Ada", "ada@example.com", "Applicant");
        let err = db.add_comment(99, uid, None, "hello").unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[test]
    fn empty_comment_text_is_rejected() {
        let db = db();
        let uid = seed_user(&db, "Ada", "ada@example.com", "Applicant");
        let app = db.insert_application(&sample_application(uid)).unwrap();

        assert!(matches!(
            db.add_comment(app.id, uid, None, "   ").unwrap_err(),
            StoreError::EmptyText
        ));
        assert_eq!(db.count_comments(app.id).unwrap(), 0);
    }

    #[test]
    fn reply_chain_and_listing_order() {
        let db = db();
        let uid = seed_user(&db, "Ada", "ada@example.com", "Applicant");
        let rev = seed_user(&db, "Bob", "bob@example.com", "AppComm");
        let app = db.insert_application(&sample_application(uid)).unwrap();

        let root = db.add_comment(app.id, rev, None, "Looks good").unwrap();
        let reply = db
            .add_comment(app.id, uid, Some(root.id), "Thanks")
            .unwrap();
        let second_root = db.add_comment(app.id, rev, None, "One question").unwrap();

        let rows = db.list_comments(app.id).unwrap();
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![root.id, reply.id, second_root.id]);
        assert_eq!(rows[1].parent_id, Some(root.id));
        assert_eq!(rows[0].user_name, "Bob");
    }

    #[test]
    fn reply_to_reply_is_rejected() {
        let db = db();
        let uid = seed_user(&db, "Ada", "ada@example.com", "Applicant");
        let app = db.insert_application(&sample_application(uid)).unwrap();

        let root = db.add_comment(app.id, uid, None, "root").unwrap();
        let reply = db.add_comment(app.id, uid, Some(root.id), "reply").unwrap();

        let err = db
            .add_comment(app.id, uid, Some(reply.id), "deeper")
            .unwrap_err();
        assert!(matches!(err, StoreError::ReplyDepth));
        assert_eq!(db.count_comments(app.id).unwrap(), 2);
    }

    #[test]
    fn parent_on_another_application_is_not_found() {
        let db = db();
        let uid = seed_user(&db, "Ada", "ada@example.com", "Applicant");
        let app_a = db.insert_application(&sample_application(uid)).unwrap();
        let app_b = db.insert_application(&sample_application(uid)).unwrap();

        let root_a = db.add_comment(app_a.id, uid, None, "on a").unwrap();
        let err = db
            .add_comment(app_b.id, uid, Some(root_a.id), "cross")
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[test]
    fn edit_by_non_author_leaves_row_unchanged() {
        let db = db();
        let uid = seed_user(&db, "Ada", "ada@example.com", "Applicant");
        let other = seed_user(&db, "Bob", "bob@example.com", "AppComm");
        let app = db.insert_application(&sample_application(uid)).unwrap();
        let comment = db.add_comment(app.id, uid, None, "original").unwrap();

        let err = db.edit_comment(comment.id, other, "tampered").unwrap_err();
        assert!(matches!(err, StoreError::NotOwner));

        let rows = db.list_comments(app.id).unwrap();
        assert_eq!(rows[0].comment_text, "original");
    }

    #[test]
    fn edit_by_author_changes_text_only() {
        let db = db();
        let uid = seed_user(&db, "Ada", "ada@example.com", "Applicant");
        let app = db.insert_application(&sample_application(uid)).unwrap();
        let comment = db.add_comment(app.id, uid, None, "original").unwrap();

        let edited = db.edit_comment(comment.id, uid, "revised").unwrap();
        assert_eq!(edited.comment_text, "revised");
        assert_eq!(edited.created_at, comment.created_at);
    }

    #[test]
    fn delete_cascades_one_level_only() {
        let db = db();
        let uid = seed_user(&db, "Ada", "ada@example.com", "Applicant");
        let app = db.insert_application(&sample_application(uid)).unwrap();

        let root = db.add_comment(app.id, uid, None, "root").unwrap();
        db.add_comment(app.id, uid, Some(root.id), "r1").unwrap();
        db.add_comment(app.id, uid, Some(root.id), "r2").unwrap();
        let lone = db.add_comment(app.id, uid, None, "lone").unwrap();

        assert_eq!(db.delete_comment(root.id, uid).unwrap(), 3);
        assert_eq!(db.count_comments(app.id).unwrap(), 1);

        assert_eq!(db.delete_comment(lone.id, uid).unwrap(), 1);
        assert_eq!(db.count_comments(app.id).unwrap(), 0);
    }

    #[test]
    fn delete_by_non_author_is_forbidden() {
        let db = db();
        let uid = seed_user(&db, "Ada", "ada@example.com", "Applicant");
        let other = seed_user(&db, "Bob", "bob@example.com", "Admin");
        let app = db.insert_application(&sample_application(uid)).unwrap();
        let comment = db.add_comment(app.id, uid, None, "mine").unwrap();

        let err = db.delete_comment(comment.id, other).unwrap_err();
        assert!(matches!(err, StoreError::NotOwner));
        assert_eq!(db.count_comments(app.id).unwrap(), 1);
    }

    #[test]
    fn login_lookup_requires_matching_role() {
        let db = db();
        seed_user(&db, "Ada", "ada@example.com", "Applicant");

        assert!(db
            .get_user_by_email_and_role("ada@example.com", "Applicant")
            .unwrap()
            .is_some());
        assert!(db
            .get_user_by_email_and_role("ada@example.com", "Admin")
            .unwrap()
            .is_none());
        assert!(db.get_user_by_email("ada@example.com").unwrap().is_some());
    }
}
