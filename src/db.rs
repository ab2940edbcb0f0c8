use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::extract::ExtractionResult;
use crate::{Error, Result};

pub const UNKNOWN_ROLE: &str = "Unknown role";
pub const UNKNOWN_COMPANY: &str = "Unknown company";

pub fn connect(path: &str) -> Result<Connection> {
    if let Some(dir) = Path::new(path).parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS applications (
            id             INTEGER PRIMARY KEY,
            job_title      TEXT NOT NULL,
            company        TEXT NOT NULL,
            location       TEXT NOT NULL DEFAULT '',
            url            TEXT NOT NULL DEFAULT '',
            status         TEXT NOT NULL DEFAULT 'pending'
                           CHECK(status IN ('pending','interview','rejected')),
            notes          TEXT NOT NULL DEFAULT '',
            likely_applied BOOLEAN NOT NULL DEFAULT 0,
            source         TEXT NOT NULL,
            confidence     REAL NOT NULL,
            follow_up_at   TEXT,
            created_at     TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_applications_status ON applications(status);
        ",
    )?;
    Ok(())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Interview,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Interview => "interview",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for ApplicationStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(ApplicationStatus::Pending),
            "interview" => Ok(ApplicationStatus::Interview),
            "rejected" => Ok(ApplicationStatus::Rejected),
            other => Err(Error::InvalidStatus(other.to_string())),
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied fields stored alongside an extraction result.
#[derive(Debug, Clone, Default)]
pub struct NewApplication {
    pub url: String,
    pub status: ApplicationStatus,
    pub notes: String,
    pub follow_up_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct ApplicationRow {
    pub id: i64,
    pub job_title: String,
    pub company: String,
    pub location: String,
    pub url: String,
    pub status: String,
    pub notes: String,
    pub likely_applied: bool,
    pub source: String,
    pub confidence: f64,
    pub follow_up_at: Option<String>,
    pub created_at: String,
}

pub fn insert_application(
    conn: &Connection,
    result: &ExtractionResult,
    app: &NewApplication,
) -> Result<i64> {
    let job_title = if result.job_title.is_empty() {
        UNKNOWN_ROLE
    } else {
        result.job_title.as_str()
    };
    let company = if result.company.is_empty() {
        UNKNOWN_COMPANY
    } else {
        result.company.as_str()
    };
    conn.execute(
        "INSERT INTO applications (
            job_title, company, location, url, status, notes,
            likely_applied, source, confidence, follow_up_at, created_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            job_title,
            company,
            result.location,
            app.url,
            app.status.as_str(),
            app.notes,
            result.likely_applied,
            result.source.as_str(),
            result.confidence,
            app.follow_up_at.map(|t| t.to_rfc3339()),
            Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_applications(
    conn: &Connection,
    status: Option<ApplicationStatus>,
    limit: usize,
) -> Result<Vec<ApplicationRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, job_title, company, location, url, status, notes,
                likely_applied, source, confidence, follow_up_at, created_at
         FROM applications
         WHERE (?1 IS NULL OR status = ?1)
         ORDER BY created_at DESC, id DESC
         LIMIT ?2",
    )?;
    let rows = stmt
        .query_map(
            params![status.map(|s| s.as_str()), limit as i64],
            |row| {
                Ok(ApplicationRow {
                    id: row.get(0)?,
                    job_title: row.get(1)?,
                    company: row.get(2)?,
                    location: row.get(3)?,
                    url: row.get(4)?,
                    status: row.get(5)?,
                    notes: row.get(6)?,
                    likely_applied: row.get(7)?,
                    source: row.get(8)?,
                    confidence: row.get(9)?,
                    follow_up_at: row.get(10)?,
                    created_at: row.get(11)?,
                })
            },
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Returns false when no application has that id.
pub fn update_status(conn: &Connection, id: i64, status: ApplicationStatus) -> Result<bool> {
    let n = conn.execute(
        "UPDATE applications SET status = ?1 WHERE id = ?2",
        params![status.as_str(), id],
    )?;
    Ok(n > 0)
}

pub fn delete_application(conn: &Connection, id: i64) -> Result<bool> {
    let n = conn.execute("DELETE FROM applications WHERE id = ?1", params![id])?;
    Ok(n > 0)
}

pub fn status_of(conn: &Connection, id: i64) -> Result<Option<String>> {
    let status = conn
        .query_row(
            "SELECT status FROM applications WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(status)
}
