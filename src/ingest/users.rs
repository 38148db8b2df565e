use lazy_static::lazy_static;
use regex::Regex;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::auth::{claims::Role, password::hash_password};

/// One validated row from the users CSV.
#[derive(Debug)]
struct UserRecord<'a> {
    email: &'a str,
    password: &'a str,
    role: Role,
}

/// Column positions discovered from the header line, so the file may order
/// its columns freely.
#[derive(Debug)]
struct Columns {
    email: usize,
    password: usize,
    role: usize,
}

impl Columns {
    fn locate(header: &str) -> Option<Columns> {
        let names: Vec<&str> = header.split(',').map(str::trim).collect();
        let position = |name: &str| names.iter().position(|n| *n == name);
        Some(Columns {
            email: position("email")?,
            password: position("password")?,
            role: position("role")?,
        })
    }
}

/// Seeds the users table from a CSV of email, plaintext password and role.
/// Passwords are hashed before they touch the database. Rows that fail
/// validation are skipped with a warning, and emails already present are
/// left untouched.
pub async fn import(db: &PgPool, path: &str) {
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) => {
            warn!(path, error = %e, "users csv not readable, skipping import");
            return;
        }
    };

    let mut lines = contents.lines();
    let Some(header) = lines.next() else {
        warn!(path, "users csv is empty");
        return;
    };
    let Some(columns) = Columns::locate(header) else {
        warn!(path, header, "users csv is missing required columns");
        return;
    };

    let mut imported = 0u64;
    let mut skipped = 0u64;
    for (index, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let record = match parse_row(line, &columns) {
            Ok(record) => record,
            Err(e) => {
                warn!(line = index + 2, error = %e, "skipping user row");
                skipped += 1;
                continue;
            }
        };

        match insert(db, &record).await {
            Ok(true) => imported += 1,
            Ok(false) => skipped += 1, // email already present
            Err(e) => {
                warn!(line = index + 2, email = record.email, error = %e, "failed to insert user");
                skipped += 1;
            }
        }
    }

    info!(path, imported, skipped, "users import finished");
}

fn parse_row<'a>(line: &'a str, columns: &Columns) -> anyhow::Result<UserRecord<'a>> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    let field = |index: usize| {
        fields
            .get(index)
            .copied()
            .ok_or_else(|| anyhow::anyhow!("row has {} fields, need {}", fields.len(), index + 1))
    };

    let email = field(columns.email)?;
    let password = field(columns.password)?;
    let role = field(columns.role)?;

    anyhow::ensure!(is_valid_email(email), "invalid email {email:?}");
    anyhow::ensure!(!password.is_empty(), "empty password for {email}");
    let role = Role::parse(role).ok_or_else(|| anyhow::anyhow!("unknown role {role:?}"))?;

    Ok(UserRecord {
        email,
        password,
        role,
    })
}

async fn insert(db: &PgPool, record: &UserRecord<'_>) -> anyhow::Result<bool> {
    let password_hash = hash_password(record.password)?;
    let result = sqlx::query(
        r#"
        INSERT INTO users (email, password_hash, role)
        VALUES ($1, $2, $3)
        ON CONFLICT (email) DO NOTHING
        "#,
    )
    .bind(record.email)
    .bind(&password_hash)
    .bind(record.role.as_str())
    .execute(db)
    .await?;

    Ok(result.rows_affected() == 1)
}

fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}
