use sqlx::{FromRow, PgPool};

/// User record as stored in the credential table. The role stays a plain
/// string here; it is parsed into [`super::claims::Role`] at login time so a
/// bad row surfaces as a server error instead of poisoning every query.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub password_hash: String,
    pub role: String,
}

impl User {
    /// Exact, case-sensitive lookup by email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, role
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;

        Ok(user)
    }
}
