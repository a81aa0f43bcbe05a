//! Account rows

use rusqlite::{params, OptionalExtension, Row};
use std::str::FromStr;

use super::Store;
use crate::models::{AppError, AppResult, Role, User};

fn row_to_user(row: &Row) -> rusqlite::Result<User> {
    let role_raw: String = row.get(4)?;
    let role = Role::from_str(&role_raw).map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Text,
            format!("unknown role '{}'", role_raw).into(),
        )
    })?;
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        role,
        verified: row.get::<_, i64>(5)? != 0,
        verification_code: row.get(6)?,
    })
}

const USER_COLS: &str = "id, name, email, password_hash, role, verified, verification_code";

impl Store {
    /// Insert a new account; fails with a conflict on duplicate email
    pub async fn create_user(
        &self,
        name: String,
        email: String,
        password_hash: String,
        role: Role,
        verification_code: Option<String>,
    ) -> AppResult<User> {
        self.call(move |conn| {
            let inserted = conn.execute(
                "INSERT INTO users (name, email, password_hash, role, verified, verification_code)
                 VALUES (?1, ?2, ?3, ?4, 0, ?5)",
                params![name, email, password_hash, role.as_str(), verification_code],
            );
            match inserted {
                Ok(_) => {}
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    return Err(AppError::duplicate_email(&email));
                }
                Err(e) => return Err(e.into()),
            }
            let id = conn.last_insert_rowid();
            Ok(User {
                id,
                name,
                email,
                password_hash,
                role,
                verified: false,
                verification_code,
            })
        })
        .await
    }

    pub async fn user_by_email(&self, email: String) -> AppResult<Option<User>> {
        self.call(move |conn| {
            let user = conn
                .query_row(
                    &format!("SELECT {} FROM users WHERE email = ?1", USER_COLS),
                    params![email],
                    row_to_user,
                )
                .optional()?;
            Ok(user)
        })
        .await
    }

    pub async fn user_by_id(&self, id: i64) -> AppResult<Option<User>> {
        self.call(move |conn| {
            let user = conn
                .query_row(
                    &format!("SELECT {} FROM users WHERE id = ?1", USER_COLS),
                    params![id],
                    row_to_user,
                )
                .optional()?;
            Ok(user)
        })
        .await
    }

    /// Flip the verified flag and discard the code
    pub async fn mark_verified(&self, user_id: i64) -> AppResult<()> {
        self.call(move |conn| {
            let changed = conn.execute(
                "UPDATE users SET verified = 1, verification_code = NULL WHERE id = ?1",
                params![user_id],
            )?;
            if changed == 0 {
                return Err(AppError::user_not_found());
            }
            Ok(())
        })
        .await
    }
}
