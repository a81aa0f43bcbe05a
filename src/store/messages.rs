//! Contact-form message rows

use chrono::{DateTime, Utc};
use rusqlite::{params, Row};

use super::{parse_ts, Store};
use crate::models::{AppResult, ContactMessage};

fn row_to_message(row: &Row) -> rusqlite::Result<ContactMessage> {
    Ok(ContactMessage {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        message: row.get(3)?,
        received_at: parse_ts(4, row.get(4)?)?,
    })
}

impl Store {
    pub async fn create_contact_message(
        &self,
        name: String,
        email: String,
        message: String,
        received_at: DateTime<Utc>,
    ) -> AppResult<ContactMessage> {
        self.call(move |conn| {
            conn.execute(
                "INSERT INTO contact_messages (name, email, message, received_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![name, email, message, received_at.to_rfc3339()],
            )?;
            Ok(ContactMessage {
                id: conn.last_insert_rowid(),
                name,
                email,
                message,
                received_at,
            })
        })
        .await
    }

    /// Inbox view for staff, newest first
    pub async fn list_contact_messages(&self) -> AppResult<Vec<ContactMessage>> {
        self.call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, email, message, received_at
                 FROM contact_messages ORDER BY received_at DESC, id DESC",
            )?;
            let rows = stmt.query_map([], row_to_message)?;
            let mut messages = Vec::new();
            for message in rows {
                messages.push(message?);
            }
            Ok(messages)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_and_list() {
        let store = Store::open_in_memory().unwrap();
        store
            .create_contact_message(
                "Jordan".into(),
                "jordan@example.com".into(),
                "Do you run beginner sessions?".into(),
                Utc::now(),
            )
            .await
            .unwrap();

        let inbox = store.list_contact_messages().await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].name, "Jordan");
        assert!(inbox[0].message.contains("beginner"));
    }
}
