use crate::entities::{AnyStore, ChatMessage, NewMessage};
use std::future::Future;

/// Append-only log of chat turns.
///
/// There is deliberately no read side: the UI keeps its own session history.
pub trait MessageStore: Send + Sync + 'static {
    /// Write one record in its own transaction.
    fn append(
        &self,
        msg: NewMessage,
    ) -> impl Future<Output = Result<ChatMessage, sqlx::Error>> + Send;

    /// Write a user record and its reply in a single transaction, user first.
    /// Either both rows become visible or neither does.
    fn append_turn(
        &self,
        user: NewMessage,
        bot: NewMessage,
    ) -> impl Future<Output = Result<(ChatMessage, ChatMessage), sqlx::Error>> + Send;
}

const INSERT_MESSAGE: &str =
    "INSERT INTO messages (role, content, \"timestamp\") VALUES ($1, $2, $3) RETURNING id";

async fn insert<'c, E>(executor: E, msg: &NewMessage) -> Result<i64, sqlx::Error>
where
    E: sqlx::Executor<'c, Database = sqlx::Any>,
{
    sqlx::query_scalar::<_, i64>(INSERT_MESSAGE)
        .bind(msg.role.to_string())
        .bind(msg.content.clone())
        .bind(msg.timestamp.to_rfc3339())
        .fetch_one(executor)
        .await
}

impl MessageStore for AnyStore {
    async fn append(&self, msg: NewMessage) -> Result<ChatMessage, sqlx::Error> {
        // Dropping the transaction on error rolls it back.
        let mut tx = self.pool.begin().await?;
        let id = insert(&mut *tx, &msg).await?;
        tx.commit().await?;
        Ok(msg.into_stored(id))
    }

    async fn append_turn(
        &self,
        user: NewMessage,
        bot: NewMessage,
    ) -> Result<(ChatMessage, ChatMessage), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let user_id = insert(&mut *tx, &user).await?;
        let bot_id = insert(&mut *tx, &bot).await?;
        tx.commit().await?;
        Ok((user.into_stored(user_id), bot.into_stored(bot_id)))
    }
}

#[cfg(test)]
impl AnyStore {
    /// Every stored row in id order. Only tests read the log back.
    pub async fn all_messages(&self) -> Result<Vec<ChatMessage>, sqlx::Error> {
        let rows: Vec<(i64, String, String, String)> = sqlx::query_as(
            "SELECT id, role, content, \"timestamp\" FROM messages ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(id, role, content, timestamp)| ChatMessage {
                id,
                role: role.parse().expect("stored role is user or bot"),
                content,
                timestamp: timestamp.parse().expect("stored timestamp is RFC 3339"),
            })
            .collect())
    }

    /// Remove the messages table so every later write fails.
    pub async fn drop_messages(&self) -> Result<(), sqlx::Error> {
        sqlx::query("DROP TABLE messages").execute(&self.pool).await?;
        Ok(())
    }
}
