use anyhow::Context as _;

use crate::database::Database;

use super::now_unix_secs;

pub async fn record_user(db: &Database, user_id: u64) -> anyhow::Result<()> {
    let user_id_i64 = i64::try_from(user_id).context("user_id out of i64 range")?;
    let started_at = i64::try_from(now_unix_secs())?;

    sqlx::query(
        "INSERT INTO bot_users (user_id, started_at) VALUES ($1, $2)
         ON CONFLICT (user_id) DO UPDATE SET started_at = EXCLUDED.started_at",
    )
    .bind(user_id_i64)
    .bind(started_at)
    .execute(db.pool())
    .await?;

    Ok(())
}

pub async fn record_group(db: &Database, chat_id: i64) -> anyhow::Result<()> {
    let seen_at = i64::try_from(now_unix_secs())?;

    sqlx::query(
        "INSERT INTO bot_groups (chat_id, first_seen_at, last_seen_at) VALUES ($1, $2, $2)
         ON CONFLICT (chat_id) DO UPDATE SET last_seen_at = EXCLUDED.last_seen_at",
    )
    .bind(chat_id)
    .bind(seen_at)
    .execute(db.pool())
    .await?;

    Ok(())
}

pub async fn list_user_ids(db: &Database) -> anyhow::Result<Vec<u64>> {
    let rows: Vec<i64> = sqlx::query_scalar("SELECT user_id FROM bot_users ORDER BY user_id")
        .fetch_all(db.pool())
        .await?;

    rows.into_iter()
        .map(|id| u64::try_from(id).context("user_id row out of u64 range"))
        .collect()
}

pub async fn list_group_ids(db: &Database) -> anyhow::Result<Vec<i64>> {
    let rows: Vec<i64> = sqlx::query_scalar("SELECT chat_id FROM bot_groups ORDER BY chat_id")
        .fetch_all(db.pool())
        .await?;

    Ok(rows)
}
