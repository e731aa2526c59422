use anyhow::Context as _;

use crate::database::Database;

use super::now_unix_secs;

fn user_id_i64(user_id: u64) -> anyhow::Result<i64> {
    i64::try_from(user_id).context("user_id out of i64 range")
}

fn count_u32(count: i32) -> anyhow::Result<u32> {
    u32::try_from(count).context("warning count out of u32 range")
}

pub async fn get_warning_count(db: &Database, user_id: u64, chat_id: i64) -> anyhow::Result<u32> {
    let count: Option<i32> =
        sqlx::query_scalar("SELECT count FROM bio_warnings WHERE chat_id = $1 AND user_id = $2")
            .bind(chat_id)
            .bind(user_id_i64(user_id)?)
            .fetch_optional(db.pool())
            .await?;

    count.map(count_u32).transpose().map(Option::unwrap_or_default)
}

pub async fn set_warning_count(
    db: &Database,
    user_id: u64,
    chat_id: i64,
    count: u32,
) -> anyhow::Result<()> {
    let count_i32 = i32::try_from(count).context("warning count out of i32 range")?;
    let updated_at = i64::try_from(now_unix_secs())?;

    sqlx::query(
        "INSERT INTO bio_warnings (chat_id, user_id, count, updated_at)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (chat_id, user_id) DO UPDATE SET
            count = EXCLUDED.count,
            updated_at = EXCLUDED.updated_at",
    )
    .bind(chat_id)
    .bind(user_id_i64(user_id)?)
    .bind(count_i32)
    .bind(updated_at)
    .execute(db.pool())
    .await?;

    Ok(())
}

/// Atomically add one warning and return the new count.
pub async fn increment_warning_count(
    db: &Database,
    user_id: u64,
    chat_id: i64,
) -> anyhow::Result<u32> {
    let updated_at = i64::try_from(now_unix_secs())?;

    let count: i32 = sqlx::query_scalar(
        "INSERT INTO bio_warnings (chat_id, user_id, count, updated_at)
         VALUES ($1, $2, 1, $3)
         ON CONFLICT (chat_id, user_id) DO UPDATE SET
            count = bio_warnings.count + 1,
            updated_at = EXCLUDED.updated_at
         RETURNING count",
    )
    .bind(chat_id)
    .bind(user_id_i64(user_id)?)
    .bind(updated_at)
    .fetch_one(db.pool())
    .await?;

    count_u32(count)
}

/// Reset to zero only if the counter still holds `expected`.
///
/// Of several concurrent violations crossing the threshold, exactly one sees
/// `true` here.
pub async fn compare_and_reset_warning_count(
    db: &Database,
    user_id: u64,
    chat_id: i64,
    expected: u32,
) -> anyhow::Result<bool> {
    let expected_i32 = i32::try_from(expected).context("expected count out of i32 range")?;
    let updated_at = i64::try_from(now_unix_secs())?;

    let updated = sqlx::query(
        "UPDATE bio_warnings SET count = 0, updated_at = $4
         WHERE chat_id = $1 AND user_id = $2 AND count = $3",
    )
    .bind(chat_id)
    .bind(user_id_i64(user_id)?)
    .bind(expected_i32)
    .bind(updated_at)
    .execute(db.pool())
    .await?
    .rows_affected();

    Ok(updated == 1)
}

/// Zero the counter; absent or already-zero rows are left untouched.
pub async fn reset_warning_count(db: &Database, user_id: u64, chat_id: i64) -> anyhow::Result<()> {
    let updated_at = i64::try_from(now_unix_secs())?;

    sqlx::query(
        "UPDATE bio_warnings SET count = 0, updated_at = $3
         WHERE chat_id = $1 AND user_id = $2 AND count <> 0",
    )
    .bind(chat_id)
    .bind(user_id_i64(user_id)?)
    .bind(updated_at)
    .execute(db.pool())
    .await?;

    Ok(())
}
