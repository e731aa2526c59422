use crate::cache::{SETTINGS_CACHE_TTL, group_settings_key, invalidate_group_settings};
use crate::database::Database;
use crate::model::GroupSettings;

use super::now_unix_secs;

#[derive(sqlx::FromRow)]
struct GroupSettingsRow {
    escalation_mode: String,
    warning_threshold: i32,
    punishment_kind: String,
}

/// Stored settings for a group, `None` when the group never saved any.
pub async fn get_group_settings(
    db: &Database,
    chat_id: i64,
) -> anyhow::Result<Option<GroupSettings>> {
    let cache_key = group_settings_key(db.settings_cache(), chat_id);
    db.settings_cache()
        .get_or_load_json(&cache_key, SETTINGS_CACHE_TTL, || async {
            let row: Option<GroupSettingsRow> = sqlx::query_as(
                "SELECT escalation_mode, warning_threshold, punishment_kind
                 FROM group_settings WHERE chat_id = $1",
            )
            .bind(chat_id)
            .fetch_optional(db.pool())
            .await?;

            Ok(row.map(|row| {
                GroupSettings::from_columns(
                    &row.escalation_mode,
                    row.warning_threshold,
                    &row.punishment_kind,
                )
            }))
        })
        .await
}

/// Upsert every settings field in one statement.
pub async fn put_group_settings(
    db: &Database,
    chat_id: i64,
    settings: &GroupSettings,
) -> anyhow::Result<()> {
    settings.validate()?;

    let threshold = i32::try_from(settings.warning_threshold)?;
    let updated_at = i64::try_from(now_unix_secs())?;

    sqlx::query(
        "INSERT INTO group_settings (chat_id, escalation_mode, warning_threshold, punishment_kind, updated_at)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (chat_id) DO UPDATE SET
            escalation_mode = EXCLUDED.escalation_mode,
            warning_threshold = EXCLUDED.warning_threshold,
            punishment_kind = EXCLUDED.punishment_kind,
            updated_at = EXCLUDED.updated_at",
    )
    .bind(chat_id)
    .bind(settings.escalation_mode.as_str())
    .bind(threshold)
    .bind(settings.punishment_kind.as_str())
    .bind(updated_at)
    .execute(db.pool())
    .await?;

    invalidate_group_settings(db.settings_cache(), chat_id).await?;

    Ok(())
}

/// Insert the default row unless one exists; returns the effective settings.
pub async fn ensure_group_settings(db: &Database, chat_id: i64) -> anyhow::Result<GroupSettings> {
    let defaults = GroupSettings::default();
    let updated_at = i64::try_from(now_unix_secs())?;

    let inserted = sqlx::query(
        "INSERT INTO group_settings (chat_id, escalation_mode, warning_threshold, punishment_kind, updated_at)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (chat_id) DO NOTHING",
    )
    .bind(chat_id)
    .bind(defaults.escalation_mode.as_str())
    .bind(i32::try_from(defaults.warning_threshold)?)
    .bind(defaults.punishment_kind.as_str())
    .bind(updated_at)
    .execute(db.pool())
    .await?
    .rows_affected();

    if inserted > 0 {
        invalidate_group_settings(db.settings_cache(), chat_id).await?;
        return Ok(defaults);
    }

    Ok(get_group_settings(db, chat_id).await?.unwrap_or(defaults))
}
