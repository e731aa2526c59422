use teloxide::types::{ChatId, UserId};
use tracing::warn;

use bioguard_core::ChatPlatform;

/// Administrator or owner of `chat_id` at the time of asking.
///
/// A failed lookup counts as "not an admin".
pub async fn is_group_admin(platform: &dyn ChatPlatform, chat_id: ChatId, user_id: UserId) -> bool {
    match platform.is_admin(chat_id, user_id).await {
        Ok(is_admin) => is_admin,
        Err(err) => {
            warn!(chat_id = chat_id.0, user_id = user_id.0, %err, "admin lookup failed");
            false
        }
    }
}

pub fn is_owner(owner_id: Option<UserId>, user_id: UserId) -> bool {
    owner_id == Some(user_id)
}

#[cfg(test)]
mod tests {
    use teloxide::types::{ChatId, UserId};

    use super::{is_group_admin, is_owner};
    use crate::testing::FakePlatform;
    use bioguard_core::PlatformError;

    #[tokio::test]
    async fn lookup_failure_is_not_admin() {
        let platform = FakePlatform::default();
        platform.make_admin(ChatId(-1), UserId(2));
        assert!(is_group_admin(&platform, ChatId(-1), UserId(2)).await);
        assert!(!is_group_admin(&platform, ChatId(-1), UserId(3)).await);

        platform.fail("is_admin", PlatformError::Network("timeout".into()));
        assert!(!is_group_admin(&platform, ChatId(-1), UserId(2)).await);
    }

    #[test]
    fn owner_must_be_configured() {
        assert!(is_owner(Some(UserId(1)), UserId(1)));
        assert!(!is_owner(Some(UserId(1)), UserId(2)));
        assert!(!is_owner(None, UserId(1)));
    }
}
