//! Persistent storage of prefixes and linked profiles.

use std::fmt::Debug;

use async_trait::async_trait;
use serenity::GuildId;
use serenity::UserId;

use crate::error::UserError;
use crate::osu::Mode;
use crate::serenity;
use crate::KselonError;

/// Prefix used in DMs and in guilds that never set one.
pub const DEFAULT_PREFIX: &str = "!";

/// Longest prefix a guild can set, in characters.
pub const MAX_PREFIX_LEN: usize = 3;

/// The osu! account a discord user linked with `setprofile`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    pub mode: Mode,
}

/// Everything the bot remembers between restarts.
/// Every key has at most one row, setting a value replaces the old one.
#[async_trait]
pub trait Store: Debug + Send + Sync {
    async fn get_prefix(&self, guild: GuildId) -> Result<Option<String>, KselonError>;
    async fn set_prefix(&self, guild: GuildId, prefix: &str) -> Result<(), KselonError>;
    async fn delete_prefix(&self, guild: GuildId) -> Result<(), KselonError>;

    async fn get_profile(&self, user: UserId) -> Result<Option<Profile>, KselonError>;
    async fn set_profile(&self, user: UserId, profile: &Profile) -> Result<(), KselonError>;

    async fn get_lastfm(&self, user: UserId) -> Result<Option<String>, KselonError>;
    async fn set_lastfm(&self, user: UserId, username: &str) -> Result<(), KselonError>;

    /// Cheap query to check the connection.
    async fn ping(&self) -> Result<(), KselonError>;
    /// Drops the current connections and connects again.
    async fn reconnect(&self) -> Result<(), KselonError>;
}

/// The prefix to use for a message. DMs always use [DEFAULT_PREFIX].
/// A failing lookup falls back to [DEFAULT_PREFIX].
pub async fn prefix_for(store: &dyn Store, guild: Option<GuildId>) -> String {
    let Some(guild) = guild else {
        return DEFAULT_PREFIX.to_string();
    };

    match store.get_prefix(guild).await {
        Ok(Some(prefix)) => prefix,
        Ok(None) => DEFAULT_PREFIX.to_string(),
        Err(e) => {
            tracing::warn!("Could not read prefix of guild {guild}: {e}");
            DEFAULT_PREFIX.to_string()
        }
    }
}

/// Checks a prefix before it's stored.
pub fn validate_prefix(prefix: &str) -> Result<(), UserError> {
    if prefix.chars().count() > MAX_PREFIX_LEN {
        Err(UserError::PrefixTooLong)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::data::MemoryStore;

    #[tokio::test]
    async fn missing_prefix_is_the_default() {
        let store = MemoryStore::default();
        let guild = GuildId::new(1);

        assert_eq!(prefix_for(&store, Some(guild)).await, "!");

        store.set_prefix(guild, "k.").await.unwrap();
        assert_eq!(prefix_for(&store, Some(guild)).await, "k.");
        // DMs ignore whatever a guild set.
        assert_eq!(prefix_for(&store, None).await, "!");

        store.delete_prefix(guild).await.unwrap();
        assert_eq!(prefix_for(&store, Some(guild)).await, "!");
    }

    #[tokio::test]
    async fn failing_store_falls_back() {
        let store = MemoryStore::default();
        store.set_prefix(GuildId::new(1), "?").await.unwrap();
        store.set_failing(true);

        assert_eq!(prefix_for(&store, Some(GuildId::new(1))).await, "!");
    }

    #[test]
    fn prefixes_are_limited_by_characters() {
        assert!(validate_prefix("!!!").is_ok());
        assert!(validate_prefix("éé").is_ok());
        assert!(matches!(
            validate_prefix("????"),
            Err(UserError::PrefixTooLong)
        ));
    }

    #[tokio::test]
    async fn profiles_are_replaced() {
        let store = MemoryStore::default();
        let user = UserId::new(5);
        let first = Profile {
            name: "ano".to_string(),
            mode: Mode::RX_STD,
        };
        let second = Profile {
            name: "rieki".to_string(),
            mode: Mode::VN_STD,
        };

        store.set_profile(user, &first).await.unwrap();
        store.set_profile(user, &second).await.unwrap();

        assert_eq!(store.get_profile(user).await.unwrap(), Some(second));
        assert_eq!(store.get_profile(UserId::new(6)).await.unwrap(), None);
    }
}
