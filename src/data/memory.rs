//! In-memory [Store] for tests.

use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Mutex;

use async_trait::async_trait;
use serenity::GuildId;
use serenity::UserId;

use super::store::Profile;
use super::store::Store;
use crate::serenity;
use crate::KselonError;

#[derive(Debug, Default)]
struct Tables {
    guilds: HashMap<GuildId, String>,
    users: HashMap<UserId, Profile>,
    lastfm: HashMap<UserId, String>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    /// While set, every call fails like a lost connection.
    failing: AtomicBool,
    reconnects: AtomicUsize,
}

impl MemoryStore {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn reconnects(&self) -> usize {
        self.reconnects.load(Ordering::SeqCst)
    }

    fn tables(&self) -> Result<std::sync::MutexGuard<'_, Tables>, KselonError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(sqlx::Error::PoolTimedOut.into());
        }
        Ok(self.tables.lock().unwrap())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_prefix(&self, guild: GuildId) -> Result<Option<String>, KselonError> {
        Ok(self.tables()?.guilds.get(&guild).cloned())
    }

    async fn set_prefix(&self, guild: GuildId, prefix: &str) -> Result<(), KselonError> {
        self.tables()?.guilds.insert(guild, prefix.to_string());
        Ok(())
    }

    async fn delete_prefix(&self, guild: GuildId) -> Result<(), KselonError> {
        self.tables()?.guilds.remove(&guild);
        Ok(())
    }

    async fn get_profile(&self, user: UserId) -> Result<Option<Profile>, KselonError> {
        Ok(self.tables()?.users.get(&user).cloned())
    }

    async fn set_profile(&self, user: UserId, profile: &Profile) -> Result<(), KselonError> {
        self.tables()?.users.insert(user, profile.clone());
        Ok(())
    }

    async fn get_lastfm(&self, user: UserId) -> Result<Option<String>, KselonError> {
        Ok(self.tables()?.lastfm.get(&user).cloned())
    }

    async fn set_lastfm(&self, user: UserId, username: &str) -> Result<(), KselonError> {
        self.tables()?.lastfm.insert(user, username.to_string());
        Ok(())
    }

    async fn ping(&self) -> Result<(), KselonError> {
        self.tables().map(|_| ())
    }

    async fn reconnect(&self) -> Result<(), KselonError> {
        self.reconnects.fetch_add(1, Ordering::SeqCst);
        self.set_failing(false);
        Ok(())
    }
}
