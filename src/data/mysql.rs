//! [Store] backed by a MySQL database.

use std::time::Duration;

use async_trait::async_trait;
use serenity::GuildId;
use serenity::UserId;
use sqlx::mysql::MySqlConnectOptions;
use sqlx::mysql::MySqlPoolOptions;
use sqlx::MySqlPool;
use tokio::sync::RwLock;

use super::store::Profile;
use super::store::Store;
use crate::osu::Mode;
use crate::serenity;
use crate::setup::DatabaseConfig;
use crate::KselonError;

/// Tables are created on connect if they don't exist yet.
const SCHEMA: [&str; 3] = [
    "CREATE TABLE IF NOT EXISTS guilds (
        guild_id BIGINT UNSIGNED NOT NULL PRIMARY KEY,
        prefix VARCHAR(3) NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS users (
        id VARCHAR(32) NOT NULL PRIMARY KEY,
        name VARCHAR(64) NOT NULL,
        mode INT NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS lastfm (
        id VARCHAR(32) NOT NULL PRIMARY KEY,
        username VARCHAR(64) NOT NULL
    )",
];

#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    name: String,
    mode: i32,
}

#[derive(Debug)]
pub struct MySqlStore {
    options: MySqlConnectOptions,
    /// Replaced as a whole by [Store::reconnect].
    pool: RwLock<MySqlPool>,
}

impl MySqlStore {
    /// Connects and creates missing tables.
    /// If the database is unreachable the pool connects lazily, so the bot can
    /// still start and the health check can try again later.
    pub async fn connect(config: &DatabaseConfig) -> Self {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.name);

        let pool = match Self::open(&options).await {
            Ok(pool) => {
                tracing::info!("Connected to MySQL!");
                pool
            }
            Err(e) => {
                tracing::error!("Database connection failed: {e}");
                pool_options().connect_lazy_with(options.clone())
            }
        };

        Self {
            options,
            pool: RwLock::new(pool),
        }
    }

    async fn open(options: &MySqlConnectOptions) -> Result<MySqlPool, KselonError> {
        let pool = pool_options().connect_with(options.clone()).await?;
        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }
        Ok(pool)
    }

    /// Pools are reference counted, so this is cheap.
    async fn pool(&self) -> MySqlPool {
        self.pool.read().await.clone()
    }
}

fn pool_options() -> MySqlPoolOptions {
    MySqlPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
}

#[async_trait]
impl Store for MySqlStore {
    async fn get_prefix(&self, guild: GuildId) -> Result<Option<String>, KselonError> {
        let prefix = sqlx::query_scalar::<_, String>("SELECT prefix FROM guilds WHERE guild_id = ?")
            .bind(guild.get())
            .fetch_optional(&self.pool().await)
            .await?;
        Ok(prefix)
    }

    async fn set_prefix(&self, guild: GuildId, prefix: &str) -> Result<(), KselonError> {
        sqlx::query(
            "INSERT INTO guilds (guild_id, prefix) VALUES (?, ?)
             ON DUPLICATE KEY UPDATE prefix = VALUES(prefix)",
        )
        .bind(guild.get())
        .bind(prefix)
        .execute(&self.pool().await)
        .await?;
        Ok(())
    }

    async fn delete_prefix(&self, guild: GuildId) -> Result<(), KselonError> {
        sqlx::query("DELETE FROM guilds WHERE guild_id = ?")
            .bind(guild.get())
            .execute(&self.pool().await)
            .await?;
        Ok(())
    }

    async fn get_profile(&self, user: UserId) -> Result<Option<Profile>, KselonError> {
        let row: Option<ProfileRow> =
            sqlx::query_as("SELECT name, mode FROM users WHERE id = ?")
                .bind(user.to_string())
                .fetch_optional(&self.pool().await)
                .await?;

        Ok(row.map(|row| Profile {
            name: row.name,
            mode: Mode::from_id(row.mode),
        }))
    }

    async fn set_profile(&self, user: UserId, profile: &Profile) -> Result<(), KselonError> {
        sqlx::query(
            "INSERT INTO users (id, name, mode) VALUES (?, ?, ?)
             ON DUPLICATE KEY UPDATE name = VALUES(name), mode = VALUES(mode)",
        )
        .bind(user.to_string())
        .bind(&profile.name)
        .bind(i32::from(profile.mode.id()))
        .execute(&self.pool().await)
        .await?;
        Ok(())
    }

    async fn get_lastfm(&self, user: UserId) -> Result<Option<String>, KselonError> {
        let username = sqlx::query_scalar::<_, String>("SELECT username FROM lastfm WHERE id = ?")
            .bind(user.to_string())
            .fetch_optional(&self.pool().await)
            .await?;
        Ok(username)
    }

    async fn set_lastfm(&self, user: UserId, username: &str) -> Result<(), KselonError> {
        sqlx::query(
            "INSERT INTO lastfm (id, username) VALUES (?, ?)
             ON DUPLICATE KEY UPDATE username = VALUES(username)",
        )
        .bind(user.to_string())
        .bind(username)
        .execute(&self.pool().await)
        .await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), KselonError> {
        sqlx::query("SELECT 1").execute(&self.pool().await).await?;
        Ok(())
    }

    async fn reconnect(&self) -> Result<(), KselonError> {
        let new_pool = Self::open(&self.options).await?;
        let old_pool = std::mem::replace(&mut *self.pool.write().await, new_pool);
        old_pool.close().await;

        tracing::info!("Reconnected to MySQL!");
        Ok(())
    }
}
