//! Configuration for running this bot.
//!
//! Settings come from [CONFIG_PATH]. Secrets can also be given through
//! environment variables (or a `.env` file), which take precedence.

use std::collections::HashSet;
use std::marker::PhantomData;
use std::num::NonZeroU64;
use std::time::Duration;

use poise::Framework;
use serde::Deserialize;
use serde::Serialize;
use serenity::ChannelId;
use serenity::GuildId;
use serenity::RoleId;
use serenity::UserId;

use crate::error::ConfigError;
use crate::serenity;

/// The path to the config file
const CONFIG_PATH: &str = "config.toml";

/// Settings read from [CONFIG_PATH] that modify bot behavior.
#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// Token needed to use a bot account.
    discord_token: String,

    /// Custom status shown under the bot's name.
    #[serde(default)]
    status: String,

    /// Users allowed to run owner commands, on top of the application owner.
    #[serde(default)]
    owners: Vec<UserId>,

    /// Replies picked at random when someone else tries an owner command.
    #[serde(default)]
    owner_check_motd: Vec<String>,

    /// See [DatabaseConfig]
    pub database: DatabaseConfig,

    /// See [OsuConfig]
    pub osu: OsuConfig,

    /// See [LastFmConfig]
    pub lastfm: LastFmConfig,

    /// See [LlmConfig]
    pub llm: LlmConfig,

    /// See [ReworksConfig]
    pub reworks: ReworksConfig,

    /// See [AutoRoleConfig]
    #[serde(default)]
    pub auto_role: AutoRoleConfig,

    /// See [LoggingConfig]
    logging: LoggingConfig,

    /// Useful developer specific configs.
    dev_utils: DevConfig,
}

impl Config {
    /// Tries to read [CONFIG_PATH] to extract a [Config].
    /// If a file doesn't exists, create the default config file and returns error.
    /// If a file exists but is empty, re-write the default values and return error.
    /// If a file exists but is incomplete, show error and don't change files.
    /// If a file exists and is complete, read file and apply environment overrides.
    /// If file existance is indeterminent (e.g. missing permissions), return error.
    pub fn read() -> Result<Config, ConfigError> {
        let file = std::fs::read_to_string(CONFIG_PATH);

        match file {
            // Config file found
            Ok(content) => {
                // Write default values to file if it's empty.
                if content.trim().is_empty() {
                    write_file(Config::default())?;
                    Err(ConfigError::InvalidConfig {
                        reason: format!("Empty config file! Rewriting {CONFIG_PATH} ..."),
                    })
                } else {
                    let mut config = Config::parse(&content)?;
                    config.apply_env_from(|key| std::env::var(key).ok())?;
                    Ok(config)
                }
            }
            // File not found or other filesystem error
            Err(file_error) => match file_error.kind() {
                // If file doesn't exist, create default config file.
                std::io::ErrorKind::NotFound => {
                    let action = format!("Creating {CONFIG_PATH}...");
                    write_file(Config::default())?;
                    Err(ConfigError::MissingConfig { action_msg: action })
                }
                _ => Err(ConfigError::IoError(file_error)),
            },
        }
    }

    /// Deserialize a config, describing the exact path of any mistake.
    fn parse(content: &str) -> Result<Config, ConfigError> {
        let to_toml = toml::Deserializer::new(content);
        serde_path_to_error::deserialize(to_toml).map_err(|error| ConfigError::InvalidConfig {
            reason: error.to_string(),
        })
    }

    /// Overrides secrets and deployment specific values with the ones found by `lookup`.
    /// Empty values are ignored.
    pub fn apply_env_from(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = var("TOKEN") {
            self.discord_token = token;
        }
        if let Some(status) = var("STATUS") {
            self.status = status;
        }
        if let Some(motd) = var("OWNERCHECKMOTD") {
            self.owner_check_motd = read_list(&motd);
        }

        if let Some(host) = var("DB_HOST") {
            self.database.host = host;
        }
        if let Some(user) = var("DB_USER") {
            self.database.user = user;
        }
        if let Some(password) = var("DB_PASSWORD") {
            self.database.password = password;
        }
        if let Some(name) = var("DB_NAME") {
            self.database.name = name;
        }

        if let Some(server) = var("BANCHO") {
            self.osu.server = server;
        }
        if let Some(key) = var("BANCHO_API_KEY") {
            self.osu.api_key = key;
        }
        if let Some(key) = var("LASTFM") {
            self.lastfm.api_key = key;
        }

        if let Some(key) = var("LLM_API_KEY") {
            self.llm.api_key = key;
        }
        if let Some(model) = var("MODEL") {
            self.llm.model = model;
        }
        if let Some(id) = var("STARTING_PROMPT_ID") {
            let id: NonZeroU64 = id.trim().parse().map_err(|_| ConfigError::InvalidConfig {
                reason: format!("STARTING_PROMPT_ID is not a channel id: {id}"),
            })?;
            self.llm.start_prompt_channel = Some(ChannelId::from(id.get()));
        }
        if let Some(flag) = var("USE_START_PROMPT") {
            self.llm.use_start_prompt = read_bool(&flag);
        }

        if let Some(flag) = var("DEBUG") {
            self.logging.console_debug = read_bool(&flag);
        }

        Ok(())
    }

    /// Basic sanity check for if a token was given.
    pub fn token(&self) -> Result<&String, ConfigError> {
        let default_token = Config::default().discord_token;
        let given_token = &self.discord_token;

        let is_empty = given_token.is_empty();
        let contains_default = given_token.contains(&default_token);

        if !is_empty && !contains_default {
            Ok(&self.discord_token)
        } else {
            Err(ConfigError::InvalidConfig {
                reason: "Missing discord token".to_string(),
            })
        }
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Owners listed in the config.
    pub fn owners(&self) -> HashSet<UserId> {
        self.owners.iter().copied().collect()
    }

    pub fn owner_check_motd(&self) -> &[String] {
        &self.owner_check_motd
    }

    /// Construct a bug notification notify list based on the config.
    /// Wrapper for [NotifyConfig::notify_list]
    pub fn notify_list<U, E>(&self, fw: &Framework<U, E>) -> HashSet<UserId> {
        self.dev_utils.notifications.notify_list(fw)
    }

    /// Getter for log_dir.
    pub fn log_dir(&self) -> &str {
        &self.logging.log_dir
    }

    /// Is debug mode enabled for console logs
    pub fn console_debug(&self) -> bool {
        self.logging.console_debug
    }

    /// Is file logging enabled.
    pub fn logs_enabled(&self) -> bool {
        self.logging.logs_enabled
    }

    pub fn dev_guild(&self) -> Option<GuildId> {
        self.dev_utils.dev_guild
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            discord_token: "put_token_here".to_string(),
            status: "!help".to_string(),
            owners: vec![],
            owner_check_motd: vec!["you're not my owner!".to_string()],

            database: DatabaseConfig {
                host: "localhost".to_string(),
                port: 3306,
                user: "root".to_string(),
                password: String::new(),
                name: "kselon".to_string(),
                health_check_secs: 180,
            },

            osu: OsuConfig {
                server: "refx.online".to_string(),
                api_key: String::new(),
                beatmap_cache: ".data".to_string(),
            },

            lastfm: LastFmConfig {
                api_key: String::new(),
            },

            llm: LlmConfig {
                base_url: "https://api.openai.com/v1".to_string(),
                api_key: String::new(),
                model: "gpt-4o-mini".to_string(),
                use_start_prompt: false,
                start_prompt_channel: None,
                start_prompt_file: "prompt.txt".to_string(),
            },

            reworks: ReworksConfig {
                url: "http://localhost:8670".to_string(),
            },

            auto_role: AutoRoleConfig::default(),

            logging: LoggingConfig {
                console_debug: false,
                logs_enabled: true,
                log_dir: "logs".to_string(),
            },

            dev_utils: DevConfig {
                dev_guild: None,
                notifications: NotifyConfig {
                    enabled: false,
                    add_owners: true,
                    userids: vec![],
                },
            },
        }
    }
}

/// Connection settings for the MySQL database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Name of the database (schema) to use.
    pub name: String,
    /// Seconds between connection checks.
    pub health_check_secs: u64,
}

impl DatabaseConfig {
    pub fn health_check_interval(&self) -> Duration {
        Duration::from_secs(self.health_check_secs.max(1))
    }
}

/// The bancho.py server queried by the osu! commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OsuConfig {
    /// Domain of the server, e.g. `refx.online`.
    pub server: String,
    pub api_key: String,
    /// Directory where downloaded `.osu` files are kept.
    pub beatmap_cache: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastFmConfig {
    pub api_key: String,
}

/// Settings for the OpenAI compatible chat provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base url of the API, `/chat/completions` is appended.
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    /// Send the start prompt once the bot is ready?
    pub use_start_prompt: bool,
    /// Channel receiving the answers to start prompts and persona switches.
    #[serde(serialize_with = "serialize_opt", deserialize_with = "deserialize_opt")]
    pub start_prompt_channel: Option<ChannelId>,
    /// File holding the start prompt.
    pub start_prompt_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReworksConfig {
    /// Base url of the pp rework calculation service.
    pub url: String,
}

/// Give every member of a guild a role. Disabled unless both ids are set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutoRoleConfig {
    #[serde(serialize_with = "serialize_opt", deserialize_with = "deserialize_opt")]
    pub guild_id: Option<GuildId>,
    #[serde(serialize_with = "serialize_opt", deserialize_with = "deserialize_opt")]
    pub role_id: Option<RoleId>,
}

impl AutoRoleConfig {
    /// Both ids, if the feature is enabled.
    pub fn target(&self) -> Option<(GuildId, RoleId)> {
        self.guild_id.zip(self.role_id)
    }
}

/// Configs for
#[derive(Debug, Serialize, Deserialize)]
struct LoggingConfig {
    /// Print debug traces to console?
    console_debug: bool,
    /// Enable writing to log file?
    logs_enabled: bool,
    /// Directory to store log files
    log_dir: String,
}

/// Optional configs to enable developer-specific behavior.
#[derive(Debug, Serialize, Deserialize)]
struct DevConfig {
    /// Optional guild to automatically update commands quickly.
    #[serde(serialize_with = "serialize_opt", deserialize_with = "deserialize_opt")]
    dev_guild: Option<GuildId>,
    /// See [NotifyConfig]
    notifications: NotifyConfig,
}

/// Configs for notification behavior when encountering unexpected errors.
#[derive(Debug, Serialize, Deserialize)]
struct NotifyConfig {
    /// Enable this behavior or not. (bot sends a private message)
    enabled: bool,
    /// Whether to automatically add owners to the notify list.
    add_owners: bool,
    /// Additional users to add to the notify list.
    userids: Vec<UserId>,
}

impl NotifyConfig {
    /// Construct a bug notification notify list based on the config.
    fn notify_list<U, E>(&self, fw: &Framework<U, E>) -> HashSet<UserId> {
        let mut notify_list = HashSet::new();

        // If disabled, don't add anyone to the list.
        if !self.enabled {
            return notify_list;
        }

        if self.add_owners {
            notify_list.extend(fw.options().owners.iter().copied());
        }
        notify_list.extend(self.userids.iter().copied());

        notify_list
    }
}

/// Write the given config to [CONFIG_PATH].
fn write_file(config: Config) -> Result<(), ConfigError> {
    let content = toml::to_string_pretty(&config).map_err(|e| ConfigError::InvalidConfig {
        reason: e.to_string(),
    })?;
    std::fs::write(CONFIG_PATH, content).map_err(ConfigError::IoError)
}

/// Splits a comma (or newline) separated list, dropping empty items.
fn read_list(value: &str) -> Vec<String> {
    value
        .replace('\n', ",")
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

fn read_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "1" | "yes" | "y" | "on"
    )
}

fn deserialize_opt<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: From<u64>,
{
    deserializer.deserialize_str(OptVisitor(PhantomData))
}

fn serialize_opt<T, S>(val: &Option<T>, ser: S) -> Result<S::Ok, S::Error>
where
    T: serde::Serialize,
    S: serde::Serializer,
{
    match val {
        Some(v) => v.serialize(ser),
        None => ser.serialize_str(""),
    }
}

/// Reads an id where an empty string means "not set".
struct OptVisitor<T>(PhantomData<T>);

impl<'de, T: From<u64>> serde::de::Visitor<'de> for OptVisitor<T> {
    type Value = Option<T>;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a discord id or an empty string")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        match v.trim() {
            "" => Ok(None),
            v => {
                let num: NonZeroU64 = v.parse().map_err(|_| E::custom("not a discord id"))?;
                Ok(Some(T::from(num.get())))
            }
        }
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        match u64::try_from(v) {
            Ok(num) if num > 0 => Ok(Some(T::from(num))),
            _ => Err(E::custom("not a discord id")),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    fn default_toml() -> String {
        toml::to_string_pretty(&Config::default()).unwrap()
    }

    #[test]
    fn default_config_is_readable() {
        let config = Config::parse(&default_toml()).unwrap();

        assert_eq!(config.database.port, 3306);
        assert_eq!(config.osu.server, "refx.online");
        assert_eq!(config.llm.start_prompt_channel, None);
        assert_eq!(config.auto_role.target(), None);
        assert_eq!(config.dev_guild(), None);
        // The placeholder token must not pass the sanity check.
        assert!(config.token().is_err());
    }

    #[test]
    fn ids_accept_strings_and_integers() {
        let content = default_toml()
            .replace("start_prompt_channel = \"\"", "start_prompt_channel = 42")
            .replace("guild_id = \"\"", "guild_id = \"7\"");
        let config = Config::parse(&content).unwrap();

        assert_eq!(config.llm.start_prompt_channel, Some(ChannelId::new(42)));
        assert_eq!(config.auto_role.guild_id, Some(GuildId::new(7)));
        // Still disabled, the role is missing.
        assert_eq!(config.auto_role.target(), None);
    }

    #[test]
    fn incomplete_config_names_the_missing_field() {
        let content = default_toml().replace("health_check_secs = 180\n", "");
        let Err(ConfigError::InvalidConfig { reason }) = Config::parse(&content) else {
            panic!("expected an invalid config");
        };

        assert!(reason.contains("database"), "{reason}");
    }

    #[test]
    fn env_overrides_secrets() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("TOKEN", "abc.def"),
            ("DB_HOST", "db.internal"),
            ("DB_PASSWORD", "hunter2"),
            ("BANCHO", "akatsuki.gg"),
            ("MODEL", "llama"),
            ("STARTING_PROMPT_ID", "1234"),
            ("USE_START_PROMPT", "Yes"),
            ("DEBUG", "0"),
            ("OWNERCHECKMOTD", "no,\nnope , "),
            ("LASTFM", "  "),
        ]);
        let mut config = Config::default();
        config
            .apply_env_from(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.token().unwrap(), "abc.def");
        assert_eq!(config.database.host, "db.internal");
        assert_eq!(config.database.password, "hunter2");
        assert_eq!(config.database.user, "root");
        assert_eq!(config.osu.server, "akatsuki.gg");
        assert_eq!(config.llm.model, "llama");
        assert_eq!(config.llm.start_prompt_channel, Some(ChannelId::new(1234)));
        assert!(config.llm.use_start_prompt);
        assert!(!config.console_debug());
        assert_eq!(config.owner_check_motd(), ["no", "nope"]);
        // Blank values don't override.
        assert_eq!(config.lastfm.api_key, "");
    }

    #[test]
    fn bad_channel_id_in_env_is_rejected() {
        let mut config = Config::default();
        let result =
            config.apply_env_from(|key| (key == "STARTING_PROMPT_ID").then(|| "general".into()));

        assert!(matches!(result, Err(ConfigError::InvalidConfig { .. })));
    }
}
