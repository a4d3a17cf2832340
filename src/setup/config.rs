//! Configuration for running this bot.

use std::collections::HashSet;
use std::time::Duration;

use poise::Framework;
use serde::Deserialize;
use serde::Serialize;
use serenity::GuildId;
use serenity::UserId;

use crate::error::ConfigError;
use crate::irc;
use crate::relay::embed::parse_hex_colour;
use crate::relay::Routes;
use crate::serenity;

/// The path to the config file
const CONFIG_PATH: &str = "config.toml";

/// Settings read from [CONFIG_PATH] that modify bot behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Token needed to use a bot account.
    discord_token: String,

    /// See [OsuConfig]
    osu: OsuConfig,

    /// See [IrcConfig]
    irc: IrcConfig,

    /// See [RelayConfig]
    relay: RelayConfig,

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
    /// If a file exists and is complete, read file to create a config.
    /// If file existance is indeterminent (e.g. missing permissions), return error.
    pub fn read() -> Result<Config, ConfigError> {
        let file = std::fs::read_to_string(CONFIG_PATH);

        match file {
            // Config file found
            Ok(content) => {
                // Write default values to file if it's empty.
                if content.trim().is_empty() {
                    write_file(&Config::default())?;
                    Err(ConfigError::InvalidConfig {
                        reason: format!("Empty config file! Rewriting {CONFIG_PATH} ..."),
                    })
                } else {
                    Config::from_toml(&content)
                }
            }
            // File not found or other filesystem error
            Err(file_error) => {
                match file_error.kind() {
                    // If file doesn't exist, create default config file.
                    std::io::ErrorKind::NotFound => {
                        let action = format!("Creating {CONFIG_PATH}, fill it in and restart.");
                        write_file(&Config::default())?;
                        Err(ConfigError::MissingConfig { action_msg: action })
                    }
                    _ => Err(ConfigError::IoError(file_error)),
                }
            }
        }
    }

    /// Parse a config. On failure the reason names the offending field.
    pub fn from_toml(content: &str) -> Result<Config, ConfigError> {
        let to_toml = toml::Deserializer::new(content);
        let result: Result<Config, _> = serde_path_to_error::deserialize(to_toml);

        result.map_err(|error| ConfigError::InvalidConfig {
            reason: error.to_string(),
        })
    }

    /// Check everything that can be checked before connecting anywhere.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.token()?;
        self.osu_api_key()?;
        self.irc_settings()?;
        self.embed_colour()?;

        if self.relay.concurrency == 0 {
            return Err(invalid("relay.concurrency must be at least 1"));
        }
        Ok(())
    }

    /// Basic sanity check for if a token was given.
    pub fn token(&self) -> Result<&str, ConfigError> {
        let default = Config::default();
        configured(&self.discord_token, &default.discord_token, "discord token")
    }

    pub fn osu_api_key(&self) -> Result<&str, ConfigError> {
        let default = OsuConfig::default();
        configured(&self.osu.api_key, &default.api_key, "osu! api key")
    }

    /// Settings for the Bancho client, joining every routed channel.
    pub fn irc_settings(&self) -> Result<irc::Settings, ConfigError> {
        let default = OsuConfig::default();
        let username = configured(&self.osu.username, &default.username, "osu! username")?;
        let password = configured(
            &self.osu.irc_password,
            &default.irc_password,
            "osu! irc password",
        )?;

        let irc = &self.irc;
        if irc.idle_timeout_secs == 0 || irc.reconnect_delay_secs == 0 {
            return Err(invalid("irc timeouts must be at least 1 second"));
        }

        let channels = self.routes()?.irc_channels().map(str::to_string).collect();

        Ok(irc::Settings {
            host: irc.host.clone(),
            port: irc.port,
            nick: username.trim().replace(' ', "_"),
            password: password.to_string(),
            channels,
            idle_timeout: Duration::from_secs(irc.idle_timeout_secs),
            reconnect_delay: Duration::from_secs(irc.reconnect_delay_secs),
            max_reconnect_delay: Duration::from_secs(
                irc.max_reconnect_delay_secs.max(irc.reconnect_delay_secs),
            ),
        })
    }

    pub fn routes(&self) -> Result<Routes, ConfigError> {
        let relay = &self.relay;
        let channels = relay
            .routes
            .iter()
            .map(|route| (route.irc_channel.as_str(), route.discord_channel));

        Routes::new(channels, relay.private_messages)
    }

    pub fn embed_colour(&self) -> Result<u32, ConfigError> {
        let colour = &self.relay.embed_color;
        parse_hex_colour(colour).ok_or_else(|| invalid(format!("'{colour}' is not a hex colour")))
    }

    pub fn user_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.relay.user_cache_secs)
    }

    pub fn concurrency(&self) -> usize {
        self.relay.concurrency
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

            osu: OsuConfig::default(),

            irc: IrcConfig {
                host: "irc.ppy.sh".to_string(),
                port: 6667,
                idle_timeout_secs: 180,
                reconnect_delay_secs: 5,
                max_reconnect_delay_secs: 300,
            },

            relay: RelayConfig {
                embed_color: "#2ec36e".to_string(),
                user_cache_secs: 300,
                concurrency: 4,
                private_messages: None,
                routes: ["#osu", "#indonesian", "#lobby"]
                    .into_iter()
                    .map(|channel| RouteConfig {
                        irc_channel: channel.to_string(),
                        discord_channel: 0,
                    })
                    .collect(),
            },

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

/// osu! account credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct OsuConfig {
    /// Bancho login name.
    username: String,
    /// From https://osu.ppy.sh/p/irc, not the account password.
    irc_password: String,
    /// From https://osu.ppy.sh/p/api
    api_key: String,
}

impl Default for OsuConfig {
    fn default() -> Self {
        Self {
            username: "put_username_here".to_string(),
            irc_password: "put_irc_password_here".to_string(),
            api_key: "put_api_key_here".to_string(),
        }
    }
}

/// Bancho connection behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct IrcConfig {
    host: String,
    port: u16,
    /// Reconnect after this long without hearing from the server.
    idle_timeout_secs: u64,
    /// First reconnect delay, doubled on every failed attempt.
    reconnect_delay_secs: u64,
    max_reconnect_delay_secs: u64,
}

/// What gets relayed where.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RelayConfig {
    /// `#rrggbb`
    embed_color: String,
    /// How long osu! profiles are cached.
    user_cache_secs: u64,
    /// Messages prepared at once. Delivery order is kept regardless.
    concurrency: usize,
    /// Discord channel for private messages to the bot account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    private_messages: Option<u64>,
    routes: Vec<RouteConfig>,
}

/// One IRC channel relayed into one Discord channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RouteConfig {
    irc_channel: String,
    discord_channel: u64,
}

/// Configs for
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    /// Print debug traces to console?
    console_debug: bool,
    /// Enable writing to log file?
    logs_enabled: bool,
    /// Directory to store log files
    log_dir: String,
}

/// Optional configs to enable developer-specific behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DevConfig {
    /// Optional guild to automatically update commands quickly.
    #[serde(serialize_with = "serialize_opt", deserialize_with = "deserialize_opt")]
    dev_guild: Option<GuildId>,
    /// See [NotifyConfig]
    notifications: NotifyConfig,
}

/// Configs for notification behavior when encountering unexpected errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
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

        // Add bot owners if enabled
        if self.add_owners {
            let owners = &fw.options().owners;
            for userid in owners {
                notify_list.insert(*userid);
            }
        }

        // Add users in config
        for userid in &self.userids {
            notify_list.insert(*userid);
        }

        notify_list
    }
}

fn invalid(reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidConfig {
        reason: reason.into(),
    }
}

/// Rejects empty values and values still containing the placeholder.
fn configured<'a>(value: &'a str, placeholder: &str, name: &str) -> Result<&'a str, ConfigError> {
    if value.trim().is_empty() || value.contains(placeholder) {
        Err(invalid(format!("Missing {name}")))
    } else {
        Ok(value)
    }
}

/// Write the given config to [CONFIG_PATH].
fn write_file(config: &Config) -> Result<(), ConfigError> {
    use std::fs::write;

    let content = toml::to_string_pretty(config).map_err(|e| invalid(e.to_string()))?;
    write(CONFIG_PATH, content).map_err(ConfigError::IoError)
}

fn deserialize_opt<'de, D>(deserializer: D) -> Result<Option<GuildId>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    deserializer.deserialize_any(OptVisitor)
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

struct OptVisitor;

impl<'de> serde::de::Visitor<'de> for OptVisitor {
    type Value = Option<GuildId>;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a valid guild id")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        match v.trim() {
            "" => Ok(None),
            v => {
                let num: u64 = v.parse().map_err(|_| E::custom("not u64"))?;
                self.visit_u64(num)
            }
        }
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        let num = u64::try_from(v).map_err(|_| E::custom("negative guild id"))?;
        self.visit_u64(num)
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        // Zero isn't a valid snowflake, treat it like "unset".
        Ok((v != 0).then(|| GuildId::new(v)))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const VALID: &str = r##"
discord_token = "MTA.real.token"

[osu]
username = "Relay Bot"
irc_password = "abcdef12"
api_key = "0123456789abcdef"

[irc]
host = "irc.ppy.sh"
port = 6667
idle_timeout_secs = 180
reconnect_delay_secs = 5
max_reconnect_delay_secs = 300

[relay]
embed_color = "#2ec36e"
user_cache_secs = 300
concurrency = 4
private_messages = 333

[[relay.routes]]
irc_channel = "#osu"
discord_channel = 111

[[relay.routes]]
irc_channel = "#indonesian"
discord_channel = 222

[logging]
console_debug = false
logs_enabled = true
log_dir = "logs"

[dev_utils]
dev_guild = ""

[dev_utils.notifications]
enabled = false
add_owners = true
userids = []
"##;

    #[test]
    fn parses_a_complete_config() {
        let config = Config::from_toml(VALID).unwrap();
        config.validate().unwrap();

        assert_eq!(config.token().unwrap(), "MTA.real.token");
        assert_eq!(config.osu_api_key().unwrap(), "0123456789abcdef");
        assert_eq!(config.embed_colour().unwrap(), 0x2ec36e);
        assert_eq!(config.user_cache_ttl(), Duration::from_secs(300));
        assert_eq!(config.dev_guild(), None);

        let irc = config.irc_settings().unwrap();
        assert_eq!(irc.nick, "Relay_Bot");
        assert_eq!(irc.channels, vec!["#osu", "#indonesian"]);
        assert_eq!(irc.reconnect_delay, Duration::from_secs(5));
    }

    #[test]
    fn default_config_round_trips_but_is_not_usable() {
        let content = toml::to_string_pretty(&Config::default()).unwrap();
        let config = Config::from_toml(&content).unwrap();

        assert_eq!(config.relay.routes.len(), 3);
        assert_eq!(config.relay.private_messages, None);
        assert!(config.token().is_err());
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_field_names_the_path() {
        let content = VALID.replace("api_key = \"0123456789abcdef\"", "");
        let error = Config::from_toml(&content).unwrap_err();

        assert!(error.to_string().contains("osu"), "{error}");
    }

    #[test]
    fn rejects_unroutable_channels() {
        let content = VALID.replace("discord_channel = 222", "discord_channel = 0");
        let config = Config::from_toml(&content).unwrap();
        assert!(config.validate().is_err());

        let content = VALID.replace("\"#indonesian\"", "\"#OSU\"");
        let config = Config::from_toml(&content).unwrap();
        assert!(config.routes().is_err());
    }

    #[test]
    fn rejects_bad_colour_and_concurrency() {
        let content = VALID.replace("#2ec36e", "green");
        assert!(Config::from_toml(&content).unwrap().validate().is_err());

        let content = VALID.replace("concurrency = 4", "concurrency = 0");
        assert!(Config::from_toml(&content).unwrap().validate().is_err());
    }

    #[test]
    fn dev_guild_accepts_strings_and_numbers() {
        let content = VALID.replace("dev_guild = \"\"", "dev_guild = \"310243609641484288\"");
        let config = Config::from_toml(&content).unwrap();
        assert_eq!(config.dev_guild(), Some(GuildId::new(310243609641484288)));

        let content = VALID.replace("dev_guild = \"\"", "dev_guild = 310243609641484288");
        let config = Config::from_toml(&content).unwrap();
        assert_eq!(config.dev_guild(), Some(GuildId::new(310243609641484288)));
    }
}
