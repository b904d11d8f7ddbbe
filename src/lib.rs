use config::{builder::DefaultState, Config, ConfigBuilder, ConfigError};
use serde::Deserialize;

pub mod domain;
pub mod infrastructure;

#[derive(Clone, Debug, Deserialize)]
pub struct MantaConfig {
    #[serde(default)]
    pub eventstore: Option<EventStore>,
    pub property: PropertySettings,
    pub logger: Logger,
    #[serde(default)]
    pub channels: Vec<ChannelSettings>,
}

impl MantaConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::builder()?
            .add_source(config::File::with_name("manta.toml").required(false))
            .add_source(config::Environment::with_prefix("MANTA").separator("_"))
            .build()?
            .try_deserialize::<MantaConfig>()
    }

    fn builder() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("logger.level", "INFO")?
            .set_default("property.capacity", 1)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct EventStore {
    pub url: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PropertySettings {
    pub name: String,
    pub address: String,
    pub capacity: u32,
}

/// 設定ファイルで追加する販売チャネル
#[derive(Clone, Debug, Deserialize)]
pub struct ChannelSettings {
    pub name: String,
    pub commission_rate: f64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Logger {
    pub level: Level,
}

#[derive(Clone, Debug, Deserialize)]
pub enum Level {
    TRACE,
    DEBUG,
    INFO,
    WARN,
    ERROR,
}

impl From<&Level> for tracing::Level {
    fn from(value: &Level) -> Self {
        match value {
            Level::TRACE => tracing::Level::TRACE,
            Level::DEBUG => tracing::Level::DEBUG,
            Level::INFO => tracing::Level::INFO,
            Level::WARN => tracing::Level::WARN,
            Level::ERROR => tracing::Level::ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use config::{File, FileFormat};

    use super::*;

    fn parse(toml: &str) -> Result<MantaConfig, ConfigError> {
        MantaConfig::builder()?
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    #[test]
    fn test_config_from_toml() {
        let config = parse(
            r#"
            [eventstore]
            url = "esdb://localhost:2113?tls=false"

            [property]
            name = "Casa Manta"
            address = "Av. Malecón 123"
            capacity = 4

            [logger]
            level = "DEBUG"

            [[channels]]
            name = "Booking.com"
            commission_rate = 0.18
            "#,
        )
        .unwrap();
        assert_eq!(
            config.eventstore.map(|e| e.url),
            Some("esdb://localhost:2113?tls=false".to_owned())
        );
        assert_eq!(config.property.name, "Casa Manta");
        assert_eq!(config.property.capacity, 4);
        assert_eq!(tracing::Level::from(&config.logger.level), tracing::Level::DEBUG);
        assert_eq!(config.channels.len(), 1);
        assert_eq!(config.channels[0].commission_rate, 0.18);
    }

    #[test]
    fn test_config_defaults() {
        let config = parse(
            r#"
            [property]
            name = "Casa Manta"
            address = "Av. Malecón 123"
            "#,
        )
        .unwrap();
        assert!(config.eventstore.is_none());
        assert!(config.channels.is_empty());
        assert_eq!(config.property.capacity, 1);
        assert_eq!(tracing::Level::from(&config.logger.level), tracing::Level::INFO);
    }

    #[test]
    fn test_config_requires_property() {
        assert!(parse("[logger]\nlevel = \"INFO\"").is_err());
    }
}
