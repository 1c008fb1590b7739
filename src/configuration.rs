use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub source: SourceSettings,
    pub application: ApplicationSettings,
}

#[derive(Deserialize, Clone, Debug)]
pub struct SourceSettings {
    pub base_url: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub table_index: usize,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    /// Hour to collect in `YYYYMMDDHH` format, overrides `lookback_hours`
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub lookback_hours: u32,
    /// Consecutive hours collected per run, at least one
    #[serde(
        default = "default_hours",
        deserialize_with = "deserialize_number_from_string"
    )]
    pub hours: NonZeroU32,
    pub output_directory: PathBuf,
    pub http_client: HttpClientSettings,
}

#[derive(Deserialize, Clone, Debug)]
pub struct HttpClientSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

impl HttpClientSettings {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_milliseconds)
    }
}

fn default_hours() -> NonZeroU32 {
    NonZeroU32::MIN
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().map_err(|e| {
        config::ConfigError::Message(format!("Failed to determine the current directory: {e}"))
    })?;
    get_configuration_from(&base_path.join("configuration"))
}

pub fn get_configuration_from(configuration_directory: &Path) -> Result<Settings, config::ConfigError> {
    // Detect the running environment.
    // Default to `local` if unspecified.
    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;
    let environment_filename = format!("{}.yaml", environment.as_str());

    let settings = config::Config::builder()
        .add_source(config::File::from(
            configuration_directory.join("base.yaml"),
        ))
        .add_source(
            config::File::from(configuration_directory.join(environment_filename)).required(false),
        )
        // Add in settings from environment variables (with a prefix of APP and
        // '__' as separator)
        // E.g. `APP_APPLICATION__TIMESTAMP=2024010112` would set `Settings.application.timestamp`
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;
    settings.try_deserialize::<Settings>()
}

pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. \
                Use either `local` or `production`.",
                other
            )),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn environment_is_parsed_case_insensitive() {
        let environment: Environment = "Production".to_string().try_into().unwrap();
        assert_eq!(environment.as_str(), "production");
    }

    #[test]
    fn unknown_environment_is_rejected() {
        let result: Result<Environment, String> = "staging".to_string().try_into();
        assert!(result.is_err());
    }

    fn write_base(directory: &Path, application_extra: &str) {
        std::fs::write(
            directory.join("base.yaml"),
            format!(
                r#"
source:
  base_url: "https://gems.whoi.edu/GEMS_data/"
  table_index: 0
application:
  lookback_hours: 24
  output_directory: "output"
{application_extra}
  http_client:
    timeout_milliseconds: 10000
"#
            ),
        )
        .unwrap();
    }

    #[test]
    fn base_configuration_points_to_gems_page() {
        let directory = tempfile::tempdir().unwrap();
        write_base(directory.path(), "");

        let settings = get_configuration_from(directory.path()).unwrap();

        assert_eq!(settings.source.base_url, "https://gems.whoi.edu/GEMS_data/");
        assert_eq!(settings.application.hours.get(), 1);
        assert_eq!(
            settings.application.http_client.timeout(),
            std::time::Duration::from_secs(10)
        );
    }

    #[test]
    fn zero_hours_are_rejected() {
        let directory = tempfile::tempdir().unwrap();
        write_base(directory.path(), "  hours: 0");

        assert!(get_configuration_from(directory.path()).is_err());
    }
}
