use serde::Deserialize;
use uuid::Uuid;

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Tasks and profiles live in memory when unset.
    #[serde(default)]
    pub redis_url: Option<String>,
    /// Header carrying the user id, set by the gateway that checked the session.
    #[serde(default = "default_identity_header")]
    pub identity_header: String,
    #[serde(default)]
    pub admin_user_id: Option<Uuid>,
    #[serde(default = "default_admin_email")]
    pub admin_email: String,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_source(config::Environment::default())
    }

    fn from_source<S>(source: S) -> anyhow::Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let settings = config::Config::builder().add_source(source).build()?;
        let config: Config = settings.try_deserialize()?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            redis_url: None,
            identity_header: default_identity_header(),
            admin_user_id: None,
            admin_email: default_admin_email(),
        }
    }
}

fn default_port() -> u16 {
    3000
}

fn default_identity_header() -> String {
    "x-user-id".to_string()
}

fn default_admin_email() -> String {
    "admin@localhost".to_string()
}
