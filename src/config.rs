use anyhow::Result;
use std::path::PathBuf;

/// SEC requires an identifying User-Agent with contact information.
pub const DEFAULT_USER_AGENT: &str = "stockfacts software@example.com";

#[derive(Clone, Debug)]
pub struct Config {
    pub user_agent: String,
    pub data_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let user_agent =
            std::env::var("USER_AGENT").unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string());

        let data_dir = PathBuf::from(
            std::env::var("STOCKFACTS_DATA_DIR").unwrap_or_else(|_| "data".to_string()),
        );

        Ok(Self {
            user_agent,
            data_dir,
        })
    }
}
