use anyhow::{Context as AnyhowContext, Result};
use url::Url;

use crate::configuration::Configuration;
use crate::notify::SmsConfig;

pub struct Context {
    pub config: Configuration,
}

impl Context {
    pub fn from_cli(cli: &crate::cli::Cli) -> Result<Self> {
        let public_base = Url::parse(&cli.public_base_url)
            .with_context(|| format!("parsing public base URL {}", cli.public_base_url))?;
        let cfg = Configuration {
            listen: cli.listen,
            data_dir: cli.data_dir.clone(),
            public_base,
            session_secret: cli.session_secret.clone(),
            sms: sms_from_env(),
            log_file: cli.log_file.clone(),
            reset: cli.reset,
        };
        Ok(Self { config: cfg })
    }
}

/// SMS is enabled only when the whole credential set is present.
fn sms_from_env() -> Option<SmsConfig> {
    let var = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
    Some(SmsConfig {
        api_url: var("SMS_API_URL")?,
        user: var("SMS_USER")?,
        pass: var("SMS_PASS")?,
        sender: var("SMS_SENDER")?,
    })
}
