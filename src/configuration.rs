use std::net::SocketAddr;

use url::Url;

use crate::notify::SmsConfig;

#[derive(Clone)]
pub struct Configuration {
    pub listen: SocketAddr,
    pub data_dir: String,
    pub public_base: Url,
    pub session_secret: String,
    pub sms: Option<SmsConfig>,
    pub log_file: Option<String>,
    pub reset: bool,
}
