use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Work-order tracking daemon for field service teams",
    long_about = "Tracks service and installation work orders, stores uploaded invoices and\ncompletion photos, and notifies customers over SMS.\n\nEnvironment:\n  SMS_API_URL    SMS gateway endpoint\n  SMS_USER       SMS gateway username\n  SMS_PASS       SMS gateway password\n  SMS_SENDER     Registered sender name\n\nSMS sending is disabled unless all four variables are set.\n"
)]
pub struct Cli {
    #[arg(
        long,
        env = "FIELDOPS_LISTEN",
        default_value = "127.0.0.1:8080",
        value_name = "ADDR",
        help = "Address the REST API binds to"
    )]
    pub listen: std::net::SocketAddr,

    #[arg(
        long,
        env = "FIELDOPS_DATA_DIR",
        default_value = "./data",
        value_name = "DIR",
        help = "Directory holding the database and uploaded files"
    )]
    pub data_dir: String,

    #[arg(
        long,
        env = "FIELDOPS_PUBLIC_BASE_URL",
        default_value = "http://localhost:8080/",
        value_name = "URL",
        help = "Base URL customers reach, used to build short links in SMS"
    )]
    pub public_base_url: String,

    #[arg(
        long,
        env = "FIELDOPS_SESSION_SECRET",
        default_value = "dev-secret-key",
        value_name = "KEY",
        hide_env_values = true,
        help = "Secret signing the session cookies"
    )]
    pub session_secret: String,

    #[arg(
        long,
        env = "FIELDOPS_LOG_FILE",
        value_name = "PATH",
        help = "Also append logs to this file"
    )]
    pub log_file: Option<String>,

    #[arg(
        long,
        default_value_t = false,
        help = "Reset all persisted state (delete the SQLite database) before starting"
    )]
    pub reset: bool,
}

pub fn parse() -> Cli {
    Cli::parse()
}
