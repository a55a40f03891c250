use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::json;
use url::Url;

use crate::types::{job_no_to_token, Order};

/// Country prefix prepended to bare national numbers.
const COUNTRY_PREFIX: &str = "90";

const SMS_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct SmsConfig {
    pub api_url: String,
    pub user: String,
    pub pass: String,
    pub sender: String,
}

/// Thin client for the SMS gateway. Without credentials it degrades to a
/// no-op so the rest of the service works in development.
#[derive(Clone)]
pub struct SmsClient {
    http: reqwest::Client,
    config: Option<SmsConfig>,
    public_base: Url,
}

/// Brings a free-form phone entry into international format: `+...`
/// passes through, otherwise non-digits are stripped, a single leading
/// zero is dropped and the country prefix is attached. A leading `9`
/// counts as already carrying the prefix.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with('+') {
        return Some(trimmed.to_string());
    }
    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits = digits.strip_prefix('0').unwrap_or(&digits);
    if digits.starts_with('9') {
        Some(format!("+{digits}"))
    } else {
        Some(format!("+{COUNTRY_PREFIX}{digits}"))
    }
}

/// First letter of each word upper-cased, the rest lowered, for the
/// customer-facing greeting.
fn title_case(value: &str) -> String {
    value
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

impl SmsClient {
    pub fn new(config: Option<SmsConfig>, public_base: Url) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(SMS_TIMEOUT)
            .build()
            .context("building SMS HTTP client")?;
        Ok(Self {
            http,
            config,
            public_base,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.config.is_some()
    }

    /// New-order notification. `raw_name`/`raw_phone` are the values as
    /// the customer typed them, preferred over the normalized upper-case
    /// document fields for display and dialing.
    pub async fn notify_new_order(&self, order: &Order, raw_name: &str, raw_phone: &str) {
        let display_name = if raw_name.trim().is_empty() {
            title_case(&order.name)
        } else {
            title_case(raw_name)
        };
        let phone = if raw_phone.trim().is_empty() {
            order.phone.clone()
        } else {
            raw_phone.to_string()
        };

        let service = title_case(&order.service);
        let mut message = format!(
            "Dear {display_name}, your {service} request has been received."
        );
        if order.is_installation() {
            match self.short_link(&order.job_no) {
                Ok(link) => {
                    message.push_str(&format!(
                        " Please upload your invoice within 24 hours at {link}. \
                         Service cannot be scheduled until the invoice is approved."
                    ));
                }
                Err(err) => {
                    log::warn!("could not build short link for {}: {}", order.job_no, err);
                    return;
                }
            }
        } else {
            message.push_str(" Our technical team will contact you shortly.");
        }

        let custom_id = format!("order_{}", order.job_no);
        if let Err(err) = self.send(&phone, &message, &custom_id).await {
            log::warn!("SMS for {} failed: {}", order.job_no, err);
        }
    }

    fn short_link(&self, job_no: &str) -> Result<Url> {
        let token = job_no_to_token(job_no);
        self.public_base
            .join(&format!("u/{token}"))
            .context("joining short link")
    }

    /// One gateway request; quietly a no-op when unconfigured or the
    /// message has nothing to go on.
    pub async fn send(&self, phone: &str, content: &str, custom_id: &str) -> Result<()> {
        let Some(config) = &self.config else {
            return Ok(());
        };
        let content = content.trim();
        let Some(number) = normalize_phone(phone) else {
            return Ok(());
        };
        if content.is_empty() {
            return Ok(());
        }

        let mut payload = json!({
            "type": 1,
            "sendingType": 0,
            "title": "Installation notice",
            "content": content,
            "number": number,
            "encoding": 0,
            "sender": config.sender,
            "sendingDate": "",
            "validity": 60,
            "commercial": false,
            "skipAhsQuery": true,
            "recipientType": 0,
        });
        let custom_id: String = custom_id.chars().take(64).collect();
        if !custom_id.is_empty() {
            payload["customID"] = json!(custom_id);
        }

        log::info!("sending SMS to {number}");
        let response = self
            .http
            .post(&config.api_url)
            .basic_auth(&config.user, Some(&config.pass))
            .json(&payload)
            .send()
            .await
            .context("SMS gateway request")?;
        response
            .error_for_status()
            .context("SMS gateway rejected the message")?;
        Ok(())
    }
}
