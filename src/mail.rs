use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::MailConfig;

#[derive(Debug, Clone, Serialize)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> anyhow::Result<()>;
}

/// Delivers through a JSON transactional-email API (`POST {from,to,subject,html}`).
#[derive(Clone)]
pub struct HttpMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    from: String,
}

impl HttpMailer {
    pub fn new(api_url: &str, api_key: Option<&str>, from: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .context("build mail http client")?;
        Ok(Self {
            client,
            api_url: api_url.to_string(),
            api_key: api_key.map(str::to_string),
            from: from.to_string(),
        })
    }
}

#[derive(Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, mail: OutgoingMail) -> anyhow::Result<()> {
        let mut req = self.client.post(&self.api_url).json(&SendRequest {
            from: &self.from,
            to: &mail.to,
            subject: &mail.subject,
            html: &mail.html,
        });
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        req.send()
            .await
            .context("mail api request")?
            .error_for_status()
            .context("mail api status")?;
        info!(to = %mail.to, "mail sent");
        Ok(())
    }
}

/// Development mailer: nothing leaves the process.
#[derive(Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: OutgoingMail) -> anyhow::Result<()> {
        info!(to = %mail.to, subject = %mail.subject, "mail delivery disabled; message not sent");
        debug!(html = %mail.html, "undelivered mail body");
        Ok(())
    }
}

pub fn from_config(cfg: &MailConfig) -> anyhow::Result<std::sync::Arc<dyn Mailer>> {
    Ok(match &cfg.api_url {
        Some(url) => std::sync::Arc::new(HttpMailer::new(url, cfg.api_key.as_deref(), &cfg.from)?),
        None => std::sync::Arc::new(LogMailer),
    })
}

pub fn verification_mail(to: &str, code: &str, ttl_minutes: i64) -> OutgoingMail {
    OutgoingMail {
        to: to.to_string(),
        subject: "Campus Wall - Verification Code".into(),
        html: format!(
            "<h2>Campus Wall Verification</h2>\
             <p>Your verification code is: <strong>{code}</strong></p>\
             <p>This code will expire in {ttl_minutes} minutes.</p>\
             <p>If you did not request this, please ignore this email.</p>"
        ),
    }
}
