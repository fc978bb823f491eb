//! Login email delivery.
//!
//! [`Mailer`] is the seam between the login flow and whatever actually
//! delivers mail. [`ConsoleMailer`] prints the link to the log for local
//! development; [`ResendMailer`] hands an HTML email to the Resend HTTP API.

use crate::email::Email;
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use audiotube_config::{EmailConfig, MailProvider};
use exn::{OptionExt, ResultExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use time::Duration;
use tracing::instrument;
use upon::{Engine, Template};

pub const SUBJECT: &str = "Your AudioTube login link";
const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

const TEMPLATE: &str = r#"<div style="font-family: sans-serif; max-width: 400px; margin: 0 auto; padding: 20px;">
    <h2 style="color: #333;">Login to AudioTube</h2>
    <p style="color: #666;">Click the button below to log in. This link expires in {{ minutes }} minutes.</p>
    <a href="{{ link }}"
       style="display: inline-block; background: #000; color: #fff; padding: 12px 24px; text-decoration: none; border-radius: 6px; margin: 20px 0;">
        Log in to AudioTube
    </a>
    <p style="color: #999; font-size: 12px;">
        If you didn't request this link, you can safely ignore this email.
    </p>
</div>"#;

/// Something that can deliver a login link to its recipient.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_magic_link(&self, recipient: &Email, link: &str) -> Result<()>;
}

/// Build the mailer selected by configuration.
pub fn from_config(config: &EmailConfig, link_ttl: Duration) -> Result<Arc<dyn Mailer>> {
    Ok(match config.provider {
        MailProvider::Console => Arc::new(ConsoleMailer),
        MailProvider::Resend => Arc::new(ResendMailer::from_config(config, link_ttl)?),
    })
}

/// Logs the link instead of sending it.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleMailer;

#[async_trait]
impl Mailer for ConsoleMailer {
    async fn send_magic_link(&self, recipient: &Email, link: &str) -> Result<()> {
        tracing::info!(recipient = %recipient, link, "Magic link (console delivery)");
        Ok(())
    }
}

/// The HTML body of a login email, compiled once.
pub struct LoginTemplate {
    engine: Engine<'static>,
    template: Template<'static>,
    minutes: i64,
}
impl LoginTemplate {
    pub fn new(link_ttl: Duration) -> Result<Self> {
        let mut engine = Engine::new();
        // The link is interpolated into an attribute.
        engine.set_default_formatter(&upon::fmt::escape_html);
        let template = engine.compile(TEMPLATE).or_raise(|| ErrorKind::Template)?;
        Ok(Self { engine, template, minutes: link_ttl.whole_minutes() })
    }

    pub fn render(&self, link: &str) -> Result<String> {
        self.template
            .render(&self.engine, upon::value! { link: link, minutes: self.minutes })
            .to_string()
            .or_raise(|| ErrorKind::Template)
    }
}

#[derive(Debug, Serialize)]
struct ResendRequest<'a> {
    from: String,
    to: [&'a str; 1],
    subject: &'a str,
    html: String,
}

/// Sends login emails through the Resend HTTP API.
pub struct ResendMailer {
    client: reqwest::Client,
    api_key: String,
    from: String,
    template: LoginTemplate,
}
impl std::fmt::Debug for ResendMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResendMailer").field("from", &self.from).finish_non_exhaustive()
    }
}
impl ResendMailer {
    pub fn new(api_key: impl Into<String>, from: impl Into<String>, timeout: StdDuration, template: LoginTemplate) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build().or_raise(|| ErrorKind::Delivery)?;
        Ok(Self { client, api_key: api_key.into(), from: from.into(), template })
    }

    pub fn from_config(config: &EmailConfig, link_ttl: Duration) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_raise(|| ErrorKind::Delivery)?;
        let from = format!("{} <{}>", config.from_name, config.from_address);
        Self::new(api_key, from, config.timeout(), LoginTemplate::new(link_ttl)?)
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    #[instrument(skip_all)]
    async fn send_magic_link(&self, recipient: &Email, link: &str) -> Result<()> {
        let body = ResendRequest {
            from: self.from.clone(),
            to: [recipient.as_str()],
            subject: SUBJECT,
            html: self.template.render(link)?,
        };
        let response = self
            .client
            .post(RESEND_ENDPOINT)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .or_raise(|| ErrorKind::Delivery)?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Mail provider rejected login email");
            exn::bail!(ErrorKind::Delivery);
        }
        tracing::debug!("Login email accepted by mail provider");
        Ok(())
    }
}
