// src/notify/email.rs
use anyhow::{Context, Result};
use lettre::message::{Mailbox, Message, MultiPart};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};

use super::{render, Digest, Notifier};
use crate::config::SmtpConfig;

pub struct EmailSender {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Vec<Mailbox>,
}

impl EmailSender {
    pub fn new(cfg: &SmtpConfig) -> Result<Self> {
        let creds = Credentials::new(cfg.user.clone(), cfg.pass.clone());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.host)
            .with_context(|| format!("invalid SMTP_HOST {}", cfg.host))?
            .port(cfg.port)
            .credentials(creds)
            .build();

        let from: Mailbox = cfg
            .from
            .parse()
            .with_context(|| format!("invalid NOTIFY_EMAIL_FROM {}", cfg.from))?;
        let to = cfg
            .to
            .iter()
            .map(|addr| {
                addr.parse::<Mailbox>()
                    .with_context(|| format!("invalid NOTIFY_EMAIL_TO entry {addr}"))
            })
            .collect::<Result<Vec<_>>>()?;
        if to.is_empty() {
            anyhow::bail!("NOTIFY_EMAIL_TO has no recipients");
        }

        Ok(Self { mailer, from, to })
    }

    pub fn build_message(&self, digest: &Digest) -> Result<Message> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(render::subject(digest));
        for to in &self.to {
            builder = builder.to(to.clone());
        }
        builder
            .multipart(MultiPart::alternative_plain_html(
                render::plain_text(digest),
                render::html(digest),
            ))
            .context("build email")
    }

    pub async fn send_digest(&self, digest: &Digest) -> Result<()> {
        let msg = self.build_message(digest)?;
        self.mailer.send(msg).await.context("send email")?;
        tracing::info!(recipients = self.to.len(), total = digest.total(), "email sent");
        Ok(())
    }
}

#[async_trait::async_trait]
impl Notifier for EmailSender {
    async fn send(&self, digest: &Digest) -> Result<()> {
        self.send_digest(digest).await
    }

    fn name(&self) -> &str {
        "email"
    }
}
