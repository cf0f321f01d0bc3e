use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::{
    config::EmailConfig,
    notify::{
        channel::{ChannelError, ChannelKind, NotifyChannel},
        message::ChannelMessage,
    },
};

/// Sends alerts as multipart (plain + HTML) email via SMTP with STARTTLS.
pub struct EmailChannel {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl EmailChannel {
    pub fn from_config(config: &EmailConfig) -> Result<Self, ChannelError> {
        let host = config
            .host
            .as_deref()
            .ok_or_else(|| ChannelError::Config("SMTP_HOST is not set".to_string()))?;
        let to = config
            .to
            .as_deref()
            .ok_or_else(|| ChannelError::Config("SMTP_TO is not set".to_string()))?;

        let from: Mailbox = config
            .from
            .parse()
            .map_err(|err| ChannelError::Config(format!("invalid SMTP_FROM: {err}")))?;
        let to: Mailbox = to
            .parse()
            .map_err(|err| ChannelError::Config(format!("invalid SMTP_TO: {err}")))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|err| ChannelError::Config(err.to_string()))?
            .port(config.port);
        if let (Some(user), Some(password)) = (&config.user, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
            to,
        })
    }
}

#[async_trait::async_trait]
impl NotifyChannel for EmailChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Email
    }

    async fn send(&self, message: &ChannelMessage) -> Result<(), ChannelError> {
        let html = format!(
            "<html><body style=\"font-family: sans-serif;\">{}</body></html>",
            message.html_body.replace('\n', "<br>")
        );
        let email = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(&message.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(message.text_body.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html),
                    ),
            )
            .map_err(|err| ChannelError::Smtp(err.to_string()))?;

        self.transport
            .send(email)
            .await
            .map_err(|err| ChannelError::Smtp(err.to_string()))?;
        Ok(())
    }
}
