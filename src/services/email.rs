use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use uuid::Uuid;

use crate::config::Config;

pub struct EmailService {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl EmailService {
    /// Returns None if SMTP is not fully configured.
    pub fn new(config: &Config) -> Option<Self> {
        let host = config.smtp_host.as_deref()?;
        let username = config.smtp_username.clone()?;
        let password = config.smtp_password.clone()?;
        let from_addr = config.smtp_from.as_deref()?;

        let port = config.smtp_port.unwrap_or(587);
        let creds = Credentials::new(username, password);

        let transport = if port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                .ok()?
                .credentials(creds)
                .build()
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .ok()?
                .credentials(creds)
                .build()
        };

        let from: Mailbox = from_addr.parse().ok()?;

        Some(Self { transport, from })
    }

    fn new_message_id(&self) -> String {
        format!("<{}@{}>", Uuid::new_v4(), self.from.email.domain())
    }

    pub async fn send_invitation(
        &self,
        to: &str,
        building_name: &str,
        invited_by: &str,
        base_url: &str,
    ) -> anyhow::Result<()> {
        let to_mailbox: Mailbox = to.parse()?;
        let html = format!(
            r#"<div style="max-width:480px;margin:0 auto;font-family:sans-serif">
<p style="font-size:20px;font-weight:700;color:#0f172a">{building_name}</p>
<p>{invited_by} invited you to join <strong>{building_name}</strong>.</p>
<p>Open your invitations to accept or decline:</p>
<p><a href="{base_url}/invitations" style="color:#2563eb">{base_url}/invitations</a></p>
</div>"#
        );

        let message = Message::builder()
            .message_id(Some(self.new_message_id()))
            .from(self.from.clone())
            .to(to_mailbox)
            .subject(format!("Invitation to {building_name}"))
            .header(ContentType::TEXT_HTML)
            .body(html)?;

        self.transport.send(message).await?;
        Ok(())
    }
}
