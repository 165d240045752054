//! Office notification email (AWS SES)
//!
//! Sent after a retailer registration commits. Delivery is best-effort: a
//! failure is logged and never affects the registration response.

use aws_sdk_sesv2::Client as SesClient;
use aws_sdk_sesv2::types::{Body, Content, Destination, EmailContent, Message};

use crate::BoxError;

/// Registration details included in the office email
#[derive(Debug, Clone)]
pub struct RegistrationNotice {
    pub retailer_name: String,
    pub phone_number: String,
    pub wholesale_name: String,
    /// Submission date, `YYYY-MM-DD`
    pub submitted_on: String,
}

#[derive(Clone)]
pub struct Notifier {
    ses: Option<SesClient>,
    from: Option<String>,
    recipients: Vec<String>,
    verification_url: String,
}

impl Notifier {
    pub fn new(
        ses: Option<SesClient>,
        from: Option<String>,
        recipients: Vec<String>,
        verification_url: String,
    ) -> Self {
        Self {
            ses,
            from,
            recipients,
            verification_url,
        }
    }

    /// Notifier that never sends
    pub fn disabled() -> Self {
        Self::new(None, None, Vec::new(), String::new())
    }

    pub fn is_enabled(&self) -> bool {
        self.ses.is_some() && self.from.is_some() && !self.recipients.is_empty()
    }

    /// Send in the background; errors are logged
    pub fn spawn_registration_notice(&self, notice: RegistrationNotice) {
        if !self.is_enabled() {
            tracing::debug!("Notification email disabled, skipping");
            return;
        }
        let notifier = self.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.send_registration_notice(&notice).await {
                tracing::warn!(error = %e, retailer = %notice.retailer_name, "Registration email failed");
            }
        });
    }

    async fn send_registration_notice(&self, notice: &RegistrationNotice) -> Result<(), BoxError> {
        let (Some(ses), Some(from)) = (&self.ses, &self.from) else {
            return Ok(());
        };

        let subject = Content::builder().data("Verifikasi Retailer").build()?;
        let body = Body::builder()
            .text(
                Content::builder()
                    .data(render_text(notice, &self.verification_url))
                    .build()?,
            )
            .html(
                Content::builder()
                    .data(render_html(notice, &self.verification_url))
                    .build()?,
            )
            .build();
        let message = Message::builder().subject(subject).body(body).build();

        ses.send_email()
            .from_email_address(from)
            .destination(
                Destination::builder()
                    .set_to_addresses(Some(self.recipients.clone()))
                    .build(),
            )
            .content(EmailContent::builder().simple(message).build())
            .send()
            .await?;

        tracing::info!(
            recipients = self.recipients.len(),
            retailer = %notice.retailer_name,
            "Registration email sent"
        );
        Ok(())
    }
}

fn render_text(notice: &RegistrationNotice, verification_url: &str) -> String {
    format!(
        "Dear Admin,\n\n\
         Retailer sudah melakukan pendaftaran dengan detail berikut.\n\n\
         Nama Retailer     : {}\n\
         No WhatsApp       : {}\n\
         Nama Agen         : {}\n\
         Tanggal Pengisian : {}\n\
         Status            : Menunggu Verifikasi\n\n\
         Verifikasi sekarang: {verification_url}\n",
        notice.retailer_name, notice.phone_number, notice.wholesale_name, notice.submitted_on,
    )
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn render_html(notice: &RegistrationNotice, verification_url: &str) -> String {
    let row = |label: &str, value: &str| {
        format!(
            "<tr><td><strong>{label}</strong></td><td>: {}</td></tr>",
            escape_html(value)
        )
    };
    format!(
        "<html><body>\
         <p>Dear Admin,</p>\
         <p>Retailer sudah melakukan pendaftaran dengan detail dibawah ini.</p>\
         <table>{}{}{}{}{}</table>\
         <p><a href=\"{}\">Verifikasi Sekarang</a></p>\
         </body></html>",
        row("Nama Retailer", &notice.retailer_name),
        row("No WhatsApp", &notice.phone_number),
        row("Nama Agen", &notice.wholesale_name),
        row("Tanggal Pengisian", &notice.submitted_on),
        row("Status", "Menunggu Verifikasi"),
        escape_html(verification_url),
    )
}
