use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use tracing::info;

use crate::config::GmailConfig;
use crate::error::{PromoreelError, Result};

pub const GMAIL_SEND_URL: &str =
    "https://gmail.googleapis.com/gmail/v1/users/me/messages/send";

pub const EMAIL_SUBJECT: &str = "Your Generated Content Update";

/// Display name derived from the recipient address: everything before
/// the '@'.
pub fn recipient_name(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

/// Fixed HTML status report sent to the requester.
pub fn render_email_body(name: &str, video_status: Option<&str>) -> String {
    format!(
        r#"<html>
    <body style="font-family: Arial, sans-serif; background-color: #f9f9f9; margin: 0; padding: 20px;">
        <div style="max-width: 600px; margin: auto; background-color: #ffffff; border-radius: 8px; padding: 20px; box-shadow: 0 4px 8px rgba(0, 0, 0, 0.1);">
            <div style="text-align: center; padding-bottom: 20px; border-bottom: 1px solid #eeeeee;">
                <h1 style="color: #333333; margin: 0;">Social Media Manager</h1>
            </div>
            <div style="padding: 20px;">
                <p style="font-size: 16px; color: #333333;">Hello {name},</p>
                <p style="font-size: 16px; color: #555555;">We're excited to share your latest updates with you. Here's a summary of what we've prepared:</p>
                <div style="margin-top: 20px;">
                    <h3 style="color: #007BFF; font-size: 18px;">Video Update</h3>
                    <p style="font-size: 16px; color: #555555;">{status}</p>
                </div>
            </div>
            <div style="padding-top: 20px; border-top: 1px solid #eeeeee; text-align: center;">
                <p style="font-size: 16px; color: #555555; margin: 0;">Thank you for using our service!</p>
                <p style="font-size: 16px; color: #555555; margin: 0;">Best regards,<br>Your Content Team</p>
            </div>
        </div>
    </body>
</html>"#,
        name = name,
        status = video_status.unwrap_or("No video content available."),
    )
}

/// Assemble the RFC 2822 message that the send endpoint expects in
/// its base64url `raw` field.
pub fn build_mime(to: &str, subject: &str, html_body: &str) -> String {
    format!(
        "To: {to}\r\nSubject: {subject}\r\nMIME-Version: 1.0\r\nContent-Type: text/html; charset=utf-8\r\n\r\n{html_body}"
    )
}

/// Gmail sender for the status report.
pub struct GmailClient {
    http: reqwest::Client,
    access_token: String,
    send_url: String,
}

impl GmailClient {
    pub fn new(http: reqwest::Client, config: &GmailConfig) -> Self {
        Self {
            http,
            access_token: config.access_token.clone(),
            send_url: GMAIL_SEND_URL.to_string(),
        }
    }

    pub fn with_send_url(mut self, url: impl Into<String>) -> Self {
        self.send_url = url.into();
        self
    }

    pub async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<()> {
        let raw = URL_SAFE.encode(build_mime(to, subject, html_body));
        let response = self
            .http
            .post(&self.send_url)
            .header("Authorization", format!("Bearer {}", self.access_token))
            .json(&serde_json::json!({ "raw": raw }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PromoreelError::EmailFailed {
                reason: format!("send returned status {}", response.status()),
            });
        }
        info!(to, "email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[test]
    fn recipient_name_truncates_at_the_at_sign() {
        assert_eq!(recipient_name("jordan@example.com"), "jordan");
        assert_eq!(recipient_name("no-at-sign"), "no-at-sign");
    }

    #[test]
    fn body_greets_the_recipient_and_reports_status() {
        let body = render_email_body("jordan", Some("Video generated, link to video: x"));
        assert!(body.contains("Hello jordan,"));
        assert!(body.contains("Video generated, link to video: x"));
    }

    #[test]
    fn body_falls_back_when_there_is_no_video() {
        let body = render_email_body("jordan", None);
        assert!(body.contains("No video content available."));
    }

    #[test]
    fn mime_message_has_headers_before_the_body() {
        let mime = build_mime("a@b.c", "Subject line", "<p>hi</p>");
        assert!(mime.starts_with("To: a@b.c\r\n"));
        assert!(mime.contains("Subject: Subject line\r\n"));
        assert!(mime.contains("Content-Type: text/html"));
        assert!(mime.ends_with("<p>hi</p>"));
    }

    #[tokio::test]
    async fn send_posts_base64url_raw_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "m1"})))
            .mount(&server)
            .await;

        let client = GmailClient::new(
            reqwest::Client::new(),
            &GmailConfig {
                access_token: "gmail-token".into(),
            },
        )
        .with_send_url(format!("{}/send", server.uri()));

        client
            .send("jordan@example.com", EMAIL_SUBJECT, "<p>done</p>")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn send_surfaces_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = GmailClient::new(
            reqwest::Client::new(),
            &GmailConfig {
                access_token: "bad".into(),
            },
        )
        .with_send_url(format!("{}/send", server.uri()));

        assert!(matches!(
            client.send("a@b.c", EMAIL_SUBJECT, "x").await,
            Err(PromoreelError::EmailFailed { .. })
        ));
    }
}
