// Contact form submissions, forwarded to Formspree.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::models::user::is_valid_email;

pub const MAX_MESSAGE_LENGTH: usize = 5000;
const FORWARD_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub message: String,
}

impl ContactSubmission {
    /// Trim every field and reject submissions the form should never have sent.
    pub fn normalized(self) -> AppResult<Self> {
        let trim_opt = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let submission = Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: trim_opt(self.phone),
            subject: trim_opt(self.subject),
            message: self.message.trim().to_string(),
        };
        if submission.name.is_empty() {
            return Err(AppError::Validation("name is required".to_string()));
        }
        if !is_valid_email(&submission.email) {
            return Err(AppError::Validation(format!(
                "'{}' is not a valid email",
                submission.email
            )));
        }
        if submission.message.is_empty() {
            return Err(AppError::Validation("message is required".to_string()));
        }
        if submission.message.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(AppError::Validation(format!(
                "message is longer than {} characters",
                MAX_MESSAGE_LENGTH
            )));
        }
        Ok(submission)
    }
}

#[async_trait]
pub trait ContactForwarder: Send + Sync {
    async fn forward(&self, submission: &ContactSubmission) -> AppResult<()>;
}

pub struct FormspreeForwarder {
    client: reqwest::Client,
    endpoint: Option<String>,
}

impl FormspreeForwarder {
    pub fn new(endpoint: Option<String>) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(FORWARD_TIMEOUT)
            .build()
            .map_err(|e| AppError::Internal(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl ContactForwarder for FormspreeForwarder {
    async fn forward(&self, submission: &ContactSubmission) -> AppResult<()> {
        let endpoint = self.endpoint.as_deref().ok_or_else(|| {
            AppError::ServiceUnavailable("contact form is not configured".to_string())
        })?;

        let resp = self
            .client
            .post(endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(submission)
            .send()
            .await
            .map_err(|e| AppError::UpstreamError(format!("contact form delivery failed: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!("Formspree rejected submission: {} {}", status, body);
            return Err(AppError::UpstreamError(format!(
                "contact form delivery failed with status {}",
                status.as_u16()
            )));
        }
        info!("Forwarded contact submission from {}", submission.email);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn submission(value: serde_json::Value) -> ContactSubmission {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_normalized_trims_and_drops_blank_optionals() {
        let cleaned = submission(json!({
            "name": "  Aisha ",
            "email": "aisha@example.com ",
            "phone": "   ",
            "subject": " Gratuity question",
            "message": " How is DIFC handled? "
        }))
        .normalized()
        .unwrap();
        assert_eq!(cleaned.name, "Aisha");
        assert_eq!(cleaned.email, "aisha@example.com");
        assert_eq!(cleaned.phone, None);
        assert_eq!(cleaned.subject.as_deref(), Some("Gratuity question"));
        assert_eq!(cleaned.message, "How is DIFC handled?");
    }

    #[test]
    fn test_normalized_rejects_bad_input() {
        let base = json!({"name": "A", "email": "a@example.com", "message": "hi"});
        for (field, value) in [
            ("name", json!(" ")),
            ("email", json!("not-an-email")),
            ("message", json!("")),
            ("message", json!("x".repeat(MAX_MESSAGE_LENGTH + 1))),
        ] {
            let mut body = base.clone();
            body[field] = value;
            assert!(matches!(
                submission(body).normalized(),
                Err(AppError::Validation(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_unconfigured_forwarder_is_unavailable() {
        let forwarder = FormspreeForwarder::new(None).unwrap();
        let valid = submission(json!({"name": "A", "email": "a@example.com", "message": "hi"}));
        assert!(matches!(
            forwarder.forward(&valid).await,
            Err(AppError::ServiceUnavailable(_))
        ));
    }
}
