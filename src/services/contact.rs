use crate::config::ContactConfig;
use crate::models::ContactMessage;
use crate::services::validation::{check, ServiceError};
use anyhow::Result;

pub const NOT_CONFIGURED: &str = "Contact form is not configured";

/// Validates the message and hands it to the email-delivery API.
pub async fn send_message(config: &ContactConfig, message: &ContactMessage) -> Result<()> {
    check(message)?;

    if !config.is_configured() {
        return Err(ServiceError::Unavailable(NOT_CONFIGURED.to_string()).into());
    }

    deliver(config, message).await
}

#[cfg_attr(not(feature = "integrations"), allow(dead_code))]
fn payload(config: &ContactConfig, message: &ContactMessage) -> serde_json::Value {
    serde_json::json!({
        "service_id": config.service_id,
        "template_id": config.template_id,
        "user_id": config.public_key,
        "template_params": {
            "from_name": message.name.trim(),
            "from_email": message.email.trim(),
            "subject": message.subject.trim(),
            "message": message.message,
        },
    })
}

#[cfg(feature = "integrations")]
async fn deliver(config: &ContactConfig, message: &ContactMessage) -> Result<()> {
    let response = reqwest::Client::new()
        .post(&config.api_url)
        .header("User-Agent", concat!("folio/", env!("CARGO_PKG_VERSION")))
        .json(&payload(config, message))
        .timeout(std::time::Duration::from_secs(10))
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::error!("Contact delivery failed: HTTP {} {}", status, body);
        anyhow::bail!("Contact delivery failed with HTTP {}", status);
    }
    tracing::info!("Contact message delivered for {}", message.email.trim());
    Ok(())
}

#[cfg(not(feature = "integrations"))]
async fn deliver(_config: &ContactConfig, _message: &ContactMessage) -> Result<()> {
    Err(ServiceError::Unavailable(NOT_CONFIGURED.to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> ContactMessage {
        ContactMessage {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            subject: "Hello".to_string(),
            message: "Loved the projects page.".to_string(),
        }
    }

    #[test]
    fn test_payload_shape() {
        let config = ContactConfig {
            service_id: Some("svc".into()),
            template_id: Some("tpl".into()),
            public_key: Some("key".into()),
            ..Default::default()
        };
        let body = payload(&config, &message());
        assert_eq!(body["service_id"], "svc");
        assert_eq!(body["user_id"], "key");
        assert_eq!(body["template_params"]["from_email"], "ada@example.com");
    }

    #[tokio::test]
    async fn test_unconfigured_is_unavailable() {
        let err = send_message(&ContactConfig::default(), &message())
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ServiceError>(),
            Some(ServiceError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_message_is_rejected_before_delivery() {
        let mut invalid = message();
        invalid.email = "not-an-email".to_string();
        let err = send_message(&ContactConfig::default(), &invalid)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ServiceError>(),
            Some(ServiceError::Validation(_))
        ));
    }
}
