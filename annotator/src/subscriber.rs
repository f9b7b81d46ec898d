use anyhow::{Context, Result};
use serde::Serialize;
use std::time::Duration;
use tracing::info;

use common::SubscriberConfig;

#[derive(Debug, Serialize)]
struct SubscribeRequest<'a> {
    ip: &'a str,
    port: u16,
}

/// Register this service with the publisher so trigger messages get delivered.
pub async fn subscribe_to_publisher(config: &SubscriberConfig) -> Result<()> {
    let url = publisher_url(config);
    let body = SubscribeRequest {
        ip: &config.subscriber_host,
        port: config.subscriber_port,
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .context("failed to build reqwest client")?;

    let response = client
        .post(&url)
        .json(&body)
        .send()
        .await
        .with_context(|| format!("failed to reach publisher at {}", url))?;

    let status = response.status();
    if !status.is_success() {
        anyhow::bail!("publisher rejected subscription with status: {}", status);
    }

    info!(
        publisher = %url,
        "Subscribed as {}:{}",
        config.subscriber_host,
        config.subscriber_port
    );
    Ok(())
}

fn publisher_url(config: &SubscriberConfig) -> String {
    let host = config.publisher_host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        format!("{}:{}/publisher/subscribe", host, config.publisher_port)
    } else {
        format!("http://{}:{}/publisher/subscribe", host, config.publisher_port)
    }
}
