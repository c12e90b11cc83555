use anyhow::{Context, Result};
use reqwest::Client;

pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    /// POST a chat message as the raw request body.
    pub async fn submit_message(&self, text: &str) -> Result<()> {
        let url = format!("{}/chat", self.base_url);

        self.client
            .post(&url)
            .body(text.to_string())
            .send()
            .await
            .context("Failed to submit chat message")?
            .error_for_status()
            .context("Chat message rejected")?;

        Ok(())
    }
}
