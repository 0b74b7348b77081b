use anyhow::Result;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

/// Claims returned by Google's tokeninfo endpoint for an id token.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleTokenInfo {
    pub aud: String,
    pub sub: String,
    pub email: Option<String>,
    /// Google sends this as the string `"true"`; accept a JSON bool as well.
    #[serde(default)]
    pub email_verified: Value,
    pub name: Option<String>,
    pub picture: Option<String>,
}

impl GoogleTokenInfo {
    #[must_use]
    pub fn is_email_verified(&self) -> bool {
        match &self.email_verified {
            Value::Bool(b) => *b,
            Value::String(s) => s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }
}

#[derive(Clone)]
pub struct GoogleClient {
    client: Client,
    tokeninfo_url: String,
    client_id: String,
}

impl GoogleClient {
    #[must_use]
    pub fn new(client: Client, tokeninfo_url: &str, client_id: &str) -> Self {
        Self {
            client,
            tokeninfo_url: tokeninfo_url.to_string(),
            client_id: client_id.to_string(),
        }
    }

    /// Validates an id token and returns its claims. `Ok(None)` means Google
    /// rejected the token or it was issued for another client.
    pub async fn verify_id_token(&self, id_token: &str) -> Result<Option<GoogleTokenInfo>> {
        let response = self
            .client
            .get(&self.tokeninfo_url)
            .query(&[("id_token", id_token)])
            .send()
            .await?;

        if response.status().is_client_error() {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Google tokeninfo error: {status} - {body}"));
        }

        let info: GoogleTokenInfo = response.json().await?;
        if info.aud != self.client_id {
            return Ok(None);
        }

        Ok(Some(info))
    }
}
