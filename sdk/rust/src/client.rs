use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MultiplyRequest {
    #[serde(rename = "A")]
    pub a: i64,
    #[serde(rename = "B")]
    pub b: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MultiplyResponse {
    pub result: i64,
}

pub struct GatewayClient {
    client: Client,
    gateway_url: String,
    route: String,
}

impl GatewayClient {
    pub fn new(gateway_url: &str) -> Self {
        Self {
            client: Client::new(),
            gateway_url: gateway_url.trim_end_matches('/').to_string(),
            route: "/rpc/multiply".to_string(),
        }
    }

    /// Use a route other than `/rpc/multiply`.
    pub fn with_route(mut self, route: &str) -> Self {
        self.route = route.to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}{}", self.gateway_url, self.route)
    }

    /// Multiply `a` by `b` through the gateway.
    pub async fn multiply(&self, a: i64, b: i64) -> Result<i64, Box<dyn std::error::Error>> {
        let resp = self
            .client
            .post(self.endpoint())
            .json(&MultiplyRequest { a, b })
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(format!("Gateway returned error status {}: {}", status, text.trim_end()).into());
        }

        let parsed: MultiplyResponse = serde_json::from_str(&text)?;
        Ok(parsed.result)
    }

    /// POST an arbitrary body to the multiply route and return the raw response.
    pub async fn post_raw(&self, body: impl Into<reqwest::Body>) -> Result<Response, reqwest::Error> {
        self.client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
    }
}
