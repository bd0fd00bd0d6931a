//! `http.get` system plugin: fetches a URL, subject to the host policy. The
//! dispatcher injects the effective allowlist into `inputs["__allowed_hosts"]`
//! before invoking this executor (see `dispatcher::resolve`).

use std::collections::HashMap;

use async_trait::async_trait;
use taskcore_kernel::error::{TaskCoreError, TaskCoreResult};
use taskcore_kernel::traits::{PluginExecutor, TaskContext};

use super::policy::is_host_allowed;

pub struct HttpGetPlugin {
    client: reqwest::Client,
}

impl HttpGetPlugin {
    pub fn new() -> Self {
        Self { client: reqwest::Client::new() }
    }
}

impl Default for HttpGetPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginExecutor for HttpGetPlugin {
    async fn execute(
        &self,
        _ctx: &TaskContext,
        inputs: HashMap<String, serde_json::Value>,
    ) -> TaskCoreResult<HashMap<String, serde_json::Value>> {
        let url_str = inputs
            .get("url")
            .and_then(|v| v.as_str())
            .ok_or_else(|| TaskCoreError::invalid_input("http.get requires a string `url` input"))?;

        let url = reqwest::Url::parse(url_str).map_err(|e| TaskCoreError::invalid_input(format!("invalid url: {e}")))?;
        if url.scheme() != "https" {
            return Err(TaskCoreError::policy_violation("http.get only allows https URLs"));
        }
        let host = url.host_str().ok_or_else(|| TaskCoreError::invalid_input("url has no host"))?;

        let allowed_hosts: Vec<String> = inputs
            .get("__allowed_hosts")
            .and_then(|v| v.as_array())
            .map(|items| items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default();

        if !is_host_allowed(host, &allowed_hosts) {
            return Err(TaskCoreError::policy_violation(format!("host not allowlisted: {host}")));
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TaskCoreError::plugin_failure("http.get", e))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| TaskCoreError::plugin_failure("http.get", e))?;

        let mut out = HashMap::new();
        out.insert("status".to_string(), serde_json::json!(status));
        out.insert("body".to_string(), serde_json::json!(body));
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_non_https_urls() {
        let plugin = HttpGetPlugin::new();
        let ctx = TaskContext::new("t1", "s1", 1);
        let mut inputs = HashMap::new();
        inputs.insert("url".to_string(), serde_json::json!("http://example.com"));
        let err = plugin.execute(&ctx, inputs).await.unwrap_err();
        assert_eq!(err.kind(), "policy_violation");
    }

    #[tokio::test]
    async fn rejects_hosts_outside_the_allowlist() {
        let plugin = HttpGetPlugin::new();
        let ctx = TaskContext::new("t1", "s1", 1);
        let mut inputs = HashMap::new();
        inputs.insert("url".to_string(), serde_json::json!("https://evil.example"));
        inputs.insert("__allowed_hosts".to_string(), serde_json::json!(["api.example.com"]));
        let err = plugin.execute(&ctx, inputs).await.unwrap_err();
        assert_eq!(err.kind(), "policy_violation");
    }
}
