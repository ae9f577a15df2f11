use anyhow::Result;
use serde_json::Value;
use std::time::Duration;

#[derive(Copy, Clone, Debug)]
pub struct Utility {}

impl Utility {
    pub fn get_reqwest_client(timeout: Duration) -> Result<reqwest::Client> {
        let ret = reqwest::ClientBuilder::new()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build();
        Ok(ret?)
    }

    pub async fn get_json(client: &reqwest::Client, url: &str) -> Result<Value> {
        let json = client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;
        Ok(json)
    }
}
