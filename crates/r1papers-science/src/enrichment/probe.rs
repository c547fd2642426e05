use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use tracing::debug;

use crate::error::{Result, ScienceError};

/// What an existence probe learned about a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Reachability {
    Reachable,
    NotFound,
    Unknown,
}

/// Lightweight existence check for an extracted link.
#[async_trait]
pub trait LinkProbe: Send + Sync {
    async fn probe(&self, url: &str) -> Result<Reachability>;
}

/// `HEAD` request; 404 means gone, anything else below 500 means there.
pub struct HttpLinkProbe {
    client: reqwest::Client,
}

impl HttpLinkProbe {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(ScienceError::Http)?;
        Ok(Self { client })
    }
}

pub fn classify_status(status: StatusCode) -> Reachability {
    if status == StatusCode::NOT_FOUND {
        Reachability::NotFound
    } else if status.as_u16() < 500 {
        Reachability::Reachable
    } else {
        Reachability::Unknown
    }
}

#[async_trait]
impl LinkProbe for HttpLinkProbe {
    async fn probe(&self, url: &str) -> Result<Reachability> {
        let response = self.client.head(url).send().await?;
        let status = response.status();
        debug!("HEAD {} -> {}", url, status);
        Ok(classify_status(status))
    }
}
