use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::users::repo_types::{ExtUserData, PassportKey};

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Source of profile data keyed by passport.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    async fn lookup(&self, key: PassportKey) -> anyhow::Result<ExtUserData>;
}

#[derive(Debug, Deserialize)]
struct PeopleInfo {
    #[serde(default)]
    surname: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    address: String,
}

/// `GET {base}/info?passportSerie=..&passportNumber=..`
#[derive(Clone)]
pub struct HttpDirectory {
    http: reqwest::Client,
    base_url: String,
}

impl HttpDirectory {
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(LOOKUP_TIMEOUT)
            .build()
            .context("build directory http client")?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn info_url(&self) -> String {
        format!("{}/info", self.base_url)
    }
}

#[async_trait]
impl DirectoryClient for HttpDirectory {
    async fn lookup(&self, key: PassportKey) -> anyhow::Result<ExtUserData> {
        let resp = self
            .http
            .get(self.info_url())
            .query(&[("passportSerie", key.serie), ("passportNumber", key.number)])
            .header("Accept", "application/json")
            .send()
            .await
            .with_context(|| format!("directory request for {key}"))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("directory returned {status} for {key}: {body}");
        }

        let info: PeopleInfo = resp
            .json()
            .await
            .with_context(|| format!("decode directory response for {key}"))?;
        debug!(%key, "directory lookup ok");
        Ok(ExtUserData {
            passport_serie: key.serie,
            passport_number: key.number,
            surname: info.surname,
            name: info.name,
            address: info.address,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalised() {
        let dir = HttpDirectory::new("http://directory.local:8081/").unwrap();
        assert_eq!(dir.info_url(), "http://directory.local:8081/info");
    }

    #[test]
    fn partial_directory_payload_decodes() {
        let info: PeopleInfo = serde_json::from_str(r#"{"surname":"Ivanov","name":"Ivan"}"#).unwrap();
        assert_eq!(info.surname, "Ivanov");
        assert!(info.address.is_empty());
    }
}
