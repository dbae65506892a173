use crate::config::Settings;
use crate::error::App;
use crate::feeds::{FeedFetcher, FeedKind, FeedSnapshot};
use log::debug;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

pub struct HttpFetcher {
    client: Client,
    endpoints: HashMap<FeedKind, String>,
    city: String,
}

impl HttpFetcher {
    pub fn new(settings: &Settings) -> Result<Self, App> {
        let client = Client::builder()
            .timeout(settings.fetch_timeout())
            .user_agent(concat!("signboard/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let endpoints = settings
            .integrations
            .iter()
            .filter_map(|i| i.endpoint.clone().map(|endpoint| (i.feed, endpoint)))
            .collect();
        Ok(Self {
            client,
            endpoints,
            city: settings.city.clone(),
        })
    }

    fn endpoint(&self, kind: FeedKind) -> Result<&str, App> {
        self.endpoints
            .get(&kind)
            .map(String::as_str)
            .ok_or_else(|| App::Fetch(format!("no endpoint configured for {kind}")))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, App> {
        debug!("GET {url}");
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .query(query)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<T>().await?)
    }
}

impl FeedFetcher for HttpFetcher {
    async fn fetch(&self, kind: FeedKind) -> Result<FeedSnapshot, App> {
        let url = self.endpoint(kind)?;
        let snapshot = match kind {
            FeedKind::News => FeedSnapshot::News(self.get_json(url, &[]).await?),
            FeedKind::Weather => {
                FeedSnapshot::Weather(self.get_json(url, &[("city", self.city.as_str())]).await?)
            }
            FeedKind::Sports => FeedSnapshot::Sports(self.get_json(url, &[]).await?),
        };
        Ok(snapshot)
    }
}
