use super::{
    ApiFuture,
    BrewEntry,
    BrewFeed,
    Repository,
    StatsApi,
};
use eyre::{
    bail,
    eyre,
    Context as _,
    Result,
};
use oss_stats_config::Endpoints;
use reqwest::{
    header,
    Client as HttpClient,
    RequestBuilder,
};
use serde::de::DeserializeOwned;
use url::Url;

const PER_PAGE: usize = 100;
const GITHUB_API_VERSION: &str = "2022-11-28";

/// [`StatsApi`] backed by the public Homebrew and GitHub HTTP APIs.
pub struct HttpStatsApi {
    http_client: HttpClient,
    endpoints: Endpoints,
    github_token: Option<String>,
}

impl HttpStatsApi {
    pub fn new(endpoints: Endpoints, github_token: Option<String>) -> Result<Self> {
        let http_client = HttpClient::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        if github_token.is_none() {
            warn!("No GitHub token configured, requests are subject to the anonymous rate limit");
        }
        Ok(Self {
            http_client,
            endpoints,
            github_token,
        })
    }

    fn github_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.endpoints.github_api.clone();
        url.path_segments_mut()
            .map_err(|_| eyre!("GitHub API URL cannot be a base: {}", self.endpoints.github_api))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn github_request(&self, url: Url) -> RequestBuilder {
        let request = self
            .http_client
            .get(url)
            .header(header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION);
        match &self.github_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get_json<T: DeserializeOwned>(request: RequestBuilder, url: &Url) -> Result<T> {
        debug!(%url, "GET");
        let response = request
            .send()
            .await
            .wrap_err_with(|| format!("Request to {url} failed"))?
            .error_for_status()
            .wrap_err_with(|| format!("Request to {url} was rejected"))?;
        response
            .json::<T>()
            .await
            .wrap_err_with(|| format!("Failed to decode response from {url}"))
    }
}

impl StatsApi for HttpStatsApi {
    fn brew_analytics(&self) -> ApiFuture<'_, Vec<BrewEntry>> {
        Box::pin(async move {
            let url = self.endpoints.brew_analytics.clone();
            let request = self.http_client.get(url.clone());
            let feed: BrewFeed = Self::get_json(request, &url).await?;
            Ok(feed.into_entries())
        })
    }

    fn repository<'a>(&'a self, full_name: &'a str) -> ApiFuture<'a, Repository> {
        Box::pin(async move {
            let Some((owner, name)) = full_name.split_once('/') else {
                bail!("Repository '{full_name}' is not of the form owner/name");
            };
            let url = self.github_url(&["repos", owner, name])?;
            Self::get_json(self.github_request(url.clone()), &url).await
        })
    }

    fn owner_repositories<'a>(&'a self, owner: &'a str) -> ApiFuture<'a, Vec<Repository>> {
        Box::pin(async move {
            let mut repositories = Vec::new();
            for page in 1.. {
                let mut url = self.github_url(&["users", owner, "repos"])?;
                url.query_pairs_mut()
                    .append_pair("per_page", &PER_PAGE.to_string())
                    .append_pair("sort", "pushed")
                    .append_pair("page", &page.to_string());
                let batch: Vec<Repository> = Self::get_json(self.github_request(url.clone()), &url).await?;
                let done = batch.len() < PER_PAGE;
                repositories.extend(batch);
                if done {
                    break;
                }
            }
            debug!(owner, count = repositories.len(), "Listed repositories");
            Ok(repositories)
        })
    }
}
