use reqwest::{Client, RequestBuilder, Response, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::catalog::{CatalogClient, CatalogError, CatalogResult};
use crate::types::{Group, Package, SearchOptions, SearchResults};

/// Path of the REST package register, relative to the catalog base url.
const PACKAGE_REGISTER_PATH: [&str; 3] = ["api", "rest", "package"];

/// Path of the REST group register, relative to the catalog base url.
const GROUP_REGISTER_PATH: [&str; 3] = ["api", "rest", "group"];

/// Path of the package search endpoint, relative to the catalog base url.
const PACKAGE_SEARCH_PATH: [&str; 3] = ["api", "search", "package"];

/// Catalog client speaking the CKAN-style REST API over HTTP.
///
/// Every call is a single request; non-success statuses are returned as
/// [`CatalogError::Status`] carrying the response body, which keeps the not-found status
/// distinguishable from the others.
#[derive(Debug, Clone)]
pub struct HttpCatalogClient {
    client: Client,
    base_url: Url,
    api_key: Option<SecretString>,
}

impl HttpCatalogClient {
    /// Creates a client for the catalog rooted at `base_url`.
    pub fn new(
        base_url: impl AsRef<str>,
        api_key: Option<SecretString>,
        timeout: Duration,
    ) -> CatalogResult<Self> {
        let base_url =
            Url::parse(base_url.as_ref()).map_err(|err| CatalogError::Transport(Box::new(err)))?;
        if base_url.cannot_be_a_base() {
            return Err(CatalogError::Transport(
                format!("catalog url `{base_url}` cannot have a path").into(),
            ));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| CatalogError::Transport(Box::new(err)))?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    /// Appends `path` and the optional `entity` name to the base url, percent-encoding each.
    fn url(&self, path: &[&str], entity: Option<&str>) -> CatalogResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| CatalogError::Transport("catalog url cannot have a path".into()))?
            .pop_if_empty()
            .extend(path)
            .extend(entity);

        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(api_key) => request.header("Authorization", api_key.expose_secret()),
            None => request,
        }
    }

    async fn send<T>(&self, request: RequestBuilder) -> CatalogResult<T>
    where
        T: DeserializeOwned,
    {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|err| CatalogError::Transport(Box::new(err)))?;

        decode(response).await
    }

    async fn send_json<B, T>(&self, request: RequestBuilder, body: &B) -> CatalogResult<T>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        self.send(request.json(body)).await
    }
}

impl CatalogClient for HttpCatalogClient {
    fn name() -> &'static str {
        "http"
    }

    async fn get_package(&self, name_or_id: &str) -> CatalogResult<Package> {
        let url = self.url(&PACKAGE_REGISTER_PATH, Some(name_or_id))?;
        self.send(self.client.get(url)).await
    }

    async fn create_package(&self, package: &Package) -> CatalogResult<Package> {
        let url = self.url(&PACKAGE_REGISTER_PATH, None)?;
        self.send_json(self.client.post(url), package).await
    }

    async fn replace_package(&self, package: &Package) -> CatalogResult<Package> {
        let url = self.url(&PACKAGE_REGISTER_PATH, Some(package.name.as_str()))?;
        self.send_json(self.client.put(url), package).await
    }

    async fn search_packages(&self, options: &SearchOptions) -> CatalogResult<SearchResults> {
        let mut query: Vec<(&str, &str)> = vec![("q", "")];
        query.extend(options.iter().map(|(key, value)| (key.as_str(), value.as_str())));

        let request = self
            .client
            .get(self.url(&PACKAGE_SEARCH_PATH, None)?)
            .query(&query);
        self.send(request).await
    }

    async fn get_group(&self, name: &str) -> CatalogResult<Group> {
        let url = self.url(&GROUP_REGISTER_PATH, Some(name))?;
        self.send(self.client.get(url)).await
    }

    async fn replace_group(&self, group: &Group) -> CatalogResult<Group> {
        let url = self.url(&GROUP_REGISTER_PATH, Some(group.name.as_str()))?;
        self.send_json(self.client.put(url), group).await
    }
}

/// Turns a response into the decoded payload or a status error holding the body.
async fn decode<T>(response: Response) -> CatalogResult<T>
where
    T: DeserializeOwned,
{
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|err| CatalogError::Transport(Box::new(err)))?;

    debug!(status = status.as_u16(), bytes = body.len(), "catalog responded");

    if !status.is_success() {
        return Err(CatalogError::Status {
            status: status.as_u16(),
            payload: Some(body),
        });
    }

    Ok(serde_json::from_str(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> HttpCatalogClient {
        HttpCatalogClient::new(base_url, None, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        assert_eq!(
            client("http://catalog.test/")
                .url(&PACKAGE_REGISTER_PATH, None)
                .unwrap()
                .as_str(),
            "http://catalog.test/api/rest/package"
        );
        assert_eq!(
            client("http://catalog.test/ckan/")
                .url(&GROUP_REGISTER_PATH, Some("ons"))
                .unwrap()
                .as_str(),
            "http://catalog.test/ckan/api/rest/group/ons"
        );
    }

    #[test]
    fn test_entity_names_are_percent_encoded() {
        let url = client("http://catalog.test")
            .url(&PACKAGE_REGISTER_PATH, Some("census 2011/q1"))
            .unwrap();

        assert_eq!(
            url.as_str(),
            "http://catalog.test/api/rest/package/census%202011%2Fq1"
        );
    }

    #[test]
    fn test_base_url_must_be_hierarchical() {
        assert!(HttpCatalogClient::new("mailto:catalog@test", None, Duration::from_secs(5)).is_err());
        assert!(HttpCatalogClient::new("not a url", None, Duration::from_secs(5)).is_err());
    }
}
