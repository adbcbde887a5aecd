use crate::store::{RecordKey, RecordKind, RecordStore, SavedBracket, StoreError, StoreResult, slugify};
use async_trait::async_trait;
use log::debug;
use reqwest::{Client, RequestBuilder, StatusCode};
use std::time::Duration;

/// Client for a hosted JSON document store.
///
/// Documents live at `{base_url}/{collection}/{id}`: `GET` reads one (404 means
/// absent), `PUT` replaces it and `DELETE` removes it. `GET
/// {base_url}/{collection}?tournament={slug}` lists a tournament's documents.
#[derive(Debug, Clone)]
pub struct HttpStore {
    client: Client,
    base_url: String,
    token: Option<String>,
    timeout: Duration,
}

impl HttpStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .user_agent(concat!("ultibracket/", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_default(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            token: None,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn url_for(&self, key: &RecordKey) -> StoreResult<String> {
        Ok(format!("{}/{}", self.base_url, key.path()?))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.timeout(self.timeout);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// `Ok(None)` on 404, parse or status errors otherwise.
    async fn get<T: serde::de::DeserializeOwned>(&self, url: &str) -> StoreResult<Option<T>> {
        let response = self
            .authorized(self.client.get(url))
            .send()
            .await
            .map_err(|e| StoreError::Network(e, url.to_owned()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        match response.error_for_status() {
            Ok(res) => res
                .json::<T>()
                .await
                .map(Some)
                .map_err(|e| StoreError::Parsing(e, url.to_owned())),
            Err(e) => Err(StoreError::Api(e, url.to_owned())),
        }
    }
}

#[async_trait]
impl RecordStore for HttpStore {
    async fn load(&self, key: &RecordKey) -> StoreResult<Option<SavedBracket>> {
        let url = self.url_for(key)?;
        self.get(&url).await
    }

    async fn save(&self, doc: &SavedBracket) -> StoreResult<String> {
        let key = doc.key();
        let url = self.url_for(&key)?;
        let response = self
            .authorized(self.client.put(&url))
            .json(doc)
            .send()
            .await
            .map_err(|e| StoreError::Network(e, url.clone()))?;
        response.error_for_status().map_err(|e| StoreError::Api(e, url.clone()))?;
        debug!("stored {url}");
        key.document_id()
    }

    async fn delete(&self, key: &RecordKey) -> StoreResult<()> {
        let url = self.url_for(key)?;
        let response = self
            .authorized(self.client.delete(&url))
            .send()
            .await
            .map_err(|e| StoreError::Network(e, url.clone()))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        response.error_for_status().map_err(|e| StoreError::Api(e, url))?;
        Ok(())
    }

    async fn list(&self, kind: RecordKind, tournament_name: &str) -> StoreResult<Vec<SavedBracket>> {
        let slug = slugify(tournament_name);
        if slug.is_empty() {
            return Err(StoreError::InvalidKey(format!("tournament name {tournament_name:?}")));
        }
        let url = format!("{}/{}?tournament={slug}", self.base_url, kind.collection());
        let mut docs: Vec<SavedBracket> = self.get(&url).await?.unwrap_or_default();
        docs.retain(|d| d.kind == kind && d.tournament_name == tournament_name);
        docs.sort_by(|a, b| a.owner_id.cmp(&b.owner_id));
        Ok(docs)
    }
}
