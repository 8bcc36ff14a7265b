// src/infrastructure/elasticsearch.rs
use crate::config::EngineConfig;
use crate::domain::errors::{DomainError, DomainResult};
use crate::infrastructure::repositories::{map_engine_error, map_reqwest};
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde_json::{Value, json};

/// HTTP handle on one search engine, shared by the repositories built on it.
#[derive(Clone, Debug)]
pub struct EngineClient {
    http: Client,
    config: EngineConfig,
}

impl EngineClient {
    pub fn new(config: EngineConfig) -> DomainResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(map_reqwest)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn index(&self) -> &str {
        self.config.index()
    }

    /// `{base}/{segments...}?{query...}` with each segment percent-encoded.
    pub fn url(&self, segments: &[&str], query: &[(&str, &str)]) -> DomainResult<Url> {
        let mut url = self.config.url().clone();
        url.path_segments_mut()
            .map_err(|()| DomainError::persistence("engine url cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    pub fn request(&self, method: Method, url: Url) -> RequestBuilder {
        tracing::debug!(method = method.as_str(), url = url.as_str(), "engine request");
        let builder = self.http.request(method, url);
        match self.config.credentials() {
            Some(credentials) => builder.basic_auth(credentials.username(), credentials.password()),
            None => builder,
        }
    }

    /// Send and decode a JSON response; any non-2xx status is an error.
    pub async fn send(&self, builder: RequestBuilder) -> DomainResult<Value> {
        self.dispatch(builder, false)
            .await?
            .ok_or_else(|| DomainError::persistence("engine returned no document"))
    }

    /// Like [`send`](Self::send), but a plain document-level 404 yields `None`.
    /// A 404 carrying an error object (e.g. a missing index) is still an error.
    pub async fn send_allow_missing(&self, builder: RequestBuilder) -> DomainResult<Option<Value>> {
        self.dispatch(builder, true).await
    }

    async fn dispatch(&self, builder: RequestBuilder, allow_missing: bool) -> DomainResult<Option<Value>> {
        let response = builder.send().await.map_err(map_reqwest)?;
        let status = response.status();
        let body = response.text().await.map_err(map_reqwest)?;

        if status.is_success() {
            return parse_body(&body).map(Some);
        }
        if allow_missing && status == StatusCode::NOT_FOUND && !is_error_document(&body) {
            return Ok(None);
        }
        Err(map_engine_error(status, &body))
    }

    pub async fn index_exists(&self) -> DomainResult<bool> {
        let url = self.url(&[self.index()], &[])?;
        let response = self
            .request(Method::HEAD, url)
            .send()
            .await
            .map_err(map_reqwest)?;
        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(map_engine_error(status, &body))
            }
        }
    }

    /// Create the index with `mappings` unless it already exists.
    /// Returns whether the index was created by this call.
    pub async fn ensure_index(&self, mappings: Value) -> DomainResult<bool> {
        if self.index_exists().await? {
            tracing::debug!(index = self.index(), "index already present");
            return Ok(false);
        }
        let url = self.url(&[self.index()], &[])?;
        let body = json!({ "mappings": mappings });
        match self.send(self.request(Method::PUT, url).json(&body)).await {
            Ok(_) => {
                tracing::info!(index = self.index(), "created index");
                Ok(true)
            }
            // Another process created it between the existence check and now.
            Err(DomainError::Engine { kind, .. }) if kind == "resource_already_exists_exception" => {
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }
}

fn parse_body(body: &str) -> DomainResult<Value> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body)
        .map_err(|err| DomainError::persistence(format!("engine sent invalid JSON: {err}")))
}

fn is_error_document(body: &str) -> bool {
    serde_json::from_str::<Value>(body)
        .map(|json| json.get("error").is_some())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(url: &str) -> EngineClient {
        EngineClient::new(EngineConfig::new(url, "blog").unwrap()).unwrap()
    }

    #[test]
    fn urls_encode_segments_and_keep_prefix() {
        let client = client("http://localhost:9200/proxy/");
        let url = client
            .url(&["blog", "_doc", "a/b c"], &[("refresh", "true")])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:9200/proxy/blog/_doc/a%2Fb%20c?refresh=true"
        );
    }

    #[test]
    fn urls_without_query_have_no_question_mark() {
        let client = client("http://localhost:9200");
        let url = client.url(&["blog", "_count"], &[]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:9200/blog/_count");
    }

    #[test]
    fn document_level_not_found_is_distinguished_from_errors() {
        assert!(!is_error_document(r#"{"_index":"blog","_id":"x","found":false}"#));
        assert!(is_error_document(
            r#"{"error":{"type":"index_not_found_exception"},"status":404}"#
        ));
        assert!(!is_error_document(""));
    }

    #[test]
    fn empty_bodies_parse_as_null() {
        assert_eq!(parse_body("  ").unwrap(), Value::Null);
        assert!(parse_body("{oops").is_err());
    }
}
