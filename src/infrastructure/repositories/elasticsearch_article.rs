// src/infrastructure/repositories/elasticsearch_article.rs
use crate::config::RefreshPolicy;
use crate::domain::article::{Article, ArticleId, ArticleRepository, article_index_mappings};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::search::{SearchHit, SearchHits, SearchRequest};
use crate::infrastructure::elasticsearch::EngineClient;
use async_trait::async_trait;
use reqwest::Method;
use serde_json::{Value, json};

/// Articles stored as documents in one engine index.
#[derive(Clone, Debug)]
pub struct ElasticsearchArticleRepository {
    client: EngineClient,
}

impl ElasticsearchArticleRepository {
    pub fn new(client: EngineClient) -> Self {
        Self { client }
    }

    /// Create the index with the article mapping if it does not exist yet.
    pub async fn create_index(&self) -> DomainResult<bool> {
        self.client.ensure_index(article_index_mappings()).await
    }

    fn index(&self) -> &str {
        self.client.index()
    }

    fn refresh(&self) -> RefreshPolicy {
        self.client.config().refresh()
    }
}

fn to_source(article: &Article) -> DomainResult<Value> {
    serde_json::to_value(article)
        .map_err(|err| DomainError::persistence(format!("cannot encode article: {err}")))
}

fn decode_document(id: &str, source: &Value) -> DomainResult<Article> {
    let article: Article = serde_json::from_value(source.clone())
        .map_err(|err| DomainError::persistence(format!("cannot decode article {id}: {err}")))?;
    Ok(article.assign_id(ArticleId::new(id)?))
}

fn response_id(response: &Value) -> DomainResult<ArticleId> {
    let id = response["_id"]
        .as_str()
        .ok_or_else(|| DomainError::persistence("index response carries no _id"))?;
    ArticleId::new(id)
}

pub(crate) fn search_body(request: &SearchRequest) -> Value {
    let page = request.effective_page();
    let mut body = json!({
        "query": request.query().to_json(),
        "from": page.offset(),
        "size": page.size(),
        "track_total_hits": true,
    });
    if let Some(filter) = request.post_filter() {
        body["post_filter"] = filter.to_json();
    }
    body
}

pub(crate) fn parse_search_response(response: &Value) -> DomainResult<SearchHits<Article>> {
    let hits = &response["hits"];
    // `total` is an object since 7.x and a bare number before that.
    let total = match &hits["total"] {
        Value::Number(n) => n.as_u64(),
        total => total["value"].as_u64(),
    }
    .ok_or_else(|| DomainError::persistence("search response carries no total"))?;

    let entries = hits["hits"].as_array().map(Vec::as_slice).unwrap_or_default();
    let mut decoded = Vec::with_capacity(entries.len());
    for entry in entries {
        let id = entry["_id"]
            .as_str()
            .ok_or_else(|| DomainError::persistence("search hit carries no _id"))?;
        decoded.push(SearchHit {
            id: id.to_string(),
            score: entry["_score"].as_f64(),
            content: decode_document(id, &entry["_source"])?,
        });
    }

    Ok(SearchHits::new(total, hits["max_score"].as_f64(), decoded))
}

#[async_trait]
impl ArticleRepository for ElasticsearchArticleRepository {
    async fn save(&self, article: Article) -> DomainResult<Article> {
        let source = to_source(&article)?;
        let refresh = [("refresh", self.refresh().as_param())];

        match article.id() {
            None => {
                let url = self.client.url(&[self.index(), "_doc"], &refresh)?;
                let response = self
                    .client
                    .send(self.client.request(Method::POST, url).json(&source))
                    .await?;
                let id = response_id(&response)?;
                tracing::debug!(index = self.index(), id = id.as_str(), "indexed new article");
                Ok(article.assign_id(id))
            }
            Some(id) => {
                let url = self
                    .client
                    .url(&[self.index(), "_doc", id.as_str()], &refresh)?;
                self.client
                    .send(self.client.request(Method::PUT, url).json(&source))
                    .await?;
                tracing::debug!(index = self.index(), id = id.as_str(), "replaced article");
                Ok(article)
            }
        }
    }

    async fn find_by_id(&self, id: &ArticleId) -> DomainResult<Option<Article>> {
        let url = self.client.url(&[self.index(), "_doc", id.as_str()], &[])?;
        let Some(response) = self
            .client
            .send_allow_missing(self.client.request(Method::GET, url))
            .await?
        else {
            return Ok(None);
        };
        if response["found"] == Value::Bool(false) {
            return Ok(None);
        }
        decode_document(id.as_str(), &response["_source"]).map(Some)
    }

    async fn exists_by_id(&self, id: &ArticleId) -> DomainResult<bool> {
        let url = self
            .client
            .url(&[self.index(), "_doc", id.as_str()], &[("_source", "false")])?;
        let response = self
            .client
            .send_allow_missing(self.client.request(Method::GET, url))
            .await?;
        Ok(response.is_some_and(|doc| doc["found"].as_bool().unwrap_or(true)))
    }

    async fn count(&self) -> DomainResult<u64> {
        let url = self.client.url(&[self.index(), "_count"], &[])?;
        let response = self
            .client
            .send(self.client.request(Method::GET, url))
            .await?;
        response["count"]
            .as_u64()
            .ok_or_else(|| DomainError::persistence("count response carries no count"))
    }

    async fn delete_by_id(&self, id: &ArticleId) -> DomainResult<()> {
        let url = self.client.url(
            &[self.index(), "_doc", id.as_str()],
            &[("refresh", self.refresh().as_param())],
        )?;
        let response = self
            .client
            .send_allow_missing(self.client.request(Method::DELETE, url))
            .await?;
        if response.is_none() {
            tracing::warn!(index = self.index(), id = id.as_str(), "delete of unknown article ignored");
        }
        Ok(())
    }

    async fn delete_all(&self) -> DomainResult<()> {
        // _delete_by_query has no wait_for mode.
        let refresh = match self.refresh() {
            RefreshPolicy::None => "false",
            RefreshPolicy::Immediate | RefreshPolicy::WaitFor => "true",
        };
        let url = self.client.url(
            &[self.index(), "_delete_by_query"],
            &[("refresh", refresh), ("conflicts", "proceed")],
        )?;
        let body = json!({ "query": { "match_all": {} } });
        let response = self
            .client
            .send(self.client.request(Method::POST, url).json(&body))
            .await?;
        tracing::debug!(
            index = self.index(),
            deleted = response["deleted"].as_u64().unwrap_or_default(),
            "deleted all articles"
        );
        Ok(())
    }

    async fn search(&self, request: &SearchRequest) -> DomainResult<SearchHits<Article>> {
        let url = self.client.url(&[self.index(), "_search"], &[])?;
        let body = search_body(request);
        let response = self
            .client
            .send(self.client.request(Method::POST, url).json(&body))
            .await?;
        parse_search_response(&response)
    }
}
