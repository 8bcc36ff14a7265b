use crate::domain::errors::DomainError;
use reqwest::StatusCode;
use serde_json::Value;

const ERR_PARSING: &str = "parsing_exception";
const ERR_X_CONTENT_PARSE: &str = "x_content_parse_exception";
const ERR_QUERY_SHARD: &str = "query_shard_exception";
const ERR_SEARCH_PHASE: &str = "search_phase_execution_exception";
const ERR_INDEX_NOT_FOUND: &str = "index_not_found_exception";

pub fn map_reqwest(err: reqwest::Error) -> DomainError {
    if err.is_connect() || err.is_timeout() || err.is_request() {
        return DomainError::Connectivity(err.to_string());
    }
    if err.is_decode() || err.is_body() {
        return DomainError::Persistence(format!("unreadable engine response: {err}"));
    }
    DomainError::Persistence(err.to_string())
}

/// Translate an engine error response.
///
/// Engine errors look like `{"error": {"type": ..., "reason": ..., "root_cause": [...]}, "status": 400}`;
/// very old engines and proxies may send a plain string instead.
pub fn map_engine_error(status: StatusCode, body: &str) -> DomainError {
    let (kind, reason, root_kinds) = match serde_json::from_str::<Value>(body) {
        Ok(json) => describe(&json["error"]),
        Err(_) => (String::new(), body.trim().to_string(), Vec::new()),
    };

    let malformed = [kind.as_str()]
        .into_iter()
        .chain(root_kinds.iter().map(String::as_str))
        .any(|k| matches!(k, ERR_PARSING | ERR_X_CONTENT_PARSE | ERR_QUERY_SHARD));
    if malformed && status == StatusCode::BAD_REQUEST {
        return DomainError::MalformedQuery(reason);
    }

    if status == StatusCode::NOT_FOUND && kind == ERR_INDEX_NOT_FOUND {
        return DomainError::NotFound(reason);
    }

    let kind = if kind.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unknown")
            .to_ascii_lowercase()
            .replace(' ', "_")
    } else {
        kind
    };
    DomainError::Engine {
        status: status.as_u16(),
        kind,
        reason,
    }
}

fn describe(error: &Value) -> (String, String, Vec<String>) {
    match error {
        Value::Object(details) => {
            let kind = details
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let reason = details
                .get("reason")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let root_kinds = details
                .get("root_cause")
                .and_then(Value::as_array)
                .map(|causes| {
                    causes
                        .iter()
                        .filter_map(|cause| cause["type"].as_str())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            let reason = if reason.is_empty() && kind == ERR_SEARCH_PHASE {
                "all shards failed".to_string()
            } else {
                reason
            };
            (kind, reason, root_kinds)
        }
        Value::String(reason) => (String::new(), reason.clone(), Vec::new()),
        _ => (String::new(), String::new(), Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_failures_are_malformed_queries() {
        let body = json!({
            "error": {
                "root_cause": [{ "type": "parsing_exception", "reason": "unknown query [geo]" }],
                "type": "parsing_exception",
                "reason": "unknown query [geo]"
            },
            "status": 400
        });
        let err = map_engine_error(StatusCode::BAD_REQUEST, &body.to_string());
        assert!(matches!(err, DomainError::MalformedQuery(reason) if reason == "unknown query [geo]"));
    }

    #[test]
    fn shard_failures_with_query_root_cause_are_malformed() {
        let body = json!({
            "error": {
                "root_cause": [{ "type": "query_shard_exception", "reason": "failed to create query" }],
                "type": "search_phase_execution_exception",
                "reason": ""
            },
            "status": 400
        });
        let err = map_engine_error(StatusCode::BAD_REQUEST, &body.to_string());
        assert!(matches!(err, DomainError::MalformedQuery(reason) if reason == "all shards failed"));
    }

    #[test]
    fn missing_index_is_not_found() {
        let body = json!({
            "error": { "type": "index_not_found_exception", "reason": "no such index [blog]" },
            "status": 404
        });
        let err = map_engine_error(StatusCode::NOT_FOUND, &body.to_string());
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn other_faults_keep_status_and_kind() {
        let body = json!({
            "error": { "type": "cluster_block_exception", "reason": "index read-only" },
            "status": 429
        });
        let err = map_engine_error(StatusCode::TOO_MANY_REQUESTS, &body.to_string());
        match err {
            DomainError::Engine { status, kind, reason } => {
                assert_eq!(status, 429);
                assert_eq!(kind, "cluster_block_exception");
                assert_eq!(reason, "index read-only");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn non_json_bodies_are_kept_verbatim() {
        let err = map_engine_error(StatusCode::BAD_GATEWAY, "upstream timed out\n");
        match err {
            DomainError::Engine { status, kind, reason } => {
                assert_eq!(status, 502);
                assert_eq!(kind, "bad_gateway");
                assert_eq!(reason, "upstream timed out");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
