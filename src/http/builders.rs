use serde_json::Value;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::auth::AuthToken;
use crate::context::{Context, scalar_text};

use super::EndpointDescriptor;
use super::transport::OutboundRequest;

/// Bytes left as-is in query keys and values: alphanumerics plus
/// `-_.!~*'()`, so a space goes out as `%20`.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Everything the client contributes to a request besides the descriptor.
pub(super) struct RequestParts<'parts> {
    pub(super) base_url: &'parts str,
    pub(super) default_headers: &'parts [(String, String)],
    pub(super) token: Option<&'parts AuthToken>,
    pub(super) context: &'parts Context,
}

pub(super) fn build_request(
    endpoint: &EndpointDescriptor,
    parts: &RequestParts<'_>,
) -> OutboundRequest {
    let context = parts.context;
    let mut path = endpoint.url().resolve(context);

    let path_params: Vec<(&str, Option<String>)> = endpoint
        .path_params()
        .iter()
        .map(|(key, value)| (key.as_str(), scalar_text(&value.resolve(context))))
        .collect();
    path = substitute_path_params(&path, &path_params);

    let mut query: Vec<(String, String)> = Vec::with_capacity(endpoint.query_params().len());
    for (key, value) in endpoint.query_params() {
        let resolved = value.resolve(context);
        match scalar_text(&resolved) {
            Some(text) => query.push((key.clone(), text)),
            None => tracing::debug!(
                "{}: query parameter '{}' resolved to null, skipped",
                endpoint.name(),
                key
            ),
        }
    }
    if let Some((key, value)) = parts.token.and_then(AuthToken::query_pair) {
        query.push((key.to_owned(), value.to_owned()));
    }
    append_query(&mut path, &query);

    let mut headers = parts.default_headers.to_vec();
    if let Some((key, value)) = parts.token.and_then(AuthToken::header) {
        merge_header(&mut headers, key, value);
    }
    for (key, value) in endpoint.headers() {
        merge_header(&mut headers, key.clone(), value.clone());
    }

    let body = if endpoint.method().carries_body() {
        endpoint
            .body()
            .map(|body| body.resolve(context))
            .map(|body| serialize_body(&body))
    } else {
        None
    };

    OutboundRequest {
        method: endpoint.method(),
        url: join_url(parts.base_url, &path),
        headers,
        body,
    }
}

/// Prefixes `path` with `base_url` unless it is already absolute.
pub(crate) fn join_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_owned();
    }
    let mut url = String::with_capacity(base_url.len().saturating_add(path.len()));
    url.push_str(base_url);
    url.push_str(path);
    url
}

/// Replaces `{key}` placeholders. Parameters without a placeholder are a
/// no-op; parameters without a value leave their placeholder literal.
pub(super) fn substitute_path_params(url: &str, params: &[(&str, Option<String>)]) -> String {
    let mut output = url.to_owned();
    for (key, value) in params {
        let Some(value) = value else {
            continue;
        };
        let placeholder = format!("{{{}}}", key);
        if output.contains(&placeholder) {
            output = output.replace(&placeholder, value);
        }
    }
    output
}

/// Appends percent-encoded pairs with `?` or `&` depending on whether the
/// URL already carries a query string.
pub(super) fn append_query(url: &mut String, pairs: &[(String, String)]) {
    if pairs.is_empty() {
        return;
    }
    let encoded = pairs
        .iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                utf8_percent_encode(key, QUERY_COMPONENT),
                utf8_percent_encode(value, QUERY_COMPONENT)
            )
        })
        .collect::<Vec<_>>()
        .join("&");
    url.push(if url.contains('?') { '&' } else { '?' });
    url.push_str(&encoded);
}

/// Sets a header, replacing any earlier entry whose name matches ASCII
/// case-insensitively.
pub(super) fn merge_header(headers: &mut Vec<(String, String)>, key: String, value: String) {
    headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(&key));
    headers.push((key, value));
}

fn serialize_body(body: &Value) -> String {
    body.to_string()
}
