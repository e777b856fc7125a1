//! Limit/offset envelope: `{count, next, previous, results}`.
//!
//! `next` / `previous` are absolute URLs built from the request URI and the
//! `Host` header; every query parameter other than `limit` / `offset` is
//! carried over unchanged.

use axum::http::{HeaderMap, Uri, header};
use serde::Serialize;
use url::Url;

use stockroom_core::{LimitOffset, Page};

#[derive(Debug, Serialize)]
pub struct PageEnvelope<T> {
    pub count: usize,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// Query-string window, lenient about bad values.
pub fn window_from_uri(uri: &Uri, default_limit: usize) -> LimitOffset {
    let pairs: Vec<(String, String)> = uri
        .query()
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default();
    let get = |name: &str| pairs.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str());
    LimitOffset::from_query(get("limit"), get("offset"), default_limit)
}

pub fn envelope<T>(page: Page<T>, uri: &Uri, headers: &HeaderMap) -> PageEnvelope<T> {
    let base = request_url(uri, headers);
    let window = page.window;

    let next = base
        .as_ref()
        .and_then(|url| {
            window
                .next_offset(page.count)
                .map(|o| with_window(url, window.limit, Some(o)))
        });
    let previous = base.as_ref().and_then(|url| {
        window
            .previous_offset()
            .map(|o| with_window(url, window.limit, (o > 0).then_some(o)))
    });

    PageEnvelope {
        count: page.count,
        next,
        previous,
        results: page.items,
    }
}

fn request_url(uri: &Uri, headers: &HeaderMap) -> Option<Url> {
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| uri.authority().map(|a| a.as_str()))
        .unwrap_or("localhost");
    let scheme = uri.scheme_str().unwrap_or("http");
    let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    Url::parse(&format!("{scheme}://{host}{path_and_query}")).ok()
}

/// `url` with `limit` set and `offset` set or removed.
fn with_window(url: &Url, limit: usize, offset: Option<usize>) -> String {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "limit" && k != "offset")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut out = url.clone();
    {
        let mut query = out.query_pairs_mut();
        query.clear();
        query.extend_pairs(kept);
        query.append_pair("limit", &limit.to_string());
        if let Some(offset) = offset {
            query.append_pair("offset", &offset.to_string());
        }
    }
    out.into()
}
