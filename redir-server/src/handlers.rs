//! Request handlers. Each one only adapts an `actix-web` request into
//! `redir-core`'s framework-agnostic types, calls `Engine::make_redir`, and
//! translates the `Outcome` back into an `HttpResponse`.

use std::collections::HashMap;
use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse};
use arc_swap::ArcSwap;
use redir_core::engine::{Engine, Outcome, RequestContext};
use redir_core::headers::HeaderBag;
use url::Url;

fn header_bag(req: &HttpRequest) -> HeaderBag {
    let mut bag = HeaderBag::new();
    for (name, value) in req.headers().iter() {
        if let Ok(v) = value.to_str() {
            bag.insert(name.as_str(), v);
        }
    }
    bag
}

fn query_map(req: &HttpRequest) -> HashMap<String, String> {
    web::Query::<HashMap<String, String>>::from_query(req.query_string())
        .map(|q| q.into_inner())
        .unwrap_or_default()
}

fn outcome_to_response(outcome: Outcome) -> HttpResponse {
    match outcome {
        Outcome::Redirect { location, code } => {
            let status = StatusCode::from_u16(code).unwrap_or(StatusCode::TEMPORARY_REDIRECT);
            HttpResponse::build(status)
                .append_header(("Location", location))
                .finish()
        }
        Outcome::NotFound => HttpResponse::NotFound().finish(),
    }
}

pub async fn options() -> HttpResponse {
    HttpResponse::NoContent()
        .append_header(("Allow", "GET, HEAD, OPTIONS"))
        .finish()
}

/// `GET|HEAD /{path:.*}`: resolve the request's own path against the host
/// derived from request headers.
pub async fn path_redirect(
    req: HttpRequest,
    engine: web::Data<Arc<ArcSwap<Engine>>>,
    default_proto: web::Data<String>,
) -> HttpResponse {
    let headers = header_bag(&req);
    let query = query_map(&req);
    let path = format!("/{}", req.match_info().get("path").unwrap_or(""));

    let ctx = RequestContext {
        headers: &headers,
        path: &path,
        query: &query,
        raw_query: req.query_string(),
        default_proto: &default_proto,
        iri_host: None,
    };

    outcome_to_response(engine.load().make_redir(&ctx))
}

/// `GET|HEAD /redir`: resolve an out-of-band IRI passed as `?iri=...`
/// (or the legacy `?_pid=...` alias), forwarding every other query
/// parameter through to the matched rule untouched.
pub async fn redir(
    req: HttpRequest,
    engine: web::Data<Arc<ArcSwap<Engine>>>,
    default_proto: web::Data<String>,
) -> HttpResponse {
    let headers = header_bag(&req);
    let mut query = query_map(&req);

    // `iri` is retained in the forwarded query params; `_pid` is consumed.
    let raw_iri = match query.get("iri").cloned() {
        Some(iri) => Some(iri),
        None => query.remove("_pid"),
    };

    let Some(raw_iri) = raw_iri else {
        return HttpResponse::BadRequest().body("missing 'iri' query parameter");
    };

    let parsed = match Url::parse(&raw_iri) {
        Ok(u) if u.host_str().is_some() => u,
        _ => return HttpResponse::BadRequest().body("'iri' is not a well-formed absolute URL"),
    };

    let host = parsed.host_str().unwrap().to_string();
    let path = parsed.path().to_string();
    let raw_query = parsed.query().unwrap_or("").to_string();

    let mut combined_query: HashMap<String, String> = url::form_urlencoded::parse(raw_query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    combined_query.extend(query);

    let combined_raw_query = combined_query
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let ctx = RequestContext {
        headers: &headers,
        path: &path,
        query: &combined_query,
        raw_query: &combined_raw_query,
        default_proto: parsed.scheme(),
        iri_host: Some(&host),
    };

    let _ = &default_proto;
    outcome_to_response(engine.load().make_redir(&ctx))
}
