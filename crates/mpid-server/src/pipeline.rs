//! The personalization pipeline run over every page response.
//!
//! ```text
//! START -> EXTRACT_PARAMS -> STRIP_ONLY ---------------> DONE
//!                        \-> LOOKUP_AND_REWRITE -------> DONE
//! any failure ------------------------------------------> ERROR (500)
//! ```
//!
//! Exactly one of the two body mutations runs per response.

use axum::body::{to_bytes, Body};
use axum::http::header::CONTENT_LENGTH;
use axum::http::response::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures::future::try_join_all;
use mpid_catalog::CatalogError;
use mpid_core::params::{integer_prefix, placeholder_substitution_allowed};
use mpid_core::{extract_parameters, BrandCode, CoreError, RequestContext, PLACEHOLDER_TOKEN};
use thiserror::Error;

use crate::app::AppState;
use crate::rewrite::{count_matches, inject_widgets, RewriteError};
use crate::widget::{render_widget, Widget};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Request(#[from] CoreError),

    #[error("failed to read response body: {0}")]
    Body(#[from] axum::Error),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Rewrite(#[from] RewriteError),
}

/// Run the pipeline, converting any failure into a 500 whose body names the
/// error. No part of the original page is sent in that case.
pub async fn personalize(
    state: &AppState,
    context: Result<RequestContext, CoreError>,
    response: Response,
) -> Response {
    match run(state, context, response).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "personalization pipeline failed");
            error_response(&e)
        }
    }
}

async fn run(
    state: &AppState,
    context: Result<RequestContext, CoreError>,
    response: Response,
) -> Result<Response, PipelineError> {
    let context = context?;
    let params = extract_parameters(context.url());

    let (parts, body) = response.into_parts();
    let bytes = to_bytes(body, usize::MAX).await?;
    let original_len = bytes.len();
    let html = match String::from_utf8(Vec::from(bytes)) {
        Ok(html) => html,
        Err(e) => {
            tracing::debug!("response body is not UTF-8; passing through");
            return Ok(rebuild(parts, original_len, e.into_bytes()));
        }
    };

    let tracking_id = match params.tracking_id.as_deref() {
        Some(id) if params.should_rewrite() => id,
        _ => {
            tracing::debug!(
                has_params = params.has_params,
                query = %params.normalized_query,
                "no tracking id; stripping placeholder"
            );
            return Ok(rebuild(parts, original_len, strip_placeholder(&html)));
        }
    };

    let host = context.host();
    let brand = state.brands.resolve_brand(&host);
    let store_group_id = state.brands.resolve_store_group_id(&host, brand);
    tracing::debug!(%brand, store_group_id, tracking_id, "personalizing page");

    let html = substitute_placeholder(&html, tracking_id);

    let selector = container_selector(brand);
    let containers = count_matches(&html, &selector)?;
    if containers == 0 {
        return Ok(rebuild(parts, original_len, html));
    }

    let credentials = state.credentials.get(&brand);
    let lookups = (0..containers).map(|_| {
        state
            .catalog
            .fetch_product(brand, store_group_id, tracking_id, credentials)
    });
    let records = try_join_all(lookups).await?;

    let site_url = state.brands.site_url(brand, store_group_id)?;
    let widgets: Vec<Option<Widget>> = records
        .iter()
        .map(|record| record.as_ref().map(|r| render_widget(r, &site_url)))
        .collect();

    let html = inject_widgets(&html, &selector, &widgets)?;
    Ok(rebuild(parts, original_len, html))
}

/// `div#cloudflare_{brand}_container_placeholder`, brand code lower-cased.
#[must_use]
pub fn container_selector(brand: BrandCode) -> String {
    format!(
        "div#cloudflare_{}_container_placeholder",
        brand.as_str().to_lowercase()
    )
}

/// Remove every placeholder token.
#[must_use]
pub fn strip_placeholder(html: &str) -> String {
    html.replace(PLACEHOLDER_TOKEN, "")
}

/// Replace every placeholder token with `&mpid={n}`, where `n` is the
/// tracking id's leading integer as written, provided the id passes the
/// substitution check; otherwise return the body unchanged.
///
/// Anything after the integer never reaches the page.
#[must_use]
pub fn substitute_placeholder(html: &str, tracking_id: &str) -> String {
    let Some(id) = integer_prefix(tracking_id)
        .filter(|_| placeholder_substitution_allowed(tracking_id))
    else {
        return html.to_owned();
    };
    html.replace(PLACEHOLDER_TOKEN, &format!("&mpid={id}"))
}

/// Reassemble the response around `body`. `Content-Length` is dropped only
/// when the body length changed; a HEAD response keeps the length of the
/// representation it describes.
fn rebuild<B>(mut parts: Parts, original_len: usize, body: B) -> Response
where
    B: AsRef<[u8]> + Into<Body>,
{
    if body.as_ref().len() != original_len {
        parts.headers.remove(CONTENT_LENGTH);
    }
    Response::from_parts(parts, body.into())
}

fn error_response(error: &PipelineError) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Error: {error}"),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_selector_lowercases_brand() {
        assert_eq!(
            container_selector(BrandCode::Sx),
            "div#cloudflare_sx_container_placeholder"
        );
    }

    #[test]
    fn strip_removes_every_token() {
        let html = "<a href=\"/x?a=1&CLOUDFLARE_MPID\">x</a><a href=\"/y?&CLOUDFLARE_MPID\">y</a>";
        assert_eq!(
            strip_placeholder(html),
            "<a href=\"/x?a=1\">x</a><a href=\"/y?\">y</a>"
        );
    }

    #[test]
    fn strip_without_token_is_identity() {
        let html = "<p>&amp; CLOUDFLARE_MPID</p>";
        assert_eq!(strip_placeholder(html), html);
    }

    #[test]
    fn substitute_replaces_every_token() {
        let html = "a&CLOUDFLARE_MPID b&CLOUDFLARE_MPID";
        assert_eq!(
            substitute_placeholder(html, "123456"),
            "a&mpid=123456 b&mpid=123456"
        );
    }

    #[test]
    fn substitute_skips_ids_failing_second_check() {
        let html = "a&CLOUDFLARE_MPID";
        assert_eq!(substitute_placeholder(html, "1234"), html);
        assert_eq!(substitute_placeholder(html, "x23456"), html);
    }

    #[test]
    fn substitute_emits_only_the_leading_integer() {
        let html = r#"<a href="/s?x=1&CLOUDFLARE_MPID">go</a>"#;
        assert_eq!(
            substitute_placeholder(html, "123456\"><script>alert(1)</script>"),
            r#"<a href="/s?x=1&mpid=123456">go</a>"#
        );
        assert_eq!(
            substitute_placeholder(html, "123456abc"),
            r#"<a href="/s?x=1&mpid=123456">go</a>"#
        );
    }

    fn parts_with_length(length: &str) -> Parts {
        let (parts, ()) = axum::http::Response::builder()
            .header(CONTENT_LENGTH, length)
            .body(())
            .expect("response parts")
            .into_parts();
        parts
    }

    #[test]
    fn rebuild_keeps_length_of_unchanged_body() {
        let response = rebuild(parts_with_length("5"), 5, "hello".to_string());
        assert_eq!(response.headers()[CONTENT_LENGTH], "5");
    }

    #[test]
    fn rebuild_keeps_length_of_empty_head_body() {
        let response = rebuild(parts_with_length("1024"), 0, String::new());
        assert_eq!(response.headers()[CONTENT_LENGTH], "1024");
    }

    #[test]
    fn rebuild_drops_stale_length() {
        let response = rebuild(parts_with_length("5"), 5, "hello world".to_string());
        assert!(response.headers().get(CONTENT_LENGTH).is_none());
    }

    #[test]
    fn error_response_is_500_with_description() {
        let error = PipelineError::Catalog(CatalogError::MissingCredentials(BrandCode::Fl));
        let response = error_response(&error);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
