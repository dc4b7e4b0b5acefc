// SPDX-License-Identifier: MIT OR Apache-2.0
//! Request helpers shared by the vendor HTTP clients.

use agentkit_error::{AgentkitError, ErrorCode, Result};
use serde::de::DeserializeOwned;

use crate::cancel::{CancelToken, run_cancellable};

/// Send `request`, honouring `cancel`, and fail on non-success statuses.
///
/// Transport failures become `VENDOR_TRANSPORT`; non-2xx answers become
/// `VENDOR_STATUS` with the status in context and the body in the message.
pub async fn send(
    request: reqwest::RequestBuilder,
    cancel: &CancelToken,
) -> Result<reqwest::Response> {
    let response = run_cancellable(cancel, async {
        request.send().await.map_err(transport_error)
    })
    .await?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AgentkitError::vendor_status(status.as_u16(), body))
}

/// Read a JSON body.
pub async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
    cancel: &CancelToken,
) -> Result<T> {
    let text = run_cancellable(cancel, async {
        response.text().await.map_err(transport_error)
    })
    .await?;
    serde_json::from_str(&text).map_err(|e| {
        AgentkitError::new(
            ErrorCode::VendorResponseInvalid,
            format!("invalid JSON response: {e}"),
        )
        .with_source(e)
    })
}

/// Send and decode in one step.
pub async fn send_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
    cancel: &CancelToken,
) -> Result<T> {
    let response = send(request, cancel).await?;
    read_json(response, cancel).await
}

/// Wrap a `reqwest` failure.
pub fn transport_error(err: reqwest::Error) -> AgentkitError {
    let message = format!("request failed: {err}");
    let mut out = AgentkitError::new(ErrorCode::VendorTransport, message);
    if let Some(status) = err.status() {
        out = out.with_context("status", status.as_u16());
    }
    out.with_source(err)
}

/// Join a base URL and a path without doubling slashes.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Percent-encode `segment` for use as one URL path segment.
pub fn encode_segment(segment: &str) -> String {
    let Ok(mut url) = reqwest::Url::parse("http://x/") else {
        return segment.to_owned();
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push(segment);
    }
    url.path().trim_start_matches('/').to_owned()
}
