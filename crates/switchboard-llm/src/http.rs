use switchboard_types::SwitchboardError;

use crate::Provider;

// ---------------------------------------------------------------------------
// Request execution
// ---------------------------------------------------------------------------

/// Send a prepared JSON request and decode the body. Non-2xx statuses are
/// mapped through [`map_error`].
pub(crate) async fn send_json(
    provider: Provider,
    request: reqwest::RequestBuilder,
    body: &serde_json::Value,
) -> Result<serde_json::Value, SwitchboardError> {
    let resp = request
        .header("Content-Type", "application/json")
        .json(body)
        .send()
        .await
        .map_err(|e| transport_error(provider, e))?;

    let status = resp.status();
    let response_body = resp.text().await.map_err(|e| transport_error(provider, e))?;

    if !status.is_success() {
        return Err(map_error(provider, status, &response_body));
    }

    serde_json::from_str(&response_body).map_err(|e| SwitchboardError::ProviderError {
        provider: provider.to_string(),
        status: status.as_u16(),
        message: format!("Failed to parse response JSON: {e}"),
    })
}

fn transport_error(provider: Provider, e: reqwest::Error) -> SwitchboardError {
    SwitchboardError::ProviderError {
        provider: provider.to_string(),
        status: 0,
        message: e.to_string(),
    }
}

/// Trim a trailing slash so `{base}/path` joins cleanly.
pub(crate) fn normalize_base_url(url: impl Into<String>) -> String {
    let url = url.into();
    url.trim_end_matches('/').to_string()
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

pub(crate) fn map_error(
    provider: Provider,
    status: reqwest::StatusCode,
    body: &str,
) -> SwitchboardError {
    let status_u16 = status.as_u16();
    match status_u16 {
        429 => {
            let retry_ms = serde_json::from_str::<serde_json::Value>(body)
                .ok()
                .and_then(|v| v["error"]["retry_after"].as_f64())
                .map(|s| (s * 1000.0) as u64)
                .unwrap_or(1000);
            SwitchboardError::RateLimited {
                provider: provider.to_string(),
                retry_after_ms: retry_ms,
            }
        }
        401 | 403 => SwitchboardError::AuthError {
            provider: provider.to_string(),
        },
        _ => SwitchboardError::ProviderError {
            provider: provider.to_string(),
            status: status_u16,
            message: extract_error_message(body),
        },
    }
}

fn extract_error_message(body: &str) -> String {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    parsed
        .as_ref()
        .and_then(|v| {
            v["error"]["message"]
                .as_str()
                .or_else(|| v["message"].as_str())
                .or_else(|| v["error"].as_str())
        })
        .map(String::from)
        .unwrap_or_else(|| body.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
