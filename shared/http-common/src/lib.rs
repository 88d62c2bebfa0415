//! Shared HTTP utilities for the URL shortener workspace.
//!
//! Provides the JSON error bodies and short URL rendering used by HTTP
//! surfaces that sit in front of the mapping core.

// ============================================================================
// JSON Response Helpers (framework-agnostic)
// ============================================================================

/// Create a structured error JSON with a default message based on the code.
///
/// Returns: `{"error": {"code": "<code>", "message": "<default message>"}}`
pub fn json_err(code: &str) -> serde_json::Value {
    let message = match code {
        "not_found" => "No URL is stored under this short code",
        "empty_url" => "Please enter a URL",
        "invalid_url" => "Please enter a valid http or https URL",
        "invalid_code" => "Short codes are exactly 6 characters",
        "unredirectable_url" => "Stored URL cannot be sent as a redirect; look it up via /api/resolve",
        "error" => "Internal server error",
        _ => code, // Fallback to code as message for unknown codes
    };
    serde_json::json!({"error": {"code": code, "message": message}})
}

/// Create a structured error JSON with a custom message.
///
/// Returns: `{"error": {"code": "<code>", "message": "<message>"}}`
pub fn json_error_with_message(code: &str, message: &str) -> serde_json::Value {
    serde_json::json!({"error": {"code": code, "message": message}})
}

// ============================================================================
// Short URL Rendering
// ============================================================================

/// Build the public short URL for a code.
///
/// Uses `base` (e.g. a configured shortlink domain) when present and non-empty,
/// otherwise `https://{host}/{code}`, or `/{code}` if host is empty.
pub fn build_short_url(base: Option<&str>, host: &str, code: &str) -> String {
    if let Some(dom) = base.filter(|d| !d.is_empty()) {
        return format!("{}/{}", dom.trim_end_matches('/'), code);
    }
    if host.is_empty() {
        format!("/{}", code)
    } else {
        format!("https://{}/{}", host, code)
    }
}
