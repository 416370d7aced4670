/// Utility helpers used by all collectors.
///
/// This module contains:
/// - Date rendering for label values
/// - Sentinel-date translation
/// - Upstream endpoint normalization
///
/// IMPORTANT:
/// - No collector-specific logic should live here.
/// - This module must remain lightweight and deterministic.
///

use chrono::NaiveDate;

/// Upstream marker for "date not available".
pub const SENTINEL_DATE: &str = "1929-10-24";

/// Label value used in place of the sentinel date.
pub const UNKNOWN_DATE: &str = "unknown";

/// Canonical date layout used for labels and upstream payloads.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Render a date for use as a label value.
///
/// Examples:
/// - Some(2019-08-09) -> "2019-08-09"
/// - Some(1929-10-24) -> "unknown"
/// - None             -> "unknown"
///
pub fn date_label(date: Option<NaiveDate>) -> String {
    match date {
        Some(d) => unknown_if_sentinel(d.format(DATE_FORMAT).to_string()),
        None => UNKNOWN_DATE.to_string(),
    }
}

/// Replace the literal sentinel date with `"unknown"`.
///
/// Any other value is passed through untouched.
pub fn unknown_if_sentinel(rendered: String) -> String {
    if rendered == SENTINEL_DATE {
        UNKNOWN_DATE.to_string()
    } else {
        rendered
    }
}

/// Build the API base URL from endpoint and version flags.
///
/// Input:
/// - endpoint: bare host ("sandbox.iexapis.com") or full URL
/// - version:  API version segment ("stable", "v1")
///
/// Output:
/// - "https://sandbox.iexapis.com/stable/" for bare hosts
/// - the endpoint verbatim (with a trailing slash) when it already
///   carries a scheme
///
pub fn base_url(endpoint: &str, version: &str) -> String {
    let mut url = if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!(
            "https://{}/{}/",
            endpoint.trim_end_matches('/'),
            version.trim_matches('/')
        )
    };

    if !url.ends_with('/') {
        url.push('/');
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_becomes_unknown() {
        let sentinel = NaiveDate::from_ymd_opt(1929, 10, 24);
        assert_eq!(date_label(sentinel), "unknown");
        assert_eq!(date_label(None), "unknown");
    }

    #[test]
    fn regular_dates_render_canonically() {
        let d = NaiveDate::from_ymd_opt(2019, 8, 9);
        assert_eq!(date_label(d), "2019-08-09");
        assert_eq!(unknown_if_sentinel("2020-01-01".into()), "2020-01-01");
    }

    #[test]
    fn base_url_for_bare_host() {
        assert_eq!(
            base_url("sandbox.iexapis.com", "stable"),
            "https://sandbox.iexapis.com/stable/"
        );
    }

    #[test]
    fn base_url_keeps_full_urls() {
        assert_eq!(
            base_url("http://127.0.0.1:8080/stable", "ignored"),
            "http://127.0.0.1:8080/stable/"
        );
    }
}
