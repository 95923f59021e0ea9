use crate::domain::schema::ColumnSchema;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, ORIGIN, REFERER, USER_AGENT};
use serde_json::{json, Value};

pub const DEFAULT_BASE_URL: &str = "https://scanner.tradingview.com";
pub const DEFAULT_MARKET: &str = "america";
pub const DEFAULT_LIMIT: u32 = 100;

const TRADINGVIEW_ORIGIN: &str = "https://www.tradingview.com";
const TRADINGVIEW_REFERER: &str = "https://www.tradingview.com/";
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

pub const SCAN_QUERY: [(&str, &str); 1] = [("label-product", "popup-screener-stock")];

pub fn scan_url(base_url: &str, market: &str) -> String {
    format!(
        "{}/{}/scan",
        base_url.trim_end_matches('/'),
        market.trim_matches('/')
    )
}

pub fn scan_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain;charset=UTF-8"),
    );
    headers.insert(ORIGIN, HeaderValue::from_static(TRADINGVIEW_ORIGIN));
    headers.insert(REFERER, HeaderValue::from_static(TRADINGVIEW_REFERER));
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers
}

/// Scan body asking for the schema's columns, largest market caps first.
pub fn scan_body(schema: &ColumnSchema, market: &str, limit: u32) -> Value {
    json!({
        "columns": schema.columns(),
        "filter": [
            {"left": "is_primary", "operation": "equal", "right": true},
        ],
        "ignore_unknown_fields": false,
        "options": {"lang": "en"},
        "range": [0, limit],
        "sort": {"sortBy": "market_cap_basic", "sortOrder": "desc"},
        "symbols": {},
        "markets": [market],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_scan_url_without_double_slashes() {
        assert_eq!(
            scan_url("https://scanner.tradingview.com/", "/america/"),
            "https://scanner.tradingview.com/america/scan"
        );
    }

    #[test]
    fn body_requests_schema_columns_in_order() {
        let schema = ColumnSchema::parse_list("name,close,Recommend.All").unwrap();
        let body = scan_body(&schema, "america", 25);
        assert_eq!(body["columns"], json!(["name", "close", "Recommend.All"]));
        assert_eq!(body["range"], json!([0, 25]));
        assert_eq!(body["markets"], json!(["america"]));
    }

    #[test]
    fn headers_identify_as_browser_client() {
        let headers = scan_headers();
        assert_eq!(headers[ORIGIN], TRADINGVIEW_ORIGIN);
        assert!(headers[USER_AGENT].to_str().unwrap().starts_with("Mozilla/5.0"));
    }
}
