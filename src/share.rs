// Share links for a market and the remote QR image that renders them

use reqwest::Url;
use serde::Serialize;

pub const QR_ENDPOINT: &str = "https://api.qrserver.com/v1/create-qr-code/";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShareLink {
    pub market_id: String,
    pub url: String,
    pub qr_image_url: Option<String>,
}

/// `<origin>/?market=<id>`
pub fn share_url(origin: &str, market_id: &str) -> String {
    format!("{}/?market={}", origin.trim_end_matches('/'), market_id)
}

/// QR image URL encoding `data`, styled for the dark big-screen theme
pub fn qr_image_url(data: &str) -> Option<String> {
    Url::parse_with_params(
        QR_ENDPOINT,
        &[
            ("size", "250x250"),
            ("data", data),
            ("bgcolor", "1e293b"),
            ("color", "ffffff"),
            ("margin", "10"),
        ],
    )
    .ok()
    .map(String::from)
}

pub fn share_link(origin: &str, market_id: &str) -> ShareLink {
    let url = share_url(origin, market_id);
    ShareLink {
        market_id: market_id.to_string(),
        qr_image_url: qr_image_url(&url),
        url,
    }
}
