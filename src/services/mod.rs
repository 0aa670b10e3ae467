//! Services module
//!
//! External collaborators: the ban registry client, the metrics sink and
//! the captcha expiry sweeper.

pub mod ban_lookup;
pub mod metrics;
pub mod sweeper;

pub use ban_lookup::{BanLookupService, BanVerdict};
pub use metrics::{FieldValue, MetricsSink};
pub use sweeper::spawn_sweeper;

use std::time::Duration;

use crate::config::ProxyConfig;
use crate::utils::errors::Result;

const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// Build the shared outbound HTTP client, routed through SOCKS5 when a
/// proxy is configured.
pub fn build_http_client(proxy: Option<&ProxyConfig>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")));

    if let Some(proxy) = proxy {
        let url = if proxy.username.is_empty() {
            format!("socks5://{}:{}", proxy.address, proxy.port)
        } else {
            format!(
                "socks5://{}:{}@{}:{}",
                proxy.username, proxy.password, proxy.address, proxy.port
            )
        };
        builder = builder.proxy(reqwest::Proxy::all(url)?);
    }

    Ok(builder.build()?)
}
