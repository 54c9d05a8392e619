use std::time::Duration;

use anyhow::Context as _;
use reqwest::blocking::Client;

use crate::foundation::error::LastListenedResult;

pub(crate) const USER_AGENT: &str = concat!("lastlistened/", env!("CARGO_PKG_VERSION"));

/// Blocking HTTP client whose every request is bounded by `timeout`.
pub(crate) fn blocking_client(timeout: Duration) -> LastListenedResult<Client> {
    let client = Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .context("build HTTP client")?;
    Ok(client)
}
