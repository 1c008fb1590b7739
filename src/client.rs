use reqwest::Client;

use crate::configuration::HttpClientSettings;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

pub fn build_client(settings: &HttpClientSettings) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(settings.timeout())
        .build()
}
