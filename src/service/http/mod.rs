use std::{sync::Arc, time::Duration};

use reqwest::{
    cookie::Jar,
    header::{self, HeaderMap, HeaderValue},
    Client, Response,
};
use serde_json::Value;
use url::Url;

use crate::{
    config::InstagramConfig,
    platform::instagram::{InstagramError, COOKIE_DOMAIN, INSTAGRAM_BASE_URL},
    service::CredentialSet,
};

/// A cookie-carrying client bound to one Instagram session.
#[derive(Clone)]
pub struct HttpService {
    client: Client,
    #[cfg(test)]
    cookie_jar: Arc<Jar>,
}

impl HttpService {
    pub fn new(config: &InstagramConfig, credentials: &CredentialSet) -> Result<Self, InstagramError> {
        let base_url = Url::parse(INSTAGRAM_BASE_URL).map_err(|e| InstagramError::Unexpected(e.to_string()))?;

        let cookie_jar = Arc::new(Jar::default());
        for (name, value) in [
            ("sessionid", credentials.session_id.as_str()),
            ("csrftoken", credentials.csrf_token.as_str()),
        ] {
            cookie_jar.add_cookie_str(
                &format!("{}={}; Domain={}; Path=/", name, value, COOKIE_DOMAIN),
                &base_url,
            );
        }

        let mut headers = Self::get_platform_headers();
        let csrf = HeaderValue::from_str(&credentials.csrf_token)
            .map_err(|e| InstagramError::Unexpected(format!("Invalid csrftoken value: {}", e)))?;
        headers.insert("X-CSRFToken", csrf);

        let client = Self::create_client(Arc::clone(&cookie_jar), headers, config)?;

        Ok(Self {
            client,
            #[cfg(test)]
            cookie_jar,
        })
    }

    fn get_platform_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(header::ORIGIN, HeaderValue::from_static("https://www.instagram.com"));
        headers.insert(header::REFERER, HeaderValue::from_static("https://www.instagram.com/"));
        headers.insert("X-IG-App-ID", HeaderValue::from_static("936619743392459"));
        headers.insert("X-Requested-With", HeaderValue::from_static("XMLHttpRequest"));
        headers
    }

    fn create_client(
        cookie_jar: Arc<Jar>,
        headers: HeaderMap,
        config: &InstagramConfig,
    ) -> Result<Client, InstagramError> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(30))
            .cookie_provider(cookie_jar)
            .default_headers(headers)
            .user_agent(config.user_agent.as_str());

        // PROXY_URL is the only proxy source; system proxy variables are ignored.
        builder = match &config.proxy_url {
            Some(proxy_url) => {
                let proxy = reqwest::Proxy::all(proxy_url.as_str())
                    .map_err(|e| InstagramError::Unexpected(format!("Invalid proxy: {}", e)))?;
                builder.proxy(proxy)
            }
            None => builder.no_proxy(),
        };

        builder
            .build()
            .map_err(|e| InstagramError::Unexpected(format!("Failed to build HTTP client: {}", e)))
    }

    pub async fn get(&self, url: &str) -> Result<Response, InstagramError> {
        let response = self.client.get(url).send().await?;
        check_response(response)
    }

    pub async fn get_json(&self, url: &str, params: Option<Value>) -> Result<Value, InstagramError> {
        let mut builder = self.client.get(url);
        if let Some(params) = params {
            builder = builder.query(&params);
        }
        let response = check_response(builder.send().await?)?;
        response
            .json()
            .await
            .map_err(|e| InstagramError::Unexpected(format!("Failed to parse JSON: {}", e)))
    }

    #[cfg(test)]
    pub fn get_cookie_jar(&self) -> Arc<Jar> {
        Arc::clone(&self.cookie_jar)
    }
}

/// Sorts an HTTP response into the client's failure classes.
pub fn check_response(response: Response) -> Result<Response, InstagramError> {
    if response.url().path().starts_with("/accounts/login") {
        info!("Redirected to login: {}", response.url());
        return Err(InstagramError::LoginRequired(format!(
            "redirected to {}",
            response.url().path()
        )));
    }

    classify_status(response.status())?;
    Ok(response)
}

pub fn classify_status(status: reqwest::StatusCode) -> Result<(), InstagramError> {
    use reqwest::StatusCode;

    match status {
        s if s.is_success() => Ok(()),
        StatusCode::UNAUTHORIZED => Err(InstagramError::LoginRequired(status_text(status))),
        StatusCode::FORBIDDEN => Err(InstagramError::Blocked(status_text(status))),
        StatusCode::NOT_FOUND => Err(InstagramError::NotFound(status_text(status))),
        StatusCode::TOO_MANY_REQUESTS => Err(InstagramError::Connection(status_text(status))),
        s if s.is_server_error() => Err(InstagramError::Connection(status_text(status))),
        _ => Err(InstagramError::Unexpected(format!("HTTP error code {}", status.as_u16()))),
    }
}

fn status_text(status: reqwest::StatusCode) -> String {
    format!("HTTP {}", status)
}
