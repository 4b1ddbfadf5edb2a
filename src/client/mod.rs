pub mod csrf;

use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE},
    redirect, Client, Response,
};
use tracing::{debug, warn};

use crate::{
    config::PanelConfig,
    models::{
        dto::{LoginResponse, UserPayload, UserRecord},
        ClientError,
    },
};

pub use csrf::{find_csrf_token, CsrfToken, DEFAULT_CSRF_HEADER};

/// The REST calls the admin panel is built on
#[async_trait]
pub trait UserApi: Send + Sync {
    async fn current_user(&self) -> Result<UserRecord, ClientError>;
    async fn list_users(&self) -> Result<Vec<UserRecord>, ClientError>;
    async fn get_user(&self, id: i64) -> Result<UserRecord, ClientError>;
    async fn create_user(&self, payload: &UserPayload) -> Result<(), ClientError>;
    async fn update_user(&self, id: i64, payload: &UserPayload) -> Result<(), ClientError>;
    async fn delete_user(&self, id: i64) -> Result<(), ClientError>;
    /// Ends the session. Succeeds on a success or redirect status.
    async fn logout(&self) -> Result<(), ClientError>;
}

/// HTTP client for the user admin backend.
///
/// Keeps the session cookie between calls and, when CSRF handling is
/// enabled, echoes the discovered token on every write.
pub struct ApiClient {
    client: Client,
    base_url: String,
    csrf_enabled: bool,
    csrf: Option<CsrfToken>,
}

impl ApiClient {
    pub fn new(config: &PanelConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .cookie_store(true)
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(ApiClient {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            csrf_enabled: config.csrf,
            csrf: None,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn csrf_token(&self) -> Option<&CsrfToken> {
        self.csrf.as_ref()
    }

    /// Stores the token to echo back. Ignored when CSRF handling is disabled.
    pub fn set_csrf_token(&mut self, token: Option<CsrfToken>) {
        if self.csrf_enabled {
            self.csrf = token;
        }
    }

    /// Signs in with the form login, storing the session cookie
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ClientError> {
        let response = self
            .client
            .post(self.url("/login"))
            .header(ACCEPT, "application/json")
            .form(&[("email", email), ("password", password)])
            .send()
            .await?;
        let body = expect_success(response).await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Fetches a server-rendered page as HTML
    pub async fn fetch_page(&self, path: &str) -> Result<String, ClientError> {
        let response = self.client.get(self.url(path)).send().await?;
        Ok(expect_success(response).await?.text().await?)
    }

    /// Loads `path` and picks up its CSRF token. Returns the page markup.
    pub async fn discover_csrf(&mut self, path: &str) -> Result<String, ClientError> {
        let html = self.fetch_page(path).await?;
        if self.csrf_enabled {
            self.csrf = find_csrf_token(&html);
        }
        Ok(html)
    }

    /// Headers for state-changing requests: JSON content type, plus the CSRF
    /// header when a token is known
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(csrf) = &self.csrf {
            match (
                HeaderName::from_bytes(csrf.header.as_bytes()),
                HeaderValue::from_str(&csrf.token),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => warn!(header = %csrf.header, "CSRF header or token is not a valid HTTP header"),
            }
        }
        headers
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        debug!(path, "GET");
        let response = self.client.get(self.url(path)).send().await?;
        let body = expect_success(response).await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl UserApi for ApiClient {
    async fn current_user(&self) -> Result<UserRecord, ClientError> {
        self.get_json("/api/users/current").await
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, ClientError> {
        self.get_json("/api/users").await
    }

    async fn get_user(&self, id: i64) -> Result<UserRecord, ClientError> {
        self.get_json(&format!("/api/users/{id}")).await
    }

    async fn create_user(&self, payload: &UserPayload) -> Result<(), ClientError> {
        let response = self
            .client
            .post(self.url("/api/users"))
            .headers(self.headers())
            .body(serde_json::to_vec(payload)?)
            .send()
            .await?;
        expect_success(response).await?;
        Ok(())
    }

    async fn update_user(&self, id: i64, payload: &UserPayload) -> Result<(), ClientError> {
        let response = self
            .client
            .put(self.url(&format!("/api/users/{id}")))
            .headers(self.headers())
            .body(serde_json::to_vec(payload)?)
            .send()
            .await?;
        expect_success(response).await?;
        Ok(())
    }

    async fn delete_user(&self, id: i64) -> Result<(), ClientError> {
        let response = self
            .client
            .delete(self.url(&format!("/api/users/{id}")))
            .headers(self.headers())
            .send()
            .await?;
        expect_success(response).await?;
        Ok(())
    }

    async fn logout(&self) -> Result<(), ClientError> {
        let mut form: Vec<(&str, &str)> = Vec::new();
        if let Some(csrf) = &self.csrf {
            form.push(("_csrf", csrf.token.as_str()));
        }

        let response = self
            .client
            .post(self.url("/logout"))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() || status.is_redirection() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(ClientError::ApiError { status, body })
    }
}

/// Turns a non-success status into [`ClientError::ApiError`] carrying the body text
async fn expect_success(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    debug!(%status, %body, "request failed");
    Err(ClientError::ApiError { status, body })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(csrf: bool) -> ApiClient {
        let config = PanelConfig {
            base_url: "http://localhost:8080/".to_string(),
            csrf,
            ..Default::default()
        };
        ApiClient::new(&config).unwrap()
    }

    #[test]
    fn trailing_slash_is_dropped_from_base_url() {
        let api = client(true);
        assert_eq!(api.base_url(), "http://localhost:8080");
        assert_eq!(api.url("/api/users"), "http://localhost:8080/api/users");
    }

    #[test]
    fn headers_carry_csrf_token_when_known() {
        let mut api = client(true);
        let headers = api.headers();
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
        assert!(headers.get("x-csrf-token").is_none());

        api.set_csrf_token(Some(CsrfToken {
            header: DEFAULT_CSRF_HEADER.to_string(),
            token: "tok".to_string(),
        }));
        let headers = api.headers();
        assert_eq!(headers.get("x-csrf-token").unwrap(), "tok");
    }

    #[test]
    fn token_ignored_when_csrf_disabled() {
        let mut api = client(false);
        api.set_csrf_token(Some(CsrfToken {
            header: DEFAULT_CSRF_HEADER.to_string(),
            token: "tok".to_string(),
        }));
        assert!(api.csrf_token().is_none());
        assert_eq!(api.headers().len(), 1);
    }

    #[test]
    fn invalid_header_name_is_skipped() {
        let mut api = client(true);
        api.set_csrf_token(Some(CsrfToken {
            header: "bad header".to_string(),
            token: "tok".to_string(),
        }));
        assert_eq!(api.headers().len(), 1);
    }
}
