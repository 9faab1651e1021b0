//! HTTP transport for the signup API.
//!
//! Thin wrapper over `reqwest`: one method per endpoint, bearer token forwarded verbatim in the
//! `Authorization` header. Error bodies of the form `{"detail": ..}` are surfaced as-is.

use reqwest::header::AUTHORIZATION;
use reqwest::{Response, Url};
use serde::Deserialize;
use serde_json::Value;

use crate::config::{with_trailing_slash, ClientConfig};
use crate::error::{AuthError, FetchError, MutationError, GENERIC_DETAIL, INVALID_CREDENTIALS};
use crate::roster::Roster;
use crate::session::Session;

#[derive(Debug, Deserialize)]
struct LoginBody {
    token: String,
    username: String,
}

#[derive(Debug, Deserialize)]
struct CheckBody {
    #[serde(default)]
    authenticated: bool,
}

#[derive(Clone)]
pub struct ApiClient {
    base: Url,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { base: with_trailing_slash(config.api_base.clone()), client })
    }

    // paths are relative so a prefixed base like `https://host/signup-api/` keeps its prefix
    fn url(&self, path: &str) -> Result<Url, String> {
        self.base.join(path).map_err(|e| format!("bad url for {}: {}", path, e))
    }

    fn activity_url(&self, activity: &str, action: &str) -> Result<Url, String> {
        self.url(&format!("activities/{}/{}", urlencoding::encode(activity), action))
    }

    /// `POST /auth/login?username=&password=`
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, AuthError> {
        let url = self.url("auth/login").map_err(AuthError::Network)?;
        let resp = self.client
            .post(url)
            .query(&[("username", username), ("password", password)])
            .send()
            .await?;
        if !resp.status().is_success() {
            let detail = detail_of(resp).await.unwrap_or_else(|| INVALID_CREDENTIALS.to_string());
            return Err(AuthError::InvalidCredentials { detail });
        }
        let body: LoginBody = resp.json().await?;
        Ok(Session::new(body.token, body.username))
    }

    /// `POST /auth/logout`; the response is ignored.
    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        let url = self.url("auth/logout").map_err(AuthError::Network)?;
        self.client.post(url).header(AUTHORIZATION, token).send().await?;
        Ok(())
    }

    /// `GET /auth/check` -> `authenticated`. A missing field counts as not authenticated.
    pub async fn check(&self, token: &str) -> Result<bool, AuthError> {
        let url = self.url("auth/check").map_err(AuthError::Network)?;
        let resp = self.client.get(url).header(AUTHORIZATION, token).send().await?;
        let body: CheckBody = resp.json().await?;
        Ok(body.authenticated)
    }

    /// `GET /activities`
    pub async fn activities(&self) -> Result<Roster, FetchError> {
        let url = self.url("activities").map_err(FetchError::Network)?;
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let body: Value = resp.json().await?;
        Roster::from_json(body)
    }

    /// `POST /activities/{name}/signup?email=` -> server `message`.
    pub async fn signup(&self, token: &str, activity: &str, email: &str) -> Result<String, MutationError> {
        let url = self.activity_url(activity, "signup").map_err(MutationError::Network)?;
        let resp = self.client
            .post(url)
            .header(AUTHORIZATION, token)
            .query(&[("email", email)])
            .send()
            .await?;
        message_or_detail(resp).await
    }

    /// `DELETE /activities/{name}/unregister?email=` -> server `message`.
    pub async fn unregister(&self, token: &str, activity: &str, email: &str) -> Result<String, MutationError> {
        let url = self.activity_url(activity, "unregister").map_err(MutationError::Network)?;
        let resp = self.client
            .delete(url)
            .header(AUTHORIZATION, token)
            .query(&[("email", email)])
            .send()
            .await?;
        message_or_detail(resp).await
    }
}

async fn detail_of(resp: Response) -> Option<String> {
    let v: Value = resp.json().await.unwrap_or(Value::Null);
    v.get("detail").and_then(|d| d.as_str()).filter(|d| !d.is_empty()).map(|d| d.to_string())
}

async fn message_or_detail(resp: Response) -> Result<String, MutationError> {
    let status = resp.status();
    if !status.is_success() {
        let detail = detail_of(resp).await.unwrap_or_else(|| GENERIC_DETAIL.to_string());
        return Err(MutationError::Rejected { status: status.as_u16(), detail });
    }
    let v: Value = resp.json().await?;
    Ok(v.get("message").and_then(|m| m.as_str()).unwrap_or_default().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activity_urls_are_percent_encoded() {
        let mut cfg = ClientConfig::default();
        cfg.api_base = Url::parse("http://localhost:8000/").unwrap();
        let api = ApiClient::new(&cfg).unwrap();
        let u = api.activity_url("Chess Club", "signup").unwrap();
        assert_eq!(u.as_str(), "http://localhost:8000/activities/Chess%20Club/signup");
        let u = api.activity_url("Art/Craft", "unregister").unwrap();
        assert_eq!(u.as_str(), "http://localhost:8000/activities/Art%2FCraft/unregister");
    }

    #[test]
    fn prefixed_base_keeps_its_path() {
        for base in ["https://school.example/signup-api/", "https://school.example/signup-api"] {
            let mut cfg = ClientConfig::default();
            cfg.api_base = Url::parse(base).unwrap();
            let api = ApiClient::new(&cfg).unwrap();
            assert_eq!(api.url("activities").unwrap().as_str(), "https://school.example/signup-api/activities");
            assert_eq!(api.url("auth/login").unwrap().as_str(), "https://school.example/signup-api/auth/login");
            let u = api.activity_url("Chess Club", "signup").unwrap();
            assert_eq!(u.as_str(), "https://school.example/signup-api/activities/Chess%20Club/signup");
        }
    }
}
