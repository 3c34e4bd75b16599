//! Authenticated HTTP access to the fan club site.
//!
//! The scraping code only ever sees the [`HttpGet`] trait. [`Session`] is the
//! production implementation: a `reqwest` client with a cookie jar, a fixed
//! `User-Agent` and a per-request timeout. Cookies survive between runs in a
//! small JSON file so `fetch` does not have to log in every time.

use crate::config::Config;
use crate::error::{Error, Result};
use dialoguer::{Input, Password, theme::ColorfulTheme};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client, header};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Status and body of a completed GET.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    /// The body, or [`Error::Status`] unless the status is `200`.
    pub fn into_ok_body(self, url: &str) -> Result<String> {
        if self.status != 200 {
            return Err(Error::Status {
                url: url.to_string(),
                status: self.status,
            });
        }
        Ok(self.body)
    }
}

/// Something that can GET a page with the user's session attached.
pub trait HttpGet {
    async fn get(&self, url: &str) -> Result<Response>;
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredCookie {
    name: String,
    value: String,
}

pub struct Session {
    client: Client,
    jar: Arc<Jar>,
    origin: Url,
    login_url: String,
    cookie_file: PathBuf,
}

impl Session {
    pub fn new(config: &Config) -> Result<Self> {
        let origin = Url::parse(&config.origin).map_err(|source| Error::Url {
            url: config.origin.clone(),
            source,
        })?;

        let mut headers = header::HeaderMap::new();
        let user_agent = header::HeaderValue::from_str(&config.user_agent)
            .unwrap_or_else(|_| header::HeaderValue::from_static("fanclub_radio"));
        headers.insert(header::USER_AGENT, user_agent);

        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .default_headers(headers)
            .cookie_provider(Arc::clone(&jar))
            .timeout(config.request_timeout())
            .build()
            .map_err(Error::Client)?;

        Ok(Self {
            client,
            jar,
            origin,
            login_url: config.login_url(),
            cookie_file: config.cookie_file.clone(),
        })
    }

    /// Make sure the jar holds a session, prompting for credentials if the
    /// stored cookies are missing or do not look like a login.
    #[instrument(level = "info", skip_all)]
    pub async fn ensure_authenticated(&self) -> Result<()> {
        match self.load_cookies().await {
            Ok(()) if self.is_authenticated() => {
                debug!("Reusing stored session cookies");
                return Ok(());
            }
            Ok(()) => info!("Stored cookies do not carry a session"),
            Err(e) => debug!(error = %e, "No usable stored session"),
        }

        let (username, password) = prompt_credentials()?;
        self.login(&username, &password).await
    }

    /// Submit the login form and persist the resulting cookies.
    #[instrument(level = "info", skip_all, fields(login_url = %self.login_url))]
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        let form = [("username", username), ("password", password)];
        self.client
            .post(&self.login_url)
            .form(&form)
            .send()
            .await
            .map_err(|source| Error::Transport {
                url: self.login_url.clone(),
                source,
            })?;

        if !self.is_authenticated() {
            warn!("Login response did not set a session cookie");
            return Err(Error::AuthenticationFailed);
        }

        self.save_cookies().await?;
        info!(path = %self.cookie_file.display(), "Saved session cookies");
        Ok(())
    }

    /// Whether the jar holds a cookie that looks like a login session.
    pub fn is_authenticated(&self) -> bool {
        self.cookie_pairs().iter().any(|c| {
            let name = c.name.to_lowercase();
            name.contains("session") || name.contains("auth")
        })
    }

    fn cookie_pairs(&self) -> Vec<StoredCookie> {
        let Some(header) = self.jar.cookies(&self.origin) else {
            return Vec::new();
        };
        let Ok(raw) = header.to_str() else {
            return Vec::new();
        };
        raw.split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .map(|(name, value)| StoredCookie {
                name: name.to_string(),
                value: value.to_string(),
            })
            .collect()
    }

    async fn save_cookies(&self) -> Result<()> {
        let data = serde_json::to_string_pretty(&self.cookie_pairs())?;
        tokio::fs::write(&self.cookie_file, data)
            .await
            .map_err(|e| Error::io(&self.cookie_file, e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            tokio::fs::set_permissions(&self.cookie_file, perms)
                .await
                .map_err(|e| Error::io(&self.cookie_file, e))?;
        }
        Ok(())
    }

    async fn load_cookies(&self) -> Result<()> {
        let data = tokio::fs::read_to_string(&self.cookie_file)
            .await
            .map_err(|e| Error::io(&self.cookie_file, e))?;
        let cookies: Vec<StoredCookie> = serde_json::from_str(&data)?;
        for cookie in &cookies {
            self.jar.add_cookie_str(
                &format!("{}={}; Path=/", cookie.name, cookie.value),
                &self.origin,
            );
        }
        debug!(count = cookies.len(), "Loaded stored cookies");
        Ok(())
    }
}

impl HttpGet for Session {
    #[instrument(level = "debug", skip(self))]
    async fn get(&self, url: &str) -> Result<Response> {
        let transport = |source| Error::Transport {
            url: url.to_string(),
            source,
        };
        let resp = self.client.get(url).send().await.map_err(transport)?;
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(transport)?;
        debug!(status, bytes = body.len(), "GET completed");
        Ok(Response { status, body })
    }
}

fn prompt_credentials() -> Result<(String, String)> {
    let theme = ColorfulTheme::default();
    let username: String = Input::with_theme(&theme)
        .with_prompt("Username")
        .interact_text()?;
    let password = Password::with_theme(&theme)
        .with_prompt("Password")
        .interact()?;
    Ok((username, password))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header as header_eq, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(origin: &str, cookie_file: PathBuf) -> Config {
        Config {
            origin: origin.to_string(),
            cookie_file,
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_get_sends_user_agent() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&server.uri(), dir.path().join("cookies.json"));

        Mock::given(method("GET"))
            .and(path("/hello"))
            .and(header_eq("user-agent", config.user_agent.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_string("hi"))
            .mount(&server)
            .await;

        let session = Session::new(&config).unwrap();
        let resp = session.get(&format!("{}/hello", server.uri())).await.unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body, "hi");
    }

    #[tokio::test]
    async fn test_non_ok_status_is_reported_not_raised() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&server.uri(), dir.path().join("cookies.json"));

        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let session = Session::new(&config).unwrap();
        let url = format!("{}/missing", server.uri());
        let resp = session.get(&url).await.unwrap();
        assert_eq!(resp.status, 404);
        assert!(matches!(
            resp.into_ok_body(&url),
            Err(Error::Status { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn test_login_persists_session_cookie() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let cookie_file = dir.path().join("cookies.json");
        let config = test_config(&server.uri(), cookie_file.clone());

        Mock::given(method("POST"))
            .and(path("/slogin.php"))
            .and(body_string_contains("username=alice"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("set-cookie", "fc_session=abc123; Path=/"),
            )
            .mount(&server)
            .await;

        let session = Session::new(&config).unwrap();
        session.login("alice", "secret").await.unwrap();
        assert!(session.is_authenticated());

        let saved = std::fs::read_to_string(&cookie_file).unwrap();
        assert!(saved.contains("fc_session"));
        assert!(saved.contains("abc123"));

        // A fresh session picks the cookie up from disk without prompting.
        let fresh = Session::new(&config).unwrap();
        fresh.ensure_authenticated().await.unwrap();
        assert!(fresh.is_authenticated());
    }

    #[tokio::test]
    async fn test_login_without_session_cookie_fails() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let cookie_file = dir.path().join("cookies.json");
        let config = test_config(&server.uri(), cookie_file.clone());

        Mock::given(method("POST"))
            .and(path("/slogin.php"))
            .respond_with(
                ResponseTemplate::new(200).insert_header("set-cookie", "lang=ja; Path=/"),
            )
            .mount(&server)
            .await;

        let session = Session::new(&config).unwrap();
        let err = session.login("alice", "wrong").await.unwrap_err();
        assert!(matches!(err, Error::AuthenticationFailed));
        assert!(!cookie_file.exists());
    }
}
