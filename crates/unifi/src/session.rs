//! Cookie-backed session against a UniFi controller.

use std::time::{Duration, SystemTime};

use {
    secrecy::{ExposeSecret, Secret},
    tracing::{debug, info, warn},
    url::Url,
};

use vouchbot_config::UnifiConfig;

use crate::{
    error::{Error, Result},
    voucher::{AccessCode, VoucherEnvelope},
};

pub const LOGIN_PATH: &str = "/api/auth/login";
pub const VOUCHER_PATH: &str = "/proxy/network/api/s/default/stat/voucher";

/// Name of the session cookie set by a successful login.
pub const SESSION_COOKIE: &str = "TOKEN";

/// Whether the controller session can be reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    /// `expires_at` is `None` for a session cookie without expiry.
    Authenticated { expires_at: Option<SystemTime> },
}

impl SessionState {
    #[must_use]
    pub fn is_valid_at(&self, now: SystemTime) -> bool {
        match self {
            Self::Unauthenticated => false,
            Self::Authenticated { expires_at: None } => true,
            Self::Authenticated {
                expires_at: Some(expires_at),
            } => *expires_at > now,
        }
    }
}

/// HTTP session with one controller.
///
/// All requests share a single client and cookie store, so every network
/// operation takes `&mut self`: only one caller drives the session at a
/// time.
pub struct SessionClient {
    http: reqwest::Client,
    login_url: Url,
    voucher_url: Url,
    username: String,
    password: Secret<String>,
    state: SessionState,
}

impl SessionClient {
    pub fn new(config: &UnifiConfig) -> Result<Self> {
        if !config.verify_tls {
            warn!(base_url = %config.base_url, "unifi TLS certificate verification disabled");
        }
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(config.timeout)
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()?;

        Ok(Self {
            http,
            login_url: endpoint(&config.base_url, LOGIN_PATH)?,
            voucher_url: endpoint(&config.base_url, VOUCHER_PATH)?,
            username: config.username.clone(),
            password: config.password.clone(),
            state: SessionState::Unauthenticated,
        })
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.is_valid_at(SystemTime::now())
    }

    /// Log in and capture the session cookie's expiry.
    pub async fn authenticate(&mut self) -> Result<()> {
        self.state = SessionState::Unauthenticated;

        let body = serde_json::json!({
            "username": self.username,
            "password": self.password.expose_secret(),
        });
        let resp = self
            .http
            .post(self.login_url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::auth(e.to_string()))?;

        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            return Err(Error::auth(format!("status code {}", status.as_u16())));
        }

        let now = SystemTime::now();
        let expires_at = resp
            .cookies()
            .find(|c| c.name() == SESSION_COOKIE)
            .map(|c| cookie_expiry(c.max_age(), c.expires(), now));

        match expires_at {
            Some(expires_at) => {
                self.state = SessionState::Authenticated { expires_at };
                info!(expires_at = ?expires_at, "unifi authentication successful");
            },
            None => {
                warn!(
                    cookie = SESSION_COOKIE,
                    "unifi login succeeded without a session cookie"
                );
            },
        }
        Ok(())
    }

    /// Fetch all vouchers, logging in first if the session is not valid.
    ///
    /// Re-authenticates at most once and never retries.
    pub async fn fetch_access_codes(&mut self) -> Result<Vec<AccessCode>> {
        if !self.is_authenticated() {
            warn!("authentication is required");
            self.authenticate().await?;
        }

        let resp = self.http.get(self.voucher_url.clone()).send().await?;
        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            return Err(Error::Backend {
                status: status.as_u16(),
            });
        }

        let body = resp.bytes().await?;
        let envelope: VoucherEnvelope = serde_json::from_slice(&body)?;
        debug!(
            rc = %envelope.meta.rc,
            count = envelope.data.len(),
            "unifi vouchers fetched"
        );
        Ok(envelope.data)
    }
}

/// Append a fixed path to the base URL, keeping any base path prefix.
fn endpoint(base: &Url, path: &str) -> Result<Url> {
    let base = base.as_str().trim_end_matches('/');
    Ok(Url::parse(&format!("{base}{path}"))?)
}

/// `Max-Age` wins over `Expires`; neither means a session cookie.
fn cookie_expiry(
    max_age: Option<Duration>,
    expires: Option<SystemTime>,
    now: SystemTime,
) -> Option<SystemTime> {
    max_age.map(|age| now + age).or(expires)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, mockito::Matcher};

    fn config(base_url: &str) -> UnifiConfig {
        UnifiConfig {
            base_url: Url::parse(base_url).unwrap(),
            username: "admin".into(),
            password: Secret::new("secret".into()),
            verify_tls: true,
            timeout: Duration::from_secs(5),
        }
    }

    fn vouchers_body(codes: &[&str]) -> String {
        let data: Vec<_> = codes
            .iter()
            .map(|code| serde_json::json!({"code": code, "status": "VALID_ONE"}))
            .collect();
        serde_json::json!({"meta": {"rc": "ok"}, "data": data}).to_string()
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let base = Url::parse("https://unifi.example.com/controller/").unwrap();
        assert_eq!(
            endpoint(&base, LOGIN_PATH).unwrap().as_str(),
            "https://unifi.example.com/controller/api/auth/login"
        );
        let base = Url::parse("https://10.0.0.11").unwrap();
        assert_eq!(
            endpoint(&base, VOUCHER_PATH).unwrap().as_str(),
            "https://10.0.0.11/proxy/network/api/s/default/stat/voucher"
        );
    }

    #[test]
    fn state_validity() {
        let now = SystemTime::now();
        assert!(!SessionState::Unauthenticated.is_valid_at(now));
        assert!(SessionState::Authenticated { expires_at: None }.is_valid_at(now));
        assert!(
            SessionState::Authenticated {
                expires_at: Some(now + Duration::from_secs(60)),
            }
            .is_valid_at(now)
        );
        assert!(!SessionState::Authenticated { expires_at: Some(now) }.is_valid_at(now));
    }

    #[test]
    fn max_age_wins_over_expires() {
        let now = SystemTime::now();
        let expires = now + Duration::from_secs(10);
        assert_eq!(
            cookie_expiry(Some(Duration::from_secs(60)), Some(expires), now),
            Some(now + Duration::from_secs(60))
        );
        assert_eq!(cookie_expiry(None, Some(expires), now), Some(expires));
        assert_eq!(cookie_expiry(None, None, now), None);
    }

    #[tokio::test]
    async fn authenticate_posts_credentials() {
        let mut server = mockito::Server::new_async().await;
        let login = server
            .mock("POST", LOGIN_PATH)
            .match_body(Matcher::Json(serde_json::json!({
                "username": "admin",
                "password": "secret",
            })))
            .with_status(200)
            .with_header("set-cookie", "TOKEN=abc; Path=/; Max-Age=3600")
            .create_async()
            .await;

        let mut client = SessionClient::new(&config(&server.url())).unwrap();
        assert!(!client.is_authenticated());
        client.authenticate().await.unwrap();
        assert!(client.is_authenticated());
        login.assert_async().await;
    }

    #[tokio::test]
    async fn fetch_without_session_authenticates_once() {
        let mut server = mockito::Server::new_async().await;
        let login = server
            .mock("POST", LOGIN_PATH)
            .with_status(200)
            .with_header("set-cookie", "TOKEN=abc; Path=/; Max-Age=3600")
            .expect(1)
            .create_async()
            .await;
        let vouchers = server
            .mock("GET", VOUCHER_PATH)
            .match_header("cookie", Matcher::Regex("TOKEN=abc".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(vouchers_body(&["111", "222"]))
            .expect(2)
            .create_async()
            .await;

        let mut client = SessionClient::new(&config(&server.url())).unwrap();
        let first = client.fetch_access_codes().await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].code, "111");

        // Session cookie still valid: no second login.
        let second = client.fetch_access_codes().await.unwrap();
        assert_eq!(second.len(), 2);

        login.assert_async().await;
        vouchers.assert_async().await;
    }

    #[tokio::test]
    async fn expired_session_logs_in_again() {
        let mut server = mockito::Server::new_async().await;
        let login = server
            .mock("POST", LOGIN_PATH)
            .with_status(200)
            .with_header("set-cookie", "TOKEN=abc; Path=/; Max-Age=0")
            .expect(2)
            .create_async()
            .await;
        let _vouchers = server
            .mock("GET", VOUCHER_PATH)
            .with_status(200)
            .with_body(vouchers_body(&[]))
            .create_async()
            .await;

        let mut client = SessionClient::new(&config(&server.url())).unwrap();
        client.fetch_access_codes().await.unwrap();
        client.fetch_access_codes().await.unwrap();
        login.assert_async().await;
    }

    #[tokio::test]
    async fn login_without_cookie_stays_unauthenticated() {
        let mut server = mockito::Server::new_async().await;
        let _login = server
            .mock("POST", LOGIN_PATH)
            .with_status(200)
            .create_async()
            .await;

        let mut client = SessionClient::new(&config(&server.url())).unwrap();
        client.authenticate().await.unwrap();
        assert_eq!(client.state(), SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn failed_login_skips_data_request() {
        let mut server = mockito::Server::new_async().await;
        let _login = server
            .mock("POST", LOGIN_PATH)
            .with_status(401)
            .create_async()
            .await;
        let vouchers = server
            .mock("GET", VOUCHER_PATH)
            .expect(0)
            .create_async()
            .await;

        let mut client = SessionClient::new(&config(&server.url())).unwrap();
        let err = client.fetch_access_codes().await.unwrap_err();
        assert!(matches!(err, Error::Auth { .. }));
        assert_eq!(err.to_string(), "unifi authentication failed: status code 401");
        assert_eq!(client.state(), SessionState::Unauthenticated);
        vouchers.assert_async().await;
    }

    #[tokio::test]
    async fn non_200_voucher_response_is_backend_error() {
        let mut server = mockito::Server::new_async().await;
        let _login = server
            .mock("POST", LOGIN_PATH)
            .with_status(200)
            .with_header("set-cookie", "TOKEN=abc; Path=/")
            .create_async()
            .await;
        let _vouchers = server
            .mock("GET", VOUCHER_PATH)
            .with_status(500)
            .create_async()
            .await;

        let mut client = SessionClient::new(&config(&server.url())).unwrap();
        let err = client.fetch_access_codes().await.unwrap_err();
        assert!(matches!(err, Error::Backend { status: 500 }));
        assert_eq!(err.to_string(), "unifi voucher failed with status code 500");
    }

    #[tokio::test]
    async fn malformed_body_is_decode_error() {
        let mut server = mockito::Server::new_async().await;
        let _login = server
            .mock("POST", LOGIN_PATH)
            .with_status(200)
            .with_header("set-cookie", "TOKEN=abc; Path=/")
            .create_async()
            .await;
        let _vouchers = server
            .mock("GET", VOUCHER_PATH)
            .with_status(200)
            .with_body("{not valid json}")
            .create_async()
            .await;

        let mut client = SessionClient::new(&config(&server.url())).unwrap();
        let err = client.fetch_access_codes().await.unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[tokio::test]
    async fn unreachable_controller_is_auth_error() {
        // Nothing listens on port 9 of localhost.
        let mut client = SessionClient::new(&config("http://127.0.0.1:9")).unwrap();
        let err = client.fetch_access_codes().await.unwrap_err();
        assert!(matches!(err, Error::Auth { .. }));
    }
}
