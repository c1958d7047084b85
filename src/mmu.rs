use std::fmt;
use std::time::Duration;

use log::{debug, info};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::timetable::{self, ClassSession};

pub const DEFAULT_API_URL: &str = "https://mmumobileapps.mmu.edu.my/api";

// The login endpoint wants a device id but accepts any value.
const DEVICE_ID: &str = "asd";
const RATE_LIMITED: &str = "03";

pub struct Config {
    pub api_url: String,
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Account password. Never printed, dropped once the login request is sent.
pub struct Password(String);

impl Password {
    pub fn new<S: Into<String>>(password: S) -> Self {
        Self(password.into())
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(********)")
    }
}

#[derive(Debug)]
pub struct Credentials {
    pub student_id: String,
    pub password: Password,
}

#[derive(Deserialize)]
struct Login {
    token: String,
}

pub struct MmuClient {
    http: Client,
    api_url: String,
}

impl MmuClient {
    pub fn new(config: Config) -> Result<Self> {
        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.api_url)
    }

    /// Logs in, downloads the timetable and logs out again. The session is
    /// closed even when the timetable request fails.
    pub async fn fetch_timetable(&self, credentials: Credentials) -> Result<Vec<ClassSession>> {
        let token = self.login(credentials).await?;
        let sessions = self.timetable(&token).await;
        self.logout(&token).await;
        sessions
    }

    async fn login(&self, credentials: Credentials) -> Result<String> {
        let Credentials {
            student_id,
            password,
        } = credentials;

        debug!("Logging in as {student_id}");

        let form = [
            ("username", student_id.as_str()),
            ("password", password.0.as_str()),
            ("id", DEVICE_ID),
        ];

        let response = self
            .http
            .post(self.url("auth/login2"))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(Error::Authentication(format!(
                "login rejected with status {status}"
            )));
        }

        let body = response.text().await?;
        let login = serde_json::from_str::<Login>(&body)
            .map_err(|_| Error::Authentication("login response carries no token".into()))?;

        info!("Logged in as {student_id}");
        Ok(login.token)
    }

    async fn student_key(&self, token: &str) -> Result<String> {
        let response = self
            .http
            .get(self.url("camsys/student_key"))
            .query(&[("token", token)])
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(Error::Authentication(format!(
                "session token rejected with status {status}"
            )));
        }

        let key = response.text().await?.trim().to_string();

        match key.as_str() {
            RATE_LIMITED => Err(Error::RateLimited),
            "" => Err(Error::Authentication("empty student key".into())),
            _ => Ok(key),
        }
    }

    async fn timetable(&self, token: &str) -> Result<Vec<ClassSession>> {
        let key = self.student_key(token).await?;

        debug!("Requesting timetable");
        let body = self
            .http
            .get(self.url(&format!("camsys/timetable/{key}")))
            .query(&[("token", token)])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        // An object instead of the list of days means the key was refused.
        if body.trim_start().starts_with('{') {
            return Err(Error::Authentication("student key rejected".into()));
        }

        let sessions = timetable::parse_timetable(&body)?;
        info!("Fetched {} class sessions", sessions.len());

        Ok(sessions)
    }

    async fn logout(&self, token: &str) {
        let result = self
            .http
            .post(self.url("logout"))
            .query(&[("token", token)])
            .send()
            .await;

        if let Err(err) = result {
            debug!("Logout failed: {}", err.without_url());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_is_redacted() {
        let credentials = Credentials {
            student_id: "1211100001".into(),
            password: Password::new("hunter2"),
        };

        let debug = format!("{credentials:?}");
        assert!(debug.contains("1211100001"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn trailing_slash_is_ignored() {
        let client = MmuClient::new(Config {
            api_url: "http://127.0.0.1:8080/api/".into(),
            ..Config::default()
        })
        .unwrap();

        assert_eq!(client.url("logout"), "http://127.0.0.1:8080/api/logout");
    }
}
