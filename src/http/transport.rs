//! reqwest implementation of `AuthTransport` over the platform's auth
//! endpoints.

use reqwest::{Client, Method, Response};
use serde::Serialize;
use std::time::Duration;

use crate::auth::{
    AuthTransport, CompleteLoginRequest, Credentials, LoginOutcome, LoginRequest, LoginResponse,
    RefreshRequest, Session, SessionWire, SESSION_KEY_HEADER, USER_ID_HEADER,
};
use crate::error::{AuthError, HttpError};

/// Auth transport for the TradeForge REST API.
pub struct HttpAuthTransport {
    base_url: String,
    client: Client,
}

impl HttpAuthTransport {
    pub fn new(base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(10)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/auth/{}", self.base_url, path)
    }

    /// Send a request and map non-success statuses to `HttpError`.
    async fn request<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        session: Option<&Session>,
    ) -> Result<Response, HttpError> {
        let mut req = self.client.request(method, self.url(path));
        if let Some(session) = session {
            req = req
                .header(USER_ID_HEADER, &session.user_id)
                .header(SESSION_KEY_HEADER, &session.session_key);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req.send().await.map_err(transport_error)?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let status = status.as_u16();
        let body_text = resp.text().await.unwrap_or_default();
        Err(match status {
            401 | 403 => HttpError::Unauthorized,
            404 => HttpError::NotFound(body_text),
            400..=499 => HttpError::BadRequest(body_text),
            _ => HttpError::ServerError {
                status,
                body: body_text,
            },
        })
    }
}

fn transport_error(e: reqwest::Error) -> HttpError {
    if e.is_timeout() {
        HttpError::Timeout
    } else {
        HttpError::Reqwest(e)
    }
}

impl AuthTransport for HttpAuthTransport {
    async fn login(&self, credentials: &Credentials) -> Result<LoginOutcome, AuthError> {
        let body = LoginRequest {
            email: credentials.email.clone(),
            password: credentials.password.clone(),
        };
        let resp = self
            .request(Method::POST, "login", Some(&body), None)
            .await
            .map_err(|e| match e {
                HttpError::Unauthorized => AuthError::InvalidCredentials,
                other => AuthError::LoginFailed(other.to_string()),
            })?;

        let parsed: LoginResponse = resp
            .json()
            .await
            .map_err(|e| AuthError::LoginFailed(e.to_string()))?;
        if let Some(challenge_id) = parsed.challenge_id {
            Ok(LoginOutcome::ChallengeRequired { challenge_id })
        } else if let Some(session) = parsed.session {
            Ok(LoginOutcome::Granted(session.into_session()))
        } else {
            Err(AuthError::LoginFailed("malformed login response".into()))
        }
    }

    async fn complete_login(
        &self,
        credentials: &Credentials,
        challenge_id: &str,
        code: &str,
    ) -> Result<Session, AuthError> {
        let body = CompleteLoginRequest {
            email: credentials.email.clone(),
            challenge_id: challenge_id.to_string(),
            code: code.to_string(),
        };
        let resp = self
            .request(Method::POST, "complete", Some(&body), None)
            .await
            .map_err(|e| AuthError::ChallengeFailed(e.to_string()))?;

        let wire: SessionWire = resp
            .json()
            .await
            .map_err(|e| AuthError::ChallengeFailed(e.to_string()))?;
        Ok(wire.into_session())
    }

    async fn refresh(&self, session: &Session) -> Result<Session, AuthError> {
        let body = RefreshRequest {
            session_key: session.session_key.clone(),
        };
        let resp = self
            .request(Method::POST, "refresh", Some(&body), Some(session))
            .await
            .map_err(|e| AuthError::RefreshFailed(e.to_string()))?;

        let wire: SessionWire = resp
            .json()
            .await
            .map_err(|e| AuthError::RefreshFailed(e.to_string()))?;
        Ok(wire.into_session())
    }

    async fn probe(&self, session: &Session) -> bool {
        self.request(Method::GET, "ping", None::<&()>, Some(session))
            .await
            .is_ok()
    }

    async fn logout(&self, session: &Session) -> Result<(), AuthError> {
        self.request(
            Method::POST,
            "logout",
            Some(&serde_json::json!({})),
            Some(session),
        )
        .await
        .map_err(|e| AuthError::LogoutFailed(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_trimmed() {
        let transport = HttpAuthTransport::new("https://api.tradeforge.io/");
        assert_eq!(transport.base_url(), "https://api.tradeforge.io");
        assert_eq!(
            transport.url("login"),
            "https://api.tradeforge.io/api/auth/login"
        );
    }
}
