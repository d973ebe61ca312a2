//! Identity endpoints
//!
//! Every successful sign-in lands in the client's [`SessionStore`](crate::SessionStore);
//! sign-out clears it even when the backend call fails.

use crate::client::{ApiRequest, PawfinderClient, Service};
use crate::error::{ApiError, ApiResult};
use crate::session::{Session, User};
use reqwest::Url;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

/// Auth API interface
#[derive(Clone)]
pub struct AuthApi {
    client: PawfinderClient,
}

impl AuthApi {
    /// Create a new auth API interface
    pub(crate) fn new(client: PawfinderClient) -> Self {
        Self { client }
    }

    fn url(&self, path: &str) -> String {
        self.client.config().auth_url(path)
    }

    fn store(&self, session: Session) -> Session {
        debug!(user_id = %session.user.id, "Signed in");
        self.client.session().set(session.clone());
        session
    }

    /// Register a new account.
    ///
    /// Returns `None` when the project requires email confirmation before a
    /// session is issued.
    pub async fn sign_up(&self, email: &str, password: &str) -> ApiResult<Option<Session>> {
        let request =
            ApiRequest::post(Service::Auth, self.url("signup")).json(&Credentials { email, password })?;
        let body: Value = self.client.send_json(&request).await?;

        if body.get("access_token").is_none() {
            debug!("Sign-up awaiting email confirmation");
            return Ok(None);
        }
        let session: Session = serde_json::from_value(body)?;
        Ok(Some(self.store(session)))
    }

    /// Sign in with email and password.
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> ApiResult<Session> {
        let request = ApiRequest::post(Service::Auth, self.url("token"))
            .query("grant_type", "password")
            .json(&Credentials { email, password })?;
        let session: Session = self.client.send_json(&request).await?;
        Ok(self.store(session))
    }

    /// URL to send the user to for federated sign-in with `provider`.
    pub fn authorize_url(&self, provider: &str, redirect_to: Option<&str>) -> ApiResult<String> {
        let mut params = vec![("provider", provider)];
        if let Some(redirect) = redirect_to {
            params.push(("redirect_to", redirect));
        }
        Url::parse_with_params(&self.url("authorize"), &params)
            .map(String::from)
            .map_err(|e| ApiError::InvalidUrl(e.to_string()))
    }

    /// User owning `access_token`. Refreshes the stored user when the token is current.
    pub async fn user(&self, access_token: &str) -> ApiResult<User> {
        let request = ApiRequest::get(Service::Auth, self.url("user")).bearer(access_token);
        let user: User = self.client.send_json(&request).await?;

        if let Some(mut session) = self.client.session().current() {
            if session.access_token == access_token && session.user != user {
                session.user = user.clone();
                self.client.session().set(session);
            }
        }
        Ok(user)
    }

    /// User of the stored session.
    pub async fn current_user(&self) -> ApiResult<User> {
        let session = self.client.session().current().ok_or(ApiError::Unauthenticated)?;
        self.user(&session.access_token).await
    }

    /// Sign out and clear the stored session.
    pub async fn sign_out(&self) -> ApiResult<()> {
        let Some(session) = self.client.session().current() else {
            return Ok(());
        };

        let request = ApiRequest::post(Service::Auth, self.url("logout")).bearer(&session.access_token);
        let result = self.client.send_empty(&request).await;
        if let Err(ref e) = result {
            warn!(error = %e, "Sign-out request failed; clearing local session anyway");
        }
        self.client.session().clear();
        result
    }
}
