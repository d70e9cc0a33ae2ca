use std::time::Duration;

use reqwest::blocking::{Client, ClientBuilder, RequestBuilder};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::GatewayError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

/// Blocking JSON client rooted at the site's REST API (`…/wp-json/`).
#[derive(Clone)]
pub struct HostClient {
    client: Client,
    rest_root: Url,
    credentials: Option<Credentials>,
}

impl HostClient {
    pub fn new(rest_root: Url, credentials: Option<Credentials>) -> Result<Self, GatewayError> {
        Self::with_builder(Client::builder(), rest_root, credentials)
    }

    fn with_builder(
        builder: ClientBuilder,
        rest_root: Url,
        credentials: Option<Credentials>,
    ) -> Result<Self, GatewayError> {
        let client = builder
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("site-flow/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| GatewayError::Request {
                url: rest_root.to_string(),
                source,
            })?;

        Ok(Self {
            client,
            rest_root,
            credentials,
        })
    }

    /// Talks to a server on this machine, ignoring proxy settings.
    #[cfg(test)]
    pub(crate) fn local(rest_root: Url) -> Self {
        Self::with_builder(Client::builder().no_proxy(), rest_root, None)
            .expect("client without proxy builds")
    }

    pub fn endpoint(&self, route: &str) -> Result<Url, GatewayError> {
        Ok(self.rest_root.join(route.trim_start_matches('/'))?)
    }

    pub fn get_json(&self, route: &str) -> Result<Value, GatewayError> {
        let url = self.endpoint(route)?;
        debug!(%url, "GET");
        self.send(self.client.get(url.clone()), &url)
    }

    pub fn post_json<T: Serialize + ?Sized>(
        &self,
        route: &str,
        body: &T,
    ) -> Result<Value, GatewayError> {
        let url = self.endpoint(route)?;
        debug!(%url, "POST");
        self.send(self.client.post(url.clone()).json(body), &url)
    }

    fn send(&self, request: RequestBuilder, url: &Url) -> Result<Value, GatewayError> {
        let request = match &self.credentials {
            Some(credentials) => {
                request.basic_auth(&credentials.user, Some(&credentials.password))
            }
            None => request,
        };

        let request_error = |source| GatewayError::Request {
            url: url.to_string(),
            source,
        };

        let response = request.send().map_err(request_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().map_err(request_error)?;
        serde_json::from_str(&body).map_err(|source| GatewayError::Decode {
            origin: url.to_string(),
            source,
        })
    }
}
