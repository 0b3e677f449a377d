//! HTTP remote store: one JSON document at a URL, read with GET and
//! overwritten with PUT.

use std::time::Duration;

use agenda_core::store::{RemoteDocument, RemoteStore};
use agenda_core::{AgendaError, AgendaResult};
use reqwest::StatusCode;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub struct HttpRemoteStore {
    http: reqwest::Client,
    url: String,
}

impl HttpRemoteStore {
    pub fn new(url: impl Into<String>) -> AgendaResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(agenda_core::identity::native_user_agent())
            .build()
            .map_err(remote_error)?;

        Ok(HttpRemoteStore {
            http,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

fn remote_error(e: reqwest::Error) -> AgendaError {
    AgendaError::Remote(e.to_string())
}

impl RemoteStore for HttpRemoteStore {
    async fn fetch(&self) -> AgendaResult<Option<RemoteDocument>> {
        let resp = self.http.get(&self.url).send().await.map_err(remote_error)?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        // Document stores answer `null` for a path that was never written
        resp.error_for_status()
            .map_err(remote_error)?
            .json::<Option<RemoteDocument>>()
            .await
            .map_err(remote_error)
    }

    async fn put(&self, document: &RemoteDocument) -> AgendaResult<()> {
        self.http
            .put(&self.url)
            .json(document)
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(remote_error)?;

        Ok(())
    }
}
