pub mod http;
pub mod replay;

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::{sleep, Instant};
use tracing::debug;

pub use http::HttpFetcher;
pub use replay::ReplayFetcher;

/// One `<option>` of the portal's institution or program selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub code: String,
    pub name: String,
}

/// Result of opening a program's curriculum tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CurriculumPage {
    Ready(String),
    /// The portal showed its error box instead of a curriculum tab, or the
    /// tab never appeared.
    Unavailable,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{what} not ready after {waited:?}")]
    NotReady { what: String, waited: Duration },
    #[error("session already released")]
    Released,
    #[error("no institution selected")]
    NoInstitution,
    #[error("unknown institution code {0:?}")]
    UnknownInstitution(String),
    #[error("bad listing {what}: {source}")]
    Decode {
        what: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{url} answered {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Bounded waits used by a transport.
#[derive(Debug, Clone, Copy)]
pub struct Waits {
    /// Landing page and program selector.
    pub ready: Duration,
    pub curriculum: Duration,
    pub poll: Duration,
}

impl Default for Waits {
    fn default() -> Self {
        Waits {
            ready: Duration::from_millis(5000),
            curriculum: Duration::from_millis(3000),
            poll: Duration::from_millis(100),
        }
    }
}

/// One interactive session with the catalog portal.
///
/// The session has a single current page, so calls must be made one at a
/// time and in order: landing page, institution list, select, program list,
/// curriculum. Every call returns once its page is ready or its wait expires.
#[allow(async_fn_in_trait)]
pub trait PageFetcher {
    /// Fails when the institution selector never becomes usable.
    async fn load_landing_page(&mut self) -> Result<(), FetchError>;

    /// Institutions in portal order, empty codes left out.
    async fn list_institutions(&mut self) -> Result<Vec<Choice>, FetchError>;

    /// Returns once the program selector of `code` is populated.
    async fn select_institution(&mut self, code: &str) -> Result<(), FetchError>;

    /// Programs of the selected institution, empty codes left out.
    async fn list_programs(&mut self) -> Result<Vec<Choice>, FetchError>;

    async fn open_curriculum(&mut self, program_code: &str) -> Result<CurriculumPage, FetchError>;

    /// Idempotent.
    fn release(&mut self);
}

/// Poll `probe` until it yields a value or `limit` has passed.
pub async fn wait_for<T, F, Fut>(
    what: &str,
    limit: Duration,
    poll: Duration,
    mut probe: F,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, FetchError>>,
{
    let started = Instant::now();
    loop {
        if let Some(value) = probe().await? {
            return Ok(value);
        }
        let waited = started.elapsed();
        if waited >= limit {
            debug!("Gave up waiting for {} after {:?}", what, waited);
            return Err(FetchError::NotReady {
                what: what.to_string(),
                waited,
            });
        }
        sleep(poll).await;
    }
}

/// Decode a `[{code, name}]` listing, dropping entries with an empty code.
pub(crate) fn decode_choices(what: &str, body: &str) -> Result<Vec<Choice>, FetchError> {
    let raw: Vec<Choice> = serde_json::from_str(body).map_err(|source| FetchError::Decode {
        what: what.to_string(),
        source,
    })?;
    Ok(raw
        .into_iter()
        .filter_map(|c| {
            let code = c.code.trim();
            if code.is_empty() {
                None
            } else {
                Some(Choice {
                    code: code.to_string(),
                    name: c.name.trim().to_string(),
                })
            }
        })
        .collect())
}
