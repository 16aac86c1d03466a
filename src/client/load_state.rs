use std::future::Future;

use super::ClientError;

/// Where a piece of page data is in its fetch.
///
/// A refresh moves `Succeeded`/`Failed` back to `InFlight`; the last good
/// value is kept separately by callers that want to show stale data.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum LoadState<T> {
    #[default]
    NotStarted,
    InFlight,
    Succeeded(T),
    Failed(String),
}

impl<T> LoadState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::InFlight)
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            LoadState::Succeeded(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            LoadState::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn begin(&mut self) {
        *self = LoadState::InFlight;
    }

    pub fn finish(&mut self, result: Result<T, ClientError>) {
        *self = match result {
            Ok(data) => LoadState::Succeeded(data),
            Err(e) => LoadState::Failed(e.to_string()),
        };
    }

    /// Run `fetch`, with the state `InFlight` until it resolves.
    pub async fn load<F>(&mut self, fetch: F)
    where
        F: Future<Output = Result<T, ClientError>>,
    {
        self.begin();
        self.finish(fetch.await);
    }
}
