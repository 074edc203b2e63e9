//! Reader page retrieval for individual books.

use std::sync::Arc;

use tracing::info;

use crate::Result;
use crate::item::Item;
use crate::session::Session;

/// Fetches reader pages through an authenticated [`Session`].
#[derive(Debug, Clone)]
pub struct ItemFetcher {
    session: Arc<Session>,
    language: String,
}

impl ItemFetcher {
    pub fn new(session: Arc<Session>, language: impl Into<String>) -> Self {
        Self { session, language: language.into() }
    }

    /// Site-relative reader path, e.g. `/en/nc/reader/deep-work-en/`.
    pub fn reader_path(&self, item: &Item) -> String {
        format!("/{lang}/nc/reader/{item}-{lang}/", lang = self.language, item = item)
    }

    /// Downloads the reader HTML for `item`.
    ///
    /// The session must already be authenticated; an expired session is not
    /// retried and surfaces as whatever the site returns.
    pub async fn fetch(&self, item: &Item) -> Result<String> {
        info!(item = %item, "fetching reader page");
        self.session.get_text(&self.reader_path(item)).await
    }
}
