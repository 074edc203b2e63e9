//! Runs the whole download for a list of books.
//!
//! The orchestrator logs in once and then pushes every book through
//! fetch, extract and assemble. Books run concurrently up to the configured
//! bound, each book's steps run in order, and every book ends up with its own
//! [`ItemOutcome`] in the returned [`RunReport`].

use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::assemble::Assembler;
use crate::auth::Authenticator;
use crate::config::{Config, Credentials, FailurePolicy, first_duplicate};
use crate::document::{DocumentConverter, converter_for};
use crate::extract::{ContentExtractor, ExtractConfig};
use crate::fetch::ItemFetcher;
use crate::formatters::{TextConverter, default_text_converter};
use crate::item::{Item, OutputDocument};
use crate::session::{Session, SessionConfig};
use crate::{BlinkpressError, Result};

/// Result of one book's pipeline.
#[derive(Debug)]
pub enum ItemOutcome {
    Completed(OutputDocument),
    /// The pipeline failed, or was cancelled with [`BlinkpressError::Cancelled`].
    Failed(BlinkpressError),
}

impl ItemOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, ItemOutcome::Completed(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ItemOutcome::Failed(BlinkpressError::Cancelled))
    }

    pub fn document(&self) -> Option<&OutputDocument> {
        match self {
            ItemOutcome::Completed(document) => Some(document),
            ItemOutcome::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&BlinkpressError> {
        match self {
            ItemOutcome::Completed(_) => None,
            ItemOutcome::Failed(err) => Some(err),
        }
    }
}

/// Per-book outcomes of a run, in the order the books were given.
#[derive(Debug, Default)]
pub struct RunReport {
    pub results: Vec<(Item, ItemOutcome)>,
}

impl RunReport {
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Number of books whose document was written.
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|(_, outcome)| outcome.is_completed()).count()
    }

    /// Number of books that failed or were cancelled.
    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }

    pub fn cancelled(&self) -> usize {
        self.results.iter().filter(|(_, outcome)| outcome.is_cancelled()).count()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// First real failure in book order; cancellations are skipped.
    pub fn first_error(&self) -> Option<&BlinkpressError> {
        self.results
            .iter()
            .filter_map(|(_, outcome)| outcome.error())
            .find(|err| !matches!(err, BlinkpressError::Cancelled))
    }

    pub fn documents(&self) -> impl Iterator<Item = &OutputDocument> {
        self.results.iter().filter_map(|(_, outcome)| outcome.document())
    }
}

/// Authenticated, bounded-concurrency pipeline runner.
pub struct Orchestrator {
    session: Arc<Session>,
    credentials: Credentials,
    fetcher: ItemFetcher,
    extractor: ContentExtractor,
    assembler: Assembler,
    concurrency: usize,
    failure_policy: FailurePolicy,
}

impl Orchestrator {
    /// Builds the session and every pipeline stage from a validated configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let session = Arc::new(Session::new(SessionConfig::from_config(config)?)?);
        let fetcher = ItemFetcher::new(Arc::clone(&session), config.language.clone());
        let extract_config = ExtractConfig { output_dir: config.output_dir.clone(), ..Default::default() };
        let extractor = ContentExtractor::new(extract_config, default_text_converter());
        let assembler = Assembler::new(&config.output_dir, converter_for(config.format)?);

        Ok(Self {
            session,
            credentials: config.credentials(),
            fetcher,
            extractor,
            assembler,
            concurrency: config.concurrency.max(1),
            failure_policy: config.failure_policy,
        })
    }

    /// Replaces the HTML to Markdown converter.
    pub fn with_text_converter(mut self, converter: Arc<dyn TextConverter>) -> Self {
        self.extractor = ContentExtractor::new(self.extractor.config().clone(), converter);
        self
    }

    /// Replaces the document converter; output paths take its extension.
    pub fn with_document_converter(mut self, converter: Arc<dyn DocumentConverter>) -> Self {
        self.assembler = Assembler::new(&self.extractor.config().output_dir, converter);
        self
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Logs in, then processes `items`.
    ///
    /// Returns `Err` when `items` repeats a book or logging in fails; no book
    /// is fetched in either case. Book failures are reported per book in the
    /// [`RunReport`].
    pub async fn run(&self, items: &[Item]) -> Result<RunReport> {
        if let Some(item) = first_duplicate(items) {
            return Err(BlinkpressError::ConfigError(format!("book '{}' is listed more than once", item)));
        }

        let mut authenticator = Authenticator::new(Arc::clone(&self.session));
        authenticator.authenticate(&self.credentials).await?;

        let cancel = CancellationToken::new();
        let mut outcomes: Vec<Option<ItemOutcome>> = items.iter().map(|_| None).collect();

        let mut pipelines = stream::iter(items.iter().enumerate())
            .map(|(index, item)| {
                let cancel = cancel.clone();
                async move { (index, self.run_item(item, &cancel).await) }
            })
            .buffer_unordered(self.concurrency);

        while let Some((index, outcome)) = pipelines.next().await {
            let item = &items[index];
            match &outcome {
                ItemOutcome::Completed(document) => {
                    info!(item = %item, path = %document.path.display(), sections = document.section_count, "book complete")
                }
                ItemOutcome::Failed(BlinkpressError::Cancelled) => info!(item = %item, "book cancelled"),
                ItemOutcome::Failed(err) => {
                    warn!(item = %item, error = %err, "book failed");
                    if self.failure_policy == FailurePolicy::CancelRemaining && !cancel.is_cancelled() {
                        warn!("cancelling remaining books");
                        cancel.cancel();
                    }
                }
            }
            outcomes[index] = Some(outcome);
        }
        drop(pipelines);

        let results = items
            .iter()
            .cloned()
            .zip(outcomes)
            .map(|(item, outcome)| (item, outcome.unwrap_or(ItemOutcome::Failed(BlinkpressError::Cancelled))))
            .collect();

        let report = RunReport { results };
        info!(succeeded = report.succeeded(), total = report.total(), "run finished");
        Ok(report)
    }

    /// Fetch, extract and assemble one book. Does not log in.
    pub async fn process(&self, item: &Item) -> Result<OutputDocument> {
        let html = self.fetcher.fetch(item).await?;
        let sections = self.extractor.extract(item, &html)?;
        self.assembler.assemble(item, &sections).await
    }

    /// Runs one book, checking for cancellation between stages.
    ///
    /// Only the download is abandoned mid-flight. Once assembly starts it
    /// runs to completion, so a document on disk is always reported.
    async fn run_item(&self, item: &Item, cancel: &CancellationToken) -> ItemOutcome {
        if cancel.is_cancelled() {
            return ItemOutcome::Failed(BlinkpressError::Cancelled);
        }

        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => return ItemOutcome::Failed(BlinkpressError::Cancelled),
            result = self.fetcher.fetch(item) => result,
        };
        let html = match fetched {
            Ok(html) => html,
            Err(err) => return ItemOutcome::Failed(err),
        };

        if cancel.is_cancelled() {
            return ItemOutcome::Failed(BlinkpressError::Cancelled);
        }
        let sections = match self.extractor.extract(item, &html) {
            Ok(sections) => sections,
            Err(err) => return ItemOutcome::Failed(err),
        };

        if cancel.is_cancelled() {
            return ItemOutcome::Failed(BlinkpressError::Cancelled);
        }
        match self.assembler.assemble(item, &sections).await {
            Ok(document) => ItemOutcome::Completed(document),
            Err(err) => ItemOutcome::Failed(err),
        }
    }
}
