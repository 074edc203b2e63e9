pub mod assemble;
pub mod auth;
pub mod config;
pub mod document;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod formatters;
pub mod item;
pub mod naming;
pub mod orchestrator;
pub mod session;

pub use assemble::Assembler;
pub use auth::{AuthState, AuthToken, Authenticator, extract_token, parse_setup_response};
pub use config::{Config, ConfigBuilder, Credentials, DEFAULT_BASE_URL, DocumentFormat, FailurePolicy};
#[cfg(feature = "pdf")]
pub use document::PdfConverter;
pub use document::{DocumentConverter, MarkdownConverter, converter_for};
pub use error::{BlinkpressError, ErrorKind, Result};
pub use extract::{ContentExtractor, ExtractConfig};
pub use fetch::ItemFetcher;
#[cfg(feature = "markdown")]
pub use formatters::HtmdConverter;
pub use formatters::{PlainTextConverter, TextConverter, default_text_converter};
pub use item::{Item, OutputDocument, Section};
#[doc(hidden)]
pub use naming::{SectionNamer, heading_case, snake_case, split_words, title_case};
pub use orchestrator::{ItemOutcome, Orchestrator, RunReport};
pub use session::{BROWSER_USER_AGENT, Session, SessionConfig, SessionRequest, SessionResponse};
