//! indogen-core: domain types and logic for the IndoGen-AI clinical dashboard
//!
//! Patient records and the BGSi store reader, the analysis prompt, the
//! per-session state machine, and the completion-client seam. Nothing here
//! depends on the web layer.

pub mod completion;
pub mod error;
pub mod patient;
pub mod prompt;
pub mod session;
pub mod store;

pub use completion::CompletionClient;
pub use error::{ConfigError, DataSourceError, ServiceError, SessionError, ValidationError};
pub use patient::{ETHNICITY_OPTIONS, InputMode, ManualForm, PatientRecord, StoreOverrides};
pub use session::{Effect, Event, Phase, ReportText, SessionState};
pub use store::PatientStore;
