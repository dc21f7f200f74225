pub mod answer;
pub mod completion;
pub mod context;
pub mod error;
pub mod extract;
pub mod resolve;
pub mod store;
pub mod types;

pub use answer::{AnswerEngine, LlmEngine, LocalEngine, Strategy};
pub use completion::{CompletionClient, CompletionConfig, OpenAiClient};
pub use context::ContextBuilder;
pub use error::{ConciergeError, Result};
pub use extract::{Extractor, MemberIndex, MemberProfile, ProfileBuilder};
pub use resolve::NameResolver;
pub use store::{
    CacheStatus, HttpMessageSource, MessageSource, MessageStore, SourceConfig, UpstreamHealth,
};
pub use types::*;
