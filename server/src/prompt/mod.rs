pub(crate) mod completion;
pub mod compose;
pub(crate) mod openai;
pub mod reword;

pub use completion::{
    ChatMessage, CompletionClient, CompletionOptions, SharedCompletionClient,
};
pub use openai::OpenAiClient;
