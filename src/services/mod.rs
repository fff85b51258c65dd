pub mod completion_client;
pub mod prompts;
pub mod search_client;
pub mod truncation;

pub use completion_client::{
    backoff_delay, first_choice_content, ChatCompletionRequest, ChatMessage, CompletionClient, Role,
};
pub use search_client::SearchClient;
