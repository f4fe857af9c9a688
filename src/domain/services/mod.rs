mod chat_sessions;
mod ingredient_aggregator;
mod recipe_workflow;
pub mod stream_decoder;

pub use chat_sessions::*;
pub use ingredient_aggregator::*;
pub use recipe_workflow::*;
