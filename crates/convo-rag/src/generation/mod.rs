//! Question rewriting and grounded answer generation

pub mod answerer;
pub mod prompt;
pub mod rewriter;

pub use answerer::Answerer;
pub use prompt::PromptBuilder;
pub use rewriter::QueryRewriter;
