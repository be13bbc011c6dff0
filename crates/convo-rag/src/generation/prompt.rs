//! Prompt templates for rewriting and answering

use crate::config::PromptConfig;

/// System instruction for turning the last user turn into a standalone question
pub const REWRITE_INSTRUCTION: &str = "You are a query rewriting expert. \
Based on the provided chat history, rephrase the \"Follow Up user Question\" \
(the last user turn) into a complete, standalone question that can be understood \
without the chat history.\n\
Only output the rewritten question and nothing else.";

/// Prompt builder for the two model calls
pub struct PromptBuilder;

impl PromptBuilder {
    /// Instruction for the rewrite call
    pub fn rewrite_instruction() -> &'static str {
        REWRITE_INSTRUCTION
    }

    /// Instruction for the answer call, with the sanitized context embedded
    pub fn answer_instruction(prompts: &PromptConfig, context: &str) -> String {
        format!(
            r#"{persona}
Answer the user's question based ONLY on the provided context.
If the answer is not in the context, respond exactly: "{fallback}"

Context:
```
{context}
```
"#,
            persona = prompts.persona.trim(),
            fallback = prompts.fallback_answer.trim(),
            context = context
        )
    }

    /// Join chunk texts into one context block
    pub fn build_context<S: AsRef<str>>(chunks: &[S], separator: &str) -> String {
        chunks
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(separator)
    }

    /// Replace characters the model could read as markup emphasis
    pub fn sanitize_context(context: &str) -> String {
        context
            .chars()
            .map(|c| match c {
                '*' | '_' => '-',
                other => other,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_removes_emphasis_markers() {
        let raw = "**Heap** property: parent_key >= child_key, see *note* __init__";
        let clean = PromptBuilder::sanitize_context(raw);

        assert!(!clean.contains('*'));
        assert!(!clean.contains('_'));
        assert_eq!(clean, "--Heap-- property: parent-key >= child-key, see -note- --init--");
    }

    #[test]
    fn test_sanitize_keeps_plain_text() {
        let raw = "A queue is FIFO.\n\n---\n\nA deque allows both ends.";
        assert_eq!(PromptBuilder::sanitize_context(raw), raw);
    }

    #[test]
    fn test_build_context_joins_in_order() {
        let chunks = ["first", "second", "third"];
        assert_eq!(
            PromptBuilder::build_context(&chunks, "\n\n---\n\n"),
            "first\n\n---\n\nsecond\n\n---\n\nthird"
        );
    }

    #[test]
    fn test_build_context_empty() {
        let chunks: [&str; 0] = [];
        assert_eq!(PromptBuilder::build_context(&chunks, "|"), "");
    }

    #[test]
    fn test_answer_instruction_embeds_context_and_fallback() {
        let prompts = PromptConfig::default();
        let instruction = PromptBuilder::answer_instruction(&prompts, "A stack is a LIFO structure.");

        assert!(instruction.starts_with("You are a Data Structure and Algorithm Expert."));
        assert!(instruction.contains("based ONLY on the provided context"));
        assert!(instruction.contains(&prompts.fallback_answer));
        assert!(instruction.contains("```\nA stack is a LIFO structure.\n```"));
    }
}
