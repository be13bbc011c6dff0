//! Request types

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Body of `POST /ask`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AskRequest {
    /// The raw user-typed question
    #[serde(default)]
    pub question: Option<String>,

    /// Conversation to continue; a new one is started when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl AskRequest {
    /// Create a request for a fresh conversation
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: Some(question.into()),
            session_id: None,
        }
    }

    /// Continue an existing conversation
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// The trimmed question, or a validation error when missing or blank
    pub fn validated_question(&self) -> Result<&str> {
        self.question
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| Error::validation("Question is required"))
    }

    /// The trimmed session id, treating blank as absent
    pub fn session(&self) -> Option<&str> {
        self.session_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_question_rejected() {
        let request: AskRequest = serde_json::from_str("{}").unwrap();
        assert!(matches!(
            request.validated_question(),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_blank_question_rejected() {
        let request = AskRequest::new("   \n");
        assert!(request.validated_question().is_err());
    }

    #[test]
    fn test_question_is_trimmed() {
        let request = AskRequest::new("  What is a heap?  ");
        assert_eq!(request.validated_question().unwrap(), "What is a heap?");
    }

    #[test]
    fn test_blank_session_is_absent() {
        let request = AskRequest::new("q").with_session("  ");
        assert_eq!(request.session(), None);
    }
}
