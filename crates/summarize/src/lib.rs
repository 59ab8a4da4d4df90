//! AI-assisted certificate summarization with a deterministic fallback
//!
//! The primary path sends the OCR text to the OpenAI chat-completions API and
//! returns the first choice verbatim. Every upstream failure (missing key,
//! transport, auth, malformed response) is recoverable: the caller always gets
//! a summary, and [`SummaryOutcome`] records which path produced it so callers
//! can tell "used AI" from "used fallback" without inspecting logs.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Maximum completion tokens requested from the API
const MAX_OUTPUT_TOKENS: u32 = 200;

/// Characters of the first line quoted by the deterministic fallback
const FALLBACK_PREVIEW_CHARS: usize = 100;

const SYSTEM_PROMPT: &str = "You are an assistant that summarizes academic certificate \
documents. Write 2-3 sentences covering the key facts: the student's name, the degree or \
qualification awarded, and the issuing institution. Use only information present in the text.";

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Why the deterministic fallback was used instead of the AI path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// No API key configured; the AI path was never attempted
    NoApiKey,
    /// The document had no non-empty lines to summarize
    EmptyDocument,
    /// The AI call was attempted and failed
    UpstreamError(String),
}

/// A produced summary, tagged with the path that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum SummaryOutcome {
    /// The hosted chat-completion API produced the text
    Ai { text: String },
    /// A deterministic local summary was used
    Fallback { text: String, reason: FallbackReason },
}

impl SummaryOutcome {
    /// The summary text regardless of which path produced it
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Ai { text } | Self::Fallback { text, .. } => text,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Certificate summarizer
#[derive(Debug, Clone)]
pub struct Summarizer {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
}

impl Summarizer {
    /// Create a summarizer. With `api_key = None` every call takes the
    /// deterministic fallback directly.
    #[must_use]
    pub fn new(api_key: Option<String>, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
        }
    }

    /// Summarize OCR text. Never fails; upstream errors degrade to the
    /// deterministic fallback.
    pub async fn summarize(&self, ocr_text: &str) -> SummaryOutcome {
        let Some(api_key) = &self.api_key else {
            debug!("No AI credential configured, using deterministic summary");
            return SummaryOutcome::Fallback {
                text: deterministic_summary(ocr_text),
                reason: FallbackReason::NoApiKey,
            };
        };

        if !ocr_text.lines().any(|l| !l.trim().is_empty()) {
            return SummaryOutcome::Fallback {
                text: deterministic_summary(ocr_text),
                reason: FallbackReason::EmptyDocument,
            };
        }

        match self.request_completion(api_key, ocr_text).await {
            Ok(text) => SummaryOutcome::Ai { text },
            Err(e) => {
                warn!("AI summarization failed, using deterministic summary: {e}");
                SummaryOutcome::Fallback {
                    text: deterministic_summary(ocr_text),
                    reason: FallbackReason::UpstreamError(e),
                }
            }
        }
    }

    async fn request_completion(&self, api_key: &str, ocr_text: &str) -> Result<String, String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                Message {
                    role: "user",
                    content: ocr_text,
                },
            ],
            max_tokens: MAX_OUTPUT_TOKENS,
            temperature: 0.3,
        };

        let response = self
            .client
            .post(OPENAI_CHAT_URL)
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&request)
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("API error ({status}): {body}"));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| format!("failed to parse response: {e}"))?;

        chat.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| "response contained no choices".to_string())
    }
}

/// Local summary used whenever the AI path is unavailable or fails.
#[must_use]
pub fn deterministic_summary(ocr_text: &str) -> String {
    let lines: Vec<&str> = ocr_text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    if lines.is_empty() {
        return "No text content found in document.".to_string();
    }

    let preview: String = lines[0].chars().take(FALLBACK_PREVIEW_CHARS).collect();
    format!(
        "Document contains {} lines of text. First line: {}...",
        lines.len(),
        preview
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_summary_empty_document() {
        assert_eq!(
            deterministic_summary(""),
            "No text content found in document."
        );
        assert_eq!(
            deterministic_summary("\n  \n\t\n"),
            "No text content found in document."
        );
    }

    #[test]
    fn test_deterministic_summary_counts_nonempty_lines() {
        let text = "Name: Alice\n\nDegree: BSc\n";
        assert_eq!(
            deterministic_summary(text),
            "Document contains 2 lines of text. First line: Name: Alice..."
        );
    }

    #[test]
    fn test_deterministic_summary_truncates_first_line() {
        let long_line = "y".repeat(250);
        let summary = deterministic_summary(&long_line);
        assert!(summary.contains(&"y".repeat(FALLBACK_PREVIEW_CHARS)));
        assert!(!summary.contains(&"y".repeat(FALLBACK_PREVIEW_CHARS + 1)));
        assert!(summary.ends_with("..."));
    }

    #[tokio::test]
    async fn test_summarize_without_api_key_uses_fallback() {
        let summarizer = Summarizer::new(None, "gpt-4o-mini".to_string());
        let outcome = summarizer.summarize("Name: Alice\nDegree: BSc").await;
        match outcome {
            SummaryOutcome::Fallback { reason, text } => {
                assert_eq!(reason, FallbackReason::NoApiKey);
                assert!(text.starts_with("Document contains 2 lines"));
            }
            SummaryOutcome::Ai { .. } => panic!("expected fallback without API key"),
        }
    }

    #[tokio::test]
    async fn test_summarize_empty_document_with_key_skips_api() {
        // Empty input short-circuits before any network call, so a bogus key
        // never leaves the process.
        let summarizer = Summarizer::new(Some("sk-invalid".to_string()), "gpt-4o-mini".to_string());
        let outcome = summarizer.summarize("   \n ").await;
        match outcome {
            SummaryOutcome::Fallback { reason, text } => {
                assert_eq!(reason, FallbackReason::EmptyDocument);
                assert_eq!(text, "No text content found in document.");
            }
            SummaryOutcome::Ai { .. } => panic!("expected fallback for empty document"),
        }
    }

    #[test]
    fn test_outcome_text_accessor() {
        let ai = SummaryOutcome::Ai {
            text: "summary".to_string(),
        };
        assert_eq!(ai.text(), "summary");

        let fb = SummaryOutcome::Fallback {
            text: "fallback".to_string(),
            reason: FallbackReason::NoApiKey,
        };
        assert_eq!(fb.text(), "fallback");
    }

    #[test]
    fn test_outcome_serialization_tags_source() {
        let ai = SummaryOutcome::Ai {
            text: "s".to_string(),
        };
        let json = serde_json::to_value(&ai).unwrap();
        assert_eq!(json["source"], "ai");

        let fb = SummaryOutcome::Fallback {
            text: "s".to_string(),
            reason: FallbackReason::EmptyDocument,
        };
        let json = serde_json::to_value(&fb).unwrap();
        assert_eq!(json["source"], "fallback");
    }
}
