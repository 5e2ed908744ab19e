// 💬 Question Assistant - free-text questions about the migration tables
//
// Two modes: `echo` hands the (context + question) text straight back, and
// `openai` sends it to a chat-completion endpoint. Either way the caller gets
// a tagged reply; a failure is never dressed up as answer text.

use crate::config::{AssistantConfig, AssistantMode};
use crate::shaper::InteractionRow;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("Please enter a question.")]
    EmptyQuestion,

    #[error("request to the chat endpoint failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("chat endpoint answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("chat endpoint returned an unexpected payload: {0}")]
    MalformedResponse(String),
}

/// What the question box shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AssistantReply {
    Answered { text: String },
    Failed { reason: String },
}

impl AssistantReply {
    pub fn is_answered(&self) -> bool {
        matches!(self, AssistantReply::Answered { .. })
    }
}

impl From<Result<String, AssistantError>> for AssistantReply {
    fn from(result: Result<String, AssistantError>) -> Self {
        match result {
            Ok(text) => AssistantReply::Answered { text },
            Err(e) => AssistantReply::Failed {
                reason: e.to_string(),
            },
        }
    }
}

/// Table excerpts quoted in the system instruction
#[derive(Debug, Clone, Default)]
pub struct AssistantContext {
    pub in_migration: String,
    pub out_migration: String,
}

impl AssistantContext {
    pub fn from_tables(in_rows: &[InteractionRow], out_rows: &[InteractionRow], rows: usize) -> Self {
        Self {
            in_migration: render_table_excerpt(in_rows, rows),
            out_migration: render_table_excerpt(out_rows, rows),
        }
    }
}

pub trait Assistant: Send + Sync {
    fn ask(&self, question: &str, context: &AssistantContext) -> Result<String, AssistantError>;
}

/// Validate the question, ask, and fold the outcome into a reply
pub fn answer_question(
    assistant: &dyn Assistant,
    question: &str,
    context: &AssistantContext,
) -> AssistantReply {
    if question.trim().is_empty() {
        return AssistantReply::Failed {
            reason: AssistantError::EmptyQuestion.to_string(),
        };
    }

    let result = assistant.ask(question, context);
    match &result {
        Ok(text) => info!(chars = text.len(), "Assistant answered"),
        Err(e) => warn!("Assistant failed: {}", e),
    }
    result.into()
}

pub fn build_assistant(config: &AssistantConfig) -> Box<dyn Assistant> {
    match config.mode {
        AssistantMode::Echo => Box::new(EchoAssistant {
            context_prompt: config.context_prompt.clone(),
        }),
        AssistantMode::OpenAi => Box::new(OpenAiAssistant::new(config)),
    }
}

// ============================================================================
// ECHO
// ============================================================================

pub struct EchoAssistant {
    pub context_prompt: String,
}

impl Assistant for EchoAssistant {
    fn ask(&self, question: &str, _context: &AssistantContext) -> Result<String, AssistantError> {
        Ok(format!("{}{}", self.context_prompt, question))
    }
}

// ============================================================================
// CHAT COMPLETION
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f64,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// The blocking client is built per call: it must not be created or dropped
/// on an async runtime thread, and callers run `ask` off the runtime.
pub struct OpenAiAssistant {
    endpoint: String,
    model: String,
    temperature: f64,
    api_key: String,
    timeout: Duration,
}

impl OpenAiAssistant {
    pub fn new(config: &AssistantConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            api_key: config.api_key.clone().unwrap_or_default(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

impl Assistant for OpenAiAssistant {
    fn ask(&self, question: &str, context: &AssistantContext) -> Result<String, AssistantError> {
        let request = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_instruction(context),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: question.to_string(),
                },
            ],
        };

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()?;

        let response = client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(AssistantError::Status {
                status: status.as_u16(),
                body,
            });
        }

        parse_chat_response(&body)
    }
}

pub fn system_instruction(context: &AssistantContext) -> String {
    format!(
        "Instructions: Answer the following user query as if you were an assistant providing \
         information on migration between US counties. Keep your answers to less than 200 words, \
         about county migration and use formal English language. Where possible refer to \
         in-migration and out-migration dataframes: {} and {} respectively.",
        context.in_migration, context.out_migration
    )
}

fn parse_chat_response(body: &str) -> Result<String, AssistantError> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| AssistantError::MalformedResponse(e.to_string()))?;

    parsed
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| AssistantError::MalformedResponse("no choices".to_string()))
}

/// Head and tail of a table plus its shape, like a dataframe printout
pub fn render_table_excerpt(rows: &[InteractionRow], edge_rows: usize) -> String {
    let mut lines = vec!["\tCounty_Name1\tCounty_Name2\tMigration_Count\tCounty_Code".to_string()];

    let line = |idx: usize, row: &InteractionRow| {
        format!("{}\t{}\t{}\t{}\t{}", idx, row.name1, row.name2, row.count, row.code)
    };

    if rows.len() <= edge_rows * 2 {
        lines.extend(rows.iter().enumerate().map(|(i, row)| line(i, row)));
    } else {
        lines.extend(rows[..edge_rows].iter().enumerate().map(|(i, row)| line(i, row)));
        lines.push("...".to_string());
        let tail_start = rows.len() - edge_rows;
        lines.extend(
            rows[tail_start..]
                .iter()
                .enumerate()
                .map(|(i, row)| line(tail_start + i, row)),
        );
    }

    lines.push(format!("[{} rows x 4 columns]", rows.len()));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(n: usize) -> Vec<InteractionRow> {
        (0..n)
            .map(|i| InteractionRow {
                name1: format!("County {}", i),
                name2: format!("Unknown ({})", i),
                count: (1000 - i) as u64,
                code: format!("{:05}", i),
            })
            .collect()
    }

    struct FailingAssistant;

    impl Assistant for FailingAssistant {
        fn ask(&self, _: &str, _: &AssistantContext) -> Result<String, AssistantError> {
            Err(AssistantError::Status {
                status: 429,
                body: "rate limited".to_string(),
            })
        }
    }

    #[test]
    fn test_echo_returns_context_plus_question() {
        let assistant = EchoAssistant {
            context_prompt: String::new(),
        };
        let reply = answer_question(&assistant, "Which county grew most?", &AssistantContext::default());

        assert_eq!(
            reply,
            AssistantReply::Answered {
                text: "Which county grew most?".to_string()
            }
        );
    }

    #[test]
    fn test_empty_question_is_rejected() {
        let assistant = EchoAssistant {
            context_prompt: "ctx: ".to_string(),
        };
        let reply = answer_question(&assistant, "   ", &AssistantContext::default());

        assert_eq!(
            reply,
            AssistantReply::Failed {
                reason: "Please enter a question.".to_string()
            }
        );
    }

    #[test]
    fn test_failure_is_tagged_not_answer_text() {
        let reply = answer_question(&FailingAssistant, "hello", &AssistantContext::default());

        assert!(!reply.is_answered());
        match reply {
            AssistantReply::Failed { reason } => assert!(reason.contains("429")),
            AssistantReply::Answered { .. } => panic!("failure surfaced as an answer"),
        }
    }

    #[test]
    fn test_reply_serializes_with_status_tag() {
        let json = serde_json::to_value(AssistantReply::Failed {
            reason: "boom".to_string(),
        })
        .unwrap();

        assert_eq!(json["status"], "failed");
        assert_eq!(json["reason"], "boom");
    }

    #[test]
    fn test_parse_chat_response() {
        let body = r#"{"choices": [{"message": {"role": "assistant", "content": "Kings County."}}]}"#;
        assert_eq!(parse_chat_response(body).unwrap(), "Kings County.");

        assert!(matches!(
            parse_chat_response(r#"{"choices": []}"#),
            Err(AssistantError::MalformedResponse(_))
        ));
        assert!(parse_chat_response("not json").is_err());
    }

    #[test]
    fn test_unreachable_endpoint_fails_cleanly() {
        let config = AssistantConfig {
            mode: AssistantMode::OpenAi,
            endpoint: "http://127.0.0.1:9/v1/chat/completions".to_string(),
            api_key: Some("sk-test".to_string()),
            timeout_secs: 2,
            ..AssistantConfig::default()
        };
        let assistant = build_assistant(&config);
        let reply = answer_question(assistant.as_ref(), "hello", &AssistantContext::default());

        assert!(!reply.is_answered());
    }

    #[test]
    fn test_excerpt_short_table_is_complete() {
        let text = render_table_excerpt(&rows(3), 5);

        assert!(text.contains("2\tCounty 2"));
        assert!(!text.contains("..."));
        assert!(text.ends_with("[3 rows x 4 columns]"));
    }

    #[test]
    fn test_excerpt_long_table_has_head_and_tail() {
        let text = render_table_excerpt(&rows(20), 5);

        assert!(text.contains("4\tCounty 4"));
        assert!(!text.contains("\tCounty 5\t"));
        assert!(text.contains("..."));
        assert!(text.contains("19\tCounty 19"));
        assert!(text.ends_with("[20 rows x 4 columns]"));
    }

    #[test]
    fn test_system_instruction_quotes_both_tables() {
        let context = AssistantContext::from_tables(&rows(2), &rows(1), 5);
        let instruction = system_instruction(&context);

        assert!(instruction.contains("[2 rows x 4 columns] and"));
        assert!(instruction.contains("[1 rows x 4 columns] respectively"));
    }
}
