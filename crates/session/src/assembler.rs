//! Prompt assembly: document text + transcript + question → one instruction string.
//!
//! The prompt is built from five segments, always in this order:
//!
//! 1. **Persona** directive
//! 2. **Document context** (heading + full text), empty when no text is loaded
//! 3. **Chat history**, one `role: text` line per turn
//! 4. **User question**
//! 5. **Instructions**, a numbered list
//!
//! # Determinism
//!
//! Assembly is pure: identical inputs always produce an identical prompt.
//! No clock, randomness or I/O is involved. Changing only the question
//! changes only the question segment.

use docchat_config::{Persona, SessionSettings};
use docchat_core::message::Turn;

const NEUTRAL_PERSONA: &str = "You are a Senior Hiring Manager at a top-tier company.";
const SKEPTICAL_PERSONA: &str = "You are a grumpy, skeptical Senior Hiring Manager at a top-tier company. \
You have seen thousands of resumes and you only recommend hiring a candidate who is truly exceptional.";

const HISTORY_HEADING: &str = "CHAT HISTORY:";
const QUESTION_HEADING: &str = "USER QUESTION:";
const INSTRUCTIONS_HEADING: &str = "INSTRUCTIONS:";

const HONESTY_RULE: &str = "Always be honest and direct.";
const SCORE_RULE: &str =
    "If asked for a score, provide a specific \"Pass Probability\" percentage (e.g., 85%).";
const GROUNDING_RULE: &str =
    "If the answer is not in the document, say so explicitly instead of guessing.";
const FORMAT_RULE: &str = "Keep answers structured and professional.";

/// What the assembler needs to know about the deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptConfig {
    pub persona: Persona,
    pub require_grounding_disclaimer: bool,
    pub score_directive: bool,
    pub context_heading: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self::from(&SessionSettings::default())
    }
}

impl From<&SessionSettings> for PromptConfig {
    fn from(settings: &SessionSettings) -> Self {
        Self {
            persona: settings.persona,
            require_grounding_disclaimer: settings.require_grounding_disclaimer,
            score_directive: settings.score_directive,
            context_heading: settings.context_heading.clone(),
        }
    }
}

/// An assembled prompt, kept as segments so each can be inspected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledPrompt {
    pub persona: String,
    /// Empty when no document text was supplied.
    pub context: String,
    pub history: String,
    pub question: String,
    pub instructions: String,
}

impl AssembledPrompt {
    /// Join the non-empty segments with blank lines.
    pub fn render(&self) -> String {
        [
            &self.persona,
            &self.context,
            &self.history,
            &self.question,
            &self.instructions,
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n\n")
    }
}

/// Builds prompts for one deployment.
#[derive(Debug, Clone, Default)]
pub struct PromptAssembler {
    config: PromptConfig,
}

impl PromptAssembler {
    pub fn new(config: PromptConfig) -> Self {
        Self { config }
    }

    /// Assemble a prompt from the document text, the transcript as it stood
    /// before this question, and the question itself.
    pub fn build(&self, document_text: &str, history: &[Turn], user_text: &str) -> AssembledPrompt {
        AssembledPrompt {
            persona: self.persona_segment().to_string(),
            context: self.context_segment(document_text),
            history: history_segment(history),
            question: format!("{QUESTION_HEADING}\n{user_text}"),
            instructions: self.instructions_segment(),
        }
    }

    fn persona_segment(&self) -> &'static str {
        match self.config.persona {
            Persona::Neutral => NEUTRAL_PERSONA,
            Persona::Skeptical => SKEPTICAL_PERSONA,
        }
    }

    fn context_segment(&self, document_text: &str) -> String {
        if document_text.is_empty() {
            return String::new();
        }
        format!("{}:\n{document_text}", self.config.context_heading)
    }

    fn instructions_segment(&self) -> String {
        let mut rules = vec![HONESTY_RULE];
        if self.config.score_directive {
            rules.push(SCORE_RULE);
        }
        if self.config.require_grounding_disclaimer {
            rules.push(GROUNDING_RULE);
        }
        rules.push(FORMAT_RULE);

        let mut out = String::from(INSTRUCTIONS_HEADING);
        for (i, rule) in rules.iter().enumerate() {
            out.push_str(&format!("\n{}. {rule}", i + 1));
        }
        out
    }
}

fn history_segment(history: &[Turn]) -> String {
    let mut out = String::from(HISTORY_HEADING);
    for turn in history {
        out.push('\n');
        out.push_str(turn.role().as_str());
        out.push_str(": ");
        out.push_str(turn.text());
    }
    out
}
