use crate::deepseek::{ChatMessage, CompletionParams};

const HOOK_INSTRUCTIONS: &str = r#"You are an expert at analyzing YouTube video transcripts and identifying hook techniques and content structure. Analyze the transcript in two parts:

1. Intro Analysis: For each sentence in the introduction (first few sentences), explain the specific hook technique being used in a single concise sentence.

2. Body Outline: Extract up to 6 main points from the rest of the content, formatted as a simple outline.

Return your response as a JSON object (not wrapped in any markdown code blocks) with this structure:
{
  "introAnalysis": [
    {
      "text": "The actual sentence from the video",
      "technique": "One sentence explanation of the technique used"
    }
  ],
  "bodyOutline": [
    "Main point 1",
    "Main point 2"
  ]
}"#;

const RESEARCH_INSTRUCTIONS: &str = r#"You are an expert at analyzing YouTube video transcripts in the context of specific research questions. Your task is to:

1. Analyze the transcript and identify key points that are relevant to the research question
2. Break down the analysis into distinct, focused cards
3. Each card should have:
   - A clear, concise title that summarizes the key point
   - A brief analysis (maximum 5 sentences) explaining how it relates to the research question

Return your response as a JSON object (not wrapped in any markdown code blocks) with this structure:
{
  "cards": [
    {
      "title": "Clear, action-oriented title",
      "analysis": "Concise analysis text (max 5 sentences)"
    }
  ]
}"#;

/// Fixed parameters for one analysis endpoint. The instruction text is a
/// compile-time constant and never carries user input, so a transcript
/// cannot rewrite the declared output contract.
pub struct AnalysisParams {
    pub endpoint: &'static str,
    pub instructions: &'static str,
    pub max_transcript_chars: usize,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

/// Quick hook analysis: small context, short reply
pub const HOOK: AnalysisParams = AnalysisParams {
    endpoint: "analyze",
    instructions: HOOK_INSTRUCTIONS,
    max_transcript_chars: 12_000,
    temperature: 0.7,
    max_output_tokens: 2_000,
};

/// Long-form research analysis: much larger context and reply
pub const RESEARCH: AnalysisParams = AnalysisParams {
    endpoint: "research",
    instructions: RESEARCH_INSTRUCTIONS,
    max_transcript_chars: 100_000,
    temperature: 0.7,
    max_output_tokens: 4_000,
};

impl AnalysisParams {
    pub fn completion_params(&self) -> CompletionParams {
        CompletionParams {
            temperature: self.temperature,
            max_tokens: self.max_output_tokens,
        }
    }

    /// Build the two-message conversation: instructions first, then the
    /// prepared user content verbatim.
    pub fn build_messages(&self, user_content: String) -> Vec<ChatMessage> {
        vec![
            ChatMessage {
                role: "system".to_string(),
                content: self.instructions.to_string(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: user_content,
            },
        ]
    }
}

/// Bound text to a character budget without splitting a UTF-8 code point.
/// A crude stand-in for a token ceiling; inputs at or under the budget
/// come back unchanged.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// User message for the research variant: the validated question on a
/// header line, then the (already truncated) transcript.
pub fn research_user_content(question: &str, transcript: &str) -> String {
    format!("Research Question: {question}\n\nTranscript: {transcript}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_input_unchanged() {
        assert_eq!(truncate_chars("hello", 12_000), "hello");
    }

    #[test]
    fn test_truncate_exact_length_unchanged() {
        let text = "a".repeat(100);
        assert_eq!(truncate_chars(&text, 100), text);
    }

    #[test]
    fn test_truncate_long_input_is_prefix() {
        let text = "abcdef".repeat(100);
        let truncated = truncate_chars(&text, 10);
        assert_eq!(truncated.chars().count(), 10);
        assert!(text.starts_with(truncated));
    }

    #[test]
    fn test_truncate_multibyte_safe() {
        let text = "héllo wörld日本語テキスト";
        let truncated = truncate_chars(text, 8);
        assert_eq!(truncated.chars().count(), 8);
        assert!(text.starts_with(truncated));
    }

    #[test]
    fn test_truncate_empty_input() {
        assert_eq!(truncate_chars("", 12_000), "");
        assert_eq!(truncate_chars("", 0), "");
    }

    #[test]
    fn test_truncate_zero_budget() {
        assert_eq!(truncate_chars("hello", 0), "");
    }

    #[test]
    fn test_build_messages_order_and_roles() {
        let messages = HOOK.build_messages("the transcript".to_string());
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[0].content, HOOK.instructions);
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[1].content, "the transcript");
    }

    #[test]
    fn test_research_user_content_header() {
        let content = research_user_content("How do creators retain viewers?", "Hello world.");
        assert_eq!(
            content,
            "Research Question: How do creators retain viewers?\n\nTranscript: Hello world."
        );
    }

    #[test]
    fn test_variant_budgets() {
        assert_eq!(HOOK.max_transcript_chars, 12_000);
        assert_eq!(HOOK.max_output_tokens, 2_000);
        assert_eq!(RESEARCH.max_transcript_chars, 100_000);
        assert_eq!(RESEARCH.max_output_tokens, 4_000);
    }
}
