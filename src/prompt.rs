//! Deterministic prompt composition.
//!
//! The generation collaborator receives a single prompt string assembled
//! from four sections: retrieved study material, the session's rolling
//! summary, the recent-history snapshot, and the current question. The
//! template is fixed; only the slot contents vary, so the same pipeline
//! inputs always produce the same prompt.

const ANSWER_PREAMBLE: &str = "\
You are a syllabus tutoring assistant for Chemistry, Physics and Mathematics.

Instructions:
- Answer only questions related to the syllabus subjects.
- Prioritize the study material provided; fall back to your own knowledge when it is not relevant.
- Give precise, step-by-step explanations with formulas where needed.
- Use plain text formatting, never LaTeX.";

/// The slot contents for one answer prompt.
#[derive(Debug, Clone, Default)]
pub struct PromptInputs<'a> {
    /// Retrieved study-material passages, already relevance-filtered.
    pub passages: &'a [String],
    /// Rolling summary of the session's older dialogue, possibly empty.
    pub summary: &'a str,
    /// Recent-history snapshot rendered as `User:`/`Bot:` lines.
    pub history: &'a str,
    /// The current question text as submitted.
    pub question: &'a str,
}

/// Composes the answer prompt for the generation collaborator.
#[must_use]
pub fn answer_prompt(inputs: &PromptInputs<'_>) -> String {
    format!(
        "{ANSWER_PREAMBLE}\n\n\
         Use the following:\n\
         1. Study Material:\n{}\n\n\
         2. Chat Summary:\n{}\n\n\
         3. Chat History:\n{}\n\n\
         4. Current Question:\n{}",
        inputs.passages.join("\n"),
        inputs.summary,
        inputs.history,
        inputs.question,
    )
}

/// Composes the rolling-summary prompt: fold the previous summary and the
/// latest dialogue window into one condensed summary of bounded length.
#[must_use]
pub fn summarize_prompt(previous_summary: &str, new_dialogue: &str) -> String {
    format!(
        "Summarize the following conversation between a tutoring assistant and a student in under 100 words.\n\n\
         Previous Summary:\n{previous_summary}\n\n\
         New Dialogue:\n{new_dialogue}",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_prompt_is_deterministic() {
        let passages = vec!["p1".to_string(), "p2".to_string()];
        let inputs = PromptInputs {
            passages: &passages,
            summary: "sum",
            history: "User: q\nBot: a",
            question: "why?",
        };
        assert_eq!(answer_prompt(&inputs), answer_prompt(&inputs));
    }

    #[test]
    fn answer_prompt_contains_all_sections_in_order() {
        let passages = vec!["ideal gas law".to_string()];
        let inputs = PromptInputs {
            passages: &passages,
            summary: "summary text",
            history: "User: hi\nBot: hello",
            question: "state PV=nRT",
        };
        let prompt = answer_prompt(&inputs);
        let material = prompt.find("ideal gas law").unwrap();
        let summary = prompt.find("summary text").unwrap();
        let history = prompt.find("User: hi").unwrap();
        let question = prompt.find("state PV=nRT").unwrap();
        assert!(material < summary && summary < history && history < question);
    }

    #[test]
    fn empty_slots_still_render() {
        let prompt = answer_prompt(&PromptInputs::default());
        assert!(prompt.contains("Study Material:"));
        assert!(prompt.contains("Current Question:"));
    }

    #[test]
    fn summarize_prompt_bounds_length_in_instruction() {
        let prompt = summarize_prompt("old", "User: a\nBot: b");
        assert!(prompt.contains("under 100 words"));
        assert!(prompt.contains("old"));
        assert!(prompt.contains("User: a"));
    }
}
