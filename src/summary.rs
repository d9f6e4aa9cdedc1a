//! Periodic rolling-summary refresh.
//!
//! Every `window` persisted turns, the last `window` question records plus
//! the previous rolling summary are folded into a new summary through the
//! generation collaborator, and the stored summary is replaced wholesale.
//! The trigger condition is evaluated exactly once per turn, after the
//! persist stage; a refresh failure is swallowed and logged, leaving the
//! previous summary in place.

use crate::clients::GenerationClient;
use crate::store::{ContextStore, QuestionRecord};

/// When and how much dialogue to summarize.
#[derive(Clone, Copy, Debug)]
pub struct SummaryPolicy {
    /// Number of persisted turns between refreshes.
    pub window: u32,
}

impl Default for SummaryPolicy {
    fn default() -> Self {
        Self { window: 6 }
    }
}

impl SummaryPolicy {
    /// Whether the turn that brought the session to `total_turns` lands on
    /// a summarization boundary. Zero turns never triggers.
    #[must_use]
    pub fn due(&self, total_turns: u64) -> bool {
        self.window > 0 && total_turns > 0 && total_turns % u64::from(self.window) == 0
    }
}

/// Renders question records as the dialogue block the summarize prompt
/// expects, chronological, one `User:`/`Bot:` pair per record.
#[must_use]
pub fn render_dialogue(records: &[QuestionRecord]) -> String {
    records
        .iter()
        .map(|r| format!("User: {}\nBot: {}", r.question, r.answer))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Refreshes the session's rolling summary.
///
/// Reads the last `window` question records and the previous summary,
/// asks the generation collaborator to fold them, and replaces the stored
/// summary. Every failure path is terminal for the refresh only: it is
/// logged and the previous summary survives untouched.
pub async fn refresh_summary(
    store: &dyn ContextStore,
    generation: &dyn GenerationClient,
    policy: SummaryPolicy,
    session_id: &str,
) {
    let records = match store
        .last_question_records(session_id, policy.window)
        .await
    {
        Ok(records) => records,
        Err(error) => {
            tracing::warn!(session = %session_id, %error, "summary refresh: history read failed");
            return;
        }
    };
    let previous = match store.summary(session_id).await {
        Ok(previous) => previous,
        Err(error) => {
            tracing::warn!(session = %session_id, %error, "summary refresh: summary read failed");
            return;
        }
    };

    let dialogue = render_dialogue(&records);
    let new_summary = match generation.summarize(&previous, &dialogue).await {
        Ok(summary) => summary,
        Err(error) => {
            tracing::warn!(session = %session_id, %error, "summary refresh: generation failed");
            return;
        }
    };

    if let Err(error) = store.replace_summary(session_id, &new_summary).await {
        tracing::warn!(session = %session_id, %error, "summary refresh: replace failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_only_on_exact_window_multiples() {
        let policy = SummaryPolicy::default();
        for turns in 1..=5 {
            assert!(!policy.due(turns), "turn count {turns} must not trigger");
        }
        assert!(policy.due(6));
        assert!(!policy.due(7));
        assert!(policy.due(12));
        assert!(!policy.due(0));
    }

    #[test]
    fn zero_window_never_triggers() {
        let policy = SummaryPolicy { window: 0 };
        assert!(!policy.due(0));
        assert!(!policy.due(6));
    }

    #[test]
    fn dialogue_rendering() {
        let records = vec![
            QuestionRecord {
                question: "q1".into(),
                answer: "a1".into(),
            },
            QuestionRecord {
                question: "q2".into(),
                answer: "a2".into(),
            },
        ];
        assert_eq!(
            render_dialogue(&records),
            "User: q1\nBot: a1\nUser: q2\nBot: a2"
        );
        assert_eq!(render_dialogue(&[]), "");
    }
}
