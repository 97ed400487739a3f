//! Input and output handling shared by the CLI tools.

use orchestrations_core::AgentRun;

/// Printed by `websearch` when a run ends without any assistant message.
pub const NO_RESPONSE: &str = "No response generated.";

/// Inputs that end a chat session, compared case-insensitively.
pub const QUIT_COMMANDS: [&str; 3] = ["quit", "exit", "q"];

/// Returns the text `websearch` prints for a finished run.
///
/// An empty final answer is printed as it is.
#[inline]
pub fn answer_text(run: &AgentRun) -> &str {
    run.answer().unwrap_or(NO_RESPONSE)
}

/// Returns whether a chat input line ends the session.
pub fn is_quit_command(input: &str) -> bool {
    let input = input.trim();
    QUIT_COMMANDS
        .iter()
        .any(|cmd| input.eq_ignore_ascii_case(cmd))
}

#[cfg(test)]
mod tests {
    use orchestrations_core::conversation::Conversation;
    use orchestrations_model::ModelMessage;

    use super::*;

    fn run(messages: Vec<ModelMessage>) -> AgentRun {
        AgentRun {
            conversation: Conversation::from_messages(messages),
            agent_steps: 1,
            tool_steps: 0,
        }
    }

    #[test]
    fn test_answer_text() {
        let answered = run(vec![
            ModelMessage::user("What is the weather in Paris?"),
            ModelMessage::assistant("Sunny, 21°C."),
        ]);
        assert_eq!(answer_text(&answered), "Sunny, 21°C.");

        let empty = run(vec![
            ModelMessage::user("What is the weather in Paris?"),
            ModelMessage::assistant(""),
        ]);
        assert_eq!(answer_text(&empty), "");

        let unanswered =
            run(vec![ModelMessage::user("What is the weather in Paris?")]);
        assert_eq!(answer_text(&unanswered), NO_RESPONSE);
    }

    #[test]
    fn test_is_quit_command() {
        for input in ["quit", "EXIT", " q ", "Quit"] {
            assert!(is_quit_command(input), "{input:?}");
        }
        for input in ["", "   ", "quit now", "what is q?"] {
            assert!(!is_quit_command(input), "{input:?}");
        }
    }
}
