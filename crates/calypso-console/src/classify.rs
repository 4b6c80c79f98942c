//! Judging controller replies.
//!
//! The VTY answers in free text meant for humans. There is no status code,
//! so the verdict comes from marker strings per command kind:
//!
//! | kind           | NotFound when                              | Error when              |
//! |----------------|--------------------------------------------|-------------------------|
//! | Lookup         | contains `No subscriber found`             | a line starts with `%`  |
//! | AssignById     | `No subscriber found`, or `not found` / `error` in any case | a line starts with `%`  |
//! | everything else| never                                      | contains `%`            |
//!
//! The markers match OpenBSC NITB builds; other controller versions may word
//! things differently, which is why the classifier is a trait.

use crate::command::CommandKind;

pub const NOT_FOUND_MARKER: &str = "No subscriber found";
pub const ERROR_MARKER: char = '%';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Ok,
    NotFound,
    Error(String),
}

impl Reply {
    pub fn is_ok(&self) -> bool {
        matches!(self, Reply::Ok)
    }
}

pub trait ResponseClassifier {
    fn classify(&self, kind: CommandKind, response: &str) -> Reply;
}

/// Marker-based classifier for OpenBSC NITB replies
#[derive(Debug, Clone, Copy, Default)]
pub struct VtyClassifier;

impl ResponseClassifier for VtyClassifier {
    fn classify(&self, kind: CommandKind, response: &str) -> Reply {
        match kind {
            CommandKind::Lookup => {
                if response.contains(NOT_FOUND_MARKER) {
                    Reply::NotFound
                } else if let Some(line) = error_line(response) {
                    Reply::Error(line)
                } else {
                    Reply::Ok
                }
            }
            CommandKind::AssignById => {
                let lower = response.to_lowercase();
                if response.contains(NOT_FOUND_MARKER) || lower.contains("not found") || lower.contains("error") {
                    Reply::NotFound
                } else if let Some(line) = error_line(response) {
                    Reply::Error(line)
                } else {
                    // NITB accepts the assignment without printing anything
                    Reply::Ok
                }
            }
            CommandKind::AssignByImsi | CommandKind::Create | CommandKind::Deliver | CommandKind::Sync | CommandKind::Privilege => {
                if response.contains(ERROR_MARKER) {
                    Reply::Error(first_marked_line(response))
                } else {
                    Reply::Ok
                }
            }
        }
    }
}

fn error_line(response: &str) -> Option<String> {
    response
        .lines()
        .map(str::trim)
        .find(|l| l.starts_with(ERROR_MARKER))
        .map(str::to_string)
}

fn first_marked_line(response: &str) -> String {
    response
        .lines()
        .map(str::trim)
        .find(|l| l.contains(ERROR_MARKER))
        .unwrap_or(response.trim())
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const C: VtyClassifier = VtyClassifier;

    #[test]
    fn test_lookup() {
        assert_eq!(C.classify(CommandKind::Lookup, "    ID: 5, Authorized: 1\n    Extension: 1000\n"), Reply::Ok);
        assert_eq!(C.classify(CommandKind::Lookup, "% No subscriber found for extension 1234\n"), Reply::NotFound);
        assert_eq!(
            C.classify(CommandKind::Lookup, "% Unknown command.\n"),
            Reply::Error("% Unknown command.".to_string())
        );
    }

    #[test]
    fn test_assign_by_id() {
        assert_eq!(C.classify(CommandKind::AssignById, "% No subscriber found for id 999\n"), Reply::NotFound);
        assert_eq!(C.classify(CommandKind::AssignById, "Error: unknown subscriber"), Reply::NotFound);
        assert_eq!(C.classify(CommandKind::AssignById, "Updated"), Reply::Ok);
        assert_eq!(C.classify(CommandKind::AssignById, "    Extension: 0912345\n"), Reply::Ok);
        assert_eq!(C.classify(CommandKind::AssignById, ""), Reply::Ok);
        assert_eq!(C.classify(CommandKind::AssignById, "  \n"), Reply::Ok);
        assert!(matches!(C.classify(CommandKind::AssignById, "% Command incomplete.\n"), Reply::Error(_)));
    }

    #[test]
    fn test_deliver_and_others() {
        assert_eq!(C.classify(CommandKind::Deliver, ""), Reply::Ok);
        assert_eq!(
            C.classify(CommandKind::Deliver, "foo\n% Failed to send SMS\n"),
            Reply::Error("% Failed to send SMS".to_string())
        );
        assert!(C.classify(CommandKind::Create, "created").is_ok());
        assert!(!C.classify(CommandKind::Sync, "50% done").is_ok());
    }
}
