//! Command line parsing
//!
//! A command line is split on single spaces; the first field is the verb
//! and the rest are arguments. Verbs match exactly, so `JOIN` is not a
//! command. Repeated spaces produce empty fields.

/// A parsed command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    /// `join`, `joins`, `enter`
    Join,
    /// `attack <name>`, `attacks <name>`
    Attack { target: Option<&'a str> },
    /// `status`
    Status,
    /// Anything else; carries the verb exactly as typed
    Unknown(&'a str),
}

impl<'a> Command<'a> {
    pub fn parse(text: &'a str) -> Self {
        let mut words = text.split(' ');
        let verb = words.next().unwrap_or_default();

        match verb {
            "join" | "joins" | "enter" => Command::Join,
            "attack" | "attacks" => Command::Attack {
                target: words.next(),
            },
            "status" => Command::Status,
            _ => Command::Unknown(verb),
        }
    }
}
