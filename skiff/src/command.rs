//! Tokenizes one line of user input into a verb and its argument.

/// The fixed command vocabulary. Anything else parses to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Unknown,
    Pwd,
    Cd,
    Ls,
    Put,
    Get,
}

fn get_verb(token: &str) -> Verb {
    match token {
        "pwd" => Verb::Pwd,
        "cd" => Verb::Cd,
        "ls" => Verb::Ls,
        "put" => Verb::Put,
        "get" => Verb::Get,
        _ => Verb::Unknown,
    }
}

/// Split a line into (verb, argument).
///
/// For `put`/`get` the argument is every remaining token rejoined with
/// single spaces, so splitting it on whitespace later recovers the
/// original file patterns. For every other verb only the second token is
/// kept; extras are ignored.
pub fn parse(line: &str) -> (Verb, String) {
    let mut parts = line.split_whitespace();

    let verb = match parts.next() {
        Some(token) => get_verb(token),
        None => return (Verb::Unknown, String::new()),
    };

    let arg = match verb {
        Verb::Put | Verb::Get => parts.collect::<Vec<_>>().join(" "),
        _ => parts.next().unwrap_or("").to_string(),
    };

    (verb, arg)
}
