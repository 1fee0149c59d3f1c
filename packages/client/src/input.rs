//! Parsing of lines typed into the CLI.
//!
//! Pure functions only; the runner performs the side effects.

/// A line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Chat(String),
    Rename(String),
    Users,
    Connect,
    Disconnect,
    Help,
    Quit,
    /// Unknown command or missing argument
    Invalid(String),
}

/// Parse a line of input. Returns `None` for blank lines.
///
/// Lines starting with `/` are commands; everything else is chat text.
pub fn parse_input(line: &str) -> Option<Input> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let Some(command) = line.strip_prefix('/') else {
        return Some(Input::Chat(line.to_string()));
    };

    let (name, argument) = match command.split_once(char::is_whitespace) {
        Some((name, argument)) => (name, argument.trim()),
        None => (command, ""),
    };

    let input = match name {
        "name" if argument.is_empty() => Input::Invalid("usage: /name <new name>".to_string()),
        "name" => Input::Rename(argument.to_string()),
        "users" => Input::Users,
        "connect" => Input::Connect,
        "disconnect" => Input::Disconnect,
        "help" => Input::Help,
        "quit" | "exit" => Input::Quit,
        other => Input::Invalid(format!("unknown command '/{}'", other)),
    };
    Some(input)
}
