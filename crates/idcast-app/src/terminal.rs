//! Line-oriented terminal front end: command parsing and display rendering.

use idcast_presence::DisplayState;

/// A line typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Select(u32),
    Send,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    match line.to_ascii_lowercase().as_str() {
        "" => Command::Empty,
        "s" | "send" => Command::Send,
        "h" | "help" | "?" => Command::Help,
        "q" | "quit" | "exit" => Command::Quit,
        other => match other.parse::<u32>() {
            Ok(id) => Command::Select(id),
            Err(_) => Command::Unknown(line.to_string()),
        },
    }
}

pub fn help_text(choices: &[u32]) -> String {
    let ids = choices
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    format!("commands: <id> to pick an identity ({ids}), s to send a new number, q to quit")
}

/// Remembers what was last shown so only changed regions are printed.
#[derive(Debug, Default)]
pub struct Screen {
    shown: DisplayState,
}

impl Screen {
    /// Lines describing every region that differs from the last render.
    pub fn render(&mut self, state: &DisplayState) -> Vec<String> {
        let mut lines = Vec::new();

        if state.identity != self.shown.identity {
            if let Some(id) = state.identity {
                lines.push(format!("id: {id}"));
            }
        }
        if state.status != self.shown.status {
            lines.push(format!("status: {}", state.status));
        }
        if state.sent != self.shown.sent {
            if let Some(sent) = &state.sent {
                lines.push(format!("sent: {sent}"));
            }
        }
        if state.received != self.shown.received {
            if let Some(received) = &state.received {
                lines.push(format!("received: {received}"));
            }
        }
        if state.error != self.shown.error {
            if let Some(error) = &state.error {
                lines.push(format!("error: {error}"));
            }
        }

        self.shown = state.clone();
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use idcast_presence::ConnectionState;

    #[test]
    fn parses_commands() {
        assert_eq!(parse_command("1"), Command::Select(1));
        assert_eq!(parse_command("  2 \n"), Command::Select(2));
        assert_eq!(parse_command("s"), Command::Send);
        assert_eq!(parse_command("SEND"), Command::Send);
        assert_eq!(parse_command("?"), Command::Help);
        assert_eq!(parse_command("quit"), Command::Quit);
        assert_eq!(parse_command("   "), Command::Empty);
        assert_eq!(parse_command("-3"), Command::Unknown("-3".into()));
        assert_eq!(parse_command("Hello"), Command::Unknown("Hello".into()));
    }

    #[test]
    fn help_lists_identity_choices() {
        assert!(help_text(&[1, 2]).contains("(1, 2)"));
    }

    #[test]
    fn renders_only_changed_regions() {
        let mut screen = Screen::default();
        let mut state = DisplayState {
            status: ConnectionState::Connecting,
            identity: Some(1),
            ..DisplayState::default()
        };
        assert_eq!(screen.render(&state), vec!["id: 1", "status: connecting"]);

        state.status = ConnectionState::Connected;
        state.sent = Some("\"1: 0.5\"".into());
        assert_eq!(
            screen.render(&state),
            vec!["status: connected", "sent: \"1: 0.5\""]
        );

        assert!(screen.render(&state).is_empty());

        state.received = Some("\"2: 0.5\"".into());
        state.error = Some("X".into());
        assert_eq!(
            screen.render(&state),
            vec!["received: \"2: 0.5\"", "error: X"]
        );
    }

    #[test]
    fn repeated_value_is_not_reprinted() {
        let mut screen = Screen::default();
        let state = DisplayState {
            received: Some("\"2: 0.5\"".into()),
            ..DisplayState::default()
        };
        assert_eq!(screen.render(&state).len(), 1);
        assert!(screen.render(&state.clone()).is_empty());
    }
}
