//! Parsing of interactive input lines.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    /// Provider availability and the active model
    Model,
    Tools,
    Help,
    Exit,
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Blank,
    Command(SlashCommand),
    Message(String),
}

impl Input {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Input::Blank;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Input::Message(line.to_string());
        };

        let name = rest.split_whitespace().next().unwrap_or_default();
        let command = match name.to_ascii_lowercase().as_str() {
            "model" => SlashCommand::Model,
            "tools" => SlashCommand::Tools,
            "help" | "?" => SlashCommand::Help,
            "exit" | "quit" => SlashCommand::Exit,
            _ => SlashCommand::Unknown(name.to_string()),
        };
        Input::Command(command)
    }
}

pub const HELP: &str = "\
Commands:
  /model   show configured providers and the active model
  /tools   list tools loaded from MCP servers
  /help    show this message
  /exit    leave the session (also /quit or Ctrl-D)";
