use serde_json::Value;

use crate::types::{Difficulty, Direction, SessionCommand};

#[derive(Debug)]
pub enum ParsedClientMessage {
    Hello { name: String },
    Input { dir: Direction },
    Command { command: SessionCommand },
    Ping { t: f64 },
}

pub fn parse_client_message(raw: &str) -> Option<ParsedClientMessage> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;
    let message_type = object.get("type")?.as_str()?;

    match message_type {
        "hello" => {
            let name = object.get("name")?.as_str()?.to_string();
            Some(ParsedClientMessage::Hello { name })
        }
        "input" => {
            let dir = Direction::parse_move(object.get("dir")?.as_str()?)?;
            Some(ParsedClientMessage::Input { dir })
        }
        "command" => {
            let command = parse_command(object)?;
            Some(ParsedClientMessage::Command { command })
        }
        "ping" => {
            let t = object.get("t")?.as_f64()?;
            if !t.is_finite() {
                return None;
            }
            Some(ParsedClientMessage::Ping { t })
        }
        _ => None,
    }
}

fn parse_command(object: &serde_json::Map<String, Value>) -> Option<SessionCommand> {
    match object.get("name")?.as_str()? {
        "start" => Some(SessionCommand::Start),
        "restart" => Some(SessionCommand::Restart),
        "return_to_menu" => Some(SessionCommand::ReturnToMenu),
        "browse_high_scores" => Some(SessionCommand::BrowseHighScores),
        "confirm_name" => Some(SessionCommand::ConfirmName),
        "backspace" => Some(SessionCommand::Backspace),
        "select_difficulty" => {
            let difficulty = Difficulty::parse(object.get("difficulty")?.as_str()?)?;
            Some(SessionCommand::SelectDifficulty(difficulty))
        }
        "append_char" => {
            let text = object.get("char")?.as_str()?;
            let mut chars = text.chars();
            let entered = chars.next()?;
            if chars.next().is_some() {
                return None;
            }
            Some(SessionCommand::AppendChar(entered))
        }
        _ => None,
    }
}
