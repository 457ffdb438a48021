//! Parsing of the lines typed at the prompt.

use thiserror::Error;

use crate::domain::RoomId;

/// One line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    Rooms,
    MyRooms,
    Create(String),
    Join(RoomId),
    Close,
    Leave,
    Logout,
    Quit,
    Help,
    /// Plain text for the open room
    Chat(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Unknown command '{0}' (type /help)")]
    Unknown(String),

    #[error("Usage: {0}")]
    MissingArgument(&'static str),

    #[error("Invalid room id '{0}'")]
    InvalidRoomId(String),
}

impl UserCommand {
    /// Parse a trimmed, non-empty input line
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else {
            return Ok(Self::Chat(line.to_string()));
        };

        let (name, argument) = match rest.split_once(char::is_whitespace) {
            Some((name, argument)) => (name, argument.trim()),
            None => (rest, ""),
        };

        match name {
            "rooms" => Ok(Self::Rooms),
            "myrooms" => Ok(Self::MyRooms),
            "create" if argument.is_empty() => Err(CommandError::MissingArgument("/create <name>")),
            "create" => Ok(Self::Create(argument.to_string())),
            "join" if argument.is_empty() => Err(CommandError::MissingArgument("/join <id>")),
            "join" => argument
                .parse::<i64>()
                .map(|id| Self::Join(RoomId::new(id)))
                .map_err(|_| CommandError::InvalidRoomId(argument.to_string())),
            "close" => Ok(Self::Close),
            "leave" => Ok(Self::Leave),
            "logout" => Ok(Self::Logout),
            "quit" | "exit" => Ok(Self::Quit),
            "help" => Ok(Self::Help),
            _ => Err(CommandError::Unknown(format!("/{}", name))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_text_as_chat() {
        // テスト項目: スラッシュで始まらない入力はチャットメッセージになる
        // given (前提条件):
        let line = "  hello there ";

        // when (操作):
        let command = UserCommand::parse(line);

        // then (期待する結果):
        assert_eq!(command, Ok(UserCommand::Chat("hello there".to_string())));
    }

    #[test]
    fn test_parse_commands_without_argument() {
        // テスト項目: 引数なしのコマンドが解釈される
        // given (前提条件):
        let cases = [
            ("/rooms", UserCommand::Rooms),
            ("/myrooms", UserCommand::MyRooms),
            ("/close", UserCommand::Close),
            ("/leave", UserCommand::Leave),
            ("/logout", UserCommand::Logout),
            ("/quit", UserCommand::Quit),
            ("/help", UserCommand::Help),
        ];

        for (line, expected) in cases {
            // when (操作):
            let command = UserCommand::parse(line);

            // then (期待する結果):
            assert_eq!(command, Ok(expected), "line: {}", line);
        }
    }

    #[test]
    fn test_parse_create_keeps_spaces_in_name() {
        // テスト項目: /create の引数は空白を含めてルーム名になる
        // given (前提条件):
        let line = "/create  Rust study group ";

        // when (操作):
        let command = UserCommand::parse(line);

        // then (期待する結果):
        assert_eq!(
            command,
            Ok(UserCommand::Create("Rust study group".to_string()))
        );
    }

    #[test]
    fn test_parse_join_with_room_id() {
        // テスト項目: /join の引数がルーム ID として解釈される
        // given (前提条件):
        let line = "/join 42";

        // when (操作):
        let command = UserCommand::parse(line);

        // then (期待する結果):
        assert_eq!(command, Ok(UserCommand::Join(RoomId::new(42))));
    }

    #[test]
    fn test_parse_join_with_invalid_id() {
        // テスト項目: 数値でないルーム ID はエラーになる
        // given (前提条件):
        let line = "/join general";

        // when (操作):
        let command = UserCommand::parse(line);

        // then (期待する結果):
        assert_eq!(
            command,
            Err(CommandError::InvalidRoomId("general".to_string()))
        );
    }

    #[test]
    fn test_parse_missing_argument() {
        // テスト項目: 引数が必要なコマンドで引数がないとエラーになる
        // given (前提条件):
        let lines = ["/create", "/join   "];

        // when (操作):
        let results: Vec<_> = lines.iter().map(|line| UserCommand::parse(line)).collect();

        // then (期待する結果):
        assert_eq!(
            results,
            vec![
                Err(CommandError::MissingArgument("/create <name>")),
                Err(CommandError::MissingArgument("/join <id>")),
            ]
        );
    }

    #[test]
    fn test_parse_unknown_command() {
        // テスト項目: 未知のコマンドはエラーになる
        // given (前提条件):
        let line = "/dance now";

        // when (操作):
        let command = UserCommand::parse(line);

        // then (期待する結果):
        assert_eq!(command, Err(CommandError::Unknown("/dance".to_string())));
    }
}
