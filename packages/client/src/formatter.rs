//! Message formatting utilities for client display.

use chrono::{DateTime, Local};

use relaychat_shared::{protocol::CONNECTION_LOST_NOTICE, time::format_clock_time};

const RULE: &str = "============================================================";

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format a line relayed by the server
    ///
    /// # Arguments
    ///
    /// * `line` - The line exactly as received (chat line or notice)
    /// * `received_at` - Local time the line arrived
    ///
    /// # Returns
    ///
    /// The line prefixed with the arrival time as `[HH:MM:SS]`
    pub fn format_received(line: &str, received_at: &DateTime<Local>) -> String {
        format!("[{}] {}", format_clock_time(received_at), line)
    }

    /// Format the answer to a room list query
    ///
    /// # Arguments
    ///
    /// * `rooms` - Room names in the order the server sent them
    ///
    /// # Returns
    ///
    /// A framed block with one room per line
    pub fn format_room_list(rooms: &[String]) -> String {
        let mut output = String::new();
        output.push_str(RULE);
        output.push_str("\nRooms:\n");

        if rooms.is_empty() {
            output.push_str("(No rooms yet, create one with /join <room>)\n");
        } else {
            for room in rooms {
                output.push_str(&format!("  {}\n", room));
            }
        }

        output.push_str(RULE);
        output.push('\n');
        output
    }

    /// Format the greeting shown after a successful join
    pub fn format_welcome(room: &str) -> String {
        format!("Conectado ao servidor. Bem-vindo à sala {}!", room)
    }

    /// Format the notice shown after leaving a room on purpose
    pub fn format_left(room: &str) -> String {
        format!("Left room {}", room)
    }

    /// Format the notice shown when the server drops the session
    pub fn format_connection_lost() -> String {
        CONNECTION_LOST_NOTICE.to_string()
    }

    /// Format a failed send
    pub fn format_send_failed(reason: &str) -> String {
        format!("Message not sent: {}", reason)
    }

    /// Format the command summary
    pub fn format_help() -> String {
        [
            "Commands:",
            "  /rooms         list rooms on the server",
            "  /join <room>   join a room (leaves the current one)",
            "  /leave         leave the current room",
            "  /quit          leave and exit",
        ]
        .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32, second: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2023, 1, 1, hour, minute, second)
            .unwrap()
    }

    #[test]
    fn test_format_received_prefixes_clock_time() {
        // テスト項目: 受信した行に到着時刻が付与される
        // given (前提条件):
        let line = "alice: hi";
        let received_at = at(9, 5, 7);

        // when (操作):
        let result = MessageFormatter::format_received(line, &received_at);

        // then (期待する結果):
        assert_eq!(result, "[09:05:07] alice: hi");
    }

    #[test]
    fn test_format_room_list_with_no_rooms() {
        // テスト項目: ルームが無い場合、案内メッセージが表示される
        // given (前提条件):
        let rooms: Vec<String> = vec![];

        // when (操作):
        let result = MessageFormatter::format_room_list(&rooms);

        // then (期待する結果):
        assert!(result.contains("Rooms:"));
        assert!(result.contains("(No rooms yet"));
        assert!(result.contains(RULE));
    }

    #[test]
    fn test_format_room_list_keeps_server_order() {
        // テスト項目: ルームはサーバーから届いた順に一行ずつ表示される
        // given (前提条件):
        let rooms = vec!["lobby".to_string(), "games".to_string()];

        // when (操作):
        let result = MessageFormatter::format_room_list(&rooms);

        // then (期待する結果):
        let lobby = result.find("  lobby\n").unwrap();
        let games = result.find("  games\n").unwrap();
        assert!(lobby < games);
        assert!(!result.contains("(No rooms yet"));
    }

    #[test]
    fn test_format_welcome() {
        // テスト項目: 参加時の歓迎メッセージにルーム名が含まれる
        // given (前提条件):
        let room = "lobby";

        // when (操作):
        let result = MessageFormatter::format_welcome(room);

        // then (期待する結果):
        assert_eq!(result, "Conectado ao servidor. Bem-vindo à sala lobby!");
    }

    #[test]
    fn test_format_connection_lost() {
        // テスト項目: 接続喪失の通知文言が固定である
        // given (前提条件):
        // when (操作):
        let result = MessageFormatter::format_connection_lost();

        // then (期待する結果):
        assert_eq!(result, "Conexão com o servidor perdida!");
    }

    #[test]
    fn test_format_help_lists_every_command() {
        // テスト項目: ヘルプに全コマンドが載っている
        // given (前提条件):
        // when (操作):
        let result = MessageFormatter::format_help();

        // then (期待する結果):
        for command in ["/rooms", "/join", "/leave", "/quit"] {
            assert!(result.contains(command));
        }
    }
}
