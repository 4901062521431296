//! Line protocol spoken between the relay server and its clients.
//!
//! A connection starts with the server writing the 4-byte [`READY_MARKER`].
//! Everything after that is `\n`-terminated UTF-8 lines:
//!
//! ```text
//! list:  S: SALA   C: #LISTAR_SALAS#   C: #LISTAR_SALAS#   S: a|b|c   (close)
//! join:  S: SALA   C: <room>           C: <name>           S/C: chat lines...
//! ```

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Written by the server as soon as a connection is accepted.
pub const READY_MARKER: &[u8; 4] = b"SALA";

/// First (and confirmatory second) line of a room list query.
pub const LIST_ROOMS_SENTINEL: &str = "#LISTAR_SALAS#";

/// Separator between room names in a list reply.
pub const ROOM_SEPARATOR: char = '|';

/// Notice shown to a client whose connection dropped unexpectedly.
pub const CONNECTION_LOST_NOTICE: &str = "Conexão com o servidor perdida!";

/// Longest line, terminator excluded, a reader accepts.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

const LINE_ENDINGS: &[char] = &['\n', '\r'];

/// Format a chat line relayed on behalf of `name`.
pub fn chat_line(name: &str, text: &str) -> String {
    format!("{}: {}", name, text)
}

/// Format the notice broadcast when `name` joins a room.
pub fn join_notice(name: &str) -> String {
    format!("{} Entrou na sala", name)
}

/// Format the notice broadcast when `name` leaves a room.
pub fn leave_notice(name: &str) -> String {
    format!("{}: Saiu da sala", name)
}

/// Join room names into the single-line list reply.
pub fn encode_room_list<I, S>(names: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut encoded = String::new();
    for (index, name) in names.into_iter().enumerate() {
        if index > 0 {
            encoded.push(ROOM_SEPARATOR);
        }
        encoded.push_str(name.as_ref());
    }
    encoded
}

/// Split a list reply back into room names, dropping empty tokens.
pub fn decode_room_list(reply: &str) -> Vec<String> {
    reply
        .trim_end_matches(LINE_ENDINGS)
        .split(ROOM_SEPARATOR)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Write the readiness marker.
pub async fn write_marker<W>(writer: &mut W) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(READY_MARKER).await?;
    writer.flush().await
}

/// Read exactly four bytes and report whether they are the readiness marker.
pub async fn read_marker<R>(reader: &mut R) -> io::Result<bool>
where
    R: AsyncRead + Unpin,
{
    let mut marker = [0u8; 4];
    reader.read_exact(&mut marker).await?;
    Ok(&marker == READY_MARKER)
}

/// Read one line, without its terminator.
///
/// Returns `Ok(None)` once the peer has closed the stream. A final line
/// without a terminator is still returned. A line longer than
/// [`MAX_LINE_BYTES`] fails with [`io::ErrorKind::InvalidData`], as does
/// one that is not UTF-8.
pub async fn read_line<R>(reader: &mut R) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut raw = Vec::new();
    let limit = (MAX_LINE_BYTES + 1) as u64;
    let bytes = (&mut *reader).take(limit).read_until(b'\n', &mut raw).await?;
    if bytes == 0 {
        return Ok(None);
    }
    if !raw.ends_with(b"\n") && raw.len() > MAX_LINE_BYTES {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("line exceeds {} bytes", MAX_LINE_BYTES),
        ));
    }

    let line = String::from_utf8(raw).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(Some(line.trim_end_matches(LINE_ENDINGS).to_string()))
}

/// Write one line followed by `\n` and flush it.
pub async fn write_line<W>(writer: &mut W, line: &str) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut encoded = Vec::with_capacity(line.len() + 1);
    encoded.extend_from_slice(line.as_bytes());
    encoded.push(b'\n');
    writer.write_all(&encoded).await?;
    writer.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    #[test]
    fn test_notice_formats() {
        // テスト項目: 入室・退室・チャットの行が決められた形式で生成される
        // given (前提条件):
        let name = "alice";

        // when (操作):
        let joined = join_notice(name);
        let left = leave_notice(name);
        let chat = chat_line(name, "hi");

        // then (期待する結果):
        assert_eq!(joined, "alice Entrou na sala");
        assert_eq!(left, "alice: Saiu da sala");
        assert_eq!(chat, "alice: hi");
    }

    #[test]
    fn test_encode_room_list_with_no_rooms_is_empty() {
        // テスト項目: ルームが無い場合、空文字列になる
        // given (前提条件):
        let names: Vec<String> = Vec::new();

        // when (操作):
        let encoded = encode_room_list(names);

        // then (期待する結果):
        assert_eq!(encoded, "");
    }

    #[test]
    fn test_encode_room_list_joins_with_pipe() {
        // テスト項目: ルーム名がパイプ区切りで連結される
        // given (前提条件):
        let names = ["lobby", "games", "music"];

        // when (操作):
        let encoded = encode_room_list(names);

        // then (期待する結果):
        assert_eq!(encoded, "lobby|games|music");
    }

    #[test]
    fn test_decode_room_list_discards_empty_tokens() {
        // テスト項目: 空のトークンと行末が取り除かれ、順序が保たれる
        // given (前提条件):
        let reply = "games||lobby|\r\n";

        // when (操作):
        let names = decode_room_list(reply);

        // then (期待する結果):
        assert_eq!(names, vec!["games".to_string(), "lobby".to_string()]);
    }

    #[test]
    fn test_decode_room_list_of_empty_reply() {
        // テスト項目: 空の応答は空のリストになる
        // given (前提条件):
        let reply = "\n";

        // when (操作):
        let names = decode_room_list(reply);

        // then (期待する結果):
        assert!(names.is_empty());
    }

    #[tokio::test]
    async fn test_marker_then_lines_over_one_stream() {
        // テスト項目: マーカーの直後に続く行が同じバッファから読み取れる
        // given (前提条件):
        let (mut writer, reader) = tokio::io::duplex(1024);
        let mut reader = BufReader::new(reader);
        write_marker(&mut writer).await.expect("write marker");
        write_line(&mut writer, "lobby").await.expect("write room");
        write_line(&mut writer, "alice").await.expect("write name");
        drop(writer);

        // when (操作):
        let marker_ok = read_marker(&mut reader).await.expect("read marker");
        let room = read_line(&mut reader).await.expect("read room");
        let name = read_line(&mut reader).await.expect("read name");
        let end = read_line(&mut reader).await.expect("read end");

        // then (期待する結果):
        assert!(marker_ok);
        assert_eq!(room.as_deref(), Some("lobby"));
        assert_eq!(name.as_deref(), Some("alice"));
        assert_eq!(end, None);
    }

    #[tokio::test]
    async fn test_read_marker_rejects_other_bytes() {
        // テスト項目: マーカー以外の 4 バイトは不一致として報告される
        // given (前提条件):
        let (mut writer, mut reader) = tokio::io::duplex(64);
        writer.write_all(b"HTTP").await.expect("write bytes");

        // when (操作):
        let marker_ok = read_marker(&mut reader).await.expect("read marker");

        // then (期待する結果):
        assert!(!marker_ok);
    }

    #[tokio::test]
    async fn test_read_line_accepts_unterminated_last_line() {
        // テスト項目: 改行なしで閉じられた最後の行も読み取れる
        // given (前提条件):
        let (mut writer, reader) = tokio::io::duplex(64);
        let mut reader = BufReader::new(reader);
        writer.write_all(b"lobby|games").await.expect("write reply");
        drop(writer);

        // when (操作):
        let line = read_line(&mut reader).await.expect("read line");

        // then (期待する結果):
        assert_eq!(line.as_deref(), Some("lobby|games"));
    }

    #[tokio::test]
    async fn test_read_line_rejects_oversized_line() {
        // テスト項目: 上限を超える行は InvalidData で拒否され、全体がバッファされない
        // given (前提条件):
        let (mut writer, reader) = tokio::io::duplex(8 * 1024);
        let mut reader = BufReader::new(reader);
        let sender = tokio::spawn(async move {
            let mut flood = vec![b'A'; MAX_LINE_BYTES * 4];
            flood.push(b'\n');
            // The reader gives up early, so this write may fail.
            let _ = writer.write_all(&flood).await;
        });

        // when (操作):
        let result = read_line(&mut reader).await;

        // then (期待する結果):
        let err = result.expect_err("oversized line must fail");
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        drop(reader);
        sender.await.expect("sender task");
    }

    #[tokio::test]
    async fn test_read_line_accepts_line_at_limit() {
        // テスト項目: ちょうど上限の長さの行は受け付けられる
        // given (前提条件):
        let (mut writer, reader) = tokio::io::duplex(8 * 1024);
        let mut reader = BufReader::new(reader);
        let sender = tokio::spawn(async move {
            let mut line = vec![b'A'; MAX_LINE_BYTES];
            line.extend_from_slice(b"\nnext\n");
            writer.write_all(&line).await.expect("write line");
        });

        // when (操作):
        let first = read_line(&mut reader).await.expect("read first");
        let second = read_line(&mut reader).await.expect("read second");

        // then (期待する結果):
        assert_eq!(first.map(|line| line.len()), Some(MAX_LINE_BYTES));
        assert_eq!(second.as_deref(), Some("next"));
        sender.await.expect("sender task");
    }
}
