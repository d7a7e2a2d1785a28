//! Line-delimited JSON-RPC over stdin/stdout (§4.1). One request is
//! processed at a time; there is no concurrent dispatch on this transport.
//! EOF on stdin ends the loop cleanly — there is no explicit shutdown frame.
//! An over-long line yields a `-32700` parse error and the connection stays
//! open (§8 boundary behavior): the reader discards the remainder of that
//! line up to its terminating `\n` so the next line starts clean.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::protocol::Protocol;
use crate::registry::RequestContext;
use crate::wire::{self, ResponseFrame};

/// A single line beyond this size is treated as a parse error (§9 design
/// note: resolved the same way a malformed frame is, via `-32700`).
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

pub async fn run<R, W>(protocol: &Protocol, client_key: &str, mut reader: R, mut writer: W) -> crate::error::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf: Vec<u8> = Vec::new();
    loop {
        buf.clear();
        match read_line_capped(&mut reader, &mut buf, MAX_LINE_BYTES).await {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(LineError::TooLong) => {
                let response = ResponseFrame::err(
                    serde_json::Value::Null,
                    wire::PARSE_ERROR,
                    "request line exceeded the maximum frame size",
                );
                write_response(&mut writer, &response).await?;
                match discard_until_newline(&mut reader).await {
                    Ok(()) => continue,
                    Err(e) => return Err(e.into()),
                }
            }
            Err(LineError::Io(e)) => return Err(e.into()),
        }

        let text = String::from_utf8_lossy(&buf);
        let trimmed = text.trim();
        if trimmed.is_empty() {
            continue;
        }

        let ctx = RequestContext::new(client_key.to_string(), "stdio".to_string());
        let response = match wire::decode(trimmed) {
            Ok(frame) => protocol.handle(frame, ctx).await,
            Err(parse_error) => Some(parse_error),
        };

        if let Some(response) = response {
            write_response(&mut writer, &response).await?;
        }
    }
    Ok(())
}

async fn write_response<W: AsyncWrite + Unpin>(writer: &mut W, response: &ResponseFrame) -> crate::error::Result<()> {
    let mut out = serde_json::to_vec(response)?;
    out.push(b'\n');
    writer.write_all(&out).await?;
    writer.flush().await?;
    Ok(())
}

enum LineError {
    TooLong,
    Io(std::io::Error),
}

impl From<std::io::Error> for LineError {
    fn from(e: std::io::Error) -> Self {
        LineError::Io(e)
    }
}

/// Read one `\n`-terminated line into `buf`, capping total bytes read at
/// `max`. Returns the number of bytes read, or `0` at EOF with no partial
/// data pending.
async fn read_line_capped<R: AsyncBufRead + Unpin>(reader: &mut R, buf: &mut Vec<u8>, max: usize) -> Result<usize, LineError> {
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(buf.len());
        }
        if let Some(pos) = available.iter().position(|&b| b == b'\n') {
            buf.extend_from_slice(&available[..=pos]);
            let used = pos + 1;
            reader.consume(used);
            if buf.len() > max {
                return Err(LineError::TooLong);
            }
            return Ok(buf.len());
        }
        let len = available.len();
        buf.extend_from_slice(available);
        reader.consume(len);
        if buf.len() > max {
            return Err(LineError::TooLong);
        }
    }
}

/// Consume and discard input up to and including the next `\n`, or until
/// EOF. Used to resynchronize after an over-long line so the following
/// line is read from a clean starting position.
async fn discard_until_newline<R: AsyncBufRead + Unpin>(reader: &mut R) -> std::io::Result<()> {
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(());
        }
        if let Some(pos) = available.iter().position(|&b| b == b'\n') {
            reader.consume(pos + 1);
            return Ok(());
        }
        let len = available.len();
        reader.consume(len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ResourceRegistry, ToolRegistry};
    use std::sync::Arc;
    use tokio::io::BufReader;

    #[tokio::test]
    async fn echoes_initialize_response() {
        let protocol = Protocol::new(ToolRegistry::new(), Arc::new(ResourceRegistry::new()), None);
        let input = b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"initialize\",\"params\":{}}\n".to_vec();
        let reader = BufReader::new(&input[..]);
        let mut output = Vec::new();
        run(&protocol, "default", reader, &mut output).await.unwrap();
        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("\"protocolVersion\""));
    }

    #[tokio::test]
    async fn oversized_line_yields_parse_error_and_connection_continues() {
        let protocol = Protocol::new(ToolRegistry::new(), Arc::new(ResourceRegistry::new()), None);
        let mut input = vec![b'a'; MAX_LINE_BYTES + 10];
        input.push(b'\n');
        input.extend_from_slice(b"{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"tools/list\",\"params\":{}}\n");
        let reader = BufReader::new(&input[..]);
        let mut output = Vec::new();
        run(&protocol, "default", reader, &mut output).await.unwrap();
        let text = String::from_utf8(output).unwrap();
        let mut lines = text.lines();
        let first: serde_json::Value = serde_json::from_str(lines.next().unwrap()).unwrap();
        assert_eq!(first["error"]["code"], -32700);
        let second: serde_json::Value = serde_json::from_str(lines.next().unwrap()).unwrap();
        assert_eq!(second["result"]["tools"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn blank_lines_are_skipped() {
        let protocol = Protocol::new(ToolRegistry::new(), Arc::new(ResourceRegistry::new()), None);
        let input = b"\n\n{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"tools/list\",\"params\":{}}\n".to_vec();
        let reader = BufReader::new(&input[..]);
        let mut output = Vec::new();
        run(&protocol, "default", reader, &mut output).await.unwrap();
        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("\"tools\""));
    }
}
