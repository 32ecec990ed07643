//! Newline-delimited JSON-RPC over stdin/stdout

use crate::error::ServerError;
use crate::server::McpServer;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info};

/// Serve MCP on the process stdio until stdin closes
///
/// Stdout carries protocol frames only; logs go to stderr.
pub async fn serve_stdio(server: &McpServer) -> Result<(), ServerError> {
    info!("Serving MCP over stdio");
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    serve_lines(server, stdin, stdout).await?;
    info!("stdin closed, shutting down");
    Ok(())
}

/// Answer one JSON-RPC message per input line until EOF
pub async fn serve_lines<R, W>(server: &McpServer, reader: R, mut writer: W) -> Result<(), ServerError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Some(response) = server.handle_message(line).await else {
            continue;
        };

        let mut frame = serde_json::to_string(&response)?;
        frame.push('\n');
        writer.write_all(frame.as_bytes()).await?;
        writer.flush().await?;
        debug!("Sent response for id {}", response.id);
    }

    Ok(())
}
