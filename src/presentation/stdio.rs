//! JSON-lines presentation host.
//!
//! The front end runs as a separate process connected over stdio. Each line
//! on stdin is one [`PresentationCall`]; each line written to stdout is one
//! [`PresenterCommand`]. Logging never touches stdout.

use super::{PresentationCall, PresenterCommand};
use crate::session::Session;
use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

/// Serve the session over this process's stdin/stdout until stdin closes or
/// Ctrl+C is pressed, then shut the session down.
pub async fn run(session: Session, commands: mpsc::UnboundedReceiver<PresenterCommand>) -> Result<()> {
    serve(
        session,
        commands,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await
}

/// Same as [`run`] over arbitrary streams
pub async fn serve<R, W>(
    session: Session,
    commands: mpsc::UnboundedReceiver<PresenterCommand>,
    input: R,
    output: W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let writer = tokio::spawn(write_commands(commands, output));

    let read_result = tokio::select! {
        result = read_calls(&session, input) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted - shutting down");
            Ok(())
        }
    };

    session.shutdown().await;

    // Every presenter handle is gone once the session is dropped, so the writer
    // drains what is left and ends.
    let write_result = writer.await.context("Presenter writer task panicked")?;

    read_result?;
    write_result
}

async fn read_calls<R>(session: &Session, input: R) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await.context("Failed to read from stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<PresentationCall>(line) {
            Ok(call) => session.handle_call(call),
            Err(e) => tracing::warn!("Ignoring malformed presentation call: {}", e),
        }
    }

    tracing::info!("Presentation host closed its input");
    Ok(())
}

async fn write_commands<W>(
    mut commands: mpsc::UnboundedReceiver<PresenterCommand>,
    mut output: W,
) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(command) = commands.recv().await {
        let mut line = serde_json::to_vec(&command).context("Failed to encode presenter command")?;
        line.push(b'\n');
        output
            .write_all(&line)
            .await
            .context("Failed to write presenter command")?;
        output.flush().await.context("Failed to flush stdout")?;
    }
    Ok(())
}
