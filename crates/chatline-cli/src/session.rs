//! Interactive loop.
//!
//! Input lines and snapshot changes are handled in one `select!` loop, so
//! output from the two never interleaves mid-line.

use std::io::Write;

use chatline_client::{ChatHandle, Connector, Runtime, SessionConfig};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::{
    commands::{self, Command},
    error::CliError,
    render::{self, Renderer},
};

/// Run the client until `/quit` or end of input.
///
/// Spawns the runtime, joins as `username` if given, and always disconnects
/// before returning.
pub async fn run<C, R, W>(
    config: SessionConfig,
    connector: C,
    username: Option<&str>,
    input: R,
    out: &mut W,
) -> Result<(), CliError>
where
    C: Connector,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let (runtime, handle) = Runtime::new(config, connector);
    let runtime = tokio::spawn(runtime.run());

    let result = drive(&handle, username, input, out).await;

    // Already stopped is fine here.
    let _ = handle.shutdown().await;
    drop(handle);
    if let Err(e) = runtime.await {
        tracing::error!("client runtime failed: {e}");
    }

    result
}

async fn drive<R, W>(
    handle: &ChatHandle,
    username: Option<&str>,
    input: R,
    out: &mut W,
) -> Result<(), CliError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut snapshots = handle.subscribe();
    let mut renderer = Renderer::new();
    let mut lines = input.lines();

    match username {
        Some(name) => handle.connect(name).await?,
        None => writeln!(out, "* type /join <name> to enter the chat")?,
    }

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { return Ok(()) };
                let Some(command) = commands::parse(&line) else { continue };
                if !execute(handle, command, out).await? {
                    return Ok(());
                }
            }

            changed = snapshots.changed() => {
                if changed.is_err() {
                    return Ok(());
                }

                let next = snapshots.borrow_and_update().clone();
                for line in renderer.update(next) {
                    writeln!(out, "{line}")?;
                }
            }
        }

        out.flush()?;
    }
}

/// Returns false when the user asked to quit.
async fn execute<W: Write>(
    handle: &ChatHandle,
    command: Command,
    out: &mut W,
) -> Result<bool, CliError> {
    match command {
        Command::Quit => return Ok(false),
        Command::Users => writeln!(out, "{}", render::roster_line(&handle.snapshot().roster))?,
        Command::Leave => handle.disconnect().await?,
        Command::Join { username } => {
            handle.disconnect().await?;
            handle.connect(username).await?;
        },
        Command::Message { content } => {
            if handle.snapshot().connected {
                handle.send(content).await?;
            } else {
                writeln!(out, "* not connected")?;
            }
        },
        Command::Unknown { input } => writeln!(out, "* unknown command: {input}")?,
        Command::InvalidArgs { command, error } => writeln!(out, "* /{command}: {error}")?,
    }

    Ok(true)
}
