//! The interactive loop: prompt, read, dispatch, print, re-arm the timer.

use crate::command;
use crate::session::SessionContext;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use xferrc::client::Config;

/// Drive the session until end-of-input or an exit keyword.
///
/// A reconnect failure is the one error that escapes here; everything a
/// command produces is printed and the loop keeps going.
pub async fn run<C: Config>(ctx: &mut SessionContext<C>) -> crate::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        let prompt = format!("skiff[{}]$ ", ctx.current_dir());
        stdout.write_all(prompt.as_bytes()).await?;
        stdout.flush().await?;

        let line = match lines.next_line().await? {
            Some(line) => line,
            None => break,
        };

        let line = line.trim_end_matches(['\n', '\r']);

        if line == "quit" || line == "exit" {
            break;
        }

        let (verb, arg) = command::parse(line);

        ctx.ensure_live().await?;

        let output = ctx.execute(verb, &arg).await;
        stdout.write_all(output.as_bytes()).await?;
        stdout.write_all(b"\n").await?;

        ctx.timer.reset();
    }

    Ok(())
}
