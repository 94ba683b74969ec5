mod command;
mod config;
mod error;
mod logging;
mod repl;
mod session;
mod timer;

pub use error::*;

use crate::config::Config;
use crate::session::SessionContext;
use dialoguer::{Input, Password};
use tokio::time::Duration;
use xferrc::sftp::SftpConfig;

/// REPL inactivity interval after which the remote is assumed to have
/// dropped the connection.
const IDLE_TIMEOUT: Duration = Duration::from_secs(5 * 60);

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let matches = config::cli().get_matches();

    let config = match Config::try_from(&matches) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("{}", config::cli().render_usage());
            std::process::exit(1);
        }
    };

    logging::init_logging(config.debug);

    let (user, password) = read_credentials(&config)?;

    log::info!("connecting ~ ({}/****@{})", user, config.server);

    let sftp_config = SftpConfig::password(
        user.as_str(),
        password.as_str(),
        &config.server,
        config.debug,
        IDLE_TIMEOUT,
    )
    .await?;

    let mut ctx = SessionContext::new(sftp_config, IDLE_TIMEOUT);
    ctx.connect().await?;
    log::info!("connected");

    ctx.timer.reset();
    repl::run(&mut ctx).await?;

    ctx.disconnect().await;
    log::info!("exit");

    Ok(())
}

/// Fill in whatever the flags left out. Prompting for the password never
/// echoes it.
fn read_credentials(config: &Config) -> Result<(String, String)> {
    match (config.user.clone(), config.password.clone()) {
        (Some(user), Some(password)) => Ok((user, password)),
        (Some(user), None) => {
            let password = Password::new().with_prompt("password").interact()?;
            Ok((user, password))
        }
        (None, _) => {
            let user: String = Input::new().with_prompt("username").interact_text()?;
            let password = Password::new().with_prompt("password").interact()?;
            Ok((user, password))
        }
    }
}
