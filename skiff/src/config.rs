use clap::{Arg, ArgAction, ArgMatches, Command};

/// Command-line surface of the client.
pub fn cli() -> Command {
    Command::new("skiff")
        .about("Interactive remote file-transfer client")
        .arg(
            Arg::new("server")
                .long("server")
                .value_name("host[:port]")
                .help("Server name")
                .required(true),
        )
        .arg(
            Arg::new("user")
                .long("user")
                .value_name("name")
                .help("user name (prompted if absent)"),
        )
        .arg(
            Arg::new("passwd")
                .long("passwd")
                .value_name("secret")
                .help("password (prompted if absent)"),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .action(ArgAction::SetTrue)
                .help("Debugging on"),
        )
}

#[derive(Debug, Default)]
pub struct Config {
    pub server: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub debug: bool,
}

impl TryFrom<&ArgMatches> for Config {
    type Error = crate::Error;

    fn try_from(matches: &ArgMatches) -> crate::Result<Self> {
        let server = matches
            .get_one::<String>("server")
            .cloned()
            .ok_or_else(|| crate::Error::ArgumentError("server name is required".to_string()))?;

        let user = matches.get_one::<String>("user").cloned();
        let password = matches.get_one::<String>("passwd").cloned();

        if user.is_none() && password.is_some() {
            return Err(crate::Error::ArgumentError(
                "a password without a user name makes no sense".to_string(),
            ));
        }

        Ok(Self {
            server,
            user,
            password,
            debug: matches.get_flag("debug"),
        })
    }
}
