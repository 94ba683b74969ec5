use std::io::Write;

/// Log to stderr through env_logger. `--debug` lowers the default filter
/// to `debug`, which also surfaces the SSH-level protocol chatter.
pub fn init_logging(debug: bool) {
    let default_filter = if debug { "debug" } else { "info" };
    let env = env_logger::Env::default().default_filter_or(default_filter);

    env_logger::Builder::from_env(env)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {} - {}",
                buf.timestamp_millis(),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
