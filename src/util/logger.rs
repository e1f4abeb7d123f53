use log::SetLoggerError;

/// The env var that sets the log filter, in `env_logger` syntax (e.g. `OOBGC_LOG=oobgc=debug`).
pub const LOG_FILTER_ENV: &str = "OOBGC_LOG";
/// The env var that sets whether log output is colored.
pub const LOG_STYLE_ENV: &str = "OOBGC_LOG_STYLE";

/// Attempt to init a env_logger for oobgc.
/// Does nothing if the "builtin_env_logger" feature is disabled.
pub fn try_init() -> Result<(), SetLoggerError> {
    cfg_if::cfg_if! {
        if #[cfg(feature = "builtin_env_logger")] {
            env_logger::try_init_from_env(
                // By default, use info level logging.
                env_logger::Env::new()
                    .filter_or(LOG_FILTER_ENV, "info")
                    .write_style(LOG_STYLE_ENV),
            )
        } else {
            Ok(())
        }
    }
}
