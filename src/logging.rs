use std::fmt;

// Let's extend Result with logging
pub trait ResultExt<T> {
    fn expect_and_log(self, msg: &str) -> T;
}

impl<T, E: fmt::Debug> ResultExt<T> for Result<T, E> {
    fn expect_and_log(self, err_msg: &str) -> T {
        self.map_err(|e| {
            log::error!("{}", err_msg);
            e
        })
        .expect(err_msg)
    }
}

impl<T> ResultExt<T> for Option<T> {
    fn expect_and_log(self, err_msg: &str) -> T {
        self.or_else(|| {
            log::error!("{}", err_msg);
            None
        })
        .expect(err_msg)
    }
}

/// Map number of `-v` occurrences to a log level. Warnings are always shown.
pub fn level_from_verbosity(verbosity: u8) -> log::LevelFilter {
    match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

/// Install simple_logger on stderr. `RUST_LOG` takes precedence over `level`.
pub fn init_logging_infrastructure(level: log::LevelFilter) -> Result<(), String> {
    simple_logger::SimpleLogger::new()
        .with_level(level)
        .env()
        .init()
        .map_err(|e| format!("Error initializing logger: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_verbosity() {
        assert_eq!(level_from_verbosity(0), log::LevelFilter::Warn);
        assert_eq!(level_from_verbosity(1), log::LevelFilter::Info);
        assert_eq!(level_from_verbosity(2), log::LevelFilter::Debug);
        assert_eq!(level_from_verbosity(7), log::LevelFilter::Trace);
    }

    #[test]
    fn test_expect_and_log_passes_value() {
        let r: Result<u32, String> = Ok(4);
        assert_eq!(r.expect_and_log("should not fail"), 4);
        assert_eq!(Some("x").expect_and_log("should not fail"), "x");
    }

    #[test]
    #[should_panic(expected = "missing value")]
    fn test_expect_and_log_panics_on_none() {
        let o: Option<u32> = None;
        o.expect_and_log("missing value");
    }
}
