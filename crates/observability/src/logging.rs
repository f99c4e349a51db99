//! Subscriber setup.

use crate::LogArgs;
use eyre::Result;
use tracing_subscriber::EnvFilter;

/// Build the filter for the given arguments.
///
/// Precedence:
/// 1. `--quiet` shows errors only
/// 2. `RUST_LOG` if set, otherwise a level derived from `-v`
/// 3. `--log.filter` directives are added on top
pub fn build_filter(args: &LogArgs) -> EnvFilter {
    if args.quiet {
        return EnvFilter::new("error");
    }

    let base_level = match args.verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let mut filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(base_level));

    if let Some(custom) = &args.filter {
        for directive in custom.split(',').map(str::trim).filter(|d| !d.is_empty()) {
            match directive.parse() {
                Ok(d) => filter = filter.add_directive(d),
                Err(err) => eprintln!("ignoring invalid log directive {directive:?}: {err}"),
            }
        }
    }

    filter
}

/// Install the global `tracing` subscriber.
pub fn init_logging(args: &LogArgs) -> Result<()> {
    let builder = tracing_subscriber::fmt().with_env_filter(build_filter(args)).with_target(true);

    if args.json {
        builder.json().try_init().map_err(|err| eyre::eyre!(err))?;
    } else {
        builder.try_init().map_err(|err| eyre::eyre!(err))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_overrides_everything() {
        let args = LogArgs { quiet: true, verbosity: 3, ..Default::default() };
        assert_eq!(build_filter(&args).to_string(), "error");
    }

    #[test]
    fn test_custom_directives_are_added() {
        let args =
            LogArgs { filter: Some("tollgate_pricing=trace, ,".into()), ..Default::default() };
        assert!(build_filter(&args).to_string().contains("tollgate_pricing=trace"));
    }
}
