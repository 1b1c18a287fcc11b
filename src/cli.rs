use crate::data::{DataSource, Symbol};

/// Command-line overrides; each `None` falls back to the environment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Args {
    pub source: Option<DataSource>,
    pub symbol: Option<Symbol>,
    pub api_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Run(Args),
    Help,
    Version,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    pub code: i32,
    pub message: String,
}

impl ParseError {
    fn usage(message: String) -> Self {
        Self {
            code: 2,
            message: format!("{message}\n\nTry `{} --help` for usage.", env!("CARGO_PKG_NAME")),
        }
    }
}

#[must_use]
pub fn help_text(bin_name: &str) -> String {
    indoc::formatdoc! {"
        MarketDesk - stock screener, news and company profiles in the terminal

        Usage:
          {bin_name} [options]

        Options:
              --mock           use the built-in offline dataset
              --live           use the backend (default)
              --symbol <T>     open the profile of ticker T
              --api-url <URL>  backend base URL
          -h, --help           print this help
          -V, --version        print the version
    "}
}

#[must_use]
pub fn version_text() -> String {
    format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

pub fn parse_args<I, S>(args: I) -> Result<Command, ParseError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut parsed = Args::default();
    let mut show_help = false;
    let mut show_version = false;
    let mut args = args.into_iter().map(Into::into);

    while let Some(arg) = args.next() {
        // `--flag=value` is accepted as well as `--flag value`
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => (flag.to_string(), Some(value.to_string())),
            _ => (arg.clone(), None),
        };
        let mut value = |name: &str| {
            inline
                .clone()
                .or_else(|| args.next())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ParseError::usage(format!("missing value for {name}")))
        };

        match flag.as_str() {
            "-h" | "--help" => show_help = true,
            "-V" | "--version" => show_version = true,
            "--mock" => set_source(&mut parsed, DataSource::Mock)?,
            "--live" => set_source(&mut parsed, DataSource::Live)?,
            "--symbol" => {
                let raw = value("--symbol")?;
                let symbol = Symbol::parse(&raw)
                    .map_err(|err| ParseError::usage(format!("invalid --symbol: {err}")))?;
                parsed.symbol = Some(symbol);
            }
            "--api-url" => {
                let url = value("--api-url")?;
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(ParseError::usage(format!(
                        "invalid --api-url `{url}`: expected an http(s) URL"
                    )));
                }
                parsed.api_url = Some(url.trim_end_matches('/').to_string());
            }
            _ if arg.starts_with('-') => {
                return Err(ParseError::usage(format!("unknown option: {arg}")));
            }
            _ => {
                return Err(ParseError::usage(format!("unexpected argument: {arg}")));
            }
        }
    }

    if show_help {
        return Ok(Command::Help);
    }

    if show_version {
        return Ok(Command::Version);
    }

    Ok(Command::Run(parsed))
}

fn set_source(args: &mut Args, source: DataSource) -> Result<(), ParseError> {
    match args.source {
        Some(previous) if previous != source => Err(ParseError::usage(
            "--mock and --live are mutually exclusive".to_string(),
        )),
        _ => {
            args.source = Some(source);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(args: &[&str]) -> Args {
        match parse_args(args.iter().copied()) {
            Ok(Command::Run(args)) => args,
            other => panic!("expected run command, got {other:?}"),
        }
    }

    #[test]
    fn parses_default_run_command() {
        assert_eq!(run(&[]), Args::default());
    }

    #[test]
    fn parses_help_and_version() {
        assert_eq!(parse_args(["--help"]), Ok(Command::Help));
        assert_eq!(parse_args(["-V"]), Ok(Command::Version));
        // help wins over everything else
        assert_eq!(parse_args(["--mock", "-h"]), Ok(Command::Help));
    }

    #[test]
    fn parses_source_symbol_and_url() {
        let args = run(&["--mock", "--symbol", "aapl", "--api-url=http://localhost:9000/api/v1/"]);
        assert_eq!(args.source, Some(DataSource::Mock));
        assert_eq!(args.symbol, Some(Symbol::new("AAPL")));
        assert_eq!(args.api_url.as_deref(), Some("http://localhost:9000/api/v1"));
    }

    #[test]
    fn rejects_conflicting_sources() {
        let err = parse_args(["--mock", "--live"]).expect_err("expected parse error");
        assert_eq!(err.code, 2);
        assert!(err.message.contains("mutually exclusive"));
        assert!(parse_args(["--mock", "--mock"]).is_ok());
    }

    #[test]
    fn fails_on_missing_value() {
        let err = parse_args(["--symbol"]).expect_err("expected parse error");
        assert_eq!(err.code, 2);
        assert!(err.message.contains("missing value for --symbol"));
        assert!(err.message.contains("--help"));
    }

    #[test]
    fn fails_on_invalid_symbol() {
        let err = parse_args(["--symbol", "TOO-LONG-TICKER"]).expect_err("expected parse error");
        assert!(err.message.contains("invalid --symbol"));
        let err = parse_args(["--symbol", "A$"]).expect_err("expected parse error");
        assert!(err.message.contains("invalid --symbol"));
    }

    #[test]
    fn fails_on_unknown_option() {
        let err = parse_args(["--unknown"]).expect_err("expected parse error");
        assert_eq!(err.code, 2);
        assert!(err.message.contains("unknown option: --unknown"));
    }

    #[test]
    fn fails_on_positional_argument() {
        let err = parse_args(["abc"]).expect_err("expected parse error");
        assert_eq!(err.code, 2);
        assert!(err.message.contains("unexpected argument: abc"));
    }

    #[test]
    fn help_lists_every_flag() {
        let help = help_text("marketdesk");
        assert!(help.starts_with("MarketDesk"));
        assert!(help.contains("  marketdesk [options]"));
        for flag in ["--mock", "--live", "--symbol", "--api-url", "--help", "--version"] {
            assert!(help.contains(flag), "{flag}");
        }
    }
}
