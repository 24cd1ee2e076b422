mod cmd;
mod convert;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "tagwire", version, about = "Send and receive tagged values over TCP")]
struct Cli {
    /// Output format for received values.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    match cmd::run(cli.command, format) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_send_subcommand() {
        let cli = Cli::try_parse_from(["tagwire", "send", "127.0.0.1:5544", "--str", "hello"])
            .expect("send args should parse");

        match cli.command {
            Command::Send(args) => {
                assert_eq!(args.addr, "127.0.0.1:5544");
                assert_eq!(args.text.as_deref(), Some("hello"));
            }
            other => panic!("expected send, got {other:?}"),
        }
    }

    #[test]
    fn accepts_negative_numbers() {
        let cli = Cli::try_parse_from(["tagwire", "send", "127.0.0.1:5544", "--sint", "-56"])
            .expect("negative value should parse");
        assert!(matches!(cli.command, Command::Send(args) if args.sint == Some(-56)));
    }

    #[test]
    fn rejects_two_values() {
        let err = Cli::try_parse_from([
            "tagwire",
            "send",
            "127.0.0.1:5544",
            "--str",
            "hello",
            "--int",
            "3",
        ])
        .expect_err("two values should conflict");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn requires_a_value() {
        let err = Cli::try_parse_from(["tagwire", "send", "127.0.0.1:5544"])
            .expect_err("missing value should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn parses_listen_with_global_flags() {
        let cli = Cli::try_parse_from([
            "tagwire",
            "listen",
            ":5544",
            "--count",
            "2",
            "--format",
            "pretty",
            "--log-format",
            "json",
        ])
        .expect("listen args should parse");

        assert_eq!(cli.format, Some(OutputFormat::Pretty));
        assert_eq!(cli.log_format, LogFormat::Json);
        assert!(matches!(cli.command, Command::Listen(args) if args.count == Some(2)));
    }
}
