//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use webclient::DEFAULT_CHUNK_SIZE;

/// Fetch a URL into a file or print it as text, reporting progress as it arrives.
#[derive(Parser, Debug)]
#[command(name = "webclient")]
#[command(author, version, about)]
pub struct Args {
    /// URL to download (http or https)
    pub url: String,

    /// Write the body to this file instead of printing it as text
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Maximum bytes per progress event for file downloads
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// Connect timeout in seconds (transport default when omitted)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub connect_timeout: Option<u64>,

    /// Read timeout in seconds (transport default when omitted)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=86400))]
    pub read_timeout: Option<u64>,

    /// Print every event as a JSON line on stdout
    #[arg(long)]
    pub json: bool,

    /// Run the transfer on a background task and poll it for completion
    #[arg(long)]
    pub background: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Log filter used when `RUST_LOG` is not set.
    pub fn default_log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_url_only_parses_with_defaults() {
        let args = Args::try_parse_from(["webclient", "https://example.com/a.txt"]).unwrap();
        assert_eq!(args.url, "https://example.com/a.txt");
        assert!(args.output.is_none());
        assert_eq!(args.chunk_size, DEFAULT_CHUNK_SIZE);
        assert!(args.connect_timeout.is_none());
        assert!(args.read_timeout.is_none());
        assert!(!args.json);
        assert!(!args.background);
        assert_eq!(args.default_log_level(), "info");
    }

    #[test]
    fn test_cli_missing_url_returns_error() {
        let err = Args::try_parse_from(["webclient"]).unwrap_err();
        assert_eq!(
            err.kind(),
            clap::error::ErrorKind::MissingRequiredArgument
        );
    }

    #[test]
    fn test_cli_output_short_and_long() {
        let args = Args::try_parse_from(["webclient", "https://e.com/", "-o", "out.bin"]).unwrap();
        assert_eq!(args.output, Some(PathBuf::from("out.bin")));

        let args =
            Args::try_parse_from(["webclient", "https://e.com/", "--output", "x.bin"]).unwrap();
        assert_eq!(args.output, Some(PathBuf::from("x.bin")));
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["webclient", "https://e.com/", "-v"]).unwrap();
        assert_eq!(args.default_log_level(), "debug");

        let args = Args::try_parse_from(["webclient", "https://e.com/", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
        assert_eq!(args.default_log_level(), "trace");
    }

    #[test]
    fn test_cli_quiet_wins_over_verbose() {
        let args = Args::try_parse_from(["webclient", "https://e.com/", "-q", "-v"]).unwrap();
        assert_eq!(args.default_log_level(), "error");
    }

    #[test]
    fn test_cli_timeouts_parse() {
        let args = Args::try_parse_from([
            "webclient",
            "https://e.com/",
            "--connect-timeout",
            "10",
            "--read-timeout",
            "60",
        ])
        .unwrap();
        assert_eq!(args.connect_timeout, Some(10));
        assert_eq!(args.read_timeout, Some(60));
    }

    #[test]
    fn test_cli_zero_timeout_rejected() {
        let result = Args::try_parse_from(["webclient", "https://e.com/", "--connect-timeout", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Args::try_parse_from(["webclient", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        let err = Args::try_parse_from(["webclient", "https://e.com/", "--invalid-flag"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }
}
