use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::client::{DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_SECS};
use crate::pagination::DEFAULT_PAGE_SIZE;

/// Answer a Big Five personality questionnaire and view your trait scores
#[derive(Parser, Debug)]
#[command(name = "hpcs")]
#[command(version)]
#[command(about = "Answer a Big Five personality questionnaire and view your trait scores")]
pub struct Cli {
    /// Scoring endpoint that receives the answers
    #[arg(short = 'e', long = "endpoint", env = "HPCS_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Questions shown per page
    #[arg(
        short = 'p',
        long = "page-size",
        env = "HPCS_PAGE_SIZE",
        default_value_t = DEFAULT_PAGE_SIZE,
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    pub page_size: u16,

    /// Load questions from a JSON file instead of the bundled battery
    #[arg(long = "catalog")]
    pub catalog: Option<PathBuf>,

    /// Request timeout in seconds; 0 waits forever
    #[arg(long = "timeout", default_value_t = DEFAULT_TIMEOUT_SECS, value_parser = parse_timeout)]
    pub timeout: f64,

    /// Submit answers from a JSON file without starting the TUI
    #[arg(long = "answers")]
    pub answers: Option<PathBuf>,

    /// Write responses and scores to a JSON file after scoring
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Write logs to this file
    #[arg(long = "log-file")]
    pub log_file: Option<PathBuf>,

    /// Log at debug level
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Cli {
    /// Timeout for scoring requests. `None` (from `--timeout 0`) disables it.
    pub fn request_timeout(&self) -> Option<Duration> {
        if self.timeout == 0.0 {
            return None;
        }
        Duration::try_from_secs_f64(self.timeout).ok()
    }
}

fn parse_timeout(raw: &str) -> Result<f64, String> {
    let secs: f64 = raw
        .parse()
        .map_err(|_| format!("`{raw}` is not a number of seconds"))?;
    Duration::try_from_secs_f64(secs)
        .map_err(|_| format!("`{raw}` is not a valid timeout (use 0 or a positive number)"))?;
    Ok(secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["hpcs"]).unwrap();
        assert_eq!(cli.page_size, 10);
        assert!(cli.answers.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from([
            "hpcs",
            "--endpoint",
            "http://scoring.internal/api/calculate",
            "-p",
            "2",
            "--answers",
            "answers.json",
            "--timeout",
            "2.5",
        ])
        .unwrap();
        assert_eq!(cli.endpoint, "http://scoring.internal/api/calculate");
        assert_eq!(cli.page_size, 2);
        assert_eq!(cli.answers, Some(PathBuf::from("answers.json")));
        assert_eq!(cli.timeout, 2.5);
    }

    #[test]
    fn test_timeout_conversion() {
        let cli = Cli::try_parse_from(["hpcs", "--timeout", "2.5"]).unwrap();
        assert_eq!(cli.request_timeout(), Some(Duration::from_millis(2500)));

        let cli = Cli::try_parse_from(["hpcs"]).unwrap();
        assert_eq!(cli.request_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_zero_timeout_disables_timeout() {
        let cli = Cli::try_parse_from(["hpcs", "--timeout", "0"]).unwrap();
        assert_eq!(cli.timeout, 0.0);
        assert_eq!(cli.request_timeout(), None);
    }

    #[test]
    fn test_invalid_timeout_rejected() {
        assert!(Cli::try_parse_from(["hpcs", "--timeout", "-1"]).is_err());
        assert!(Cli::try_parse_from(["hpcs", "--timeout", "NaN"]).is_err());
        assert!(Cli::try_parse_from(["hpcs", "--timeout", "soon"]).is_err());
    }

    #[test]
    fn test_zero_page_size_rejected() {
        assert!(Cli::try_parse_from(["hpcs", "--page-size", "0"]).is_err());
    }
}
