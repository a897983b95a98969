mod app;
mod catalog;
mod cli;
mod client;
mod error;
mod export;
mod pagination;
mod renderer;
mod responses;
mod result;

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::catalog::Catalog;
use crate::client::{HttpTransport, SubmissionClient};
use crate::export::SessionExport;
use crate::responses::{CalculateRequest, ResponseStore};

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    init_logging(&cli)?;

    let catalog = match cli.catalog {
        Some(ref path) => Catalog::load(path)?,
        None => Catalog::bundled()?,
    };
    tracing::info!(questions = catalog.len(), "catalog loaded");

    let transport = HttpTransport::new(&cli.endpoint, cli.request_timeout())?;
    let client = SubmissionClient::new(Arc::new(transport), catalog.len());

    // Handle --answers mode
    if let Some(ref answers) = cli.answers {
        handle_answers(
            &catalog,
            &client,
            answers,
            cli.output.as_deref(),
            &mut std::io::stdout().lock(),
        )?;
        return Ok(());
    }

    // Interactive questionnaire
    let mut app = app::App::new(catalog, cli.page_size as usize, client, cli.output.clone());
    app.run()?;

    Ok(())
}

/// Logs go to `--log-file` when given. Otherwise only headless mode logs, to
/// stderr; the TUI owns the terminal.
fn init_logging(cli: &cli::Cli) -> anyhow::Result<()> {
    let default_level = if cli.verbose { "debug" } else { "info" };

    if let Some(ref path) = cli.log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(env_filter(default_level))
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .init();
    } else if cli.answers.is_some() {
        let level = if cli.verbose { "debug" } else { "warn" };
        tracing_subscriber::fmt()
            .with_env_filter(env_filter(level))
            .with_writer(std::io::stderr)
            .init();
    }

    Ok(())
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Headless mode: submit a saved request body and print the scores.
fn handle_answers(
    catalog: &Catalog,
    client: &SubmissionClient,
    answers: &Path,
    output: Option<&Path>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(answers)
        .with_context(|| format!("failed to read answers {}", answers.display()))?;
    let request: CalculateRequest = serde_json::from_str(&raw)
        .with_context(|| format!("invalid answers file {}", answers.display()))?;

    let mut store = ResponseStore::new(catalog);
    store.load_request(&request)?;

    let scores = client.submit(&store)?;

    writeln!(out, "Results ({} questions answered):", store.answered_count())?;
    for line in result::summary_lines(&scores) {
        writeln!(out, "  {}", line)?;
    }

    if let Some(output) = output {
        SessionExport::new(client.endpoint(), store.responses(), scores).write(output)?;
        writeln!(out, "Saved: {}", output.display())?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Category, Question};
    use crate::client::testing::MockTransport;

    const SCORES: &str = r#"{"neuroticism":3.0,"extraversion":4.0,"conscientiousness":2.0,"agreeableness":1.0,"openness":5.0}"#;

    fn catalog() -> Catalog {
        let questions = (1..=3)
            .map(|id| Question {
                id,
                text: format!("Question {}", id),
                category: Category::ALL[id as usize - 1],
                is_reverse: false,
            })
            .collect();
        Catalog::new(questions).unwrap()
    }

    fn write_answers(dir: &Path, body: &str) -> std::path::PathBuf {
        let path = dir.join("answers.json");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_handle_answers_prints_and_exports() {
        let dir = tempfile::tempdir().unwrap();
        let answers = write_answers(
            dir.path(),
            r#"{"responses":[{"questionId":3,"score":5},{"questionId":1,"score":4},{"questionId":2,"score":2}]}"#,
        );
        let output = dir.path().join("out").join("result.json");
        let transport = MockTransport::ok(SCORES);
        let client = SubmissionClient::new(transport.clone(), 3);

        let mut printed = Vec::new();
        handle_answers(&catalog(), &client, &answers, Some(&output), &mut printed).unwrap();

        let printed = String::from_utf8(printed).unwrap();
        assert!(printed.starts_with("Results (3 questions answered):"));
        assert!(printed.contains("Neuroticism"));
        assert!(printed.contains("5.0"));
        assert!(printed.contains("Saved: "));

        // Sent in catalog order, exactly once.
        assert_eq!(transport.call_count(), 1);
        let sent = transport.calls.lock().unwrap();
        let ids: Vec<u32> = sent[0].responses.iter().map(|r| r.question_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        let exported: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(exported["endpoint"], "mock://scoring");
        assert_eq!(exported["result"]["openness"], 5.0);
    }

    #[test]
    fn test_handle_answers_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let answers = write_answers(
            dir.path(),
            r#"{"responses":[{"questionId":1,"score":1},{"questionId":2,"score":1},{"questionId":3,"score":1}]}"#,
        );
        let client = SubmissionClient::new(MockTransport::ok(SCORES), 3);

        let mut printed = Vec::new();
        handle_answers(&catalog(), &client, &answers, None, &mut printed).unwrap();
        assert!(!String::from_utf8(printed).unwrap().contains("Saved"));
    }

    #[test]
    fn test_handle_answers_incomplete_is_not_sent() {
        let dir = tempfile::tempdir().unwrap();
        let answers = write_answers(dir.path(), r#"{"responses":[{"questionId":1,"score":4}]}"#);
        let transport = MockTransport::ok(SCORES);
        let client = SubmissionClient::new(transport.clone(), 3);

        let mut printed = Vec::new();
        let err = handle_answers(&catalog(), &client, &answers, None, &mut printed).unwrap_err();
        assert!(err.to_string().contains("1/3"));
        assert_eq!(transport.call_count(), 0);
        assert!(printed.is_empty());
    }

    #[test]
    fn test_handle_answers_rejects_bad_input() {
        let dir = tempfile::tempdir().unwrap();
        let client = SubmissionClient::new(MockTransport::ok(SCORES), 3);
        let mut printed = Vec::new();

        let out_of_range = write_answers(dir.path(), r#"{"responses":[{"questionId":1,"score":9}]}"#);
        assert!(handle_answers(&catalog(), &client, &out_of_range, None, &mut printed).is_err());

        let garbage = write_answers(dir.path(), "not json");
        let err = handle_answers(&catalog(), &client, &garbage, None, &mut printed).unwrap_err();
        assert!(err.to_string().contains("invalid answers file"));

        let missing = dir.path().join("missing.json");
        assert!(handle_answers(&catalog(), &client, &missing, None, &mut printed).is_err());
    }

    #[test]
    fn test_handle_answers_server_error() {
        let dir = tempfile::tempdir().unwrap();
        let answers = write_answers(
            dir.path(),
            r#"{"responses":[{"questionId":1,"score":1},{"questionId":2,"score":1},{"questionId":3,"score":1}]}"#,
        );
        let client = SubmissionClient::new(MockTransport::status(500, ""), 3);

        let mut printed = Vec::new();
        let err = handle_answers(&catalog(), &client, &answers, None, &mut printed).unwrap_err();
        assert!(err.to_string().contains("HTTP 500"));
    }
}
