use std::io::stdout;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::Terminal;

use crate::catalog::Catalog;
use crate::client::SubmissionClient;
use crate::error::SubmitError;
use crate::export::SessionExport;
use crate::pagination::Pager;
use crate::renderer::{self, ResultView, Screen};
use crate::responses::{CalculateRequest, ResponseStore};
use crate::result::{self, ResultSet};

/// One-line message shown next to the key legend.
#[derive(Clone, Debug, PartialEq)]
pub enum Notice {
    Info(String),
    Error(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Continue,
    Quit,
}

/// A scoring request running on a worker thread.
struct PendingSubmission {
    rx: Receiver<Result<ResultSet, SubmitError>>,
    request: CalculateRequest,
}

/// Questionnaire state. Every mutation goes through a named method so the
/// store and pager invariants hold no matter which key triggered it.
pub struct App {
    pub catalog: Catalog,
    pub store: ResponseStore,
    pub pager: Pager,
    pub client: SubmissionClient,
    /// Index of the focused question within the current page.
    pub cursor: usize,
    pub result: Option<ResultSet>,
    pub result_view: ResultView,
    pub notice: Option<Notice>,
    pub output: Option<PathBuf>,
    pending: Option<PendingSubmission>,
}

impl App {
    pub fn new(
        catalog: Catalog,
        page_size: usize,
        client: SubmissionClient,
        output: Option<PathBuf>,
    ) -> Self {
        let store = ResponseStore::new(&catalog);
        let pager = Pager::new(catalog.len(), page_size);

        Self {
            catalog,
            store,
            pager,
            client,
            cursor: 0,
            result: None,
            result_view: ResultView::Bars,
            notice: None,
            output,
            pending: None,
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.pending.is_some()
    }

    pub fn can_submit(&self) -> bool {
        !self.is_submitting() && self.client.check(&self.store).is_ok()
    }

    fn page_len(&self) -> usize {
        self.pager.current_range().len()
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Record `score` for the focused question, then move the cursor to the
    /// next unanswered question on the page.
    pub fn answer(&mut self, score: i64) {
        let Some(question) = self.pager.page_questions(&self.catalog).get(self.cursor) else {
            return;
        };
        let (question_id, category) = (question.id, question.category);

        if let Err(e) = self.store.record_response(question_id, score) {
            self.notice = Some(Notice::Error(e.to_string()));
            return;
        }
        tracing::debug!(
            question_id,
            category = category.as_str(),
            score,
            "response recorded"
        );

        if let Some(next) =
            self.pager
                .first_unanswered(&self.catalog, &self.store, self.cursor + 1)
        {
            self.cursor = next;
        }

        self.notice = if self.store.is_complete() {
            Some(Notice::Info(
                "All questions answered. Press s to see your results.".to_string(),
            ))
        } else if self.pager.is_page_complete(&self.catalog, &self.store) && !self.pager.is_last()
        {
            Some(Notice::Info(
                "Page complete. Press n for the next page.".to_string(),
            ))
        } else {
            None
        };
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.page_len();
        if len == 0 {
            return;
        }
        let target = self.cursor as isize + delta;
        self.cursor = target.clamp(0, len as isize - 1) as usize;
    }

    pub fn next_page(&mut self) -> bool {
        if self.pager.is_last() {
            return false;
        }
        if !self.pager.next(&self.catalog, &self.store) {
            let page = self.pager.page_questions(&self.catalog);
            let answered = page
                .iter()
                .filter(|q| self.store.score_of(q.id).is_some())
                .count();
            self.notice = Some(Notice::Error(format!(
                "Answer every question on this page first ({}/{})",
                answered,
                page.len()
            )));
            return false;
        }

        self.cursor = self
            .pager
            .first_unanswered(&self.catalog, &self.store, 0)
            .unwrap_or(0);
        self.notice = None;
        true
    }

    pub fn prev_page(&mut self) -> bool {
        if !self.pager.prev() {
            return false;
        }
        self.cursor = 0;
        self.notice = None;
        true
    }

    /// Start a submission on a worker thread. Refused, without touching the
    /// client, while one is in flight or while any question is unanswered.
    pub fn request_submit(&mut self) -> bool {
        if self.is_submitting() {
            self.notice = Some(Notice::Info(
                "Already waiting for the scoring service".to_string(),
            ));
            return false;
        }
        if let Err(e) = self.client.check(&self.store) {
            self.notice = Some(Notice::Error(e.to_string()));
            return false;
        }

        let (tx, rx) = mpsc::channel();
        let client = self.client.clone();
        let request = self.store.to_request();
        let body = request.clone();
        thread::spawn(move || {
            let _ = tx.send(client.submit_request(&body));
        });

        self.pending = Some(PendingSubmission { rx, request });
        self.notice = Some(Notice::Info("Scoring...".to_string()));
        true
    }

    /// Collect the outcome of the in-flight submission, waiting at most
    /// `timeout`. Returns `true` once a submission has settled.
    pub fn poll_submission(&mut self, timeout: Duration) -> bool {
        let Some(pending) = &self.pending else {
            return false;
        };

        let outcome = match pending.rx.recv_timeout(timeout) {
            Ok(outcome) => outcome,
            Err(RecvTimeoutError::Timeout) => return false,
            Err(RecvTimeoutError::Disconnected) => Err(SubmitError::Transport(
                "submission worker stopped unexpectedly".to_string(),
            )),
        };

        let Some(pending) = self.pending.take() else {
            return false;
        };
        match outcome {
            Ok(scores) => {
                self.result = Some(scores);
                self.notice = Some(Notice::Info("Scores received".to_string()));
                self.export(pending.request, scores);
            }
            Err(e) => {
                // Responses stay as they are; the user can retry.
                self.notice = Some(Notice::Error(e.to_string()));
            }
        }
        true
    }

    fn export(&mut self, request: CalculateRequest, scores: ResultSet) {
        let Some(path) = &self.output else {
            return;
        };
        let export = SessionExport::new(self.client.endpoint(), request.responses, scores);
        match export.write(path) {
            Ok(()) => {
                self.notice = Some(Notice::Info(format!(
                    "Scores received and saved to {}",
                    path.display()
                )));
            }
            Err(e) => {
                tracing::warn!(error = %e, "export failed");
                self.notice = Some(Notice::Error(format!("Scores received but not saved: {e:#}")));
            }
        }
    }

    /// Apply one key press.
    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        if key.kind != KeyEventKind::Press {
            return Action::Continue;
        }
        // Ctrl+C always quits.
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Action::Quit;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return Action::Quit,
            KeyCode::Char(c @ '1'..='5') => {
                self.answer(i64::from(c as u8 - b'0'));
            }
            KeyCode::Char('j') | KeyCode::Down => self.move_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_cursor(-1),
            KeyCode::Char('g') | KeyCode::Home => self.cursor = 0,
            KeyCode::Char('G') | KeyCode::End => self.move_cursor(isize::MAX / 2),
            KeyCode::Char('n') | KeyCode::Right | KeyCode::PageDown | KeyCode::Tab => {
                self.next_page();
            }
            KeyCode::Char('p') | KeyCode::Left | KeyCode::PageUp | KeyCode::BackTab => {
                self.prev_page();
            }
            KeyCode::Char('s') | KeyCode::Enter => {
                self.request_submit();
            }
            KeyCode::Char('v') => {
                if self.result.is_some() {
                    self.result_view = self.result_view.toggled();
                }
            }
            _ => {}
        }

        Action::Continue
    }

    pub fn screen(&self) -> Screen<'_> {
        let range = self.pager.current_range();
        Screen {
            endpoint: self.client.endpoint(),
            page: self.pager.page_questions(&self.catalog),
            page_start: range.start,
            page_index: self.pager.current(),
            page_count: self.pager.page_count(),
            store: &self.store,
            cursor: self.cursor,
            can_next: self.pager.is_page_complete(&self.catalog, &self.store),
            is_last_page: self.pager.is_last(),
            submitting: self.is_submitting(),
            result: self.result.as_ref(),
            result_view: self.result_view,
            notice: self.notice.as_ref(),
        }
    }

    // -----------------------------------------------------------------------
    // Run loop
    // -----------------------------------------------------------------------

    /// Run the main TUI event loop.
    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut out = stdout();
        execute!(out, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(out);
        let mut terminal = Terminal::new(backend)?;

        let outcome = self.event_loop(&mut terminal);

        // Cleanup -- restore the terminal even if the loop failed.
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;
        outcome?;

        println!();
        match &self.result {
            Some(scores) => {
                println!("Your results:");
                for line in result::summary_lines(scores) {
                    println!("  {}", line);
                }
            }
            None => println!(
                "Answered {} of {} questions; no results yet.",
                self.store.answered_count(),
                self.store.total()
            ),
        }
        println!();

        Ok(())
    }

    fn event_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        loop {
            terminal.draw(|frame| renderer::render_ui(frame, &self.screen()))?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if self.handle_key(key) == Action::Quit {
                        break;
                    }
                }
            }

            self.poll_submission(Duration::ZERO);
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
