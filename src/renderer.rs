//! Ratatui renderer for the questionnaire, progress header and results.
//!
//! This module is purely presentational -- it takes references to application
//! data and renders into a Ratatui `Frame`.  It does **not** own any state.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::canvas::{Canvas, Line as CanvasLine};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph};
use ratatui::Frame;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::Notice;
use crate::catalog::{Category, Question, LIKERT_OPTIONS};
use crate::responses::{QuestionState, ResponseStore};
use crate::result::{axis_direction, format_score, magnitude, radar_vertices, ResultSet};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Lines taken by one question: badges, text, choices, spacer.
pub const QUESTION_BLOCK_HEIGHT: u16 = 4;

const HEADER_HEIGHT: u16 = 3;
const PROGRESS_HEIGHT: u16 = 2;
const BAR_HEIGHT: u16 = 3;

const RADAR_X: [f64; 2] = [-1.6, 1.6];
const RADAR_Y: [f64; 2] = [-1.3, 1.3];

// ---------------------------------------------------------------------------
// Screen
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResultView {
    Bars,
    Radar,
}

impl ResultView {
    pub fn toggled(self) -> Self {
        match self {
            ResultView::Bars => ResultView::Radar,
            ResultView::Radar => ResultView::Bars,
        }
    }
}

/// Everything one frame needs, borrowed from the app.
pub struct Screen<'a> {
    pub endpoint: &'a str,
    /// Questions on the current page.
    pub page: &'a [Question],
    /// Catalog index of `page[0]`, for "Q12"-style numbering.
    pub page_start: usize,
    pub page_index: usize,
    pub page_count: usize,
    pub store: &'a ResponseStore,
    pub cursor: usize,
    pub can_next: bool,
    pub is_last_page: bool,
    pub submitting: bool,
    pub result: Option<&'a ResultSet>,
    pub result_view: ResultView,
    pub notice: Option<&'a Notice>,
}

// ---------------------------------------------------------------------------
// Color mapping
// ---------------------------------------------------------------------------

/// Map a color name (as returned by `Category::color`) to a Ratatui `Color`.
fn color_from_name(name: &str) -> Color {
    match name {
        "dim" => Color::DarkGray,
        "cyan" => Color::Cyan,
        "yellow" => Color::Yellow,
        "red" => Color::Red,
        "green" => Color::Green,
        "blue" => Color::Blue,
        "magenta" => Color::Magenta,
        "pink" => Color::LightRed,
        "white" => Color::White,
        _ => Color::Reset,
    }
}

fn category_color(category: Category) -> Color {
    color_from_name(category.color())
}

// ---------------------------------------------------------------------------
// Text helpers
// ---------------------------------------------------------------------------

/// Cut `text` to at most `max_width` terminal columns, appending an ellipsis
/// when something was dropped. Wide (CJK) characters count as two columns.
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(text) <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w + 1 > max_width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

/// Scroll offset that keeps the cursor's question block fully visible.
pub fn scroll_for_cursor(cursor: usize, viewport_height: u16) -> u16 {
    let block_bottom = cursor
        .saturating_add(1)
        .saturating_mul(QUESTION_BLOCK_HEIGHT as usize);
    let scroll = block_bottom.saturating_sub(viewport_height as usize);
    u16::try_from(scroll).unwrap_or(u16::MAX)
}

// ---------------------------------------------------------------------------
// Question rendering
// ---------------------------------------------------------------------------

/// Build the lines for one question block.
pub fn question_lines(
    question: &Question,
    number: usize,
    state: QuestionState,
    focused: bool,
    width: usize,
) -> Vec<Line<'static>> {
    let marker = if focused { "▶ " } else { "  " };
    let number_style = if focused {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    };

    // 1. Badges
    let mut badges = vec![
        Span::styled(marker.to_string(), Style::default().fg(Color::Cyan)),
        Span::styled(format!(" Q{} ", number), number_style),
        Span::raw(" "),
        Span::styled(
            format!("[{}]", question.category.label()),
            Style::default().fg(category_color(question.category)),
        ),
    ];
    if question.is_reverse {
        badges.push(Span::styled(
            "  reverse-scored item",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::ITALIC),
        ));
    }
    if state == QuestionState::Unanswered {
        badges.push(Span::styled(
            "  unanswered",
            Style::default().fg(Color::DarkGray),
        ));
    }

    // 2. Question text
    let text_style = if focused {
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };
    let text = truncate_to_width(&question.text, width.saturating_sub(4));

    // 3. Choices, current selection highlighted
    let mut choices: Vec<Span<'static>> = vec![Span::raw("    ")];
    for option in LIKERT_OPTIONS.iter() {
        let selected = state == QuestionState::Answered(option.value);
        let style = if selected {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        choices.push(Span::styled(
            format!(" {} {} ", option.value, option.label),
            style,
        ));
        choices.push(Span::raw(" "));
    }
    if let QuestionState::Answered(score) = state {
        if let Some(option) = LIKERT_OPTIONS.iter().find(|o| o.value == score) {
            choices.push(Span::styled(
                format!("({})", option.description),
                Style::default().fg(Color::DarkGray),
            ));
        }
    }

    vec![
        Line::from(badges),
        Line::from(vec![Span::raw("    "), Span::styled(text, text_style)]),
        Line::from(choices),
        Line::default(),
    ]
}

fn render_questions(frame: &mut Frame, area: Rect, screen: &Screen) {
    let width = area.width as usize;
    let mut lines: Vec<Line<'static>> = Vec::new();

    for (i, question) in screen.page.iter().enumerate() {
        lines.extend(question_lines(
            question,
            screen.page_start + i + 1,
            screen.store.state_of(question.id),
            i == screen.cursor,
            width,
        ));
    }

    let scroll = scroll_for_cursor(screen.cursor, area.height);
    let paragraph = Paragraph::new(Text::from(lines)).scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}

// ---------------------------------------------------------------------------
// Header & progress
// ---------------------------------------------------------------------------

fn render_header(frame: &mut Frame, area: Rect, endpoint: &str, submitting: bool) {
    let mut spans = vec![
        Span::styled(
            " HPCS ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            "  Personality questionnaire",
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  scoring: {}", endpoint),
            Style::default().fg(Color::DarkGray),
        ),
    ];

    if submitting {
        spans.push(Span::styled(
            "  Scoring...",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::SLOW_BLINK),
        ));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);
}

fn render_progress(frame: &mut Frame, area: Rect, screen: &Screen) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(area);

    let answered = screen.store.answered_count();
    let total = screen.store.total();
    let summary = Line::from(vec![
        Span::styled(
            format!(" {} / {} answered", answered, total),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!("    Page {} / {}", screen.page_index + 1, screen.page_count),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(Paragraph::new(summary), rows[0]);

    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::Cyan).bg(Color::DarkGray))
        .ratio(screen.store.progress_fraction().clamp(0.0, 1.0))
        .label("");
    frame.render_widget(gauge, rows[1]);
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

fn render_result_bars(frame: &mut Frame, area: Rect, result: &ResultSet) {
    let constraints: Vec<Constraint> = Category::ALL
        .iter()
        .map(|_| Constraint::Length(BAR_HEIGHT))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (i, (category, score)) in result.scores().iter().enumerate() {
        let color = category_color(*category);
        let gauge = Gauge::default()
            .block(
                Block::default()
                    .borders(Borders::NONE)
                    .title(Line::from(vec![
                        Span::styled(
                            format!(" {} ", category.label()),
                            Style::default().fg(Color::White),
                        ),
                        Span::styled(
                            format_score(*score),
                            Style::default().fg(color).add_modifier(Modifier::BOLD),
                        ),
                    ])),
            )
            .gauge_style(Style::default().fg(color).bg(Color::Black))
            .ratio(magnitude(*score))
            .label(format!("{} / 5", format_score(*score)));
        frame.render_widget(gauge, rows[i]);
    }
}

fn render_result_radar(frame: &mut Frame, area: Rect, result: &ResultSet) {
    let vertices = radar_vertices(result);
    let scores = result.scores();
    let units_per_col = (RADAR_X[1] - RADAR_X[0]) / f64::from(area.width.max(1));

    let canvas = Canvas::default()
        .marker(Marker::Braille)
        .x_bounds(RADAR_X)
        .y_bounds(RADAR_Y)
        .paint(move |ctx| {
            // Grid rings at each scale step.
            for step in 1..=5 {
                let r = step as f64 / 5.0;
                for i in 0..5 {
                    let (x1, y1) = axis_direction(i);
                    let (x2, y2) = axis_direction((i + 1) % 5);
                    ctx.draw(&CanvasLine::new(x1 * r, y1 * r, x2 * r, y2 * r, Color::DarkGray));
                }
            }
            for i in 0..5 {
                let (x, y) = axis_direction(i);
                ctx.draw(&CanvasLine::new(0.0, 0.0, x, y, Color::DarkGray));
            }
            ctx.layer();

            for i in 0..5 {
                let (x1, y1) = vertices[i];
                let (x2, y2) = vertices[(i + 1) % 5];
                ctx.draw(&CanvasLine::new(x1, y1, x2, y2, Color::Cyan));
            }

            for (i, (category, score)) in scores.iter().enumerate() {
                let (x, y) = axis_direction(i);
                let label = format!("{} {}", category.label(), format_score(*score));
                let label_width = UnicodeWidthStr::width(label.as_str()) as f64 * units_per_col;

                // Left-hand labels end at their axis, right-hand ones start there.
                let anchor = x * 1.12;
                let start = if x < -0.1 {
                    anchor - label_width
                } else if x.abs() <= 0.1 {
                    anchor - label_width / 2.0
                } else {
                    anchor
                };
                let start = start.clamp(RADAR_X[0], (RADAR_X[1] - label_width).max(RADAR_X[0]));

                ctx.print(
                    start,
                    y * 1.12,
                    Span::styled(label, Style::default().fg(category_color(*category))),
                );
            }
        });

    frame.render_widget(canvas, area);
}

fn render_results(frame: &mut Frame, area: Rect, result: &ResultSet, view: ResultView) {
    let title = match view {
        ResultView::Bars => " RESULTS (v: radar) ",
        ResultView::Radar => " RESULTS (v: bars) ",
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(
            title,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    match view {
        ResultView::Bars => render_result_bars(frame, inner, result),
        ResultView::Radar => render_result_radar(frame, inner, result),
    }
}

// ---------------------------------------------------------------------------
// Legend
// ---------------------------------------------------------------------------

/// Render the key-binding bar at the bottom of the screen, followed by the
/// current notice if any.
fn render_legend(frame: &mut Frame, area: Rect, screen: &Screen) {
    let enabled = Style::default().fg(Color::White);
    let disabled = Style::default().fg(Color::DarkGray);

    let mut spans: Vec<Span<'static>> = vec![
        Span::styled(" 1-5 answer  j/k move  ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            "p prev  ",
            if screen.page_index > 0 { enabled } else { disabled },
        ),
    ];

    if screen.is_last_page {
        let can_submit = screen.store.is_complete() && !screen.submitting;
        spans.push(Span::styled(
            "s submit  ",
            if can_submit {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                disabled
            },
        ));
    } else {
        spans.push(Span::styled(
            "n next  ",
            if screen.can_next { enabled } else { disabled },
        ));
    }
    spans.push(Span::styled("q quit", Style::default().fg(Color::DarkGray)));

    match screen.notice {
        Some(Notice::Info(msg)) => spans.push(Span::styled(
            format!("  {}", msg),
            Style::default().fg(Color::Cyan),
        )),
        Some(Notice::Error(msg)) => spans.push(Span::styled(
            format!("  [!] {}", msg),
            Style::default().fg(Color::Red),
        )),
        None => {}
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

// ---------------------------------------------------------------------------
// Main render entry point
// ---------------------------------------------------------------------------

/// Top-level render function.  Call this from your main loop with a `Screen`
/// borrowed from the app.
pub fn render_ui(frame: &mut Frame, screen: &Screen) {
    let size = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT),   // header
            Constraint::Length(PROGRESS_HEIGHT), // progress
            Constraint::Min(1),                  // questions (+ results)
            Constraint::Length(1),               // legend
        ])
        .split(size);

    render_header(frame, chunks[0], screen.endpoint, screen.submitting);
    render_progress(frame, chunks[1], screen);

    // No result yet: the result panel is not drawn at all.
    match screen.result {
        Some(result) => {
            let body = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
                .split(chunks[2]);
            render_questions(frame, body[0], screen);
            render_results(frame, body[1], result, screen.result_view);
        }
        None => render_questions(frame, chunks[2], screen),
    }

    render_legend(frame, chunks[3], screen);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use ratatui::backend::TestBackend;
    use ratatui::buffer::Buffer;
    use ratatui::Terminal;

    fn catalog() -> Catalog {
        let questions = vec![
            Question {
                id: 1,
                text: "I enjoy talking with people".to_string(),
                category: Category::Extraversion,
                is_reverse: false,
            },
            Question {
                id: 2,
                text: "I handle stress well".to_string(),
                category: Category::Neuroticism,
                is_reverse: true,
            },
            Question {
                id: 3,
                text: "I welcome change".to_string(),
                category: Category::Openness,
                is_reverse: false,
            },
        ];
        Catalog::new(questions).unwrap()
    }

    fn buffer_text(buffer: &Buffer) -> String {
        buffer
            .content
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    fn draw(screen: &Screen, width: u16, height: u16) -> String {
        let backend = TestBackend::new(width, height);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| render_ui(frame, screen)).unwrap();
        buffer_text(terminal.backend().buffer())
    }

    fn screen<'a>(
        catalog: &'a Catalog,
        store: &'a ResponseStore,
        result: Option<&'a ResultSet>,
        view: ResultView,
    ) -> Screen<'a> {
        Screen {
            endpoint: "mock://scoring",
            page: catalog.questions(),
            page_start: 0,
            page_index: 0,
            page_count: 1,
            store,
            cursor: 0,
            can_next: false,
            is_last_page: true,
            submitting: false,
            result,
            result_view: view,
            notice: None,
        }
    }

    #[test]
    fn test_color_from_name() {
        assert_eq!(color_from_name("dim"), Color::DarkGray);
        assert_eq!(color_from_name("magenta"), Color::Magenta);
        assert_eq!(color_from_name("pink"), Color::LightRed);
        assert_eq!(color_from_name("unknown"), Color::Reset);
        for cat in Category::ALL {
            assert_ne!(category_color(cat), Color::Reset);
        }
    }

    #[test]
    fn test_truncate_to_width() {
        assert_eq!(truncate_to_width("short", 10), "short");
        assert_eq!(truncate_to_width("abcdefghij", 5), "abcd…");
        assert_eq!(truncate_to_width("anything", 0), "");
        // Each CJK character is two columns wide.
        let cut = truncate_to_width("心配性である", 7);
        assert_eq!(cut, "心配性…");
        assert!(UnicodeWidthStr::width(cut.as_str()) <= 7);
    }

    #[test]
    fn test_scroll_for_cursor() {
        assert_eq!(scroll_for_cursor(0, 20), 0);
        assert_eq!(scroll_for_cursor(4, 20), 0);
        assert_eq!(scroll_for_cursor(5, 20), 4);
        assert_eq!(scroll_for_cursor(9, 10), 30);
    }

    #[test]
    fn test_scroll_for_cursor_large_page() {
        assert_eq!(scroll_for_cursor(16384, 20), 65520);
        assert_eq!(scroll_for_cursor(16400, 20), u16::MAX);
        assert_eq!(scroll_for_cursor(usize::MAX, 0), u16::MAX);
        assert_eq!(scroll_for_cursor(16000, 20), 63984);
    }

    #[test]
    fn test_question_lines_unanswered() {
        let catalog = catalog();
        let lines = question_lines(
            &catalog.questions()[0],
            1,
            QuestionState::Unanswered,
            true,
            100,
        );
        assert_eq!(lines.len(), QUESTION_BLOCK_HEIGHT as usize);
        let header = line_text(&lines[0]);
        assert!(header.contains("Q1"));
        assert!(header.contains("[Extraversion]"));
        assert!(header.contains("unanswered"));
        assert!(!header.contains("reverse"));
        assert!(line_text(&lines[1]).contains("I enjoy talking with people"));
    }

    #[test]
    fn test_question_lines_answered_highlights_choice() {
        let catalog = catalog();
        let lines = question_lines(
            &catalog.questions()[1],
            2,
            QuestionState::Answered(4),
            false,
            100,
        );
        assert!(line_text(&lines[0]).contains("reverse-scored item"));

        let selected: Vec<&Span> = lines[2]
            .spans
            .iter()
            .filter(|s| s.style.bg == Some(Color::Cyan))
            .collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].content.as_ref(), " 4 Agree ");
        assert!(line_text(&lines[2]).contains("(Somewhat like me)"));
    }

    #[test]
    fn test_render_without_result_has_no_result_panel() {
        let catalog = catalog();
        let store = ResponseStore::new(&catalog);
        let text = draw(&screen(&catalog, &store, None, ResultView::Bars), 120, 30);

        assert!(text.contains("0 / 3 answered"));
        assert!(text.contains("Page 1 / 1"));
        assert!(text.contains("I welcome change"));
        assert!(!text.contains("RESULTS"));
    }

    #[test]
    fn test_render_result_bars_exact_values() {
        let catalog = catalog();
        let store = ResponseStore::new(&catalog);
        let result = ResultSet {
            neuroticism: 3.0,
            extraversion: 4.0,
            conscientiousness: 2.0,
            agreeableness: 1.0,
            openness: 5.0,
        };
        let text = draw(
            &screen(&catalog, &store, Some(&result), ResultView::Bars),
            140,
            30,
        );

        assert!(text.contains("RESULTS"));
        for (category, score) in result.scores() {
            assert!(text.contains(category.label()), "{}", category.label());
            assert!(text.contains(&format!("{} / 5", format_score(score))));
        }
    }

    #[test]
    fn test_render_result_radar() {
        let catalog = catalog();
        let store = ResponseStore::new(&catalog);
        let result = ResultSet {
            neuroticism: 3.0,
            extraversion: 4.0,
            conscientiousness: 2.0,
            agreeableness: 1.0,
            openness: 5.0,
        };
        let text = draw(
            &screen(&catalog, &store, Some(&result), ResultView::Radar),
            160,
            40,
        );
        assert!(text.contains("v: bars"));
        assert!(text.contains("Openness 5.0"));
    }

    #[test]
    fn test_render_notice_and_submitting() {
        let catalog = catalog();
        let store = ResponseStore::new(&catalog);
        let notice = Notice::Error("scoring service returned HTTP 500".to_string());
        let mut s = screen(&catalog, &store, None, ResultView::Bars);
        s.notice = Some(&notice);
        s.submitting = true;

        let text = draw(&s, 140, 30);
        assert!(text.contains("[!] scoring service returned HTTP 500"));
        assert!(text.contains("Scoring..."));
    }

    #[test]
    fn test_result_view_toggle() {
        assert_eq!(ResultView::Bars.toggled(), ResultView::Radar);
        assert_eq!(ResultView::Radar.toggled(), ResultView::Bars);
    }
}
