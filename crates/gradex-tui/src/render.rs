//! Pure view/render functions for the TUI.
//!
//! Functions here take `&AppState` by immutable reference, draw to a
//! ratatui Frame, and never mutate state or return effects.

use gradex_core::job::{ChatRole, JobView, StudentView, is_pass_leaning, project};
use gradex_types::{GradedResult, StudentSummary};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::state::{AppState, Focus, FollowUpPane, StreamStatus};

/// Spinner frames for the header animation.
const SPINNER_FRAMES: &[&str] = &["◐", "◓", "◑", "◒"];

/// Width of the per-student progress bar in cells.
const GAUGE_WIDTH: usize = 10;

/// Height of the bordered header pane.
const HEADER_HEIGHT: u16 = 3;

/// Height of the follow-up input line (with borders).
const INPUT_HEIGHT: u16 = 3;

/// Renders the entire view to the frame.
pub fn render(app: &AppState, frame: &mut Frame) {
    let area = frame.area();
    match project(&app.job) {
        JobView::Failed { message } => render_failed(app, message, frame, area),
        JobView::Active { students, done, .. } => {
            render_active(app, &students, done, frame, area);
        }
    }
}

/// Error screen: header plus the fatal message, nothing else.
fn render_failed(app: &AppState, message: &str, frame: &mut Frame, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(HEADER_HEIGHT), Constraint::Min(0)])
        .split(area);
    let status = Span::styled("failed", Style::new().fg(Color::Red));
    render_header(app, status, frame, chunks[0]);

    let body = Paragraph::new(message.to_string())
        .style(Style::new().fg(Color::Red))
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("Job failed"));
    frame.render_widget(body, chunks[1]);
}

fn render_active(
    app: &AppState,
    students: &[StudentView<'_>],
    done: bool,
    frame: &mut Frame,
    area: Rect,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(HEADER_HEIGHT), Constraint::Min(0)])
        .split(area);
    render_header(app, status_span(app, done), frame, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(32), Constraint::Percentage(68)])
        .split(chunks[1]);
    render_students(app, students, frame, body[0]);

    let student = students.get(app.selection.student_idx);
    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(body[1]);
    render_questions(app, student, frame, right[0]);

    if let Some(pane) = &app.followup {
        render_follow_up(app, pane, frame, right[1]);
    } else {
        render_inspect(app, student, frame, right[1]);
    }
}

fn render_header(app: &AppState, status: Span<'_>, frame: &mut Frame, area: Rect) {
    let mut spans = vec![
        Span::styled(
            format!("job {}", app.job_id),
            Style::new().add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        status,
    ];
    if app.job.total_questions > 0 {
        spans.push(Span::styled(
            format!("  {} questions", app.job.total_questions),
            Style::new().fg(Color::DarkGray),
        ));
    }
    let header = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title("gradex watch"));
    frame.render_widget(header, area);
}

fn status_span(app: &AppState, done: bool) -> Span<'static> {
    match &app.stream {
        StreamStatus::Lost { message } => Span::styled(
            format!("connection lost: {message}"),
            Style::new().fg(Color::Yellow),
        ),
        StreamStatus::Live | StreamStatus::Ended if done => {
            Span::styled("done", Style::new().fg(Color::Green))
        }
        StreamStatus::Ended => Span::styled("stream ended", Style::new().fg(Color::Yellow)),
        StreamStatus::Live => {
            let label = if app.job.results.is_empty() {
                "waiting for results"
            } else {
                "in progress"
            };
            Span::styled(
                format!("{} {label}", spinner(app)),
                Style::new().fg(Color::Cyan),
            )
        }
    }
}

fn spinner(app: &AppState) -> &'static str {
    SPINNER_FRAMES[app.spinner_frame % SPINNER_FRAMES.len()]
}

fn render_students(app: &AppState, students: &[StudentView<'_>], frame: &mut Frame, area: Rect) {
    let focused = app.selection.focus == Focus::Students && app.followup.is_none();
    let block = pane_block("Students".to_string(), focused);
    if students.is_empty() {
        frame.render_widget(Paragraph::new("No students yet.").block(block), area);
        return;
    }

    let height = area.height.saturating_sub(2) as usize;
    let width = area.width.saturating_sub(2) as usize;
    let offset = scroll_offset(app.selection.student_idx, height);
    let lines: Vec<Line<'_>> = students
        .iter()
        .enumerate()
        .skip(offset)
        .take(height)
        .map(|(idx, student)| student_line(app, idx, student, width))
        .collect();
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn student_line(
    app: &AppState,
    idx: usize,
    student: &StudentView<'_>,
    width: usize,
) -> Line<'static> {
    let selected = idx == app.selection.student_idx;
    let marker = if selected { "> " } else { "  " };
    let done_mark = if student.progress.is_done { " ✓" } else { "" };
    let total = if app.job.total_questions > 0 {
        app.job.total_questions.to_string()
    } else {
        "?".to_string()
    };
    let name_width = width.saturating_sub(GAUGE_WIDTH + 12).max(4);
    let text = format!(
        "{marker}{:<name_width$} {} {}/{}{done_mark}",
        truncate_with_ellipsis(student.student_id, name_width),
        progress_bar(student.progress.percent, GAUGE_WIDTH),
        student.progress.processed_count,
        total,
    );
    let mut style = Style::new();
    if selected {
        style = style.add_modifier(Modifier::BOLD);
    }
    if student.progress.is_done {
        style = style.fg(Color::Green);
    }
    Line::from(Span::styled(text, style))
}

fn render_questions(
    app: &AppState,
    student: Option<&StudentView<'_>>,
    frame: &mut Frame,
    area: Rect,
) {
    let focused = app.selection.focus == Focus::Questions && app.followup.is_none();
    let title = match student {
        Some(s) => format!("Questions  {}", s.student_id),
        None => "Questions".to_string(),
    };
    let block = pane_block(title, focused);
    let Some(student) = student else {
        frame.render_widget(Paragraph::new("No results yet.").block(block), area);
        return;
    };

    let height = area.height.saturating_sub(2) as usize;
    let width = area.width.saturating_sub(2) as usize;
    let offset = scroll_offset(app.selection.question_idx, height);
    let lines: Vec<Line<'_>> = student
        .results
        .iter()
        .enumerate()
        .skip(offset)
        .take(height)
        .map(|(idx, result)| question_line(app, idx, result, width))
        .collect();
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn question_line(
    app: &AppState,
    idx: usize,
    result: &GradedResult,
    width: usize,
) -> Line<'static> {
    let selected = idx == app.selection.question_idx;
    let marker = if selected { "> " } else { "  " };
    let id_width = width.saturating_sub(16).max(4);
    let mut style = score_style(result);
    if selected {
        style = style.add_modifier(Modifier::BOLD);
    }
    let verdict = if result.verifier_status.valid {
        Span::styled(" ✓", Style::new().fg(Color::Green))
    } else {
        Span::styled(" ✗", Style::new().fg(Color::Yellow))
    };
    Line::from(vec![
        Span::raw(marker.to_string()),
        Span::styled(
            format!(
                "{:<id_width$} {:>7}",
                truncate_with_ellipsis(&result.question_id, id_width),
                format!("{}/{}", result.score, result.max_score),
            ),
            style,
        ),
        verdict,
    ])
}

/// Color for a score: leaning pass or leaning fail. A tie is a fail color.
fn score_style(result: &GradedResult) -> Style {
    if is_pass_leaning(result) {
        Style::new().fg(Color::Green)
    } else {
        Style::new().fg(Color::Red)
    }
}

/// Detail plus summary for the selected student, stacked.
fn render_inspect(
    app: &AppState,
    student: Option<&StudentView<'_>>,
    frame: &mut Frame,
    area: Rect,
) {
    let Some(student) = student else {
        let block = Block::default().borders(Borders::ALL).title("Detail");
        frame.render_widget(Paragraph::new("No results yet.").block(block), area);
        return;
    };
    let selected = student.results.get(app.selection.question_idx);
    if let Some(summary) = student.summary {
        let halves = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(area);
        render_detail(selected, frame, halves[0]);
        render_summary(summary, frame, halves[1]);
    } else {
        render_detail(selected, frame, area);
    }
}

fn render_detail(result: Option<&GradedResult>, frame: &mut Frame, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Detail");
    let Some(result) = result else {
        frame.render_widget(Paragraph::new("No question selected.").block(block), area);
        return;
    };

    let dim = Style::new().fg(Color::DarkGray);
    let mut lines = vec![
        Line::from(vec![
            Span::styled("Score     ", dim),
            Span::styled(
                format!("{}/{}", result.score, result.max_score),
                score_style(result),
            ),
        ]),
        Line::from(vec![
            Span::styled("Expected  ", dim),
            Span::raw(result.expected_answer.clone()),
        ]),
        Line::from(vec![
            Span::styled("Answered  ", dim),
            Span::raw(result.student_answer_text.clone()),
        ]),
        Line::raw(""),
        Line::from(Span::styled("Justification", dim)),
        Line::raw(result.justification.clone()),
    ];
    if let Some(feedback) = &result.friendly_feedback {
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled("Feedback", dim)));
        lines.push(Line::raw(feedback.clone()));
    }
    if !result.verifier_status.valid {
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            "Verifier flagged this result",
            Style::new().fg(Color::Yellow),
        )));
        for issue in &result.verifier_status.issues {
            lines.push(Line::raw(format!("  - {issue}")));
        }
    }
    let body = Paragraph::new(lines).wrap(Wrap { trim: false }).block(block);
    frame.render_widget(body, area);
}

fn render_summary(summary: &StudentSummary, frame: &mut Frame, area: Rect) {
    let title = format!(
        "Summary  {}/{}",
        summary.total_score, summary.total_max_score
    );
    // Plain text: newlines break lines, nothing else is interpreted.
    let body = Paragraph::new(Text::raw(summary.summary_report.as_str()))
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(body, area);
}

fn render_follow_up(app: &AppState, pane: &FollowUpPane, frame: &mut Frame, area: Rect) {
    let context = &pane.session.context;
    let title = format!("Follow-up  {} {}", context.student_id, context.question_id);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(INPUT_HEIGHT)])
        .split(area);

    let mut lines: Vec<Line<'_>> = Vec::new();
    for entry in &pane.session.history {
        let (prefix, style) = match entry.role {
            ChatRole::User => ("you     ", Style::new().fg(Color::Cyan)),
            ChatRole::Assistant => ("gradex  ", Style::new().fg(Color::Green)),
        };
        for (i, part) in entry.content.split('\n').enumerate() {
            if i == 0 {
                lines.push(Line::from(vec![
                    Span::styled(prefix, style),
                    Span::raw(part.to_string()),
                ]));
            } else {
                lines.push(Line::raw(format!("        {part}")));
            }
        }
    }
    if pane.session.pending {
        lines.push(Line::from(Span::styled(
            format!("{} thinking", spinner(app)),
            Style::new().fg(Color::DarkGray),
        )));
    }

    // Keep the tail of the conversation visible.
    let height = chunks[0].height.saturating_sub(2) as usize;
    let skip = lines.len().saturating_sub(height);
    let history = Paragraph::new(lines.split_off(skip))
        .block(pane_block(title, true));
    frame.render_widget(history, chunks[0]);

    let input = Paragraph::new(format!("> {}▌", pane.input))
        .block(Block::default().borders(Borders::ALL).title("Ask (Esc closes)"));
    frame.render_widget(input, chunks[1]);
}

fn pane_block(title: String, focused: bool) -> Block<'static> {
    let mut block = Block::default().borders(Borders::ALL).title(title);
    if focused {
        block = block.border_style(Style::new().fg(Color::Cyan));
    }
    block
}

/// First visible row index so the selected row stays on screen.
fn scroll_offset(selected: usize, height: usize) -> usize {
    if height == 0 {
        0
    } else {
        selected.saturating_sub(height - 1)
    }
}

/// Renders a fixed-width unicode bar, e.g. `███░░░░░░░`.
fn progress_bar(percent: f64, width: usize) -> String {
    let filled = (((percent / 100.0) * width as f64).round() as usize).min(width);
    let mut bar = String::with_capacity(width * 3);
    for i in 0..width {
        bar.push(if i < filled { '█' } else { '░' });
    }
    bar
}

/// Truncates a string with ellipsis if it exceeds `max_width` (unicode-aware).
fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    if max_width <= 1 {
        return "…".to_string();
    }
    let mut truncated = String::new();
    for ch in text.chars() {
        let next_width = truncated.width() + ch.width().unwrap_or(0);
        if next_width + 1 > max_width {
            break;
        }
        truncated.push(ch);
    }
    truncated.push('…');
    truncated
}
