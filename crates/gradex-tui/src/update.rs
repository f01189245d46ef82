//! TUI reducer (update function).
//!
//! All state mutations happen here. The runtime calls `update(state, event)`
//! and executes the returned effects.
//!
//! This is the single source of truth for how events modify state.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use gradex_core::job::{AskRejected, QuestionRef, fold};

use crate::effects::UiEffect;
use crate::events::{StreamItem, UiEvent};
use crate::state::{AppState, Focus, FollowUpPane, StreamStatus};

/// The main reducer function.
///
/// Takes the current state and an event, mutates state, and returns effects
/// for the runtime to execute.
pub fn update(state: &mut AppState, event: UiEvent) -> Vec<UiEffect> {
    match event {
        UiEvent::Tick => {
            // Advance spinner animation
            state.spinner_frame = state.spinner_frame.wrapping_add(1);
            vec![]
        }
        UiEvent::Frame { .. } => vec![],
        UiEvent::Terminal(term_event) => handle_terminal_event(state, term_event),
        UiEvent::Stream(item) => {
            handle_stream_item(state, item);
            vec![]
        }
        UiEvent::FollowUpResult { request, outcome } => {
            // Results for a closed pane fail the guard and are dropped.
            if state.requests.finish_if_active(request)
                && let Some(pane) = state.followup.as_mut()
            {
                pane.session.resolve(outcome);
            }
            vec![]
        }
    }
}

fn handle_stream_item(state: &mut AppState, item: StreamItem) {
    match item {
        StreamItem::Event(received) => fold(&mut state.job, &received),
        StreamItem::ConnectionLost { message } => {
            state.stream = StreamStatus::Lost { message };
        }
        StreamItem::Ended => {
            // A close before job_done means the job may still be running;
            // we just can't see it anymore.
            state.stream = if state.job.done || state.job.fatal_error.is_some() {
                StreamStatus::Ended
            } else {
                StreamStatus::Lost {
                    message: "stream closed before the job finished".to_string(),
                }
            };
        }
    }
}

fn handle_terminal_event(state: &mut AppState, event: Event) -> Vec<UiEffect> {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => handle_key(state, key),
        _ => vec![],
    }
}

fn handle_key(state: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    // Ctrl+C quits from anywhere, including the chat pane.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return vec![UiEffect::Quit];
    }
    if state.followup.is_some() {
        handle_chat_key(state, key)
    } else {
        handle_browse_key(state, key)
    }
}

/// Keys while no follow-up pane is open.
fn handle_browse_key(state: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => vec![UiEffect::Quit],
        KeyCode::Up | KeyCode::Char('k') => {
            move_selection(state, -1);
            vec![]
        }
        KeyCode::Down | KeyCode::Char('j') => {
            move_selection(state, 1);
            vec![]
        }
        KeyCode::Tab => {
            state.selection.focus = match state.selection.focus {
                Focus::Students => Focus::Questions,
                Focus::Questions => Focus::Students,
            };
            vec![]
        }
        KeyCode::Enter => {
            if let Some(context) = selected_question(state) {
                state.followup = Some(FollowUpPane::open(context));
            }
            vec![]
        }
        _ => vec![],
    }
}

/// Keys while the follow-up pane is open. Printable keys go to the input
/// buffer, so quit is reachable only via Esc (close first) or Ctrl+C.
fn handle_chat_key(state: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    match key.code {
        KeyCode::Esc => {
            // Dropping the pane discards the conversation; cancelling the
            // request guard discards any answer still in flight.
            state.followup = None;
            state.requests.cancel();
            vec![]
        }
        KeyCode::Enter => submit_follow_up(state),
        KeyCode::Backspace => {
            if let Some(pane) = state.followup.as_mut() {
                pane.input.pop();
            }
            vec![]
        }
        KeyCode::Char(c) => {
            if let Some(pane) = state.followup.as_mut() {
                pane.input.push(c);
            }
            vec![]
        }
        _ => vec![],
    }
}

fn submit_follow_up(state: &mut AppState) -> Vec<UiEffect> {
    let Some(pane) = state.followup.as_mut() else {
        return vec![];
    };
    let query = pane.input.clone();
    match pane.session.begin(&query) {
        Ok(trimmed) => {
            // Input clears on accept, while the outcome is still unknown.
            pane.input.clear();
            let request = state.requests.begin();
            vec![UiEffect::AskFollowUp {
                request,
                context: pane.session.context.clone(),
                query: trimmed,
            }]
        }
        Err(AskRejected::Empty | AskRejected::Busy) => vec![],
    }
}

/// The `(job, student, question)` under the cursor, if it exists.
///
/// Returns `None` once the job has failed; the error screen has no
/// selectable questions.
fn selected_question(state: &AppState) -> Option<QuestionRef> {
    if state.job.fatal_error.is_some() {
        return None;
    }
    let student = state.job.results.get(state.selection.student_idx)?;
    let result = student.entries.get(state.selection.question_idx)?;
    Some(QuestionRef {
        job_id: state.job_id.clone(),
        student_id: student.student_id.clone(),
        question_id: result.question_id.clone(),
    })
}

fn move_selection(state: &mut AppState, delta: isize) {
    let selection = &mut state.selection;
    match selection.focus {
        Focus::Students => {
            let count = state.job.results.len();
            selection.student_idx = step(selection.student_idx, delta, count);
            // A different student means a different question list.
            selection.question_idx = 0;
        }
        Focus::Questions => {
            let count = state
                .job
                .results
                .get(selection.student_idx)
                .map_or(0, |s| s.entries.len());
            selection.question_idx = step(selection.question_idx, delta, count);
        }
    }
}

fn step(idx: usize, delta: isize, count: usize) -> usize {
    if count == 0 {
        return 0;
    }
    if delta < 0 {
        idx.saturating_sub(delta.unsigned_abs())
    } else {
        (idx + delta.unsigned_abs()).min(count - 1)
    }
}
