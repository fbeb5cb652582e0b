//! Timed single-choice question prompt on crossterm.
//!
//! Unlike an inquire `Select`, the prompt polls the keyboard with a short timeout
//! and re-checks the session between polls, so it returns as soon as time runs
//! out and leaves no reader blocked on stdin.

use crossterm::cursor::{Hide, MoveToColumn, MoveUp, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::queue;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType, disable_raw_mode, enable_raw_mode};
use std::io::{self, Write, stdout};
use std::time::Duration;

/// Upper bound on how long a finished session can go unnoticed by the prompt.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickOutcome {
    Picked(usize),
    /// The session stopped accepting answers while the prompt was open.
    Cancelled,
    /// Esc or Ctrl-C.
    Aborted,
}

/// Keyboard input with a timeout.
pub trait KeySource {
    fn next_key(&mut self, timeout: Duration) -> io::Result<Option<KeyEvent>>;
}

/// Reads key presses from the terminal.
pub struct TerminalKeys;

impl KeySource for TerminalKeys {
    fn next_key(&mut self, timeout: Duration) -> io::Result<Option<KeyEvent>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => Ok(Some(key)),
            _ => Ok(None),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Action {
    Idle,
    Moved,
    Pick(usize),
    Abort,
}

/// Cursor over the options.
struct Picker {
    cursor: usize,
    len: usize,
}

impl Picker {
    fn new(len: usize) -> Self {
        Self { cursor: 0, len }
    }

    fn handle(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::Abort,
            KeyCode::Esc => Action::Abort,
            KeyCode::Enter => Action::Pick(self.cursor),
            KeyCode::Up | KeyCode::Char('k') if self.cursor > 0 => {
                self.cursor -= 1;
                Action::Moved
            }
            KeyCode::Down | KeyCode::Char('j') if self.cursor + 1 < self.len => {
                self.cursor += 1;
                Action::Moved
            }
            KeyCode::Char(c) => match c.to_digit(10) {
                Some(d) if d >= 1 && (d as usize) <= self.len => Action::Pick(d as usize - 1),
                _ => Action::Idle,
            },
            _ => Action::Idle,
        }
    }
}

/// Erase the `drawn` lines above the cursor.
fn erase<W: Write>(out: &mut W, drawn: u16) -> io::Result<()> {
    if drawn > 0 {
        queue!(out, MoveUp(drawn))?;
    }
    queue!(out, MoveToColumn(0), Clear(ClearType::FromCursorDown))
}

fn draw<W: Write>(
    out: &mut W,
    drawn: u16,
    title: &str,
    options: &[String],
    cursor: usize,
    secs_left: u64,
) -> io::Result<u16> {
    erase(out, drawn)?;
    queue!(
        out,
        SetForegroundColor(Color::Green),
        Print("? "),
        ResetColor,
        Print(title),
        Print("\r\n")
    )?;
    for (i, option) in options.iter().enumerate() {
        if i == cursor {
            queue!(
                out,
                SetForegroundColor(Color::Green),
                Print(format!("> {}. {}", i + 1, option)),
                ResetColor,
                Print("\r\n")
            )?;
        } else {
            queue!(out, Print(format!("  {}. {}\r\n", i + 1, option)))?;
        }
    }
    queue!(
        out,
        Print(format!(
            "[{}s left] arrows/j/k + enter, or 1-{}\r\n",
            secs_left,
            options.len()
        ))
    )?;
    out.flush()?;
    Ok(options.len() as u16 + 2)
}

/// Run the prompt until an option is picked, the user aborts, or `status`
/// reports the question is no longer open. `status` returns the seconds left
/// while answering is still possible.
pub fn pick<K, W, S>(
    keys: &mut K,
    out: &mut W,
    title: &str,
    options: &[String],
    status: S,
) -> io::Result<PickOutcome>
where
    K: KeySource,
    W: Write,
    S: Fn() -> Option<u64>,
{
    let mut picker = Picker::new(options.len());
    let mut drawn = 0u16;
    let mut shown: Option<(usize, u64)> = None;

    loop {
        let Some(secs) = status() else {
            erase(out, drawn)?;
            out.flush()?;
            return Ok(PickOutcome::Cancelled);
        };
        if shown != Some((picker.cursor, secs)) {
            drawn = draw(out, drawn, title, options, picker.cursor, secs)?;
            shown = Some((picker.cursor, secs));
        }

        let Some(key) = keys.next_key(POLL_INTERVAL)? else {
            continue;
        };
        match picker.handle(key) {
            Action::Idle | Action::Moved => {}
            Action::Pick(index) => {
                erase(out, drawn)?;
                queue!(out, Print(format!("? {} > {}\r\n", title, options[index])))?;
                out.flush()?;
                return Ok(PickOutcome::Picked(index));
            }
            Action::Abort => {
                erase(out, drawn)?;
                out.flush()?;
                return Ok(PickOutcome::Aborted);
            }
        }
    }
}

/// Restores cooked mode and the cursor however the prompt exits.
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        enable_raw_mode()?;
        let _ = queue!(stdout(), Hide);
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let mut out = stdout();
        let _ = queue!(out, Show);
        let _ = out.flush();
        let _ = disable_raw_mode();
    }
}

/// Blocking. Run on the blocking pool.
pub fn ask<S>(title: &str, options: &[String], status: S) -> io::Result<PickOutcome>
where
    S: Fn() -> Option<u64>,
{
    let _raw = RawModeGuard::enable()?;
    pick(&mut TerminalKeys, &mut stdout(), title, options, status)
}
