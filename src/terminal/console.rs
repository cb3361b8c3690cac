use std::{
    io::{self, Stdout, Write},
    time::Duration,
};

use ansi_term::{Colour, Style};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use crossterm::{
    cursor::MoveTo,
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute, queue,
    style::Print,
    terminal::{
        disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use futures::StreamExt;
use tracing::{debug, trace};

use crate::tracker::engine::SessionSnapshot;

use super::{
    view::{screen_lines, Tone},
    KeyInput, Terminal,
};

/// Terminal implementation on top of crossterm. Raw mode and the alternate screen are held for
/// the lifetime of the value and restored on drop.
pub struct ConsoleTerminal {
    out: Stdout,
    events: EventStream,
}

impl ConsoleTerminal {
    pub fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut out = io::stdout();
        if let Err(e) = execute!(out, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(e.into());
        }
        debug!("Entered raw mode");
        Ok(Self {
            out,
            events: EventStream::new(),
        })
    }
}

impl Drop for ConsoleTerminal {
    fn drop(&mut self) {
        let _ = execute!(self.out, LeaveAlternateScreen);
        let _ = disable_raw_mode();
        debug!("Restored terminal");
    }
}

fn paint(tone: Tone, line: &str) -> String {
    match tone {
        Tone::Plain => line.to_string(),
        Tone::Heading => Style::new().bold().paint(line).to_string(),
        Tone::Alert => Colour::Red.bold().paint(line).to_string(),
        Tone::Active => Colour::Green.paint(line).to_string(),
    }
}

/// Maps terminal events to tracker input. Events that carry no input (resizes, key releases,
/// focus changes) map to `None`.
fn translate(event: Event) -> Option<KeyInput> {
    let Event::Key(KeyEvent {
        code,
        modifiers,
        kind,
        ..
    }) = event
    else {
        return None;
    };
    if kind == KeyEventKind::Release {
        return None;
    }

    match code {
        // Raw mode swallows SIGINT, so Ctrl+C arrives as a key.
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => Some(KeyInput::Quit),
        KeyCode::Char(key) => Some(KeyInput::from_char(key)),
        KeyCode::Enter => Some(KeyInput::Invalid('\n')),
        KeyCode::Tab => Some(KeyInput::Invalid('\t')),
        _ => Some(KeyInput::Invalid(char::REPLACEMENT_CHARACTER)),
    }
}

#[async_trait]
impl Terminal for ConsoleTerminal {
    async fn render(&mut self, snapshot: &SessionSnapshot) -> Result<()> {
        queue!(self.out, MoveTo(0, 0), Clear(ClearType::All))?;
        let lines = screen_lines(snapshot);
        let last = lines.len().saturating_sub(1);
        for (index, (tone, line)) in lines.into_iter().enumerate() {
            queue!(self.out, Print(paint(tone, &line)))?;
            if index != last {
                queue!(self.out, Print("\r\n"))?;
            }
        }
        self.out.flush()?;
        Ok(())
    }

    async fn read_key(&mut self, timeout: Duration) -> Result<Option<KeyInput>> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let event = match tokio::time::timeout_at(deadline, self.events.next()).await {
                Err(_) => return Ok(None),
                Ok(None) => return Err(anyhow!("Terminal input was closed")),
                Ok(Some(event)) => event?,
            };
            trace!("Terminal event {event:?}");
            if let Event::Resize(..) = event {
                return Ok(None);
            }
            if let Some(key) = translate(event) {
                return Ok(Some(key));
            }
        }
    }
}
