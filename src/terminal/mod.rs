//! Contains the interactive surface of the tracker. [Terminal] is the contract the tracker loop
//! relies on, [console::ConsoleTerminal] the real implementation on top of crossterm.

pub mod console;
pub mod view;

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::tracker::engine::SessionSnapshot;

/// A single discrete input read from the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    /// 1-based position in the task menu.
    Select(usize),
    TogglePause,
    Quit,
    Invalid(char),
}

impl KeyInput {
    pub fn from_char(key: char) -> Self {
        match key {
            'p' | 'P' => KeyInput::TogglePause,
            'q' | 'Q' => KeyInput::Quit,
            '1'..='9' => KeyInput::Select(key as usize - '0' as usize),
            other => KeyInput::Invalid(other),
        }
    }
}

/// Intended to serve as a contract for anything that can show the tracker and take keys.
#[async_trait]
pub trait Terminal: Send {
    /// Redraws the whole screen.
    async fn render(&mut self, snapshot: &SessionSnapshot) -> Result<()>;

    /// Waits at most `timeout` for a key. Returns `None` if nothing was pressed.
    async fn read_key(&mut self, timeout: Duration) -> Result<Option<KeyInput>>;
}
