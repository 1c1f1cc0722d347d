use std::collections::VecDeque;
use std::io::{stdin, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal,
};

/// Keyboard access for the virtual machine.
///
/// The memory-mapped status register polls [`Console::key_ready`] once per
/// read and must never be stalled by it; the GETC and IN traps block on
/// [`Console::read_key`] instead.
pub trait Console {
    /// Non-blocking check for a waiting keypress.
    fn key_ready(&mut self) -> bool;

    /// Next keypress as a byte. Blocks until one arrives.
    fn read_key(&mut self) -> u8;
}

/// Console driver for the process's real stdin.
///
/// Interactive terminals are read through crossterm events (the terminal is
/// expected to be in raw mode, see [`RawModeGuard`]). Piped input is drained
/// into a queue instead, and EOF reads as NUL.
pub struct TermConsole {
    interactive: bool,
    pending: VecDeque<u8>,
    stdin_drained: bool,
}

impl TermConsole {
    pub fn new(interactive: bool) -> Self {
        TermConsole {
            interactive,
            pending: VecDeque::new(),
            stdin_drained: false,
        }
    }

    /// Consume queued terminal events without waiting.
    fn poll_events(&mut self) {
        while event::poll(Duration::ZERO).expect("failed to poll terminal") {
            let event = event::read().expect("failed to read terminal event");
            if let Some(byte) = key_byte(event) {
                self.pending.push_back(byte);
            }
        }
    }

    fn drain_stdin(&mut self) {
        if self.stdin_drained {
            return;
        }
        self.stdin_drained = true;
        let mut bytes = Vec::new();
        let _ = stdin().read_to_end(&mut bytes);
        self.pending.extend(bytes);
    }
}

impl Console for TermConsole {
    fn key_ready(&mut self) -> bool {
        if self.pending.is_empty() {
            if self.interactive {
                self.poll_events();
            } else {
                self.drain_stdin();
            }
        }
        !self.pending.is_empty()
    }

    fn read_key(&mut self) -> u8 {
        loop {
            if let Some(byte) = self.pending.pop_front() {
                return byte;
            }
            if self.interactive {
                let event = event::read().expect("failed to read terminal event");
                if let Some(byte) = key_byte(event) {
                    return byte;
                }
            } else {
                self.drain_stdin();
                if self.pending.is_empty() {
                    // EOF
                    return 0;
                }
            }
        }
    }
}

/// The byte a terminal event delivers to the simulated keyboard, if any.
///
/// `Ctrl+C` raises the cancellation flag rather than exiting here; the
/// execution loop observes the flag at the next instruction boundary.
fn key_byte(event: Event) -> Option<u8> {
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
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
            cancel();
            Some(0x03)
        }
        KeyCode::Char(ch)
            if ch.is_ascii() && !modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            Some(ch as u8)
        }
        KeyCode::Enter => Some(b'\n'),
        KeyCode::Backspace => Some(0x08),
        KeyCode::Tab => Some(b'\t'),
        _ => None,
    }
}

static CANCELLED: AtomicBool = AtomicBool::new(false);

/// Ask the execution loop to stop at the next instruction boundary.
pub fn cancel() {
    CANCELLED.store(true, Ordering::Relaxed);
}

/// Whether cancellation has been requested.
pub fn cancelled() -> bool {
    CANCELLED.load(Ordering::Relaxed)
}

/// Holds the terminal in raw mode, restoring the previous mode exactly once
/// on drop. Dropping happens on every exit path, including unwinding.
pub struct RawModeGuard {
    active: bool,
}

impl RawModeGuard {
    /// Raw mode is only entered for interactive runs; piped input needs no
    /// terminal state at all.
    pub fn acquire(interactive: bool) -> Self {
        if interactive {
            enable_raw_mode();
        }
        RawModeGuard {
            active: interactive,
        }
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if self.active {
            disable_raw_mode();
        }
    }
}

/// Must only be called if terminal is NOT in raw mode.
fn enable_raw_mode() {
    debug_assert!(
        !terminal::is_raw_mode_enabled().is_ok_and(|is| is),
        "terminal should not be in raw mode to enable raw mode",
    );
    terminal::enable_raw_mode().expect("failed to enable raw terminal");
}

/// Must only be called if terminal is in raw mode.
fn disable_raw_mode() {
    debug_assert!(
        terminal::is_raw_mode_enabled().is_ok_and(|is| is),
        "terminal should already be in raw mode to disable raw mode",
    );
    terminal::disable_raw_mode().expect("failed to disable raw terminal");
}
