//! Minimal line-editing shell for the serial console.
//!
//! Bytes arrive one at a time from the CLI task. Printable bytes are echoed
//! and buffered; CR or LF ends the line, which is split on whitespace and
//! dispatched by name to a [`CommandSet`].
//!
//! ```text
//!  UART byte ──▶ receive_char ──▶ [line buffer] ──EOL──▶ CommandSet::execute
//!                    │                                        │
//!                    └──── echo / prompt ◀──── output ◀───────┘
//! ```

use core::fmt;
use core::fmt::Write as _;

use log::debug;

use crate::app::ports::ConsolePort;
use crate::error::CommandError;

pub const PROMPT: &str = "mflt> ";

/// Receive buffer size. Holds a `wifi_save` line carrying three values of
/// `WIFI_CONFIG_MAX_SIZE` bytes each.
pub const RX_BUFFER_SIZE: usize = 256;

/// Maximum number of whitespace-separated tokens per line.
pub const MAX_ARGS: usize = 16;

const BACKSPACE: u8 = 0x08;
const DELETE: u8 = 0x7F;

/// One entry of the command table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub help: &'static str,
}

/// A table of commands the shell can dispatch to.
pub trait CommandSet {
    fn commands(&self) -> &'static [CommandSpec];

    /// Run `name` with `args` (the tokens after the name).
    ///
    /// Only called for names listed in [`commands`](Self::commands).
    fn execute(
        &mut self,
        name: &str,
        args: &[&str],
        out: &mut dyn fmt::Write,
    ) -> Result<(), CommandError>;
}

/// `fmt::Write` over a console, expanding `\n` to `\r\n` for terminals.
pub struct ConsoleWriter<'a, C: ConsolePort + ?Sized>(pub &'a mut C);

impl<C: ConsolePort + ?Sized> fmt::Write for ConsoleWriter<'_, C> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let mut lines = s.split('\n');
        if let Some(first) = lines.next() {
            self.0.write_bytes(first.as_bytes());
        }
        for line in lines {
            self.0.write_bytes(b"\r\n");
            self.0.write_bytes(line.as_bytes());
        }
        Ok(())
    }
}

pub struct Shell<S> {
    commands: S,
    buf: heapless::Vec<u8, RX_BUFFER_SIZE>,
    prev_was_cr: bool,
    /// Rest of the current line is dropped after an overflow.
    discarding: bool,
}

impl<S: CommandSet> Shell<S> {
    pub fn new(commands: S) -> Self {
        Self {
            commands,
            buf: heapless::Vec::new(),
            prev_was_cr: false,
            discarding: false,
        }
    }

    pub fn commands(&self) -> &S {
        &self.commands
    }

    /// Print the first prompt.
    pub fn boot<C: ConsolePort + ?Sized>(&mut self, out: &mut C) {
        self.reset();
        out.write_bytes(b"\r\n");
        out.write_bytes(PROMPT.as_bytes());
    }

    /// Feed one received byte.
    pub fn receive_char<C: ConsolePort + ?Sized>(&mut self, c: u8, out: &mut C) {
        let after_cr = core::mem::replace(&mut self.prev_was_cr, c == b'\r');
        match c {
            b'\n' if after_cr => {}
            b'\r' | b'\n' => {
                out.write_bytes(b"\r\n");
                if !self.discarding {
                    self.process_line(out);
                }
                self.reset();
                out.write_bytes(PROMPT.as_bytes());
            }
            BACKSPACE | DELETE => {
                if !self.discarding && self.buf.pop().is_some() {
                    out.write_bytes(b"\x08 \x08");
                }
            }
            0x20..=0x7E => {
                if self.discarding {
                    return;
                }
                if self.buf.push(c).is_err() {
                    self.discarding = true;
                    self.buf.clear();
                    out.write_bytes(b"\r\nERROR: command too long, line discarded");
                    return;
                }
                out.write_bytes(&[c]);
            }
            _ => {}
        }
    }

    fn reset(&mut self) {
        self.buf.clear();
        self.discarding = false;
    }

    fn process_line<C: ConsolePort + ?Sized>(&mut self, out: &mut C) {
        // Only printable ASCII is ever buffered.
        let Ok(line) = core::str::from_utf8(&self.buf) else {
            return;
        };

        let mut argv: heapless::Vec<&str, MAX_ARGS> = heapless::Vec::new();
        for token in line.split_ascii_whitespace() {
            if argv.push(token).is_err() {
                out.write_bytes(b"ERROR: too many arguments\r\n");
                return;
            }
        }
        let Some((&name, args)) = argv.split_first() else {
            return;
        };

        let mut w = ConsoleWriter(out);
        if name == "help" {
            let _ = self.print_help(&mut w);
            return;
        }
        if !self.commands.commands().iter().any(|cmd| cmd.name == name) {
            let _ = write!(
                w,
                "Unknown command: {}\nType 'help' to list all commands\n",
                name
            );
            return;
        }

        debug!("shell: running '{}' with {} args", name, args.len());
        if let Err(e) = self.commands.execute(name, args, &mut w) {
            let _ = writeln!(w, "ERROR: {}", e);
        }
    }

    fn print_help(&self, w: &mut dyn fmt::Write) -> fmt::Result {
        for cmd in self.commands.commands() {
            writeln!(w, "{}: {}", cmd.name, cmd.help)?;
        }
        writeln!(w, "help: Lists all commands")
    }
}
