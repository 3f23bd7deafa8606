//! Console task: polls the UART and feeds the shell one byte at a time.

use embedded_hal::delay::DelayNs;
use log::error;

use crate::app::ports::ConsolePort;
use crate::config::ConsoleConfig;
use crate::shell::{CommandSet, Shell};

/// What one poll of the console did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    /// Nothing pending; slept for the idle interval.
    Idle,
    /// A byte was handed to the shell.
    Byte(u8),
    /// The read failed; nothing reached the shell.
    ReadError,
}

pub struct CliTask<C, S, D> {
    console: C,
    shell: Shell<S>,
    delay: D,
    config: ConsoleConfig,
}

impl<C, S, D> CliTask<C, S, D>
where
    C: ConsolePort,
    S: CommandSet,
    D: DelayNs,
{
    pub fn new(console: C, commands: S, delay: D, config: ConsoleConfig) -> Self {
        Self {
            console,
            shell: Shell::new(commands),
            delay,
            config,
        }
    }

    pub fn shell(&self) -> &Shell<S> {
        &self.shell
    }

    /// Print the banner prompt.
    pub fn boot(&mut self) {
        self.shell.boot(&mut self.console);
    }

    pub fn poll_once(&mut self) -> Poll {
        if self.console.readable() == 0 {
            self.delay.delay_ms(self.config.idle_poll_ms);
            return Poll::Idle;
        }

        // A byte is pending, so the read should not have to wait.
        match self.console.read_byte(self.config.read_timeout_ms) {
            Ok(byte) => {
                self.shell.receive_char(byte, &mut self.console);
                Poll::Byte(byte)
            }
            Err(e) => {
                error!("Unexpected UART read error: {}", e);
                Poll::ReadError
            }
        }
    }

    pub fn run(mut self) -> ! {
        self.boot();
        loop {
            self.poll_once();
        }
    }
}
