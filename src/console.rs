//! Line-oriented terminal I/O used by the session.

use std::io::{self, BufRead, Write};

use zeroize::Zeroizing;

use crate::echo::{EchoGuard, MaskedInput};

/// The session's view of the terminal.
pub trait Console {
    /// Prints `text` without a trailing newline.
    fn prompt(&mut self, text: &str) -> io::Result<()>;

    fn println(&mut self, line: &str) -> io::Result<()>;

    /// Prints a message on the error stream.
    fn eprintln(&mut self, line: &str) -> io::Result<()>;

    /// Reads one echoed line, without its line terminator. `None` at end of
    /// input.
    fn read_line(&mut self) -> io::Result<Option<String>>;

    /// Reads one line with echo suppressed.
    fn read_secret(&mut self) -> io::Result<MaskedInput>;
}

/// Console bound to the process's stdin, stdout and stderr.
#[derive(Default)]
pub struct TerminalConsole;

impl TerminalConsole {
    pub fn new() -> Self {
        Self
    }
}

impl Console for TerminalConsole {
    fn prompt(&mut self, text: &str) -> io::Result<()> {
        let mut stdout = io::stdout();
        stdout.write_all(text.as_bytes())?;
        stdout.flush()
    }

    fn println(&mut self, line: &str) -> io::Result<()> {
        writeln!(io::stdout(), "{}", line)
    }

    fn eprintln(&mut self, line: &str) -> io::Result<()> {
        writeln!(io::stderr(), "{}", line)
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        read_line_from(&mut io::stdin().lock())
    }

    fn read_secret(&mut self) -> io::Result<MaskedInput> {
        let guard = EchoGuard::suppress();
        if guard.is_active() {
            return crate::echo::read_masked_line(&mut io::stdin().lock());
        }
        drop(guard);

        #[cfg(not(unix))]
        {
            use std::io::IsTerminal;
            if io::stdin().is_terminal() {
                return rpassword::read_password()
                    .map(|secret| MaskedInput::Line(Zeroizing::new(secret)));
            }
        }

        Ok(match read_line_from(&mut io::stdin().lock())? {
            Some(line) => MaskedInput::Line(Zeroizing::new(line)),
            None => MaskedInput::Eof,
        })
    }
}

/// Reads a line and strips the trailing `\n` or `\r\n`.
pub fn read_line_from<R: BufRead>(input: &mut R) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    Ok(Some(line))
}
