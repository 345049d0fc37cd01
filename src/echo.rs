//! Terminal echo control for secret entry.
//!
//! [`EchoGuard`] switches the terminal on standard input into a no-echo,
//! non-canonical mode with signal keys disabled, and restores the exact
//! previous attributes when dropped. Because Ctrl-C arrives as a plain byte
//! while the guard is held, [`read_masked_line`] can turn it into an error
//! that unwinds through the guard instead of killing the process with echo
//! still off.

use std::io::{self, Read};

use zeroize::Zeroizing;

const CTRL_C: u8 = 0x03;
const CTRL_D: u8 = 0x04;
const BACKSPACE: u8 = 0x08;
const CTRL_U: u8 = 0x15;
const DELETE: u8 = 0x7f;

/// Outcome of reading one masked line.
#[derive(Debug)]
pub enum MaskedInput {
    Line(Zeroizing<String>),
    Eof,
    Cancelled,
}

#[cfg(unix)]
mod imp {
    use std::io::{self, IsTerminal};
    use std::os::unix::io::{AsRawFd, RawFd};

    use termios::{ECHO, ICANON, ISIG, TCSANOW, Termios, VMIN, VTIME, tcsetattr};

    use crate::logging::surface_warning;

    pub struct EchoGuard {
        fd: RawFd,
        saved: Option<Termios>,
    }

    impl EchoGuard {
        pub fn suppress() -> Self {
            let stdin = io::stdin();
            if !stdin.is_terminal() {
                log::debug!("stdin is not a terminal; echo left unchanged");
                return Self {
                    fd: stdin.as_raw_fd(),
                    saved: None,
                };
            }
            Self::suppress_fd(stdin.as_raw_fd())
        }

        pub fn suppress_fd(fd: RawFd) -> Self {
            let saved = match Termios::from_fd(fd) {
                Ok(saved) => saved,
                Err(e) => {
                    surface_warning(&format!(
                        "Cannot read terminal attributes, input will be visible: {}",
                        e
                    ));
                    return Self { fd, saved: None };
                }
            };

            let mut masked = saved;
            masked.c_lflag &= !(ECHO | ICANON | ISIG);
            masked.c_cc[VMIN] = 1;
            masked.c_cc[VTIME] = 0;
            if let Err(e) = tcsetattr(fd, TCSANOW, &masked) {
                surface_warning(&format!(
                    "Cannot disable terminal echo, input will be visible: {}",
                    e
                ));
                return Self { fd, saved: None };
            }
            Self {
                fd,
                saved: Some(saved),
            }
        }

        pub fn is_active(&self) -> bool {
            self.saved.is_some()
        }
    }

    impl Drop for EchoGuard {
        fn drop(&mut self) {
            if let Some(saved) = self.saved.take() {
                if let Err(e) = tcsetattr(self.fd, TCSANOW, &saved) {
                    surface_warning(&format!("Failed to restore terminal echo: {}", e));
                }
            }
        }
    }
}

#[cfg(not(unix))]
mod imp {
    /// Echo is handled by `rpassword` on these platforms; the guard only
    /// exists so callers can be written the same way everywhere.
    pub struct EchoGuard;

    impl EchoGuard {
        pub fn suppress() -> Self {
            Self
        }

        pub fn is_active(&self) -> bool {
            false
        }
    }
}

pub use imp::EchoGuard;

/// Reads one line of input byte by byte from a terminal whose echo and
/// line discipline are off, doing the minimal line editing ourselves.
pub fn read_masked_line<R: Read>(input: &mut R) -> io::Result<MaskedInput> {
    let mut buf = Zeroizing::new(Vec::new());
    let mut byte = [0u8; 1];

    loop {
        match input.read(&mut byte) {
            Ok(0) => {
                if buf.is_empty() {
                    return Ok(MaskedInput::Eof);
                }
                break;
            }
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }

        match byte[0] {
            b'\n' | b'\r' => break,
            CTRL_C => return Ok(MaskedInput::Cancelled),
            CTRL_D if buf.is_empty() => return Ok(MaskedInput::Eof),
            CTRL_D => {}
            BACKSPACE | DELETE => pop_char(&mut buf),
            CTRL_U => buf.clear(),
            b => buf.push(b),
        }
    }

    let line = String::from_utf8(std::mem::take(&mut *buf)).map_err(|e| {
        let err = e.utf8_error();
        drop(Zeroizing::new(e.into_bytes()));
        io::Error::new(io::ErrorKind::InvalidData, err)
    })?;
    Ok(MaskedInput::Line(Zeroizing::new(line)))
}

/// Removes the last UTF-8 character, including its continuation bytes.
fn pop_char(buf: &mut Vec<u8>) {
    while let Some(b) = buf.pop() {
        if b & 0xC0 != 0x80 {
            break;
        }
    }
}
