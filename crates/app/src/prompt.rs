//! Terminal implementation of [`SecretPrompt`]
//!
//! Prompts go to stderr. When stdin is a terminal, echo is switched off for
//! the duration of the read; when it is a pipe, one line is read as-is so a
//! password can be supplied by a wrapper script.

use std::io::{self, BufRead, IsTerminal, Write};

use zeroize::Zeroizing;

use common::prompt::SecretPrompt;

#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl SecretPrompt for TerminalPrompt {
    fn read_hidden(&self, prompt: &str) -> io::Result<Zeroizing<String>> {
        let stdin = io::stdin();
        let mut stderr = io::stderr();
        write!(stderr, "{}", prompt)?;
        stderr.flush()?;

        let mut line = Zeroizing::new(String::new());
        if stdin.is_terminal() {
            let _echo = echo::disable(&stdin)?;
            stdin.lock().read_line(&mut line)?;
        } else {
            stdin.lock().read_line(&mut line)?;
            writeln!(stderr)?;
        }

        let trimmed = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(trimmed);
        Ok(line)
    }

    fn is_interactive(&self) -> bool {
        io::stdin().is_terminal() && io::stderr().is_terminal()
    }
}

#[cfg(unix)]
mod echo {
    use std::io::{self, Stdin};
    use std::mem::MaybeUninit;
    use std::os::fd::AsRawFd;

    /// Restores the terminal mode on drop, including on early return
    pub struct EchoGuard {
        fd: i32,
        original: libc::termios,
    }

    pub fn disable(stdin: &Stdin) -> io::Result<EchoGuard> {
        let fd = stdin.as_raw_fd();
        let mut term = MaybeUninit::<libc::termios>::uninit();
        // SAFETY: tcgetattr fills `term` on success, checked before use
        if unsafe { libc::tcgetattr(fd, term.as_mut_ptr()) } != 0 {
            return Err(io::Error::last_os_error());
        }
        let original = unsafe { term.assume_init() };

        let mut hidden = original;
        hidden.c_lflag &= !libc::ECHO;
        hidden.c_lflag |= libc::ECHONL;
        // SAFETY: `hidden` is a valid termios copied from the current mode
        if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &hidden) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(EchoGuard { fd, original })
    }

    impl Drop for EchoGuard {
        fn drop(&mut self) {
            // SAFETY: restoring the mode read in `disable`
            unsafe {
                libc::tcsetattr(self.fd, libc::TCSANOW, &self.original);
            }
        }
    }
}

#[cfg(not(unix))]
mod echo {
    use std::io::{self, Stdin};

    pub struct EchoGuard;

    pub fn disable(_stdin: &Stdin) -> io::Result<EchoGuard> {
        tracing::warn!("cannot hide input on this platform; the password will be echoed");
        Ok(EchoGuard)
    }
}
