use std::io::{self, BufRead, IsTerminal, Write};

/// Print `prompt` to stderr and read one line from stdin with echo off.
/// Falls back to a plain read when stdin is not a terminal.
pub(crate) fn prompt_hidden(prompt: &str) -> io::Result<String> {
    eprint!("{prompt}");
    io::stderr().flush()?;

    let mut line = String::new();
    let result = {
        let stdin = io::stdin();
        let _echo = if stdin.is_terminal() {
            Some(EchoOff::enable(&stdin)?)
        } else {
            None
        };
        stdin.lock().read_line(&mut line)
    };
    eprintln!();
    result?;

    let trimmed = line.trim_end_matches(|c| c == '\n' || c == '\r').len();
    line.truncate(trimmed);
    Ok(line)
}

/// Terminal echo disabled until dropped.
#[cfg(unix)]
struct EchoOff {
    fd: i32,
    saved: libc::termios,
}

#[cfg(unix)]
impl EchoOff {
    fn enable(stdin: &io::Stdin) -> io::Result<Self> {
        use std::os::fd::AsRawFd;

        let fd = stdin.as_raw_fd();
        // Safe because zeroed memory is immediately filled in by tcgetattr.
        let mut saved = unsafe { std::mem::zeroed::<libc::termios>() };
        // Safe because fd is stdin and `saved` is writable.
        if unsafe { libc::tcgetattr(fd, &mut saved) } != 0 {
            return Err(io::Error::last_os_error());
        }

        let mut quiet = saved;
        quiet.c_lflag &= !libc::ECHO;
        // Safe because fd is valid and `quiet` came from tcgetattr.
        if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &quiet) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(Self { fd, saved })
    }
}

#[cfg(unix)]
impl Drop for EchoOff {
    fn drop(&mut self) {
        // Safe because `saved` was produced by a successful tcgetattr.
        let _ = unsafe { libc::tcsetattr(self.fd, libc::TCSANOW, &self.saved) };
    }
}

// Echo stays on where termios is unavailable.
#[cfg(not(unix))]
struct EchoOff;

#[cfg(not(unix))]
impl EchoOff {
    fn enable(_stdin: &io::Stdin) -> io::Result<Self> {
        Ok(Self)
    }
}
