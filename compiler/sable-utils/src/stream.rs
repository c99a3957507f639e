//! Output streams that the compiler writes messages to. The logger and the
//! report printer both go through a [CompilerOutputStream] so that tests can
//! capture everything the compiler emits.

use std::{
    io,
    sync::{Arc, Mutex},
};

/// Where compiler output should be written.
#[derive(Debug)]
pub enum CompilerOutputStream {
    /// Write to `stdout`.
    Stdout(io::Stdout),

    /// Write to `stderr`.
    Stderr(io::Stderr),

    /// Collect the output into a shared buffer.
    Owned(Arc<Mutex<Vec<u8>>>),
}

impl CompilerOutputStream {
    /// Create a [CompilerOutputStream] that writes to `stdout`.
    pub fn stdout() -> Self {
        CompilerOutputStream::Stdout(io::stdout())
    }

    /// Create a [CompilerOutputStream] that writes to `stderr`.
    pub fn stderr() -> Self {
        CompilerOutputStream::Stderr(io::stderr())
    }

    /// Create a [CompilerOutputStream] that buffers everything written to it.
    pub fn owned() -> Self {
        CompilerOutputStream::Owned(Arc::new(Mutex::new(Vec::new())))
    }

    /// Take a copy of everything written to an owned stream so far. Other
    /// stream kinds yield nothing.
    pub fn contents(&self) -> Vec<u8> {
        match self {
            CompilerOutputStream::Owned(buffer) => {
                buffer.lock().map(|buffer| buffer.clone()).unwrap_or_default()
            }
            _ => Vec::new(),
        }
    }
}

impl Clone for CompilerOutputStream {
    fn clone(&self) -> Self {
        match self {
            CompilerOutputStream::Stdout(_) => CompilerOutputStream::stdout(),
            CompilerOutputStream::Stderr(_) => CompilerOutputStream::stderr(),
            CompilerOutputStream::Owned(buffer) => CompilerOutputStream::Owned(buffer.clone()),
        }
    }
}

impl io::Write for CompilerOutputStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            CompilerOutputStream::Stdout(stream) => stream.write(buf),
            CompilerOutputStream::Stderr(stream) => stream.write(buf),
            CompilerOutputStream::Owned(buffer) => {
                let mut buffer =
                    buffer.lock().map_err(|_| io::Error::other("output buffer was poisoned"))?;
                buffer.extend_from_slice(buf);
                Ok(buf.len())
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            CompilerOutputStream::Stdout(stream) => stream.flush(),
            CompilerOutputStream::Stderr(stream) => stream.flush(),
            CompilerOutputStream::Owned(_) => Ok(()),
        }
    }
}

/// Write a line to a [CompilerOutputStream], ignoring any I/O failure since
/// there is nowhere left to report it.
#[macro_export]
macro_rules! stream_writeln {
    ($stream:expr, $($arg:tt)*) => {{
        let _ = ::std::writeln!($stream, $($arg)*);
    }};
}
