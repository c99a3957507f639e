//! Sable compiler logging utilities. This defines the logger that backs every
//! `log!` statement in the compiler, tagging each line with a coloured level
//! prefix.

use std::io::Write;

use once_cell::sync::OnceCell;

use crate::{
    highlight::{Colour, Modifier, highlight},
    log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError},
    stream::CompilerOutputStream,
    stream_writeln,
};

/// The compiler logger that is used by the compiler for `log!` statements.
#[derive(Default)]
pub struct CompilerLogger {
    /// The output stream that the logger will write to.
    pub output_stream: OnceCell<CompilerOutputStream>,

    /// The error stream that the logger will write to.
    pub error_stream: OnceCell<CompilerOutputStream>,
}

impl CompilerLogger {
    /// Create a new compiler logger.
    pub const fn new() -> Self {
        Self { output_stream: OnceCell::new(), error_stream: OnceCell::new() }
    }

    /// Register `self` as the global logger writing to the given streams, and
    /// raise the maximum log level to `level`.
    pub fn install(
        &'static self,
        output: CompilerOutputStream,
        error: CompilerOutputStream,
        level: LevelFilter,
    ) -> Result<(), SetLoggerError> {
        // The streams can only be set once, a second install keeps the first.
        let _ = self.output_stream.set(output);
        let _ = self.error_stream.set(error);

        log::set_logger(self)?;
        log::set_max_level(level);
        Ok(())
    }

    fn stream_for(&self, level: Level) -> CompilerOutputStream {
        let stream = if level == Level::Error { &self.error_stream } else { &self.output_stream };
        stream.get().cloned().unwrap_or_else(CompilerOutputStream::stderr)
    }
}

impl Log for CompilerLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let level_prefix = match record.level() {
            Level::Error => highlight(Colour::Red | Modifier::Bold, "error"),
            Level::Warn => highlight(Colour::Yellow | Modifier::Bold, "warn"),
            Level::Info => highlight(Colour::Blue | Modifier::Bold, "info"),
            Level::Debug => highlight(Colour::Blue | Modifier::Bold, "debug"),
            Level::Trace => highlight(Colour::Magenta | Modifier::Bold, "trace"),
        };

        let mut out = self.stream_for(record.level());
        stream_writeln!(out, "{level_prefix}: {}", record.args());
    }

    fn flush(&self) {}
}
