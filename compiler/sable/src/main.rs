//! Sable compiler entry point.

mod args;

use std::{fs, io::Write, panic, process::exit};

use args::{CompilerOptions, SubCmd};
use clap::Parser;
use log::LevelFilter;
use sable_pipeline::{
    driver::{lower_manifest, render},
    error::PipelineError,
    manifest::Manifest,
    settings::CompilerSettings,
};
use sable_reporting::{
    report::Report,
    reporter::{Reporter, Reports},
};
use sable_utils::{
    crash::crash_handler, logging::CompilerLogger, stream::CompilerOutputStream, stream_writeln,
};

pub static CONSOLE_LOGGER: CompilerLogger = CompilerLogger::new();

fn main() {
    // Initial grunt work, panic handler and logger setup...
    panic::set_hook(Box::new(crash_handler));

    let options = CompilerOptions::try_parse().unwrap_or_else(|error| {
        // Help and version output is not an error.
        if !error.use_stderr() {
            error.exit()
        }

        emit_and_exit(vec![PipelineError::from(error).into()])
    });

    // if debug is specified, we want to log everything that is debug level...
    let level = if options.debug { LevelFilter::Debug } else { LevelFilter::Warn };
    CONSOLE_LOGGER
        .install(CompilerOutputStream::stdout(), CompilerOutputStream::stderr(), level)
        .unwrap_or_else(|_| panic!("couldn't initiate logger"));

    let mut reporter = Reporter::new();
    let result = run(options, &mut reporter);
    let mut reports = reporter.into_reports();

    match result {
        Ok(output) => {
            emit(&reports);

            let mut stdout = CompilerOutputStream::stdout();
            stream_writeln!(stdout, "{}", output.trim_end());
        }
        Err(error) => {
            reports.push(error.into());
            emit_and_exit(reports);
        }
    }
}

fn run(options: CompilerOptions, reporter: &mut Reporter) -> Result<String, PipelineError> {
    let SubCmd::Abi(mode) = options.mode;

    let mut settings = match &mode.target {
        Some(triple) => CompilerSettings::for_triple(triple)?,
        None => CompilerSettings::host()?,
    };
    settings.debug = options.debug;

    for option in &options.options {
        settings.apply_option(option)?;
    }

    let source = fs::read_to_string(&mode.manifest)
        .map_err(|error| PipelineError::ResourceRead { path: mode.manifest.clone(), error })?;
    let manifest = Manifest::from_json(&source)?;

    let functions = lower_manifest(&settings, &manifest, reporter)?;
    Ok(render(&functions, settings.abi_settings()))
}

fn emit(reports: &[Report]) {
    let mut stderr = CompilerOutputStream::stderr();

    for report in reports {
        stream_writeln!(stderr, "{report}");
    }
}

/// Print the reports and exit, unsuccessfully if any of them is fatal.
fn emit_and_exit(reports: Reports) -> ! {
    emit(&reports);

    let code = if reports.iter().any(|report| report.kind.is_fatal()) { 1 } else { 0 };
    exit(code)
}
