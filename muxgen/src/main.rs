use clap::Parser;
use muxgen::*;
use tracing::info;

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Generate a runtime-reconfigurable AXI4-Lite signal multiplexer
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Number of muxed signals
    #[arg(allow_negative_numbers = true)]
    signal_count: i64,

    /// Number of alternates per signal
    #[arg(allow_negative_numbers = true)]
    alt_signal_count: i64,

    /// Write the Verilog module here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write a C header describing the register map
    #[arg(long)]
    header: Option<PathBuf>,

    /// Top-level module name (defaults to aximux__<signal_count>__<alt_signal_count>)
    #[arg(long)]
    module_name: Option<String>,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn remove_all(paths: &[&Path]) {
    for path in paths.iter() {
        let _ = fs::remove_file(path);
    }
}

/// Writes every `(path, text)` artifact, or none of them.
///
/// All files are created before any is written; on failure the files created so far are removed again.
fn write_artifacts(artifacts: &[(&Path, &str)]) -> io::Result<()> {
    let mut files = Vec::with_capacity(artifacts.len());
    for &(path, _) in artifacts.iter() {
        match File::create(path) {
            Ok(file) => files.push(file),
            Err(err) => {
                let created: Vec<&Path> = artifacts[..files.len()].iter().map(|a| a.0).collect();
                remove_all(&created);
                return Err(err);
            }
        }
    }

    for (file, &(path, text)) in files.into_iter().zip(artifacts.iter()) {
        let mut w = BufWriter::new(file);
        let written = w.write_all(text.as_bytes()).and_then(|()| w.flush());
        if let Err(err) = written {
            let created: Vec<&Path> = artifacts.iter().map(|a| a.0).collect();
            remove_all(&created);
            return Err(err);
        }
        info!(path = %path.display(), "wrote artifact");
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<()> {
    let mut generator = Generator::new();
    if let Some(name) = &cli.module_name {
        generator = generator.module_name(name.as_str());
    }

    let c = Context::new();
    let model = generator.generate(&c, cli.signal_count, cli.alt_signal_count)?;

    // Render everything up front so a failure leaves no partial output behind.
    let verilog = Verilog.render_to_string(&model)?;
    let header = match &cli.header {
        Some(_) => Some(CHeader.render_to_string(&model)?),
        None => None,
    };

    let mut artifacts = Vec::new();
    if let Some(output) = &cli.output {
        artifacts.push((output.as_path(), verilog.as_str()));
    }
    if let (Some(path), Some(text)) = (&cli.header, &header) {
        artifacts.push((path.as_path(), text.as_str()));
    }
    write_artifacts(&artifacts)?;

    if cli.output.is_none() {
        let stdout = io::stdout();
        let mut w = BufWriter::new(stdout.lock());
        w.write_all(verilog.as_bytes())?;
        w.flush()?;
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("ERROR: {}", err);
            ExitCode::FAILURE
        }
    }
}
