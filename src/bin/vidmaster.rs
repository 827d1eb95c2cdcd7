use std::path::PathBuf;

use anyhow::Context as _;
use clap::{ArgAction, Parser, Subcommand};
use tracing::Level;

#[derive(Parser, Debug)]
#[command(name = "vidmaster", version, about = "Run video composition scripts")]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Execute a script with ffmpeg (requires `ffmpeg` and `ffprobe` on PATH).
    Run(RunArgs),
    /// Execute a script without touching media and print the backend calls.
    Check(ScriptArg),
    /// Print the parsed operations as JSON.
    Parse(ScriptArg),
}

#[derive(Parser, Debug)]
struct ScriptArg {
    /// Script file.
    script: PathBuf,
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Script file.
    script: PathBuf,

    /// Print ffmpeg command lines instead of running them.
    #[arg(long)]
    dry_run: bool,

    /// Fail instead of overwriting existing output files.
    #[arg(long)]
    no_overwrite: bool,

    /// ffmpeg program.
    #[arg(long, default_value = "ffmpeg")]
    ffmpeg: String,

    /// ffprobe program.
    #[arg(long, default_value = "ffprobe")]
    ffprobe: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Run(args) => cmd_run(args),
        Command::Check(args) => cmd_check(args),
        Command::Parse(args) => cmd_parse(args),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    let mut backend = vidmaster::FfmpegBackend::new(vidmaster::FfmpegBackendOpts {
        ffmpeg: args.ffmpeg,
        ffprobe: args.ffprobe,
        overwrite: !args.no_overwrite,
        dry_run: args.dry_run,
    });
    let report = vidmaster::Workbench::from_script_path(&args.script, &mut backend)?
        .run()
        .with_context(|| format!("run script '{}'", args.script.display()))?;

    if args.dry_run {
        for cmd in backend.commands() {
            println!("{}", cmd.display());
        }
    } else {
        for path in &report.exports {
            eprintln!("wrote {}", path.display());
        }
    }
    Ok(())
}

fn cmd_check(args: ScriptArg) -> anyhow::Result<()> {
    let mut backend = vidmaster::RecordingBackend::new();
    let report = vidmaster::Workbench::from_script_path(&args.script, &mut backend)?
        .run()
        .with_context(|| format!("check script '{}'", args.script.display()))?;

    for call in backend.calls() {
        println!("{call:?}");
    }
    eprintln!(
        "ok: {} steps, {} exports, {} clips bound",
        report.steps_run,
        report.exports.len(),
        report.registry.len()
    );
    Ok(())
}

fn cmd_parse(args: ScriptArg) -> anyhow::Result<()> {
    let steps = vidmaster::parse_script_file(&args.script)?;
    let json = serde_json::to_string_pretty(&steps).context("serialize steps")?;
    println!("{json}");
    Ok(())
}
