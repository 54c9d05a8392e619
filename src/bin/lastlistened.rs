use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "lastlistened", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the card as a PNG and deliver it.
    Render(RenderArgs),
    /// Print the tracks the configured source returns.
    Tracks(TracksArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Config JSON.
    #[arg(long, default_value = lastlistened::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Output PNG path (overrides `image.output`).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Skip the SFTP upload even if `sftp.send` is set.
    #[arg(long)]
    no_send: bool,

    /// Reference time for "time ago" strings, Unix seconds.
    #[arg(long)]
    now: Option<i64>,

    /// Print diagnostics about font resolution (family name + SHA-256 of font bytes).
    #[arg(long)]
    dump_fonts: bool,
}

#[derive(Parser, Debug)]
struct TracksArgs {
    /// Config JSON.
    #[arg(long, default_value = lastlistened::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Reference time for "time ago" strings, Unix seconds.
    #[arg(long)]
    now: Option<i64>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Tracks(args) => cmd_tracks(args),
    }
}

fn load_config(path: &std::path::Path) -> anyhow::Result<lastlistened::AppConfig> {
    lastlistened::AppConfig::from_path(path)
        .with_context(|| format!("load config '{}'", path.display()))
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let cfg = load_config(&args.config)?;

    if args.dump_fonts {
        dump_font_diagnostics(&cfg.image)?;
    }

    let opts = lastlistened::RunOptions {
        now: args.now,
        send_override: args.no_send.then_some(false),
        output_override: args.out,
    };
    let report = lastlistened::run(&cfg, opts)?;

    if report.transferred {
        eprintln!("uploaded {}", report.output.display());
    } else {
        eprintln!("wrote {}", report.output.display());
    }
    if report.placeholders > 0 {
        eprintln!(
            "{} of {} covers used the placeholder",
            report.placeholders, report.tracks
        );
    }
    Ok(())
}

fn cmd_tracks(args: TracksArgs) -> anyhow::Result<()> {
    let cfg = load_config(&args.config)?;
    let now = args.now.unwrap_or_else(lastlistened::now_unix);

    for track in lastlistened::fetch_tracks(&cfg)? {
        let listened_at = if track.now_playing {
            now
        } else {
            track.listened_at
        };
        println!(
            "{} — {} ({})",
            track.title,
            track.artist,
            lastlistened::format_relative(listened_at, now)
        );
    }
    Ok(())
}

fn dump_font_diagnostics(image: &lastlistened::ImageConfig) -> anyhow::Result<()> {
    let fonts = lastlistened::CardFonts::load(image)?;

    eprintln!("font diagnostics:");
    for (role, spec, font) in [
        ("header", &image.header.font, fonts.header()),
        ("font", &image.font, fonts.main()),
        ("sub_font", &image.sub_font, fonts.sub()),
    ] {
        eprintln!("  {role}:");
        eprintln!("    face:    {}", spec.face.display());
        eprintln!("    family:  {}", font.family());
        eprintln!("    size:    {}", font.size_px());
        eprintln!("    sha256:  {}", font.sha256_hex());
    }
    Ok(())
}
