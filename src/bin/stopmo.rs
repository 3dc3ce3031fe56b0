use std::path::PathBuf;

use clap::{Parser, Subcommand};
use stopmo::{Command as SessionCommand, Effect, Session, ThumbnailCache};

#[derive(Parser, Debug)]
#[command(name = "stopmo", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan the image directory and print the session it would start with.
    List(ListArgs),
    /// Pre-populate the thumbnail cache for an image directory.
    Thumbs(ThumbsArgs),
    /// Assemble selected images into an MP4 (requires `ffmpeg` on PATH).
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct ListArgs {
    /// Directory of source images.
    #[arg(long, default_value = "images")]
    images: PathBuf,

    /// Dump the session state as JSON instead of a table.
    #[arg(long)]
    json: bool,
}

#[derive(Parser, Debug)]
struct ThumbsArgs {
    /// Directory of source images.
    #[arg(long, default_value = "images")]
    images: PathBuf,

    /// Thumbnail cache directory.
    #[arg(long, default_value = "thumbs")]
    cache: PathBuf,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Directory of source images.
    #[arg(long, default_value = "images")]
    images: PathBuf,

    /// Output MP4 path (overwritten if it exists).
    #[arg(long, default_value = "output.mp4")]
    out: PathBuf,

    /// Duration applied to every image before per-item overrides.
    #[arg(long)]
    duration_ms: Option<u64>,

    /// Per-item duration override, as INDEX=MS. Repeatable.
    #[arg(long = "set", value_parser = parse_index_duration)]
    set: Vec<(usize, u64)>,

    /// Indices to leave out of the video. Repeatable.
    #[arg(long = "exclude")]
    exclude: Vec<usize>,

    /// Rescale all included durations to this total before rendering.
    #[arg(long)]
    total_ms: Option<u64>,
}

fn parse_index_duration(s: &str) -> Result<(usize, u64), String> {
    let (idx, ms) = s
        .split_once('=')
        .ok_or_else(|| format!("expected INDEX=MS, got '{s}'"))?;
    let idx = idx
        .parse::<usize>()
        .map_err(|e| format!("bad index '{idx}': {e}"))?;
    let ms = ms
        .parse::<u64>()
        .map_err(|e| format!("bad duration '{ms}': {e}"))?;
    Ok((idx, ms))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::List(args) => cmd_list(args),
        Command::Thumbs(args) => cmd_thumbs(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn scan_session(images: &PathBuf) -> anyhow::Result<Option<Session>> {
    let paths = stopmo::scan_images(images)?;
    if paths.is_empty() {
        eprintln!("no images found in '{}'", images.display());
        return Ok(None);
    }
    Ok(Some(Session::from_paths(paths)))
}

fn cmd_list(args: ListArgs) -> anyhow::Result<()> {
    let Some(session) = scan_session(&args.images)? else {
        return Ok(());
    };

    if args.json {
        let out = std::io::stdout().lock();
        serde_json::to_writer_pretty(out, &session)?;
        println!();
        return Ok(());
    }

    for (i, item) in session.items.iter().enumerate() {
        let mark = if item.included { "x" } else { " " };
        println!(
            "{i:4}  [{mark}] {:6} ms  {}",
            item.duration_ms,
            item.path.display()
        );
    }
    println!(
        "total: {} ms over {} images",
        session.total_duration_ms,
        session.items.len()
    );
    Ok(())
}

fn cmd_thumbs(args: ThumbsArgs) -> anyhow::Result<()> {
    let paths = stopmo::scan_images(&args.images)?;
    let cache = ThumbnailCache::new(&args.cache);
    for path in &paths {
        cache.get_or_create(path)?;
    }
    eprintln!(
        "cached {} thumbnails in '{}'",
        paths.len(),
        cache.dir().display()
    );
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let Some(mut session) = scan_session(&args.images)? else {
        anyhow::bail!("nothing to render");
    };

    // Blanket duration first, then per-item overrides, exclusions, and the
    // total rescale last, mirroring how the controls layer on each other.
    if let Some(ms) = args.duration_ms {
        for i in 0..session.items.len() {
            session.apply(SessionCommand::SetDuration(i, ms))?;
        }
    }
    for (i, ms) in &args.set {
        session.apply(SessionCommand::SetDuration(*i, *ms))?;
    }
    for i in &args.exclude {
        session.apply(SessionCommand::ToggleInclude(*i))?;
    }
    if let Some(total) = args.total_ms {
        session.apply(SessionCommand::SetTotal(total))?;
    }

    eprintln!(
        "{} images selected for a total duration of {} ms",
        session.selection().count(),
        session.total_duration_ms
    );

    let Effect::Generate(frames) = session.apply(SessionCommand::Generate)? else {
        anyhow::bail!("generate produced no assembly effect (bug)");
    };

    let report = stopmo::assemble(&frames, &args.out)?;
    eprintln!(
        "wrote {} ({} frames, {}x{})",
        args.out.display(),
        report.frames_written,
        report.width,
        report.height
    );
    Ok(())
}
