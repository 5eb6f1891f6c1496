use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use log::{info, warn};
use thiserror::Error;

use retext::config::{Config, ConfigError};
use retext::container::{ContentBlock, MemoryContainer, run};
use retext::inspect::{inspect, render_table};
use retext::matcher::MatchFilter;
use retext::{Engine, Replacement};

#[derive(Parser, Debug)]
#[command(version, about = "Search and replace text inside decoded PDF content streams.")]
struct Args {
    /// Decoded content stream files, one per content block, in page order.
    #[arg(long, required = true, num_args = 1..)]
    content: Vec<PathBuf>,

    /// TOML file with spacing, normalization and font settings.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Regular expression matched against the projected page text.
    #[arg(long)]
    search: String,

    /// Replacement template (`$1`, `${name}`). Without it nothing is changed.
    #[arg(long)]
    replace: Option<String>,

    /// Insert the replacement verbatim instead of expanding `$` references.
    #[arg(long)]
    literal: bool,

    /// Comma separated match ordinals to replace, counted over all matches.
    #[arg(long)]
    indices: Option<MatchFilter>,

    /// Report matches only.
    #[arg(long)]
    report_only: bool,

    /// Content files are zlib compressed; decompress before and recompress after.
    #[arg(long)]
    inflate: bool,

    /// Print the instruction table of every block.
    #[arg(long)]
    dump: bool,

    /// Where rewritten content files are written, under their original file names.
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

#[derive(Error, Debug)]
enum CliError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Engine(#[from] retext::Error),
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> CliError + '_ {
    move |source| CliError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn read_content(path: &Path, inflate: bool) -> Result<Vec<u8>, CliError> {
    let raw = std::fs::read(path).map_err(io_error(path))?;
    if !inflate {
        return Ok(raw);
    }
    let mut data = Vec::new();
    ZlibDecoder::new(raw.as_slice())
        .read_to_end(&mut data)
        .map_err(io_error(path))?;
    Ok(data)
}

fn write_content(path: &Path, data: &[u8], deflate: bool) -> Result<(), CliError> {
    let data = if deflate {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).map_err(io_error(path))?;
        encoder.finish().map_err(io_error(path))?
    } else {
        data.to_vec()
    };
    std::fs::write(path, data).map_err(io_error(path))
}

fn execute(args: Args) -> Result<(), CliError> {
    let (config, base_dir) = match &args.config {
        Some(path) => (
            Config::load(path)?,
            path.parent().map(Path::to_path_buf).unwrap_or_default(),
        ),
        None => (Config::default(), PathBuf::from(".")),
    };
    let fonts = config.font_set(&base_dir)?;

    let mut options = config.engine_options();
    options.report_only = args.report_only || args.replace.is_none();
    let replacement = match args.replace.clone() {
        Some(text) if args.literal => Replacement::Literal(text),
        Some(text) => Replacement::Template(text),
        None => Replacement::Literal(String::new()),
    };
    let mut engine = Engine::new(&args.search, replacement, options)?;
    if let Some(filter) = args.indices.clone() {
        engine = engine.with_filter(filter);
    }

    let mut blocks = Vec::with_capacity(args.content.len());
    for path in &args.content {
        blocks.push(ContentBlock::decoded(read_content(path, args.inflate)?));
    }

    if args.dump {
        for (path, block) in args.content.iter().zip(&blocks) {
            let plan = engine.plan(&fonts, &block.data)?;
            println!("# {}", path.display());
            print!("{}", render_table(&inspect(&plan.instructions, &plan.schedule)));
        }
    }

    let mut container = MemoryContainer::new();
    container.push_page(fonts, blocks);
    let report = run(&mut container, &engine)?;

    for block in &report.blocks {
        for m in &block.matches {
            println!(
                "{}: match #{} at {}..{}: {:?}",
                args.content[block.block].display(),
                m.ordinal,
                m.start,
                m.end,
                m.text
            );
        }
    }
    println!(
        "{} match(es), {} replaced in {} block(s)",
        report.match_count(),
        report.replaced(),
        report.written()
    );

    if engine.is_report_only() || report.written() == 0 {
        return Ok(());
    }
    let Some(output_dir) = &args.output_dir else {
        warn!("no --output-dir given, rewritten content was not saved");
        return Ok(());
    };
    std::fs::create_dir_all(output_dir).map_err(io_error(output_dir))?;
    for block in report.blocks.iter().filter(|b| b.written) {
        let source = &args.content[block.block];
        let Some(name) = source.file_name() else {
            continue;
        };
        let Some(rewritten) = container.block(block.page, block.block) else {
            continue;
        };
        let target = output_dir.join(name);
        write_content(&target, &rewritten.data, args.inflate)?;
        info!("wrote {}", target.display());
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    if let Err(err) = execute(args) {
        eprintln!("retext: {err}");
        std::process::exit(2);
    }
}
