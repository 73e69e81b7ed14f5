// Command-line front end for polypack.
//
// Subcommands map onto the engine: `encode` and `decode` go through the file
// helpers, `select` runs the policy on its own, `inspect` reports what the
// detector makes of a file, and `config` prints build details.

use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum, ValueHint};

use crate::chunked::{self, DEFAULT_CHUNK_SIZE};
use crate::deflate::DEFAULT_LEVEL;
use crate::delta::{DEFAULT_MAX_CELLS, EditStats, script};
use crate::detect::{DEFAULT_MAX_PROBE_CHUNKS, Format};
use crate::engine::{Engine, EngineOptions};
use crate::huffman::HuffmanPayload;
use crate::io::{self, hex};
use crate::policy::{self, ContentCategory};

// ---------------------------------------------------------------------------
// Byte size parsing (supports K, M, G suffixes)
// ---------------------------------------------------------------------------

fn parse_byte_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty size string".into());
    }
    let (num_part, multiplier) = match s.as_bytes().last() {
        Some(b'k' | b'K') => (&s[..s.len() - 1], 1024u64),
        Some(b'm' | b'M') => (&s[..s.len() - 1], 1024 * 1024),
        Some(b'g' | b'G') => (&s[..s.len() - 1], 1024 * 1024 * 1024),
        _ => (s, 1u64),
    };
    let num: u64 = num_part
        .trim()
        .parse()
        .map_err(|e| format!("invalid size '{s}': {e}"))?;
    num.checked_mul(multiplier)
        .ok_or_else(|| format!("size overflow: '{s}'"))
}

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// Content-aware compressor: Huffman, LCS delta and chunked deflate.
#[derive(Parser, Debug)]
#[command(
    name = "polypack",
    version,
    about = "Content-aware compressor with format auto-detection",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Force overwrite existing output files.
    #[arg(short = 'f', long, global = true)]
    force: bool,

    /// Quiet mode (suppress non-error output).
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode (use multiple times for more detail).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Output stats as JSON to stderr.
    #[arg(long = "json", global = true)]
    json_output: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Encode a file with the codec chosen for its content.
    Encode(EncodeArgs),
    /// Decode a file, detecting the codec that produced it.
    Decode(DecodeArgs),
    /// Print the codec the policy would choose.
    Select(SelectArgs),
    /// Print the detected format of an encoded file and its structure.
    Inspect(InspectArgs),
    /// Print build/configuration details.
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CategoryArg {
    /// Infer from the input file extension.
    Auto,
    Text,
    Image,
    Other,
}

impl CategoryArg {
    /// `None` leaves the choice to the file extension.
    fn category(self) -> Option<ContentCategory> {
        match self {
            Self::Auto => None,
            Self::Text => Some(ContentCategory::Text),
            Self::Image => Some(ContentCategory::Image),
            Self::Other => Some(ContentCategory::Other),
        }
    }
}

#[derive(Args, Debug)]
struct EncodeArgs {
    /// Content category.
    #[arg(long, value_enum, default_value_t = CategoryArg::Auto)]
    category: CategoryArg,

    /// Previous version of the input, enables delta coding.
    #[arg(long, short = 'p', value_hint = ValueHint::FilePath)]
    previous: Option<PathBuf>,

    /// Uncompressed bytes per chunk (supports K/M/G suffix).
    #[arg(long = "chunk-size", value_parser = parse_byte_size, default_value_t = DEFAULT_CHUNK_SIZE as u64)]
    chunk_size: u64,

    /// zlib compression level (0-9).
    #[arg(long, short = 'l', value_parser = clap::value_parser!(u32).range(0..=9), default_value_t = DEFAULT_LEVEL)]
    level: u32,

    /// Largest LCS table the delta coder may build, in cells.
    #[arg(long = "max-delta-cells", default_value_t = DEFAULT_MAX_CELLS as u64)]
    max_delta_cells: u64,

    /// Write the Huffman tree as JSON to this file.
    #[arg(long, value_hint = ValueHint::FilePath)]
    tree: Option<PathBuf>,

    /// Input file.
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,

    /// Output file.
    #[arg(value_hint = ValueHint::FilePath)]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct DecodeArgs {
    /// Previous version the input was delta-coded against.
    #[arg(long, short = 'p', value_hint = ValueHint::FilePath)]
    previous: Option<PathBuf>,

    /// Chunk counts at or above this are not treated as containers.
    #[arg(long = "max-probe-chunks", default_value_t = DEFAULT_MAX_PROBE_CHUNKS)]
    max_probe_chunks: u32,

    /// Encoded input file.
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,

    /// Output file.
    #[arg(value_hint = ValueHint::FilePath)]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct SelectArgs {
    /// Input size (supports K/M/G suffix).
    #[arg(long, value_parser = parse_byte_size)]
    size: u64,

    /// Content category (`auto` counts as other).
    #[arg(long, value_enum, default_value_t = CategoryArg::Text)]
    category: CategoryArg,

    /// A previous version is available.
    #[arg(long = "has-previous")]
    has_previous: bool,
}

#[derive(Args, Debug)]
struct InspectArgs {
    /// Previous version, to resolve delta-coded input.
    #[arg(long, short = 'p', value_hint = ValueHint::FilePath)]
    previous: Option<PathBuf>,

    /// Encoded input file.
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,
}

// ---------------------------------------------------------------------------
// Resolved options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Encode,
    Decode,
    Select,
    Inspect,
    Config,
}

struct Options {
    command: Command,
    force: bool,
    quiet: bool,
    verbose: u8,
    json_output: bool,
    engine: EngineOptions,
    category: CategoryArg,
    size: u64,
    has_previous: bool,
    previous_file: Option<PathBuf>,
    tree_file: Option<PathBuf>,
    input_file: Option<PathBuf>,
    output_file: Option<PathBuf>,
}

impl Options {
    fn new(command: Command, cli: &Cli) -> Self {
        Self {
            command,
            force: cli.force,
            quiet: cli.quiet,
            verbose: cli.verbose.min(2),
            json_output: cli.json_output,
            engine: EngineOptions::default(),
            category: CategoryArg::Auto,
            size: 0,
            has_previous: false,
            previous_file: None,
            tree_file: None,
            input_file: None,
            output_file: None,
        }
    }
}

fn resolve_options(cli: Cli) -> Options {
    match &cli.command {
        Cmd::Encode(args) => Options {
            engine: EngineOptions {
                chunk_size: usize::try_from(args.chunk_size).unwrap_or(usize::MAX),
                level: args.level,
                max_delta_cells: usize::try_from(args.max_delta_cells).unwrap_or(usize::MAX),
                ..Default::default()
            },
            category: args.category,
            has_previous: args.previous.is_some(),
            previous_file: args.previous.clone(),
            tree_file: args.tree.clone(),
            input_file: Some(args.input.clone()),
            output_file: Some(args.output.clone()),
            ..Options::new(Command::Encode, &cli)
        },
        Cmd::Decode(args) => Options {
            engine: EngineOptions {
                max_probe_chunks: args.max_probe_chunks,
                ..Default::default()
            },
            has_previous: args.previous.is_some(),
            previous_file: args.previous.clone(),
            input_file: Some(args.input.clone()),
            output_file: Some(args.output.clone()),
            ..Options::new(Command::Decode, &cli)
        },
        Cmd::Select(args) => Options {
            category: args.category,
            size: args.size,
            has_previous: args.has_previous,
            ..Options::new(Command::Select, &cli)
        },
        Cmd::Inspect(args) => Options {
            has_previous: args.previous.is_some(),
            previous_file: args.previous.clone(),
            input_file: Some(args.input.clone()),
            ..Options::new(Command::Inspect, &cli)
        },
        Cmd::Config => Options::new(Command::Config, &cli),
    }
}

#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_args(args: &[String]) {
    let argv: Vec<String> = std::iter::once("polypack".to_string())
        .chain(args.iter().cloned())
        .collect();
    if let Ok(cli) = Cli::try_parse_from(argv) {
        let _ = resolve_options(cli);
    }
}

/// Default log filter for the given verbosity; `RUST_LOG` still wins.
fn log_filter(quiet: bool, verbose: u8) -> &'static str {
    match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    }
}

fn print_json(value: &serde_json::Value) {
    eprintln!("{value:#}");
}

fn check_output(path: &Path, force: bool) -> bool {
    if path.exists() && !force {
        eprintln!(
            "polypack: output file exists, use -f to overwrite: {}",
            path.display()
        );
        return false;
    }
    true
}

// ---------------------------------------------------------------------------
// Config command
// ---------------------------------------------------------------------------

fn cmd_config() -> i32 {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!("polypack version {version} (Rust)");

    let parallel = cfg!(feature = "parallel") as u8;
    let file_io = cfg!(feature = "file-io") as u8;
    let ptr_size = std::mem::size_of::<*const ()>();

    eprintln!("PARALLEL={parallel}");
    eprintln!("FILE_IO={file_io}");
    eprintln!("DEFAULT_LEVEL={DEFAULT_LEVEL}");
    eprintln!("DEFAULT_CHUNK_SIZE={DEFAULT_CHUNK_SIZE}");
    eprintln!("DEFAULT_MAX_DELTA_CELLS={DEFAULT_MAX_CELLS}");
    eprintln!("DEFAULT_MAX_PROBE_CHUNKS={DEFAULT_MAX_PROBE_CHUNKS}");
    eprintln!("TEXT_HUFFMAN_MAX={}", policy::TEXT_HUFFMAN_MAX);
    eprintln!("TEXT_DELTA_MAX={}", policy::TEXT_DELTA_MAX);
    eprintln!("IMAGE_LOSSY_MAX={}", policy::IMAGE_LOSSY_MAX);
    eprintln!("sizeof(usize)={ptr_size}");

    0
}

// ---------------------------------------------------------------------------
// Encode command
// ---------------------------------------------------------------------------

fn cmd_encode(opts: &Options) -> i32 {
    let (Some(input), Some(output)) = (&opts.input_file, &opts.output_file) else {
        eprintln!("polypack: encode needs an input and an output file");
        return 1;
    };
    if !check_output(output, opts.force) {
        return 1;
    }

    let engine = Engine::new(opts.engine.clone());
    let stats = match io::encode_file(
        &engine,
        input,
        output,
        opts.category.category(),
        opts.previous_file.as_deref(),
    ) {
        Ok(stats) => stats,
        Err(e) => {
            eprintln!("polypack: encode error: {e}");
            return 1;
        }
    };

    if let Some(path) = &opts.tree_file {
        match &stats.tree {
            Some(tree) => {
                let written = serde_json::to_vec_pretty(tree)
                    .map_err(std::io::Error::other)
                    .and_then(|json| std::fs::write(path, json));
                if let Err(e) = written {
                    eprintln!("polypack: tree file: {}: {e}", path.display());
                    return 1;
                }
            }
            None if !opts.quiet => eprintln!(
                "polypack: warning: no Huffman tree to write, input was encoded as {}",
                stats.algorithm
            ),
            None => {}
        }
    }

    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "polypack: encoder: {} ({}), input size: {}, output size: {}",
            stats.algorithm, stats.rationale, stats.input_size, stats.output_size
        );
    }

    if opts.json_output {
        print_json(&serde_json::json!({
            "command": "encode",
            "category": stats.category.as_str(),
            "algorithm": stats.algorithm.label(),
            "rationale": stats.rationale,
            "input_size": stats.input_size,
            "output_size": stats.output_size,
            "previous_size": stats.previous_size,
            "input_sha256": stats.input_sha256.map(|d| hex(&d)),
            "level": opts.engine.level,
        }));
    }

    0
}

// ---------------------------------------------------------------------------
// Decode command
// ---------------------------------------------------------------------------

fn cmd_decode(opts: &Options) -> i32 {
    let (Some(input), Some(output)) = (&opts.input_file, &opts.output_file) else {
        eprintln!("polypack: decode needs an input and an output file");
        return 1;
    };
    if !check_output(output, opts.force) {
        return 1;
    }

    let engine = Engine::new(opts.engine.clone());
    let stats = match io::decode_file(&engine, input, output, opts.previous_file.as_deref()) {
        Ok(stats) => stats,
        Err(e) => {
            eprintln!("polypack: decode error: {e}");
            return 1;
        }
    };

    if stats.format == Format::Deflate && opts.has_previous && !opts.quiet {
        eprintln!("polypack: warning: input is plain deflate, the previous version was not used");
    }

    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "polypack: decoder: format: {}, input size: {}, output size: {}",
            stats.format, stats.input_size, stats.output_size
        );
    }

    if opts.json_output {
        print_json(&serde_json::json!({
            "command": "decode",
            "format": stats.format.label(),
            "input_size": stats.input_size,
            "output_size": stats.output_size,
            "output_sha256": stats.output_sha256.map(|d| hex(&d)),
        }));
    }

    0
}

// ---------------------------------------------------------------------------
// Select command
// ---------------------------------------------------------------------------

fn cmd_select(opts: &Options) -> i32 {
    let category = opts.category.category().unwrap_or(ContentCategory::Other);
    let decision = policy::select(category, opts.size, opts.has_previous);

    println!("{}\t{}", decision.algorithm, decision.rationale);

    if opts.json_output {
        print_json(&serde_json::json!({
            "command": "select",
            "category": category.as_str(),
            "size": opts.size,
            "has_previous": opts.has_previous,
            "algorithm": decision.algorithm.label(),
            "rationale": decision.rationale,
        }));
    }

    0
}

// ---------------------------------------------------------------------------
// Inspect command
// ---------------------------------------------------------------------------

fn cmd_inspect(opts: &Options) -> i32 {
    let Some(input) = &opts.input_file else {
        eprintln!("polypack: inspect needs an input file");
        return 1;
    };
    let data = match std::fs::read(input) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("polypack: input file: {}: {e}", input.display());
            return 1;
        }
    };
    let previous = match &opts.previous_file {
        Some(path) => match std::fs::read(path) {
            Ok(data) => Some(data),
            Err(e) => {
                eprintln!("polypack: previous file: {}: {e}", path.display());
                return 1;
            }
        },
        None => None,
    };

    let engine = Engine::new(opts.engine.clone());
    let decoded = match engine.decode(&data, previous.as_deref()) {
        Ok(decoded) => decoded,
        Err(e) => {
            eprintln!("polypack: {}: {e}", input.display());
            return 1;
        }
    };

    println!("format: {}", decoded.format);
    println!("encoded size: {}", data.len());
    println!("decoded size: {}", decoded.bytes.len());

    let mut detail = serde_json::Map::new();
    match decoded.format {
        Format::Chunked => {
            if let Ok(header) = chunked::parse_header(&data) {
                println!("chunks: {}", header.chunk_count());
                println!("header size: {}", header.header_len());
                if opts.verbose > 0 {
                    for (i, len) in header.lengths.iter().enumerate() {
                        println!("  chunk {i}: {len} bytes");
                    }
                }
                detail.insert("chunks".into(), header.chunk_count().into());
                detail.insert("chunk_lengths".into(), header.lengths.clone().into());
            }
        }
        Format::Huffman => {
            if let Ok(payload) = HuffmanPayload::from_bytes(&data) {
                println!("symbols: {}", payload.table.len());
                println!("longest code: {} bits", payload.table.max_len());
                println!("padding: {} bits", payload.padding);
                println!("packed size: {}", payload.bytes.len());
                if opts.verbose > 0 {
                    for (symbol, code) in payload.table.iter() {
                        println!("  {symbol:>3} {code}");
                    }
                }
                detail.insert("symbols".into(), payload.table.len().into());
                detail.insert("max_code_len".into(), payload.table.max_len().into());
                detail.insert("padding".into(), payload.padding.into());
            }
        }
        Format::Delta | Format::Deflate => {
            let ops = match decoded.format {
                Format::Delta => engine
                    .backend()
                    .decompress(&data)
                    .ok()
                    .and_then(|json| script::from_json(&json).ok()),
                _ => script::from_json(&decoded.bytes).ok(),
            };
            if let Some(ops) = ops {
                let stats = EditStats::from_script(&ops);
                println!("edit script: {} ops", ops.len());
                println!("  matches: {}", stats.matches);
                println!("  inserts: {}", stats.inserts);
                println!("  deletes: {}", stats.deletes);
                println!("base size: {}", stats.base_len());
                println!("target size: {}", stats.target_len());
                detail.insert("matches".into(), stats.matches.into());
                detail.insert("inserts".into(), stats.inserts.into());
                detail.insert("deletes".into(), stats.deletes.into());
            }
        }
    }

    if opts.json_output {
        print_json(&serde_json::json!({
            "command": "inspect",
            "format": decoded.format.label(),
            "encoded_size": data.len(),
            "decoded_size": decoded.bytes.len(),
            "detail": detail,
        }));
    }

    0
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Main CLI entry point. Parses arguments via clap, dispatches commands.
pub fn run() -> ! {
    let cli = Cli::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(log_filter(cli.quiet, cli.verbose)),
    )
    .format_timestamp(None)
    .format_target(false)
    .init();

    let opts = resolve_options(cli);

    let exit_code = match opts.command {
        Command::Encode => cmd_encode(&opts),
        Command::Decode => cmd_decode(&opts),
        Command::Select => cmd_select(&opts),
        Command::Inspect => cmd_inspect(&opts),
        Command::Config => cmd_config(),
    };

    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
