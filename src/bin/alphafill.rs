use std::path::PathBuf;

use anyhow::Context as _;
use clap::{ArgAction, Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "alphafill",
    version,
    about = "Fill the color of fully transparent pixels from nearby visible content"
)]
struct Cli {
    /// Input image (needs an alpha channel).
    input: PathBuf,

    /// Operations, applied in order: propagate[=N], solid[=COLOR], output=PATH, preview=PATH.
    ///
    /// Without a fill operation an unbounded `propagate` runs first; without an `output`
    /// operation the result goes to `--out`.
    #[arg(value_name = "OP", conflicts_with = "ops_file")]
    ops: Vec<alphafill::Operation>,

    /// JSON file holding the operation list instead of positional OPs.
    #[arg(long = "ops", value_name = "FILE")]
    ops_file: Option<PathBuf>,

    /// Output path when no `output=` operation is given [default: <INPUT>.ImprovedTransparent.png].
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Sampling neighbourhood shape.
    #[arg(long, value_enum, default_value_t = ShapeChoice::Square)]
    kernel_shape: ShapeChoice,

    /// Sampling neighbourhood radius in pixels.
    #[arg(long, default_value_t = 2)]
    kernel_radius: u32,

    /// Override rayon worker threads.
    #[arg(long, conflicts_with = "sequential")]
    threads: Option<usize>,

    /// Run every round on the main thread.
    #[arg(long, default_value_t = false)]
    sequential: bool,

    /// More log output (repeatable).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ShapeChoice {
    Square,
    Circle,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let pipeline = match &cli.ops_file {
        Some(path) => alphafill::Pipeline::from_json_path(path)?,
        None => alphafill::Pipeline::new(cli.ops.clone()),
    };
    let default_out = cli
        .out
        .clone()
        .unwrap_or_else(|| alphafill::default_output_path(&cli.input));
    let pipeline = pipeline.with_defaults(&default_out);

    let opts = alphafill::ProcessorOpts {
        kernel: alphafill::KernelSpec {
            shape: match cli.kernel_shape {
                ShapeChoice::Square => alphafill::KernelShape::Square,
                ShapeChoice::Circle => alphafill::KernelShape::Circle,
            },
            radius: cli.kernel_radius,
        },
        threading: alphafill::FillThreading {
            parallel: !cli.sequential,
            threads: cli.threads,
        },
    };

    let mut processor = alphafill::Processor::open(&cli.input, &opts)
        .with_context(|| format!("load '{}'", cli.input.display()))?;
    let report = pipeline
        .run(&mut processor)
        .with_context(|| format!("process '{}'", cli.input.display()))?;

    for path in report.written() {
        eprintln!("wrote {}", path.display());
    }
    Ok(())
}

fn init_tracing(verbose: u8, quiet: bool) {
    let level = if quiet {
        tracing::Level::ERROR
    } else {
        match verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}
