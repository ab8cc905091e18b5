use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use common::{
    config::{DEFAULT_HEIGHT, DEFAULT_OUT_DIR, DEFAULT_WIDTH, Settings},
    plot::{OutputLayout, PlotTarget},
    series::LabelScheme,
};
use eyre::{ContextCompat, Result};
use tracing::error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter,
    fmt::{layer, time::ChronoLocal},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

mod plot;

const MODULES: &[&str] = &["common", "rw_bar"];

#[derive(Parser)]
#[command(version, about = "Bar charts of filesystem write/read timings")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Extra tracing directives, ie. `common=trace`
    #[arg(short, long, global = true)]
    log: Vec<String>,
    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Plot the timings of one file on one filesystem
    Plot {
        /// Result CSV: filesystem, file path, index, seconds
        csv: PathBuf,
        filesystem: String,
        /// File name, matched against the last path segment
        file: String,
        #[command(flatten)]
        output: OutputArgs,
        #[command(flatten)]
        chart: ChartArgs,
    },
    /// List the filesystem/file pairs in a result CSV
    Ls {
        csv: PathBuf,
        /// Only list filesystems matching this regex
        #[arg(short, long)]
        filter: Option<String>,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Plot every chart in a config file
    Batch {
        #[arg(short, long, default_value = "plots.yaml")]
        config_file: PathBuf,
    },
}

#[derive(Args)]
#[group(multiple = false)]
struct OutputArgs {
    /// Directory for `<csv>_<filesystem>_<file>.svg` [default: fileSystemPlot]
    #[arg(long)]
    out_dir: Option<PathBuf>,
    /// Write `<filesystem>_<file>_test_result.svg` to the working directory
    #[arg(long, default_value_t = false)]
    cwd: bool,
    /// Write the chart to exactly this path
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl OutputArgs {
    fn layout(self) -> OutputLayout {
        match (self.output, self.cwd, self.out_dir) {
            (Some(path), _, _) => OutputLayout::Explicit(path),
            (None, true, _) => OutputLayout::WorkingDir,
            (None, false, dir) => {
                OutputLayout::Directory(dir.unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_DIR)))
            }
        }
    }
}

#[derive(Args)]
struct ChartArgs {
    /// How bars map onto write and read operations
    #[arg(long, value_enum, default_value_t = LabelScheme::WriteThenReads)]
    labels: LabelScheme,
    #[arg(long, default_value_t = DEFAULT_WIDTH, value_parser = clap::value_parser!(u32).range(1..))]
    width: u32,
    #[arg(long, default_value_t = DEFAULT_HEIGHT, value_parser = clap::value_parser!(u32).range(1..))]
    height: u32,
}

fn init_tracing(args: &Cli) -> Result<Option<WorkerGuard>> {
    let log_level = std::env::var("RUST_LOG").unwrap_or("warn".to_owned());
    let mut env_filter = EnvFilter::new(format!("rw_plot={log_level}"));

    for log in &args.log {
        env_filter = env_filter.add_directive(log.parse()?);
    }

    for module in MODULES {
        if !args.log.iter().any(|x| x.starts_with(module)) {
            env_filter = env_filter.add_directive(format!("{module}={log_level}").parse()?);
        }
    }

    let (file_layer, guard) = match &args.log_file {
        Some(path) => {
            let file_name = path
                .file_name()
                .with_context(|| format!("Invalid log file {path:?}"))?;
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            let file_appender = tracing_appender::rolling::never(dir, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            (
                Some(layer().with_ansi(false).with_writer(non_blocking)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            layer()
                .with_timer(ChronoLocal::new("%v %k:%M:%S %z".to_owned()))
                .compact(),
        )
        .with(file_layer)
        .init();
    Ok(guard)
}

fn main() -> Result<()> {
    let args = Cli::parse();
    let _guard = init_tracing(&args)?;

    let result = match args.command {
        Commands::Plot {
            csv,
            filesystem,
            file,
            output,
            chart,
        } => {
            let settings = Settings {
                labels: chart.labels,
                width: chart.width,
                height: chart.height,
                ..Settings::default()
            };
            plot::run_plot(&PlotTarget::new(csv, filesystem, file), &settings, &output.layout())
        }
        Commands::Ls { csv, filter, json } => plot::list_targets(&csv, filter.as_deref(), json),
        Commands::Batch { config_file } => plot::run_batch(&config_file),
    };

    if let Err(err) = &result {
        error!("{err:#?}");
    }
    result
}
