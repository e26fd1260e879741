use crate::config::load_config;
use crate::scene::{Scene, load_scene, parse_scene};
use crate::state_dump::{StateDump, print_state_dump, write_state_dump};
use crate::text::ApproxTextMeasure;
use crate::view::GraphView;
use anyhow::Result;
use clap::Parser;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "cellview", version, about = "Resolve view state for a diagram scene")]
pub struct Args {
    /// Scene file (JSON5) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file for the state dump. Defaults to stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Config JSON file
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// View scale, overrides the config
    #[arg(short = 's', long = "scale")]
    pub scale: Option<f64>,

    /// View translation as two numbers, overrides the config
    #[arg(short = 't', long = "translate", num_args = 2, value_names = ["DX", "DY"], allow_negative_numbers = true)]
    pub translate: Option<Vec<f64>>,

    /// Measure labels so that label boxes contribute to the bounds
    #[arg(long = "measureLabels")]
    pub measure_labels: bool,
}

pub fn run() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;
    if let Some(scale) = args.scale {
        if !(scale.is_finite() && scale > 0.0) {
            anyhow::bail!("--scale must be a positive number, got {scale}");
        }
        config.view.scale = scale;
    }
    if let Some(translate) = &args.translate {
        if let [dx, dy] = translate.as_slice() {
            config.view.translate = crate::geometry::Point::new(*dx, *dy);
        }
    }

    let scene = read_scene(args.input.as_deref())?;
    let mut view = GraphView::new().configure(&config);
    if args.measure_labels {
        view.set_text_measure(ApproxTextMeasure::default());
    }
    view.validate(&scene.model, None);

    let dump = StateDump::from_view(&view, |cell| scene.name(cell).map(str::to_string));
    match args.output.as_deref() {
        Some(path) => write_state_dump(path, &dump),
        None => print_state_dump(&dump),
    }
}

fn read_scene(path: Option<&Path>) -> Result<Scene> {
    match path {
        Some(path) if path != Path::new("-") => Ok(load_scene(path)?),
        _ => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(parse_scene(&buf)?)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("CELLVIEW_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}
