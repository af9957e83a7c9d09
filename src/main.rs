use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use blob_forge::export::{self, ExportFormat};
use blob_forge::{ShapeController, ShapeState};

#[derive(Parser)]
#[command(name = "blob", version)]
#[command(about = "blob-forge: procedural blob shapes with elastic animation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a preset to a single image
    Render {
        /// Preset JSON file (default: built-in defaults)
        #[arg(long)]
        preset: Option<PathBuf>,

        /// Override the preset's shape seed
        #[arg(long)]
        seed: Option<f64>,

        /// Output format: png, jpeg, webp or svg (default: from the file extension)
        #[arg(long)]
        format: Option<ExportFormat>,

        #[arg(long, default_value_t = 1200)]
        width: u32,

        #[arg(long, default_value_t = 1200)]
        height: u32,

        /// Output file
        #[arg(short)]
        o: PathBuf,
    },

    /// Export a preset in several formats at once
    Batch {
        #[arg(long)]
        preset: Option<PathBuf>,

        /// Formats to write (default: all)
        #[arg(long, value_delimiter = ',')]
        formats: Vec<ExportFormat>,

        /// Square output size in pixels
        #[arg(long, default_value_t = 1200)]
        size: u32,

        #[arg(long, default_value = "dist")]
        outdir: PathBuf,

        /// File stem (default: derived from the preset name)
        #[arg(long)]
        name: Option<String>,
    },

    /// Render the live animation after a regeneration as a PNG sequence
    Frames {
        #[arg(long)]
        preset: Option<PathBuf>,

        #[arg(long, default_value_t = 30.0)]
        fps: f64,

        /// Seconds to capture
        #[arg(long, default_value_t = 2.0)]
        duration: f64,

        #[arg(long, default_value_t = 600)]
        size: u32,

        #[arg(long)]
        outdir: PathBuf,
    },

    /// Wrap a preset in a self-contained ES module custom element
    Component {
        #[arg(long)]
        preset: Option<PathBuf>,

        /// Custom element tag name (default: derived from the preset name)
        #[arg(long)]
        tag: Option<String>,

        #[arg(long, default_value_t = 300)]
        size: u32,

        /// Write output to file instead of stdout
        #[arg(short)]
        o: Option<PathBuf>,
    },

    /// Print the default preset as JSON
    Preset {
        #[arg(long)]
        seed: Option<f64>,
    },

    /// Start a hot-reload preview server for a preset file
    Dev {
        /// Preset JSON file
        preset: PathBuf,

        /// Server port
        #[arg(long, default_value_t = 3333)]
        port: u16,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli.command) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Render {
            preset,
            seed,
            format,
            width,
            height,
            o,
        } => {
            let state = load_state(preset.as_deref(), seed)?;
            let format = match format {
                Some(f) => f,
                None => format_from_extension(&o)?,
            };
            let bytes = blob_forge::render_preset(&state, format, width, height)?;
            write_output(&o, &bytes)?;
            eprintln!(
                "wrote {format} to {} ({}x{}, {} bytes)",
                o.display(),
                width,
                height,
                bytes.len()
            );
        }

        Commands::Batch {
            preset,
            formats,
            size,
            outdir,
            name,
        } => {
            let state = load_state(preset.as_deref(), None)?;
            let formats = if formats.is_empty() {
                ExportFormat::ALL.to_vec()
            } else {
                formats
            };
            let stem = name.unwrap_or_else(|| default_stem(preset.as_deref()));
            let vertices = blob_forge::controller::vertices_for(&state);

            let report = export::export_batch(&state, &vertices, &formats, (size, size), &outdir, &stem, |p| {
                match p.error {
                    None => eprintln!("  [{}/{}] {} -> {}", p.completed, p.total, p.format, p.path.display()),
                    Some(e) => eprintln!("  [{}/{}] {} ... FAILED: {e}", p.completed, p.total, p.format),
                }
            })?;

            eprintln!(
                "exported {} files ({} errors)",
                report.written.len(),
                report.failed.len()
            );
            if !report.is_complete() {
                process::exit(1);
            }
        }

        Commands::Frames {
            preset,
            fps,
            duration,
            size,
            outdir,
        } => {
            let state = load_state(preset.as_deref(), None)?;
            let mut controller = ShapeController::new(state)?;
            let seed = controller.generate();
            let paths = export::export_frames(&mut controller, fps, duration, (size, size), &outdir)?;
            eprintln!(
                "wrote {} frames to {} (seed {seed})",
                paths.len(),
                outdir.display()
            );
        }

        Commands::Component { preset, tag, size, o } => {
            let state = load_state(preset.as_deref(), None)?;
            let tag = tag.unwrap_or_else(|| match preset.as_deref() {
                Some(p) => blob_forge::derive_tag_name(p),
                None => "blob-shape".to_string(),
            });
            let js = blob_forge::preset_component(&state, &tag, size)?;
            match o {
                Some(out_path) => {
                    write_output(&out_path, js.as_bytes())?;
                    eprintln!(
                        "wrote component <{tag}> to {} ({} bytes)",
                        out_path.display(),
                        js.len()
                    );
                }
                None => print!("{js}"),
            }
        }

        Commands::Preset { seed } => {
            let state = load_state(None, seed)?;
            println!("{}", state.to_json()?);
        }

        Commands::Dev { preset, port } => {
            let rt = tokio::runtime::Runtime::new().context("failed to create tokio runtime")?;
            rt.block_on(blob_forge::server::run_dev_server(preset, port))
                .context("dev server failed")?;
        }
    }
    Ok(())
}

fn load_state(preset: Option<&Path>, seed: Option<f64>) -> anyhow::Result<ShapeState> {
    let mut state = blob_forge::load_preset(preset)
        .with_context(|| match preset {
            Some(p) => format!("cannot load preset '{}'", p.display()),
            None => "invalid default preset".to_string(),
        })?;
    if let Some(seed) = seed {
        state.random_seed = seed;
        state.validate()?;
    }
    Ok(state)
}

fn format_from_extension(path: &Path) -> anyhow::Result<ExportFormat> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .with_context(|| format!("cannot infer format from '{}', pass --format", path.display()))?;
    Ok(ext.parse()?)
}

fn default_stem(preset: Option<&Path>) -> String {
    preset
        .and_then(|p| p.file_stem())
        .and_then(|s| s.to_str())
        .unwrap_or("blob")
        .to_string()
}

fn write_output(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("cannot create '{}'", dir.display()))?;
    }
    fs::write(path, bytes).with_context(|| format!("cannot write '{}'", path.display()))
}
