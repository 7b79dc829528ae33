//! `fanseg` CLI - split fan templates, clean uploads, and render previews.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fanseg::{Color, Config, FanKind, FanOutline, Pipeline, Thresholds};

/// Split fan templates into recolorable layers and preview decorated fans.
#[derive(Parser, Debug)]
#[command(name = "fanseg")]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Split a polymer template into frame, background and mask layers.
    Split {
        /// Template PNG.
        #[arg(value_name = "TEMPLATE")]
        template: PathBuf,

        /// Directory for the layers, scene.json and preview.png.
        #[arg(value_name = "OUT_DIR")]
        out_dir: PathBuf,

        #[command(flatten)]
        style: StyleArgs,

        #[command(flatten)]
        thresholds: ThresholdArgs,
    },

    /// Remove white backgrounds from uploaded images.
    RemoveWhite {
        /// Input images.
        #[arg(value_name = "INPUT", required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory.
        #[arg(short, long, value_name = "DIR")]
        out_dir: PathBuf,

        #[command(flatten)]
        thresholds: ThresholdArgs,
    },

    /// Render a decorated fan preview.
    Compose {
        /// Output PNG.
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Fan product.
        #[arg(long, value_enum, default_value_t = KindArg::Polymer)]
        kind: KindArg,

        /// Template PNG (polymer only).
        #[arg(long, value_name = "PNG")]
        template: Option<PathBuf>,

        /// Image to place on the fan; repeatable.
        #[arg(long = "image", value_name = "PATH")]
        images: Vec<PathBuf>,

        /// Text to place on the fan; repeatable.
        #[arg(long = "text", value_name = "TEXT")]
        texts: Vec<String>,

        /// Cloth outline outer radius.
        #[arg(long, default_value = "280", value_name = "FLOAT")]
        outer_radius: f32,

        /// Cloth outline inner radius.
        #[arg(long, default_value = "100", value_name = "FLOAT")]
        inner_radius: f32,

        #[command(flatten)]
        style: StyleArgs,

        #[command(flatten)]
        thresholds: ThresholdArgs,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum KindArg {
    Cloth,
    Polymer,
}

impl From<KindArg> for FanKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Cloth => Self::Cloth,
            KindArg::Polymer => Self::Polymer,
        }
    }
}

#[derive(ClapArgs, Debug)]
struct StyleArgs {
    /// Blade color (#rrggbb).
    #[arg(long, default_value = "#ffffff", value_name = "COLOR")]
    blade: Color,

    /// Rib color (#rrggbb).
    #[arg(long, default_value = "#000000", value_name = "COLOR")]
    rib: Color,

    /// Preview backdrop color; transparent if omitted.
    #[arg(long, value_name = "COLOR")]
    backdrop: Option<Color>,

    /// Canvas width.
    #[arg(long, default_value = "800", value_name = "INT")]
    width: u32,

    /// Canvas height.
    #[arg(long, default_value = "600", value_name = "INT")]
    height: u32,
}

#[derive(ClapArgs, Debug)]
struct ThresholdArgs {
    /// Alpha below which pixels are ignored.
    #[arg(long, default_value = "50", value_name = "INT")]
    visibility_alpha: u8,

    /// Channels above this level count as white.
    #[arg(long, default_value = "230", value_name = "INT")]
    white_level: u8,

    /// How far red must exceed green and blue to mark the frame.
    #[arg(long, default_value = "20", value_name = "INT")]
    red_margin: u8,

    /// Channels below this level mark the frame as dark.
    #[arg(long, default_value = "60", value_name = "INT")]
    dark_level: u8,

    /// Disable the dark-frame rule (red/yellow templates only).
    #[arg(long)]
    no_dark: bool,
}

impl From<&ThresholdArgs> for Thresholds {
    fn from(args: &ThresholdArgs) -> Self {
        Self {
            visibility_alpha: args.visibility_alpha,
            white_level: args.white_level,
            red_margin: args.red_margin,
            dark_level: (!args.no_dark).then_some(args.dark_level),
        }
    }
}

fn config(kind: FanKind, style: &StyleArgs, thresholds: &ThresholdArgs) -> Config {
    Config {
        kind,
        thresholds: thresholds.into(),
        blade_color: style.blade,
        rib_color: style.rib,
        canvas_width: style.width,
        canvas_height: style.height,
        backdrop: style.backdrop,
        ..Config::default()
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("fanseg={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if let Err(err) = run(args.command) {
        tracing::error!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Split {
            template,
            out_dir,
            style,
            thresholds,
        } => {
            if !template.exists() {
                anyhow::bail!("Template does not exist: {}", template.display());
            }

            let pipeline = Pipeline::new(config(FanKind::Polymer, &style, &thresholds))
                .context("Failed to initialize pipeline")?;
            let report = pipeline
                .split_template(&template, &out_dir)
                .context("Failed to split template")?;

            println!(
                "Split {} ({}x{}): {} frame / {} background pixels -> {}",
                template.display(),
                report.width,
                report.height,
                report.frame_pixels,
                report.background_pixels,
                out_dir.display()
            );
        }

        Command::RemoveWhite {
            inputs,
            out_dir,
            thresholds,
        } => {
            let config = Config {
                thresholds: (&thresholds).into(),
                ..Config::default()
            };
            let pipeline = Pipeline::new(config).context("Failed to initialize pipeline")?;
            let results = pipeline
                .remove_background_batch(&inputs, &out_dir)
                .context("Failed to remove backgrounds")?;

            for (output, report) in results {
                println!("{}: cleared {} pixels", output.display(), report.cleared);
            }
        }

        Command::Compose {
            output,
            kind,
            template,
            images,
            texts,
            outer_radius,
            inner_radius,
            style,
            thresholds,
        } => {
            let outline =
                FanOutline::new(outer_radius, inner_radius).context("Invalid cloth outline")?;
            let config = Config {
                outline,
                ..config(kind.into(), &style, &thresholds)
            };

            let pipeline = Pipeline::new(config).context("Failed to initialize pipeline")?;
            let session = pipeline
                .compose(template.as_deref(), &images, &texts, &output)
                .context("Failed to compose preview")?;

            println!(
                "Rendered {} decorations -> {}",
                session.decorations().len(),
                output.display()
            );
        }
    }

    Ok(())
}
