//! Template splitting, background removal and preview composition over files.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use ::image::RgbaImage;
use indicatif::{ProgressBar, ProgressStyle};

use crate::color::Color;
use crate::composite::FanKind;
use crate::error::{Error, Result};
use crate::image;
use crate::mask::FanOutline;
use crate::render;
use crate::segment::{remove_white_background, Thresholds, WhiteRemoval};
use crate::session::{SceneDescription, Session};

/// Configuration for the file pipeline.
#[derive(Debug, Clone)]
pub struct Config {
    /// Which fan product to lay out.
    pub kind: FanKind,

    /// Classifier thresholds.
    pub thresholds: Thresholds,

    /// Blade (background) color.
    pub blade_color: Color,

    /// Rib (frame) color. Polymer only.
    pub rib_color: Color,

    /// Canvas width used for placement and previews.
    pub canvas_width: u32,

    /// Canvas height used for placement and previews.
    pub canvas_height: u32,

    /// Cloth print area.
    pub outline: FanOutline,

    /// Preview backdrop. `None` keeps it transparent.
    pub backdrop: Option<Color>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            kind: FanKind::Polymer,
            thresholds: Thresholds::default(),
            blade_color: Color::WHITE,
            rib_color: Color::BLACK,
            canvas_width: 800,
            canvas_height: 600,
            outline: FanOutline::default(),
            backdrop: None,
        }
    }
}

impl Config {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is out of valid range.
    pub fn validate(&self) -> Result<()> {
        self.thresholds.validate()?;

        if self.canvas_width == 0 || self.canvas_height == 0 {
            return Err(Error::InvalidParameter {
                name: "canvas".to_string(),
                reason: "width and height must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

/// Outcome of splitting one template.
#[derive(Debug, Clone)]
pub struct SplitReport {
    pub width: u32,
    pub height: u32,
    pub frame_pixels: usize,
    pub background_pixels: usize,
    pub outputs: Vec<PathBuf>,
}

/// Runs the engine over files on disk.
pub struct Pipeline {
    config: Config,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        tracing::info!("Initializing pipeline with config: {config:?}");

        Ok(Self { config })
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Split a polymer template into tinted layers, mask, scene and preview.
    ///
    /// Writes `frame.png`, `background.png`, `mask.png`, `scene.json` and
    /// `preview.png` into `out_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the template cannot be loaded or an output cannot be written.
    pub fn split_template<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        template: P,
        out_dir: Q,
    ) -> Result<SplitReport> {
        let template = template.as_ref();
        let out_dir = out_dir.as_ref();

        tracing::info!("Splitting template: {}", template.display());
        let session = self.polymer_session(template)?;

        let (Some(frame), Some(background), Some(mask)) = (
            session.frame_layer(),
            session.background_layer(),
            session.silhouette(),
        ) else {
            return Err(Error::NotReady {
                state: session.state().to_string(),
            });
        };

        std::fs::create_dir_all(out_dir)?;
        let mut outputs = Vec::new();

        for (name, pixels) in [
            ("frame.png", frame.rendered()),
            ("background.png", background.rendered()),
            ("mask.png", mask),
        ] {
            let path = out_dir.join(name);
            image::save_png(pixels, &path)?;
            outputs.push(path);
        }

        let preview = out_dir.join("preview.png");
        self.save_preview(&session, &preview)?;
        outputs.push(preview);

        let scene = out_dir.join("scene.json");
        write_scene(&session.scene(), &scene)?;
        outputs.push(scene);

        let (width, height) = mask.dimensions();
        let report = SplitReport {
            width,
            height,
            frame_pixels: count_visible(frame.source()),
            background_pixels: count_visible(background.source()),
            outputs,
        };

        tracing::info!(
            "Split complete: {} frame / {} background pixels",
            report.frame_pixels,
            report.background_pixels
        );
        Ok(report)
    }

    /// Remove the white background of one image and save it as PNG.
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be loaded or saved.
    pub fn remove_background<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        output: Q,
    ) -> Result<WhiteRemoval> {
        let img = image::load_image(input)?;
        let (clean, report) = remove_white_background(&img, &self.config.thresholds);
        image::save_png(&clean, output)?;
        Ok(report)
    }

    /// Remove white backgrounds from many images into `out_dir`.
    ///
    /// Each output keeps its input's file stem with a `.png` extension. Inputs
    /// sharing a stem get `-2`, `-3`, ... suffixes so none overwrite another.
    ///
    /// # Errors
    ///
    /// Stops at the first image that cannot be loaded or saved.
    pub fn remove_background_batch<Q: AsRef<Path>>(
        &self,
        inputs: &[PathBuf],
        out_dir: Q,
    ) -> Result<Vec<(PathBuf, WhiteRemoval)>> {
        let out_dir = out_dir.as_ref();
        std::fs::create_dir_all(out_dir)?;

        let pb = ProgressBar::new(inputs.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} Removing backgrounds [{bar:40.cyan/blue}] {pos}/{len}")
                .expect("valid template")
                .progress_chars("#>-"),
        );

        let mut results = Vec::with_capacity(inputs.len());
        let mut taken = HashSet::new();
        for input in inputs {
            let stem = input
                .file_stem()
                .map_or_else(|| "image".into(), |s| s.to_string_lossy().into_owned());
            let name = unique_name(&stem, &mut taken);
            let output = out_dir.join(name);

            let report = self.remove_background(input, &output)?;
            tracing::debug!("{} -> {}: {report:?}", input.display(), output.display());
            results.push((output, report));
            pb.inc(1);
        }

        pb.finish_with_message("Background removal complete");
        Ok(results)
    }

    /// Build a session with decorations and save its preview.
    ///
    /// Polymer previews need `template`; cloth ones use the configured outline.
    /// Images go through the upload path (white removal, width cap).
    ///
    /// # Errors
    ///
    /// Returns an error if any input cannot be loaded or the preview cannot be saved.
    pub fn compose<P: AsRef<Path>>(
        &self,
        template: Option<&Path>,
        images: &[PathBuf],
        texts: &[String],
        output: P,
    ) -> Result<Session> {
        let mut session = match (self.config.kind, template) {
            (FanKind::Polymer, Some(template)) => self.polymer_session(template)?,
            (FanKind::Polymer, None) => {
                return Err(Error::InvalidParameter {
                    name: "template".to_string(),
                    reason: "polymer previews need a template image".to_string(),
                })
            }
            (FanKind::Cloth, _) => {
                let mut session = Session::cloth(
                    self.config.canvas_width,
                    self.config.canvas_height,
                    self.config.outline,
                    self.config.thresholds,
                )?;
                session.set_blade_color(self.config.blade_color);
                session.set_rib_color(self.config.rib_color);
                session
            }
        };

        for path in images {
            session.add_image(image::load_image(path)?)?;
        }
        for text in texts {
            session.add_text(text.clone())?;
        }

        self.save_preview(&session, output.as_ref())?;
        Ok(session)
    }

    fn polymer_session(&self, template: &Path) -> Result<Session> {
        let mut session = Session::polymer(
            self.config.canvas_width,
            self.config.canvas_height,
            self.config.thresholds,
        )?;
        session.set_blade_color(self.config.blade_color);
        session.set_rib_color(self.config.rib_color);

        let ticket = session.begin_load()?;
        session.finish_load(ticket, image::load_image(template))?;
        Ok(session)
    }

    fn save_preview(&self, session: &Session, path: &Path) -> Result<()> {
        let backdrop = self.config.backdrop.map(Color::to_rgba);
        let preview = render::compose(session, backdrop);
        tracing::info!("Saving preview to: {}", path.display());
        image::save_png(&preview, path)
    }
}

fn write_scene(scene: &SceneDescription, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(scene)?;
    std::fs::write(path, json)?;
    Ok(())
}

fn count_visible(img: &RgbaImage) -> usize {
    img.pixels().filter(|p| p[3] != 0).count()
}

/// `{stem}.png`, or the first free `{stem}-N.png` if that name is taken.
fn unique_name(stem: &str, taken: &mut HashSet<String>) -> String {
    let mut name = format!("{stem}.png");
    let mut n = 1;
    while !taken.insert(name.clone()) {
        n += 1;
        name = format!("{stem}-{n}.png");
    }
    name
}
