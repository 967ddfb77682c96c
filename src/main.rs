//! ascii-it CLI - Convert images to character art and re-render it as PNG

use std::fs;
use std::path::{Path, PathBuf};

use ascii_it::{
    export_view, fill_container, sample, AsciiItError, Bitmap, CharacterGrid, CharacterRamp, Color,
    FontGlyphs, RampPreset, RasterOptions, RenderOptions, Size, ViewportState,
};
use clap::{ArgAction, Parser, ValueEnum};
use log::{error, info, LevelFilter, Metadata, Record};
use rayon::prelude::*;

#[derive(Parser)]
#[command(name = "ascii-it", version, about = "Convert images to character art and render it back to PNG")]
struct Args {
    /// Input image files
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    /// TrueType/OpenType monospace font used to draw the glyphs
    #[arg(short, long)]
    font: PathBuf,
    /// JSON file with render options; flags below override it
    #[arg(long)]
    options: Option<PathBuf>,
    /// Output directory
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,
    /// Grid density, 1 (coarse) to 10 (fine)
    #[arg(short, long)]
    density: Option<u32>,
    /// Contrast gamma, 1 to 5
    #[arg(short, long)]
    contrast: Option<f32>,
    /// Character ramp preset
    #[arg(short, long, value_enum)]
    ramp: Option<RampChoice>,
    /// Custom ramp, darkest glyph first
    #[arg(long, conflicts_with = "ramp")]
    chars: Option<String>,
    /// Keep source colors (the default unless the options file turns them off)
    #[arg(long)]
    color: bool,
    /// Draw every glyph in white
    #[arg(long, conflicts_with = "color")]
    no_color: bool,
    /// Ignore source alpha
    #[arg(long)]
    no_opacity: bool,
    /// Background color (#rgb, #rrggbb, rgb(..), black, white)
    #[arg(short, long)]
    background: Option<Color>,
    /// Output width in characters
    #[arg(short, long)]
    width: Option<u32>,
    /// Output height in characters
    #[arg(long, requires = "width")]
    height: Option<u32>,
    /// Viewport size as WxH; defaults to the image size
    #[arg(long, value_parser = parse_size)]
    container: Option<Size>,
    /// Zoom factor, 0.5 and up
    #[arg(short, long, default_value_t = 1.0)]
    zoom: f64,
    /// Horizontal pan in container pixels
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pan_x: f64,
    /// Vertical pan in container pixels
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pan_y: f64,
    /// Zoom and center the image so it covers the whole viewport
    #[arg(long, conflicts_with_all = ["zoom", "pan_x", "pan_y"])]
    fill: bool,
    /// Glyph cell height / width
    #[arg(long)]
    cell_aspect: Option<f32>,
    /// Measure the cell aspect from the font instead
    #[arg(long, conflicts_with = "cell_aspect")]
    measure_aspect: bool,
    /// Output pixel scale
    #[arg(short, long, default_value_t = ascii_it::raster::DEFAULT_PIXEL_SCALE)]
    scale: u32,
    /// Also export the viewport itself as view-<name>.png
    #[arg(long)]
    view: bool,
    /// Print the grid as plain text
    #[arg(short, long)]
    text: bool,
    /// More logging (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
enum RampChoice {
    Dots,
    Braille,
    Blocks,
}

impl From<RampChoice> for RampPreset {
    fn from(choice: RampChoice) -> Self {
        match choice {
            RampChoice::Dots => RampPreset::Dots,
            RampChoice::Braille => RampPreset::Braille,
            RampChoice::Blocks => RampPreset::Blocks,
        }
    }
}

fn parse_size(s: &str) -> Result<Size, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got {s:?}"))?;
    let width: f64 = w.trim().parse().map_err(|_| format!("bad width {w:?}"))?;
    let height: f64 = h.trim().parse().map_err(|_| format!("bad height {h:?}"))?;
    if width <= 0.0 || height <= 0.0 {
        return Err(format!("container {s:?} has no area"));
    }
    Ok(Size::new(width, height))
}

struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

impl Args {
    fn render_options(&self, font: &FontGlyphs) -> Result<RenderOptions, AsciiItError> {
        let mut options = match &self.options {
            Some(path) => RenderOptions::load(path)?,
            None => RenderOptions::default(),
        };

        if let Some(density) = self.density {
            options.density = density;
        }
        if let Some(contrast) = self.contrast {
            options.contrast = contrast;
        }
        if let Some(ramp) = self.ramp {
            options.ramp = RampPreset::from(ramp).ramp();
        }
        if let Some(chars) = &self.chars {
            options.ramp = CharacterRamp::new(chars.as_str())?;
        }
        if self.color {
            options.color_enabled = true;
        }
        if self.no_color {
            options.color_enabled = false;
        }
        if self.no_opacity {
            options.alpha_as_opacity = false;
        }
        if let Some(background) = self.background {
            options.background = background;
        }
        if self.width.is_some() {
            options.target_char_width = self.width;
            options.target_char_height = self.height;
        }
        if let Some(aspect) = self.cell_aspect {
            options.cell_aspect = aspect;
        }
        if self.measure_aspect {
            options.cell_aspect = font.cell_aspect(ascii_it::raster::FONT_SIZE);
        }
        Ok(options)
    }

    fn viewport(&self, bitmap: &Bitmap) -> ViewportState {
        let container = self.container.unwrap_or_else(|| bitmap.size());
        if self.fill {
            fill_container(bitmap.size(), container)
        } else {
            ViewportState::new(container)
                .with_zoom(self.zoom)
                .with_pan(self.pan_x, self.pan_y)
        }
    }
}

fn convert(
    path: &Path,
    args: &Args,
    options: &RenderOptions,
    font: &FontGlyphs,
) -> Result<(PathBuf, CharacterGrid), AsciiItError> {
    let bitmap = Bitmap::open(path)?;
    let viewport = args.viewport(&bitmap);
    let name = path.file_name().and_then(|n| n.to_str());

    let grid = sample(&bitmap, &viewport, options)?;
    info!("{}: {}x{} characters", path.display(), grid.width(), grid.height());

    let raster = RasterOptions::from_render(options)
        .with_pixel_scale(args.scale)
        .with_file_name(name);
    let image = ascii_it::rasterize(&grid, font, &raster)?;
    let out = args.out_dir.join(&image.file_name);
    fs::write(&out, &image.png)?;
    info!("{}: wrote {} ({}x{})", path.display(), out.display(), image.width, image.height);

    if args.view {
        let view = export_view(
            &bitmap,
            &viewport,
            options.background,
            ascii_it::raster::DEFAULT_VIEW_SCALE,
            name,
        )?;
        let view_name = view.file_name.replacen("ascii-", "view-", 1);
        fs::write(args.out_dir.join(view_name), &view.png)?;
    }

    Ok((out, grid))
}

fn main() -> Result<(), AsciiItError> {
    let args = Args::parse();
    init_logging(args.verbose);

    let font = FontGlyphs::load(&args.font)?;
    let options = args.render_options(&font)?;
    fs::create_dir_all(&args.out_dir)?;

    let results: Vec<_> = args
        .inputs
        .par_iter()
        .map(|path| (path, convert(path, &args, &options, &font)))
        .collect();

    let mut failure = None;
    for (path, result) in results {
        match result {
            Ok((out, grid)) => {
                if args.text {
                    print!("{}", grid.plain());
                } else {
                    println!("{}", out.display());
                }
            }
            Err(e) => {
                error!("{}: {e}", path.display());
                failure.get_or_insert(e);
            }
        }
    }

    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
