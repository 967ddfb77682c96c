//! WebAssembly bindings for ascii-it

use log::{LevelFilter, Metadata, Record};
use wasm_bindgen::prelude::*;

use crate::{
    export_view, rasterize, sample, AsciiItError, Bitmap, CharacterGrid, CharacterRamp, Color, FontGlyphs,
    RasterOptions, RenderOptions, Size, ViewportState,
};

fn js_err(e: AsciiItError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

#[wasm_bindgen]
pub struct WasmConverter {
    font: FontGlyphs,
    options: RenderOptions,
    pixel_scale: u32,
}

#[wasm_bindgen]
impl WasmConverter {
    /// Create a converter drawing with the given TrueType/OpenType font bytes
    #[wasm_bindgen(constructor)]
    pub fn new(font: Vec<u8>) -> Result<WasmConverter, JsValue> {
        Ok(WasmConverter {
            font: FontGlyphs::from_bytes(font).map_err(js_err)?,
            options: RenderOptions::default(),
            pixel_scale: crate::raster::DEFAULT_PIXEL_SCALE,
        })
    }

    /// Replace all options with a JSON object; missing fields take defaults
    #[wasm_bindgen]
    pub fn set_options(&mut self, json: &str) -> Result<(), JsValue> {
        self.options = RenderOptions::from_json(json).map_err(js_err)?;
        Ok(())
    }

    #[wasm_bindgen]
    pub fn set_density(&mut self, density: u32) {
        self.options.density = density;
    }

    #[wasm_bindgen]
    pub fn set_contrast(&mut self, contrast: f32) {
        self.options.contrast = contrast;
    }

    /// Accepts a ramp label from the character-set picker
    #[wasm_bindgen]
    pub fn set_ramp(&mut self, label: &str) {
        self.options.ramp = CharacterRamp::from_label(label);
    }

    #[wasm_bindgen]
    pub fn set_custom_ramp(&mut self, glyphs: &str) -> Result<(), JsValue> {
        self.options.ramp = CharacterRamp::new(glyphs).map_err(js_err)?;
        Ok(())
    }

    #[wasm_bindgen]
    pub fn set_color(&mut self, enabled: bool) {
        self.options.color_enabled = enabled;
    }

    #[wasm_bindgen]
    pub fn set_alpha_as_opacity(&mut self, enabled: bool) {
        self.options.alpha_as_opacity = enabled;
    }

    #[wasm_bindgen]
    pub fn set_background(&mut self, css: &str) -> Result<(), JsValue> {
        self.options.background = css.parse::<Color>().map_err(js_err)?;
        Ok(())
    }

    /// Fixed grid size; a width of 0 goes back to density-driven sizing
    #[wasm_bindgen]
    pub fn set_target_size(&mut self, width: u32, height: u32) {
        self.options.target_char_width = (width > 0).then_some(width);
        self.options.target_char_height = (width > 0 && height > 0).then_some(height);
    }

    #[wasm_bindgen]
    pub fn set_pixel_scale(&mut self, scale: u32) {
        self.pixel_scale = scale;
    }

    /// Sample the RGBA buffer through the viewport and return the grid as text
    #[wasm_bindgen]
    #[allow(clippy::too_many_arguments)]
    pub fn generate_text(
        &self,
        rgba: &[u8],
        width: u32,
        height: u32,
        container_width: f64,
        container_height: f64,
        zoom: f64,
        pan_x: f64,
        pan_y: f64,
    ) -> Result<String, JsValue> {
        let grid = self.grid(rgba, width, height, container_width, container_height, zoom, pan_x, pan_y)?;
        Ok(grid.plain())
    }

    /// Same as `generate_text`, plus per-cell styles as JSON
    #[wasm_bindgen]
    #[allow(clippy::too_many_arguments)]
    pub fn generate_json(
        &self,
        rgba: &[u8],
        width: u32,
        height: u32,
        container_width: f64,
        container_height: f64,
        zoom: f64,
        pan_x: f64,
        pan_y: f64,
    ) -> Result<String, JsValue> {
        let grid = self.grid(rgba, width, height, container_width, container_height, zoom, pan_x, pan_y)?;
        serde_json::to_string(&grid).map_err(|e| js_err(e.into()))
    }

    /// Sample and rasterize in one go; returns PNG bytes
    #[wasm_bindgen]
    #[allow(clippy::too_many_arguments)]
    pub fn render_png(
        &self,
        rgba: &[u8],
        width: u32,
        height: u32,
        container_width: f64,
        container_height: f64,
        zoom: f64,
        pan_x: f64,
        pan_y: f64,
    ) -> Result<Vec<u8>, JsValue> {
        let grid = self.grid(rgba, width, height, container_width, container_height, zoom, pan_x, pan_y)?;
        let raster = RasterOptions::from_render(&self.options).with_pixel_scale(self.pixel_scale);
        let image = rasterize(&grid, &self.font, &raster).map_err(js_err)?;
        Ok(image.png)
    }

    /// PNG of exactly what the viewport shows, at twice the container size
    #[wasm_bindgen]
    #[allow(clippy::too_many_arguments)]
    pub fn export_view(
        &self,
        rgba: &[u8],
        width: u32,
        height: u32,
        container_width: f64,
        container_height: f64,
        zoom: f64,
        pan_x: f64,
        pan_y: f64,
    ) -> Result<Vec<u8>, JsValue> {
        let bitmap = Bitmap::from_rgba(width, height, rgba.to_vec()).map_err(js_err)?;
        let viewport = viewport(container_width, container_height, zoom, pan_x, pan_y);
        let image = export_view(
            &bitmap,
            &viewport,
            self.options.background,
            crate::raster::DEFAULT_VIEW_SCALE,
            None,
        )
        .map_err(js_err)?;
        Ok(image.png)
    }

    /// Output file name for an uploaded file
    #[wasm_bindgen]
    pub fn file_name(original: &str) -> String {
        crate::ascii_file_name(Some(original))
    }
}

impl WasmConverter {
    #[allow(clippy::too_many_arguments)]
    fn grid(
        &self,
        rgba: &[u8],
        width: u32,
        height: u32,
        container_width: f64,
        container_height: f64,
        zoom: f64,
        pan_x: f64,
        pan_y: f64,
    ) -> Result<CharacterGrid, JsValue> {
        let bitmap = Bitmap::from_rgba(width, height, rgba.to_vec()).map_err(js_err)?;
        let viewport = viewport(container_width, container_height, zoom, pan_x, pan_y);
        sample(&bitmap, &viewport, &self.options).map_err(js_err)
    }
}

fn viewport(container_width: f64, container_height: f64, zoom: f64, pan_x: f64, pan_y: f64) -> ViewportState {
    ViewportState::new(Size::new(container_width, container_height))
        .with_zoom(zoom)
        .with_pan(pan_x, pan_y)
}

struct ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let line = format!("[{}] {}", record.level(), record.args());
            web_sys::console::log_1(&JsValue::from_str(&line));
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

#[wasm_bindgen(start)]
pub fn init() {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Warn);
    }
}
