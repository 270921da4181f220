pub mod runner;

pub use runner::LightingRunner;

use std::cell::RefCell;

use shade_engine::{LightingError, Rgb};
use wasm_bindgen::prelude::*;

thread_local! {
    static RUNNER: RefCell<Option<LightingRunner>> = const { RefCell::new(None) };
}

/// Run `f` on the runner, or log and return the default if `shade_init`
/// has not succeeded yet.
fn with_runner<R: Default>(f: impl FnOnce(&mut LightingRunner) -> R) -> R {
    RUNNER.with(|cell| match cell.borrow_mut().as_mut() {
        Some(runner) => f(runner),
        None => {
            log::error!("shade: not initialized, call shade_init() first");
            R::default()
        }
    })
}

/// Like [`with_runner`] for fallible calls; errors surface as JS exceptions.
fn try_with_runner<R>(f: impl FnOnce(&mut LightingRunner) -> Result<R, LightingError>) -> Result<R, JsValue> {
    RUNNER.with(|cell| match cell.borrow_mut().as_mut() {
        Some(runner) => f(runner).map_err(|err| JsValue::from_str(&err.to_string())),
        None => Err(JsValue::from_str("shade: not initialized, call shade_init() first")),
    })
}

#[wasm_bindgen]
pub fn shade_init(config_json: &str) -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);

    let runner = LightingRunner::new(config_json).map_err(|err| JsValue::from_str(&err.to_string()))?;
    log::info!("shade: initialized {}x{}", runner.width(), runner.height());
    RUNNER.with(|cell| {
        *cell.borrow_mut() = Some(runner);
    });
    Ok(())
}

#[wasm_bindgen]
pub fn shade_tick(dt: f64) -> Result<(), JsValue> {
    try_with_runner(|r| r.tick(dt))
}

// ---- Walls ----

#[wasm_bindgen]
pub fn shade_add_wall_rect(x: f64, y: f64, w: f64, h: f64) {
    with_runner(|r| r.add_wall_rect(x, y, w, h));
}

#[wasm_bindgen]
pub fn shade_add_wall_segment(x1: f64, y1: f64, x2: f64, y2: f64) {
    with_runner(|r| r.add_wall_segment(x1, y1, x2, y2));
}

#[wasm_bindgen]
pub fn shade_clear_walls() {
    with_runner(|r| r.clear_walls());
}

// ---- Lights ----

#[wasm_bindgen]
#[allow(clippy::too_many_arguments)]
pub fn shade_add_light(
    x: f64,
    y: f64,
    r: u8,
    g: u8,
    b: u8,
    range: u32,
    piercing: u32,
    variants: u32,
) -> Result<u32, JsValue> {
    try_with_runner(|runner| runner.add_light(x, y, Rgb::new(r, g, b), range, piercing, variants))
}

#[wasm_bindgen]
pub fn shade_add_rainbow_light(
    x: f64,
    y: f64,
    hue_start: f64,
    loop_time: f64,
    range: u32,
    variants: u32,
) -> Result<u32, JsValue> {
    try_with_runner(|r| r.add_rainbow_light(x, y, hue_start, loop_time, range, variants))
}

#[wasm_bindgen]
pub fn shade_remove_light(handle: u32) -> bool {
    with_runner(|r| r.remove_light(handle))
}

#[wasm_bindgen]
pub fn shade_set_light_position(handle: u32, x: f64, y: f64) -> bool {
    with_runner(|r| r.set_light_position(handle, x, y))
}

/// Light an RGBA8 canvas image in place.
#[wasm_bindgen]
pub fn shade_apply_rgba(rgba: &mut [u8]) {
    with_runner(|r| r.apply_rgba(rgba));
}

// ---- Data accessors ----

#[wasm_bindgen]
pub fn get_light_buffer_ptr() -> *const u8 {
    RUNNER.with(|cell| {
        cell.borrow()
            .as_ref()
            .map_or(std::ptr::null(), |r| r.buffer_ptr())
    })
}

#[wasm_bindgen]
pub fn get_light_buffer_len() -> u32 {
    with_runner(|r| r.buffer_len())
}

#[wasm_bindgen]
pub fn get_light_count() -> u32 {
    with_runner(|r| r.light_count())
}

#[wasm_bindgen]
pub fn get_width() -> u32 {
    with_runner(|r| r.width())
}

#[wasm_bindgen]
pub fn get_height() -> u32 {
    with_runner(|r| r.height())
}
