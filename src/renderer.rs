// src/renderer.rs

use crate::error::{Result, TrendError};
use crate::font::{draw_text, text_width, GLYPH_HEIGHT};
use crate::model::SampleSet;
use chrono::{DateTime, Local, Utc};
use image::{Rgb, RgbImage};
use palette::{FromColor, Lch, Srgb};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;
use std::path::Path;

const MARGIN_LEFT: u32 = 70;
const MARGIN_RIGHT: u32 = 30;
const MARGIN_TOP: u32 = 40;
const MARGIN_BOTTOM: u32 = 50;
const MIN_WIDTH: u32 = 240;
const MIN_HEIGHT: u32 = 180;
const LEGEND_ROW: u32 = 14;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([40, 40, 40]);
const GRID: Rgb<u8> = Rgb([225, 225, 230]);
const LABEL: Rgb<u8> = Rgb([60, 60, 60]);

#[derive(Debug, Clone, Copy)]
pub struct ChartOptions {
    pub width: u32,
    pub height: u32,
    /// Label dates in UTC instead of local time
    pub utc: bool,
}

/// Draws the chart and writes it as PNG to `path`, replacing any old file.
pub fn render_chart(samples: &SampleSet, series: &[String], options: &ChartOptions, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| TrendError::Io {
            context: format!("creating {}", parent.display()),
            source,
        })?;
    }
    let image = draw_chart(samples, series, options);
    image.save(path)?;
    tracing::info!("wrote {}x{} chart to {}", image.width(), image.height(), path.display());
    Ok(())
}

/// Plot area in pixels, inclusive
#[derive(Debug, Clone, Copy)]
struct Frame {
    left: i64,
    right: i64,
    top: i64,
    bottom: i64,
}

pub fn draw_chart(samples: &SampleSet, series: &[String], options: &ChartOptions) -> RgbImage {
    let width = options.width.max(MIN_WIDTH);
    let height = options.height.max(MIN_HEIGHT);
    let mut image = RgbImage::from_pixel(width, height, BACKGROUND);
    let frame = Frame {
        left: MARGIN_LEFT as i64,
        right: (width - MARGIN_RIGHT) as i64,
        top: MARGIN_TOP as i64,
        bottom: (height - MARGIN_BOTTOM) as i64,
    };

    let max_count = series
        .iter()
        .flat_map(|name| samples.iter().map(move |s| s.count(name)))
        .max()
        .unwrap_or(0);
    let step = nice_step(max_count);
    let top_value = max_count.div_ceil(step).max(1) * step;

    let y_of = |value: u64| -> i64 {
        let span = (frame.bottom - frame.top) as f64;
        frame.bottom - (value as f64 / top_value as f64 * span).round() as i64
    };

    // Horizontal grid with count labels
    let mut tick = 0;
    while tick <= top_value {
        let y = y_of(tick);
        draw_line(&mut image, frame.left, y, frame.right, y, GRID);
        let label = tick.to_string();
        let x = frame.left - 8 - text_width(&label, 1) as i64;
        draw_text(&mut image, x, y - GLYPH_HEIGHT as i64 / 2, &label, LABEL, 1);
        tick += step;
    }

    draw_line(&mut image, frame.left, frame.top, frame.left, frame.bottom, AXIS);
    draw_line(&mut image, frame.left, frame.bottom, frame.right, frame.bottom, AXIS);
    draw_text(&mut image, 8, 12, "Count", AXIS, 2);

    let times: Vec<i64> = samples.iter().map(|s| s.timestamp).collect();
    let (t_min, t_max) = match (times.first(), times.last()) {
        (Some(&a), Some(&b)) => (a, b),
        _ => (0, 0),
    };
    let x_of = |t: i64| -> i64 {
        if t_max == t_min {
            (frame.left + frame.right) / 2
        } else {
            let span = (frame.right - frame.left) as f64;
            frame.left + ((t - t_min) as f64 / (t_max - t_min) as f64 * span).round() as i64
        }
    };

    // Date labels along the bottom
    if !times.is_empty() {
        let plot_width = (frame.right - frame.left) as usize;
        let labels = if t_max == t_min { 1 } else { (plot_width / 120).clamp(2, times.len().max(2)) };
        for k in 0..labels {
            let t = if labels == 1 { t_min } else { t_min + (t_max - t_min) * k as i64 / (labels as i64 - 1) };
            let x = x_of(t);
            draw_line(&mut image, x, frame.bottom, x, frame.bottom + 4, AXIS);
            let label = format_date(t, options.utc);
            let w = text_width(&label, 1) as i64;
            let lx = (x - w / 2).clamp(2, width as i64 - w - 2);
            draw_text(&mut image, lx, frame.bottom + 10, &label, LABEL, 1);
        }
    }

    let colors = generate_series_colors(series.len());

    for (name, &color) in series.iter().zip(&colors) {
        let points: Vec<(i64, i64)> = samples.iter().map(|s| (x_of(s.timestamp), y_of(s.count(name)))).collect();
        for pair in points.windows(2) {
            let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
            draw_line(&mut image, x0, y0, x1, y1, color);
            draw_line(&mut image, x0, y0 - 1, x1, y1 - 1, color);
        }
        for &(x, y) in &points {
            fill_rect(&mut image, x - 2, y - 2, 5, 5, color);
        }
    }

    draw_legend(&mut image, &frame, series, &colors);
    image
}

fn draw_legend(image: &mut RgbImage, frame: &Frame, series: &[String], colors: &[Rgb<u8>]) {
    if series.is_empty() {
        return;
    }
    let text_w = series.iter().map(|s| text_width(s, 1)).max().unwrap_or(0) as i64;
    let (x, y) = (frame.left + 12, frame.top + 8);
    let w = text_w + 42;
    let h = series.len() as i64 * LEGEND_ROW as i64 + 10;

    fill_rect(image, x, y, w, h, BACKGROUND);
    draw_line(image, x, y, x + w, y, AXIS);
    draw_line(image, x, y + h, x + w, y + h, AXIS);
    draw_line(image, x, y, x, y + h, AXIS);
    draw_line(image, x + w, y, x + w, y + h, AXIS);

    for (i, (name, &color)) in series.iter().zip(colors).enumerate() {
        let row_y = y + 6 + i as i64 * LEGEND_ROW as i64;
        let mid = row_y + GLYPH_HEIGHT as i64 / 2;
        fill_rect(image, x + 8, mid - 1, 22, 3, color);
        draw_text(image, x + 36, row_y, name, AXIS, 1);
    }
}

/// Tick spacing giving about five grid lines up to `max`
fn nice_step(max: u64) -> u64 {
    let raw = (max as f64 / 5.0).max(1.0);
    let magnitude = 10f64.powf(raw.log10().floor());
    let step = [1.0, 2.0, 5.0, 10.0]
        .iter()
        .map(|m| m * magnitude)
        .find(|s| *s >= raw)
        .unwrap_or(10.0 * magnitude);
    (step.round() as u64).max(1)
}

fn format_date(timestamp: i64, utc: bool) -> String {
    let date = DateTime::<Utc>::from_timestamp(timestamp, 0).unwrap_or_default();
    if utc {
        date.format("%Y-%m-%d").to_string()
    } else {
        date.with_timezone(&Local).format("%Y-%m-%d").to_string()
    }
}

fn put(image: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < image.width() && (y as u32) < image.height() {
        image.put_pixel(x as u32, y as u32, color);
    }
}

fn fill_rect(image: &mut RgbImage, x: i64, y: i64, w: i64, h: i64, color: Rgb<u8>) {
    for py in y..y + h {
        for px in x..x + w {
            put(image, px, py, color);
        }
    }
}

// Bresenham
fn draw_line(image: &mut RgbImage, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgb<u8>) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let (mut x, mut y, mut err) = (x0, y0, dx + dy);
    loop {
        put(image, x, y, color);
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Well-separated, saturated colors; the same `count` always yields the
/// same colors.
fn generate_series_colors(count: usize) -> Vec<Rgb<u8>> {
    let mut rng = StdRng::seed_from_u64(42);
    let start = rng.gen_range(0.0f32..360.0f32);
    (0..count)
        .map(|i| {
            // Golden angle keeps neighbouring series apart
            let hue = (start + i as f32 * 137.508f32) % 360.0f32;
            let color = Lch::new(55.0f32, 75.0f32, hue);
            let srgb: Srgb<f32> = Srgb::from_color(color);
            let (r, g, b) = srgb.into_components();
            let r_u8 = (r.clamp(0.0, 1.0) * 255.0f32) as u8;
            let g_u8 = (g.clamp(0.0, 1.0) * 255.0f32) as u8;
            let b_u8 = (b.clamp(0.0, 1.0) * 255.0f32) as u8;
            Rgb([r_u8, g_u8, b_u8])
        })
        .collect()
}
