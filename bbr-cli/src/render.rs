//! SVG charts for convergence curves, anchor clouds, regression tracks and gain curves.

use std::iter::once;
use std::ops::Range;

use anyhow::{bail, Result};
use bbr_core::plot::{GainCurve, BETA_MAX};
use bbr_core::track::TrackCase;
use bbr_core::{LogSet, Ltrb, R2};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;

/// SVG rendering configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Canvas width in pixels
    pub width: u32,
    /// Canvas height in pixels
    pub height: u32,
    /// Space around each chart, in pixels
    pub margin: i32,
    /// Room for tick labels and axis descriptions
    pub label_area: i32,
    pub stroke_width: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 600,
            height: 450,
            margin: 10,
            label_area: 45,
            stroke_width: 2,
        }
    }
}

pub const ANCHOR_COLOR: &str = "greenyellow";
pub const TARGET_COLOR: &str = "orangered";
const POINT_COLOR: &str = "deepskyblue";
const REGION_COLOR: &str = "mediumpurple";

/// Upper limit of the gain chart; curves are clipped to it.
const GAIN_MAX: f64 = 1.8;

/// `#rrggbb`, or one of the named colors the built-in palettes use.
pub fn parse_color(name: &str) -> Result<RGBColor> {
    if let Some(hex) = name.strip_prefix('#') {
        if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            let v = u32::from_str_radix(hex, 16)?;
            return Ok(RGBColor((v >> 16) as u8, (v >> 8) as u8, v as u8));
        }
        bail!("Invalid hex color: {:?}", name);
    }
    let (r, g, b) = match name {
        "orangered" => (255, 69, 0),
        "darkorange" => (255, 140, 0),
        "gold" => (255, 215, 0),
        "greenyellow" => (173, 255, 47),
        "aqua" => (0, 255, 255),
        "deepskyblue" => (0, 191, 255),
        "mediumpurple" => (147, 112, 219),
        "violet" => (238, 130, 238),
        "gray" | "grey" => (128, 128, 128),
        "black" => (0, 0, 0),
        "white" => (255, 255, 255),
        _ => bail!("Unknown color: {:?}", name),
    };
    Ok(RGBColor(r, g, b))
}

pub fn palette(colors: &[String]) -> Result<Vec<RGBColor>> {
    colors.iter().map(|c| parse_color(c)).collect()
}

/// Give an empty range some extent.
fn span(lo: f64, hi: f64) -> Range<f64> {
    if hi > lo { lo..hi } else { lo - 0.5..hi + 0.5 }
}

/// Draw onto a white canvas, returning the SVG document.
fn svg<F>(config: &RenderConfig, draw: F) -> Result<String>
where
    F: FnOnce(&DrawingArea<SVGBackend<'_>, Shift>) -> Result<()>,
{
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (config.width, config.height)).into_drawing_area();
        root.fill(&WHITE)?;
        draw(&root)?;
        root.present()?;
    }
    Ok(svg)
}

fn rect(bbox: &Ltrb<f64>, style: ShapeStyle) -> Rectangle<(f64, f64)> {
    Rectangle::new([(bbox.l, bbox.t), (bbox.r, bbox.b)], style)
}

/// Mean IoU per epoch, one line per loss.
pub fn render_loss_curves(logs: &LogSet, colors: &[String], config: &RenderConfig) -> Result<String> {
    let colors = palette(colors)?;
    let max_len = logs.iter().map(|(_, log)| log.len()).max().unwrap_or(0);
    let values = || logs.iter().flat_map(|(_, log)| log.iter().copied());
    let lo = values().fold(f64::INFINITY, f64::min);
    let hi = values().fold(f64::NEG_INFINITY, f64::max);
    let y_range = if lo <= hi { span(lo, hi) } else { 0. ..1. };
    svg(config, |root| {
        let mut chart = ChartBuilder::on(root)
            .margin(config.margin)
            .x_label_area_size(config.label_area)
            .y_label_area_size(config.label_area)
            .build_cartesian_2d(span(1., max_len.max(1) as f64), y_range)?;
        chart.configure_mesh().disable_mesh().x_desc("Epochs").y_desc("IoU").draw()?;
        for ((name, log), color) in logs.iter().zip(&colors) {
            let style = color.stroke_width(config.stroke_width);
            chart
                .draw_series(LineSeries::new(log.points().map(|(x, y)| (x as f64, y)), style))?
                .label(name)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
        }
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::LowerRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
        Ok(())
    })
}

/// Anchor-point cloud over translucent target boxes.
pub fn render_points(points: &[R2<f64>], targets: &[Ltrb<f64>], config: &RenderConfig) -> Result<String> {
    let point = parse_color(POINT_COLOR)?;
    let region = parse_color(REGION_COLOR)?.mix(0.2).filled();
    svg(config, |root| {
        // Square plot area
        let (area, _) = root.split_horizontally(config.width.min(config.height) as i32);
        let limits = || -0.05..1.05;
        let mut chart = ChartBuilder::on(&area)
            .margin(config.margin)
            .x_label_area_size(config.label_area)
            .y_label_area_size(config.label_area)
            .build_cartesian_2d(limits(), limits())?;
        chart.configure_mesh().disable_mesh().x_desc("x").y_desc("y").draw()?;
        chart.draw_series(targets.iter().map(|target| rect(target, region)))?;
        chart.draw_series(points.iter().map(|p| Circle::new((p.x, p.y), 1, point.filled())))?;
        Ok(())
    })
}

/// One panel per case: each loss's regressed box under the anchor and target outlines.
pub fn render_tracks(cases: &[TrackCase], colors: &[String], config: &RenderConfig) -> Result<String> {
    let colors = palette(colors)?;
    let anchor = parse_color(ANCHOR_COLOR)?;
    let target = parse_color(TARGET_COLOR)?;
    svg(config, |root| {
        let panels = root.split_evenly((1, cases.len().max(1)));
        for (case, panel) in cases.iter().zip(&panels) {
            let mut chart = ChartBuilder::on(panel)
                .margin(config.margin)
                .x_label_area_size(config.label_area / 2)
                .y_label_area_size(config.label_area / 2)
                .build_cartesian_2d(0f64..1., 0f64..1.)?;
            chart.configure_mesh().disable_mesh().draw()?;
            // Earlier losses are drawn on top
            for (track, color) in case.tracks.iter().zip(&colors).rev() {
                let fill = color.mix(0.5).filled();
                chart
                    .draw_series(once(rect(&track.bbox, fill)))?
                    .label(track.label())
                    .legend(move |(x, y)| Rectangle::new([(x, y - 4), (x + 20, y + 4)], fill));
            }
            for (name, bbox, color) in [("Bbox", &case.anchor, anchor), ("GT", &case.target, target)] {
                let outline = color.stroke_width(config.stroke_width);
                chart
                    .draw_series(once(rect(bbox, outline)))?
                    .label(name)
                    .legend(move |(x, y)| Rectangle::new([(x, y - 4), (x + 20, y + 4)], outline));
            }
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperLeft)
                .background_style(WHITE.mix(0.8))
                .draw()?;
        }
        Ok(())
    })
}

/// Gradient gain against outlier degree, with a dashed reference at `r = 1`.
pub fn render_gain(curves: &[GainCurve], colors: &[String], config: &RenderConfig) -> Result<String> {
    let colors = palette(colors)?;
    svg(config, |root| {
        let mut chart = ChartBuilder::on(root)
            .margin(config.margin)
            .x_label_area_size(config.label_area)
            .y_label_area_size(config.label_area)
            .build_cartesian_2d(0f64..BETA_MAX, 0f64..GAIN_MAX)?;
        chart
            .configure_mesh()
            .disable_mesh()
            .x_desc("outlier degree")
            .y_desc("gradient gain")
            .draw()?;
        for (curve, color) in curves.iter().zip(&colors) {
            let style = color.stroke_width(config.stroke_width);
            let clipped = curve.points.iter().map(|&(beta, r)| (beta, r.min(GAIN_MAX)));
            chart
                .draw_series(LineSeries::new(clipped, style))?
                .label(curve.label())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
        }
        let reference = BLACK.mix(0.4).stroke_width(config.stroke_width);
        chart.draw_series(DashedLineSeries::new([(0., 1.), (BETA_MAX, 1.)], 6, 4, reference))?;
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
        Ok(())
    })
}
