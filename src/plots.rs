use chrono::{Duration, NaiveDateTime};
use plotters::prelude::*;
use std::path::{Path, PathBuf};

use crate::records::adv::VelocityPoint;
use crate::records::rga::RgaWideTable;

pub const RGA_PLOT_FILE: &str = "rga.svg";
pub const VELOCITY_PLOT_FILE: &str = "adv_velocity.svg";

const SIZE: (u32, u32) = (1200, 600);

/// Pressure per mass over time on a logarithmic pressure axis.
/// Non-positive pressures cannot be shown on that axis and are left out.
pub fn plot_rga(directory: &Path, table: &RgaWideTable) -> Result<Option<PathBuf>, anyhow::Error> {
    let Some(start) = table.rows.iter().map(|r| r.timestamp).min() else {
        return Ok(None);
    };
    let path = directory.join(RGA_PLOT_FILE);
    let seconds = |t: NaiveDateTime| (t - start).num_milliseconds() as f64 / 1000.0;
    let x_end = table
        .rows
        .iter()
        .map(|r| seconds(r.timestamp))
        .fold(1.0, f64::max);

    let positive = || {
        table
            .rows
            .iter()
            .flat_map(|r| r.pressures.iter().flatten())
            .copied()
            .filter(|p| *p > 0.0)
    };
    let y_min = positive().fold(f64::INFINITY, f64::min);
    let y_max = positive().fold(f64::NEG_INFINITY, f64::max);
    let (y_min, y_max) = if y_min.is_finite() {
        (y_min / 2.0, y_max * 2.0)
    } else {
        (1e-12, 1e-6)
    };

    let root = SVGBackend::new(&path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("RGA Mass Spectrometry Data", ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(80)
        .build_cartesian_2d(0.0..x_end, (y_min..y_max).log_scale())?;
    chart
        .configure_mesh()
        .x_desc("Time")
        .y_desc("Pressure (Torr)")
        .x_label_formatter(&|x| {
            start
                .checked_add_signed(Duration::milliseconds((*x * 1000.0) as i64))
                .map(|t| t.format("%H:%M:%S").to_string())
                .unwrap_or_default()
        })
        .y_label_formatter(&|y| format!("{:.0e}", y))
        .draw()?;

    for (column, mass) in table.masses.iter().enumerate() {
        let color = Palette99::pick(column).to_rgba();
        let points: Vec<(f64, f64)> = table
            .rows
            .iter()
            .filter_map(|r| {
                r.pressures
                    .get(column)
                    .copied()
                    .flatten()
                    .filter(|p| *p > 0.0)
                    .map(|p| (seconds(r.timestamp), p))
            })
            .collect();
        chart
            .draw_series(LineSeries::new(points, &color))?
            .label(format!("mass_{}", mass))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    }
    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;

    Ok(Some(path.clone()))
}

/// u, v and w against the sample row.
pub fn plot_velocity(
    directory: &Path,
    series: &[VelocityPoint],
) -> Result<Option<PathBuf>, anyhow::Error> {
    if series.is_empty() {
        return Ok(None);
    }
    let path = directory.join(VELOCITY_PLOT_FILE);
    let x_end = (series.len() as f64 - 1.0).max(1.0);
    let values = || series.iter().flat_map(|p| [p.u, p.v, p.w]);
    let y_min = values().fold(f64::INFINITY, f64::min);
    let y_max = values().fold(f64::NEG_INFINITY, f64::max);
    let (y_min, y_max) = if y_min.is_finite() {
        (y_min, y_max)
    } else {
        (-1.0, 1.0)
    };
    let pad = ((y_max - y_min) * 0.05).max(1e-3);

    let root = SVGBackend::new(&path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("ADV Velocity Components", ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..x_end, (y_min - pad)..(y_max + pad))?;
    chart
        .configure_mesh()
        .x_desc("Row Number")
        .y_desc("Velocity (m/s)")
        .draw()?;

    let components: [(&str, RGBColor, fn(&VelocityPoint) -> f64); 3] =
        [("u", RED, |p| p.u), ("v", GREEN, |p| p.v), ("w", BLUE, |p| p.w)];
    for (name, color, component) in components {
        let points = series.iter().map(|p| (p.row as f64, component(p)));
        chart
            .draw_series(LineSeries::new(points, &color))?
            .label(name)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    }
    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;

    Ok(Some(path.clone()))
}
