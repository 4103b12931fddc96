//! Static Chart Renderer
//! Draws the report charts as PNG files with plotters.
//!
//! Every chart kind uses the same frame: caption on top, category axes
//! centered on integer positions so bars, boxes and heatmap cells line up
//! with their labels.

use crate::charts::plotter::{ChartPlotter, ColorScale, ABSENT_CELL, FONT};
use crate::stats::BoxStats;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const CAPTION_SIZE: i32 = 28;
const LABEL_SIZE: i32 = 15;
const MAX_LABEL_CHARS: usize = 42;
const MAX_X_LABELS: usize = 16;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Failed to prepare {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to draw chart: {0}")]
    Draw(String),
    #[error("Nothing to plot for {0}")]
    NoData(String),
}

fn draw_err<E: Debug>(e: E) -> ChartError {
    ChartError::Draw(format!("{e:?}"))
}

/// Bar direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Vertical,
    /// Categories on the y-axis, first entry on top.
    Horizontal,
}

/// Axis titles for a cartesian chart.
#[derive(Debug, Clone, Copy)]
pub struct Axes<'a> {
    pub x: &'a str,
    pub y: &'a str,
}

/// Labelled grid for heatmaps; `cells[row][col]`.
pub struct HeatmapData<'a> {
    pub rows: &'a [String],
    pub columns: &'a [String],
    pub cells: &'a [Vec<Option<f64>>],
}

/// Writes chart images of a fixed size into one directory.
pub struct StaticChartRenderer {
    output_dir: PathBuf,
    width: u32,
    height: u32,
}

impl StaticChartRenderer {
    pub fn new(output_dir: &Path, width: u32, height: u32) -> Result<Self, ChartError> {
        fs::create_dir_all(output_dir).map_err(|source| ChartError::Io {
            path: output_dir.to_path_buf(),
            source,
        })?;
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            width,
            height,
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn canvas<'p>(&self, path: &'p Path) -> Result<DrawingArea<BitMapBackend<'p>, Shift>, ChartError> {
        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;
        Ok(root)
    }

    /// Line chart with point markers; x positions are the entry order.
    pub fn line_chart(
        &self,
        file: &str,
        title: &str,
        axes: Axes<'_>,
        points: &[(String, f64)],
    ) -> Result<PathBuf, ChartError> {
        if points.is_empty() {
            return Err(ChartError::NoData(title.to_string()));
        }

        let path = self.output_dir.join(file);
        {
            let root = self.canvas(&path)?;
            let labels: Vec<String> = points.iter().map(|(l, _)| l.clone()).collect();
            let (y_lo, y_hi) = ChartPlotter::value_range(points.iter().map(|p| p.1), false);
            let x_hi = points.len() as f64 - 0.5;

            let mut chart = ChartBuilder::on(&root)
                .caption(title, (FONT, CAPTION_SIZE))
                .margin(20)
                .x_label_area_size(60)
                .y_label_area_size(90)
                .build_cartesian_2d(-0.5f64..x_hi, y_lo..y_hi)
                .map_err(draw_err)?;

            let x_fmt = |x: &f64| ChartPlotter::index_label(&labels, *x);
            let y_fmt = |y: &f64| format!("{:.0}", y);
            chart
                .configure_mesh()
                .x_labels(labels.len().min(MAX_X_LABELS))
                .x_label_formatter(&x_fmt)
                .y_label_formatter(&y_fmt)
                .x_desc(axes.x)
                .y_desc(axes.y)
                .label_style((FONT, LABEL_SIZE))
                .draw()
                .map_err(draw_err)?;

            let color = ChartPlotter::color(0);
            let coords: Vec<(f64, f64)> = points
                .iter()
                .enumerate()
                .map(|(i, (_, v))| (i as f64, *v))
                .collect();
            chart
                .draw_series(LineSeries::new(coords.iter().copied(), color.stroke_width(2)))
                .map_err(draw_err)?;
            chart
                .draw_series(coords.iter().map(|&c| Circle::new(c, 4, color.filled())))
                .map_err(draw_err)?;

            root.present().map_err(draw_err)?;
        }
        Ok(path)
    }

    /// Bar chart, one bar per entry, colored from the palette.
    pub fn bar_chart(
        &self,
        file: &str,
        title: &str,
        axes: Axes<'_>,
        bars: &[(String, f64)],
        orientation: Orientation,
    ) -> Result<PathBuf, ChartError> {
        if bars.is_empty() {
            return Err(ChartError::NoData(title.to_string()));
        }

        let path = self.output_dir.join(file);
        {
            let root = self.canvas(&path)?;
            let n = bars.len();
            let (v_lo, v_hi) = ChartPlotter::value_range(bars.iter().map(|b| b.1), true);
            let cat_range = -0.5f64..n as f64 - 0.5;

            match orientation {
                Orientation::Vertical => {
                    let labels: Vec<String> = bars
                        .iter()
                        .map(|(l, _)| ChartPlotter::truncate_label(l, MAX_LABEL_CHARS))
                        .collect();
                    let mut chart = ChartBuilder::on(&root)
                        .caption(title, (FONT, CAPTION_SIZE))
                        .margin(20)
                        .x_label_area_size(60)
                        .y_label_area_size(90)
                        .build_cartesian_2d(cat_range, v_lo..v_hi)
                        .map_err(draw_err)?;

                    let x_fmt = |x: &f64| ChartPlotter::index_label(&labels, *x);
                    let y_fmt = |y: &f64| format!("{:.0}", y);
                    chart
                        .configure_mesh()
                        .disable_x_mesh()
                        .x_labels(n)
                        .x_label_formatter(&x_fmt)
                        .y_label_formatter(&y_fmt)
                        .x_desc(axes.x)
                        .y_desc(axes.y)
                        .label_style((FONT, LABEL_SIZE))
                        .draw()
                        .map_err(draw_err)?;

                    chart
                        .draw_series(bars.iter().enumerate().map(|(i, (_, v))| {
                            let x = i as f64;
                            Rectangle::new([(x - 0.35, 0.0), (x + 0.35, *v)], ChartPlotter::color(i).filled())
                        }))
                        .map_err(draw_err)?;
                }
                Orientation::Horizontal => {
                    // Reverse so the first entry sits at the top of the y-axis.
                    let labels: Vec<String> = bars
                        .iter()
                        .rev()
                        .map(|(l, _)| ChartPlotter::truncate_label(l, MAX_LABEL_CHARS))
                        .collect();
                    let mut chart = ChartBuilder::on(&root)
                        .caption(title, (FONT, CAPTION_SIZE))
                        .margin(20)
                        .x_label_area_size(50)
                        .y_label_area_size(320)
                        .build_cartesian_2d(v_lo..v_hi, cat_range)
                        .map_err(draw_err)?;

                    let x_fmt = |x: &f64| format!("{:.0}", x);
                    let y_fmt = |y: &f64| ChartPlotter::index_label(&labels, *y);
                    chart
                        .configure_mesh()
                        .disable_y_mesh()
                        .y_labels(n)
                        .x_label_formatter(&x_fmt)
                        .y_label_formatter(&y_fmt)
                        .x_desc(axes.x)
                        .y_desc(axes.y)
                        .label_style((FONT, LABEL_SIZE))
                        .draw()
                        .map_err(draw_err)?;

                    chart
                        .draw_series(bars.iter().enumerate().map(|(i, (_, v))| {
                            let y = (n - 1 - i) as f64;
                            Rectangle::new([(0.0, y - 0.35), (*v, y + 0.35)], ChartPlotter::color(i).filled())
                        }))
                        .map_err(draw_err)?;
                }
            }

            root.present().map_err(draw_err)?;
        }
        Ok(path)
    }

    /// Pie chart of each slice's share; non-positive slices are left out.
    pub fn pie_chart(
        &self,
        file: &str,
        title: &str,
        slices: &[(String, f64)],
    ) -> Result<PathBuf, ChartError> {
        let shown: Vec<&(String, f64)> = slices.iter().filter(|(_, v)| *v > 0.0).collect();
        if shown.is_empty() {
            return Err(ChartError::NoData(title.to_string()));
        }

        let path = self.output_dir.join(file);
        {
            let root = self.canvas(&path)?;
            let area = root
                .titled(title, (FONT, CAPTION_SIZE))
                .map_err(draw_err)?;

            let (w, h) = area.dim_in_pixel();
            let center = (w as i32 / 2, h as i32 / 2);
            let radius = w.min(h) as f64 * 0.36;
            let sizes: Vec<f64> = shown.iter().map(|(_, v)| *v).collect();
            let colors: Vec<RGBColor> = (0..shown.len()).map(ChartPlotter::color).collect();
            let labels: Vec<String> = shown.iter().map(|(l, _)| l.clone()).collect();

            let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
            pie.start_angle(90.0);
            pie.label_style((FONT, 18).into_font().color(&BLACK));
            pie.percentages((FONT, 16).into_font().color(&WHITE));
            area.draw(&pie).map_err(draw_err)?;

            root.present().map_err(draw_err)?;
        }
        Ok(path)
    }

    /// Annotated heatmap. Absent cells are drawn grey with no value.
    pub fn heatmap(
        &self,
        file: &str,
        title: &str,
        axes: Axes<'_>,
        data: &HeatmapData<'_>,
        scale: ColorScale,
        format_value: impl Fn(f64) -> String,
    ) -> Result<PathBuf, ChartError> {
        let (n_rows, n_cols) = (data.rows.len(), data.columns.len());
        if n_rows == 0 || n_cols == 0 {
            return Err(ChartError::NoData(title.to_string()));
        }

        let path = self.output_dir.join(file);
        {
            let root = self.canvas(&path)?;
            // Row 0 is drawn on top.
            let row_labels: Vec<String> = data.rows.iter().rev().cloned().collect();

            let mut chart = ChartBuilder::on(&root)
                .caption(title, (FONT, CAPTION_SIZE))
                .margin(20)
                .x_label_area_size(60)
                .y_label_area_size(140)
                .build_cartesian_2d(-0.5f64..n_cols as f64 - 0.5, -0.5f64..n_rows as f64 - 0.5)
                .map_err(draw_err)?;

            let x_fmt = |x: &f64| ChartPlotter::index_label(data.columns, *x);
            let y_fmt = |y: &f64| ChartPlotter::index_label(&row_labels, *y);
            chart
                .configure_mesh()
                .disable_mesh()
                .x_labels(n_cols)
                .y_labels(n_rows)
                .x_label_formatter(&x_fmt)
                .y_label_formatter(&y_fmt)
                .x_desc(axes.x)
                .y_desc(axes.y)
                .label_style((FONT, LABEL_SIZE))
                .draw()
                .map_err(draw_err)?;

            let mut cells: Vec<(f64, f64, Option<f64>)> = Vec::with_capacity(n_rows * n_cols);
            for (r, row) in data.cells.iter().enumerate().take(n_rows) {
                let y = (n_rows - 1 - r) as f64;
                for c in 0..n_cols {
                    cells.push((c as f64, y, row.get(c).copied().flatten()));
                }
            }

            chart
                .draw_series(cells.iter().map(|&(x, y, v)| {
                    let fill = v.map(|v| scale.color(v)).unwrap_or(ABSENT_CELL);
                    Rectangle::new([(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)], fill.filled())
                }))
                .map_err(draw_err)?;
            chart
                .draw_series(cells.iter().map(|&(x, y, _)| {
                    Rectangle::new([(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)], WHITE.stroke_width(1))
                }))
                .map_err(draw_err)?;

            let anchor = Pos::new(HPos::Center, VPos::Center);
            chart
                .draw_series(cells.iter().filter_map(|&(x, y, v)| {
                    let v = v?;
                    let style = (FONT, 16)
                        .into_font()
                        .color(&ChartPlotter::text_color(scale.color(v)))
                        .pos(anchor);
                    Some(Text::new(format_value(v), (x, y), style))
                }))
                .map_err(draw_err)?;

            root.present().map_err(draw_err)?;
        }
        Ok(path)
    }

    /// Box plot per group with 1.5·IQR whiskers and outlier markers.
    pub fn box_plot(
        &self,
        file: &str,
        title: &str,
        axes: Axes<'_>,
        boxes: &[BoxStats],
    ) -> Result<PathBuf, ChartError> {
        if boxes.is_empty() {
            return Err(ChartError::NoData(title.to_string()));
        }

        let path = self.output_dir.join(file);
        {
            let root = self.canvas(&path)?;
            let labels: Vec<String> = boxes
                .iter()
                .map(|b| format!("{} (n={})", b.group, b.count))
                .collect();
            let extent = boxes.iter().flat_map(|b| {
                [b.whisker_low, b.whisker_high]
                    .into_iter()
                    .chain(b.outliers.iter().copied())
            });
            let (y_lo, y_hi) = ChartPlotter::value_range(extent, false);

            let mut chart = ChartBuilder::on(&root)
                .caption(title, (FONT, CAPTION_SIZE))
                .margin(20)
                .x_label_area_size(60)
                .y_label_area_size(90)
                .build_cartesian_2d(-0.5f64..boxes.len() as f64 - 0.5, y_lo..y_hi)
                .map_err(draw_err)?;

            let x_fmt = |x: &f64| ChartPlotter::index_label(&labels, *x);
            let y_fmt = |y: &f64| format!("{:.0}", y);
            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_labels(boxes.len())
                .x_label_formatter(&x_fmt)
                .y_label_formatter(&y_fmt)
                .x_desc(axes.x)
                .y_desc(axes.y)
                .label_style((FONT, LABEL_SIZE))
                .draw()
                .map_err(draw_err)?;

            for (i, b) in boxes.iter().enumerate() {
                let x = i as f64;
                let color = ChartPlotter::color(i);
                let half = 0.3;

                chart
                    .draw_series([
                        Rectangle::new([(x - half, b.q1), (x + half, b.q3)], color.mix(0.35).filled()),
                        Rectangle::new([(x - half, b.q1), (x + half, b.q3)], color.stroke_width(2)),
                    ])
                    .map_err(draw_err)?;

                let line = BLACK.stroke_width(2);
                chart
                    .draw_series([
                        PathElement::new(vec![(x - half, b.median), (x + half, b.median)], line),
                        PathElement::new(vec![(x, b.q3), (x, b.whisker_high)], BLACK.stroke_width(1)),
                        PathElement::new(vec![(x, b.q1), (x, b.whisker_low)], BLACK.stroke_width(1)),
                        PathElement::new(
                            vec![(x - half / 2.0, b.whisker_high), (x + half / 2.0, b.whisker_high)],
                            BLACK.stroke_width(1),
                        ),
                        PathElement::new(
                            vec![(x - half / 2.0, b.whisker_low), (x + half / 2.0, b.whisker_low)],
                            BLACK.stroke_width(1),
                        ),
                    ])
                    .map_err(draw_err)?;

                chart
                    .draw_series(b.outliers.iter().map(|&v| Circle::new((x, v), 3, color.stroke_width(1))))
                    .map_err(draw_err)?;
            }

            root.present().map_err(draw_err)?;
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_inputs_are_reported_without_drawing() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = StaticChartRenderer::new(dir.path(), 400, 300).unwrap();
        let axes = Axes { x: "x", y: "y" };

        assert!(matches!(
            renderer.line_chart("line.png", "Line", axes, &[]),
            Err(ChartError::NoData(_))
        ));
        assert!(matches!(
            renderer.bar_chart("bar.png", "Bar", axes, &[], Orientation::Vertical),
            Err(ChartError::NoData(_))
        ));
        assert!(matches!(
            renderer.pie_chart("pie.png", "Pie", &[("A".into(), 0.0), ("B".into(), -3.0)]),
            Err(ChartError::NoData(_))
        ));
        assert!(matches!(
            renderer.box_plot("box.png", "Box", axes, &[]),
            Err(ChartError::NoData(_))
        ));
        let empty = HeatmapData {
            rows: &[],
            columns: &[],
            cells: &[],
        };
        assert!(matches!(
            renderer.heatmap("heat.png", "Heat", axes, &empty, ColorScale::Diverging, |v| v.to_string()),
            Err(ChartError::NoData(_))
        ));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn creates_the_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("charts").join("run");
        let renderer = StaticChartRenderer::new(&nested, 400, 300).unwrap();
        assert!(nested.is_dir());
        assert_eq!(renderer.output_dir(), nested.as_path());
    }
}
