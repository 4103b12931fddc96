//! Chart Plotter Module
//! Palette, axis ranges, labels and color scales shared by the renderers.

use plotters::style::RGBColor;

pub const FONT: &str = "sans-serif";

/// Color palette for series and categories
pub const PALETTE: [RGBColor; 10] = [
    RGBColor(52, 152, 219),  // Blue
    RGBColor(231, 76, 60),   // Red
    RGBColor(46, 204, 113),  // Green
    RGBColor(155, 89, 182),  // Purple
    RGBColor(243, 156, 18),  // Orange
    RGBColor(26, 188, 156),  // Teal
    RGBColor(233, 30, 99),   // Pink
    RGBColor(0, 188, 212),   // Cyan
    RGBColor(121, 85, 72),   // Brown
    RGBColor(96, 125, 139),  // Blue Grey
];

/// Fill for heatmap cells with no underlying orders.
pub const ABSENT_CELL: RGBColor = RGBColor(225, 225, 225);

// Sequential scale stops (light yellow -> green -> dark blue)
const SEQ_LOW: RGBColor = RGBColor(255, 255, 217);
const SEQ_MID: RGBColor = RGBColor(65, 182, 196);
const SEQ_HIGH: RGBColor = RGBColor(8, 29, 88);

// Diverging scale stops (blue -> white -> red)
const DIV_LOW: RGBColor = RGBColor(59, 76, 192);
const DIV_MID: RGBColor = RGBColor(242, 242, 242);
const DIV_HIGH: RGBColor = RGBColor(180, 4, 38);

/// Color scale used to fill heatmap cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColorScale {
    /// Maps `[min, max]` onto light-to-dark.
    Sequential { min: f64, max: f64 },
    /// Maps `[-1, 1]` onto blue-white-red.
    Diverging,
}

impl ColorScale {
    pub fn color(&self, value: f64) -> RGBColor {
        match *self {
            ColorScale::Sequential { min, max } => {
                let t = if max > min { (value - min) / (max - min) } else { 0.5 };
                ChartPlotter::three_stop(SEQ_LOW, SEQ_MID, SEQ_HIGH, t)
            }
            ColorScale::Diverging => {
                ChartPlotter::three_stop(DIV_LOW, DIV_MID, DIV_HIGH, (value + 1.0) / 2.0)
            }
        }
    }
}

/// Layout helpers for the static charts.
pub struct ChartPlotter;

impl ChartPlotter {
    pub fn color(index: usize) -> RGBColor {
        PALETTE[index % PALETTE.len()]
    }

    /// Padded `(low, high)` axis bounds; bars pass `include_zero`.
    pub fn value_range(values: impl IntoIterator<Item = f64>, include_zero: bool) -> (f64, f64) {
        let (mut lo, mut hi) = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

        if lo > hi {
            return (0.0, 1.0);
        }
        if include_zero {
            lo = lo.min(0.0);
            hi = hi.max(0.0);
        }
        if hi == lo {
            return (lo - 1.0, hi + 1.0);
        }

        let pad = (hi - lo) * 0.08;
        let low = if include_zero && lo == 0.0 { 0.0 } else { lo - pad };
        let high = if include_zero && hi == 0.0 { 0.0 } else { hi + pad };
        (low, high)
    }

    /// Label for an axis position that falls on a category index.
    pub fn index_label(labels: &[String], x: f64) -> String {
        let rounded = x.round();
        if (x - rounded).abs() > 1e-6 || rounded < 0.0 {
            return String::new();
        }
        labels.get(rounded as usize).cloned().unwrap_or_default()
    }

    /// Shorten long product names for axis labels.
    pub fn truncate_label(label: &str, max_chars: usize) -> String {
        if label.chars().count() <= max_chars {
            return label.to_string();
        }
        let mut short: String = label.chars().take(max_chars.saturating_sub(1)).collect();
        short.push('…');
        short
    }

    /// Readable annotation color on top of `background`.
    pub fn text_color(background: RGBColor) -> RGBColor {
        let RGBColor(r, g, b) = background;
        let luminance = 0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64;
        if luminance < 140.0 {
            RGBColor(255, 255, 255)
        } else {
            RGBColor(0, 0, 0)
        }
    }

    fn lerp(a: RGBColor, b: RGBColor, t: f64) -> RGBColor {
        let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * t).round() as u8;
        RGBColor(mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
    }

    fn three_stop(low: RGBColor, mid: RGBColor, high: RGBColor, t: f64) -> RGBColor {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.5 };
        if t <= 0.5 {
            Self::lerp(low, mid, t * 2.0)
        } else {
            Self::lerp(mid, high, (t - 0.5) * 2.0)
        }
    }
}
