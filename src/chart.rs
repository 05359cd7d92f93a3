//! Bar chart of a [`RatingDistribution`].
//!
//! One bar per star value, ascending left to right, on a review-count axis
//! that starts at zero. The chart is drawn with plotters into an RGB buffer
//! and saved as PNG. An all-zero distribution still renders the title, axes
//! and labels. Text uses the bundled DejaVu Sans so no system fonts are needed.

use image::{ImageError, ImageFormat, RgbImage};
use plotters::coord::Shift;
use plotters::coord::ranged1d::SegmentValue;
use plotters::prelude::*;
use plotters::style::FontStyle;
use std::path::Path;
use std::sync::OnceLock;

use crate::error::{ChartError, WriteError};
use crate::stats::RatingDistribution;

pub const CHART_WIDTH: u32 = 1000;
pub const CHART_HEIGHT: u32 = 600;

pub const TITLE: &str = "Ratings Distribution";
pub const BAR_COLOR: RGBColor = RGBColor(31, 119, 180);

const FONT_FAMILY: &str = "sans-serif";
static FONT_DATA: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

fn register_embedded_font() -> Result<(), ChartError> {
    static LOADED: OnceLock<bool> = OnceLock::new();

    let loaded = *LOADED.get_or_init(|| {
        plotters::style::register_font(FONT_FAMILY, FontStyle::Normal, FONT_DATA).is_ok()
    });
    if loaded { Ok(()) } else { Err(ChartError::Font) }
}

/// Top of the count axis: a tenth of headroom above the tallest bar, at
/// least one so an empty chart still has a scale.
fn y_axis_top(distribution: &RatingDistribution) -> u64 {
    let max = distribution.max();
    if max == 0 { 1 } else { max + max.div_ceil(10) }
}

fn star_label(value: &SegmentValue<u32>) -> String {
    match value {
        SegmentValue::Exact(star) | SegmentValue::CenterOf(star) => star.to_string(),
        SegmentValue::Last => String::new(),
    }
}

fn draw<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    distribution: &RatingDistribution,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(root)
        .caption(TITLE, (FONT_FAMILY, 28))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d((1u32..5u32).into_segmented(), 0u64..y_axis_top(distribution))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Rating")
        .y_desc("Number of Reviews")
        .x_label_formatter(&star_label)
        .label_style((FONT_FAMILY, 14))
        .axis_desc_style((FONT_FAMILY, 18))
        .draw()?;

    chart.draw_series(
        Histogram::vertical(&chart)
            .style(BAR_COLOR.filled())
            .margin(40)
            .data(distribution.iter().map(|(star, count)| (u32::from(star), count))),
    )?;

    Ok(())
}

/// Renders the chart into an in-memory image.
///
/// # Errors
///
/// Fails when the bundled font cannot be parsed or plotters rejects a
/// drawing operation.
pub fn render(distribution: &RatingDistribution) -> Result<RgbImage, ChartError> {
    register_embedded_font()?;

    let mut buffer = vec![0u8; (CHART_WIDTH * CHART_HEIGHT * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (CHART_WIDTH, CHART_HEIGHT))
            .into_drawing_area();
        draw(&root, distribution).map_err(|e| ChartError::Draw(e.to_string()))?;
        root.present().map_err(|e| ChartError::Draw(e.to_string()))?;
    }

    RgbImage::from_raw(CHART_WIDTH, CHART_HEIGHT, buffer).ok_or(ChartError::Buffer)
}

/// Renders the chart and writes it to `path` as PNG.
pub fn save_png(distribution: &RatingDistribution, path: &Path) -> Result<(), WriteError> {
    let image = render(distribution).map_err(|e| WriteError::serialization(path, e))?;
    image
        .save_with_format(path, ImageFormat::Png)
        .map_err(|e| match e {
            ImageError::IoError(io) => WriteError::from_io(path, io),
            other => WriteError::serialization(path, other),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn is_bar(pixel: &Rgb<u8>) -> bool {
        pixel.0 == [BAR_COLOR.0, BAR_COLOR.1, BAR_COLOR.2]
    }

    fn is_ink(pixel: &Rgb<u8>) -> bool {
        pixel.0.iter().all(|&c| c < 100)
    }

    /// Height in pixels of the tallest bar-colored column in `xs`.
    fn tallest_bar(img: &RgbImage, xs: std::ops::Range<u32>) -> u32 {
        xs.map(|x| (0..img.height()).filter(|&y| is_bar(img.get_pixel(x, y))).count() as u32)
            .max()
            .unwrap_or(0)
    }

    #[test]
    fn test_y_axis_leaves_headroom() {
        assert_eq!(y_axis_top(&RatingDistribution::default()), 1);
        assert_eq!(y_axis_top(&RatingDistribution::from([0, 0, 1, 0, 2])), 3);
        assert_eq!(y_axis_top(&RatingDistribution::from([0, 0, 0, 0, 100])), 110);
    }

    #[test]
    fn test_star_labels() {
        assert_eq!(star_label(&SegmentValue::CenterOf(3)), "3");
        assert_eq!(star_label(&SegmentValue::Last), "");
    }

    #[test]
    fn test_all_zero_distribution_renders_frame_and_title() {
        let img = render(&RatingDistribution::default()).unwrap();

        assert_eq!(img.dimensions(), (CHART_WIDTH, CHART_HEIGHT));
        assert!(!img.pixels().any(is_bar));
        // caption sits in the top band above the plot
        assert!((0..CHART_WIDTH).any(|x| (0..70).any(|y| is_ink(img.get_pixel(x, y)))));
    }

    #[test]
    fn test_bar_heights_follow_counts() {
        let img = render(&RatingDistribution::from([0, 0, 1, 0, 2])).unwrap();

        let one_star = tallest_bar(&img, 0..250);
        let three_star = tallest_bar(&img, 400..600);
        let five_star = tallest_bar(&img, 800..CHART_WIDTH);

        assert_eq!(one_star, 0);
        assert!(three_star > 0);
        assert!((f64::from(five_star) / f64::from(three_star) - 2.0).abs() < 0.05);
    }

    #[test]
    fn test_save_png_into_missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("chart.png");

        let err = save_png(&RatingDistribution::default(), &path).unwrap_err();
        assert!(matches!(err, WriteError::Io { .. }));
    }
}
