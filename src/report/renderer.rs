//! Table rasterization.
//!
//! The result grid is laid out in points, written as an SVG document,
//! rasterized with resvg at the style's DPI and encoded as PNG. The image is
//! cropped to the table plus the style margin.

use crate::error::{Result, StatsError};
use crate::models::ResultTable;
use crate::report::style::{Color, Orientation, TableStyle};
use resvg::tiny_skia::{self, Pixmap, Transform};
use resvg::usvg::{Options, Tree};
use tracing::{debug, warn};

/// Label of the top-left header cell.
pub const CORNER_LABEL: &str = "Platform/Metric";

/// Average glyph advance as a fraction of the font size.
const CHAR_WIDTH: f32 = 0.6;
const BOLD_CHAR_WIDTH: f32 = 0.66;
/// Distance from the vertical center of a row to the text baseline, as a
/// fraction of the font size.
const BASELINE_SHIFT: f32 = 0.35;

/// A grid of display strings: one header row plus data rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Grid {
    /// Lay out a result table in the requested orientation.
    pub fn from_table(table: &ResultTable, orientation: Orientation) -> Self {
        match orientation {
            Orientation::MetricsByRow => {
                let mut header = vec![CORNER_LABEL.to_string()];
                header.extend(table.column_labels().into_iter().map(String::from));

                let rows = table
                    .rows
                    .iter()
                    .map(|row| {
                        let mut cells = vec![row.metric.label().to_string()];
                        cells.extend(row.cells.iter().map(ToString::to_string));
                        cells
                    })
                    .collect();

                Self { header, rows }
            }
            Orientation::ChannelsByRow => {
                let mut header = vec![CORNER_LABEL.to_string()];
                header.extend(table.rows.iter().map(|r| r.metric.label().to_string()));

                let rows = table
                    .columns
                    .iter()
                    .enumerate()
                    .map(|(col, partition)| {
                        let mut cells = vec![partition.label().to_string()];
                        cells.extend(
                            table
                                .rows
                                .iter()
                                .map(|r| r.cells.get(col).map(ToString::to_string).unwrap_or_default()),
                        );
                        cells
                    })
                    .collect();

                Self { header, rows }
            }
        }
    }

    pub fn column_count(&self) -> usize {
        self.rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.header.len()))
            .max()
            .unwrap_or(0)
    }
}

/// Geometry of the rendered table, in points.
#[derive(Debug, Clone, PartialEq)]
pub struct TableLayout {
    pub column_widths: Vec<f32>,
    pub row_height: f32,
    pub margin: f32,
    pub width: f32,
    pub height: f32,
}

impl TableLayout {
    /// Size columns to fit their widest cell.
    pub fn compute(grid: &Grid, style: &TableStyle) -> Self {
        let columns = grid.column_count();
        let mut column_widths = vec![0.0f32; columns];

        let header_advance = if style.header.bold {
            BOLD_CHAR_WIDTH
        } else {
            CHAR_WIDTH
        };
        for (i, text) in grid.header.iter().enumerate() {
            column_widths[i] = column_widths[i].max(text_width(text, style.font_size, header_advance));
        }
        for row in &grid.rows {
            for (i, text) in row.iter().enumerate() {
                column_widths[i] = column_widths[i].max(text_width(text, style.font_size, CHAR_WIDTH));
            }
        }
        for width in &mut column_widths {
            *width += 2.0 * style.cell_padding;
        }

        let row_height = style.font_size * style.row_height;
        let table_width: f32 = column_widths.iter().sum();
        let table_height = row_height * (grid.rows.len() + 1) as f32;

        Self {
            column_widths,
            row_height,
            margin: style.margin,
            width: table_width + 2.0 * style.margin,
            height: table_height + 2.0 * style.margin,
        }
    }

    /// Left edge of a column.
    pub fn column_x(&self, column: usize) -> f32 {
        self.margin + self.column_widths.iter().take(column).sum::<f32>()
    }

    /// Top edge of a row; row 0 is the header.
    pub fn row_y(&self, row: usize) -> f32 {
        self.margin + self.row_height * row as f32
    }

    /// Size of the raster in device pixels.
    pub fn pixel_size(&self, style: &TableStyle) -> (u32, u32) {
        let scale = style.scale();
        (
            ((self.width * scale).ceil() as u32).max(1),
            ((self.height * scale).ceil() as u32).max(1),
        )
    }
}

fn text_width(text: &str, font_size: f32, advance: f32) -> f32 {
    text.chars().count() as f32 * font_size * advance
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// What to paint in one cell.
struct CellPaint<'a> {
    text: &'a str,
    background: Option<Color>,
    text_color: Color,
    bold: bool,
}

fn write_cell(
    svg: &mut String,
    layout: &TableLayout,
    style: &TableStyle,
    (row, column): (usize, usize),
    paint: &CellPaint<'_>,
) {
    let x = layout.column_x(column);
    let y = layout.row_y(row);
    let w = layout.column_widths[column];
    let h = layout.row_height;

    let (fill, fill_opacity) = match paint.background {
        Some(color) => (color.svg_rgb(), color.opacity()),
        None => ("none".to_string(), 1.0),
    };
    svg.push_str(&format!(
        "  <rect x='{x:.2}' y='{y:.2}' width='{w:.2}' height='{h:.2}' fill='{fill}' fill-opacity='{fill_opacity:.3}' stroke='{stroke}' stroke-opacity='{stroke_opacity:.3}' stroke-width='{sw:.2}'/>\n",
        stroke = style.border_color.svg_rgb(),
        stroke_opacity = style.border_color.opacity(),
        sw = style.border_width,
    ));

    if paint.text.is_empty() {
        return;
    }
    let weight = if paint.bold { "bold" } else { "normal" };
    svg.push_str(&format!(
        "  <text x='{cx:.2}' y='{cy:.2}' text-anchor='middle' font-size='{fs:.2}' font-weight='{weight}' fill='{color}' fill-opacity='{opacity:.3}'>{text}</text>\n",
        cx = x + w / 2.0,
        cy = y + h / 2.0 + style.font_size * BASELINE_SHIFT,
        fs = style.font_size,
        color = paint.text_color.svg_rgb(),
        opacity = paint.text_color.opacity(),
        text = escape_xml(paint.text),
    ));
}

/// Build the SVG document for a grid. Units are points.
pub fn render_svg(grid: &Grid, style: &TableStyle) -> (String, TableLayout) {
    let layout = TableLayout::compute(grid, style);
    let mut svg = String::new();

    svg.push_str(&format!(
        "<svg xmlns='http://www.w3.org/2000/svg' width='{w:.2}' height='{h:.2}' viewBox='0 0 {w:.2} {h:.2}' font-family='{family}'>\n",
        w = layout.width,
        h = layout.height,
        family = escape_xml(&style.font_family),
    ));
    svg.push_str(&format!(
        "  <rect x='0' y='0' width='{:.2}' height='{:.2}' fill='{}' fill-opacity='{:.3}'/>\n",
        layout.width,
        layout.height,
        style.page_background.svg_rgb(),
        style.page_background.opacity(),
    ));

    let columns = layout.column_widths.len();
    for column in 0..columns {
        let text = grid.header.get(column).map(String::as_str).unwrap_or("");
        let paint = CellPaint {
            text,
            background: Some(style.header.background),
            text_color: style.header.text_color,
            bold: style.header.bold,
        };
        write_cell(&mut svg, &layout, style, (0, column), &paint);
    }

    for (index, row) in grid.rows.iter().enumerate() {
        let row_style = style.row_style(index);
        for column in 0..columns {
            let text = row.get(column).map(String::as_str).unwrap_or("");
            let paint = CellPaint {
                text,
                background: row_style.background,
                text_color: row_style.text_color,
                bold: false,
            };
            write_cell(&mut svg, &layout, style, (index + 1, column), &paint);
        }
    }

    svg.push_str("</svg>\n");
    (svg, layout)
}

/// Rasterize an SVG document and encode it as PNG at the style's DPI.
pub fn rasterize_png(svg: &str, layout: &TableLayout, style: &TableStyle) -> Result<Vec<u8>> {
    let mut options = Options::default();
    options.font_family = style.primary_family().to_string();
    let fontdb = options.fontdb_mut();
    fontdb.load_system_fonts();
    for dir in &style.font_dirs {
        fontdb.load_fonts_dir(dir);
    }
    debug!("Loaded {} font faces", fontdb.len());
    if fontdb.len() == 0 {
        warn!("No fonts available; table text will not be drawn");
    }

    let tree = Tree::from_str(svg, &options).map_err(|e| StatsError::Svg(e.to_string()))?;

    let (width, height) = layout.pixel_size(style);
    let mut pixmap = Pixmap::new(width, height).ok_or(StatsError::Pixmap { width, height })?;
    let bg = style.page_background;
    pixmap.fill(tiny_skia::Color::from_rgba8(bg.r, bg.g, bg.b, bg.a));

    let scale = style.scale();
    resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());

    debug!("Rasterized table at {}x{} px ({} dpi)", width, height, style.dpi);
    encode_png(&pixmap, style.dpi)
}

fn encode_png(pixmap: &Pixmap, dpi: f32) -> Result<Vec<u8>> {
    let mut rgba = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }

    // pHYs stores pixels per metre.
    let ppm = (f64::from(dpi) / 0.0254).round() as u32;

    let mut out = Vec::new();
    let mut encoder = png::Encoder::new(&mut out, pixmap.width(), pixmap.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_pixel_dims(Some(png::PixelDimensions {
        xppu: ppm,
        yppu: ppm,
        unit: png::Unit::Meter,
    }));
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&rgba)?;
    writer.finish()?;

    Ok(out)
}

/// Render a result table to a PNG image.
pub fn render_table_png(table: &ResultTable, style: &TableStyle) -> Result<Vec<u8>> {
    let grid = Grid::from_table(table, style.orientation);
    let (svg, layout) = render_svg(&grid, style);
    rasterize_png(&svg, &layout, style)
}
