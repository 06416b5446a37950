//! Top-to-bottom flow layout onto A4 pages.
//!
//! `PageWriter` keeps a vertical cursor and appends content-stream operators
//! to the current page. Whenever a block does not fit above the bottom
//! margin a new page is started. `finish` assembles the lopdf document.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};

use super::fonts::{encode_win_ansi, text_width, wrap_text, Font};
use super::logo::LogoImage;
use super::GeneratorError;

/// A4 in points.
pub const PAGE_WIDTH: f64 = 595.28;
pub const PAGE_HEIGHT: f64 = 841.89;

const LEADING: f64 = 1.2;
const ASCENT: f64 = 0.8;
const LOGO_RESOURCE: &str = "Im1";

/// Millimetres to points.
pub fn mm(value: f64) -> f64 {
    value * 72.0 / 25.4
}

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

/// RGB colour, components in 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const BLACK: Color = Color::gray(0.0);
    pub const GREY: Color = Color::gray(0.5);

    pub const fn gray(level: f64) -> Self {
        Self {
            r: level,
            g: level,
            b: level,
        }
    }

    fn operands(&self) -> Vec<Object> {
        vec![real(self.r), real(self.g), real(self.b)]
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub width: f64,
    pub align: Align,
}

impl Column {
    pub fn left(width_mm: f64) -> Self {
        Self {
            width: mm(width_mm),
            align: Align::Left,
        }
    }

    pub fn right(width_mm: f64) -> Self {
        Self {
            width: mm(width_mm),
            align: Align::Right,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Cell {
    pub text: String,
    pub font: Font,
}

impl Cell {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font: Font::Regular,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font: Font::Bold,
        }
    }

    pub fn empty() -> Self {
        Self::new("")
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Padding {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct TableStyle {
    pub font_size: f64,
    pub padding: Padding,
    /// Fixed row height. Fixed rows are vertically centred and never wrap.
    pub row_height: Option<f64>,
    pub color: Color,
}

impl Default for TableStyle {
    fn default() -> Self {
        Self {
            font_size: 10.0,
            padding: Padding {
                top: 3.0,
                right: 6.0,
                bottom: 3.0,
                left: 6.0,
            },
            row_height: None,
            color: Color::BLACK,
        }
    }
}

/// Flow writer producing one or more A4 pages.
pub struct PageWriter {
    margin: f64,
    finished: Vec<Vec<Operation>>,
    current: Vec<Operation>,
    cursor: f64,
    image: Option<LogoImage>,
}

impl PageWriter {
    pub fn new(margin: f64) -> Self {
        Self {
            margin,
            finished: Vec::new(),
            current: Vec::new(),
            cursor: PAGE_HEIGHT - margin,
            image: None,
        }
    }

    pub fn content_width(&self) -> f64 {
        PAGE_WIDTH - 2.0 * self.margin
    }

    #[cfg(test)]
    fn page_count(&self) -> usize {
        self.finished.len() + 1
    }

    fn top(&self) -> f64 {
        PAGE_HEIGHT - self.margin
    }

    fn at_page_top(&self) -> bool {
        self.cursor >= self.top()
    }

    fn fits(&self, height: f64) -> bool {
        self.cursor - height >= self.margin
    }

    fn new_page(&mut self) {
        self.finished.push(std::mem::take(&mut self.current));
        self.cursor = self.top();
    }

    /// Start a new page unless `height` fits, or we are already at the top.
    fn ensure_space(&mut self, height: f64) {
        if !self.fits(height) && !self.at_page_top() {
            self.new_page();
        }
    }

    fn x_for(&self, left: f64, width: f64, text_width: f64, align: Align) -> f64 {
        match align {
            Align::Left => left,
            Align::Center => left + (width - text_width) / 2.0,
            Align::Right => left + width - text_width,
        }
    }

    fn draw_text(&mut self, text: &str, font: Font, size: f64, x: f64, baseline: f64, color: Color) {
        if text.is_empty() {
            return;
        }
        self.current.extend([
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![Object::Name(font.resource_name().as_bytes().to_vec()), real(size)],
            ),
            Operation::new("rg", color.operands()),
            Operation::new("Td", vec![real(x), real(baseline)]),
            Operation::new(
                "Tj",
                vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
            ),
            Operation::new("ET", vec![]),
        ]);
    }

    /// Vertical gap. A gap that does not fit moves to the top of a new page.
    pub fn spacer(&mut self, height: f64) {
        if self.fits(height) {
            self.cursor -= height;
        } else {
            self.new_page();
        }
    }

    /// Wrapped paragraph across the full content width.
    pub fn paragraph(&mut self, text: &str, font: Font, size: f64, align: Align, color: Color) {
        let line_height = size * LEADING;
        let width = self.content_width();
        for line in wrap_text(text, font, size, width) {
            self.ensure_space(line_height);
            let x = self.x_for(self.margin, width, text_width(&line, font, size), align);
            let baseline = self.cursor - size * ASCENT;
            self.draw_text(&line, font, size, x, baseline, color);
            self.cursor -= line_height;
        }
    }

    /// Full-width horizontal line.
    pub fn rule(&mut self, thickness: f64, color: Color) {
        self.ensure_space(thickness);
        let y = self.cursor - thickness / 2.0;
        let right = self.margin + self.content_width();
        self.current.extend([
            Operation::new("q", vec![]),
            Operation::new("RG", color.operands()),
            Operation::new("w", vec![real(thickness)]),
            Operation::new("m", vec![real(self.margin), real(y)]),
            Operation::new("l", vec![real(right), real(y)]),
            Operation::new("S", vec![]),
            Operation::new("Q", vec![]),
        ]);
        self.cursor -= thickness;
    }

    /// Horizontally centred image stretched to `width` x `height` points.
    pub fn centered_image(&mut self, image: LogoImage, width: f64, height: f64) {
        self.ensure_space(height);
        let x = self.margin + (self.content_width() - width) / 2.0;
        let y = self.cursor - height;
        self.current.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![real(width), real(0.0), real(0.0), real(height), real(x), real(y)],
            ),
            Operation::new("Do", vec![Object::Name(LOGO_RESOURCE.as_bytes().to_vec())]),
            Operation::new("Q", vec![]),
        ]);
        self.image = Some(image);
        self.cursor -= height;
    }

    /// Borderless table starting at the left margin.
    ///
    /// A wrapped row moves to the next page when it does not fit. A row taller
    /// than a whole page is split line by line across pages.
    pub fn table(&mut self, columns: &[Column], rows: &[Vec<Cell>], style: &TableStyle) {
        let size = style.font_size;
        let pad = style.padding;

        for row in rows {
            let cells: Vec<(&Column, &Cell, Vec<String>)> = columns
                .iter()
                .zip(row)
                .map(|(column, cell)| {
                    let lines = match style.row_height {
                        Some(_) => vec![cell.text.clone()],
                        None => wrap_text(
                            &cell.text,
                            cell.font,
                            size,
                            column.width - pad.left - pad.right,
                        ),
                    };
                    (column, cell, lines)
                })
                .collect();

            match style.row_height {
                Some(fixed) => {
                    self.ensure_space(fixed);
                    let baseline = self.cursor - (fixed + size * 0.7) / 2.0;
                    self.draw_row_lines(&cells, 0, 1, baseline, style);
                    self.cursor -= fixed;
                }
                None => self.flow_row(&cells, style),
            }
        }
    }

    fn flow_row(&mut self, cells: &[(&Column, &Cell, Vec<String>)], style: &TableStyle) {
        let line_height = style.font_size * LEADING;
        let pad = style.padding;
        let vertical_pad = pad.top + pad.bottom;
        let page_capacity = self.top() - self.margin;
        let total = cells.iter().map(|(_, _, lines)| lines.len()).max().unwrap_or(1);

        let mut first = 0;
        while first < total {
            let remaining = total - first;
            let needed = remaining as f64 * line_height + vertical_pad;

            let count = if self.fits(needed) {
                remaining
            } else if !self.at_page_top() && needed <= page_capacity {
                self.new_page();
                continue;
            } else {
                let available = self.cursor - self.margin - vertical_pad;
                let fit = (available / line_height).floor().max(0.0) as usize;
                match fit {
                    0 if !self.at_page_top() => {
                        self.new_page();
                        continue;
                    }
                    0 => 1,
                    fit => fit.min(remaining),
                }
            };

            let baseline = self.cursor - pad.top - style.font_size * ASCENT;
            self.draw_row_lines(cells, first, count, baseline, style);
            self.cursor -= count as f64 * line_height + vertical_pad;

            first += count;
            if first < total {
                self.new_page();
            }
        }
    }

    /// Draw lines `first..first + count` of every cell, starting at `baseline`.
    fn draw_row_lines(
        &mut self,
        cells: &[(&Column, &Cell, Vec<String>)],
        first: usize,
        count: usize,
        baseline: f64,
        style: &TableStyle,
    ) {
        let size = style.font_size;
        let line_height = size * LEADING;
        let pad = style.padding;

        let mut left = self.margin;
        for (column, cell, lines) in cells {
            let inner = column.width - pad.left - pad.right;
            for (i, line) in lines.iter().skip(first).take(count).enumerate() {
                let x = self.x_for(
                    left + pad.left,
                    inner,
                    text_width(line, cell.font, size),
                    column.align,
                );
                self.draw_text(
                    line,
                    cell.font,
                    size,
                    x,
                    baseline - i as f64 * line_height,
                    style.color,
                );
            }
            left += column.width;
        }
    }

    /// Bordered full-width box holding a bold heading followed by `body`.
    /// A box taller than the remaining space continues on the next page.
    pub fn boxed_paragraph(&mut self, heading: &str, body: &str, size: f64, padding: f64) {
        let line_height = size * LEADING;
        let width = self.content_width();
        let mut lines = vec![(heading.to_string(), Font::Bold)];
        lines.extend(
            wrap_text(body, Font::Regular, size, width - 2.0 * padding)
                .into_iter()
                .map(|line| (line, Font::Regular)),
        );

        let mut remaining = &lines[..];
        while !remaining.is_empty() {
            let available = self.cursor - self.margin - 2.0 * padding;
            let mut fit = (available / line_height).floor() as usize;
            if fit == 0 {
                if !self.at_page_top() {
                    self.new_page();
                    continue;
                }
                fit = 1;
            }

            let (chunk, rest) = remaining.split_at(fit.min(remaining.len()));
            let height = chunk.len() as f64 * line_height + 2.0 * padding;
            self.current.extend([
                Operation::new("q", vec![]),
                Operation::new("RG", Color::BLACK.operands()),
                Operation::new("w", vec![real(0.5)]),
                Operation::new(
                    "re",
                    vec![
                        real(self.margin),
                        real(self.cursor - height),
                        real(width),
                        real(height),
                    ],
                ),
                Operation::new("S", vec![]),
                Operation::new("Q", vec![]),
            ]);

            let first_baseline = self.cursor - padding - size * ASCENT;
            for (i, (line, font)) in chunk.iter().enumerate() {
                let baseline = first_baseline - i as f64 * line_height;
                self.draw_text(line, *font, size, self.margin + padding, baseline, Color::BLACK);
            }

            self.cursor -= height;
            remaining = rest;
            if !remaining.is_empty() {
                self.new_page();
            }
        }
    }

    /// Assemble the PDF. Output carries no timestamps or random IDs.
    pub fn finish(mut self) -> Result<Vec<u8>, GeneratorError> {
        self.finished.push(std::mem::take(&mut self.current));

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let regular_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => Font::Regular.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        let bold_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => Font::Bold.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });

        let mut resources = dictionary! {
            "Font" => dictionary! {
                Font::Regular.resource_name() => regular_id,
                Font::Bold.resource_name() => bold_id,
            },
        };
        if let Some(image) = &self.image {
            let image_id = doc.add_object(image.to_pdf_stream());
            resources.set("XObject", dictionary! { LOGO_RESOURCE => image_id });
        }
        let resources_id = doc.add_object(resources);

        let mut kids: Vec<Object> = Vec::with_capacity(self.finished.len());
        for operations in self.finished {
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                real(PAGE_WIDTH),
                real(PAGE_HEIGHT),
            ],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)?;
        Ok(buffer)
    }
}
