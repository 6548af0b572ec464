use printpdf::{
    image_crate, lopdf, BuiltinFont, Image, ImageTransform, IndirectFontRef, Mm, OffsetDateTime,
    PdfDocument, PdfDocumentReference, PdfLayerReference,
};

use super::{DocumentRenderer, ReportElement};
use crate::error::{ReviewError, Result};

const LETTER_PT: (f32, f32) = (612.0, 792.0);
const LAYER: &str = "Layer 1";
/// Written into the trailer and metadata in place of per-run random ids.
const DOCUMENT_ID: &str = "holter-review-report-0000000000";
/// Mean Helvetica advance as a fraction of the font size, rounded up.
const GLYPH_EM: f32 = 0.6;
const COLUMN_GAP: f32 = 8.0;

fn mm(pt: f32) -> Mm {
    Mm(pt * 25.4 / 72.0)
}

fn pdf_err(err: impl std::fmt::Debug) -> ReviewError {
    ReviewError::Report(format!("pdf: {:?}", err))
}

/// Built-in fonts only cover WinAnsi; anything else would be dropped silently.
fn win_ansi(ch: char) -> char {
    let mut buf = [0u8; 4];
    let encoded = lopdf::Document::encode_text(Some("WinAnsiEncoding"), ch.encode_utf8(&mut buf));
    if encoded.is_empty() {
        '?'
    } else {
        ch
    }
}

/// Clip `text` to roughly `width` points at `size`, marking the cut with "...".
fn fit_text(text: &str, width: f32, size: f32) -> String {
    let max_chars = (width / (size * GLYPH_EM)).floor().max(4.0) as usize;
    let mut fitted: String = text.chars().map(win_ansi).collect();
    if fitted.chars().count() > max_chars {
        fitted = fitted.chars().take(max_chars - 3).collect();
        fitted.push_str("...");
    }
    fitted
}

/// printpdf draws a fresh trailer id on every save; replace it with a fixed one.
fn pin_trailer_id(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut parsed = lopdf::Document::load_mem(bytes).map_err(pdf_err)?;
    let id = lopdf::Object::String(DOCUMENT_ID.as_bytes().to_vec(), lopdf::StringFormat::Literal);
    parsed
        .trailer
        .set("ID", lopdf::Object::Array(vec![id.clone(), id]));
    let mut out = Vec::new();
    parsed.save_to(&mut out).map_err(pdf_err)?;
    Ok(out)
}

/// Lays report elements top to bottom on US Letter pages with Helvetica text.
#[derive(Debug, Clone)]
pub struct PdfRenderer {
    pub page_size: (f32, f32),
    pub margin: f32,
    pub title_size: f32,
    pub body_size: f32,
    pub caption_size: f32,
    /// Left edge of each table column, relative to the margin.
    pub column_offsets: [f32; 3],
}

impl Default for PdfRenderer {
    fn default() -> Self {
        Self {
            page_size: LETTER_PT,
            margin: 72.0,
            title_size: 18.0,
            body_size: 10.0,
            caption_size: 9.0,
            column_offsets: [0.0, 110.0, 220.0],
        }
    }
}

struct Page<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    size: (f32, f32),
    margin: f32,
    /// Distance of the write position from the page bottom, in points.
    y: f32,
}

impl<'a> Page<'a> {
    fn reserve(&mut self, height: f32) {
        let fits_fresh_page = height <= self.size.1 - 2.0 * self.margin;
        if self.y - height < self.margin && fits_fresh_page {
            let (page, layer) = self.doc.add_page(mm(self.size.0), mm(self.size.1), LAYER);
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = self.size.1 - self.margin;
        }
    }

    fn text(&mut self, text: &str, size: f32, x: f32, font: &IndirectFontRef) {
        self.layer
            .use_text(text, size, mm(self.margin + x), mm(self.y - size), font);
    }
}

impl DocumentRenderer for PdfRenderer {
    fn render(&mut self, title: &str, elements: &[ReportElement]) -> Result<Vec<u8>> {
        let (doc, page, layer) =
            PdfDocument::new(title, mm(self.page_size.0), mm(self.page_size.1), LAYER);
        let doc = doc
            .with_creation_date(OffsetDateTime::UNIX_EPOCH)
            .with_mod_date(OffsetDateTime::UNIX_EPOCH)
            .with_metadata_date(OffsetDateTime::UNIX_EPOCH)
            .with_document_id(DOCUMENT_ID.to_string());
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(pdf_err)?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(pdf_err)?;
        let mut cursor = Page {
            doc: &doc,
            layer: doc.get_page(page).get_layer(layer),
            size: self.page_size,
            margin: self.margin,
            y: self.page_size.1 - self.margin,
        };

        for element in elements {
            match element {
                ReportElement::Title(text) => {
                    let line = self.title_size * 1.2;
                    cursor.reserve(line);
                    let text = fit_text(text, self.text_width(), self.title_size);
                    cursor.text(&text, self.title_size, 0.0, &bold);
                    cursor.y -= line;
                }
                ReportElement::Spacer(height) => {
                    cursor.y -= height;
                }
                ReportElement::Table { header, rows } => {
                    let line = self.body_size * 1.4;
                    cursor.reserve(line);
                    self.table_row(&mut cursor, header, &bold);
                    cursor.y -= line;
                    for row in rows {
                        cursor.reserve(line);
                        self.table_row(&mut cursor, row, &regular);
                        cursor.y -= line;
                    }
                }
                ReportElement::Figure {
                    title,
                    png,
                    pixel_size,
                    width,
                    height,
                } => {
                    let (width, height) = (*width, *height);
                    let caption = self.caption_size * 1.4;
                    cursor.reserve(caption + height);
                    let caption_text = fit_text(title, self.text_width(), self.caption_size);
                    cursor.text(&caption_text, self.caption_size, 0.0, &regular);
                    cursor.y -= caption;
                    let decoded = image_crate::load_from_memory(png)
                        .map_err(|e| ReviewError::Report(format!("figure '{}': {}", title, e)))?;
                    let (px_w, px_h) = (pixel_size.0.max(1) as f32, pixel_size.1.max(1) as f32);
                    Image::from_dynamic_image(&decoded).add_to_layer(
                        cursor.layer.clone(),
                        ImageTransform {
                            translate_x: Some(mm(self.margin)),
                            translate_y: Some(mm(cursor.y - height)),
                            scale_x: Some(width / px_w),
                            scale_y: Some(height / px_h),
                            // one pixel per point before scaling
                            dpi: Some(72.0),
                            ..Default::default()
                        },
                    );
                    cursor.y -= height;
                }
            }
        }

        let bytes = doc.save_to_bytes().map_err(pdf_err)?;
        pin_trailer_id(&bytes)
    }
}

impl PdfRenderer {
    fn text_width(&self) -> f32 {
        self.page_size.0 - 2.0 * self.margin
    }

    /// Width available to column `i`; the last column runs to the right margin.
    fn column_width(&self, i: usize) -> f32 {
        match self.column_offsets.get(i + 1) {
            Some(next) => next - self.column_offsets[i] - COLUMN_GAP,
            None => self.text_width() - self.column_offsets[i],
        }
    }

    fn table_row(&self, cursor: &mut Page<'_>, cells: &[String], font: &IndirectFontRef) {
        for (i, (cell, offset)) in cells.iter().zip(self.column_offsets).enumerate() {
            let text = fit_text(cell, self.column_width(i), self.body_size);
            cursor.text(&text, self.body_size, offset, font);
        }
    }
}
