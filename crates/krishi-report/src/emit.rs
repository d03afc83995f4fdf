//! The PDF 1.4 emitter: page layout, content streams, xref table.
//!
//! Coordinates are PDF points with the origin at the bottom-left of an A4
//! page. Text goes out as WinAnsi bytes; characters outside that range
//! render as `?`.

use crate::TableReport;

// ─── Page geometry ───────────────────────────────────────────────────────────

const PAGE_WIDTH: u32 = 595;
const PAGE_HEIGHT: u32 = 842;
const MARGIN: u32 = 40;

const TITLE_Y: u32 = 800;
const SUBTITLE_Y: u32 = 782;
const HEADER_Y: u32 = 756;
const FIRST_ROW_Y: u32 = 738;
const ROW_HEIGHT: u32 = 16;
const FOOTER_Y: u32 = 30;

const TITLE_SIZE: u32 = 14;
const BODY_SIZE: u32 = 9;
const FOOTER_SIZE: u32 = 8;
const CELL_GAP: u32 = 6;

const FONT_REGULAR: &str = "F1";
const FONT_BOLD: &str = "F2";

pub(crate) fn page_count(rows: usize, rows_per_page: usize) -> usize {
  if rows == 0 { 1 } else { rows.div_ceil(rows_per_page) }
}

// ─── Document assembly ───────────────────────────────────────────────────────

pub(crate) fn render(report: &TableReport) -> Vec<u8> {
  let rows_per_page = report.rows_per_page.max(1);
  let pages = page_count(report.rows.len(), rows_per_page);
  // Objects: catalog, page tree, then a page + content pair per page,
  // then the two fonts.
  let font_regular = 3 + 2 * pages;
  let font_bold = font_regular + 1;

  let mut writer = Writer::new();
  writer.dict_object(1, "<< /Type /Catalog /Pages 2 0 R >>");

  let kids = (0..pages)
    .map(|page| format!("{} 0 R", 3 + 2 * page))
    .collect::<Vec<_>>()
    .join(" ");
  writer.dict_object(
    2,
    &format!("<< /Type /Pages /Kids [{kids}] /Count {pages} >>"),
  );

  for page in 0..pages {
    let page_id = 3 + 2 * page;
    let content_id = page_id + 1;
    writer.dict_object(
      page_id,
      &format!(
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
         /Resources << /Font << /F1 {font_regular} 0 R /F2 {font_bold} 0 R >> >> \
         /Contents {content_id} 0 R >>"
      ),
    );
    writer.stream_object(content_id, &page_content(report, page, pages, rows_per_page));
  }

  writer.dict_object(
    font_regular,
    "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>",
  );
  writer.dict_object(
    font_bold,
    "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>",
  );

  writer.finish()
}

fn page_content(
  report: &TableReport,
  page: usize,
  pages: usize,
  rows_per_page: usize,
) -> Vec<u8> {
  let mut buf = Vec::new();

  text(&mut buf, FONT_BOLD, TITLE_SIZE, MARGIN, TITLE_Y, &report.title);
  if let Some(subtitle) = &report.subtitle {
    text(&mut buf, FONT_REGULAR, BODY_SIZE, MARGIN, SUBTITLE_Y, subtitle);
  }

  let mut x = MARGIN;
  for column in &report.columns {
    text(
      &mut buf,
      FONT_BOLD,
      BODY_SIZE,
      x,
      HEADER_Y,
      &fit(&column.header, column.width),
    );
    x += column.width;
  }
  rule(&mut buf, MARGIN, PAGE_WIDTH - MARGIN, HEADER_Y - 5);

  let start = page * rows_per_page;
  let end = (start + rows_per_page).min(report.rows.len());
  for (line, row) in report.rows[start..end].iter().enumerate() {
    let y = FIRST_ROW_Y - line as u32 * ROW_HEIGHT;
    let mut x = MARGIN;
    for (column, cell) in report.columns.iter().zip(row) {
      text(&mut buf, FONT_REGULAR, BODY_SIZE, x, y, &fit(cell, column.width));
      x += column.width;
    }
  }

  let footer = format!("Page {} of {}", page + 1, pages);
  text(
    &mut buf,
    FONT_REGULAR,
    FOOTER_SIZE,
    PAGE_WIDTH / 2 - 20,
    FOOTER_Y,
    &footer,
  );

  buf
}

// ─── Content-stream operators ────────────────────────────────────────────────

fn text(buf: &mut Vec<u8>, font: &str, size: u32, x: u32, y: u32, s: &str) {
  buf.extend_from_slice(format!("BT /{font} {size} Tf {x} {y} Td (").as_bytes());
  push_text(buf, s);
  buf.extend_from_slice(b") Tj ET\n");
}

fn rule(buf: &mut Vec<u8>, x0: u32, x1: u32, y: u32) {
  buf.extend_from_slice(format!("0.5 w {x0} {y} m {x1} {y} l S\n").as_bytes());
}

/// Append `s` as PDF string bytes: delimiters backslash-escaped, control
/// characters flattened to spaces, non-WinAnsi characters replaced.
fn push_text(buf: &mut Vec<u8>, s: &str) {
  for c in s.chars() {
    match c {
      '(' | ')' | '\\' => {
        buf.push(b'\\');
        buf.push(c as u8);
      }
      c if (c as u32) < 0x20 => buf.push(b' '),
      c if (c as u32) <= 0xFF => buf.push(c as u8),
      _ => buf.push(b'?'),
    }
  }
}

/// Truncate to what fits the column at body size, roughly two characters
/// per nine points of width.
fn fit(s: &str, width: u32) -> String {
  let max = (width.saturating_sub(CELL_GAP) as usize * 2 / BODY_SIZE as usize).max(1);
  if s.chars().count() <= max {
    return s.to_owned();
  }
  let kept: String = s.chars().take(max.saturating_sub(3)).collect();
  format!("{kept}...")
}

// ─── Low-level writer ────────────────────────────────────────────────────────

/// Accumulates the file and records each object's byte offset for the
/// xref table.
struct Writer {
  buf:     Vec<u8>,
  offsets: Vec<usize>,
}

impl Writer {
  fn new() -> Self {
    let mut buf = Vec::new();
    buf.extend_from_slice(b"%PDF-1.4\n");
    // Binary marker so transports treat the file as non-text.
    buf.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");
    Self {
      buf,
      offsets: Vec::new(),
    }
  }

  fn begin_object(&mut self, id: usize) {
    self.offsets.push(self.buf.len());
    self.buf.extend_from_slice(format!("{id} 0 obj\n").as_bytes());
  }

  fn dict_object(&mut self, id: usize, body: &str) {
    self.begin_object(id);
    self.buf.extend_from_slice(body.as_bytes());
    self.buf.extend_from_slice(b"\nendobj\n");
  }

  fn stream_object(&mut self, id: usize, content: &[u8]) {
    self.begin_object(id);
    self
      .buf
      .extend_from_slice(format!("<< /Length {} >>\nstream\n", content.len()).as_bytes());
    self.buf.extend_from_slice(content);
    self.buf.extend_from_slice(b"\nendstream\nendobj\n");
  }

  fn finish(mut self) -> Vec<u8> {
    let xref_offset = self.buf.len();
    let size = self.offsets.len() + 1;
    self
      .buf
      .extend_from_slice(format!("xref\n0 {size}\n").as_bytes());
    // Entries are exactly 20 bytes each, trailing space then newline.
    self.buf.extend_from_slice(b"0000000000 65535 f \n");
    for offset in &self.offsets {
      self
        .buf
        .extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    self.buf.extend_from_slice(
      format!(
        "trailer\n<< /Size {size} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n"
      )
      .as_bytes(),
    );
    self.buf
  }
}
