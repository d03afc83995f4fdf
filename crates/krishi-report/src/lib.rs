//! Tabular PDF reports for the Krishi portal.
//!
//! A hand-rolled minimal PDF 1.4 emitter: one table, fixed rows per page,
//! Helvetica only, WinAnsi text. Pure synchronous; no HTTP or database
//! dependencies.
//!
//! # Quick start
//!
//! ```
//! use krishi_report::{Column, TableReport};
//!
//! let mut report = TableReport::new("Demo", vec![Column::new("Name", 200)]);
//! report.rows.push(vec!["Asha Devi".into()]);
//! let pdf = report.render();
//! assert!(pdf.starts_with(b"%PDF-1.4"));
//! ```

mod emit;
mod register;

pub use register::farmer_register;

/// Rows drawn per page before a page break.
pub const DEFAULT_ROWS_PER_PAGE: usize = 40;

// ─── Public types ────────────────────────────────────────────────────────────

/// One table column: a header label and a width in points.
///
/// Cell text that does not fit the width is truncated with `...`.
#[derive(Debug, Clone)]
pub struct Column {
  pub header: String,
  pub width:  u32,
}

impl Column {
  pub fn new(header: impl Into<String>, width: u32) -> Self {
    Self {
      header: header.into(),
      width,
    }
  }
}

/// A one-table report. Rows render in order, [`Self::rows_per_page`] per
/// page, with the title and column headers repeated on every page.
#[derive(Debug, Clone)]
pub struct TableReport {
  pub title:         String,
  pub subtitle:      Option<String>,
  pub columns:       Vec<Column>,
  pub rows:          Vec<Vec<String>>,
  pub rows_per_page: usize,
}

impl TableReport {
  pub fn new(title: impl Into<String>, columns: Vec<Column>) -> Self {
    Self {
      title: title.into(),
      subtitle: None,
      columns,
      rows: Vec::new(),
      rows_per_page: DEFAULT_ROWS_PER_PAGE,
    }
  }

  /// Number of pages [`Self::render`] will emit. Never zero — an empty
  /// report still renders its header page.
  pub fn page_count(&self) -> usize {
    emit::page_count(self.rows.len(), self.rows_per_page.max(1))
  }

  /// Render the document as PDF 1.4 bytes.
  pub fn render(&self) -> Vec<u8> {
    emit::render(self)
  }
}

// ─── Document structure tests ────────────────────────────────────────────────

#[cfg(test)]
mod structure_tests {
  use super::*;

  fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
  }

  fn count(haystack: &[u8], needle: &[u8]) -> usize {
    haystack.windows(needle.len()).filter(|w| *w == needle).count()
  }

  fn find_last(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).rposition(|w| w == needle)
  }

  fn sample(rows: usize) -> TableReport {
    let mut report = TableReport::new("Farmer Register", vec![
      Column::new("Name", 200),
      Column::new("Village", 150),
    ]);
    for i in 0..rows {
      report
        .rows
        .push(vec![format!("Farmer {i}"), "Rampur".into()]);
    }
    report
  }

  #[test]
  fn envelope_and_catalog() {
    let pdf = sample(3).render();
    assert!(pdf.starts_with(b"%PDF-1.4"));
    assert!(pdf.ends_with(b"%%EOF\n"));
    assert!(contains(&pdf, b"/Type /Catalog"));
    assert!(contains(&pdf, b"/BaseFont /Helvetica"));
    assert!(contains(&pdf, b"(Farmer Register)"));
  }

  #[test]
  fn empty_report_renders_one_page() {
    let pdf = sample(0).render();
    assert!(contains(&pdf, b"/Count 1"));
    assert_eq!(count(&pdf, b"/Type /Page "), 1);
    assert!(contains(&pdf, b"(Page 1 of 1)"));
  }

  #[test]
  fn pagination_splits_at_rows_per_page() {
    assert_eq!(sample(40).page_count(), 1);
    assert_eq!(sample(41).page_count(), 2);

    let pdf = sample(41).render();
    assert!(contains(&pdf, b"/Count 2"));
    assert_eq!(count(&pdf, b"/Type /Page "), 2);
    assert!(contains(&pdf, b"(Page 2 of 2)"));
    // Row 41 lands on the second page.
    assert!(contains(&pdf, b"(Farmer 40)"));
  }

  #[test]
  fn delimiters_in_cells_are_escaped() {
    let mut report = sample(0);
    report
      .rows
      .push(vec!["Irrigation (drip)".into(), "back\\slash".into()]);
    let pdf = report.render();
    assert!(contains(&pdf, b"(Irrigation \\(drip\\))"));
    assert!(contains(&pdf, b"(back\\\\slash)"));
  }

  #[test]
  fn long_cells_are_truncated() {
    let mut report = TableReport::new("Report", vec![Column::new("Name", 45)]);
    report
      .rows
      .push(vec!["An unreasonably long farmer name".into()]);
    let pdf = report.render();
    assert!(!contains(&pdf, b"unreasonably long farmer name"));
    assert!(contains(&pdf, b"...)"));
  }

  #[test]
  fn xref_offsets_resolve_to_objects() {
    let pdf = sample(45).render();

    let startxref = find_last(&pdf, b"startxref\n").unwrap();
    // Everything from the xref keyword on is ASCII.
    let tail = std::str::from_utf8(&pdf[startxref..]).unwrap();
    let xref_offset: usize = tail["startxref\n".len()..]
      .lines()
      .next()
      .unwrap()
      .trim()
      .parse()
      .unwrap();

    let table = std::str::from_utf8(&pdf[xref_offset..]).unwrap();
    let mut lines = table.lines();
    assert_eq!(lines.next(), Some("xref"));
    let header = lines.next().unwrap();
    let objects: usize = header.split_whitespace().nth(1).unwrap().parse().unwrap();
    // 2 document objects + page/content pairs + 2 fonts, plus the free slot.
    assert_eq!(objects, 1 + 2 + 2 * 2 + 2);

    lines.next(); // the free entry for object 0
    for id in 1..objects {
      let entry = lines.next().unwrap();
      let offset: usize = entry[..10].parse().unwrap();
      let expected = format!("{id} 0 obj");
      assert_eq!(&pdf[offset..offset + expected.len()], expected.as_bytes());
    }
  }
}
