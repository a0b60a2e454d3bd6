//! Uploaded documents and text extraction.

use serde::Serialize;
use sha2::{Digest, Sha256};

const PAGE_BREAK: char = '\u{000C}';
const PDF_MIME: &str = "application/pdf";

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ExtractionError {
    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("document is not valid utf-8 text")]
    InvalidEncoding,

    #[error("document has no extractable text")]
    Empty,

    #[error("could not read pdf: {0}")]
    Pdf(String),
}

/// Turns raw upload bytes into page-ordered text.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError>;
}

/// Extractor for plain UTF-8 text. Form feeds separate pages.
#[derive(Debug, Default, Clone)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        if let Some(kind) = infer::get(bytes) {
            if kind.matcher_type() != infer::MatcherType::Text {
                return Err(ExtractionError::UnsupportedFormat(kind.mime_type().to_string()));
            }
        }

        let text = std::str::from_utf8(bytes).map_err(|_| ExtractionError::InvalidEncoding)?;

        let mut out = String::with_capacity(text.len());
        for page in text.split(PAGE_BREAK) {
            out.push_str(page);
            if !page.ends_with('\n') {
                out.push('\n');
            }
        }

        Ok(out)
    }
}

/// PDF extractor. Page texts are emitted in page order, each followed by a
/// newline.
#[derive(Debug, Default, Clone)]
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
            .map_err(|e| ExtractionError::Pdf(e.to_string()))?;

        log::debug!("pdf extracted pages={}", pages.len());

        let mut out = String::new();
        for page in pages {
            out.push_str(&page);
            out.push('\n');
        }
        Ok(out)
    }
}

/// Picks an extractor from the upload's byte signature: PDFs go to
/// [`PdfTextExtractor`], everything else to [`PlainTextExtractor`].
#[derive(Debug, Default, Clone)]
pub struct DocumentExtractor;

impl TextExtractor for DocumentExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        match infer::get(bytes) {
            Some(kind) if kind.mime_type() == PDF_MIME => PdfTextExtractor.extract(bytes),
            _ => PlainTextExtractor.extract(bytes),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub name: String,
    pub text: String,
    /// SHA-256 of `text`, hex encoded
    pub fingerprint: String,
}

impl Document {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let fingerprint = Sha256::digest(text.as_bytes())
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect();

        Self {
            name: name.into(),
            text,
            fingerprint,
        }
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal PDF with one line of Helvetica text per page.
    fn sample_pdf(pages: &[&str]) -> Vec<u8> {
        let page_count = pages.len();
        let font_id = 3 + 2 * page_count;
        let kids = (0..page_count)
            .map(|i| format!("{} 0 R", 3 + 2 * i))
            .collect::<Vec<_>>()
            .join(" ");

        let mut objects = vec![
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            format!("<< /Type /Pages /Kids [{kids}] /Count {page_count} >>"),
        ];
        for (i, text) in pages.iter().enumerate() {
            let stream = format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET");
            objects.push(format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
                 /Resources << /Font << /F1 {font_id} 0 R >> >> /Contents {} 0 R >>",
                4 + 2 * i
            ));
            objects.push(format!(
                "<< /Length {} >>\nstream\n{stream}\nendstream",
                stream.len()
            ));
        }
        objects.push("<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string());

        let mut pdf = String::from("%PDF-1.4\n");
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, object) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.push_str(&format!("{} 0 obj\n{object}\nendobj\n", i + 1));
        }

        let xref_at = pdf.len();
        pdf.push_str(&format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1));
        for offset in offsets {
            pdf.push_str(&format!("{offset:010} 00000 n \n"));
        }
        pdf.push_str(&format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
            objects.len() + 1
        ));
        pdf.into_bytes()
    }

    #[test]
    fn test_plain_text_pages() {
        let text = PlainTextExtractor.extract(b"page one\x0cpage two\n").unwrap();
        assert_eq!(text, "page one\npage two\n");
    }

    #[test]
    fn test_rejects_pdf() {
        let err = PlainTextExtractor.extract(b"%PDF-1.7\n%binary").unwrap_err();
        assert_eq!(err, ExtractionError::UnsupportedFormat("application/pdf".to_string()));
    }

    #[test]
    fn test_pdf_pages_in_order() {
        let pdf = sample_pdf(&["Cats are mammals.", "Dogs are mammals too."]);
        let text = DocumentExtractor.extract(&pdf).unwrap();

        let cats = text.find("Cats").unwrap();
        let dogs = text.find("Dogs").unwrap();
        assert!(cats < dogs);
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_broken_pdf() {
        let err = DocumentExtractor.extract(b"%PDF-1.4\nnot really a pdf").unwrap_err();
        assert!(matches!(err, ExtractionError::Pdf(_)));
    }

    #[test]
    fn test_dispatch_keeps_text_and_rejects_images() {
        assert_eq!(DocumentExtractor.extract(b"plain words").unwrap(), "plain words\n");

        let png = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
        let err = DocumentExtractor.extract(png).unwrap_err();
        assert_eq!(err, ExtractionError::UnsupportedFormat("image/png".to_string()));
    }

    #[test]
    fn test_rejects_invalid_utf8() {
        let err = PlainTextExtractor.extract(&[b'a', 0xff, 0xfe, b'b']).unwrap_err();
        assert_eq!(err, ExtractionError::InvalidEncoding);
    }

    #[test]
    fn test_fingerprint_and_word_count() {
        let doc = Document::new("notes.txt", "Cats are mammals.");
        assert_eq!(doc.word_count(), 3);
        assert_eq!(doc.fingerprint.len(), 64);
        assert_eq!(doc.fingerprint, Document::new("other.txt", "Cats are mammals.").fingerprint);
        assert_ne!(doc.fingerprint, Document::new("notes.txt", "Dogs.").fingerprint);
    }
}
