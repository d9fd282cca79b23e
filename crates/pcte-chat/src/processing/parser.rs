use std::path::Path;

use crate::error::{HelpdeskError, Result};

/// Read the reference document as plain text. PDFs are text-extracted,
/// anything else is read as UTF-8.
pub fn load_document(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(HelpdeskError::SourceNotFound(path.to_path_buf()));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("txt")
        .to_lowercase();

    let text = match extension.as_str() {
        "pdf" => parse_pdf(path)?,
        _ => std::fs::read_to_string(path).map_err(|e| {
            tracing::warn!("Failed to read {}: {}", path.display(), e);
            HelpdeskError::SourceNotFound(path.to_path_buf())
        })?,
    };

    tracing::debug!(chars = text.chars().count(), "Loaded document {}", path.display());
    Ok(text)
}

fn parse_pdf(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| {
        tracing::warn!("Failed to read PDF {}: {}", path.display(), e);
        HelpdeskError::SourceNotFound(path.to_path_buf())
    })?;

    match pdf_extract::extract_text_from_mem(&bytes) {
        Ok(text) => {
            let cleaned = normalize_lines(&text);
            if !cleaned.is_empty() {
                return Ok(cleaned);
            }
        }
        Err(e) => {
            tracing::debug!("pdf_extract failed for {}: {}", path.display(), e);
        }
    }

    // pdf_extract gave nothing usable, try lopdf page by page
    let doc = lopdf::Document::load_mem(&bytes).map_err(|e| {
        HelpdeskError::RetrievalUnavailable(format!("unreadable PDF {}: {}", path.display(), e))
    })?;

    let mut text = String::new();
    for page_number in doc.get_pages().keys() {
        match doc.extract_text(&[*page_number]) {
            Ok(page_text) => {
                text.push_str(&page_text);
                text.push('\n');
            }
            Err(e) => tracing::debug!(page = page_number, "lopdf page extraction failed: {}", e),
        }
    }

    let cleaned = normalize_lines(&text);
    if cleaned.is_empty() {
        return Err(HelpdeskError::RetrievalUnavailable(format!(
            "PDF contains no extractable text: {}",
            path.display()
        )));
    }
    Ok(cleaned)
}

/// Trim every line and drop blank ones. Both PDF extractors go through this
/// so chunk boundaries don't depend on which one succeeded.
fn normalize_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_source_not_found() {
        let err = load_document(Path::new("/definitely/not/here.pdf")).unwrap_err();
        assert!(matches!(err, HelpdeskError::SourceNotFound(_)));
    }

    #[test]
    fn reads_plain_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brochure.txt");
        std::fs::write(&path, "Admissions open for BCA.\nHostel on campus.").unwrap();
        assert_eq!(
            load_document(&path).unwrap(),
            "Admissions open for BCA.\nHostel on campus."
        );
    }

    #[test]
    fn extracted_text_is_normalized() {
        let raw = "  PCTE Brochure  \r\n\n\n\tCourses: BCA, MBA\n   \nHostel\n";
        assert_eq!(normalize_lines(raw), "PCTE Brochure\nCourses: BCA, MBA\nHostel");
        assert_eq!(normalize_lines(" \n\t\n"), "");
        assert_eq!(normalize_lines(&normalize_lines(raw)), normalize_lines(raw));
    }

    #[test]
    fn directory_is_not_a_document() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_document(dir.path()),
            Err(HelpdeskError::SourceNotFound(_))
        ));
    }
}
