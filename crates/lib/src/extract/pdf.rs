use super::ExtractError;
use base64::Engine;
use lopdf::Document;

/// Number of pages in a PDF.
pub fn page_count(bytes: &[u8]) -> Result<usize, ExtractError> {
    let doc = Document::load_mem(bytes)?;
    Ok(doc.get_pages().len())
}

/// Validate that `bytes` is a PDF with at least one page and return it base64-encoded.
pub fn encode_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    let pages = page_count(bytes)?;
    if pages == 0 {
        return Err(ExtractError::EmptyPdf);
    }
    log::debug!("pdf has {} page(s), encoding {} bytes", pages, bytes.len());
    Ok(base64::engine::general_purpose::STANDARD.encode(bytes))
}
