use super::ReportDocument;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("font resource unavailable: {0}")]
    FontUnavailable(String),
    #[error("document build failed: {0}")]
    Build(String),
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct RenderedReport {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Turns a title plus ordered lines into a retrievable document. The PDF
/// backend lives with the transport tooling; anything implementing this trait
/// can stand in for it.
pub trait ReportRenderer: Send + Sync {
    fn render(&self, document: &ReportDocument) -> Result<RenderedReport, RenderError>;
}

/// UTF-8 text renderer used by the bundled report endpoints.
pub struct PlainTextRenderer;

impl ReportRenderer for PlainTextRenderer {
    fn render(&self, document: &ReportDocument) -> Result<RenderedReport, RenderError> {
        let mut out = String::new();
        out.push_str(&document.title);
        out.push('\n');
        out.push_str(&"=".repeat(document.title.chars().count()));
        out.push_str("\n\n");
        for line in &document.lines {
            if line.is_empty() {
                continue;
            }
            out.push_str(line);
            out.push('\n');
        }
        Ok(RenderedReport {
            file_name: format!("{}.txt", document.title.replace(' ', "_")),
            content_type: "text/plain; charset=utf-8",
            bytes: out.into_bytes(),
        })
    }
}
