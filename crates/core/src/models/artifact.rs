//! Tool Artifacts
//!
//! Payloads produced by the on-demand result tools. They live only in the
//! session's tool state and are never persisted by the core.

use bytes::Bytes;

/// MIME type of explanation plots.
pub const EXPLANATION_MEDIA_TYPE: &str = "image/png";

/// MIME type of generated reports.
pub const REPORT_MEDIA_TYPE: &str = "application/pdf";

/// File name for a generated report: `Medical_Report_<MRN or "ID">.pdf`.
pub fn report_file_name(medical_record_number: Option<&str>) -> String {
    let id = medical_record_number
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or("ID");
    format!("Medical_Report_{}.pdf", id)
}

/// A generated PDF report ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportArtifact {
    pub file_name: String,
    pub bytes: Bytes,
    /// MRN of the envelope that produced this report.
    pub medical_record_number: Option<String>,
}

impl ReportArtifact {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether the payload starts with the `%PDF` magic.
    pub fn looks_like_pdf(&self) -> bool {
        self.bytes.starts_with(b"%PDF")
    }
}

/// A feature-importance plot for one prediction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplanationImage {
    /// Base64 exactly as the backend sent it (data-URI prefix removed).
    pub base64: String,
    /// Decoded image bytes.
    pub bytes: Bytes,
    pub media_type: &'static str,
}

impl ExplanationImage {
    /// `data:` URI for inline rendering.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.base64)
    }
}
