//! Assessment Models
//!
//! The backend's risk assessment and the `/api/analyze` result envelope.
//! Both are read-only to the client; the envelope is echoed verbatim to
//! `/api/generate-pdf`, so unknown fields are preserved.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::consultation::ConsultationRecord;
use super::patient::PatientRecord;

/// Maximum number of reasons shown per risk finding.
pub const MAX_DISPLAY_REASONS: usize = 3;

/// Shown in place of reasons when a finding has none.
pub const NO_FLAGS_MESSAGE: &str = "No high-confidence flags detected for this pathology.";

/// Shown when the assessment carries neither narrative report.
pub const NO_REPORT_MESSAGE: &str = "No detailed report available.";

/// Risk classification.
///
/// Parsing is tolerant: `Moderate` reads as `Medium`, `Critical` as `High`,
/// and any other label (or null) as `Unknown`. The original label survives
/// in `AnalysisEnvelope::as_json`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    #[default]
    Unknown,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::Unknown => "Unknown",
        }
    }

    /// Presentation class name, e.g. `risk-high`.
    pub fn css_class(&self) -> String {
        format!("risk-{}", self.as_str().to_lowercase())
    }
}

impl From<Option<String>> for RiskLevel {
    fn from(label: Option<String>) -> Self {
        label.as_deref().map(RiskLevel::from).unwrap_or_default()
    }
}

impl From<&str> for RiskLevel {
    fn from(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "low" => RiskLevel::Low,
            "medium" | "moderate" => RiskLevel::Medium,
            "high" | "critical" => RiskLevel::High,
            _ => RiskLevel::Unknown,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-disease risk finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndividualRiskFinding {
    pub disease: String,
    #[serde(default)]
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub why: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl IndividualRiskFinding {
    /// At most `MAX_DISPLAY_REASONS` reasons, in backend order.
    pub fn display_reasons(&self) -> &[String] {
        let n = self.why.len().min(MAX_DISPLAY_REASONS);
        &self.why[..n]
    }
}

/// Risk assessment produced by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub consultation_id: Option<String>,
    #[serde(default)]
    pub overall_risk_level: RiskLevel,
    #[serde(default)]
    pub overall_risk_score: f64,
    #[serde(default)]
    pub individual_risks: Vec<IndividualRiskFinding>,
    #[serde(default)]
    pub primary_concerns: Vec<String>,
    #[serde(default)]
    pub doctor_report: Option<String>,
    #[serde(default)]
    pub patient_report: Option<String>,
    #[serde(default)]
    pub soap_json: Option<Value>,
    #[serde(default)]
    pub conversation_summary: Option<String>,
    #[serde(default)]
    pub assessed_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AssessmentResult {
    /// Placeholder used when the envelope carries no assessment.
    pub fn unavailable() -> Self {
        Self {
            id: None,
            consultation_id: None,
            overall_risk_level: RiskLevel::Unknown,
            overall_risk_score: 0.0,
            individual_risks: Vec::new(),
            primary_concerns: Vec::new(),
            doctor_report: None,
            patient_report: None,
            soap_json: None,
            conversation_summary: None,
            assessed_at: None,
            extra: Map::new(),
        }
    }

    /// Score clamped to the 0–100 display range.
    pub fn clamped_score(&self) -> f64 {
        if self.overall_risk_score.is_nan() {
            0.0
        } else {
            self.overall_risk_score.clamp(0.0, 100.0)
        }
    }

    /// Markdown to render: doctor report, then patient report, then a placeholder.
    pub fn report_markdown(&self) -> &str {
        [&self.doctor_report, &self.patient_report]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|r| !r.trim().is_empty())
            .unwrap_or(NO_REPORT_MESSAGE)
    }
}

/// Result envelope returned by `POST /api/analyze`.
///
/// Keeps the body exactly as received and serializes back to it, so the
/// `/api/generate-pdf` echo carries the backend's own labels and any fields
/// the typed view does not model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct AnalysisEnvelope {
    pub patient: PatientRecord,
    pub medical_record: Option<Value>,
    pub consultation: Option<ConsultationRecord>,
    pub assessment: Option<AssessmentResult>,
    raw: Value,
}

#[derive(Deserialize)]
struct EnvelopeFields {
    patient: PatientRecord,
    #[serde(default)]
    medical_record: Option<Value>,
    #[serde(default)]
    consultation: Option<ConsultationRecord>,
    #[serde(default)]
    assessment: Option<AssessmentResult>,
}

impl TryFrom<Value> for AnalysisEnvelope {
    type Error = serde_json::Error;

    fn try_from(raw: Value) -> Result<Self, Self::Error> {
        let fields = EnvelopeFields::deserialize(&raw)?;
        Ok(Self {
            patient: fields.patient,
            medical_record: fields.medical_record,
            consultation: fields.consultation,
            assessment: fields.assessment,
            raw,
        })
    }
}

impl From<AnalysisEnvelope> for Value {
    fn from(envelope: AnalysisEnvelope) -> Self {
        envelope.raw
    }
}

impl AnalysisEnvelope {
    /// The assessment, or the `Unknown` placeholder when the backend sent none.
    pub fn assessment_or_default(&self) -> AssessmentResult {
        self.assessment
            .clone()
            .unwrap_or_else(AssessmentResult::unavailable)
    }

    pub fn medical_record_number(&self) -> Option<&str> {
        self.patient.mrn()
    }

    /// The envelope body as the backend sent it.
    pub fn as_json(&self) -> &Value {
        &self.raw
    }
}
