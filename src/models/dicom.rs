use std::fmt;

use serde::{Deserialize, Serialize};

/// Annotation state of an imaging record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DicomStatus {
    Unannotated,
    Annotated,
}

impl DicomStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DicomStatus::Unannotated => "unannotated",
            DicomStatus::Annotated => "annotated",
        }
    }
}

impl fmt::Display for DicomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Review disposition of an imaging record.
///
/// The backend spells the in-progress state "pedding" on the wire; keep
/// that spelling for serde and normalize it for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewState {
    #[serde(rename = "accept")]
    Accept,
    #[serde(rename = "pedding")]
    Pending,
    #[serde(rename = "reject")]
    Reject,
}

impl ReviewState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewState::Accept => "accept",
            ReviewState::Pending => "pending",
            ReviewState::Reject => "reject",
        }
    }
}

impl fmt::Display for ReviewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DicomInfo {
    pub id: String,
    #[serde(rename = "patientId")]
    pub patient_id: String,
    #[serde(rename = "studyDate")]
    pub study_date: String,
    pub modality: String,
    pub status: DicomStatus,
    pub review: ReviewState,
}

/// Aggregate counters shown on the dashboard.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Analysis {
    pub pending: i64,
    pub dicoms: i64,
    pub annotated: i64,
    pub unannotated: i64,
}

/// Paginated envelope returned by `/dicom/list/{page}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DicomPage {
    pub page: i64,
    pub total: i64,
    #[serde(rename = "perPage")]
    pub per_page: i64,
    pub dicoms: Vec<DicomInfo>,
}

impl DicomPage {
    /// Number of pages implied by `total` and `perPage`, never below 1.
    pub fn page_count(&self) -> i64 {
        if self.per_page <= 0 {
            return 1;
        }
        ((self.total + self.per_page - 1) / self.per_page).max(1)
    }
}

/// Sortable columns of the Dicoms table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DicomSortColumn {
    Id,
    PatientId,
    Modality,
    Status,
    Review,
    StudyDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dicom_info() {
        // "pedding" is what the backend actually sends
        let json = r#"{
            "id": "d-100",
            "patientId": "P-42",
            "studyDate": "2024-05-01T09:30:00Z",
            "modality": "CT",
            "status": "unannotated",
            "review": "pedding"
        }"#;

        let info: DicomInfo = serde_json::from_str(json).expect("Failed to parse dicom info");
        assert_eq!(info.patient_id, "P-42");
        assert_eq!(info.status, DicomStatus::Unannotated);
        assert_eq!(info.review, ReviewState::Pending);
        assert_eq!(info.review.to_string(), "pending");

        // Serializing must keep the wire spelling
        let back = serde_json::to_string(&info).unwrap();
        assert!(back.contains(r#""review":"pedding""#));
    }

    #[test]
    fn test_parse_dicom_page() {
        let json = r#"{"page": 2, "total": 45, "perPage": 20, "dicoms": []}"#;
        let page: DicomPage = serde_json::from_str(json).expect("Failed to parse dicom page");
        assert_eq!(page.page, 2);
        assert_eq!(page.page_count(), 3);
    }

    #[test]
    fn test_page_count_clamping() {
        let page = |total, per_page| DicomPage {
            page: 1,
            total,
            per_page,
            dicoms: vec![],
        };

        assert_eq!(page(0, 20).page_count(), 1);
        assert_eq!(page(20, 20).page_count(), 1);
        assert_eq!(page(21, 20).page_count(), 2);
        assert_eq!(page(100, 0).page_count(), 1); // degenerate perPage
    }

    #[test]
    fn test_parse_analysis() {
        let json = r#"{"pending": 3, "dicoms": 120, "annotated": 80, "unannotated": 40}"#;
        let analysis: Analysis = serde_json::from_str(json).expect("Failed to parse analysis");
        assert_eq!(analysis.dicoms, 120);
        assert_eq!(analysis.pending, 3);
    }
}
