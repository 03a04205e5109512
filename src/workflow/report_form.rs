//! Patient details for a formal report, and the builder that turns them into
//! a report-generation request.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::ReportError;
use crate::models::PredictionResult;
use crate::services::{ReportClient, ReportDocument, ReportRequest};

/// Identity fields typed in by the user. Cleared after a successful report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportForm {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub sex: String,
}

impl ReportForm {
    /// First blank field in display order.
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("name", &self.name),
            ("address", &self.address),
            ("phone", &self.phone),
            ("sex", &self.sex),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
    }

    pub fn is_complete(&self) -> bool {
        self.missing_field().is_none()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

pub struct ReportRequestBuilder {
    client: Arc<dyn ReportClient>,
}

impl ReportRequestBuilder {
    pub fn new(client: Arc<dyn ReportClient>) -> Self {
        Self { client }
    }

    /// Validate the form and diagnosis and assemble the request body.
    pub fn build(
        form: &ReportForm,
        prediction: &PredictionResult,
        uid: Option<&str>,
    ) -> Result<ReportRequest, ReportError> {
        if let Some(field) = form.missing_field() {
            return Err(ReportError::MissingField(field));
        }
        if prediction.is_failure() {
            return Err(ReportError::MissingDiagnosis);
        }

        Ok(ReportRequest {
            name: form.name.trim().to_string(),
            address: form.address.trim().to_string(),
            phone: form.phone.trim().to_string(),
            sex: form.sex.trim().to_string(),
            disease: prediction.label.clone(),
            uid: uid.map(str::to_string),
        })
    }

    /// Submit the form. On success the form is cleared; on failure it is left
    /// untouched so the user can retry.
    pub fn submit(
        &self,
        form: &mut ReportForm,
        prediction: &PredictionResult,
        uid: Option<&str>,
    ) -> Result<ReportDocument, ReportError> {
        let request = Self::build(form, prediction, uid)?;

        let _span = tracing::info_span!(
            "report_submission",
            disease = %request.disease,
            has_uid = request.uid.is_some(),
        )
        .entered();

        let document = self.client.generate(&request).map_err(|e| {
            tracing::warn!(error = %e, "Report generation failed");
            ReportError::Service(e)
        })?;

        form.clear();
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::MockReportClient;

    fn filled() -> ReportForm {
        ReportForm {
            name: "Ada Lovelace".into(),
            address: "12 St James's Square".into(),
            phone: "555-0100".into(),
            sex: "F".into(),
        }
    }

    #[test]
    fn missing_field_reports_first_blank() {
        let mut form = filled();
        assert!(form.is_complete());
        form.phone = "  ".into();
        form.sex.clear();
        assert_eq!(form.missing_field(), Some("phone"));
    }

    #[test]
    fn build_includes_diagnosis_and_uid() {
        let prediction = PredictionResult::new("Pneumonia", Some(92.5));
        let request = ReportRequestBuilder::build(&filled(), &prediction, Some("user-1")).unwrap();
        assert_eq!(request.disease, "Pneumonia");
        assert_eq!(request.uid.as_deref(), Some("user-1"));
        assert_eq!(request.name, "Ada Lovelace");
    }

    #[test]
    fn build_requires_real_diagnosis() {
        let err = ReportRequestBuilder::build(&filled(), &PredictionResult::failed(), None)
            .unwrap_err();
        assert!(matches!(err, ReportError::MissingDiagnosis));
    }

    #[test]
    fn success_clears_form() {
        let client = Arc::new(MockReportClient::new(b"%PDF-1.4"));
        let builder = ReportRequestBuilder::new(client.clone());
        let mut form = filled();
        let prediction = PredictionResult::new("Tuberculosis", Some(80.0));

        let document = builder.submit(&mut form, &prediction, None).unwrap();
        assert_eq!(document.bytes, b"%PDF-1.4");
        assert!(form.is_empty());
        assert_eq!(client.call_count(), 1);
        assert!(client.last_request().unwrap().uid.is_none());
    }

    #[test]
    fn failure_keeps_form() {
        let client = Arc::new(MockReportClient::failing());
        let builder = ReportRequestBuilder::new(client);
        let mut form = filled();
        let prediction = PredictionResult::new("Pneumonia", None);

        let err = builder.submit(&mut form, &prediction, None).unwrap_err();
        assert!(matches!(err, ReportError::Service(_)));
        assert_eq!(form, filled());
    }

    #[test]
    fn incomplete_form_makes_no_request() {
        let client = Arc::new(MockReportClient::new(b"pdf"));
        let builder = ReportRequestBuilder::new(client.clone());
        let mut form = ReportForm {
            name: "A".into(),
            ..Default::default()
        };
        let err = builder
            .submit(&mut form, &PredictionResult::new("Pneumonia", None), None)
            .unwrap_err();
        assert!(matches!(err, ReportError::MissingField("address")));
        assert_eq!(client.call_count(), 0);
    }
}
