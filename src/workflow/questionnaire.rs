//! Lung-health questionnaire: cursor-based traversal of a fixed question
//! list, ending in exactly one recommendation request.

use serde::Serialize;

use super::QuestionnaireError;
use crate::services::{RecommendationClient, ServiceError};

pub const QUESTIONS: [&str; 15] = [
    "1. What is your age and gender?",
    "2. Do you smoke or have a history of smoking?",
    "3. Have you been exposed to dust, asbestos, or pollutants at work?",
    "4. Are you experiencing shortness of breath?",
    "5. Do you have a persistent cough? If yes, for how long?",
    "6. Have you noticed blood in your sputum?",
    "7. Do you feel chest pain when breathing or coughing?",
    "8. Are you experiencing wheezing or noisy breathing?",
    "9. Have you had any recent weight loss or fatigue?",
    "10. Do you have a history of asthma, COPD, or lung infections?",
    "11. Has anyone in your family had lung cancer or chronic lung disease?",
    "12. Do you live in an area with poor air quality?",
    "13. Have you been exposed to second-hand smoke frequently?",
    "14. Have you done a recent chest X-ray, CT scan, or spirometry test?",
    "15. Are you currently on any medications for respiratory issues?",
];

pub const RECOMMENDATION_FAILED: &str = "Failed to get recommendation";
pub const RECOMMENDATION_CONNECT_FAILED: &str = "Failed to connect to recommendation service";

/// What the submitted questionnaire shows. One variant at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum RecommendationDisplay {
    Loading,
    Recommendation(String),
    Error(String),
}

/// Result of a successful `next`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// Cursor moved to this index.
    Moved(usize),
    /// Last question answered; send these answers to the recommendation
    /// collaborator and hand the result to `complete`.
    Submit(Vec<String>),
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionnaireSession {
    answers: Vec<String>,
    cursor: usize,
    display: Option<RecommendationDisplay>,
}

impl Default for QuestionnaireSession {
    fn default() -> Self {
        Self::new()
    }
}

impl QuestionnaireSession {
    pub fn new() -> Self {
        Self {
            answers: vec![String::new(); QUESTIONS.len()],
            cursor: 0,
            display: None,
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current_question(&self) -> &'static str {
        QUESTIONS[self.cursor]
    }

    pub fn current_answer(&self) -> &str {
        &self.answers[self.cursor]
    }

    pub fn answers(&self) -> &[String] {
        &self.answers
    }

    /// "Question 3 of 15"
    pub fn progress_label(&self) -> String {
        format!("Question {} of {}", self.cursor + 1, QUESTIONS.len())
    }

    pub fn is_last(&self) -> bool {
        self.cursor + 1 == QUESTIONS.len()
    }

    pub fn is_submitted(&self) -> bool {
        self.display.is_some()
    }

    pub fn display(&self) -> Option<&RecommendationDisplay> {
        self.display.as_ref()
    }

    pub fn set_answer(&mut self, answer: impl Into<String>) -> Result<(), QuestionnaireError> {
        if self.is_submitted() {
            return Err(QuestionnaireError::AlreadySubmitted);
        }
        self.answers[self.cursor] = answer.into();
        Ok(())
    }

    /// Advance past the current question, or submit at the last one.
    pub fn next(&mut self) -> Result<Advance, QuestionnaireError> {
        if self.is_submitted() {
            return Err(QuestionnaireError::AlreadySubmitted);
        }
        if self.current_answer().trim().is_empty() {
            return Err(QuestionnaireError::EmptyAnswer { index: self.cursor });
        }

        if self.is_last() {
            self.display = Some(RecommendationDisplay::Loading);
            tracing::info!(answers = self.answers.len(), "Questionnaire submitted");
            Ok(Advance::Submit(self.answers.clone()))
        } else {
            self.cursor += 1;
            Ok(Advance::Moved(self.cursor))
        }
    }

    /// Step back one question. No validation; `false` at the first question
    /// or once submitted.
    pub fn previous(&mut self) -> bool {
        if self.is_submitted() || self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        true
    }

    /// Resolve the pending recommendation request.
    pub fn complete(
        &mut self,
        result: Result<String, ServiceError>,
    ) -> Result<&RecommendationDisplay, QuestionnaireError> {
        if self.display != Some(RecommendationDisplay::Loading) {
            return Err(QuestionnaireError::NotSubmitting);
        }

        let display = match result {
            Ok(recommendation) => RecommendationDisplay::Recommendation(recommendation),
            Err(e) => {
                tracing::warn!(error = %e, "Recommendation request failed");
                RecommendationDisplay::Error(failure_text(&e))
            }
        };
        Ok(self.display.insert(display))
    }

    /// `next`, calling the collaborator synchronously when it submits.
    pub fn advance(
        &mut self,
        client: &dyn RecommendationClient,
    ) -> Result<Advance, QuestionnaireError> {
        let step = self.next()?;
        if let Advance::Submit(answers) = &step {
            let result = client.recommend(answers);
            self.complete(result)?;
        }
        Ok(step)
    }
}

fn failure_text(error: &ServiceError) -> String {
    match error {
        ServiceError::Api { body, .. } if !body.trim().is_empty() => body.clone(),
        // A reply that cannot be read counts as no reply.
        ServiceError::ResponseParsing(_) => RECOMMENDATION_CONNECT_FAILED.to_string(),
        e if e.is_transport() => RECOMMENDATION_CONNECT_FAILED.to_string(),
        _ => RECOMMENDATION_FAILED.to_string(),
    }
}
