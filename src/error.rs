use thiserror::Error;

/// Rejected user input. Reported inline; never changes any state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("score {score} for question {question_id} is out of range (must be 1-5)")]
    ScoreOutOfRange { question_id: u32, score: i64 },

    #[error("question {0} is not part of the questionnaire")]
    UnknownQuestion(u32),

    #[error("please answer every question before submitting ({answered}/{total} answered)")]
    Incomplete { answered: usize, total: usize },
}

/// Failure of a scoring request. The response set is always left intact so
/// the user can retry by hand.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("could not reach the scoring service: {0}")]
    Transport(String),

    #[error("scoring service returned HTTP {status}{}", status_detail(.message))]
    Status { status: u16, message: Option<String> },

    #[error("scoring service sent an unexpected response: {0}")]
    Malformed(String),
}

fn status_detail(message: &Option<String>) -> String {
    match message {
        Some(m) => format!(": {m}"),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages() {
        let err = ValidationError::ScoreOutOfRange {
            question_id: 7,
            score: 9,
        };
        assert_eq!(
            err.to_string(),
            "score 9 for question 7 is out of range (must be 1-5)"
        );

        let err = ValidationError::Incomplete {
            answered: 2,
            total: 3,
        };
        assert!(err.to_string().contains("2/3"));
    }

    #[test]
    fn test_status_message_formatting() {
        let bare = SubmitError::Status {
            status: 500,
            message: None,
        };
        assert_eq!(bare.to_string(), "scoring service returned HTTP 500");

        let detailed = SubmitError::Status {
            status: 400,
            message: Some("invalid question ID: 99".to_string()),
        };
        assert_eq!(
            detailed.to_string(),
            "scoring service returned HTTP 400: invalid question ID: 99"
        );
    }

    #[test]
    fn test_validation_converts_transparently() {
        let err: SubmitError = ValidationError::UnknownQuestion(3).into();
        assert_eq!(err.to_string(), "question 3 is not part of the questionnaire");
    }
}
