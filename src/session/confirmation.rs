//! Log-or-discard confirmation state machine.
//!
//! ```text
//! Prompt --accept--> Rating --skip/continue--> Notes --finish--> Resolved
//!   ^                  |  ^                      |
//!   +------back--------+  +---------back---------+
//! ```
//!
//! Declining at the prompt and cancelling at any step are handled by the
//! bridge, which drops the whole flow.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::SessionError;

/// Steps of the confirmation workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationStep {
    /// "Log this session?"
    Prompt,
    /// Optional 1-5 focus rating
    Rating,
    /// Optional improvement notes
    Notes,
    /// Submitted
    Resolved,
}

impl ConfirmationStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfirmationStep::Prompt => "prompt",
            ConfirmationStep::Rating => "rating",
            ConfirmationStep::Notes => "notes",
            ConfirmationStep::Resolved => "resolved",
        }
    }
}

impl fmt::Display for ConfirmationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Focus rating, 1 through 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct FocusRating(u8);

impl FocusRating {
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidRating`] outside 1-5.
    pub fn new(value: u8) -> Result<Self, SessionError> {
        if (1..=5).contains(&value) {
            Ok(Self(value))
        } else {
            Err(SessionError::InvalidRating(value))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for FocusRating {
    type Error = SessionError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FocusRating> for u8 {
    fn from(rating: FocusRating) -> Self {
        rating.0
    }
}

/// Answers collected by a finished flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationAnswers {
    pub rating: Option<FocusRating>,
    /// Trimmed notes; `None` when blank
    pub notes: Option<String>,
}

/// In-progress confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationFlow {
    step: ConfirmationStep,
    rating: Option<FocusRating>,
    notes: String,
}

impl Default for ConfirmationFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfirmationFlow {
    #[must_use]
    pub fn new() -> Self {
        Self {
            step: ConfirmationStep::Prompt,
            rating: None,
            notes: String::new(),
        }
    }

    pub fn step(&self) -> ConfirmationStep {
        self.step
    }

    pub fn rating(&self) -> Option<FocusRating> {
        self.rating
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    /// "Yes, log it."
    pub fn accept(&mut self) -> Result<ConfirmationStep, SessionError> {
        self.expect(ConfirmationStep::Prompt)?;
        self.step = ConfirmationStep::Rating;
        Ok(self.step)
    }

    /// Selects a rating; stays on the rating step.
    pub fn rate(&mut self, value: u8) -> Result<FocusRating, SessionError> {
        self.expect(ConfirmationStep::Rating)?;
        let rating = FocusRating::new(value)?;
        self.rating = Some(rating);
        Ok(rating)
    }

    /// Moves to notes without a rating.
    pub fn skip_rating(&mut self) -> Result<ConfirmationStep, SessionError> {
        self.expect(ConfirmationStep::Rating)?;
        self.rating = None;
        self.step = ConfirmationStep::Notes;
        Ok(self.step)
    }

    /// Moves to notes keeping the selected rating.
    pub fn continue_to_notes(&mut self) -> Result<ConfirmationStep, SessionError> {
        self.expect(ConfirmationStep::Rating)?;
        self.step = ConfirmationStep::Notes;
        Ok(self.step)
    }

    /// Replaces the notes text.
    pub fn set_notes(&mut self, notes: impl Into<String>) -> Result<(), SessionError> {
        self.expect(ConfirmationStep::Notes)?;
        self.notes = notes.into();
        Ok(())
    }

    /// Returns to the previous step. At the prompt this is a no-op.
    pub fn back(&mut self) -> ConfirmationStep {
        self.step = match self.step {
            ConfirmationStep::Rating => ConfirmationStep::Prompt,
            ConfirmationStep::Notes => ConfirmationStep::Rating,
            other => other,
        };
        self.step
    }

    /// Answers as they would be submitted now, without finishing.
    pub fn answers(&self) -> Result<ConfirmationAnswers, SessionError> {
        self.expect(ConfirmationStep::Notes)?;
        let trimmed = self.notes.trim();
        Ok(ConfirmationAnswers {
            rating: self.rating,
            notes: (!trimmed.is_empty()).then(|| trimmed.to_string()),
        })
    }

    /// Marks the flow resolved.
    pub fn finish(&mut self) -> Result<ConfirmationAnswers, SessionError> {
        let answers = self.answers()?;
        self.step = ConfirmationStep::Resolved;
        Ok(answers)
    }

    fn expect(&self, expected: ConfirmationStep) -> Result<(), SessionError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidStep {
                expected,
                actual: self.step,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod focus_rating_tests {
        use super::*;

        #[test]
        fn test_valid_range() {
            for value in 1..=5 {
                assert_eq!(FocusRating::new(value).unwrap().get(), value);
            }
        }

        #[test]
        fn test_out_of_range() {
            assert!(matches!(
                FocusRating::new(0),
                Err(SessionError::InvalidRating(0))
            ));
            assert!(matches!(
                FocusRating::new(6),
                Err(SessionError::InvalidRating(6))
            ));
        }

        #[test]
        fn test_serde_as_number() {
            let rating = FocusRating::new(4).unwrap();
            assert_eq!(serde_json::to_string(&rating).unwrap(), "4");
            assert!(serde_json::from_str::<FocusRating>("7").is_err());
        }
    }

    mod flow_tests {
        use super::*;

        #[test]
        fn test_full_path_with_rating_and_notes() {
            let mut flow = ConfirmationFlow::new();
            assert_eq!(flow.step(), ConfirmationStep::Prompt);

            flow.accept().unwrap();
            flow.rate(4).unwrap();
            flow.continue_to_notes().unwrap();
            flow.set_notes("  silence phone  ").unwrap();
            let answers = flow.finish().unwrap();

            assert_eq!(flow.step(), ConfirmationStep::Resolved);
            assert_eq!(answers.rating.map(FocusRating::get), Some(4));
            assert_eq!(answers.notes.as_deref(), Some("silence phone"));
        }

        #[test]
        fn test_skip_clears_rating() {
            let mut flow = ConfirmationFlow::new();
            flow.accept().unwrap();
            flow.rate(2).unwrap();
            flow.skip_rating().unwrap();

            let answers = flow.finish().unwrap();
            assert_eq!(answers.rating, None);
            assert_eq!(answers.notes, None);
        }

        #[test]
        fn test_blank_notes_recorded_as_absent() {
            let mut flow = ConfirmationFlow::new();
            flow.accept().unwrap();
            flow.skip_rating().unwrap();
            flow.set_notes("   \n").unwrap();

            assert_eq!(flow.answers().unwrap().notes, None);
        }

        #[test]
        fn test_back_walks_to_previous_step() {
            let mut flow = ConfirmationFlow::new();
            flow.accept().unwrap();
            flow.rate(5).unwrap();
            flow.continue_to_notes().unwrap();
            flow.set_notes("draft").unwrap();

            assert_eq!(flow.back(), ConfirmationStep::Rating);
            assert_eq!(flow.rating().map(FocusRating::get), Some(5));
            assert_eq!(flow.back(), ConfirmationStep::Prompt);
            assert_eq!(flow.back(), ConfirmationStep::Prompt);
            assert_eq!(flow.notes(), "draft");
        }

        #[test]
        fn test_actions_out_of_order_rejected() {
            let mut flow = ConfirmationFlow::new();

            assert!(matches!(
                flow.rate(3),
                Err(SessionError::InvalidStep {
                    expected: ConfirmationStep::Rating,
                    actual: ConfirmationStep::Prompt
                })
            ));
            assert!(flow.set_notes("x").is_err());
            assert!(flow.finish().is_err());
            assert_eq!(flow.step(), ConfirmationStep::Prompt);
        }

        #[test]
        fn test_invalid_rating_keeps_previous() {
            let mut flow = ConfirmationFlow::new();
            flow.accept().unwrap();
            flow.rate(3).unwrap();

            assert!(flow.rate(8).is_err());
            assert_eq!(flow.rating().map(FocusRating::get), Some(3));
        }
    }
}
