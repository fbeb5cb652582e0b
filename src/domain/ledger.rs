//! Answer ledger: question position -> selected option for the running session.
//!
//! Writes are synchronous and immediately visible to `submission_list`, so a
//! finalize that follows an answer in the same step always sees that answer.

use crate::domain::{AnswerRecord, DomainError, Question};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerLedger {
    entries: BTreeMap<usize, usize>,
}

impl AnswerLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `option` for `position`. Positions beyond `pointer` and positions
    /// already answered are rejected; a written value is never replaced.
    pub fn record(
        &mut self,
        position: usize,
        option: usize,
        pointer: usize,
    ) -> Result<(), DomainError> {
        if position > pointer {
            return Err(DomainError::Validation(format!(
                "question {} is ahead of the current question {}",
                position, pointer
            )));
        }
        if self.entries.contains_key(&position) {
            return Err(DomainError::Validation(format!(
                "question {} was already answered",
                position
            )));
        }
        self.entries.insert(position, option);
        Ok(())
    }

    pub fn get(&self, position: usize) -> Option<usize> {
        self.entries.get(&position).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Answered positions in ascending order. Unanswered positions are omitted.
    pub fn submission_list(&self, questions: &[Question]) -> Vec<AnswerRecord> {
        self.entries
            .iter()
            .filter_map(|(&position, &option)| {
                questions.get(position).map(|q| AnswerRecord {
                    question_position: position,
                    question_id: q.id.clone(),
                    selected_option: option,
                })
            })
            .collect()
    }
}
