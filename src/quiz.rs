//! One student's attempt at a quiz.
//!
//! Answers are kept per question, so stepping back with [`QuizSession::previous`]
//! and answering again replaces the earlier answer instead of counting twice.
//! Score and the wrong-answer log are derived from that per-question state.

use chrono::{Local, NaiveDateTime, Timelike};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::questions::{Letter, Question};
use crate::student::Student;

pub const DEFAULT_SAMPLE_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuizError {
    #[error("no questions available for this subject")]
    EmptyPool,
    #[error("please select an answer")]
    NoSelection,
    #[error("invalid answer {0:?}; expected A, B, C or D")]
    InvalidLetter(String),
    #[error("all questions have been answered")]
    Complete,
    #[error("{answered} of {total} questions answered")]
    Incomplete { answered: usize, total: usize },
}

impl QuizError {
    pub fn code(&self) -> &'static str {
        match self {
            QuizError::EmptyPool => "empty_pool",
            QuizError::NoSelection => "no_selection",
            QuizError::InvalidLetter(_) => "invalid_letter",
            QuizError::Complete => "quiz_complete",
            QuizError::Incomplete { .. } => "quiz_incomplete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrongAnswer {
    pub question_text: String,
    pub selected_letter: Letter,
    pub selected_text: String,
    pub correct_letter: Letter,
    pub correct_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Feedback {
    Excellent,
    Good,
    KeepStudying,
}

impl Feedback {
    pub fn from_percentage(pct: f64) -> Self {
        if pct >= 80.0 {
            Feedback::Excellent
        } else if pct >= 60.0 {
            Feedback::Good
        } else {
            Feedback::KeepStudying
        }
    }
}

fn raw_percentage(score: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    100.0 * f64::from(score) / f64::from(total)
}

/// One decimal as shown to users. Exact ties round to even (`1/16` is `6.2`),
/// matching `{:.1}` formatting.
pub fn percentage(score: u32, total: u32) -> f64 {
    let shown = format!("{:.1}", raw_percentage(score, total));
    shown.parse().unwrap_or(0.0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    pub student_name: String,
    pub grade: String,
    pub subject: String,
    pub score: u32,
    pub total_questions: u32,
    pub wrong_answers: Vec<WrongAnswer>,
    pub taken_at: NaiveDateTime,
}

impl ResultRecord {
    pub fn percentage(&self) -> f64 {
        percentage(self.score, self.total_questions)
    }

    /// Tiers use the unrounded ratio, so 79.96% is not excellent.
    pub fn feedback(&self) -> Feedback {
        Feedback::from_percentage(raw_percentage(self.score, self.total_questions))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionView {
    pub letter: Letter,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    /// 1-based.
    pub number: usize,
    pub total: usize,
    pub text: String,
    pub options: Vec<OptionView>,
    pub selected: Option<Letter>,
    pub is_last: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Submission {
    pub correct: bool,
    /// The question already had an answer that this one replaced.
    pub replaced: bool,
}

#[derive(Debug, Clone)]
pub struct QuizSession {
    id: String,
    student_name: String,
    grade: String,
    subject: String,
    questions: Vec<Question>,
    answers: Vec<Option<Letter>>,
    position: usize,
}

impl QuizSession {
    /// Samples up to `sample_size` questions without replacement. A size of 0
    /// means [`DEFAULT_SAMPLE_SIZE`].
    pub fn start(
        student: &Student,
        subject: &str,
        pool: &[Question],
        sample_size: usize,
    ) -> Result<Self, QuizError> {
        Self::start_with_rng(student, subject, pool, sample_size, &mut rand::thread_rng())
    }

    pub fn start_with_rng<R: Rng + ?Sized>(
        student: &Student,
        subject: &str,
        pool: &[Question],
        sample_size: usize,
        rng: &mut R,
    ) -> Result<Self, QuizError> {
        if pool.is_empty() {
            return Err(QuizError::EmptyPool);
        }
        let n = if sample_size == 0 {
            DEFAULT_SAMPLE_SIZE
        } else {
            sample_size
        };
        let picked = pool
            .choose_multiple(rng, n.min(pool.len()))
            .cloned()
            .collect::<Vec<_>>();
        Self::with_questions(student, subject, picked)
    }

    /// Uses `questions` in the given order.
    pub fn with_questions(
        student: &Student,
        subject: &str,
        questions: Vec<Question>,
    ) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::EmptyPool);
        }
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            student_name: student.name.clone(),
            grade: student.grade.clone(),
            subject: subject.to_string(),
            answers: vec![None; questions.len()],
            questions,
            position: 0,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    #[cfg(test)]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn total(&self) -> usize {
        self.questions.len()
    }

    pub fn is_complete(&self) -> bool {
        self.position == self.questions.len()
    }

    pub fn answered(&self) -> usize {
        self.answers.iter().filter(|a| a.is_some()).count()
    }

    pub fn score(&self) -> u32 {
        self.questions
            .iter()
            .zip(&self.answers)
            .filter(|(q, a)| **a == Some(q.correct_answer))
            .count() as u32
    }

    /// Incorrect answers in question order.
    pub fn wrong_log(&self) -> Vec<WrongAnswer> {
        self.questions
            .iter()
            .zip(&self.answers)
            .filter_map(|(q, a)| {
                let selected = (*a)?;
                if selected == q.correct_answer {
                    return None;
                }
                Some(WrongAnswer {
                    question_text: q.text.clone(),
                    selected_letter: selected,
                    selected_text: q.option(selected).to_string(),
                    correct_letter: q.correct_answer,
                    correct_text: q.correct_text().to_string(),
                })
            })
            .collect()
    }

    pub fn current(&self) -> Option<QuestionView> {
        let q = self.questions.get(self.position)?;
        Some(QuestionView {
            number: self.position + 1,
            total: self.questions.len(),
            text: q.text.clone(),
            options: Letter::ALL
                .iter()
                .map(|&letter| OptionView {
                    letter,
                    text: q.option(letter).to_string(),
                })
                .collect(),
            selected: self.answers[self.position],
            is_last: self.position + 1 == self.questions.len(),
        })
    }

    /// Blank input is `NoSelection`; state is untouched on any error.
    pub fn submit_answer(&mut self, input: Option<&str>) -> Result<Submission, QuizError> {
        if self.is_complete() {
            return Err(QuizError::Complete);
        }
        let letter = parse_selection(input)?;
        let correct = self.questions[self.position].correct_answer == letter;
        let replaced = self.answers[self.position].replace(letter).is_some();
        self.position += 1;
        Ok(Submission { correct, replaced })
    }

    /// Steps back one question. Returns false at the first question.
    pub fn previous(&mut self) -> bool {
        if self.position == 0 {
            return false;
        }
        self.position -= 1;
        true
    }

    /// On the last question this submits `input` first, or keeps the stored
    /// answer when `input` is blank. Once every question has an answer the
    /// position no longer matters. On a complete session `input` is ignored.
    /// The session stays usable so a failed save can retry.
    pub fn finish(&mut self, input: Option<&str>) -> Result<ResultRecord, QuizError> {
        if self.is_complete() {
            return Ok(self.result_record());
        }
        let blank = input.map(str::trim).unwrap_or("").is_empty();
        if blank && self.answered() == self.questions.len() {
            self.position = self.questions.len();
            return Ok(self.result_record());
        }
        if self.position + 1 != self.questions.len() {
            return Err(QuizError::Incomplete {
                answered: self.answered(),
                total: self.questions.len(),
            });
        }
        self.submit_answer(input)?;
        Ok(self.result_record())
    }

    fn result_record(&self) -> ResultRecord {
        let now = Local::now().naive_local();
        ResultRecord {
            student_name: self.student_name.clone(),
            grade: self.grade.clone(),
            subject: self.subject.clone(),
            score: self.score(),
            total_questions: self.questions.len() as u32,
            wrong_answers: self.wrong_log(),
            taken_at: now.with_nanosecond(0).unwrap_or(now),
        }
    }
}

fn parse_selection(input: Option<&str>) -> Result<Letter, QuizError> {
    let raw = input.map(str::trim).unwrap_or("");
    if raw.is_empty() {
        return Err(QuizError::NoSelection);
    }
    raw.parse::<Letter>()
        .map_err(|_| QuizError::InvalidLetter(raw.to_string()))
}
