//! Interactive questions asked during generation and sync.
//!
//! Core code never touches the terminal. Workflows receive a [`Prompt`] and
//! the caller decides whether answers come from a user, a `--force` flag, or a
//! test script.

use std::collections::VecDeque;

use crate::error::{EnumPermError, ErrorCode, Result};

/// Source of answers for confirmations and selections.
pub trait Prompt: Send {
    /// Ask a yes/no question.
    fn confirm(&mut self, question: &str, default: bool) -> Result<bool>;

    /// Pick exactly one of `options`.
    fn select(&mut self, label: &str, options: &[String]) -> Result<String>;

    /// Pick any number of `options`, in the order they were offered.
    fn multi_select(&mut self, label: &str, options: &[String]) -> Result<Vec<String>>;
}

/// Answers yes to every confirmation and picks everything offered.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

impl Prompt for AssumeYes {
    fn confirm(&mut self, _question: &str, _default: bool) -> Result<bool> {
        Ok(true)
    }

    fn select(&mut self, label: &str, options: &[String]) -> Result<String> {
        options
            .first()
            .cloned()
            .ok_or_else(|| no_options(label))
    }

    fn multi_select(&mut self, _label: &str, options: &[String]) -> Result<Vec<String>> {
        Ok(options.to_vec())
    }
}

/// Declines every confirmation and selects nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeNo;

impl Prompt for AssumeNo {
    fn confirm(&mut self, _question: &str, _default: bool) -> Result<bool> {
        Ok(false)
    }

    fn select(&mut self, label: &str, _options: &[String]) -> Result<String> {
        Err(EnumPermError::new(
            ErrorCode::PromptCancelled,
            format!("No selection made for '{}'", label),
        ))
    }

    fn multi_select(&mut self, _label: &str, _options: &[String]) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

/// A queued answer for [`ScriptedPrompt`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Confirm(bool),
    Select(String),
    MultiSelect(Vec<String>),
}

/// Replays queued answers in order and records every question asked.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPrompt {
    answers: VecDeque<Answer>,
    asked: Vec<String>,
}

impl ScriptedPrompt {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            asked: Vec::new(),
        }
    }

    /// Questions and labels seen so far.
    pub fn asked(&self) -> &[String] {
        &self.asked
    }

    /// Answers not yet consumed.
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }

    fn next(&mut self, question: &str) -> Result<Answer> {
        self.asked.push(question.to_string());
        self.answers.pop_front().ok_or_else(|| {
            EnumPermError::new(
                ErrorCode::PromptFailed,
                format!("No scripted answer for '{}'", question),
            )
        })
    }
}

impl Prompt for ScriptedPrompt {
    fn confirm(&mut self, question: &str, _default: bool) -> Result<bool> {
        match self.next(question)? {
            Answer::Confirm(answer) => Ok(answer),
            other => Err(unexpected(question, &other)),
        }
    }

    fn select(&mut self, label: &str, options: &[String]) -> Result<String> {
        match self.next(label)? {
            Answer::Select(choice) if options.contains(&choice) => Ok(choice),
            other => Err(unexpected(label, &other)),
        }
    }

    fn multi_select(&mut self, label: &str, options: &[String]) -> Result<Vec<String>> {
        match self.next(label)? {
            Answer::MultiSelect(choices) if choices.iter().all(|c| options.contains(c)) => {
                Ok(choices)
            }
            other => Err(unexpected(label, &other)),
        }
    }
}

fn no_options(label: &str) -> EnumPermError {
    EnumPermError::new(
        ErrorCode::PromptFailed,
        format!("Nothing to choose from for '{}'", label),
    )
}

fn unexpected(question: &str, answer: &Answer) -> EnumPermError {
    EnumPermError::with_internal(
        ErrorCode::PromptFailed,
        format!("Scripted answer does not fit '{}'", question),
        format!("{:?}", answer),
    )
}
