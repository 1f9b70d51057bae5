use std::cell::RefCell;
use std::collections::VecDeque;

use dialoguer::{Confirm, Input, theme::ColorfulTheme};

use crate::error::{PlcollectError, Result};

/// Everything the run needs to ask the person at the keyboard.
pub trait Operator {
    /// Free-text answer. An empty answer becomes `default` when one is given.
    fn prompt(&self, question: &str, default: Option<&str>) -> Result<String>;

    /// Yes/no answer. Anything but an explicit yes counts as no.
    fn confirm(&self, question: &str) -> Result<bool>;
}

pub struct TerminalOperator {
    theme: ColorfulTheme,
}

impl TerminalOperator {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Default for TerminalOperator {
    fn default() -> Self {
        Self::new()
    }
}

impl Operator for TerminalOperator {
    fn prompt(&self, question: &str, default: Option<&str>) -> Result<String> {
        let mut input = Input::<String>::with_theme(&self.theme);
        input.with_prompt(question).allow_empty(true);
        if let Some(default) = default {
            input.default(default.to_string()).show_default(true);
        }

        let answer = input
            .interact_text()
            .map_err(|e| PlcollectError::Prompt(e.to_string()))?;

        Ok(answer.trim().to_string())
    }

    fn confirm(&self, question: &str) -> Result<bool> {
        Confirm::with_theme(&self.theme)
            .with_prompt(question)
            .default(false)
            .interact()
            .map_err(|e| PlcollectError::Prompt(e.to_string()))
    }
}

/// Replays canned answers instead of asking anyone, and records every
/// question put to it. Used for unattended runs and in tests.
///
/// A `prompt` with no queued answer takes the default (or an empty string);
/// a `confirm` with no queued answer is an error.
#[derive(Debug, Default)]
pub struct ScriptedOperator {
    answers: RefCell<VecDeque<String>>,
    confirmations: RefCell<VecDeque<bool>>,
    asked: RefCell<Vec<String>>,
}

impl ScriptedOperator {
    pub fn answering(confirmations: &[bool]) -> Self {
        ScriptedOperator {
            confirmations: RefCell::new(confirmations.iter().copied().collect()),
            ..Default::default()
        }
    }

    pub fn with_answers<S: AsRef<str>>(mut self, answers: &[S]) -> Self {
        self.answers = RefCell::new(answers.iter().map(|a| a.as_ref().to_string()).collect());
        self
    }

    /// Questions asked so far, in order.
    pub fn asked(&self) -> Vec<String> {
        self.asked.borrow().clone()
    }
}

impl Operator for ScriptedOperator {
    fn prompt(&self, question: &str, default: Option<&str>) -> Result<String> {
        self.asked.borrow_mut().push(question.to_string());
        let answer = self.answers.borrow_mut().pop_front().unwrap_or_default();
        if answer.trim().is_empty() {
            return Ok(default.unwrap_or_default().to_string());
        }
        Ok(answer.trim().to_string())
    }

    fn confirm(&self, question: &str) -> Result<bool> {
        self.asked.borrow_mut().push(question.to_string());
        self.confirmations
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| PlcollectError::Prompt(format!("no answer scripted for '{}'", question)))
    }
}
