//! Small command set used by the unit tests in this crate.

use std::sync::Arc;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use crate::app::{Accepted, Module};
use crate::command::{Command, Query, TypedQuery};
use crate::error::HandlerError;
use crate::log::MemoryCommandLog;
use crate::registry::{CommandRegistry, JsonCodec};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fail {
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum TestCommand {
    Skip,
    Note(Note),
    Fail(Fail),
}

impl Command for TestCommand {
    fn kind(&self) -> &'static str {
        match self {
            TestCommand::Skip => "Skip",
            TestCommand::Note(_) => "Note",
            TestCommand::Fail(_) => "Fail",
        }
    }

    fn noop() -> Self {
        TestCommand::Skip
    }

    fn is_noop(&self) -> bool {
        matches!(self, TestCommand::Skip)
    }
}

pub fn note(text: &str) -> TestCommand {
    TestCommand::Note(Note { text: text.into() })
}

pub fn fail(reason: &str) -> TestCommand {
    TestCommand::Fail(Fail {
        reason: reason.into(),
    })
}

pub fn codec() -> JsonCodec<TestCommand> {
    let mut registry = CommandRegistry::new();
    registry
        .register::<()>("Skip", |()| TestCommand::Skip)
        .register::<Note>("Note", TestCommand::Note)
        .register::<Fail>("Fail", TestCommand::Fail);
    JsonCodec::new(Arc::new(registry))
}

pub fn memory_log() -> Arc<MemoryCommandLog<TestCommand>> {
    Arc::new(MemoryCommandLog::new(codec()))
}

#[derive(Debug, Clone, PartialEq)]
pub enum TestQuery {
    Notes,
    Unanswered,
}

impl Query for TestQuery {
    fn kind(&self) -> &'static str {
        match self {
            TestQuery::Notes => "Notes",
            TestQuery::Unanswered => "Unanswered",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TestResult {
    Notes(Vec<String>),
}

pub struct AllNotes;

impl TypedQuery<TestQuery, TestResult> for AllNotes {
    type Output = Vec<String>;

    fn into_query(self) -> TestQuery {
        TestQuery::Notes
    }

    fn from_result(result: TestResult) -> Option<Vec<String>> {
        match result {
            TestResult::Notes(notes) => Some(notes),
        }
    }
}

/// Records notes. Rejects `Fail` commands; upper-cases notes when `shouting`.
#[derive(Default)]
pub struct Notebook {
    pub notes: Vec<String>,
    pub shouting: bool,
}

impl Module<TestCommand, TestQuery, TestResult> for Notebook {
    fn name(&self) -> &'static str {
        "notebook"
    }

    fn handle_command(&mut self, command: &TestCommand) -> Result<Accepted<TestCommand>, HandlerError> {
        match command {
            TestCommand::Note(note) if self.shouting => {
                let text = note.text.to_uppercase();
                self.notes.push(text.clone());
                Ok(Accepted::Canonical(TestCommand::Note(Note { text })))
            }
            TestCommand::Note(note) => {
                self.notes.push(note.text.clone());
                Ok(Accepted::AsIs)
            }
            TestCommand::Fail(fail) => Err(HandlerError::Rejected(anyhow!("{}", fail.reason))),
            TestCommand::Skip => Err(HandlerError::NotAccepted),
        }
    }

    fn handle_query(&self, query: &TestQuery) -> Result<TestResult, HandlerError> {
        match query {
            TestQuery::Notes => Ok(TestResult::Notes(self.notes.clone())),
            TestQuery::Unanswered => Err(HandlerError::NotAccepted),
        }
    }
}

/// Accepts everything, answers nothing. Counts what it saw.
#[derive(Default)]
pub struct Tally {
    pub seen: usize,
}

impl Module<TestCommand, TestQuery, TestResult> for Tally {
    fn name(&self) -> &'static str {
        "tally"
    }

    fn handle_command(&mut self, _command: &TestCommand) -> Result<Accepted<TestCommand>, HandlerError> {
        self.seen += 1;
        Ok(Accepted::AsIs)
    }
}
