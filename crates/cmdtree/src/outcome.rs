//! Invocation results.
//!
//! A plain command or group returns the value its action (or its resolved
//! subcommand) produced. A chained group returns every member's value, in the
//! order the members were typed.

use std::rc::Rc;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::identity::Identity;

/// What an invocation produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A single action's return value.
    Value(Value),
    /// The ordered results of a chain.
    Chain(ChainedOutputResults),
}

impl Outcome {
    /// Returns the single value, if this is not a chain.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Outcome::Value(value) => Some(value),
            Outcome::Chain(_) => None,
        }
    }

    /// Returns the chain results, if this is a chain.
    pub fn chain(&self) -> Option<&ChainedOutputResults> {
        match self {
            Outcome::Value(_) => None,
            Outcome::Chain(results) => Some(results),
        }
    }

    /// Consumes the outcome, returning the single value if there is one.
    pub fn into_value(self) -> Option<Value> {
        match self {
            Outcome::Value(value) => Some(value),
            Outcome::Chain(_) => None,
        }
    }
}

impl From<Value> for Outcome {
    fn from(value: Value) -> Self {
        Outcome::Value(value)
    }
}

impl From<ChainedOutputResults> for Outcome {
    fn from(results: ChainedOutputResults) -> Self {
        Outcome::Chain(results)
    }
}

impl Serialize for Outcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Outcome::Value(value) => value.serialize(serializer),
            Outcome::Chain(results) => results.serialize(serializer),
        }
    }
}

/// One chain member's result.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainedResult {
    /// Identity of the member that produced the value.
    pub command: Rc<Identity>,
    /// The member action's return value.
    pub value: Value,
}

impl Serialize for ChainedResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("command", &self.command.name())?;
        map.serialize_entry("alias", &self.command.alias())?;
        map.serialize_entry("result", &self.value)?;
        map.end()
    }
}

/// Ordered results of one chained invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChainedOutputResults {
    results: Vec<ChainedResult>,
}

impl ChainedOutputResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a member's result.
    pub fn add_result(&mut self, command: Rc<Identity>, value: Value) {
        self.results.push(ChainedResult { command, value });
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ChainedResult> {
        self.results.iter()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Just the values, in chain order.
    pub fn values(&self) -> Vec<&Value> {
        self.results.iter().map(|result| &result.value).collect()
    }
}

impl<'a> IntoIterator for &'a ChainedOutputResults {
    type Item = &'a ChainedResult;
    type IntoIter = std::slice::Iter<'a, ChainedResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

impl IntoIterator for ChainedOutputResults {
    type Item = ChainedResult;
    type IntoIter = std::vec::IntoIter<ChainedResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

impl Serialize for ChainedOutputResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.results.len()))?;
        for result in &self.results {
            seq.serialize_element(result)?;
        }
        seq.end()
    }
}
