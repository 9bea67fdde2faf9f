//! Scripted executor for tests
//!
//! Answers commands from a fixed table and records every invocation, so tests
//! can assert exactly which gcloud calls a stage made.

use crate::error::Result;
use crate::executor::{CommandExecutor, CommandOutput};
use async_trait::async_trait;
use std::sync::Mutex;

/// Command executor answering from a table of `(args prefix, output)` rules
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    rules: Vec<(Vec<String>, CommandOutput)>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer any call whose arguments start with `prefix`.
    ///
    /// Rules are tried in insertion order. Unmatched calls fail with exit 127.
    pub fn on(mut self, prefix: &[&str], output: CommandOutput) -> Self {
        self.rules
            .push((prefix.iter().map(|s| s.to_string()).collect(), output));
        self
    }

    /// Every call made so far, program excluded
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of calls whose arguments start with `prefix`
    pub fn count(&self, prefix: &[&str]) -> usize {
        self.calls()
            .iter()
            .filter(|args| starts_with(args, prefix))
            .count()
    }
}

fn starts_with(args: &[String], prefix: &[&str]) -> bool {
    args.len() >= prefix.len() && args.iter().zip(prefix).all(|(a, p)| a == p)
}

#[async_trait]
impl CommandExecutor for ScriptedExecutor {
    async fn execute(&self, _program: &str, args: &[&str]) -> Result<CommandOutput> {
        let owned: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(owned.clone());
        }

        let output = self
            .rules
            .iter()
            .find(|(prefix, _)| {
                let prefix: Vec<&str> = prefix.iter().map(String::as_str).collect();
                starts_with(&owned, &prefix)
            })
            .map(|(_, output)| output.clone())
            .unwrap_or_else(|| {
                CommandOutput::failure(127, format!("unexpected command: {}", owned.join(" ")))
            });
        Ok(output)
    }
}
