//! Command lifecycle events

use serde::{Deserialize, Serialize};
use std::fmt;

/// Events bracketing one CLI command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandEvent {
    CommandStarted { command: String },
    CommandFinished { command: String, success: bool },
}

impl fmt::Display for CommandEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandEvent::CommandStarted { command } => write!(f, "{command} started"),
            CommandEvent::CommandFinished { command, success } => {
                let status = if *success { "succeeded" } else { "failed" };
                write!(f, "{command} {status}")
            }
        }
    }
}
