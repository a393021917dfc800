//! Speech-to-text capture.
//!
//! A recognizer reports an incremental stream of results. The controller turns
//! each `Result` event into the new contents of the input field.

use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc::UnboundedSender;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    Started,
    /// All results of the session so far; `result_index` is the first one that changed.
    Result {
        result_index: usize,
        results: Vec<String>,
    },
    Error(String),
    Ended,
}

/// Continuous capture with interim results.
pub trait SpeechRecognizer: Send {
    fn start(&mut self, events: UnboundedSender<SpeechEvent>) -> Result<()>;
    fn stop(&mut self);
}

/// Concatenation of every result from `result_index` onward.
pub fn transcript_from(result_index: usize, results: &[String]) -> String {
    results.iter().skip(result_index).map(String::as_str).collect()
}

/// Runs a shell command and reads one recognition result per stdout line.
pub struct CommandRecognizer {
    command: String,
    child: Option<Child>,
}

impl CommandRecognizer {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
            child: None,
        }
    }

    fn is_running(&mut self) -> bool {
        match self.child.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }
}

impl SpeechRecognizer for CommandRecognizer {
    fn start(&mut self, events: UnboundedSender<SpeechEvent>) -> Result<()> {
        if self.is_running() {
            return Ok(());
        }

        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Speech("recognizer has no stdout".to_string()))?;

        tracing::info!(command = %self.command, "speech capture started");
        let _ = events.send(SpeechEvent::Started);

        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            let mut results: Vec<String> = Vec::new();

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        results.push(line.to_string());
                        let event = SpeechEvent::Result {
                            result_index: results.len() - 1,
                            results: results.clone(),
                        };
                        if events.send(event).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        let _ = events.send(SpeechEvent::Error(e.to_string()));
                        break;
                    }
                }
            }

            let _ = events.send(SpeechEvent::Ended);
        });

        self.child = Some(child);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.start_kill() {
                tracing::warn!(error = %e, "failed to stop speech capture");
            }
        }
    }
}
