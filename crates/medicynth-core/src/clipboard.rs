use std::io::Write;
use std::process::{Command, Stdio};

use crate::error::{Error, Result};

/// Writes a string to the system clipboard.
pub trait Clipboard: Send {
    fn write_text(&self, text: &str) -> Result<()>;
}

const CANDIDATES: &[(&str, &[&str])] = &[
    ("pbcopy", &[]),
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
];

/// Pipes text into the first clipboard tool found on the system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl SystemClipboard {
    fn pipe_into(program: &str, args: &[&str], text: &str) -> std::io::Result<bool> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes())?;
        }
        Ok(child.wait()?.success())
    }
}

impl Clipboard for SystemClipboard {
    fn write_text(&self, text: &str) -> Result<()> {
        for (program, args) in CANDIDATES {
            match Self::pipe_into(program, args, text) {
                Ok(true) => return Ok(()),
                Ok(false) => tracing::debug!(program, "clipboard tool exited with failure"),
                Err(e) => tracing::debug!(program, error = %e, "clipboard tool unavailable"),
            }
        }
        Err(Error::Clipboard("no clipboard tool available".to_string()))
    }
}
