use std::collections::VecDeque;
use std::sync::Mutex;

use common::{CommandLine, ProcessOutput, ProcessRunner};

/// Scripted result of one process invocation
#[derive(Debug, Clone)]
pub enum Reply {
    Exit(i32, String),
    SpawnError(std::io::ErrorKind),
}

impl Reply {
    pub fn ok(output: impl Into<String>) -> Self {
        Reply::Exit(0, output.into())
    }

    pub fn fail(code: i32, output: impl Into<String>) -> Self {
        Reply::Exit(code, output.into())
    }
}

/// Runner that records every invocation instead of spawning it.
///
/// Replies are consumed in order; once the script runs out every call succeeds with no output.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<CommandLine>>,
    replies: Mutex<VecDeque<Reply>>,
    // for each call, the local directories named in its arguments that existed when it ran
    existing_dirs: Mutex<Vec<Vec<String>>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replies(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<CommandLine> {
        self.calls.lock().unwrap().clone()
    }

    pub fn existing_dirs(&self) -> Vec<Vec<String>> {
        self.existing_dirs.lock().unwrap().clone()
    }
}

impl ProcessRunner for RecordingRunner {
    async fn run(&self, command: &CommandLine) -> std::io::Result<ProcessOutput> {
        self.calls.lock().unwrap().push(command.clone());
        let dirs = command
            .args
            .iter()
            .filter(|arg| arg.starts_with('/') && std::path::Path::new(arg).is_dir())
            .cloned()
            .collect();
        self.existing_dirs.lock().unwrap().push(dirs);
        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            None => Ok(ProcessOutput {
                code: Some(0),
                output: Vec::new(),
            }),
            Some(Reply::Exit(code, output)) => Ok(ProcessOutput {
                code: Some(code),
                output: output.into_bytes(),
            }),
            Some(Reply::SpawnError(kind)) => Err(std::io::Error::from(kind)),
        }
    }
}
