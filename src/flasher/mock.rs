//! Mock flasher invoker for testing.

use super::invoker::{FlasherInvoker, ToolOutput};
use crate::error::FlashError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One recorded tool run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
}

#[derive(Debug, Default)]
struct MockInvokerState {
    calls: Vec<Invocation>,
    /// Scripted results; `Ok` with empty output once exhausted.
    results: VecDeque<Result<ToolOutput, (Option<i32>, String)>>,
}

/// Records invocations instead of spawning anything.
///
/// Clones share state, so a test can keep one handle while the flasher owns
/// another.
#[derive(Debug, Clone, Default)]
pub struct MockInvoker {
    state: Arc<Mutex<MockInvokerState>>,
}

impl MockInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful run with the given output.
    pub fn then_succeed(&self, stdout: impl Into<String>, stderr: impl Into<String>) -> &Self {
        self.state.lock().results.push_back(Ok(ToolOutput {
            stdout: stdout.into(),
            stderr: stderr.into(),
        }));
        self
    }

    /// Queue a run that exits with `code` and prints `stderr`.
    pub fn then_exit(&self, code: i32, stderr: impl Into<String>) -> &Self {
        self.state
            .lock()
            .results
            .push_back(Err((Some(code), stderr.into())));
        self
    }

    /// Get a copy of all recorded invocations.
    pub fn calls(&self) -> Vec<Invocation> {
        self.state.lock().calls.clone()
    }
}

#[async_trait]
impl FlasherInvoker for MockInvoker {
    async fn invoke(&self, program: &Path, args: &[String]) -> Result<ToolOutput, FlashError> {
        let mut state = self.state.lock();
        state.calls.push(Invocation {
            program: program.to_path_buf(),
            args: args.to_vec(),
        });

        match state.results.pop_front() {
            None => Ok(ToolOutput::default()),
            Some(Ok(output)) => Ok(output),
            Some(Err((code, stderr))) => Err(FlashError::Failed {
                program: program.to_path_buf(),
                code,
                stdout: String::new(),
                stderr,
            }),
        }
    }
}
