//! Test helpers: a scripted, recording stand-in for emacsclient.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

use crate::client::{ClientOutput, ClientRunner};

/// Replays queued outcomes in order and records every script it was given.
///
/// Clones share the same queue and call log. An empty queue behaves like a
/// missing server socket.
#[derive(Debug, Clone, Default)]
pub struct FakeRunner {
    inner: Arc<Mutex<FakeState>>,
}

#[derive(Debug, Default)]
struct FakeState {
    responses: VecDeque<io::Result<ClientOutput>>,
    calls: Vec<String>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fake whose first call is a successful liveness probe.
    pub fn live() -> Self {
        let fake = Self::new();
        fake.push_ok("3\n");
        fake
    }

    pub fn push_ok(&self, stdout: &str) {
        self.push_exit(0, stdout, "");
    }

    pub fn push_exit(&self, code: i32, stdout: &str, stderr: &str) {
        self.push(Ok(ClientOutput {
            success: code == 0,
            code: Some(code),
            stdout: stdout.to_owned(),
            stderr: stderr.to_owned(),
        }));
    }

    pub fn push_spawn_error(&self, message: &str) {
        self.push(Err(io::Error::new(io::ErrorKind::NotFound, message.to_owned())));
    }

    pub fn push_timeout(&self) {
        self.push(Err(io::Error::new(
            io::ErrorKind::TimedOut,
            "emacsclient timed out",
        )));
    }

    fn push(&self, response: io::Result<ClientOutput>) {
        self.lock().responses.push_back(response);
    }

    /// Scripts received so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl ClientRunner for FakeRunner {
    async fn run(&self, script: &str) -> io::Result<ClientOutput> {
        let mut state = self.lock();
        state.calls.push(script.to_owned());
        state.responses.pop_front().unwrap_or_else(|| {
            Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "emacsclient: can't find socket",
            ))
        })
    }
}
