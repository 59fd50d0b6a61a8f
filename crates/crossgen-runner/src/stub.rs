//! An in-process stand-in for the sandbox.

use std::sync::{Arc, Mutex};

use crossgen_vfs::FileSystem;
use futures_util::future::BoxFuture;

use crate::error::RunnerResult;
use crate::{SandboxRequest, SchemaRunner};

type Handler = dyn Fn(&mut dyn FileSystem, &SandboxRequest) -> RunnerResult<()> + Send + Sync;

/// A [`SchemaRunner`] that applies a closure to the tree instead of starting a
/// container, recording every request it receives.
///
/// Used to exercise generators and the test builder without Docker.
#[derive(Clone)]
pub struct StubRunner {
    handler: Arc<Handler>,
    requests: Arc<Mutex<Vec<SandboxRequest>>>,
}

impl StubRunner {
    /// Creates a stub that runs `handler` for every request.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&mut dyn FileSystem, &SandboxRequest) -> RunnerResult<()> + Send + Sync + 'static,
    {
        Self {
            handler: Arc::new(handler),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Creates a stub that leaves the tree untouched.
    pub fn noop() -> Self {
        Self::new(|_, _| Ok(()))
    }

    /// Returns every request received so far.
    pub fn requests(&self) -> Vec<SandboxRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for StubRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StubRunner")
            .field("requests", &self.requests().len())
            .finish()
    }
}

impl SchemaRunner for StubRunner {
    fn generate<'a>(
        &'a self,
        fs: &'a mut dyn FileSystem,
        request: &'a SandboxRequest,
    ) -> BoxFuture<'a, RunnerResult<()>> {
        Box::pin(async move {
            if let Ok(mut requests) = self.requests.lock() {
                requests.push(request.clone());
            }
            (self.handler)(fs, request)
        })
    }
}
