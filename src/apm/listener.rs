use std::fs::{File, OpenOptions};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, RwLock};

use crate::apm::event::{CommandStarted, CommandResult};
use crate::error::Result;
use crate::Client;

pub type StartHook = fn(Client, &CommandStarted);
pub type CompletionHook = fn(Client, &CommandResult);

// A list of hooks with a lock-free check for the common empty case.
struct Hooks<H> {
    empty: AtomicBool,
    hooks: RwLock<Vec<H>>,
}

impl<H: Copy> Hooks<H> {
    fn new() -> Hooks<H> {
        Hooks { empty: AtomicBool::new(true), hooks: RwLock::new(Vec::new()) }
    }

    fn add(&self, hook: H) -> Result<()> {
        self.hooks.write()?.push(hook);
        self.empty.store(false, Ordering::SeqCst);
        Ok(())
    }

    // Copies the hooks out so that none of them runs under the lock.
    fn snapshot(&self) -> Result<Vec<H>> {
        if self.empty.load(Ordering::SeqCst) {
            return Ok(Vec::new());
        }
        Ok(self.hooks.read()?.clone())
    }
}

/// Dispatches monitoring events to registered hooks and to the optional command log.
pub struct Listener {
    start_hooks: Hooks<StartHook>,
    completion_hooks: Hooks<CompletionHook>,
    log_file: Option<Mutex<File>>,
}

impl Listener {
    pub fn new() -> Listener {
        Listener {
            start_hooks: Hooks::new(),
            completion_hooks: Hooks::new(),
            log_file: None,
        }
    }

    /// Creates a listener that also appends every event to the file at `path`.
    pub fn with_log_file(path: &str) -> Result<Listener> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Listener { log_file: Some(Mutex::new(file)), ..Listener::new() })
    }

    pub fn add_start_hook(&self, hook: StartHook) -> Result<()> {
        self.start_hooks.add(hook)
    }

    pub fn add_completion_hook(&self, hook: CompletionHook) -> Result<()> {
        self.completion_hooks.add(hook)
    }

    pub fn run_start_hooks(&self, client: Client, started: &CommandStarted) -> Result<()> {
        self.log(started)?;
        for hook in self.start_hooks.snapshot()? {
            hook(client.clone(), started);
        }
        Ok(())
    }

    pub fn run_completion_hooks(&self, client: Client, result: &CommandResult) -> Result<()> {
        self.log(result)?;
        for hook in self.completion_hooks.snapshot()? {
            hook(client.clone(), result);
        }
        Ok(())
    }

    fn log<T: ::std::fmt::Display>(&self, event: &T) -> Result<()> {
        if let Some(ref file) = self.log_file {
            let mut guard = file.lock()?;
            writeln!(guard, "{}", event)?;
        }
        Ok(())
    }
}

/// Runs monitoring events through the listener owned by a client.
pub trait EventRunner {
    fn run_start_hooks(&self, hook: &CommandStarted) -> Result<()>;
    fn run_completion_hooks(&self, hook: &CommandResult) -> Result<()>;
}

impl EventRunner for Client {
    fn run_start_hooks(&self, hook: &CommandStarted) -> Result<()> {
        self.listener.run_start_hooks(self.clone(), hook)
    }

    fn run_completion_hooks(&self, hook: &CommandResult) -> Result<()> {
        self.listener.run_completion_hooks(self.clone(), hook)
    }
}
