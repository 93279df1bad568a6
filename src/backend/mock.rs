//! Scripted mock backend for exercising lifecycle flows without a server.
//!
//! Responses are queued per method. Each call pops the next queued
//! response; the last one repeats forever, which makes steady states
//! ("the VM stays running") a one-liner to script. Every call is recorded
//! so tests can assert exactly which remote operations were issued.

use super::{Arg, Remote};
use crate::error::{Error, Result};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

#[derive(Debug, Clone)]
enum Scripted {
    Respond(String),
    Fail(String),
}

/// A [`Remote`] implementation driven by scripted responses.
#[derive(Debug, Default)]
pub struct MockRemote {
    responses: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: Mutex<Vec<(String, Vec<Arg>)>>,
}

impl MockRemote {
    /// Create a mock with no scripted responses. Any call fails until a
    /// response is queued for its method.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response for `method`.
    pub fn respond(self, method: &str, body: &str) -> Self {
        self.push(method, Scripted::Respond(body.to_string()));
        self
    }

    /// Queue a call failure for `method`.
    pub fn fail(self, method: &str, message: &str) -> Self {
        self.push(method, Scripted::Fail(message.to_string()));
        self
    }

    fn push(&self, method: &str, scripted: Scripted) {
        self.responses
            .lock()
            .expect("mock response lock poisoned")
            .entry(method.to_string())
            .or_default()
            .push_back(scripted);
    }

    /// All recorded calls, in order.
    pub fn calls(&self) -> Vec<(String, Vec<Arg>)> {
        self.calls.lock().expect("mock call lock poisoned").clone()
    }

    /// How many times `method` was called.
    pub fn calls_to(&self, method: &str) -> usize {
        self.calls()
            .iter()
            .filter(|(recorded, _)| recorded == method)
            .count()
    }
}

impl Remote for MockRemote {
    fn call(&self, method: &str, args: &[Arg]) -> Result<String> {
        self.calls
            .lock()
            .expect("mock call lock poisoned")
            .push((method.to_string(), args.to_vec()));

        let mut responses = self.responses.lock().expect("mock response lock poisoned");
        let scripted = responses.get_mut(method).and_then(|queue| {
            if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            }
        });

        match scripted {
            Some(Scripted::Respond(body)) => Ok(body),
            Some(Scripted::Fail(message)) => Err(Error::remote(method, message)),
            None => Err(Error::remote(method, "no scripted response")),
        }
    }
}
