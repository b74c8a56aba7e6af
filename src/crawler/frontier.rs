//! Crawl frontier: queued resources plus the set of claimed/external ones
//!
//! The frontier holds two disjoint collections:
//! - the queue of in-scope resources that were discovered but not yet claimed
//! - the done set of resources that were claimed for fetching or found on
//!   another host
//!
//! Each collection has its own mutex. Whenever both are needed they are
//! acquired queue first, then done.

use crate::url::{canonicalize, Link, Resource};
use crate::UrlResult;
use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Result of offering a raw link to the frontier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// Newly added to the queue
    Queued(Resource),
    /// Already queued or already done
    AlreadyKnown(Resource),
    /// On another host; recorded in the done set, never fetched
    External(Resource),
    /// On the base host but filtered by the relevance denylist
    OutOfScope(Resource),
    /// A `mailto:` link
    Mail(String),
    /// A scheme other than http(s) or mailto
    UnsupportedScheme(String),
}

/// FIFO queue with a membership index
#[derive(Debug, Default)]
struct Queue {
    order: VecDeque<Resource>,
    members: HashSet<Resource>,
}

impl Queue {
    fn contains(&self, resource: &Resource) -> bool {
        self.members.contains(resource)
    }

    fn push(&mut self, resource: Resource) {
        self.members.insert(resource.clone());
        self.order.push_back(resource);
    }

    fn pop(&mut self) -> Option<Resource> {
        let resource = self.order.pop_front()?;
        self.members.remove(&resource);
        Some(resource)
    }

    fn len(&self) -> usize {
        self.order.len()
    }
}

/// Shared crawl state for one run
///
/// # Invariants
///
/// - No resource is ever in the queue and the done set at the same time.
/// - A resource enters the done set at most once and never returns to the queue.
/// - Every resource is handed out by [`Frontier::claim_next`] at most once.
#[derive(Debug)]
pub struct Frontier {
    base_host: String,
    queue: Mutex<Queue>,
    done: Mutex<HashSet<Resource>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Frontier {
    /// Creates an empty frontier for the given base host (including port)
    pub fn new(base_host: impl Into<String>) -> Self {
        Self {
            base_host: base_host.into(),
            queue: Mutex::new(Queue::default()),
            done: Mutex::new(HashSet::new()),
        }
    }

    pub fn base_host(&self) -> &str {
        &self.base_host
    }

    /// Returns true if the resource lives on another host than the course
    pub fn is_external(&self, resource: &Resource) -> bool {
        resource.is_external_to(&self.base_host)
    }

    /// Resolves, canonicalizes and routes a raw link found on `reference`
    ///
    /// External resources go straight into the done set. In-scope resources
    /// are queued unless already queued or done; the membership check and
    /// the insert happen under one hold of both locks.
    ///
    /// # Errors
    ///
    /// Returns the parse error for a malformed link. Nothing is recorded.
    pub fn enqueue(&self, raw: &str, reference: Option<&Resource>) -> UrlResult<EnqueueOutcome> {
        let resource = match canonicalize(raw, reference)? {
            Link::Resource(resource) => resource,
            Link::Mail(address) => {
                tracing::info!("Found mail address: {}", address);
                return Ok(EnqueueOutcome::Mail(address));
            }
            Link::Unsupported(scheme) => {
                tracing::trace!("Skipping {} link: {}", scheme, raw);
                return Ok(EnqueueOutcome::UnsupportedScheme(scheme));
            }
        };

        Ok(self.enqueue_resource(resource))
    }

    /// Routes an already canonical resource
    pub fn enqueue_resource(&self, resource: Resource) -> EnqueueOutcome {
        if self.is_external(&resource) {
            lock(&self.done).insert(resource.clone());
            return EnqueueOutcome::External(resource);
        }

        if !resource.is_relevant() {
            return EnqueueOutcome::OutOfScope(resource);
        }

        let mut queue = lock(&self.queue);
        let done = lock(&self.done);
        if queue.contains(&resource) || done.contains(&resource) {
            return EnqueueOutcome::AlreadyKnown(resource);
        }
        drop(done);

        tracing::debug!("Enqueued {}", resource);
        queue.push(resource.clone());
        EnqueueOutcome::Queued(resource)
    }

    /// Atomically removes the next queued resource and marks it done
    ///
    /// Returns `None` when the queue is empty. The empty check, the pop and
    /// the insert into the done set happen under a single hold of the queue
    /// lock, so concurrent callers can never claim the same resource twice.
    pub fn claim_next(&self) -> Option<Resource> {
        let mut queue = lock(&self.queue);
        let resource = queue.pop()?;
        lock(&self.done).insert(resource.clone());
        Some(resource)
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.queue).len() == 0
    }

    pub fn queue_len(&self) -> usize {
        lock(&self.queue).len()
    }

    pub fn done_len(&self) -> usize {
        lock(&self.done).len()
    }

    /// Returns true if the resource is currently queued
    pub fn is_queued(&self, resource: &Resource) -> bool {
        lock(&self.queue).contains(resource)
    }

    /// Returns true if the resource was claimed or recorded as external
    pub fn is_done(&self, resource: &Resource) -> bool {
        lock(&self.done).contains(resource)
    }

    /// Copies the done set, read under its mutex
    pub fn done_snapshot(&self) -> Vec<Resource> {
        lock(&self.done).iter().cloned().collect()
    }
}
