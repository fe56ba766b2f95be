//! Command lifecycle tracker: pending command correlation and auto-close
//! timers.
//!
//! The tracker is the only writer of pending commands and auto-close jobs.
//! Timers never touch state themselves: when one fires it enqueues
//! [`ControlMessage::AutoCloseDue`] on the controller channel, and the
//! controller asks [`CommandTracker::take_due`] whether the firing is still
//! the live one.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::AbortHandle;

use irrihub_domain::command::PendingCommand;
use irrihub_domain::id::CommandId;
use irrihub_domain::time::EpochMillis;

use crate::controller::ControlMessage;

struct AutoCloseJob {
    generation: u64,
    timer: AbortHandle,
}

fn job_key(valve_id: &str) -> String {
    format!("close:{valve_id}")
}

/// Pending commands awaiting acknowledgement and per-valve auto-close jobs.
pub struct CommandTracker {
    pending: HashMap<CommandId, PendingCommand>,
    jobs: HashMap<String, AutoCloseJob>,
    next_generation: u64,
    due: mpsc::WeakSender<ControlMessage>,
}

impl CommandTracker {
    /// Create a tracker whose timers report to the controller behind `due`.
    #[must_use]
    pub fn new(due: mpsc::WeakSender<ControlMessage>) -> Self {
        Self {
            pending: HashMap::new(),
            jobs: HashMap::new(),
            next_generation: 0,
            due,
        }
    }

    /// Start tracking `command`. Returns `false` (and keeps the existing
    /// entry) if its id is already tracked.
    pub fn register(&mut self, command: PendingCommand) -> bool {
        if self.pending.contains_key(&command.command_id) {
            return false;
        }
        self.pending.insert(command.command_id, command);
        true
    }

    /// Correlate an acknowledgement: remove the command and return its
    /// round-trip latency, `None` if the id is unknown.
    pub fn resolve(&mut self, command_id: &CommandId, responded_at: EpochMillis) -> Option<i64> {
        self.pending
            .remove(command_id)
            .map(|command| responded_at - command.requested_at)
    }

    /// Forget a command without computing a latency.
    pub fn discard(&mut self, command_id: &CommandId) -> bool {
        self.pending.remove(command_id).is_some()
    }

    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Replace the valve's auto-close job with one firing after `after`.
    /// Returns the generation of the new job.
    pub fn schedule_auto_close(&mut self, valve_id: &str, after: Duration) -> u64 {
        self.cancel_auto_close(valve_id);
        self.next_generation += 1;
        let generation = self.next_generation;

        let due = self.due.clone();
        let target = valve_id.to_string();
        let task = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            if let Some(sender) = due.upgrade() {
                let message = ControlMessage::AutoCloseDue {
                    valve_id: target,
                    generation,
                };
                if sender.send(message).await.is_err() {
                    tracing::debug!("controller gone before auto-close fired");
                }
            }
        });

        self.jobs.insert(
            job_key(valve_id),
            AutoCloseJob {
                generation,
                timer: task.abort_handle(),
            },
        );
        generation
    }

    /// Cancel the valve's auto-close job without firing it.
    pub fn cancel_auto_close(&mut self, valve_id: &str) -> bool {
        match self.jobs.remove(&job_key(valve_id)) {
            Some(job) => {
                job.timer.abort();
                true
            }
            None => false,
        }
    }

    /// Consume a timer firing. Returns `true` when `generation` is the live
    /// job of the valve, which is then removed; stale firings return `false`.
    pub fn take_due(&mut self, valve_id: &str, generation: u64) -> bool {
        let key = job_key(valve_id);
        match self.jobs.get(&key) {
            Some(job) if job.generation == generation => {
                self.jobs.remove(&key);
                true
            }
            _ => false,
        }
    }

    #[must_use]
    pub fn has_auto_close(&self, valve_id: &str) -> bool {
        self.jobs.contains_key(&job_key(valve_id))
    }
}

impl Drop for CommandTracker {
    fn drop(&mut self) {
        for job in self.jobs.values() {
            job.timer.abort();
        }
    }
}
