use std::future::Future;

use tokio::task::JoinHandle;

/// Owns the one background task that plays bot turns for a table.
///
/// Every state change that invalidates pending bot work (a new hand, a mode
/// switch, teardown) bumps the generation. A task captures the generation it
/// was spawned under and must compare it with [`BotScheduler::generation`]
/// while holding the table lock before it touches anything.
#[derive(Debug, Default)]
pub struct BotScheduler {
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl BotScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Invalidates and aborts any scheduled work.
    pub fn bump(&mut self) -> u64 {
        self.cancel();
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }

    /// Replaces the scheduled task.
    pub fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        self.task = Some(tokio::spawn(task));
    }

    /// Whether a spawned task is still running.
    #[cfg(test)]
    fn is_busy(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for BotScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
