use std::{
    future::Future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use bevy_ecs::{prelude::*, system::CommandQueue};
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{
    api::ApiError,
    data::{HasData, Slot},
};

/// The runtime page loads are spawned on. Systems may run on bevy's worker threads, which
/// carry no tokio context of their own.
pub fn runtime() -> tokio::runtime::Handle {
    crate::app::RT
        .get()
        .cloned()
        .unwrap_or_else(tokio::runtime::Handle::current)
}

/// In-flight loads owned by one page. Aborted together when the page's subject changes.
#[derive(Debug, Default)]
pub struct TaskSet {
    handles: Vec<JoinHandle<()>>,
}

impl TaskSet {
    pub fn spawn(&mut self, task: impl Future<Output = ()> + Send + 'static) {
        self.handles.retain(|handle| !handle.is_finished());
        self.handles.push(runtime().spawn(task));
    }

    pub fn abort_all(&mut self) {
        for handle in self.handles.drain(..) {
            handle.abort();
        }
    }

    pub fn len(&self) -> usize {
        self.handles.iter().filter(|h| !h.is_finished()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for TaskSet {
    fn drop(&mut self) {
        self.abort_all();
    }
}

/// Monotonic counter shared with spawned loads. A result stamped with an older value
/// than the current one is dropped on arrival.
#[derive(Clone, Debug, Default)]
pub struct Generation(Arc<AtomicU64>);

impl Generation {
    pub fn current(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    /// Starts a new generation and returns it.
    pub fn bump(&self) -> u64 {
        self.0.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.current() == generation
    }
}

/// Where a finished load is delivered.
pub struct Delivery {
    pub tx: mpsc::UnboundedSender<CommandQueue>,
    pub generation: Generation,
    /// Request name for the log, e.g. `profile`.
    pub name: &'static str,
    pub symbol: Option<String>,
}

/// Spawns `request` on `tasks`; its outcome becomes a [`Slot`] handed to `apply` on the
/// ECS thread, unless the generation moved on in the meantime.
pub fn spawn_load<T, F>(
    tasks: &mut TaskSet,
    delivery: Delivery,
    request: impl Future<Output = Result<T, ApiError>> + Send + 'static,
    apply: F,
) where
    T: HasData + Send + 'static,
    F: FnOnce(&mut World, Slot<T>) + Send + 'static,
{
    let Delivery {
        tx,
        generation,
        name,
        symbol,
    } = delivery;
    let stamp = generation.current();
    tasks.spawn(async move {
        let result = request.await;
        if let Err(err) = &result {
            match err {
                ApiError::NotFound => {
                    tracing::warn!(request = name, symbol = ?symbol, "no data");
                }
                err => {
                    tracing::error!(request = name, symbol = ?symbol, error = %err, "load failed");
                }
            }
        }
        if !generation.is_current(stamp) {
            tracing::debug!(request = name, symbol = ?symbol, "dropping stale result");
            return;
        }
        let slot = Slot::from_result(result);
        let mut queue = CommandQueue::default();
        queue.push(move |world: &mut World| {
            // a newer load may have started while this queue was waiting
            if generation.is_current(stamp) {
                apply(world, slot);
            }
        });
        _ = tx.send(queue);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[derive(Resource, Default)]
    struct Target(Slot<Vec<u32>>);

    fn delivery(
        tx: &mpsc::UnboundedSender<CommandQueue>,
        generation: &Generation,
    ) -> Delivery {
        Delivery {
            tx: tx.clone(),
            generation: generation.clone(),
            name: "test",
            symbol: None,
        }
    }

    fn store(world: &mut World, slot: Slot<Vec<u32>>) {
        world.resource_mut::<Target>().0 = slot;
    }

    #[tokio::test]
    async fn current_results_are_applied() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let generation = Generation::default();
        let mut tasks = TaskSet::default();
        let mut world = World::new();
        world.init_resource::<Target>();

        spawn_load(&mut tasks, delivery(&tx, &generation), async { Ok(vec![1, 2]) }, store);
        let mut queue = rx.recv().await.expect("queue");
        queue.apply(&mut world);
        assert_eq!(world.resource::<Target>().0, Slot::Ready(vec![1, 2]));
    }

    #[tokio::test]
    async fn stale_results_never_overwrite_newer_state() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let generation = Generation::default();
        let mut tasks = TaskSet::default();
        let mut world = World::new();
        world.insert_resource(Target(Slot::Ready(vec![7])));

        spawn_load(&mut tasks, delivery(&tx, &generation), async { Ok(vec![1]) }, store);
        // the result is already queued when the subject changes
        let mut queue = rx.recv().await.expect("queue");
        generation.bump();
        queue.apply(&mut world);
        assert_eq!(world.resource::<Target>().0, Slot::Ready(vec![7]));
    }

    #[tokio::test]
    async fn aborted_loads_deliver_nothing() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let generation = Generation::default();
        let mut tasks = TaskSet::default();

        spawn_load(
            &mut tasks,
            delivery(&tx, &generation),
            async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(vec![1u32])
            },
            store,
        );
        assert_eq!(tasks.len(), 1);
        tasks.abort_all();
        generation.bump();
        drop(tx);
        assert!(rx.recv().await.is_none());
        assert!(tasks.is_empty());
    }

    #[tokio::test]
    async fn failures_and_empty_payloads_map_to_slots() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let generation = Generation::default();
        let mut tasks = TaskSet::default();
        let mut world = World::new();
        world.init_resource::<Target>();

        spawn_load(
            &mut tasks,
            delivery(&tx, &generation),
            async { Err(ApiError::RateLimited) },
            store,
        );
        rx.recv().await.expect("queue").apply(&mut world);
        assert!(world.resource::<Target>().0.is_failed());

        spawn_load(&mut tasks, delivery(&tx, &generation), async { Ok(vec![]) }, store);
        rx.recv().await.expect("queue").apply(&mut world);
        assert_eq!(world.resource::<Target>().0, Slot::Empty);
    }
}
