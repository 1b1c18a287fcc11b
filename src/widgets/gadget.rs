use std::{
    ops::Deref,
    sync::atomic::{AtomicUsize, Ordering},
    sync::RwLock,
    time::{Duration, Instant},
};

use bevy_ecs::prelude::*;

/// Rotates through `inner`, advancing at most once per `duration`. Used for footer tips.
#[derive(Debug, Resource, Component)]
pub struct Carousel<T> {
    inner: Vec<T>,
    duration: Duration,
    index: AtomicUsize,
    last_time: RwLock<Instant>,
}

impl<T> Deref for Carousel<T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<T> Carousel<T> {
    pub fn new(inner: Vec<T>, duration: Duration) -> Self {
        Self {
            inner,
            duration,
            index: AtomicUsize::new(0),
            last_time: RwLock::new(Instant::now()),
        }
    }

    /// Current item, advancing first when its time is up.
    pub fn tick(&self) -> Option<&T> {
        self.tick_at(Instant::now())
    }

    fn tick_at(&self, now: Instant) -> Option<&T> {
        let elapsed = |last: &Instant| now.saturating_duration_since(*last) >= self.duration;
        if elapsed(&self.last_time.read().unwrap_or_else(std::sync::PoisonError::into_inner)) {
            let mut last_time = self
                .last_time
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            // a double check
            if elapsed(&last_time) {
                *last_time = now;
                self.index.fetch_add(1, Ordering::AcqRel);
            }
        }
        self.current()
    }

    pub fn current(&self) -> Option<&T> {
        if self.inner.is_empty() {
            return None;
        }
        let idx = self.index.load(Ordering::Relaxed) % self.inner.len();
        self.inner.get(idx)
    }
}
