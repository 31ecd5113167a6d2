//! Render hosts: where capture targets live
//!
//! A host resolves a [`RenderTarget`] to the scene currently laid out for it
//! and publishes a counter of completed render passes. The counter replaces
//! fixed settling delays: a caller that needs the target painted at least
//! once waits for the counter to become non-zero.

use crate::scene::Scene;
use export_model::RenderTarget;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

/// Source of laid-out scenes for capture
pub trait RenderHost: Send + Sync {
    /// The live scene for `target`, or `None` when it is not attached
    fn resolve(&self, target: &RenderTarget) -> Option<Arc<Scene>>;

    /// Completed render passes for `target`. The receiver may be taken
    /// before the target is attached.
    fn render_ready(&self, target: &RenderTarget) -> watch::Receiver<u64>;
}

/// Outcome of waiting for a first render pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderWait {
    /// At least one pass completed; carries the pass count seen
    Ready(u64),
    /// The bound elapsed before a pass completed
    TimedOut,
    /// The host dropped the target while waiting
    Detached,
}

/// Wait until `target` has completed at least one render pass, or `limit`
/// elapses.
pub async fn wait_for_render(
    host: &dyn RenderHost,
    target: &RenderTarget,
    limit: Duration,
) -> RenderWait {
    let mut passes = host.render_ready(target);
    let waited = tokio::time::timeout(limit, passes.wait_for(|count| *count > 0))
        .await
        .map(|r| r.map(|count| *count));
    match waited {
        Ok(Ok(count)) => RenderWait::Ready(count),
        Ok(Err(_)) => RenderWait::Detached,
        Err(_) => RenderWait::TimedOut,
    }
}

struct Slot {
    scene: Option<Arc<Scene>>,
    passes: watch::Sender<u64>,
}

impl Slot {
    fn new() -> Self {
        let (passes, _) = watch::channel(0);
        Self {
            scene: None,
            passes,
        }
    }
}

/// In-memory host for scenes produced by page renderers
#[derive(Default)]
pub struct SceneRegistry {
    slots: Mutex<HashMap<RenderTarget, Slot>>,
}

impl SceneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_slots<R>(&self, f: impl FnOnce(&mut HashMap<RenderTarget, Slot>) -> R) -> R {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut slots)
    }

    /// Lay out `scene` under `target`, replacing any previous scene. The
    /// target is not considered painted until [`present`](Self::present).
    pub fn attach(&self, target: &RenderTarget, scene: Scene) {
        let size = (scene.width, scene.height);
        self.with_slots(|slots| {
            let slot = slots.entry(target.clone()).or_insert_with(Slot::new);
            slot.scene = Some(Arc::new(scene));
        });
        tracing::debug!(%target, width = size.0, height = size.1, "scene attached");
    }

    /// Mark a render pass as complete. Returns the new pass count, or `None`
    /// when nothing is attached under `target`.
    pub fn present(&self, target: &RenderTarget) -> Option<u64> {
        let count = self.with_slots(|slots| {
            let slot = slots.get_mut(target)?;
            slot.scene.as_ref()?;
            slot.passes.send_modify(|count| *count += 1);
            Some(*slot.passes.borrow())
        });
        if let Some(count) = count {
            tracing::trace!(%target, pass = count, "render pass complete");
        }
        count
    }

    /// Remove `target`. Pending render waits observe the detach.
    pub fn detach(&self, target: &RenderTarget) -> bool {
        let removed = self.with_slots(|slots| slots.remove(target)).is_some();
        if removed {
            tracing::debug!(%target, "scene detached");
        }
        removed
    }

    pub fn is_attached(&self, target: &RenderTarget) -> bool {
        self.with_slots(|slots| slots.get(target).is_some_and(|s| s.scene.is_some()))
    }
}

impl RenderHost for SceneRegistry {
    fn resolve(&self, target: &RenderTarget) -> Option<Arc<Scene>> {
        self.with_slots(|slots| slots.get(target).and_then(|s| s.scene.clone()))
    }

    fn render_ready(&self, target: &RenderTarget) -> watch::Receiver<u64> {
        self.with_slots(|slots| {
            slots
                .entry(target.clone())
                .or_insert_with(Slot::new)
                .passes
                .subscribe()
        })
    }
}
