//! Detached task spawning for the browser event loop and for stub hosts.

use std::{cell::RefCell, fmt, rc::Rc};

use futures::executor::{LocalPool, LocalSpawner};
use futures::future::LocalFutureObj;
use futures::task::{LocalSpawn, SpawnError};

#[derive(Debug, Clone, Copy, Default)]
/// [`LocalSpawn`] implementation backed by `wasm_bindgen_futures::spawn_local`.
///
/// Non-wasm builds have no event loop and refuse every task with [`SpawnError::shutdown`].
pub struct BrowserSpawner;

impl LocalSpawn for BrowserSpawner {
    fn spawn_local_obj(&self, future: LocalFutureObj<'static, ()>) -> Result<(), SpawnError> {
        #[cfg(target_arch = "wasm32")]
        {
            wasm_bindgen_futures::spawn_local(future);
            Ok(())
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            drop(future);
            Err(SpawnError::shutdown())
        }
    }
}

/// [`LocalSpawn`] implementation that queues tasks on a [`LocalPool`] owned by the host.
///
/// Tasks accumulate until [`QueuedSpawner::run_until_stalled`] drives them. Clones share the
/// same queue.
#[derive(Clone)]
pub struct QueuedSpawner {
    pool: Rc<RefCell<LocalPool>>,
    spawner: LocalSpawner,
}

impl QueuedSpawner {
    /// Creates a spawner over an empty queue.
    pub fn new() -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        Self {
            pool: Rc::new(RefCell::new(pool)),
            spawner,
        }
    }

    /// Runs queued tasks until none can make progress.
    ///
    /// Must not be called from inside another executor. Reentrant calls from a queued task are
    /// ignored.
    pub fn run_until_stalled(&self) {
        if let Ok(mut pool) = self.pool.try_borrow_mut() {
            pool.run_until_stalled();
        }
    }
}

impl Default for QueuedSpawner {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for QueuedSpawner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueuedSpawner").finish_non_exhaustive()
    }
}

impl LocalSpawn for QueuedSpawner {
    fn spawn_local_obj(&self, future: LocalFutureObj<'static, ()>) -> Result<(), SpawnError> {
        self.spawner.spawn_local_obj(future)
    }
}
