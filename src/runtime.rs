//! Runtime abstraction for background metadata requests
//!
//! The control spawns fire-and-forget fetches and keeps their handles so a
//! style switch can cancel them. Tokio is used natively and
//! `wasm_bindgen_futures` in the browser; hosts can install their own
//! spawner with [`init_runtime`].

use crate::prelude::{Future, Pin};
use crate::{Result, StylerError};

/// `Send` where threads exist; nothing on wasm, where futures stay local.
#[cfg(not(target_arch = "wasm32"))]
pub trait MaybeSend: Send {}
#[cfg(not(target_arch = "wasm32"))]
impl<T: Send> MaybeSend for T {}

#[cfg(target_arch = "wasm32")]
pub trait MaybeSend {}
#[cfg(target_arch = "wasm32")]
impl<T> MaybeSend for T {}

#[cfg(not(target_arch = "wasm32"))]
pub type BoxTask = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;
#[cfg(target_arch = "wasm32")]
pub type BoxTask = Pin<Box<dyn Future<Output = ()> + 'static>>;

/// Spawns tasks (object-safe)
pub trait AsyncSpawner: Send + Sync + 'static {
    fn spawn_boxed(&self, task: BoxTask) -> Result<Box<dyn AsyncHandle>>;
}

/// Handle to a spawned task
pub trait AsyncHandle {
    fn is_finished(&self) -> bool;

    /// Stop the task at its next suspension point.
    fn cancel(&self);
}

/// Spawn on the installed runtime.
pub fn spawn<F>(future: F) -> Result<Box<dyn AsyncHandle>>
where
    F: Future<Output = ()> + MaybeSend + 'static,
{
    runtime()?.spawn_boxed(Box::pin(future))
}

/// Default spawner implementations
pub mod spawners {
    use super::*;

    #[cfg(all(feature = "tokio-runtime", not(target_arch = "wasm32")))]
    pub mod tokio_impl {
        use super::*;
        use ::tokio::task::JoinHandle;

        /// Spawns onto the ambient tokio runtime
        pub struct TokioSpawner;

        impl AsyncSpawner for TokioSpawner {
            fn spawn_boxed(&self, task: BoxTask) -> Result<Box<dyn AsyncHandle>> {
                let runtime = ::tokio::runtime::Handle::try_current()
                    .map_err(|e| StylerError::Config(format!("no tokio runtime: {e}")))?;
                Ok(Box::new(TokioHandle(runtime.spawn(task))))
            }
        }

        struct TokioHandle(JoinHandle<()>);

        impl AsyncHandle for TokioHandle {
            fn is_finished(&self) -> bool {
                self.0.is_finished()
            }

            fn cancel(&self) {
                self.0.abort();
            }
        }
    }

    #[cfg(feature = "wasm")]
    pub mod wasm {
        use super::*;
        use crate::prelude::{Arc, AtomicBool, Ordering};
        use futures::future::{AbortHandle, Abortable};

        /// Spawns onto the browser's microtask queue
        pub struct WasmSpawner;

        impl AsyncSpawner for WasmSpawner {
            fn spawn_boxed(&self, task: BoxTask) -> Result<Box<dyn AsyncHandle>> {
                let (abort, registration) = AbortHandle::new_pair();
                let finished = Arc::new(AtomicBool::new(false));
                let done = finished.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    let _ = Abortable::new(task, registration).await;
                    done.store(true, Ordering::Release);
                });
                Ok(Box::new(WasmHandle { abort, finished }))
            }
        }

        struct WasmHandle {
            abort: AbortHandle,
            finished: Arc<AtomicBool>,
        }

        impl AsyncHandle for WasmHandle {
            fn is_finished(&self) -> bool {
                self.finished.load(Ordering::Acquire)
            }

            fn cancel(&self) {
                self.abort.abort();
            }
        }
    }
}

/// Handles owned by one style session.
#[derive(Default)]
pub struct TaskSet {
    handles: Vec<Box<dyn AsyncHandle>>,
}

impl TaskSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, handle: Box<dyn AsyncHandle>) {
        self.handles.retain(|h| !h.is_finished());
        self.handles.push(handle);
    }

    /// Tasks not finished yet.
    pub fn running(&self) -> usize {
        self.handles.iter().filter(|h| !h.is_finished()).count()
    }

    pub fn cancel_all(&mut self) {
        let cancelled = self.handles.len();
        for handle in self.handles.drain(..) {
            handle.cancel();
        }
        if cancelled > 0 {
            log::debug!("cancelled {cancelled} background task(s)");
        }
    }
}

impl std::fmt::Debug for TaskSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskSet")
            .field("running", &self.running())
            .finish()
    }
}

/// Global runtime instance
static RUNTIME: std::sync::OnceLock<Box<dyn AsyncSpawner>> = std::sync::OnceLock::new();

/// Install a spawner. Only the first call wins.
pub fn init_runtime(spawner: Box<dyn AsyncSpawner>) {
    if RUNTIME.set(spawner).is_err() {
        log::warn!("async runtime already initialised");
    }
}

/// The installed spawner, or the one matching the enabled features.
pub fn runtime() -> Result<&'static dyn AsyncSpawner> {
    if let Some(spawner) = RUNTIME.get() {
        return Ok(spawner.as_ref());
    }

    #[cfg(all(feature = "tokio-runtime", not(target_arch = "wasm32")))]
    {
        Ok(RUNTIME
            .get_or_init(|| Box::new(spawners::tokio_impl::TokioSpawner))
            .as_ref())
    }

    #[cfg(all(feature = "wasm", target_arch = "wasm32"))]
    {
        Ok(RUNTIME
            .get_or_init(|| Box::new(spawners::wasm::WasmSpawner))
            .as_ref())
    }

    #[cfg(not(any(
        all(feature = "tokio-runtime", not(target_arch = "wasm32")),
        all(feature = "wasm", target_arch = "wasm32")
    )))]
    {
        Err(StylerError::Config(
            "no async runtime: enable 'tokio-runtime' or 'wasm'".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::{Arc, AtomicBool, Ordering};

    #[cfg(feature = "tokio-runtime")]
    #[::tokio::test]
    async fn test_tokio_spawner() {
        let handle = spawn(async {
            ::tokio::time::sleep(::tokio::time::Duration::from_millis(10)).await;
        })
        .unwrap();

        assert!(!handle.is_finished());

        ::tokio::time::sleep(::tokio::time::Duration::from_millis(50)).await;
        assert!(handle.is_finished());
    }

    #[cfg(feature = "tokio-runtime")]
    #[::tokio::test]
    async fn test_cancel_all_stops_tasks() {
        let flag = Arc::new(AtomicBool::new(false));
        let seen = flag.clone();
        let mut tasks = TaskSet::new();
        tasks.push(
            spawn(async move {
                ::tokio::time::sleep(::tokio::time::Duration::from_millis(20)).await;
                seen.store(true, Ordering::SeqCst);
            })
            .unwrap(),
        );
        assert_eq!(tasks.running(), 1);

        tasks.cancel_all();
        ::tokio::time::sleep(::tokio::time::Duration::from_millis(60)).await;
        assert!(!flag.load(Ordering::SeqCst));
        assert_eq!(tasks.running(), 0);
    }
}
