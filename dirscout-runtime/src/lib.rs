//! Tokio runtime ownership plus a root cancellation token.
//!
//! Every scraping run gets a child of the root token, so shutting the
//! runtime down cooperatively cancels whatever is in flight.
use anyhow::Result;
use std::future::Future;
use std::time::Duration;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct ScoutHandle {
    inner: Handle,
    cancel: CancellationToken,
}

pub struct ScoutRuntime {
    runtime: Runtime,
    cancel: CancellationToken,
}

impl ScoutRuntime {
    /// Build a multi-threaded Tokio runtime for the dirscout binaries.
    ///
    /// ```
    /// use dirscout_runtime::ScoutRuntime;
    /// use std::time::Duration;
    ///
    /// let runtime = ScoutRuntime::build("doctest-runtime", Some(1))
    ///     .expect("runtime builds");
    /// let value = runtime.block_on(async { 2 + 2 });
    /// assert_eq!(value, 4);
    /// runtime.shutdown(Duration::from_millis(10));
    /// ```
    pub fn build(thread_name: &str, worker_threads: Option<usize>) -> Result<Self> {
        let mut builder = Builder::new_multi_thread();
        builder.enable_all().thread_name(thread_name);

        if let Some(workers) = worker_threads {
            builder.worker_threads(workers.max(1));
        }

        let runtime = builder.build()?;
        Ok(Self {
            runtime,
            cancel: CancellationToken::new(),
        })
    }

    /// Obtain a cloned handle for spawning tasks and sharing cancellation.
    ///
    /// ```
    /// use dirscout_runtime::ScoutRuntime;
    ///
    /// let runtime = ScoutRuntime::build("handle-example", Some(1)).unwrap();
    /// let handle = runtime.handle();
    /// assert!(!handle.cancellation().is_cancelled());
    /// ```
    pub fn handle(&self) -> ScoutHandle {
        ScoutHandle {
            inner: self.runtime.handle().clone(),
            cancel: self.cancel.clone(),
        }
    }

    /// Run a future to completion on the runtime.
    pub fn block_on<F: Future>(&self, fut: F) -> F::Output {
        self.runtime.block_on(fut)
    }

    /// Cancel outstanding work and shut the runtime down, giving tasks
    /// `graceful` to observe the cancellation.
    ///
    /// ```
    /// use dirscout_runtime::ScoutRuntime;
    /// use std::time::Duration;
    ///
    /// let runtime = ScoutRuntime::build("shutdown-example", Some(1)).unwrap();
    /// let token = runtime.handle().child_token();
    /// runtime.shutdown(Duration::from_millis(5));
    /// assert!(token.is_cancelled());
    /// ```
    pub fn shutdown(self, graceful: Duration) {
        self.cancel.cancel();
        self.runtime.shutdown_timeout(graceful);
    }
}

impl ScoutHandle {
    /// Wrap the runtime the caller is already running on, with a fresh root
    /// token. Panics outside a Tokio runtime, like [`Handle::current`].
    pub fn current() -> Self {
        Self {
            inner: Handle::current(),
            cancel: CancellationToken::new(),
        }
    }

    /// Spawn a future onto the shared runtime handle.
    ///
    /// ```
    /// use dirscout_runtime::ScoutRuntime;
    /// use std::time::Duration;
    ///
    /// let runtime = ScoutRuntime::build("handle-doctest", Some(1)).unwrap();
    /// let handle = runtime.handle();
    /// let task = handle.spawn(async { 21 * 2 });
    /// let result = runtime.block_on(async move { task.await.unwrap() });
    /// assert_eq!(result, 42);
    /// runtime.shutdown(Duration::from_millis(10));
    /// ```
    pub fn spawn<F, T>(&self, fut: F) -> JoinHandle<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        self.inner.spawn(fut)
    }

    /// The root token; cancelling it stops every run started from this handle.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// A token cancelled by the root token but cancellable on its own.
    ///
    /// ```
    /// use dirscout_runtime::ScoutRuntime;
    /// use std::time::Duration;
    ///
    /// let runtime = ScoutRuntime::build("child-example", Some(1)).unwrap();
    /// let handle = runtime.handle();
    /// let child = handle.child_token();
    /// child.cancel();
    /// assert!(child.is_cancelled());
    /// assert!(!handle.cancellation().is_cancelled());
    /// runtime.shutdown(Duration::from_millis(5));
    /// ```
    pub fn child_token(&self) -> CancellationToken {
        self.cancel.child_token()
    }
}
