//! Bridge from the synchronous engine into async HTTP I/O.
//!
//! Plan execution is strictly sequential and blocking; the HTTP client is
//! async. Every send goes through [`block_on_future`], which reuses an ambient
//! Tokio runtime when one exists and otherwise spins up a current-thread one.

use anyhow::anyhow;
use std::future::Future;
use tokio::{runtime::Handle, task};

/// Drive `future` to completion from synchronous code.
///
/// Inside a multi-threaded runtime the current worker is handed over with
/// `block_in_place`; outside any runtime a throwaway current-thread runtime is
/// built. Calling this from a current-thread runtime panics, as
/// `block_in_place` does.
pub fn block_on_future<F, T>(future: F) -> anyhow::Result<T>
where
    F: Future<Output = anyhow::Result<T>> + Send + 'static,
    T: Send + 'static,
{
    if let Ok(handle) = Handle::try_current() {
        task::block_in_place(|| handle.block_on(future))
    } else {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|error| anyhow!(error))?
            .block_on(future)
    }
}
