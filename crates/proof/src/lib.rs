#![doc = include_str!("../README.md")]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod errors;
pub use errors::{OracleProviderError, ReplayError};

mod inbox;
pub use inbox::OracleInbox;

mod header;
pub use header::{
    delayed_messages_read, header_by_hash, nonce_from_delayed, ChainContext, HeaderExtraInfo,
    HeaderReader,
};

mod executor;
pub use executor::{BatchFetcher, ExecutionBackend, StateMode, SystemState, TapeBatchFetcher};

mod driver;
pub use driver::{ReplayDriver, ReplayOutcome};

use core::{
    future::Future,
    pin::pin,
    task::{Context, Poll, RawWaker, RawWakerVTable, Waker},
};

/// Drives a future to completion on the current thread.
///
/// The replay is single-threaded and every await point resolves as soon as
/// the host services the underlying tape read, so a busy poll loop with a
/// no-op waker is sufficient and keeps scheduling fully deterministic.
pub fn block_on<T>(future: impl Future<Output = T>) -> T {
    let mut future = pin!(future);

    fn noop_raw_waker() -> RawWaker {
        const VTABLE: RawWakerVTable =
            RawWakerVTable::new(|_| noop_raw_waker(), |_| {}, |_| {}, |_| {});
        RawWaker::new(core::ptr::null(), &VTABLE)
    }
    // SAFETY: the no-op vtable never dereferences its data pointer.
    let waker = unsafe { Waker::from_raw(noop_raw_waker()) };
    let mut context = Context::from_waker(&waker);

    loop {
        match future.as_mut().poll(&mut context) {
            Poll::Ready(value) => return value,
            Poll::Pending => continue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_on_drives_ready_future() {
        assert_eq!(block_on(async { 21 * 2 }), 42);
    }

    #[test]
    fn test_block_on_drives_nested_awaits() {
        async fn inner() -> u64 {
            7
        }
        let out = block_on(async { inner().await + inner().await });
        assert_eq!(out, 14);
    }
}
