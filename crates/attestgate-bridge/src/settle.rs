// SPDX-License-Identifier: PMPL-1.0-or-later
//
// Single-settlement promise over a oneshot channel.
//
// The host runtime's dual-callback pattern (resolve/reject) is re-expressed
// as a `Promise` whose settle methods consume the handle, so a second
// settlement is unrepresentable. The paired `PendingCall` future suspends
// the caller until the settlement arrives.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use attestgate_core::AttestgateError;
use attestgate_core::error::Result;

/// Create a linked settle handle and pending future for one bridge call.
pub fn pending<T>() -> (Promise<T>, PendingCall<T>) {
    let (tx, rx) = oneshot::channel();
    (Promise { tx }, PendingCall { rx })
}

/// Settle handle for a single in-flight bridge call.
///
/// `resolve` and `reject` take `self` by value: every promise settles at
/// most once, enforced at the type level.
#[derive(Debug)]
pub struct Promise<T> {
    tx: oneshot::Sender<Result<T>>,
}

impl<T> Promise<T> {
    /// Settle the call successfully.
    pub fn resolve(self, value: T) {
        // A closed receiver means the caller gave up waiting; the settlement
        // still counts and is simply discarded.
        let _ = self.tx.send(Ok(value));
    }

    /// Settle the call as a failure.
    pub fn reject(self, error: AttestgateError) {
        let _ = self.tx.send(Err(error));
    }
}

/// Future side of a bridge call: completes with the settlement.
///
/// A promise dropped without settling completes the future with
/// `AttestgateError::Bridge` rather than leaving the caller pending forever.
#[derive(Debug)]
pub struct PendingCall<T> {
    rx: oneshot::Receiver<Result<T>>,
}

impl<T> Future for PendingCall<T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.get_mut().rx).poll(cx) {
            Poll::Ready(Ok(settlement)) => Poll::Ready(settlement),
            Poll::Ready(Err(_)) => Poll::Ready(Err(AttestgateError::Bridge(
                "call dropped before settling".into(),
            ))),
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolve_completes_the_pending_call() {
        let (promise, call) = pending::<bool>();
        promise.resolve(true);
        assert_eq!(call.await, Ok(true));
    }

    #[tokio::test]
    async fn reject_completes_with_the_error() {
        let (promise, call) = pending::<bool>();
        promise.reject(AttestgateError::Unavailable("out of date".into()));
        assert_eq!(
            call.await,
            Err(AttestgateError::Unavailable("out of date".into()))
        );
    }

    #[tokio::test]
    async fn dropped_promise_surfaces_as_bridge_error() {
        let (promise, call) = pending::<String>();
        drop(promise);
        match call.await {
            Err(AttestgateError::Bridge(msg)) => {
                assert!(msg.contains("dropped"));
            }
            other => panic!("expected Bridge error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn resolve_into_a_dropped_caller_does_not_panic() {
        let (promise, call) = pending::<bool>();
        drop(call);
        promise.resolve(true);
    }
}
