//! Small future combinators.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Adds [`finally`](FinallyExt::finally) to every future.
pub trait FinallyExt: Future + Sized {
    /// Run `cleanup` once this future completes, whatever its output, or when
    /// it is dropped before completing.
    fn finally<F: FnOnce()>(self, cleanup: F) -> Finally<Self, F> {
        Finally {
            fut: Box::pin(self),
            cleanup: Some(cleanup),
        }
    }
}

impl<Fut: Future> FinallyExt for Fut {}

/// Future returned by [`FinallyExt::finally`].
pub struct Finally<Fut, F: FnOnce()> {
    fut: Pin<Box<Fut>>,
    cleanup: Option<F>,
}

// The cleanup closure is only ever moved out, never pinned.
impl<Fut, F: FnOnce()> Unpin for Finally<Fut, F> {}

impl<Fut: Future, F: FnOnce()> Future for Finally<Fut, F> {
    type Output = Fut::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match this.fut.as_mut().poll(cx) {
            Poll::Ready(output) => {
                if let Some(cleanup) = this.cleanup.take() {
                    cleanup();
                }
                Poll::Ready(output)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<Fut, F: FnOnce()> Drop for Finally<Fut, F> {
    fn drop(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
    }
}
