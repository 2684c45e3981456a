use std::future::Future;
use std::pin::pin;
use std::sync::Arc;
use std::task::{Context, Poll, Wake, Waker};

use may::coroutine::{self, Coroutine};

/// Wakes a parked `may` coroutine
struct CoroutineWaker(Coroutine);

impl Wake for CoroutineWaker {
    fn wake(self: Arc<Self>) {
        self.0.unpark();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        self.0.unpark();
    }
}

/// Drive `future` to completion from the calling context.
///
/// On a `may` coroutine a pending future parks the coroutine, not the worker
/// thread, so other connections on the same worker keep being served. Outside a
/// coroutine this is `futures::executor::block_on`.
pub fn block_on<F: Future>(future: F) -> F::Output {
    if !coroutine::is_coroutine() {
        return futures::executor::block_on(future);
    }

    let waker = Waker::from(Arc::new(CoroutineWaker(coroutine::current())));
    let mut cx = Context::from_waker(&waker);
    let mut future = pin!(future);
    loop {
        if let Poll::Ready(output) = future.as_mut().poll(&mut cx) {
            return output;
        }
        // An unpark that lands before this park makes it return immediately
        coroutine::park();
    }
}
