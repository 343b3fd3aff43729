use pin_project_lite::pin_project;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::task::{JoinError, JoinHandle};

type Recover<T> = Box<dyn FnOnce(JoinError) -> T + Send>;

pin_project! {
    /// A store operation running on the blocking pool.
    ///
    /// Await it to get the outcome. The operation keeps running if the handle
    /// is dropped. If the task cannot complete (the runtime shut down before
    /// it started), the handle still resolves, to the operation's failure
    /// outcome.
    ///
    /// Outside a tokio runtime the operation runs on the calling thread when
    /// the handle is created and the handle is immediately ready.
    #[must_use = "the outcome is only observable by awaiting the handle"]
    pub struct OperationHandle<T> {
        #[pin]
        state: State<T>,
    }
}

pin_project! {
    #[project = StateProj]
    enum State<T> {
        Ready {
            value: Option<T>,
        },
        Running {
            #[pin]
            task: JoinHandle<T>,
            recover: Option<Recover<T>>,
        },
        Done,
    }
}

impl<T> OperationHandle<T>
where
    T: Send + 'static,
{
    pub(crate) fn spawn<F, R>(operation: F, recover: R) -> Self
    where
        F: FnOnce() -> T + Send + 'static,
        R: FnOnce(JoinError) -> T + Send + 'static,
    {
        let state = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => State::Running {
                task: runtime.spawn_blocking(operation),
                recover: Some(Box::new(recover)),
            },
            Err(_) => State::Ready {
                value: Some(operation()),
            },
        };
        Self { state }
    }
}

impl<T> OperationHandle<T> {
    /// A handle that is already complete.
    pub fn ready(value: T) -> Self {
        Self {
            state: State::Ready { value: Some(value) },
        }
    }

    /// Returns `true` once awaiting the handle would not wait.
    pub fn is_finished(&self) -> bool {
        match &self.state {
            State::Running { task, .. } => task.is_finished(),
            State::Ready { .. } | State::Done => true,
        }
    }
}

impl<T> Future for OperationHandle<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut this = self.project();
        let output = match this.state.as_mut().project() {
            StateProj::Ready { value } => value.take(),
            StateProj::Running { task, recover } => match task.poll(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Ok(value)) => Some(value),
                Poll::Ready(Err(error)) => recover.take().map(|recover| recover(error)),
            },
            StateProj::Done => None,
        };
        this.state.set(State::Done);

        match output {
            Some(value) => Poll::Ready(value),
            None => panic!("OperationHandle polled after completion"),
        }
    }
}

impl<T> fmt::Debug for OperationHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.state {
            State::Ready { .. } => "ready",
            State::Running { .. } => "running",
            State::Done => "done",
        };
        f.debug_struct("OperationHandle")
            .field("state", &state)
            .finish()
    }
}
