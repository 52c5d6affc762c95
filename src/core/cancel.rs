//! Cancellation signal for the dispatcher.
//!
//! A [`CancelSource`] owns the sending half of a zero-capacity channel that is
//! never sent on. Cancelling drops it, which disconnects every [`CancelToken`],
//! so tokens can be waited on inside a `crossbeam_channel::Select`.

use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};
use parking_lot::Mutex;

#[derive(Debug)]
pub struct CancelSource {
    sender: Mutex<Option<Sender<()>>>,
    receiver: Receiver<()>,
}

impl CancelSource {
    pub fn new() -> Self {
        let (sender, receiver) = bounded(0);
        Self {
            sender: Mutex::new(Some(sender)),
            receiver,
        }
    }

    pub fn token(&self) -> CancelToken {
        CancelToken {
            receiver: Some(self.receiver.clone()),
        }
    }

    /// Signal every token. Later calls do nothing.
    pub fn cancel(&self) {
        self.sender.lock().take();
    }

    pub fn is_cancelled(&self) -> bool {
        self.sender.lock().is_none()
    }
}

impl Default for CancelSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer side of a [`CancelSource`]. Dropping the source also cancels.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    receiver: Option<Receiver<()>>,
}

impl CancelToken {
    /// A token that is never cancelled.
    pub fn never() -> Self {
        Self { receiver: None }
    }

    pub fn is_cancelled(&self) -> bool {
        match &self.receiver {
            Some(receiver) => matches!(receiver.try_recv(), Err(TryRecvError::Disconnected)),
            None => false,
        }
    }

    pub(crate) fn receiver(&self) -> Option<&Receiver<()>> {
        self.receiver.as_ref()
    }
}
