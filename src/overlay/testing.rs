//! In-process stand-ins for the statistics endpoint.

use std::cell::RefCell;
use std::collections::VecDeque;

use tokio::sync::oneshot;

use crate::core::client::{FetchError, FetchFuture, StatsSource};
use crate::core::models::range::Range;
use crate::core::models::stats::{StatsPayload, StatsResponse};

type Reply = Result<StatsPayload, FetchError>;

enum Scripted {
    Now(Result<StatsResponse, FetchError>),
    Later(oneshot::Receiver<Reply>),
}

/// Answers requests from a queue and records every range asked for.
/// An exhausted queue answers with an empty payload.
#[derive(Default)]
pub struct ScriptedSource {
    replies: RefCell<VecDeque<Scripted>>,
    calls: RefCell<Vec<Range>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, reply: Reply) {
        self.reply_response(reply.map(StatsResponse::from));
    }

    /// Queue a full response, trend included.
    pub fn reply_response(&self, reply: Result<StatsResponse, FetchError>) {
        self.replies.borrow_mut().push_back(Scripted::Now(reply));
    }

    /// Queue a reply the test resolves by sending on the returned channel.
    pub fn reply_later(&self) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        self.replies.borrow_mut().push_back(Scripted::Later(rx));
        tx
    }

    pub fn calls(&self) -> Vec<Range> {
        self.calls.borrow().clone()
    }
}

impl StatsSource for ScriptedSource {
    fn fetch(&self, range: Range) -> FetchFuture {
        self.calls.borrow_mut().push(range);
        let next = self.replies.borrow_mut().pop_front();
        Box::pin(async move {
            match next {
                Some(Scripted::Now(reply)) => reply,
                Some(Scripted::Later(rx)) => rx
                    .await
                    .unwrap_or_else(|_| Err(FetchError::Transport("reply dropped".into())))
                    .map(StatsResponse::from),
                None => Ok(StatsResponse::default()),
            }
        })
    }
}
