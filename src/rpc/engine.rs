//! The RPC engine capability the adapter delegates to.
//!
//! The adapter never looks inside a request beyond extracting it: method
//! lookup, parameter validation, batches and error objects are all owned by
//! the engine.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::oneshot;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("engine dropped its completion without responding")]
    CompletionDropped,
    #[error("engine task panicked")]
    Panicked,
}

/// An engine that resolves each request to either a JSON-RPC response
/// payload or nothing at all (notifications).
///
/// `request` is the decoded request, or `Value::Null` when decoding failed,
/// in which case the engine is expected to answer with a parse error.
#[async_trait]
pub trait RpcEngine: Send + Sync + 'static {
    async fn execute(&self, request: Value) -> Result<Option<Value>, EngineError>;
}

/// One-shot completion handed to callback-style engines.
///
/// Both methods take `self`, so a completion fires at most once.
#[derive(Debug)]
pub struct Completion {
    tx: oneshot::Sender<Option<Value>>,
}

impl Completion {
    pub fn respond(self, payload: Value) {
        self.finish(Some(payload));
    }

    pub fn no_content(self) {
        self.finish(None);
    }

    fn finish(self, reply: Option<Value>) {
        // The receiver is gone when the client disconnected.
        if self.tx.send(reply).is_err() {
            tracing::debug!("completion fired after the request was abandoned");
        }
    }
}

/// Engines written against a completion callback instead of a future.
pub trait CallbackEngine: Send + Sync + 'static {
    fn execute(&self, request: Value, completion: Completion);
}

/// Adapts a [`CallbackEngine`] to [`RpcEngine`].
pub struct Callback<E>(pub E);

#[async_trait]
impl<E: CallbackEngine> RpcEngine for Callback<E> {
    async fn execute(&self, request: Value) -> Result<Option<Value>, EngineError> {
        let (tx, rx) = oneshot::channel();
        self.0.execute(request, Completion { tx });
        rx.await.map_err(|_| EngineError::CompletionDropped)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    struct Immediate;

    impl CallbackEngine for Immediate {
        fn execute(&self, request: Value, completion: Completion) {
            if request.get("id").is_some() {
                completion.respond(json!({"jsonrpc": "2.0", "result": true, "id": request["id"]}));
            } else {
                completion.no_content();
            }
        }
    }

    struct Deferred;

    impl CallbackEngine for Deferred {
        fn execute(&self, _request: Value, completion: Completion) {
            tokio::spawn(async move {
                tokio::task::yield_now().await;
                completion.respond(json!({"jsonrpc": "2.0", "result": "later", "id": 7}));
            });
        }
    }

    struct Forgetful;

    impl CallbackEngine for Forgetful {
        fn execute(&self, _request: Value, completion: Completion) {
            drop(completion);
        }
    }

    #[tokio::test]
    async fn callback_payload_is_forwarded() {
        let reply = Callback(Immediate)
            .execute(json!({"jsonrpc": "2.0", "method": "x", "id": 3}))
            .await
            .expect("engine reply");
        assert_eq!(reply, Some(json!({"jsonrpc": "2.0", "result": true, "id": 3})));
    }

    #[tokio::test]
    async fn callback_no_content_is_forwarded() {
        let reply = Callback(Immediate)
            .execute(json!({"jsonrpc": "2.0", "method": "x"}))
            .await
            .expect("engine reply");
        assert_eq!(reply, None);
    }

    #[tokio::test]
    async fn callback_may_fire_from_another_task() {
        let reply = Callback(Deferred)
            .execute(Value::Null)
            .await
            .expect("engine reply");
        assert_eq!(reply, Some(json!({"jsonrpc": "2.0", "result": "later", "id": 7})));
    }

    #[tokio::test]
    async fn dropped_completion_is_an_error() {
        let err = Callback(Forgetful)
            .execute(Value::Null)
            .await
            .expect_err("dropped completion must fail");
        assert_eq!(err, EngineError::CompletionDropped);
    }
}
