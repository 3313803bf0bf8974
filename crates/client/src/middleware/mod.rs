//! The middleware onion: an ordered, named, mutable chain of request
//! interceptors wrapping the transport provider.
//!
//! Layers are stored outermost-first; the outermost layer is the first to see
//! a request and the last to see its response. A layer may rewrite outgoing
//! params, short-circuit with a synthesized response, call the rest of the
//! chain several times (retry), or pass through unchanged.

use crate::error::ClientError;
use crate::provider::{AsyncProvider, Provider};
use bubble_common::RpcResponse;
use futures::future::BoxFuture;
use serde_json::Value;
use std::sync::Arc;

mod filter;
mod formatting;
mod retry;

pub use filter::{block_ranges, LocalFilterMiddleware};
pub use formatting::{poa_middleware, FormattingMiddleware, ResultTransform};
pub use retry::{check_if_retry_on_failure, RetryMiddleware, RETRY_ALLOW_LIST};

/// A blocking request interceptor.
pub trait Middleware: Send + Sync {
    /// Handles one request, delegating to `next` zero or more times.
    fn handle(
        &self,
        method: &str,
        params: Value,
        next: Next<'_>,
    ) -> Result<RpcResponse, ClientError>;
}

/// A suspending request interceptor.
pub trait AsyncMiddleware: Send + Sync {
    /// Handles one request, delegating to `next` zero or more times.
    fn handle<'a>(
        &'a self,
        method: &'a str,
        params: Value,
        next: AsyncNext<'a>,
    ) -> BoxFuture<'a, Result<RpcResponse, ClientError>>;
}

/// Cursor over the remaining inner layers of a blocking pipeline.
///
/// `Copy`, so a layer can invoke the rest of the chain more than once.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    layers: &'a [NamedLayer<Arc<dyn Middleware>>],
    provider: &'a dyn Provider,
}

impl<'a> Next<'a> {
    /// Passes the request to the next inner layer, or to the provider when no
    /// layers remain.
    pub fn run(self, method: &str, params: Value) -> Result<RpcResponse, ClientError> {
        match self.layers.split_first() {
            Some((first, rest)) => first.layer.handle(
                method,
                params,
                Next { layers: rest, provider: self.provider },
            ),
            None => self.provider.request(method, params),
        }
    }
}

/// Cursor over the remaining inner layers of a suspending pipeline.
#[derive(Clone, Copy)]
pub struct AsyncNext<'a> {
    layers: &'a [NamedLayer<Arc<dyn AsyncMiddleware>>],
    provider: &'a dyn AsyncProvider,
}

impl<'a> AsyncNext<'a> {
    /// Passes the request to the next inner layer, or to the provider when no
    /// layers remain.
    pub fn run(
        self,
        method: &'a str,
        params: Value,
    ) -> BoxFuture<'a, Result<RpcResponse, ClientError>> {
        match self.layers.split_first() {
            Some((first, rest)) => first.layer.handle(
                method,
                params,
                AsyncNext { layers: rest, provider: self.provider },
            ),
            None => self.provider.request(method, params),
        }
    }
}

/// A layer together with its unique name.
#[derive(Clone)]
pub struct NamedLayer<L> {
    /// Unique name used for positional mutation.
    pub name: String,
    /// The layer itself.
    pub layer: L,
}

/// Where to insert a layer into the onion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Position {
    /// First to see requests, last to see responses.
    Outermost,
    /// Directly wrapping the provider.
    Innermost,
    /// Immediately outside the named layer.
    Before(String),
    /// Immediately inside the named layer.
    After(String),
    /// Explicit index counted from the provider side; `Layer(0)` is
    /// innermost.
    Layer(usize),
}

/// Ordered, uniquely named collection of middleware layers.
///
/// Layer order is execution order: index 0 is outermost. The collection is
/// generic over the layer type so the blocking and suspending pipelines share
/// the mutation logic.
#[derive(Clone, Default)]
pub struct Onion<L> {
    layers: Vec<NamedLayer<L>>,
}

impl<L> Onion<L> {
    /// Creates an empty onion.
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// The current layers, outermost first.
    pub fn layers(&self) -> &[NamedLayer<L>] {
        &self.layers
    }

    /// The current layer names, outermost first.
    pub fn names(&self) -> Vec<&str> {
        self.layers.iter().map(|l| l.name.as_str()).collect()
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.layers.iter().position(|l| l.name == name)
    }

    /// Inserts a layer at the given position.
    ///
    /// Fails if the name is already taken, a referenced layer does not exist,
    /// or an explicit index is out of range.
    pub fn inject(
        &mut self,
        name: impl Into<String>,
        layer: L,
        position: Position,
    ) -> Result<(), ClientError> {
        let name = name.into();
        if self.index_of(&name).is_some() {
            return Err(ClientError::DuplicateLayer(name));
        }
        let index = match position {
            Position::Outermost => 0,
            Position::Innermost => self.layers.len(),
            Position::Before(anchor) => {
                self.index_of(&anchor).ok_or(ClientError::UnknownLayer(anchor))?
            }
            Position::After(anchor) => {
                self.index_of(&anchor).ok_or(ClientError::UnknownLayer(anchor))? + 1
            }
            Position::Layer(n) => {
                if n > self.layers.len() {
                    return Err(ClientError::UnknownLayer(format!("layer {n}")));
                }
                self.layers.len() - n
            }
        };
        self.layers.insert(index, NamedLayer { name, layer });
        Ok(())
    }

    /// Removes the named layer, returning it.
    pub fn remove(&mut self, name: &str) -> Result<L, ClientError> {
        let index = self.index_of(name).ok_or_else(|| ClientError::UnknownLayer(name.into()))?;
        Ok(self.layers.remove(index).layer)
    }

    /// Swaps the named layer for a new one, keeping its position and name.
    pub fn replace(&mut self, name: &str, layer: L) -> Result<L, ClientError> {
        let index = self.index_of(name).ok_or_else(|| ClientError::UnknownLayer(name.into()))?;
        Ok(std::mem::replace(&mut self.layers[index].layer, layer))
    }
}

impl Onion<Arc<dyn Middleware>> {
    /// Sends a request through every layer down to the provider.
    pub fn dispatch(
        &self,
        provider: &dyn Provider,
        method: &str,
        params: Value,
    ) -> Result<RpcResponse, ClientError> {
        Next { layers: &self.layers, provider }.run(method, params)
    }
}

impl Onion<Arc<dyn AsyncMiddleware>> {
    /// Sends a request through every layer down to the provider.
    pub fn dispatch<'a>(
        &'a self,
        provider: &'a dyn AsyncProvider,
        method: &'a str,
        params: Value,
    ) -> BoxFuture<'a, Result<RpcResponse, ClientError>> {
        AsyncNext { layers: &self.layers, provider }.run(method, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockProvider;
    use parking_lot::Mutex;
    use serde_json::json;

    /// Records its name on the way in and on the way out.
    struct Recorder {
        tag: &'static str,
        trace: Arc<Mutex<Vec<String>>>,
    }

    impl Middleware for Recorder {
        fn handle(
            &self,
            method: &str,
            params: Value,
            next: Next<'_>,
        ) -> Result<RpcResponse, ClientError> {
            self.trace.lock().push(format!("{}.before", self.tag));
            let response = next.run(method, params);
            self.trace.lock().push(format!("{}.after", self.tag));
            response
        }
    }

    fn recorder(tag: &'static str, trace: &Arc<Mutex<Vec<String>>>) -> Arc<dyn Middleware> {
        Arc::new(Recorder { tag, trace: trace.clone() })
    }

    #[test]
    fn layers_run_in_injection_order_and_unwind_in_reverse() {
        let trace: Arc<Mutex<Vec<String>>> = Arc::default();
        let provider = MockProvider::new();
        provider.set_result("bub_blockNumber", json!("0x10"));

        let mut onion: Onion<Arc<dyn Middleware>> = Onion::new();
        onion.inject("a", recorder("A", &trace), Position::Innermost).unwrap();
        onion.inject("b", recorder("B", &trace), Position::Innermost).unwrap();

        onion.dispatch(&provider, "bub_blockNumber", json!([])).unwrap();

        assert_eq!(
            trace.lock().clone(),
            vec!["A.before", "B.before", "B.after", "A.after"]
        );
    }

    #[test]
    fn positional_insertion() {
        let mut onion: Onion<&'static str> = Onion::new();
        onion.inject("outer", "outer", Position::Outermost).unwrap();
        onion.inject("inner", "inner", Position::Innermost).unwrap();
        onion.inject("mid", "mid", Position::Before("inner".into())).unwrap();
        assert_eq!(onion.names(), vec!["outer", "mid", "inner"]);

        // Layer indices count from the provider side.
        onion.inject("zero", "zero", Position::Layer(0)).unwrap();
        assert_eq!(onion.names(), vec!["outer", "mid", "inner", "zero"]);
        onion.inject("top", "top", Position::Layer(4)).unwrap();
        assert_eq!(onion.names(), vec!["top", "outer", "mid", "inner", "zero"]);
    }

    #[test]
    fn duplicate_and_unknown_names_are_rejected() {
        let mut onion: Onion<&'static str> = Onion::new();
        onion.inject("a", "a", Position::Outermost).unwrap();
        assert!(matches!(
            onion.inject("a", "again", Position::Outermost),
            Err(ClientError::DuplicateLayer(_))
        ));
        assert!(matches!(
            onion.inject("b", "b", Position::Before("missing".into())),
            Err(ClientError::UnknownLayer(_))
        ));
        assert!(matches!(onion.remove("missing"), Err(ClientError::UnknownLayer(_))));
    }

    #[test]
    fn replace_keeps_position() {
        let mut onion: Onion<&'static str> = Onion::new();
        onion.inject("a", "a", Position::Outermost).unwrap();
        onion.inject("b", "b", Position::Innermost).unwrap();
        let old = onion.replace("a", "a2").unwrap();
        assert_eq!(old, "a");
        assert_eq!(onion.names(), vec!["a", "b"]);
        assert_eq!(onion.layers()[0].layer, "a2");
    }

    #[test]
    fn short_circuit_layer_skips_the_provider() {
        struct Canned;
        impl Middleware for Canned {
            fn handle(
                &self,
                _method: &str,
                _params: Value,
                _next: Next<'_>,
            ) -> Result<RpcResponse, ClientError> {
                Ok(RpcResponse::from_result(json!("0xcanned")))
            }
        }

        let provider = MockProvider::new(); // answers nothing
        let mut onion: Onion<Arc<dyn Middleware>> = Onion::new();
        onion.inject("canned", Arc::new(Canned), Position::Outermost).unwrap();

        let response = onion.dispatch(&provider, "bub_gasPrice", json!([])).unwrap();
        assert_eq!(response.result, Some(json!("0xcanned")));
        assert!(provider.requests().is_empty());
    }
}
