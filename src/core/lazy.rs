//! Deferred values resolved only when an emission passes the level gate
//!
//! A [`Lazy`] wraps a zero-argument producer, either synchronous or
//! asynchronous. Producers run at emission time, after gating, and never
//! for emissions that are gated out.

use super::error::{panic_message, BoxError, LoggerError, Result};
use super::fields::{FieldValue, Fields};
use futures::future::{self, BoxFuture, FutureExt};
use serde_json::{Map, Value};
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

type SyncProducer = Arc<dyn Fn() -> std::result::Result<Value, BoxError> + Send + Sync>;
type AsyncProducer =
    Arc<dyn Fn() -> BoxFuture<'static, std::result::Result<Value, BoxError>> + Send + Sync>;

#[derive(Clone)]
enum Producer {
    Sync(SyncProducer),
    Async(AsyncProducer),
}

/// A deferred value
///
/// # Example
///
/// ```
/// use rust_log_layer::{lazy, lazy_async, Fields};
///
/// let fields = Fields::new()
///     .with_field("memory", lazy(|| 512))
///     .with_field("session", lazy_async(|| async { "abc" }));
///
/// assert!(fields.has_async_lazy());
/// ```
#[derive(Clone)]
pub struct Lazy {
    producer: Producer,
}

impl Lazy {
    /// Wrap an infallible synchronous producer
    pub fn new<F, V>(producer: F) -> Self
    where
        F: Fn() -> V + Send + Sync + 'static,
        V: Into<Value>,
    {
        Self {
            producer: Producer::Sync(Arc::new(move || Ok(producer().into()))),
        }
    }

    /// Wrap a fallible synchronous producer; an `Err` drops the emission
    pub fn try_new<F, V, E>(producer: F) -> Self
    where
        F: Fn() -> std::result::Result<V, E> + Send + Sync + 'static,
        V: Into<Value>,
        E: Into<BoxError>,
    {
        Self {
            producer: Producer::Sync(Arc::new(move || {
                producer().map(Into::into).map_err(Into::into)
            })),
        }
    }

    /// Wrap an infallible asynchronous producer
    pub fn new_async<F, Fut, V>(producer: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = V> + Send + 'static,
        V: Into<Value>,
    {
        Self {
            producer: Producer::Async(Arc::new(move || {
                producer().map(|value| Ok(value.into())).boxed()
            })),
        }
    }

    /// Wrap a fallible asynchronous producer; an `Err` drops the emission
    pub fn try_new_async<F, Fut, V, E>(producer: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<V, E>> + Send + 'static,
        V: Into<Value>,
        E: Into<BoxError>,
    {
        Self {
            producer: Producer::Async(Arc::new(move || {
                producer()
                    .map(|result| result.map(Into::into).map_err(Into::into))
                    .boxed()
            })),
        }
    }

    pub fn is_async(&self) -> bool {
        matches!(self.producer, Producer::Async(_))
    }

    /// Run a synchronous producer. Returns `None` for async producers.
    pub(crate) fn resolve_sync(&self, key: &str) -> Option<Result<Value>> {
        let Producer::Sync(producer) = &self.producer else {
            return None;
        };
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| producer()));
        Some(match outcome {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(source)) => Err(LoggerError::lazy_resolution(key, source)),
            Err(payload) => Err(LoggerError::lazy_panic(key, panic_message(payload.as_ref()))),
        })
    }

    /// Run either kind of producer to completion
    pub(crate) fn resolve(&self, key: String) -> BoxFuture<'static, Result<Value>> {
        match &self.producer {
            Producer::Sync(_) => {
                let resolved = self
                    .resolve_sync(&key)
                    .unwrap_or_else(|| Err(LoggerError::other("producer kind mismatch")));
                future::ready(resolved).boxed()
            }
            Producer::Async(producer) => {
                let started = panic::catch_unwind(AssertUnwindSafe(|| producer()));
                match started {
                    Ok(fut) => AssertUnwindSafe(fut)
                        .catch_unwind()
                        .map(move |outcome| match outcome {
                            Ok(Ok(value)) => Ok(value),
                            Ok(Err(source)) => Err(LoggerError::lazy_resolution(key, source)),
                            Err(payload) => {
                                Err(LoggerError::lazy_panic(key, panic_message(payload.as_ref())))
                            }
                        })
                        .boxed(),
                    Err(payload) => future::ready(Err(LoggerError::lazy_panic(
                        key,
                        panic_message(payload.as_ref()),
                    )))
                    .boxed(),
                }
            }
        }
    }
}

impl fmt::Debug for Lazy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.producer {
            Producer::Sync(_) => write!(f, "Lazy(sync)"),
            Producer::Async(_) => write!(f, "Lazy(async)"),
        }
    }
}

/// Shorthand for [`Lazy::new`]
pub fn lazy<F, V>(producer: F) -> Lazy
where
    F: Fn() -> V + Send + Sync + 'static,
    V: Into<Value>,
{
    Lazy::new(producer)
}

/// Shorthand for [`Lazy::new_async`]
pub fn lazy_async<F, Fut, V>(producer: F) -> Lazy
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = V> + Send + 'static,
    V: Into<Value>,
{
    Lazy::new_async(producer)
}

/// Outcome of resolving a field map
pub(crate) enum Resolution {
    /// Every producer was synchronous
    Ready(Map<String, Value>),
    /// At least one producer is asynchronous; the future yields the full map
    Pending(BoxFuture<'static, Result<Map<String, Value>>>),
}

/// Resolve every lazy value in `fields`
///
/// Synchronous producers run immediately. A failing synchronous producer
/// fails the whole resolution before any asynchronous producer is started.
pub(crate) fn resolve_fields(fields: &Fields) -> Result<Resolution> {
    let mut resolved = Map::new();
    let mut deferred: Vec<(String, Lazy)> = Vec::new();

    for (key, value) in fields.iter() {
        match value {
            FieldValue::Value(plain) => {
                resolved.insert(key.clone(), plain.clone());
            }
            FieldValue::Lazy(lazy) if lazy.is_async() => {
                deferred.push((key.clone(), lazy.clone()));
            }
            FieldValue::Lazy(lazy) => {
                if let Some(result) = lazy.resolve_sync(key) {
                    resolved.insert(key.clone(), result?);
                }
            }
        }
    }

    if deferred.is_empty() {
        return Ok(Resolution::Ready(resolved));
    }

    Ok(Resolution::Pending(
        async move {
            let pending = deferred.into_iter().map(|(key, lazy)| {
                let fut = lazy.resolve(key.clone());
                fut.map(move |value| value.map(|value| (key, value)))
            });
            for (key, value) in future::try_join_all(pending).await? {
                resolved.insert(key, value);
            }
            Ok(resolved)
        }
        .boxed(),
    ))
}

/// Resolve only synchronous producers, leaving async ones wrapped
pub(crate) fn resolve_sync_only(fields: &Fields) -> Result<Fields> {
    let mut out = Fields::new();
    for (key, value) in fields.iter() {
        let value = match value {
            FieldValue::Lazy(lazy) => match lazy.resolve_sync(key) {
                Some(result) => FieldValue::Value(result?),
                None => FieldValue::Lazy(lazy.clone()),
            },
            plain => plain.clone(),
        };
        out.insert(key.clone(), value);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_sync_resolution_is_ready() {
        let fields = Fields::new()
            .with_field("plain", 1)
            .with_field("deferred", lazy(|| "computed"));

        match resolve_fields(&fields).unwrap() {
            Resolution::Ready(map) => {
                assert_eq!(map["plain"], json!(1));
                assert_eq!(map["deferred"], json!("computed"));
            }
            Resolution::Pending(_) => panic!("expected synchronous resolution"),
        }
    }

    #[test]
    fn test_async_resolution_is_pending() {
        let fields = Fields::new()
            .with_field("a", lazy(|| 1))
            .with_field("b", lazy_async(|| async { 2 }));

        let Resolution::Pending(fut) = resolve_fields(&fields).unwrap() else {
            panic!("expected pending resolution");
        };
        let map = futures::executor::block_on(fut).unwrap();
        assert_eq!(map["a"], json!(1));
        assert_eq!(map["b"], json!(2));
    }

    #[test]
    fn test_failing_producer() {
        let fields =
            Fields::new().with_field("bad", Lazy::try_new(|| Err::<i64, _>("no value")));
        let err = resolve_fields(&fields).err().unwrap();
        assert!(matches!(err, LoggerError::LazyResolution { .. }));
    }

    #[test]
    fn test_panicking_producer() {
        let fields = Fields::new().with_field("bad", lazy(|| -> i64 { panic!("boom") }));
        let err = resolve_fields(&fields).err().unwrap();
        assert!(matches!(err, LoggerError::LazyPanic { .. }));
    }

    #[test]
    fn test_rejecting_async_producer() {
        let fields = Fields::new().with_field(
            "bad",
            Lazy::try_new_async(|| async { Err::<i64, _>("rejected") }),
        );
        let Resolution::Pending(fut) = resolve_fields(&fields).unwrap() else {
            panic!("expected pending resolution");
        };
        assert!(futures::executor::block_on(fut).is_err());
    }

    #[test]
    fn test_sync_only_leaves_async_wrapped() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let fields = Fields::new()
            .with_field("sync", lazy(|| 5))
            .with_field(
                "async",
                lazy_async(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    async { 6 }
                }),
            );

        let out = resolve_sync_only(&fields).unwrap();
        assert!(matches!(out.get("sync"), Some(FieldValue::Value(v)) if *v == json!(5)));
        assert!(matches!(out.get("async"), Some(FieldValue::Lazy(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
