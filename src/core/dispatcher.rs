//! Transport dispatcher: fans a finished record out to transports
//!
//! Each delivery is isolated: an error or panic in one transport is
//! reported on the diagnostic channel and never reaches its siblings or
//! the caller. Asynchronous transports are handed to the [`Worker`],
//! never awaited.

use super::error::{panic_message, LoggerError};
use super::groups::TransportFilter;
use super::log_record::LogRecord;
use super::metrics::LoggerMetrics;
use super::plugin::{PluginChain, ShouldSendParams};
use super::transport::{Transport, TransportRef};
use super::worker::Worker;
use futures::future::FutureExt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

pub(crate) fn dispatch(
    transports: &[TransportRef],
    filter: &TransportFilter,
    plugins: &PluginChain,
    record: LogRecord,
    metrics: &Arc<LoggerMetrics>,
    worker: &Worker,
) {
    // Single transport: no fan-out bookkeeping, no shared record
    if let [only] = transports {
        if is_eligible(only, filter, plugins, &record) {
            deliver(only, record, metrics, worker);
        } else {
            metrics.record_unrouted();
        }
        return;
    }

    let record = Arc::new(record);
    let mut delivered_any = false;
    for transport in transports {
        if is_eligible(transport, filter, plugins, &record) {
            delivered_any = true;
            deliver_shared(transport, &record, metrics, worker);
        }
    }
    if !delivered_any {
        metrics.record_unrouted();
    }
}

fn is_eligible(
    transport: &TransportRef,
    filter: &TransportFilter,
    plugins: &PluginChain,
    record: &LogRecord,
) -> bool {
    if !transport.enabled() || !filter.allows(transport.id()) {
        return false;
    }
    if plugins.is_empty() {
        return true;
    }
    plugins.should_send_to_logger(&ShouldSendParams {
        messages: &record.messages,
        data: record.data(),
        level: record.level,
        transport_id: transport.id(),
        groups: &record.groups,
    })
}

fn deliver(transport: &TransportRef, record: LogRecord, metrics: &Arc<LoggerMetrics>, worker: &Worker) {
    match transport {
        TransportRef::Sync(t) => send_sync(t.as_ref(), &record, metrics),
        TransportRef::Async(t) => {
            let t = Arc::clone(t);
            let metrics = Arc::clone(metrics);
            worker.spawn(
                async move {
                    let outcome = AssertUnwindSafe(t.send(&record)).catch_unwind().await;
                    report(t.id(), outcome, &metrics);
                }
                .boxed(),
            );
        }
    }
}

fn deliver_shared(
    transport: &TransportRef,
    record: &Arc<LogRecord>,
    metrics: &Arc<LoggerMetrics>,
    worker: &Worker,
) {
    match transport {
        TransportRef::Sync(t) => send_sync(t.as_ref(), record, metrics),
        TransportRef::Async(t) => {
            let t = Arc::clone(t);
            let record = Arc::clone(record);
            let metrics = Arc::clone(metrics);
            worker.spawn(
                async move {
                    let outcome = AssertUnwindSafe(t.send(&record)).catch_unwind().await;
                    report(t.id(), outcome, &metrics);
                }
                .boxed(),
            );
        }
    }
}

fn send_sync(transport: &dyn Transport, record: &LogRecord, metrics: &LoggerMetrics) {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| transport.send(record)));
    report(transport.id(), outcome, metrics);
}

type DeliveryOutcome = std::thread::Result<super::error::Result<()>>;

fn report(transport_id: &str, outcome: DeliveryOutcome, metrics: &LoggerMetrics) {
    let failure = match outcome {
        Ok(Ok(())) => {
            metrics.record_delivery();
            return;
        }
        Ok(Err(e)) => LoggerError::transport(transport_id, e.to_string()),
        Err(payload) => LoggerError::transport_panic(transport_id, panic_message(payload.as_ref())),
    };
    metrics.record_transport_failure();
    tracing::warn!(target: "log_layer", transport = transport_id, error = %failure, "transport delivery failed");
}
