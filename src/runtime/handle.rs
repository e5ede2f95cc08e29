use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use serde::Deserialize;
use thiserror::Error;
use tokio::{
    sync::{Mutex, broadcast, mpsc, oneshot},
    time::{Duration, Instant},
};
use tracing::{debug, error, warn};

use crate::{
    core::RaceLog,
    event::{
        CompetitorRegistration, CourseArea, CourseDesign, DeviceMapping, FinishPositions, FlagState,
        GateLineOpening, Pathfinder, ProtestStart, RaceLogEvent, Revocation, StartProcedure,
        StartTimeProposal, StatusChange, TrackingDenotation, WindFix,
    },
    listener::{ListenerError, ListenerRef, ListenerResult, RaceLogEventVisitor},
    persist::{EventSink, PersistError},
    record::EventRecord,
};

use super::events::RaceLogNotification;

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("persistence failed: {0}")]
    Persist(#[from] PersistError),
    #[error("journal worker is gone")]
    ChannelClosed,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    /// Write each event as soon as it arrives instead of batching.
    pub flush_on_add: bool,
    pub batch_max_events: usize,
    pub batch_max_latency_ms: u64,
    /// Capacity of the queue between listener and worker. Events that do not
    /// fit are dropped and counted, the writer is never blocked.
    pub queue_bound: usize,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            flush_on_add: false,
            batch_max_events: 32,
            batch_max_latency_ms: 75,
            queue_bound: 256,
        }
    }
}

enum PersistMsg {
    Record(EventRecord),
    Flush {
        resp: oneshot::Sender<Result<u64, PersistError>>,
    },
    Shutdown {
        resp: oneshot::Sender<()>,
    },
}

/// Handle to a running journal attached to one race log.
///
/// A batch the sink rejects stays queued in the worker and is written again,
/// ahead of newer records, on the next flush. Records still unwritten when the
/// worker stops are counted in [`JournalHandle::dropped`]. Dropping the handle
/// detaches the journal from the log; the worker then writes what it holds and
/// exits.
pub struct JournalHandle {
    log: Arc<RaceLog>,
    listener: ListenerRef,
    cmd_tx: mpsc::Sender<PersistMsg>,
    events_tx: broadcast::Sender<RaceLogNotification>,
    dropped: Arc<AtomicU64>,
}

/// Attaches a journaling listener to `log` and spawns the worker that writes
/// accepted events to `sink`. Must be called inside a tokio runtime.
///
/// Events that arrive through [`RaceLog::load`] are not journaled.
pub fn spawn_journal(log: Arc<RaceLog>, sink: Box<dyn EventSink>, config: JournalConfig) -> JournalHandle {
    let (cmd_tx, cmd_rx) = mpsc::channel::<PersistMsg>(config.queue_bound.max(1));
    let (events_tx, _) = broadcast::channel::<RaceLogNotification>(1024);
    let dropped = Arc::new(AtomicU64::new(0));

    spawn_persistence_worker(
        sink,
        cmd_rx,
        events_tx.clone(),
        Arc::clone(&dropped),
        config,
        log.id().to_string(),
    );

    let listener: ListenerRef = Arc::new(JournalListener {
        tx: cmd_tx.clone(),
        events_tx: events_tx.clone(),
        dropped: Arc::clone(&dropped),
    });
    log.add_listener(Arc::clone(&listener));

    JournalHandle {
        log,
        listener,
        cmd_tx,
        events_tx,
        dropped,
    }
}

impl JournalHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<RaceLogNotification> {
        self.events_tx.subscribe()
    }

    /// Events accepted by the log that never reached the sink: queue
    /// overflow, plus records still unwritten when the worker stopped.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Writes everything queued so far; returns the stored record count.
    pub async fn flush(&self) -> Result<u64, JournalError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(PersistMsg::Flush { resp: tx })
            .await
            .map_err(|_| JournalError::ChannelClosed)?;
        Ok(rx.await.map_err(|_| JournalError::ChannelClosed)??)
    }

    /// Detaches from the log, drains the queue and stops the worker.
    pub async fn shutdown(&self) -> Result<(), JournalError> {
        self.log.remove_listener(&self.listener);
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(PersistMsg::Shutdown { resp: tx })
            .await
            .map_err(|_| JournalError::ChannelClosed)?;
        rx.await.map_err(|_| JournalError::ChannelClosed)
    }
}

impl Drop for JournalHandle {
    fn drop(&mut self) {
        self.log.remove_listener(&self.listener);
    }
}

struct JournalListener {
    tx: mpsc::Sender<PersistMsg>,
    events_tx: broadcast::Sender<RaceLogNotification>,
    dropped: Arc<AtomicU64>,
}

impl JournalListener {
    fn forward(&self, event: &RaceLogEvent) -> ListenerResult {
        let _ = self.events_tx.send(RaceLogNotification::EventAdded {
            id: event.id().clone(),
            event_type: event.event_type(),
            pass_id: event.pass_id(),
            invalidates_caches: event.invalidates_caches(),
        });
        self.tx
            .try_send(PersistMsg::Record(EventRecord::from_event(event)))
            .map_err(|err| {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                ListenerError::Failed(format!("journal queue error: {err}"))
            })
    }
}

impl RaceLogEventVisitor for JournalListener {
    fn visit_flag(&self, event: &RaceLogEvent, _: &FlagState) -> ListenerResult {
        self.forward(event)
    }

    fn visit_race_status(&self, event: &RaceLogEvent, _: &StatusChange) -> ListenerResult {
        self.forward(event)
    }

    fn visit_start_time(&self, event: &RaceLogEvent, _: &StartTimeProposal) -> ListenerResult {
        self.forward(event)
    }

    fn visit_pass_change(&self, event: &RaceLogEvent) -> ListenerResult {
        self.forward(event)
    }

    fn visit_course_area_changed(&self, event: &RaceLogEvent, _: &CourseArea) -> ListenerResult {
        self.forward(event)
    }

    fn visit_course_design_changed(&self, event: &RaceLogEvent, _: &CourseDesign) -> ListenerResult {
        self.forward(event)
    }

    fn visit_finish_positioning_list_changed(&self, event: &RaceLogEvent, _: &FinishPositions) -> ListenerResult {
        self.forward(event)
    }

    fn visit_finish_positioning_confirmed(&self, event: &RaceLogEvent, _: &FinishPositions) -> ListenerResult {
        self.forward(event)
    }

    fn visit_pathfinder(&self, event: &RaceLogEvent, _: &Pathfinder) -> ListenerResult {
        self.forward(event)
    }

    fn visit_gate_line_opening_time(&self, event: &RaceLogEvent, _: &GateLineOpening) -> ListenerResult {
        self.forward(event)
    }

    fn visit_start_procedure_changed(&self, event: &RaceLogEvent, _: &StartProcedure) -> ListenerResult {
        self.forward(event)
    }

    fn visit_protest_start_time(&self, event: &RaceLogEvent, _: &ProtestStart) -> ListenerResult {
        self.forward(event)
    }

    fn visit_wind_fix(&self, event: &RaceLogEvent, _: &WindFix) -> ListenerResult {
        self.forward(event)
    }

    fn visit_device_competitor_mapping(&self, event: &RaceLogEvent, _: &DeviceMapping) -> ListenerResult {
        self.forward(event)
    }

    fn visit_device_mark_mapping(&self, event: &RaceLogEvent, _: &DeviceMapping) -> ListenerResult {
        self.forward(event)
    }

    fn visit_denote_for_tracking(&self, event: &RaceLogEvent, _: &TrackingDenotation) -> ListenerResult {
        self.forward(event)
    }

    fn visit_start_tracking(&self, event: &RaceLogEvent) -> ListenerResult {
        self.forward(event)
    }

    fn visit_register_competitor(&self, event: &RaceLogEvent, _: &CompetitorRegistration) -> ListenerResult {
        self.forward(event)
    }

    fn visit_revoke(&self, event: &RaceLogEvent, _: &Revocation) -> ListenerResult {
        self.forward(event)
    }
}

fn spawn_persistence_worker(
    sink: Box<dyn EventSink>,
    mut rx: mpsc::Receiver<PersistMsg>,
    events_tx: broadcast::Sender<RaceLogNotification>,
    dropped: Arc<AtomicU64>,
    config: JournalConfig,
    race_log_id: String,
) {
    let sink = Arc::new(Mutex::new(sink));
    tokio::spawn(async move {
        let latency = Duration::from_millis(config.batch_max_latency_ms);
        let mut buf = Vec::<EventRecord>::new();
        let mut deadline = Instant::now() + latency;
        let mut durable: u64 = 0;

        loop {
            tokio::select! {
                msg = rx.recv() => {
                    let Some(msg) = msg else {
                        let _ = flush_buf(&sink, &mut buf, &mut durable, &events_tx, &race_log_id).await;
                        break;
                    };

                    match msg {
                        PersistMsg::Record(record) => {
                            buf.push(record);
                            if config.flush_on_add || buf.len() >= config.batch_max_events {
                                let _ = flush_buf(&sink, &mut buf, &mut durable, &events_tx, &race_log_id).await;
                                deadline = Instant::now() + latency;
                            }
                        }
                        PersistMsg::Flush { resp } => {
                            let result = flush_buf(&sink, &mut buf, &mut durable, &events_tx, &race_log_id).await;
                            let _ = resp.send(result.map(|_| durable));
                            deadline = Instant::now() + latency;
                        }
                        PersistMsg::Shutdown { resp } => {
                            let _ = flush_buf(&sink, &mut buf, &mut durable, &events_tx, &race_log_id).await;
                            discard_unwritten(&mut buf, &dropped, &race_log_id);
                            let _ = resp.send(());
                            break;
                        }
                    }
                }
                _ = tokio::time::sleep_until(deadline), if !buf.is_empty() => {
                    let _ = flush_buf(&sink, &mut buf, &mut durable, &events_tx, &race_log_id).await;
                    deadline = Instant::now() + latency;
                }
            }
        }
        discard_unwritten(&mut buf, &dropped, &race_log_id);
        debug!(race_log = %race_log_id, durable, "journal worker stopped");
    });
}

/// Writes `buf` to the sink. On an append failure the records go back to
/// the front of `buf`.
async fn flush_buf(
    sink: &Arc<Mutex<Box<dyn EventSink>>>,
    buf: &mut Vec<EventRecord>,
    durable: &mut u64,
    events_tx: &broadcast::Sender<RaceLogNotification>,
    race_log_id: &str,
) -> Result<(), PersistError> {
    let records = std::mem::take(buf);
    let pending = records.len();
    let sink_ref = Arc::clone(sink);
    let joined = tokio::task::spawn_blocking(move || {
        let mut sink = sink_ref.blocking_lock();
        match sink.append_records(&records) {
            Ok(count) => (Vec::new(), sink.flush().map(|()| count)),
            Err(err) => (records, Err(err)),
        }
    })
    .await;

    let (unwritten, result) = match joined {
        Ok(out) => out,
        Err(e) => {
            error!(race_log = %race_log_id, pending, error = %e, "journal sink panicked, batch lost");
            return Err(PersistError::Message(format!("join error: {e}")));
        }
    };

    match result {
        Ok(count) => {
            *durable = (*durable).max(count);
            let _ = events_tx.send(RaceLogNotification::DurableUpTo { count: *durable });
            Ok(())
        }
        Err(err) => {
            error!(race_log = %race_log_id, pending = unwritten.len(), error = %err, "journal append failed");
            let mut restored = unwritten;
            restored.append(buf);
            *buf = restored;
            Err(err)
        }
    }
}

fn discard_unwritten(buf: &mut Vec<EventRecord>, dropped: &AtomicU64, race_log_id: &str) {
    if buf.is_empty() {
        return;
    }
    warn!(race_log = %race_log_id, count = buf.len(), "journal stopped with unwritten records");
    dropped.fetch_add(buf.len() as u64, Ordering::Relaxed);
    buf.clear();
}
