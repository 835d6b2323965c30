use crate::document::model::AnimationDocument;
use crate::foundation::config::ConvertOptions;
use crate::foundation::error::{GifDocError, GifDocResult};
use crate::input::validate::ConversionInput;
use crate::session::converter::Converter;
use parking_lot::{Condvar, Mutex};
use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, mpsc};
use std::thread::JoinHandle;

type JobResult = GifDocResult<AnimationDocument>;

/// Lightweight description of a queued or running job.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct JobSummary {
    /// Queue-assigned identifier, increasing in enqueue order.
    pub id: u64,
    /// Input file name.
    pub filename: String,
    /// Input size in bytes.
    pub input_bytes: u64,
}

/// Snapshot of the queue for observability.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct QueueStatus {
    /// Jobs waiting to start.
    pub pending: usize,
    /// The job currently being converted, if any.
    pub in_flight: Option<JobSummary>,
    /// Waiting jobs in FIFO order.
    pub jobs: Vec<JobSummary>,
}

impl QueueStatus {
    /// Return `true` while a job is being converted.
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }
}

struct QueueJob {
    summary: JobSummary,
    input: ConversionInput,
    opts: ConvertOptions,
    reply: mpsc::Sender<JobResult>,
}

#[derive(Default)]
struct QueueState {
    next_id: u64,
    pending: VecDeque<QueueJob>,
    in_flight: Option<JobSummary>,
    shutdown: bool,
}

struct Shared {
    state: Mutex<QueueState>,
    wake: Condvar,
}

/// Deferred result of one enqueued conversion, fulfilled exactly once by the queue worker.
#[derive(Debug)]
pub struct JobHandle {
    id: u64,
    rx: mpsc::Receiver<JobResult>,
}

fn worker_gone() -> GifDocError {
    GifDocError::Other(anyhow::anyhow!(
        "conversion worker stopped before reporting a result"
    ))
}

impl JobHandle {
    /// Identifier assigned at enqueue time.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Block until the job completes, fails, or is cleared.
    pub fn wait(self) -> JobResult {
        self.rx.recv().unwrap_or_else(|_| Err(worker_gone()))
    }

    /// Non-blocking poll. Returns `Some` once; later polls report the worker as gone.
    pub fn try_result(&self) -> Option<JobResult> {
        match self.rx.try_recv() {
            Ok(res) => Some(res),
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => Some(Err(worker_gone())),
        }
    }
}

/// Single-flight FIFO queue in front of one [`Converter`].
///
/// Jobs run strictly one at a time, in enqueue order, on a dedicated worker thread that owns the
/// converter (and therefore its raster pool). This caps peak memory at one decoded frame list
/// regardless of how many callers enqueue concurrently.
///
/// A job whose conversion panics fails with [`GifDocError::Other`]; the worker moves on to the next job.
pub struct ConversionQueue {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl ConversionQueue {
    /// Start the worker thread; it owns `converter` until the queue is dropped.
    pub fn spawn(converter: Converter) -> GifDocResult<Self> {
        let shared = Arc::new(Shared {
            state: Mutex::new(QueueState::default()),
            wake: Condvar::new(),
        });
        let worker_shared = Arc::clone(&shared);
        let worker = std::thread::Builder::new()
            .name("gifdoc-convert".to_string())
            .spawn(move || run_worker(&worker_shared, converter))
            .map_err(|e| GifDocError::io(format!("spawn conversion worker: {e}")))?;
        Ok(Self {
            shared,
            worker: Some(worker),
        })
    }

    /// Append a job and return its handle immediately.
    pub fn enqueue(&self, input: ConversionInput, opts: ConvertOptions) -> JobHandle {
        let (tx, rx) = mpsc::channel();
        let mut st = self.shared.state.lock();
        let id = st.next_id;
        st.next_id += 1;
        let summary = JobSummary {
            id,
            filename: input.filename.clone(),
            input_bytes: input.size(),
        };
        tracing::debug!(job = id, file = %summary.filename, pending = st.pending.len(), "job enqueued");
        st.pending.push_back(QueueJob {
            summary,
            input,
            opts,
            reply: tx,
        });
        drop(st);
        self.shared.wake.notify_one();
        JobHandle { id, rx }
    }

    /// Reject every job that has not started yet. The running job is not interrupted.
    ///
    /// Returns the number of jobs rejected.
    pub fn clear(&self) -> usize {
        let drained: Vec<QueueJob> = self.shared.state.lock().pending.drain(..).collect();
        for job in &drained {
            // The caller may have dropped its handle already.
            let _ = job.reply.send(Err(GifDocError::QueueCleared));
        }
        if !drained.is_empty() {
            tracing::info!(cleared = drained.len(), "conversion queue cleared");
        }
        drained.len()
    }

    /// Current queue length, in-flight job, and pending job descriptions.
    pub fn status(&self) -> QueueStatus {
        let st = self.shared.state.lock();
        QueueStatus {
            pending: st.pending.len(),
            in_flight: st.in_flight.clone(),
            jobs: st.pending.iter().map(|j| j.summary.clone()).collect(),
        }
    }
}

impl Drop for ConversionQueue {
    fn drop(&mut self) {
        self.clear();
        self.shared.state.lock().shutdown = true;
        self.shared.wake.notify_all();
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            tracing::error!("conversion worker panicked");
        }
    }
}

fn run_worker(shared: &Shared, mut converter: Converter) {
    loop {
        let job = {
            let mut st = shared.state.lock();
            loop {
                if let Some(job) = st.pending.pop_front() {
                    st.in_flight = Some(job.summary.clone());
                    break job;
                }
                if st.shutdown {
                    return;
                }
                shared.wake.wait(&mut st);
            }
        };

        tracing::debug!(job = job.summary.id, "job started");
        let res = panic::catch_unwind(AssertUnwindSafe(|| {
            converter.convert(&job.input, &job.opts)
        }))
        .unwrap_or_else(|payload| {
            let msg = panic_message(payload.as_ref());
            tracing::error!(job = job.summary.id, "conversion panicked: {msg}");
            Err(GifDocError::Other(anyhow::anyhow!(
                "conversion panicked: {msg}"
            )))
        });
        shared.state.lock().in_flight = None;
        if job.reply.send(res).is_err() {
            tracing::debug!(job = job.summary.id, "job handle dropped before completion");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic payload"
    }
}
