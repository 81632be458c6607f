//! Per-symbol dependency scheduler
//!
//! Builds a static task graph from the ingested feed and executes it on
//! a fixed-size worker pool. Records for one symbol form a chain (each
//! task runs strictly after its predecessor); chains for distinct
//! symbols are independent and run in parallel on any worker.
//!
//! Mutable per-symbol state (classifier plus sink) travels through its
//! chain as an owned lane handed from task to task via the ready queue.
//! The chain edges alone serialize access to a lane, so no lock guards
//! it and per-symbol output is deterministic for any worker count.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};
use types::ids::Symbol;
use types::record::{OrderBookRecord, TradeRecord};

use crate::classifier::InstrumentClassifier;
use crate::sink::{SinkError, SymbolSink};

/// Index of a task in the graph.
pub type TaskId = usize;

/// Work bound to one symbol's classifier.
#[derive(Debug, Clone)]
pub enum TaskPayload {
    /// Diff and classify a new snapshot.
    BookUpdate(OrderBookRecord),
    /// Buffer one trade into the run.
    TradeAppend(TradeRecord),
}

/// One unit of deferred work. Immutable once the graph is built.
#[derive(Debug)]
struct TaskNode {
    symbol: Symbol,
    payload: TaskPayload,
    /// Next task in this symbol's chain.
    succ: Option<TaskId>,
}

/// Static dependency graph over the ingested records.
///
/// Every node has at most one predecessor and one successor (its
/// neighbors in the symbol chain), so the graph is a set of disjoint
/// chains and the chain heads are exactly the initially-ready tasks.
#[derive(Debug, Default)]
pub struct TaskGraph {
    tasks: Vec<TaskNode>,
    heads: Vec<TaskId>,
    last_task: HashMap<Symbol, TaskId>,
}

impl TaskGraph {
    /// Append a task, chaining it after the symbol's most recent one.
    pub fn push(&mut self, symbol: Symbol, payload: TaskPayload) -> TaskId {
        let id = self.tasks.len();
        self.tasks.push(TaskNode {
            symbol: symbol.clone(),
            payload,
            succ: None,
        });
        match self.last_task.insert(symbol, id) {
            Some(prev) => self.tasks[prev].succ = Some(id),
            None => self.heads.push(id),
        }
        id
    }

    /// The task scheduled to run directly after `id`, if any.
    pub fn successor(&self, id: TaskId) -> Option<TaskId> {
        self.tasks.get(id).and_then(|task| task.succ)
    }

    /// Total number of tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no tasks were scheduled.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Number of independent symbol chains.
    pub fn chain_count(&self) -> usize {
        self.heads.len()
    }
}

/// Classifier and sink for one symbol, owned by its task chain.
#[derive(Debug)]
pub struct SymbolLane {
    classifier: InstrumentClassifier,
    sink: SymbolSink,
}

/// A ready task plus the lane it operates on.
///
/// `lane` is `None` only for chains whose symbol never received a book
/// record anywhere in the input.
struct Job {
    task: TaskId,
    lane: Option<SymbolLane>,
}

/// Blocking multi-producer multi-consumer queue of ready jobs.
struct ReadyQueue {
    state: Mutex<ReadyState>,
    available: Condvar,
}

struct ReadyState {
    jobs: VecDeque<Job>,
    open: bool,
}

impl ReadyQueue {
    fn new() -> Self {
        Self {
            state: Mutex::new(ReadyState {
                jobs: VecDeque::new(),
                open: true,
            }),
            available: Condvar::new(),
        }
    }

    fn push(&self, job: Job) {
        let mut state = self.state.lock().unwrap();
        state.jobs.push_back(job);
        self.available.notify_one();
    }

    /// Block until a job is ready or the queue is closed and drained.
    fn pop(&self) -> Option<Job> {
        let mut state = self.state.lock().unwrap();
        loop {
            if let Some(job) = state.jobs.pop_front() {
                return Some(job);
            }
            if !state.open {
                return None;
            }
            state = self.available.wait(state).unwrap();
        }
    }

    fn close(&self) {
        let mut state = self.state.lock().unwrap();
        state.open = false;
        self.available.notify_all();
    }
}

/// Outcome of one execution phase.
#[derive(Debug)]
pub struct ExecutionStats {
    /// Total tasks run; every task runs exactly once.
    pub tasks_executed: u64,
    /// Tasks run by each worker, by worker index.
    pub worker_tasks: Vec<u64>,
    /// Wall-clock duration of the execution phase.
    pub duration: Duration,
}

impl ExecutionStats {
    /// Tasks per second over the execution phase.
    pub fn throughput(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.tasks_executed as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }
}

/// Front door of the engine: accepts records during the single-threaded
/// ingest phase and runs the resulting graph in the parallel phase.
#[derive(Debug)]
pub struct FeedScheduler {
    graph: TaskGraph,
    lanes: HashMap<Symbol, SymbolLane>,
    out_dir: PathBuf,
}

impl FeedScheduler {
    /// Create a scheduler writing per-symbol outputs under `out_dir`.
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            graph: TaskGraph::default(),
            lanes: HashMap::new(),
            out_dir: out_dir.into(),
        }
    }

    /// Route one snapshot record.
    ///
    /// The first snapshot for a symbol opens its lane and runs the
    /// bootstrap classifier call synchronously during ingest. It
    /// produces no task and leaves the chain tail untouched, so every
    /// scheduled book task observes a non-empty prior book. Later
    /// snapshots append to the symbol's chain.
    pub fn submit_book(&mut self, symbol: Symbol, book: OrderBookRecord) -> Result<(), SinkError> {
        if !self.lanes.contains_key(&symbol) {
            let mut lane = SymbolLane {
                classifier: InstrumentClassifier::new(),
                sink: SymbolSink::create(&self.out_dir, &symbol)?,
            };
            let text = lane.classifier.update_book(Some(book));
            lane.sink.append(&text)?;
            debug!(symbol = %symbol, "bootstrapped symbol lane");
            self.lanes.insert(symbol, lane);
            return Ok(());
        }

        self.graph.push(symbol, TaskPayload::BookUpdate(book));
        Ok(())
    }

    /// Route one trade record. Trades are always deferred to the
    /// execution phase, chained after the symbol's previous task.
    pub fn submit_trade(&mut self, symbol: Symbol, trade: TradeRecord) {
        self.graph.push(symbol, TaskPayload::TradeAppend(trade));
    }

    /// Number of scheduled tasks (bootstraps excluded).
    pub fn task_count(&self) -> usize {
        self.graph.len()
    }

    /// Number of symbols with an open lane.
    pub fn symbol_count(&self) -> usize {
        self.lanes.len()
    }

    /// Run the graph to completion on `workers` threads.
    ///
    /// Chain heads are seeded into the ready queue with their lanes;
    /// each completed task enqueues its successor together with the
    /// lane, or flushes the lane at the chain tail. The worker that
    /// completes the final task closes the queue.
    pub fn execute(mut self, workers: usize) -> ExecutionStats {
        let started = Instant::now();
        let workers = workers.max(1);

        if self.graph.is_empty() {
            info!("no flow to execute");
            self.flush_lanes();
            return ExecutionStats {
                tasks_executed: 0,
                worker_tasks: vec![0; workers],
                duration: started.elapsed(),
            };
        }

        let queue = ReadyQueue::new();
        for &head in &self.graph.heads {
            let symbol = &self.graph.tasks[head].symbol;
            let lane = self.lanes.remove(symbol);
            if lane.is_none() {
                warn!(symbol = %symbol, "scheduling trade chain for symbol with no book");
            }
            queue.push(Job { task: head, lane });
        }

        let tasks = &self.graph.tasks;
        let remaining = AtomicUsize::new(tasks.len());

        let worker_tasks: Vec<u64> = thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    let queue = &queue;
                    let remaining = &remaining;
                    scope.spawn(move || {
                        let mut executed = 0u64;
                        while let Some(mut job) = queue.pop() {
                            let node = &tasks[job.task];
                            run_task(node, &mut job.lane);
                            executed += 1;

                            match node.succ {
                                Some(next) => queue.push(Job {
                                    task: next,
                                    lane: job.lane,
                                }),
                                None => finish_lane(job.lane),
                            }

                            if remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
                                queue.close();
                            }
                        }
                        executed
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| handle.join().expect("worker thread panicked"))
                .collect()
        });

        // Lanes that only ever saw their bootstrap snapshot never enter
        // the queue; flush them here.
        self.flush_lanes();

        ExecutionStats {
            tasks_executed: worker_tasks.iter().sum(),
            worker_tasks,
            duration: started.elapsed(),
        }
    }

    fn flush_lanes(&mut self) {
        for (symbol, lane) in self.lanes.iter_mut() {
            if let Err(err) = lane.sink.flush() {
                error!(symbol = %symbol, error = %err, "failed to flush sink");
            }
        }
    }
}

/// Run one task body against its lane.
///
/// Task bodies never fail the run: classifier diagnostics go to the
/// sink, a trade for a symbol that never received a book is logged and
/// dropped, and sink write failures are logged without stopping other
/// chains.
fn run_task(node: &TaskNode, lane: &mut Option<SymbolLane>) {
    let Some(lane) = lane.as_mut() else {
        warn!(symbol = %node.symbol, "no book recorded for symbol; dropping trade");
        return;
    };

    match &node.payload {
        TaskPayload::BookUpdate(book) => {
            let text = lane.classifier.update_book(Some(book.clone()));
            if let Err(err) = lane.sink.append(&text) {
                error!(symbol = %node.symbol, error = %err, "failed to append classification output");
            }
        }
        TaskPayload::TradeAppend(trade) => {
            if !lane.classifier.record_trade(*trade) {
                warn!(symbol = %node.symbol, "dropping invalid trade");
            }
        }
    }
}

/// Flush and drop a lane at the end of its chain.
fn finish_lane(lane: Option<SymbolLane>) {
    if let Some(mut lane) = lane {
        if let Err(err) = lane.sink.flush() {
            error!(path = %lane.sink.path().display(), error = %err, "failed to flush sink");
        }
    }
}
