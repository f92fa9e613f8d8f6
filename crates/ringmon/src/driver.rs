//! # Workload Driver
//!
//! Spawns producers and consumers around one shared ring.
//!
//! ```text
//!   Producer 0 ──┐                      ┌──> Consumer 0 ──┐
//!   Producer 1 ──┼──> [ Ring (monitor) ]┼──> Consumer 1 ──┼──> [channel] ──> collector
//!   Producer N ──┘                      └──> Consumer M ──┘
//! ```
//!
//! Producer `p` puts `{thread_id: p, value: 0..n}` in order. Consumers split
//! the total between them and forward everything they get to the collector,
//! tagged with their own index.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use ringmon_core::{Ring, RingStats, Slot};
use tracing::{debug, error, info, warn};

use crate::config::WorkloadConfig;
use crate::error::{DriverError, DriverResult, Role};

/// Stream offset separating consumer generators from producer generators.
const CONSUMER_STREAM_BASE: u64 = 1 << 32;

/// Random pause between ring operations, reproducible from the seed.
struct Jitter {
    rng: Option<ChaCha8Rng>,
    max_us: u64,
}

impl Jitter {
    fn new(seed: u64, stream: u64, max_us: u64) -> Self {
        let rng = (max_us > 0).then(|| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            rng.set_stream(stream);
            rng
        });
        Self { rng, max_us }
    }

    fn pause(&mut self) {
        if let Some(rng) = &mut self.rng {
            let us = rng.gen_range(0..=self.max_us);
            if us > 0 {
                thread::sleep(Duration::from_micros(us));
            }
        }
    }
}

/// What a finished run observed.
#[derive(Clone, Debug)]
pub struct WorkloadReport {
    /// Slots received, one list per consumer, in the order each consumer got them.
    pub consumed: Vec<Vec<Slot>>,
    /// Ring counters at the end of the run.
    pub stats: RingStats,
    /// Wall time from first spawn to last join.
    pub elapsed: Duration,
}

impl WorkloadReport {
    /// Total slots received across all consumers.
    #[must_use]
    pub fn total_consumed(&self) -> usize {
        self.consumed.iter().map(Vec::len).sum()
    }

    /// Slots received per consumer.
    #[must_use]
    pub fn per_consumer_counts(&self) -> Vec<usize> {
        self.consumed.iter().map(Vec::len).collect()
    }

    /// Checks the run against what `config` says was produced.
    ///
    /// - every produced slot was consumed exactly once (no loss, no duplicates)
    /// - within each consumer, each producer's values are strictly increasing
    /// - ring counters agree with the totals
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Verification`] describing the first violation.
    pub fn verify(&self, config: &WorkloadConfig) -> DriverResult<()> {
        let result = self.check(config);
        if let Err(e) = &result {
            error!(%e, "workload verification failed");
        }
        result
    }

    fn check(&self, config: &WorkloadConfig) -> DriverResult<()> {
        let per_producer = config.messages_per_producer as usize;
        let mut seen = vec![vec![false; per_producer]; config.producers];

        for (consumer, slots) in self.consumed.iter().enumerate() {
            let mut last_value: Vec<Option<i32>> = vec![None; config.producers];

            for slot in slots {
                let producer = slot.thread_id as usize;
                let index = usize::try_from(slot.value).ok().filter(|&v| v < per_producer);
                let Some(index) = index.filter(|_| producer < config.producers) else {
                    return Err(DriverError::Verification(format!(
                        "consumer {consumer} got {slot}, which was never produced"
                    )));
                };

                if seen[producer][index] {
                    return Err(DriverError::Verification(format!(
                        "{slot} was consumed twice"
                    )));
                }
                seen[producer][index] = true;

                if let Some(prev) = last_value[producer] {
                    if prev >= slot.value {
                        return Err(DriverError::Verification(format!(
                            "consumer {consumer} got thread {producer} value {} after {prev}",
                            slot.value
                        )));
                    }
                }
                last_value[producer] = Some(slot.value);
            }
        }

        let missing: usize = seen
            .iter()
            .map(|values| values.iter().filter(|&&s| !s).count())
            .sum();
        if missing > 0 {
            return Err(DriverError::Verification(format!(
                "{missing} produced slots were never consumed"
            )));
        }

        let total = config.total_messages() as u64;
        if self.stats.total_puts != total || self.stats.total_gets != total {
            return Err(DriverError::Verification(format!(
                "ring counted {} puts and {} gets, expected {total} of each",
                self.stats.total_puts, self.stats.total_gets
            )));
        }

        Ok(())
    }
}

/// A worker body handed to the thread spawner.
type Worker = Box<dyn FnOnce() + Send + 'static>;

/// Poll interval used while unwinding workers after a failed spawn.
const UNWIND_POLL: Duration = Duration::from_millis(1);

/// Runs a workload to completion.
///
/// # Errors
///
/// - [`DriverError::Config`] if the config fails validation
/// - [`DriverError::Ring`] if the ring size is invalid
/// - [`DriverError::Io`] if a worker thread cannot be spawned; workers
///   already started are run down and joined before this returns
/// - [`DriverError::WorkerPanicked`] if any worker panics
pub fn run(config: &WorkloadConfig) -> DriverResult<WorkloadReport> {
    run_with_spawner(config, |name, work| thread::Builder::new().name(name).spawn(work))
}

fn run_with_spawner<S>(config: &WorkloadConfig, mut spawn: S) -> DriverResult<WorkloadReport>
where
    S: FnMut(String, Worker) -> std::io::Result<JoinHandle<()>>,
{
    config.validate()?;
    let ring: Arc<Ring> = Arc::new(Ring::from_config(&config.ring)?);

    info!(
        producers = config.producers,
        consumers = config.consumers,
        messages = config.total_messages(),
        size = ring.size(),
        slots = ring.slots(),
        "workload starting"
    );

    let (tx, rx) = crossbeam_channel::unbounded::<(usize, Slot)>();
    let start = Instant::now();

    let mut producers = Vec::with_capacity(config.producers);
    let mut consumers = Vec::with_capacity(config.consumers);
    let spawned = spawn_workers(config, &ring, &tx, &mut spawn, &mut producers, &mut consumers);
    drop(tx);

    if let Err(e) = spawned {
        warn!(
            %e,
            producers = producers.len(),
            consumers = consumers.len(),
            "worker spawn failed, running down started workers"
        );
        unwind_workers(&ring, producers, consumers);
        return Err(e);
    }

    join_all(producers, Role::Producer)?;
    join_all(consumers, Role::Consumer)?;
    let elapsed = start.elapsed();

    let mut consumed: Vec<Vec<Slot>> = (0..config.consumers)
        .map(|c| Vec::with_capacity(config.consumer_share(c)))
        .collect();
    for (c, slot) in rx.try_iter() {
        consumed[c].push(slot);
    }

    let stats = ring.stats();
    info!(
        ?elapsed,
        producer_waits = stats.producer_waits,
        consumer_waits = stats.consumer_waits,
        "workload finished"
    );

    Ok(WorkloadReport {
        consumed,
        stats,
        elapsed,
    })
}

/// Starts every producer, then every consumer. Handles of started workers
/// are pushed as they are created, so they survive a mid-way failure.
fn spawn_workers<S>(
    config: &WorkloadConfig,
    ring: &Arc<Ring>,
    tx: &crossbeam_channel::Sender<(usize, Slot)>,
    spawn: &mut S,
    producers: &mut Vec<JoinHandle<()>>,
    consumers: &mut Vec<JoinHandle<()>>,
) -> DriverResult<()>
where
    S: FnMut(String, Worker) -> std::io::Result<JoinHandle<()>>,
{
    let messages = i32::try_from(config.messages_per_producer)
        .map_err(|_| DriverError::Config("message count overflows a slot value".into()))?;

    for p in 0..config.producers {
        let thread_id = u32::try_from(p)
            .map_err(|_| DriverError::Config(format!("producer {p} overflows a thread id")))?;
        let ring = Arc::clone(ring);
        let mut jitter = Jitter::new(config.seed, u64::from(thread_id), config.max_jitter_us);

        producers.push(spawn(
            format!("producer-{p}"),
            Box::new(move || {
                for value in 0..messages {
                    jitter.pause();
                    ring.put(Slot::new(thread_id, value));
                }
                debug!(producer = thread_id, messages, "producer finished");
            }),
        )?);
    }

    for c in 0..config.consumers {
        let ring = Arc::clone(ring);
        let tx = tx.clone();
        let share = config.consumer_share(c);
        let mut jitter = Jitter::new(
            config.seed,
            CONSUMER_STREAM_BASE + c as u64,
            config.max_jitter_us,
        );

        consumers.push(spawn(
            format!("consumer-{c}"),
            Box::new(move || {
                for _ in 0..share {
                    jitter.pause();
                    let slot = ring.get();
                    if tx.send((c, slot)).is_err() {
                        break;
                    }
                }
                debug!(consumer = c, share, "consumer finished");
            }),
        )?);
    }
    Ok(())
}

/// Lets a partially started workload finish without its missing workers.
///
/// Producers may be parked on a full ring with nobody left to consume, and
/// consumers may be waiting for slots nobody will produce. The calling
/// thread drains the ring until every producer is done, then feeds filler
/// slots until every consumer is done, then joins them all.
fn unwind_workers(ring: &Ring, producers: Vec<JoinHandle<()>>, consumers: Vec<JoinHandle<()>>) {
    while producers.iter().any(|h| !h.is_finished()) {
        let _ = ring.get_timeout(UNWIND_POLL);
    }
    while consumers.iter().any(|h| !h.is_finished()) {
        let _ = ring.put_timeout(Slot::default(), UNWIND_POLL);
    }
    for handle in producers.into_iter().chain(consumers) {
        let _ = handle.join();
    }
}

fn join_all(handles: Vec<JoinHandle<()>>, role: Role) -> DriverResult<()> {
    for (id, handle) in handles.into_iter().enumerate() {
        handle
            .join()
            .map_err(|_| DriverError::WorkerPanicked { role, id })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringmon_core::RingConfig;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn report_from(consumed: Vec<Vec<Slot>>) -> WorkloadReport {
        let total = consumed.iter().map(Vec::len).sum::<usize>() as u64;
        WorkloadReport {
            consumed,
            stats: RingStats {
                total_puts: total,
                total_gets: total,
                ..RingStats::default()
            },
            elapsed: Duration::ZERO,
        }
    }

    fn two_by_two() -> WorkloadConfig {
        WorkloadConfig {
            producers: 2,
            consumers: 2,
            messages_per_producer: 2,
            ..WorkloadConfig::default()
        }
    }

    #[test]
    fn test_jitter_is_reproducible() {
        let mut a = Jitter::new(42, 3, 1_000);
        let mut b = Jitter::new(42, 3, 1_000);
        let ra = a.rng.as_mut().unwrap();
        let rb = b.rng.as_mut().unwrap();
        for _ in 0..16 {
            assert_eq!(ra.gen_range(0..=1_000u64), rb.gen_range(0..=1_000u64));
        }
    }

    #[test]
    fn test_zero_jitter_has_no_rng() {
        assert!(Jitter::new(42, 0, 0).rng.is_none());
    }

    #[test]
    fn test_verify_accepts_interleaved_output() {
        let report = report_from(vec![
            vec![Slot::new(0, 0), Slot::new(1, 0), Slot::new(1, 1)],
            vec![Slot::new(0, 1)],
        ]);
        report.verify(&two_by_two()).unwrap();
    }

    #[test]
    fn test_verify_detects_duplicate() {
        let report = report_from(vec![
            vec![Slot::new(0, 0), Slot::new(1, 0)],
            vec![Slot::new(0, 0), Slot::new(1, 1)],
        ]);
        let err = report.verify(&two_by_two()).unwrap_err();
        assert!(err.to_string().contains("consumed twice"), "{err}");
    }

    #[test]
    fn test_verify_detects_loss() {
        let report = report_from(vec![vec![Slot::new(0, 0), Slot::new(1, 0)], vec![Slot::new(1, 1)]]);
        let err = report.verify(&two_by_two()).unwrap_err();
        assert!(err.to_string().contains("never consumed"), "{err}");
    }

    #[test]
    fn test_verify_detects_reordering() {
        let report = report_from(vec![
            vec![Slot::new(0, 1), Slot::new(0, 0)],
            vec![Slot::new(1, 0), Slot::new(1, 1)],
        ]);
        let err = report.verify(&two_by_two()).unwrap_err();
        assert!(err.to_string().contains("after"), "{err}");
    }

    #[test]
    fn test_verify_detects_foreign_slot() {
        let report = report_from(vec![vec![Slot::new(9, 0)], vec![]]);
        let err = report.verify(&two_by_two()).unwrap_err();
        assert!(err.to_string().contains("never produced"), "{err}");
    }

    #[test]
    fn test_run_rejects_bad_ring_size() {
        let config = WorkloadConfig {
            ring: RingConfig::with_size(0),
            ..WorkloadConfig::default()
        };
        assert!(matches!(run(&config), Err(DriverError::Ring(_))));
    }

    /// Spawner that refuses its `fail_at`-th call and counts finished workers.
    fn flaky_spawner(
        fail_at: usize,
        finished: Arc<AtomicUsize>,
    ) -> impl FnMut(String, Worker) -> std::io::Result<JoinHandle<()>> {
        let mut calls = 0;
        move |name, work| {
            calls += 1;
            if calls == fail_at {
                return Err(std::io::Error::other("thread limit reached"));
            }
            let finished = Arc::clone(&finished);
            thread::Builder::new().name(name).spawn(move || {
                work();
                finished.fetch_add(1, Ordering::SeqCst);
            })
        }
    }

    fn blocking_workload() -> WorkloadConfig {
        // Far more messages than slots, so producers park on a full ring.
        WorkloadConfig {
            producers: 2,
            consumers: 2,
            messages_per_producer: 200,
            ring: RingConfig::with_size(2),
            ..WorkloadConfig::default()
        }
    }

    #[test]
    fn test_spawn_failure_before_consumers_runs_down_producers() {
        let finished = Arc::new(AtomicUsize::new(0));
        let err = run_with_spawner(&blocking_workload(), flaky_spawner(3, Arc::clone(&finished)))
            .unwrap_err();

        assert!(matches!(err, DriverError::Io(_)), "{err}");
        assert_eq!(finished.load(Ordering::SeqCst), 2, "both producers joined");
    }

    #[test]
    fn test_spawn_failure_after_first_consumer_runs_down_everyone() {
        let finished = Arc::new(AtomicUsize::new(0));
        let err = run_with_spawner(&blocking_workload(), flaky_spawner(4, Arc::clone(&finished)))
            .unwrap_err();

        assert!(matches!(err, DriverError::Io(_)), "{err}");
        assert_eq!(finished.load(Ordering::SeqCst), 3, "producers and consumer 0 joined");
    }

    #[test]
    fn test_spawn_failure_on_first_producer() {
        let finished = Arc::new(AtomicUsize::new(0));
        let err = run_with_spawner(&blocking_workload(), flaky_spawner(1, Arc::clone(&finished)))
            .unwrap_err();

        assert!(matches!(err, DriverError::Io(_)), "{err}");
        assert_eq!(finished.load(Ordering::SeqCst), 0);
    }
}
