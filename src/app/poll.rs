//! Recurring discovery-status polling for the selected collection.
//!
//! One controller instance owns at most one live loop. Liveness is a flag
//! plus a session counter: every `start` bumps the session, so a response
//! from a fetch that was in flight when the loop was stopped or retargeted
//! can never be applied. Scheduling is frame-polled rather than timer-owned:
//! the egui update loop calls `tick` with the current instant, which keeps
//! all state mutation on one thread.

use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::api::{FetchError, JobStatus};

pub(in crate::app) type StatusReceiver = Receiver<Result<JobStatus, FetchError>>;

type FetchSpawner = Box<dyn Fn(i64) -> StatusReceiver>;

pub(in crate::app) struct PollingController {
    spawn_fetch: FetchSpawner,
    interval: Duration,
    session: u64,
    live: bool,
    collection: Option<i64>,
    in_flight: Option<(u64, StatusReceiver)>,
    next_due: Option<Instant>,
    status: Option<JobStatus>,
    progress_floor: f32,
}

impl PollingController {
    pub(in crate::app) fn new(spawn_fetch: FetchSpawner, interval: Duration) -> Self {
        Self {
            spawn_fetch,
            interval,
            session: 0,
            live: false,
            collection: None,
            in_flight: None,
            next_due: None,
            status: None,
            progress_floor: 0.0,
        }
    }

    /// Cancels any existing loop and starts a fresh one for `collection_id`
    /// with an immediate fetch.
    pub(in crate::app) fn start(&mut self, collection_id: i64) {
        self.stop();
        self.session = self.session.wrapping_add(1);
        self.live = true;
        self.collection = Some(collection_id);
        self.status = None;
        self.progress_floor = 0.0;
        self.in_flight = Some((self.session, (self.spawn_fetch)(collection_id)));
        debug!(collection_id, session = self.session, "polling started");
    }

    /// Marks the loop not-live and drops the pending fetch and timer. The
    /// last status snapshot survives for display. Safe to call repeatedly
    /// and with no loop active.
    pub(in crate::app) fn stop(&mut self) {
        self.live = false;
        self.in_flight = None;
        self.next_due = None;
    }

    /// `stop` plus forgetting the snapshot, for when the selected collection
    /// goes away entirely.
    pub(in crate::app) fn clear(&mut self) {
        self.stop();
        self.collection = None;
        self.status = None;
        self.progress_floor = 0.0;
    }

    pub(in crate::app) fn status(&self) -> Option<&JobStatus> {
        self.status.as_ref()
    }

    pub(in crate::app) fn is_live(&self) -> bool {
        self.live
    }

    /// Instant the next fetch is due, if one is scheduled. The host uses it
    /// to request a repaint so the timer fires without user input.
    pub(in crate::app) fn next_due(&self) -> Option<Instant> {
        self.next_due
    }

    pub(in crate::app) fn has_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Drives the loop one step: drains an arrived response (discarding it
    /// if its session is no longer current) and issues the next fetch once
    /// its timer is due. Returns true when the visible snapshot changed.
    pub(in crate::app) fn tick(&mut self, now: Instant) -> bool {
        let mut changed = false;

        if let Some((session, rx)) = self.in_flight.take() {
            match rx.try_recv() {
                Ok(result) => {
                    if session == self.session && self.live {
                        changed = self.apply(result, now);
                    } else {
                        debug!(session, "discarding stale poll response");
                    }
                }
                Err(TryRecvError::Empty) => {
                    self.in_flight = Some((session, rx));
                }
                Err(TryRecvError::Disconnected) => {
                    if session == self.session && self.live {
                        warn!("status worker exited without replying, polling stops");
                        self.stop();
                    }
                }
            }
        }

        if self.live
            && self.in_flight.is_none()
            && let (Some(due), Some(collection)) = (self.next_due, self.collection)
            && now >= due
        {
            self.next_due = None;
            self.in_flight = Some((self.session, (self.spawn_fetch)(collection)));
        }

        changed
    }

    fn apply(&mut self, result: Result<JobStatus, FetchError>, now: Instant) -> bool {
        match result {
            Ok(mut status) => {
                if status.state.is_terminal() {
                    debug!(state = status.state.label(), "job finished, polling stops");
                    self.live = false;
                    self.next_due = None;
                } else {
                    // A stale out-of-order response must not walk the
                    // rendered progress backwards within one session.
                    self.progress_floor = self.progress_floor.max(status.progress.clamp(0.0, 1.0));
                    status.progress = self.progress_floor;
                    self.next_due = Some(now + self.interval);
                }
                self.status = Some(status);
                true
            }
            Err(FetchError::NotFound) => {
                debug!("job no longer exists server-side, clearing status");
                self.status = None;
                self.progress_floor = 0.0;
                self.stop();
                true
            }
            Err(error) => {
                warn!(%error, "status poll failed, keeping last snapshot");
                self.stop();
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::mpsc::{self, Sender};

    use super::*;
    use crate::api::JobState;

    type Resolver = Sender<Result<JobStatus, FetchError>>;

    /// Controller whose fetches resolve only when the test says so; each
    /// spawned fetch is recorded as (collection id, resolver).
    fn controller(interval_ms: u64) -> (PollingController, Rc<RefCell<Vec<(i64, Resolver)>>>) {
        let spawned = Rc::new(RefCell::new(Vec::new()));
        let record = Rc::clone(&spawned);
        let spawn = Box::new(move |collection: i64| {
            let (tx, rx) = mpsc::channel();
            record.borrow_mut().push((collection, tx));
            rx
        });
        (
            PollingController::new(spawn, Duration::from_millis(interval_ms)),
            spawned,
        )
    }

    fn status(state: JobState, progress: f32) -> JobStatus {
        JobStatus {
            job_id: 1,
            state,
            progress,
            current_step: None,
            error_message: None,
        }
    }

    #[test]
    fn two_polls_then_terminal_stops_scheduling() {
        let (mut poller, spawned) = controller(2000);
        let t0 = Instant::now();

        poller.start(5);
        assert_eq!(spawned.borrow().len(), 1);
        assert_eq!(spawned.borrow()[0].0, 5);

        spawned.borrow()[0]
            .1
            .send(Ok(status(JobState::Running, 0.4)))
            .unwrap();
        assert!(poller.tick(t0));
        assert_eq!(poller.status().unwrap().state, JobState::Running);
        assert_eq!(poller.status().unwrap().progress, 0.4);

        // Not due yet at +1999ms, due at +2000ms.
        poller.tick(t0 + Duration::from_millis(1999));
        assert_eq!(spawned.borrow().len(), 1);
        poller.tick(t0 + Duration::from_millis(2000));
        assert_eq!(spawned.borrow().len(), 2);

        spawned.borrow()[1]
            .1
            .send(Ok(status(JobState::Succeeded, 1.0)))
            .unwrap();
        assert!(poller.tick(t0 + Duration::from_millis(2001)));
        assert_eq!(poller.status().unwrap().state, JobState::Succeeded);
        assert_eq!(poller.status().unwrap().progress, 1.0);
        assert!(!poller.is_live());

        // No third fetch, however much time passes.
        for seconds in 1..10 {
            poller.tick(t0 + Duration::from_secs(seconds));
        }
        assert_eq!(spawned.borrow().len(), 2);
    }

    #[test]
    fn retargeting_discards_the_old_loop() {
        let (mut poller, spawned) = controller(2000);
        let t0 = Instant::now();

        poller.start(1);
        poller.start(2);
        assert_eq!(spawned.borrow().len(), 2);

        // The first fetch's receiver was dropped when the loop retargeted,
        // so its late response cannot land anywhere.
        assert!(spawned.borrow()[0].1.send(Ok(status(JobState::Running, 0.9))).is_err());
        assert!(!poller.tick(t0));
        assert!(poller.status().is_none());

        spawned.borrow()[1]
            .1
            .send(Ok(status(JobState::Running, 0.2)))
            .unwrap();
        assert!(poller.tick(t0));
        assert_eq!(poller.status().unwrap().progress, 0.2);
    }

    #[test]
    fn stop_prevents_rearming() {
        let (mut poller, spawned) = controller(2000);
        let t0 = Instant::now();

        poller.start(3);
        spawned.borrow()[0]
            .1
            .send(Ok(status(JobState::Running, 0.5)))
            .unwrap();
        poller.tick(t0);
        assert!(poller.next_due().is_some());

        poller.stop();
        poller.stop(); // idempotent
        for seconds in 1..20 {
            assert!(!poller.tick(t0 + Duration::from_secs(seconds)));
        }
        assert_eq!(spawned.borrow().len(), 1);
        // Last snapshot survives an explicit stop.
        assert_eq!(poller.status().unwrap().progress, 0.5);
    }

    #[test]
    fn not_found_clears_status_and_stops() {
        let (mut poller, spawned) = controller(2000);
        let t0 = Instant::now();

        poller.start(4);
        spawned.borrow()[0]
            .1
            .send(Ok(status(JobState::Pending, 0.1)))
            .unwrap();
        poller.tick(t0);
        poller.tick(t0 + Duration::from_millis(2000));

        spawned.borrow()[1].1.send(Err(FetchError::NotFound)).unwrap();
        assert!(poller.tick(t0 + Duration::from_millis(2001)));
        assert!(poller.status().is_none());
        assert!(!poller.is_live());
        assert!(poller.next_due().is_none());
    }

    #[test]
    fn transient_failure_stops_but_keeps_snapshot() {
        let (mut poller, spawned) = controller(2000);
        let t0 = Instant::now();

        poller.start(6);
        spawned.borrow()[0]
            .1
            .send(Ok(status(JobState::Running, 0.3)))
            .unwrap();
        poller.tick(t0);
        poller.tick(t0 + Duration::from_millis(2000));

        spawned.borrow()[1]
            .1
            .send(Err(FetchError::Transient("connection refused".into())))
            .unwrap();
        assert!(!poller.tick(t0 + Duration::from_millis(2001)));
        assert!(!poller.is_live());
        assert_eq!(poller.status().unwrap().progress, 0.3);
        for seconds in 3..10 {
            poller.tick(t0 + Duration::from_secs(seconds));
        }
        assert_eq!(spawned.borrow().len(), 2);
    }

    #[test]
    fn progress_never_regresses_within_a_session() {
        let (mut poller, spawned) = controller(2000);
        let t0 = Instant::now();

        poller.start(7);
        spawned.borrow()[0]
            .1
            .send(Ok(status(JobState::Running, 0.6)))
            .unwrap();
        poller.tick(t0);
        poller.tick(t0 + Duration::from_millis(2000));

        // Server answered out of order; the rendered value holds at 0.6.
        spawned.borrow()[1]
            .1
            .send(Ok(status(JobState::Running, 0.2)))
            .unwrap();
        poller.tick(t0 + Duration::from_millis(2001));
        assert_eq!(poller.status().unwrap().progress, 0.6);

        // A new session starts from scratch.
        poller.start(7);
        spawned.borrow()[2]
            .1
            .send(Ok(status(JobState::Running, 0.1)))
            .unwrap();
        poller.tick(t0 + Duration::from_millis(2002));
        assert_eq!(poller.status().unwrap().progress, 0.1);
    }

    #[test]
    fn worker_death_stops_the_loop() {
        let (mut poller, spawned) = controller(2000);
        let t0 = Instant::now();

        poller.start(8);
        spawned.borrow_mut().clear(); // drop the sender without replying
        poller.tick(t0);
        assert!(!poller.is_live());
        assert!(!poller.has_in_flight());
    }
}
