//! Single-slot rendezvous between the accept thread and the simulation
//! tick.
//!
//! The accept thread publishes one request at a time and blocks until the
//! simulation thread has finished with it; the simulation thread never
//! blocks, it polls the slot once per tick. Ownership of the request
//! value moves hand-over-hand: producer, then consumer, then back to the
//! producer on release. No other state is shared between the two
//! threads.
//!
//! Shutdown must release a producer that is blocked mid-publish *before*
//! anyone joins the accept thread, or the join deadlocks. Dropping the
//! [`Collector`]'s stop handle is that unconditional release; every
//! blocked or future [`Publisher::publish`] observes it immediately.

use crossbeam::channel::{bounded, Receiver, Sender, TryRecvError, TrySendError};
use crossbeam::select;
use std::{error, fmt};

/// Creates a connected publisher/collector pair around an empty slot.
pub(crate) fn pair<T: Send>() -> (Publisher<T>, Collector<T>) {
    // capacity 1: the slot holds at most one in-flight request
    let (ready_tx, ready_rx) = bounded(1);
    let (stop_tx, stop_rx) = bounded::<()>(0);

    (
        Publisher { ready_tx, stop_rx },
        Collector {
            ready_rx,
            stop_tx: Some(stop_tx),
        },
    )
}

struct Pending<T> {
    value: T,
    done_tx: Sender<T>,
}

/// Producer half, owned by the accept thread.
pub(crate) struct Publisher<T> {
    ready_tx: Sender<Pending<T>>,
    stop_rx: Receiver<()>,
}

impl<T: Send> Publisher<T> {
    /// Publishes one request and blocks until the consumer releases it.
    ///
    /// Returns the value once the consumer is done with it (`None` if the
    /// consumer dropped it), or [`Interrupted`] when shutdown was raised
    /// while waiting. The caller must not publish again before this
    /// returns; that discipline is what keeps the slot at one request.
    pub(crate) fn publish(&self, value: T) -> Result<Option<T>, Interrupted> {
        let (done_tx, done_rx) = bounded(1);

        match self.ready_tx.try_send(Pending { value, done_tx }) {
            Ok(()) => {}
            // Full means a previous publish never completed; both cases
            // mean the consumer side is gone for us
            Err(TrySendError::Full(_) | TrySendError::Disconnected(_)) => {
                return Err(Interrupted);
            }
        }

        select! {
            recv(done_rx) -> released => Ok(released.ok()),
            recv(self.stop_rx) -> _ => Err(Interrupted),
        }
    }
}

/// Consumer half, owned by the simulation thread.
pub(crate) struct Collector<T> {
    ready_rx: Receiver<Pending<T>>,
    // dropping this is the unconditional "request done" that releases a
    // producer blocked mid-publish, whether through shutdown() or the
    // collector's own drop
    stop_tx: Option<Sender<()>>,
}

/// Result of one non-blocking poll of the slot.
pub(crate) enum Polled<T> {
    /// No request is waiting.
    Empty,
    /// One request, now owned by the consumer until finished or dropped.
    Request(Delivery<T>),
    /// The producer thread is gone; fatal for the subsystem.
    Disconnected,
}

impl<T: Send> Collector<T> {
    /// Polls the slot with zero timeout; never blocks.
    pub(crate) fn poll(&self) -> Polled<T> {
        match self.ready_rx.try_recv() {
            Ok(pending) => Polled::Request(Delivery {
                value: pending.value,
                done_tx: pending.done_tx,
            }),
            Err(TryRecvError::Empty) => Polled::Empty,
            Err(TryRecvError::Disconnected) => Polled::Disconnected,
        }
    }

    /// Raises the shutdown signal, releasing any blocked publish.
    pub(crate) fn shutdown(&mut self) {
        self.stop_tx.take();
    }
}

/// Exclusive ownership of one in-flight request on the consumer side.
pub(crate) struct Delivery<T> {
    value: T,
    done_tx: Sender<T>,
}

impl<T: Send> Delivery<T> {
    pub(crate) fn value_mut(&mut self) -> &mut T {
        &mut self.value
    }

    /// Releases the request, returning ownership to the producer.
    ///
    /// Dropping a `Delivery` without calling this also releases the
    /// producer (the completion channel disconnects), so a panicking
    /// handler cannot wedge the accept thread.
    pub(crate) fn finish(self) {
        // the producer may already have given up via shutdown
        let _ = self.done_tx.send(self.value);
    }
}

/// Shutdown was raised while a publish was in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Interrupted;

impl error::Error for Interrupted {}

impl fmt::Display for Interrupted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handoff slot shut down while a request was in flight")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{thread, time::Duration};

    #[test]
    fn requests_arrive_in_submission_order() {
        let (publisher, collector) = pair::<usize>();

        let producer = thread::spawn(move || {
            for i in 0..32 {
                let released = publisher.publish(i).expect("collector stays alive");
                // ownership of the request comes back on release
                assert_eq!(released, Some(i));
            }
        });

        let mut seen = Vec::new();
        while seen.len() < 32 {
            match collector.poll() {
                Polled::Request(delivery) => {
                    seen.push(delivery.value);
                    delivery.finish();
                }
                Polled::Empty => thread::yield_now(),
                Polled::Disconnected => panic!("producer died early"),
            }
        }

        producer.join().expect("producer exits cleanly");
        assert_eq!(seen, (0..32).collect::<Vec<_>>());
    }

    #[test]
    fn at_most_one_request_resident() {
        let (publisher, collector) = pair::<u8>();

        let producer = thread::spawn(move || {
            publisher.publish(1).expect("released");
            publisher.publish(2).expect("released");
        });

        // the second request cannot enter the slot before the first is
        // finished, no matter how long the consumer dawdles
        let first = loop {
            if let Polled::Request(delivery) = collector.poll() {
                break delivery;
            }
            thread::yield_now();
        };
        thread::sleep(Duration::from_millis(20));
        assert!(matches!(collector.poll(), Polled::Empty));

        first.finish();
        let second = loop {
            if let Polled::Request(delivery) = collector.poll() {
                break delivery;
            }
            thread::yield_now();
        };
        assert_eq!(second.value, 2);
        second.finish();

        producer.join().expect("producer exits cleanly");
    }

    #[test]
    fn shutdown_releases_blocked_publish() {
        let (publisher, mut collector) = pair::<&'static str>();

        let producer = thread::spawn(move || publisher.publish("stuck"));

        // never poll; the producer stays blocked until shutdown
        thread::sleep(Duration::from_millis(20));
        collector.shutdown();

        assert_eq!(producer.join().expect("join succeeds"), Err(Interrupted));
    }

    #[test]
    fn publish_after_shutdown_is_refused() {
        let (publisher, collector) = pair::<u8>();
        drop(collector);

        assert_eq!(publisher.publish(7), Err(Interrupted));
    }

    #[test]
    fn dropped_delivery_still_releases_producer() {
        let (publisher, collector) = pair::<u8>();

        let producer = thread::spawn(move || publisher.publish(9));

        let delivery = loop {
            if let Polled::Request(delivery) = collector.poll() {
                break delivery;
            }
            thread::yield_now();
        };
        drop(delivery);

        // released, but the value never came back
        assert_eq!(producer.join().expect("join succeeds"), Ok(None));
    }

    #[test]
    fn dead_producer_is_reported() {
        let (publisher, collector) = pair::<u8>();
        drop(publisher);

        assert!(matches!(collector.poll(), Polled::Disconnected));
    }
}
