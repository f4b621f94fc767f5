pub(crate) mod event;

use std::collections::VecDeque;

use tracing::{debug, info};

use crate::{
    data::{Record, Report, Summary},
    packet::Packet,
    queue::QDisc,
    time::{Delta, Time},
};

use self::event::{Event, EventKind};

/// The event loop.
///
/// Merges the arrival timeline with a send clock that ticks every `interval` while the queue is
/// busy. Arrivals win ties with the send clock, and only one arrival is admitted per step.
#[derive(Debug, typed_builder::TypedBuilder)]
pub(crate) struct Simulation<Q: QDisc> {
    // Run-time
    #[builder(default, setter(skip))]
    cur_time: Time,
    #[builder(default, setter(skip))]
    next_send: Time,

    // Entities
    #[builder(setter(transform = |pkts: Vec<Packet>| VecDeque::from(pkts)))]
    arrivals: VecDeque<Packet>,
    queue: Q,

    // Pacing
    #[builder(setter(into))]
    interval: Delta,

    // Output
    #[builder(default, setter(skip))]
    events: Vec<Event>,
    #[builder(default, setter(skip))]
    records: Vec<Record>,
    #[builder(default, setter(skip))]
    enqueued: usize,
}

impl<Q: QDisc> Simulation<Q> {
    pub(crate) fn run(mut self) -> Report {
        // Input order is not guaranteed; a stable sort keeps equal timestamps in input order
        self.arrivals
            .make_contiguous()
            .sort_by(|a, b| a.arrival.cmp(&b.arrival));
        info!(
            packets = self.arrivals.len(),
            interval_ms = %self.interval,
            "starting simulation"
        );
        while !self.should_stop() {
            self.step();
        }
        self.finish()
    }

    fn step(&mut self) {
        let next_arrival = self.arrivals.front().map(|pkt| pkt.arrival);
        match next_arrival {
            Some(time) if time <= self.next_send => {
                self.advance(time);
                self.admit();
            }
            _ => {
                self.advance(self.next_send);
                self.transmit(next_arrival);
            }
        }
    }

    fn advance(&mut self, time: Time) {
        assert!(self.cur_time <= time);
        self.cur_time = time;
    }

    fn admit(&mut self) {
        let Some(pkt) = self.arrivals.pop_front() else {
            return;
        };
        debug!(
            time = %self.cur_time,
            flow = %pkt.flow_id,
            prio = %pkt.priority,
            size = %pkt.size,
            "enqueue"
        );
        self.events
            .push(Event::new(self.cur_time, EventKind::Enqueue, pkt.clone()));
        self.queue.enqueue(pkt);
        self.enqueued += 1;
    }

    fn transmit(&mut self, next_arrival: Option<Time>) {
        match self.queue.dequeue() {
            Some(pkt) => {
                debug!(
                    time = %self.cur_time,
                    flow = %pkt.flow_id,
                    prio = %pkt.priority,
                    size = %pkt.size,
                    backlog = self.queue.len(),
                    "send"
                );
                self.records.push(Record {
                    flow_id: pkt.flow_id,
                    priority: pkt.priority,
                    size: pkt.size,
                    arrival: pkt.arrival,
                    departure: self.cur_time,
                });
                self.events
                    .push(Event::new(self.cur_time, EventKind::Send, pkt));
                self.next_send = self.cur_time + self.interval;
            }
            None => {
                // Idle link: jump the send clock to the next arrival instead of polling
                if let Some(time) = next_arrival {
                    self.next_send = time;
                }
            }
        }
    }

    fn should_stop(&self) -> bool {
        self.arrivals.is_empty() && self.queue.is_empty()
    }

    fn finish(self) -> Report {
        assert_eq!(self.enqueued, self.records.len() + self.queue.len());
        let end_time = self
            .events
            .last()
            .map(|ev| ev.time)
            .unwrap_or(Time::ZERO);
        let summary = Summary::from_records(self.enqueued, end_time, &self.records);
        info!(
            enqueued = summary.enqueued,
            sent = summary.sent,
            bytes_sent = %summary.bytes_sent,
            end_time_ms = %summary.end_time,
            "simulation complete"
        );
        Report {
            events: self.events,
            records: self.records,
            summary,
        }
    }
}
