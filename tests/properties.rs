use std::{collections::BTreeMap, num::NonZeroU64};

use rand::{rngs::StdRng, SeedableRng};
use routersim::{
    feeder::{self, FeederConfig, PriorityScheme},
    queue::{FifoQ, QDisc, RoundRobinQ},
    units::{PacketsPerSec, Secs},
    Config, EventKind, FlowId, Packet, Policy, Report,
};

const SEEDS: [u64; 4] = [1, 7, 42, 1234];

fn feed(seed: u64, flows: u64, priorities: PriorityScheme) -> anyhow::Result<Vec<Packet>> {
    let cfg = FeederConfig::builder()
        .rate(PacketsPerSec::new(40.0))
        .burst(NonZeroU64::new(3).unwrap())
        .flows(NonZeroU64::new(flows).unwrap())
        .duration(Secs::new(2))
        .priorities(priorities)
        .build();
    Ok(feeder::generate(&cfg, &mut StdRng::seed_from_u64(seed))?)
}

fn run(policy: Policy, rate: f64, pkts: Vec<Packet>) -> anyhow::Result<Report> {
    let cfg = Config::builder()
        .policy(policy)
        .output_rate(PacketsPerSec::new(rate))
        .weights("4,2,1".parse()?)
        .build();
    Ok(routersim::run(&cfg, pkts)?)
}

fn payloads(report: &Report, kind: EventKind) -> Vec<String> {
    report
        .events
        .iter()
        .filter(|ev| ev.kind == kind)
        .map(|ev| ev.packet.payload.clone())
        .collect()
}

#[test]
fn fcfs_sends_in_enqueue_order() -> anyhow::Result<()> {
    for seed in SEEDS {
        // The link is slower than the offered load, so the queue builds up
        let report = run(Policy::Fcfs, 50.0, feed(seed, 3, PriorityScheme::Random)?)?;
        assert_eq!(
            payloads(&report, EventKind::Send),
            payloads(&report, EventKind::Enqueue)
        );
    }
    Ok(())
}

#[test]
fn fcfs_queue_order_ignores_timing() {
    let mut q = FifoQ::new();
    let pkts = (0..20)
        .map(|i| {
            Packet::builder()
                .arrival(((i * 13) % 7) as f64)
                .flow_id(FlowId::new(i % 3 + 1))
                .size(routersim::units::Bytes::new(64))
                .payload(format!("p{i}"))
                .build()
        })
        .collect::<Vec<_>>();
    for pkt in pkts.iter().cloned() {
        q.enqueue(pkt);
    }
    let out = std::iter::from_fn(|| q.dequeue()).collect::<Vec<_>>();
    assert_eq!(out, pkts);
}

// Whenever a packet is sent, nothing resident in the queue is strictly more urgent.
#[test]
fn priority_never_skips_a_more_urgent_packet() -> anyhow::Result<()> {
    for seed in SEEDS {
        let report = run(Policy::Priority, 30.0, feed(seed, 4, PriorityScheme::Random)?)?;
        let mut resident = BTreeMap::<String, i64>::new();
        for ev in &report.events {
            let prio = ev.packet.priority.inner();
            match ev.kind {
                EventKind::Enqueue => {
                    resident.insert(ev.packet.payload.clone(), prio);
                }
                EventKind::Send => {
                    let min = resident.values().min().copied();
                    assert_eq!(min, Some(prio), "seed {seed}: sent {}", ev.packet.payload);
                    resident.remove(&ev.packet.payload);
                }
            }
        }
        assert!(resident.is_empty());
    }
    Ok(())
}

#[test]
fn round_robin_serves_each_flow_once_per_cycle() {
    let k = 5_u64;
    let mut q = RoundRobinQ::new();
    for round in 0..10 {
        // Reverse id order on purpose
        for flow in (1..=k).rev() {
            q.enqueue(
                Packet::builder()
                    .arrival(0.0)
                    .flow_id(FlowId::new(flow))
                    .size(routersim::units::Bytes::new(100))
                    .payload(format!("{flow}-{round}"))
                    .build(),
            );
        }
    }
    let served = std::iter::from_fn(|| q.dequeue())
        .map(|p| p.flow_id.inner())
        .collect::<Vec<_>>();
    assert_eq!(served.len(), 50);
    for cycle in served.chunks(k as usize) {
        assert_eq!(cycle, (1..=k).collect::<Vec<_>>().as_slice());
    }
}

#[test]
fn every_well_formed_packet_is_sent() -> anyhow::Result<()> {
    let policies = [
        Policy::Fcfs,
        Policy::Priority,
        Policy::RoundRobin,
        Policy::Wfq,
    ];
    for seed in SEEDS {
        for policy in policies {
            for rate in [10.0, 120.0, 1000.0] {
                let pkts = feed(seed, 3, PriorityScheme::ByFlow)?;
                let total = pkts.len();
                let report = run(policy, rate, pkts)?;
                assert_eq!(report.summary.enqueued, total);
                assert_eq!(report.summary.sent, total, "{policy} at {rate}/s");
                assert_eq!(report.records.len(), total);
                assert!(report.events.windows(2).all(|w| w[0].time <= w[1].time));

                let per_flow: usize = report.summary.flows.values().map(|s| s.sent).sum();
                assert_eq!(per_flow, total);
            }
        }
    }
    Ok(())
}

#[test]
fn sends_respect_the_output_rate() -> anyhow::Result<()> {
    let report = run(Policy::RoundRobin, 20.0, feed(3, 3, PriorityScheme::Uniform)?)?;
    let times = report
        .events
        .iter()
        .filter(|ev| ev.kind == EventKind::Send)
        .map(|ev| ev.time.into_f64())
        .collect::<Vec<_>>();
    // 50 ms apart at least
    assert!(times.windows(2).all(|w| w[1] - w[0] >= 50.0 - 1e-9));
    Ok(())
}
