//! Frame dispatcher
//!
//! Drives one frame through the layer classifiers and records the final
//! disposition. Handlers are selected from the next-protocol value left in
//! the cursor by the previous layer.

use super::blacklist::{BlacklistStore, Transport};
use super::classifier::{
    classify_ethernet, classify_ipv4, classify_ipv6, classify_transport, Outcome,
};
use super::disposition::Disposition;
use super::stats::StatsRecorder;
use crate::protocol::{EtherType, PacketView, ParseCursor};
use std::sync::Arc;

/// Dispatcher state in which a frame reached its final disposition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    EthParsed,
    Ipv4Parsed,
    Ipv6Parsed,
    TcpParsed,
    UdpParsed,
    /// No classifier matched the next-protocol value
    Unclassified,
}

/// Disposition plus the reason behind it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub disposition: Disposition,
    pub outcome: Outcome,
    pub stage: Stage,
}

impl Verdict {
    fn new(outcome: Outcome, stage: Stage) -> Self {
        Self {
            disposition: outcome.disposition(),
            outcome,
            stage,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifierOptions {
    /// Require the IPv4 header length declared by IHL to lie inside the frame
    pub strict_ipv4_header_len: bool,
}

impl Default for ClassifierOptions {
    fn default() -> Self {
        Self {
            strict_ipv4_header_len: true,
        }
    }
}

/// Stateless classifier over a shared blacklist and counter table
#[derive(Debug, Clone)]
pub struct Dispatcher {
    store: Arc<BlacklistStore>,
    stats: Arc<StatsRecorder>,
    options: ClassifierOptions,
}

impl Dispatcher {
    pub fn new(
        store: Arc<BlacklistStore>,
        stats: Arc<StatsRecorder>,
        options: ClassifierOptions,
    ) -> Self {
        Self {
            store,
            stats,
            options,
        }
    }

    /// Classify one frame on behalf of worker `shard`.
    pub fn classify(&self, shard: usize, frame: &[u8]) -> Disposition {
        self.classify_detailed(shard, frame).disposition
    }

    /// Same as [`classify`](Self::classify) but also reports where the frame
    /// stopped and why. Counters are updated either way.
    pub fn classify_detailed(&self, shard: usize, frame: &[u8]) -> Verdict {
        let verdict = self.run(frame);
        self.stats
            .record(shard, verdict.disposition, frame.len() as u64);
        verdict
    }

    fn run(&self, frame: &[u8]) -> Verdict {
        let view = PacketView::new(frame);
        let mut cursor = ParseCursor::new();
        let store = self.store.as_ref();

        let outcome = classify_ethernet(&view, &mut cursor, store);
        if !outcome.is_normal() {
            return Verdict::new(outcome, Stage::Start);
        }

        let (outcome, stage) = match EtherType::from_u16(cursor.next_protocol()) {
            Some(EtherType::Ipv4) => (
                classify_ipv4(
                    &view,
                    &mut cursor,
                    store,
                    self.options.strict_ipv4_header_len,
                ),
                Stage::Ipv4Parsed,
            ),
            Some(EtherType::Ipv6) => (classify_ipv6(&view, &mut cursor, store), Stage::Ipv6Parsed),
            _ => return Verdict::new(Outcome::UnhandledProtocol, Stage::Unclassified),
        };
        if !outcome.is_normal() {
            return Verdict::new(outcome, Stage::EthParsed);
        }

        let Some(transport) = Transport::from_protocol(cursor.next_protocol()) else {
            return Verdict::new(Outcome::UnhandledProtocol, Stage::Unclassified);
        };
        let outcome = classify_transport(&view, &mut cursor, store, transport);
        if !outcome.is_normal() {
            return Verdict::new(outcome, stage);
        }

        let stage = match transport {
            Transport::Tcp => Stage::TcpParsed,
            Transport::Udp => Stage::UdpParsed,
        };
        Verdict::new(Outcome::Normal, stage)
    }

    pub fn store(&self) -> &Arc<BlacklistStore> {
        &self.store
    }

    pub fn stats(&self) -> &Arc<StatsRecorder> {
        &self.stats
    }

    pub fn options(&self) -> ClassifierOptions {
        self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataplane::blacklist::{
        BlacklistKey, BlacklistStoreBuilder, CidrKey, PortDirection, PortKey,
    };
    use crate::dataplane::classifier::HitKind;
    use crate::protocol::ethernet::FrameBuilder;
    use crate::protocol::{ipv4, ipv6, tcp, udp, IpProtocol, MacAddr};
    use std::net::Ipv4Addr;

    const DST: MacAddr = MacAddr([0x02, 0, 0, 0, 0, 0x01]);
    const SRC: MacAddr = MacAddr([0x02, 0, 0, 0, 0, 0x02]);

    fn dispatcher(keys: &[BlacklistKey]) -> Dispatcher {
        let mut builder = BlacklistStoreBuilder::new();
        for key in keys {
            builder.insert(*key).unwrap();
        }
        Dispatcher::new(
            Arc::new(builder.build()),
            Arc::new(StatsRecorder::new(1)),
            ClassifierOptions::default(),
        )
    }

    fn tcp_frame(src: Ipv4Addr, dst_port: u16) -> Vec<u8> {
        let mut payload = ipv4::build_header(src, Ipv4Addr::new(192, 0, 2, 1), 6, 20);
        payload.extend(tcp::build_header(40000, dst_port, tcp::flags::SYN));
        FrameBuilder::new(DST, SRC)
            .ethertype(EtherType::Ipv4 as u16)
            .payload(&payload)
            .build()
    }

    #[test]
    fn test_clean_tcp_frame_passes() {
        let d = dispatcher(&[]);
        let frame = tcp_frame(Ipv4Addr::new(198, 51, 100, 7), 443);

        let verdict = d.classify_detailed(0, &frame);
        assert_eq!(verdict.disposition, Disposition::Pass);
        assert_eq!(verdict.outcome, Outcome::Normal);
        assert_eq!(verdict.stage, Stage::TcpParsed);

        let pass = d.stats().snapshot().get(Disposition::Pass);
        assert_eq!(pass.packets, 1);
        assert_eq!(pass.bytes, frame.len() as u64);
    }

    #[test]
    fn test_short_frame_dropped_at_start() {
        let d = dispatcher(&[]);
        let verdict = d.classify_detailed(0, &[0u8; 10]);

        assert_eq!(verdict.disposition, Disposition::Drop);
        assert_eq!(verdict.outcome, Outcome::Truncated);
        assert_eq!(verdict.stage, Stage::Start);
        assert_eq!(d.stats().snapshot().get(Disposition::Drop).bytes, 10);
    }

    #[test]
    fn test_prefix_hit_stops_after_ethernet() {
        let d = dispatcher(&[BlacklistKey::Cidr("10.0.0.0/8".parse::<CidrKey>().unwrap())]);
        let verdict = d.classify_detailed(0, &tcp_frame(Ipv4Addr::new(10, 1, 2, 3), 443));

        assert_eq!(verdict.disposition, Disposition::Drop);
        assert_eq!(verdict.outcome, Outcome::BlacklistHit(HitKind::Cidr));
        assert_eq!(verdict.stage, Stage::EthParsed);
    }

    #[test]
    fn test_port_hit_stops_after_network() {
        let d = dispatcher(&[BlacklistKey::Port(
            Transport::Tcp,
            PortKey::new(PortDirection::Dest, 22),
        )]);
        let verdict = d.classify_detailed(0, &tcp_frame(Ipv4Addr::new(198, 51, 100, 7), 22));

        assert_eq!(verdict.outcome, Outcome::BlacklistHit(HitKind::Port));
        assert_eq!(verdict.stage, Stage::Ipv4Parsed);
    }

    #[test]
    fn test_tcp_port_entry_does_not_match_udp() {
        let d = dispatcher(&[BlacklistKey::Port(
            Transport::Tcp,
            PortKey::new(PortDirection::Dest, 53),
        )]);
        let mut payload = ipv6::build_header(
            "2001:db8::1".parse().unwrap(),
            "2001:db8::2".parse().unwrap(),
            IpProtocol::Udp as u8,
            8,
        );
        payload.extend(udp::build_header(5000, 53, 0));
        let frame = FrameBuilder::new(DST, SRC)
            .ethertype(EtherType::Ipv6 as u16)
            .payload(&payload)
            .build();

        let verdict = d.classify_detailed(0, &frame);
        assert_eq!(verdict.disposition, Disposition::Pass);
        assert_eq!(verdict.stage, Stage::UdpParsed);
    }

    #[test]
    fn test_arp_is_unclassified() {
        let d = dispatcher(&[]);
        let frame = FrameBuilder::new(MacAddr::BROADCAST, SRC)
            .ethertype(EtherType::Arp as u16)
            .payload(&[0u8; 28])
            .build();

        let verdict = d.classify_detailed(0, &frame);
        assert_eq!(verdict.disposition, Disposition::Pass);
        assert_eq!(verdict.outcome, Outcome::UnhandledProtocol);
        assert_eq!(verdict.stage, Stage::Unclassified);
    }

    #[test]
    fn test_icmp_is_unclassified() {
        let d = dispatcher(&[]);
        let mut payload = ipv4::build_header(
            Ipv4Addr::new(198, 51, 100, 7),
            Ipv4Addr::new(192, 0, 2, 1),
            IpProtocol::Icmp as u8,
            8,
        );
        payload.extend_from_slice(&[8, 0, 0, 0, 0, 1, 0, 1]);
        let frame = FrameBuilder::new(DST, SRC)
            .ethertype(EtherType::Ipv4 as u16)
            .payload(&payload)
            .build();

        assert_eq!(d.classify_detailed(0, &frame).stage, Stage::Unclassified);
    }

    #[test]
    fn test_truncated_transport_dropped() {
        let d = dispatcher(&[]);
        let mut frame = tcp_frame(Ipv4Addr::new(198, 51, 100, 7), 443);
        frame.truncate(14 + 20 + 10);

        let verdict = d.classify_detailed(0, &frame);
        assert_eq!(verdict.outcome, Outcome::Truncated);
        assert_eq!(verdict.stage, Stage::Ipv4Parsed);
    }

    #[test]
    fn test_classify_matches_detailed() {
        let d = dispatcher(&[BlacklistKey::Mac(SRC)]);
        let frame = tcp_frame(Ipv4Addr::new(198, 51, 100, 7), 443);

        assert_eq!(d.classify(0, &frame), Disposition::Drop);
        assert_eq!(d.classify_detailed(0, &frame).disposition, Disposition::Drop);
        assert_eq!(d.stats().snapshot().get(Disposition::Drop).packets, 2);
    }
}
