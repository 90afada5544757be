//! Per-layer classifiers
//!
//! Each layer reads its header through the [`ParseCursor`], queries the
//! blacklist tables for its keys and reports an [`Outcome`]. `Outcome::Normal`
//! means "continue with the next layer"; anything else is terminal.

use super::blacklist::{BlacklistStore, PortDirection, PortKey, Transport};
use super::disposition::Disposition;
use crate::protocol::ethernet::{self, EthernetHeader, VlanHeader};
use crate::protocol::ipv4::{self, Ipv4Header, MIN_IHL};
use crate::protocol::ipv6::{self, Ipv6Header};
use crate::protocol::tcp::{self, TcpHeader};
use crate::protocol::udp::{self, UdpHeader};
use crate::protocol::{EtherType, PacketView, ParseCursor};
use tracing::trace;

/// Number of VLAN tags unwrapped before the network layer. Fixed, not data driven.
pub const MAX_VLAN_DEPTH: usize = 2;

/// Which table produced a hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitKind {
    Mac,
    Cidr,
    Port,
}

/// Result of one layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Header parsed, nothing listed; keep going
    Normal,
    /// Not enough bytes for the header about to be read
    Truncated,
    BlacklistHit(HitKind),
    /// No classifier for this next-protocol value
    UnhandledProtocol,
}

impl Outcome {
    pub fn disposition(self) -> Disposition {
        match self {
            Outcome::Truncated | Outcome::BlacklistHit(_) => Disposition::Drop,
            Outcome::Normal | Outcome::UnhandledProtocol => Disposition::Pass,
        }
    }

    pub fn is_normal(self) -> bool {
        self == Outcome::Normal
    }
}

/// Parse the Ethernet header and up to [`MAX_VLAN_DEPTH`] VLAN tags.
///
/// Leaves the cursor on the network header with `next_protocol` set to the
/// innermost EtherType seen.
pub fn classify_ethernet(
    view: &PacketView<'_>,
    cursor: &mut ParseCursor,
    store: &BlacklistStore,
) -> Outcome {
    let Some(header) = cursor
        .peek(view, ethernet::HEADER_SIZE as u32)
        .and_then(EthernetHeader::parse)
    else {
        trace!(len = view.len(), "frame shorter than ethernet header");
        return Outcome::Truncated;
    };

    let src = header.src_mac();
    if store.contains_mac(&src) {
        trace!(%src, "source MAC blacklisted");
        return Outcome::BlacklistHit(HitKind::Mac);
    }

    // peeked above
    cursor.advance_unchecked(ethernet::HEADER_SIZE as u32);
    cursor.set_next_protocol(header.ethertype());

    for depth in 0..MAX_VLAN_DEPTH {
        if !EtherType::is_vlan_tpid(cursor.next_protocol()) {
            break;
        }
        let Some(tag) = cursor
            .take(view, ethernet::VLAN_TAG_SIZE as u32)
            .and_then(VlanHeader::parse)
        else {
            trace!(depth, offset = cursor.offset(), "truncated VLAN tag");
            return Outcome::Truncated;
        };
        cursor.set_next_protocol(tag.encapsulated_proto());
    }

    Outcome::Normal
}

/// Parse the IPv4 header and check the source against the v4 prefixes.
///
/// With `strict_header_len` the options range implied by IHL must lie inside
/// the frame and IHL must be at least 5; otherwise the cursor moves by
/// `IHL * 4` unvalidated and only the next read is bounds checked.
pub fn classify_ipv4(
    view: &PacketView<'_>,
    cursor: &mut ParseCursor,
    store: &BlacklistStore,
    strict_header_len: bool,
) -> Outcome {
    let Some(header) = cursor
        .peek(view, ipv4::MIN_HEADER_SIZE as u32)
        .and_then(Ipv4Header::parse)
    else {
        trace!(offset = cursor.offset(), "truncated IPv4 header");
        return Outcome::Truncated;
    };

    if store.covers_ipv4(&header.src_octets()) {
        trace!(src = %header.src_addr(), "IPv4 source blacklisted");
        return Outcome::BlacklistHit(HitKind::Cidr);
    }

    if strict_header_len {
        if header.ihl() < MIN_IHL || !cursor.advance_checked(view, header.header_len()) {
            trace!(ihl = header.ihl(), offset = cursor.offset(), "IPv4 IHL outside frame");
            return Outcome::Truncated;
        }
    } else {
        cursor.advance_unchecked(header.header_len());
    }
    cursor.set_next_protocol(header.protocol() as u16);

    Outcome::Normal
}

/// Parse the fixed IPv6 header and check the source against the v6 prefixes.
///
/// Extension headers are not walked: `next_protocol` is the raw next-header
/// value, so a frame carrying one falls through as unhandled.
pub fn classify_ipv6(
    view: &PacketView<'_>,
    cursor: &mut ParseCursor,
    store: &BlacklistStore,
) -> Outcome {
    let Some(header) = cursor
        .peek(view, ipv6::HEADER_SIZE as u32)
        .and_then(Ipv6Header::parse)
    else {
        trace!(offset = cursor.offset(), "truncated IPv6 header");
        return Outcome::Truncated;
    };

    if store.covers_ipv6(&header.src_octets()) {
        trace!(src = %header.src_addr(), "IPv6 source blacklisted");
        return Outcome::BlacklistHit(HitKind::Cidr);
    }

    cursor.advance_unchecked(ipv6::HEADER_SIZE as u32);
    cursor.set_next_protocol(header.next_header() as u16);

    Outcome::Normal
}

/// Parse the TCP or UDP header and check both ports.
pub fn classify_transport(
    view: &PacketView<'_>,
    cursor: &mut ParseCursor,
    store: &BlacklistStore,
    transport: Transport,
) -> Outcome {
    let ports = match transport {
        Transport::Tcp => cursor
            .take(view, tcp::MIN_HEADER_SIZE as u32)
            .and_then(TcpHeader::parse)
            .map(|h| (h.src_port(), h.dst_port())),
        Transport::Udp => cursor
            .take(view, udp::HEADER_SIZE as u32)
            .and_then(UdpHeader::parse)
            .map(|h| (h.src_port(), h.dst_port())),
    };
    let Some((src_port, dst_port)) = ports else {
        trace!(?transport, offset = cursor.offset(), "truncated transport header");
        return Outcome::Truncated;
    };

    let src_key = PortKey::new(PortDirection::Source, src_port);
    let dst_key = PortKey::new(PortDirection::Dest, dst_port);
    if store.contains_port(transport, &src_key) || store.contains_port(transport, &dst_key) {
        trace!(?transport, src_port, dst_port, "port blacklisted");
        return Outcome::BlacklistHit(HitKind::Port);
    }

    Outcome::Normal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataplane::blacklist::{BlacklistKey, BlacklistStoreBuilder, CidrKey};
    use crate::protocol::ethernet::FrameBuilder;
    use crate::protocol::{IpProtocol, MacAddr};
    use std::net::Ipv4Addr;

    const DST: MacAddr = MacAddr([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
    const SRC: MacAddr = MacAddr([0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb]);

    fn store(keys: &[BlacklistKey]) -> BlacklistStore {
        let mut builder = BlacklistStoreBuilder::new();
        for key in keys {
            builder.insert(*key).unwrap();
        }
        builder.build()
    }

    #[test]
    fn test_outcome_dispositions() {
        assert_eq!(Outcome::Truncated.disposition(), Disposition::Drop);
        assert_eq!(Outcome::BlacklistHit(HitKind::Port).disposition(), Disposition::Drop);
        assert_eq!(Outcome::UnhandledProtocol.disposition(), Disposition::Pass);
        assert_eq!(Outcome::Normal.disposition(), Disposition::Pass);
    }

    #[test]
    fn test_ethernet_sets_next_protocol() {
        let frame = FrameBuilder::new(DST, SRC).ethertype(0x0800).build();
        let view = PacketView::new(&frame);
        let mut cursor = ParseCursor::new();

        let outcome = classify_ethernet(&view, &mut cursor, &BlacklistStore::empty());
        assert_eq!(outcome, Outcome::Normal);
        assert_eq!(cursor.offset(), 14);
        assert_eq!(cursor.next_protocol(), 0x0800);
    }

    #[test]
    fn test_ethernet_truncated() {
        let frame = [0u8; 13];
        let view = PacketView::new(&frame);
        let mut cursor = ParseCursor::new();

        let outcome = classify_ethernet(&view, &mut cursor, &BlacklistStore::empty());
        assert_eq!(outcome, Outcome::Truncated);
        assert_eq!(cursor.offset(), 0);
    }

    #[test]
    fn test_ethernet_mac_hit_does_not_advance() {
        let frame = FrameBuilder::new(DST, SRC).ethertype(0x0800).build();
        let view = PacketView::new(&frame);
        let mut cursor = ParseCursor::new();

        let outcome = classify_ethernet(&view, &mut cursor, &store(&[BlacklistKey::Mac(SRC)]));
        assert_eq!(outcome, Outcome::BlacklistHit(HitKind::Mac));
        assert_eq!(cursor.offset(), 0);
    }

    #[test]
    fn test_ethernet_destination_mac_is_not_checked() {
        let frame = FrameBuilder::new(DST, SRC).ethertype(0x0800).build();
        let view = PacketView::new(&frame);
        let mut cursor = ParseCursor::new();

        let outcome = classify_ethernet(&view, &mut cursor, &store(&[BlacklistKey::Mac(DST)]));
        assert_eq!(outcome, Outcome::Normal);
    }

    #[test]
    fn test_ethernet_unwraps_two_tags() {
        let frame = FrameBuilder::new(DST, SRC)
            .vlan(EtherType::QinQ, 10)
            .vlan(EtherType::Vlan, 20)
            .ethertype(0x86DD)
            .build();
        let view = PacketView::new(&frame);
        let mut cursor = ParseCursor::new();

        let outcome = classify_ethernet(&view, &mut cursor, &BlacklistStore::empty());
        assert_eq!(outcome, Outcome::Normal);
        assert_eq!(cursor.offset(), 22);
        assert_eq!(cursor.next_protocol(), 0x86DD);
    }

    #[test]
    fn test_ethernet_stops_after_two_tags() {
        let frame = FrameBuilder::new(DST, SRC)
            .vlan(EtherType::Vlan, 10)
            .vlan(EtherType::Vlan, 20)
            .vlan(EtherType::Vlan, 30)
            .ethertype(0x0800)
            .build();
        let view = PacketView::new(&frame);
        let mut cursor = ParseCursor::new();

        let outcome = classify_ethernet(&view, &mut cursor, &BlacklistStore::empty());
        assert_eq!(outcome, Outcome::Normal);
        assert_eq!(cursor.offset(), 22);
        assert_eq!(cursor.next_protocol(), 0x8100);
    }

    #[test]
    fn test_ethernet_truncated_vlan_tag() {
        let mut frame = FrameBuilder::new(DST, SRC).vlan(EtherType::Vlan, 10).build();
        frame.truncate(16);
        let view = PacketView::new(&frame);
        let mut cursor = ParseCursor::new();

        let outcome = classify_ethernet(&view, &mut cursor, &BlacklistStore::empty());
        assert_eq!(outcome, Outcome::Truncated);
    }

    #[test]
    fn test_ipv4_prefix_hit() {
        let bytes = ipv4::build_header(
            Ipv4Addr::new(10, 1, 2, 3),
            Ipv4Addr::new(192, 168, 0, 1),
            IpProtocol::Tcp as u8,
            0,
        );
        let mut cursor = ParseCursor::new();
        let view = PacketView::new(&bytes);
        let blacklist = store(&[BlacklistKey::Cidr("10.0.0.0/8".parse::<CidrKey>().unwrap())]);

        let outcome = classify_ipv4(&view, &mut cursor, &blacklist, true);
        assert_eq!(outcome, Outcome::BlacklistHit(HitKind::Cidr));
    }

    #[test]
    fn test_ipv4_advances_by_ihl() {
        let mut bytes = ipv4::build_header_with_ihl(
            Ipv4Addr::new(192, 0, 2, 1),
            Ipv4Addr::new(192, 0, 2, 2),
            IpProtocol::Udp as u8,
            0,
            6,
        );
        bytes.extend_from_slice(&[1, 1, 0, 0]); // NOP options
        let view = PacketView::new(&bytes);
        let mut cursor = ParseCursor::new();

        let outcome = classify_ipv4(&view, &mut cursor, &BlacklistStore::empty(), true);
        assert_eq!(outcome, Outcome::Normal);
        assert_eq!(cursor.offset(), 24);
        assert_eq!(cursor.next_protocol(), 17);
    }

    #[test]
    fn test_ipv4_strict_rejects_ihl_past_frame() {
        let bytes = ipv4::build_header_with_ihl(
            Ipv4Addr::new(192, 0, 2, 1),
            Ipv4Addr::new(192, 0, 2, 2),
            IpProtocol::Icmp as u8,
            0,
            15,
        );
        let view = PacketView::new(&bytes);

        let mut strict = ParseCursor::new();
        let outcome = classify_ipv4(&view, &mut strict, &BlacklistStore::empty(), true);
        assert_eq!(outcome, Outcome::Truncated);

        let mut parity = ParseCursor::new();
        let outcome = classify_ipv4(&view, &mut parity, &BlacklistStore::empty(), false);
        assert_eq!(outcome, Outcome::Normal);
        assert_eq!(parity.offset(), 60);
    }

    #[test]
    fn test_ipv4_strict_rejects_short_ihl() {
        let bytes = ipv4::build_header_with_ihl(
            Ipv4Addr::new(192, 0, 2, 1),
            Ipv4Addr::new(192, 0, 2, 2),
            IpProtocol::Tcp as u8,
            0,
            2,
        );
        let view = PacketView::new(&bytes);
        let mut cursor = ParseCursor::new();

        let outcome = classify_ipv4(&view, &mut cursor, &BlacklistStore::empty(), true);
        assert_eq!(outcome, Outcome::Truncated);
    }

    #[test]
    fn test_ipv6_next_header_taken_verbatim() {
        let bytes = ipv6::build_header(
            "2001:db8::1".parse().unwrap(),
            "2001:db8::2".parse().unwrap(),
            IpProtocol::HopByHop as u8,
            0,
        );
        let view = PacketView::new(&bytes);
        let mut cursor = ParseCursor::new();

        let outcome = classify_ipv6(&view, &mut cursor, &BlacklistStore::empty());
        assert_eq!(outcome, Outcome::Normal);
        assert_eq!(cursor.offset(), 40);
        assert_eq!(cursor.next_protocol(), 0);
    }

    #[test]
    fn test_ipv6_truncated() {
        let view = PacketView::new(&[0x60; 39]);
        let mut cursor = ParseCursor::new();
        let outcome = classify_ipv6(&view, &mut cursor, &BlacklistStore::empty());
        assert_eq!(outcome, Outcome::Truncated);
    }

    #[test]
    fn test_transport_checks_both_directions() {
        let blacklist = store(&[
            BlacklistKey::Port(Transport::Udp, PortKey::new(PortDirection::Source, 53)),
            BlacklistKey::Port(Transport::Udp, PortKey::new(PortDirection::Dest, 123)),
        ]);

        for (src, dst, expected) in [
            (53, 4000, Outcome::BlacklistHit(HitKind::Port)),
            (4000, 123, Outcome::BlacklistHit(HitKind::Port)),
            (123, 53, Outcome::Normal),
        ] {
            let bytes = udp::build_header(src, dst, 0);
            let view = PacketView::new(&bytes);
            let mut cursor = ParseCursor::new();
            let outcome = classify_transport(&view, &mut cursor, &blacklist, Transport::Udp);
            assert_eq!(outcome, expected, "src={} dst={}", src, dst);
        }
    }

    #[test]
    fn test_transport_tcp_needs_twenty_bytes() {
        let bytes = udp::build_header(1000, 2000, 0);
        let view = PacketView::new(&bytes);
        let mut cursor = ParseCursor::new();

        let outcome =
            classify_transport(&view, &mut cursor, &BlacklistStore::empty(), Transport::Tcp);
        assert_eq!(outcome, Outcome::Truncated);

        let mut cursor = ParseCursor::new();
        let outcome =
            classify_transport(&view, &mut cursor, &BlacklistStore::empty(), Transport::Udp);
        assert_eq!(outcome, Outcome::Normal);
    }
}
