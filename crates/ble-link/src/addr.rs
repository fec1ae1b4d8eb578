use std::fmt;
use std::net::Ipv6Addr;
use std::str::FromStr;

use rand::RngCore;
use thiserror::Error;

/// A 6-byte BLE link-layer address, stored in wire (advertisement) order.
///
/// The text form used by existing peers is six colon-separated uppercase hex
/// octets in *reversed* byte order: the advertised bytes are reversed before
/// formatting, and parsing reverses them back. This quirk must be preserved
/// for interoperability.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BleAddress {
    octets: [u8; 6],
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddrParseError {
    #[error("expected six colon-separated octets, got {0}")]
    OctetCount(usize),
    #[error("invalid hex octet {0:?}")]
    InvalidOctet(String),
}

impl BleAddress {
    pub const fn from_wire(octets: [u8; 6]) -> Self {
        Self { octets }
    }

    /// Builds an address from display-order octets (as printed, e.g. by the
    /// OS Bluetooth stack).
    pub fn from_display(mut octets: [u8; 6]) -> Self {
        octets.reverse();
        Self { octets }
    }

    pub const fn wire_octets(&self) -> [u8; 6] {
        self.octets
    }

    pub fn display_octets(&self) -> [u8; 6] {
        let mut octets = self.octets;
        octets.reverse();
        octets
    }

    /// A random locally-administered unicast address, used when the host
    /// adapter address is not known to the caller.
    pub fn random_local() -> Self {
        let mut octets = [0u8; 6];
        rand::thread_rng().fill_bytes(&mut octets);
        octets[0] = (octets[0] | 0x02) & !0x01;
        Self::from_display(octets)
    }

    /// Derives the link-local IPv6 address for this link-layer address via
    /// modified EUI-64 (fe80::/64, U/L bit flipped).
    pub fn link_local_ipv6(&self) -> Ipv6Addr {
        let m = self.display_octets();
        Ipv6Addr::from([
            0xfe,
            0x80,
            0,
            0,
            0,
            0,
            0,
            0,
            m[0] ^ 0x02,
            m[1],
            m[2],
            0xff,
            0xfe,
            m[3],
            m[4],
            m[5],
        ])
    }
}

impl fmt::Display for BleAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = self.display_octets();
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            d[0], d[1], d[2], d[3], d[4], d[5]
        )
    }
}

impl fmt::Debug for BleAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BleAddress({self})")
    }
}

impl FromStr for BleAddress {
    type Err = AddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 6 {
            return Err(AddrParseError::OctetCount(parts.len()));
        }
        let mut display = [0u8; 6];
        for (slot, part) in display.iter_mut().zip(&parts) {
            if part.len() != 2 {
                return Err(AddrParseError::InvalidOctet(part.to_string()));
            }
            *slot = u8::from_str_radix(part, 16)
                .map_err(|_| AddrParseError::InvalidOctet(part.to_string()))?;
        }
        Ok(Self::from_display(display))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_form_reverses_wire_order() {
        let addr: BleAddress = "AA:BB:CC:DD:EE:FF".parse().unwrap();
        assert_eq!(addr.wire_octets(), [0xff, 0xee, 0xdd, 0xcc, 0xbb, 0xaa]);
        assert_eq!(addr.to_string(), "AA:BB:CC:DD:EE:FF");
    }

    #[test]
    fn lowercase_parses_and_formats_uppercase() {
        let addr: BleAddress = "aa:0b:cc:dd:ee:ff".parse().unwrap();
        assert_eq!(addr.to_string(), "AA:0B:CC:DD:EE:FF");
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert_eq!(
            "AA:BB:CC:DD:EE".parse::<BleAddress>(),
            Err(AddrParseError::OctetCount(5))
        );
        assert!(matches!(
            "AA:BB:CC:DD:EE:GG".parse::<BleAddress>(),
            Err(AddrParseError::InvalidOctet(_))
        ));
        assert!(matches!(
            "AA:BB:CC:DD:EE:F".parse::<BleAddress>(),
            Err(AddrParseError::InvalidOctet(_))
        ));
    }

    #[test]
    fn link_local_derivation() {
        let addr: BleAddress = "AA:BB:CC:DD:EE:FF".parse().unwrap();
        assert_eq!(
            addr.link_local_ipv6(),
            "fe80::a8bb:ccff:fedd:eeff".parse::<Ipv6Addr>().unwrap()
        );
    }

    #[test]
    fn random_local_is_locally_administered_unicast() {
        for _ in 0..16 {
            let addr = BleAddress::random_local();
            let first = addr.display_octets()[0];
            assert_eq!(first & 0x02, 0x02);
            assert_eq!(first & 0x01, 0x00);
        }
    }
}
