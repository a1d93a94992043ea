// Target expansion: bare IPv4 addresses and CIDR ranges

use std::fmt;
use std::net::Ipv4Addr;

use crate::error::{AppError, AppResult};

/// A masked IPv4 range, network address through broadcast inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Range {
    network: Ipv4Addr,
    prefix_len: u8,
}

impl Ipv4Range {
    pub fn new(address: Ipv4Addr, prefix_len: u8) -> AppResult<Self> {
        if prefix_len > 32 {
            return Err(AppError::InvalidRange(format!("{}/{}", address, prefix_len)));
        }
        let network = Ipv4Addr::from(u32::from(address) & mask(prefix_len));
        Ok(Ipv4Range {
            network,
            prefix_len,
        })
    }

    #[allow(dead_code)] // Used in tests
    pub fn network(&self) -> Ipv4Addr {
        self.network
    }

    #[allow(dead_code)] // Used in tests
    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    pub fn broadcast(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.network) | !mask(self.prefix_len))
    }

    /// Number of addresses covered, including network and broadcast
    pub fn len(&self) -> u64 {
        1u64 << (32 - self.prefix_len)
    }

    /// Every address in ascending order
    pub fn iter(&self) -> impl Iterator<Item = Ipv4Addr> + use<> {
        (u32::from(self.network)..=u32::from(self.broadcast())).map(Ipv4Addr::from)
    }
}

impl fmt::Display for Ipv4Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_len)
    }
}

/// Parse `a.b.c.d` or `a.b.c.d/len`; a bare address becomes a /32
pub fn parse_target(target: &str) -> AppResult<Ipv4Range> {
    let invalid = || AppError::InvalidRange(target.to_string());

    let (addr, prefix_len) = match target.split_once('/') {
        Some((addr, len)) => {
            // u8::from_str accepts a leading '+' and zero padding
            if len.is_empty()
                || !len.bytes().all(|b| b.is_ascii_digit())
                || (len.len() > 1 && len.starts_with('0'))
            {
                return Err(invalid());
            }
            (addr, len.parse::<u8>().map_err(|_| invalid())?)
        }
        None => (target, 32),
    };

    let address: Ipv4Addr = addr.parse().map_err(|_| invalid())?;
    Ipv4Range::new(address, prefix_len).map_err(|_| invalid())
}

fn mask(prefix_len: u8) -> u32 {
    if prefix_len == 0 {
        0
    } else {
        u32::MAX << (32 - prefix_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slash_24_expands_to_256() {
        let range = parse_target("10.0.0.0/24").unwrap();
        let ips: Vec<_> = range.iter().collect();
        assert_eq!(range.len(), 256);
        assert_eq!(ips.len(), 256);
        assert_eq!(ips[0], Ipv4Addr::new(10, 0, 0, 0));
        assert_eq!(ips[255], Ipv4Addr::new(10, 0, 0, 255));
        assert!(ips.windows(2).all(|w| u32::from(w[0]) < u32::from(w[1])));
    }

    #[test]
    fn test_bare_address_is_single_host() {
        let range = parse_target("192.168.1.1").unwrap();
        assert_eq!(range.prefix_len(), 32);
        assert_eq!(range.to_string(), "192.168.1.1/32");
        assert_eq!(range.iter().collect::<Vec<_>>(), vec![Ipv4Addr::new(192, 168, 1, 1)]);
    }

    #[test]
    fn test_host_bits_are_masked() {
        let range = parse_target("10.0.0.5/30").unwrap();
        assert_eq!(range.network(), Ipv4Addr::new(10, 0, 0, 4));
        assert_eq!(range.broadcast(), Ipv4Addr::new(10, 0, 0, 7));
        assert_eq!(
            range.iter().collect::<Vec<_>>(),
            vec![
                Ipv4Addr::new(10, 0, 0, 4),
                Ipv4Addr::new(10, 0, 0, 5),
                Ipv4Addr::new(10, 0, 0, 6),
                Ipv4Addr::new(10, 0, 0, 7),
            ]
        );
    }

    #[test]
    fn test_range_sizes() {
        for prefix_len in [16u8, 24, 28, 31, 32] {
            let range = parse_target(&format!("172.16.0.0/{}", prefix_len)).unwrap();
            assert_eq!(range.len(), 1u64 << (32 - prefix_len));
            assert_eq!(range.iter().count() as u64, range.len());
        }
    }

    #[test]
    fn test_zero_prefix_is_accepted() {
        assert_eq!(parse_target("10.1.2.3/0").unwrap().to_string(), "0.0.0.0/0");
    }

    #[test]
    fn test_whole_space() {
        let range = parse_target("0.0.0.0/0").unwrap();
        assert_eq!(range.len(), 1u64 << 32);
        assert_eq!(range.broadcast(), Ipv4Addr::BROADCAST);
        assert_eq!(range.iter().next(), Some(Ipv4Addr::UNSPECIFIED));
    }

    #[test]
    fn test_top_of_address_space() {
        let range = parse_target("255.255.255.254/31").unwrap();
        let ips: Vec<_> = range.iter().collect();
        assert_eq!(ips, vec![Ipv4Addr::new(255, 255, 255, 254), Ipv4Addr::BROADCAST]);
    }

    #[test]
    fn test_invalid_targets() {
        for target in [
            "",
            "not-an-ip",
            "10.0.0.256",
            "10.0.0.0/33",
            "10.0.0.0/",
            "10.0.0.0/+8",
            "10.0.0.0/a",
            "10.0.0.0/024",
            "10.0.0.0/00",
            " 10.0.0.1 ",
            "10.0.0.1 ",
            "10.0.0/24",
            "::1",
            "fe80::/64",
        ] {
            let err = parse_target(target).unwrap_err();
            assert!(
                matches!(err, AppError::InvalidRange(ref t) if t == target),
                "{} should be rejected",
                target
            );
        }
    }
}
