//! Additive mod-256 checksums.

use crate::UnitAddress;

/// Type tag plus every payload byte.
#[inline]
pub fn message_sum(tag: u8, payload: &[u8]) -> u8 {
    payload.iter().fold(tag, |acc, b| acc.wrapping_add(*b))
}

/// Checksum byte of a packet. `address` is [`UnitAddress::BROADCAST`] for board-originated
/// packets.
#[inline]
pub fn packet(address: UnitAddress, byte_count: u8, tag: u8, payload: &[u8]) -> u8 {
    address.get().wrapping_add(byte_count).wrapping_add(message_sum(tag, payload))
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn wraps() {
        assert_eq!(message_sum(3, &[0xff, 0x02]), 4);
        assert_eq!(packet(UnitAddress(1), 3, 3, &[0xff, 0x02]), 8);
    }

    proptest! {
        #[test]
        fn matches_wide_sum(address in any::<u8>(), tag in any::<u8>(), payload in proptest::collection::vec(any::<u8>(), 0..64)) {
            let count = (payload.len() + 1) as u8;
            let wide = address as usize + count as usize + tag as usize + payload.iter().map(|&b| b as usize).sum::<usize>();

            prop_assert_eq!(packet(UnitAddress(address), count, tag, &payload) as usize, wide % 256);
        }
    }
}
