/*
Copyright 2024 San Francisco Compute Company

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

//! Network address helpers

use crate::domain::{AddressAssignment, InterfaceAddress};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Build the netmask for a prefix length in the address family of `address`
///
/// Prefixes longer than the family allows are clamped.
pub fn netmask_from_prefix(address: &IpAddr, prefix: u8) -> IpAddr {
    match address {
        IpAddr::V4(_) => {
            let prefix = u32::from(prefix.min(32));
            let bits = u32::MAX.checked_shl(32 - prefix).unwrap_or(0);
            IpAddr::V4(Ipv4Addr::from(bits))
        }
        IpAddr::V6(_) => {
            let prefix = u32::from(prefix.min(128));
            let bits = u128::MAX.checked_shl(128 - prefix).unwrap_or(0);
            IpAddr::V6(Ipv6Addr::from(bits))
        }
    }
}

fn is_ipv6_link_local(address: &Ipv6Addr) -> bool {
    (address.segments()[0] & 0xffc0) == 0xfe80
}

/// Pick the address to report for an interface
///
/// IPv4 wins over IPv6, and a routable IPv6 address wins over a
/// link-local one. Loopback addresses are used only when nothing else
/// is assigned.
pub fn preferred_address(addresses: &[InterfaceAddress]) -> Option<&InterfaceAddress> {
    let usable = || addresses.iter().filter(|a| !a.address.is_loopback());

    usable()
        .find(|a| a.address.is_ipv4())
        .or_else(|| {
            usable().find(|a| match a.address {
                IpAddr::V6(v6) => !is_ipv6_link_local(&v6),
                IpAddr::V4(_) => false,
            })
        })
        .or_else(|| usable().next())
        .or_else(|| addresses.first())
}

/// Pair an address with its rendered netmask
pub fn to_assignment(address: &InterfaceAddress) -> AddressAssignment {
    AddressAssignment {
        address: address.address,
        prefix: address.prefix,
        netmask: netmask_from_prefix(&address.address, address.prefix),
    }
}
