//! All types that we are supporting

use core::fmt;

mod macaddr;
pub use macaddr::*;

mod ethertype;
pub use ethertype::*;

mod ipaddr;
pub use ipaddr::*;

pub mod hex;

/// Link layer type of captured frames.
///
/// The values are the same as those used by [libpcap][libpcap] for its `DLT_*` / `LINKTYPE_*`
/// constants. A link type selects the decoder for the first layer of a frame, see
/// [`register_link_type`][`crate::packet::register_link_type`].
///
/// [libpcap]: https://www.tcpdump.org/linktypes.html
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct LinkType(pub u16);

impl fmt::Debug for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LinkType({})", self.0)
    }
}

pub const LINK_TYPE_ETHERNET: LinkType = LinkType(1);
pub const LINK_TYPE_PPP: LinkType = LinkType(9);
