//! Lazy decoding: only the layers needed to answer a query are decoded.

use burin::layers::ipv4::IPv4;
use burin::{new_layer_class, DecodeOptions, Packet};
use burin::{LAYER_TYPE_ETHERNET, LAYER_TYPE_IPV4, LAYER_TYPE_TCP, LAYER_TYPE_UDP};

fn main() {
    let _ = burin::register_defaults();

    let bytes = hex::decode("00e08100b02800096b88f5c90800450000c1d24940008006c85b0a000005cf2e865e0cc30050a80076877de014025018faf0ad62000048454144202f76342f69756964656e742e6361623f3033303730313132303820485454502f312e310d0a4163636570743a202a2f2a0d0a557365722d4167656e743a20496e6475737472792055706461746520436f6e74726f6c0d0a486f73743a2077696e646f77737570646174652e6d6963726f736f66742e636f6d0d0a436f6e6e656374696f6e3a204b6565702d416c6976650d0a0d0a").unwrap();

    let p = Packet::new(&bytes, LAYER_TYPE_ETHERNET, DecodeOptions::LAZY_NO_COPY);
    println!("created: {:?}", p);

    if let Some(ip) = p.layer(LAYER_TYPE_IPV4) {
        let ipv4 = ip.downcast_ref::<IPv4>().unwrap();
        println!("IPv4 {} -> {}", ipv4.src_addr(), ipv4.dst_addr());
    }
    println!("after IPv4 lookup: {:?}", p);

    let transport = new_layer_class(&[LAYER_TYPE_TCP, LAYER_TYPE_UDP]);
    if let Some(l) = p.layer_class(transport.as_ref()) {
        println!("transport {}: {} header bytes", l.name(), l.contents().len());
    }

    for l in p.layers() {
        println!("{:>10}: {} bytes", l.name(), l.contents().len());
    }
}
