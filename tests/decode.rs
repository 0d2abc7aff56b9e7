//! Decoding whole frames through the public API.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use burin::flows::ENDPOINT_UDP_PORT;
use burin::layers::ethernet::dot1q::Dot1Q;
use burin::layers::ethernet::Ethernet;
use burin::layers::ipv4::IPv4;
use burin::layers::payload::Payload;
use burin::layers::tcp::{TcpOption, TCP};
use burin::layers::udp;
use burin::*;

const SIMPLE_TCP_PACKET: &str = concat!(
    "00000c9ff020bc305be8d3490800450001a439df40004006555aac115149addefee1c5f70050c57e0e48",
    "4907423280180073abb100000101080a0377379c42775e3a",
    "474554202f20485454502f312e310d0a486f73743a207777772e666973682e636f6d0d0a436f6e6e6563",
    "74696f6e3a206b6565702d616c6976650d0a557365722d4167656e743a204d6f7a696c6c612f352e3020",
    "285831313b204c696e7578207838365f363429204170706c655765624b69742f3533352e3220284b4854",
    "4d4c2c206c696b65204765636b6f29204368726f6d652f31352e302e3837342e313231205361666172",
    "692f3533352e320d0a4163636570743a20746578742f68746d6c2c6170706c69636174696f6e2f7868",
    "746d6c2b786d6c2c6170706c69636174696f6e2f786d6c3b713d302e392c2a2f2a3b713d302e380d0a",
    "4163636570742d456e636f64696e673a20677a69702c6465666c6174652c736463680d0a4163636570",
    "742d4c616e67756167653a20656e2d55532c656e3b713d302e380d0a4163636570742d436861727365",
    "743a2049534f2d383835392d312c7574662d383b713d302e372c2a3b713d302e330d0a0d0a"
);

const HTTP_GET: &str = concat!(
    "GET / HTTP/1.1\r\n",
    "Host: www.fish.com\r\n",
    "Connection: keep-alive\r\n",
    "User-Agent: Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/535.2 (KHTML, like Gecko) ",
    "Chrome/15.0.874.121 Safari/535.2\r\n",
    "Accept: text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8\r\n",
    "Accept-Encoding: gzip,deflate,sdch\r\n",
    "Accept-Language: en-US,en;q=0.8\r\n",
    "Accept-Charset: ISO-8859-1,utf-8;q=0.7,*;q=0.3\r\n",
    "\r\n"
);

// Ethernet trailer padding follows the 40 bytes announced by IPv4.
const SMALL_TCP_PACKET: &str = concat!(
    "bc305be8d349b8ac6f92d5bf0800450000280000400040063f9fac1151c5ac115149",
    "00639aef000000002ec1278350140000c3080000000000000000"
);

const VLAN_PACKET: &str = concat!(
    "0010dbff100000152c9dcc00810001f7080045000028298d40007d0683a0ac1bca8e451694e2",
    "d40a0050dfab9cc6cd1ee5d1501001005a740000000000000000"
);

const FUZZ_SEED: u64 = 0x6275_7269_6e;

const ALL_OPTIONS: [DecodeOptions; 4] = [
    DecodeOptions::DEFAULT,
    DecodeOptions::LAZY,
    DecodeOptions::NO_COPY,
    DecodeOptions::LAZY_NO_COPY,
];

fn setup() {
    let _ = burin::register_defaults();
}

fn layer_types(packet: &Packet) -> Vec<LayerType> {
    packet.layers().iter().map(|l| l.layer_type()).collect()
}

#[test]
fn simple_tcp_packet() {
    setup();

    let bytes = hex::decode(SIMPLE_TCP_PACKET).unwrap();
    assert_eq!(bytes.len(), 434);

    for options in ALL_OPTIONS {
        let p = Packet::new(&bytes, LAYER_TYPE_ETHERNET, options);

        let eth = p.layer(LAYER_TYPE_ETHERNET).unwrap();
        let ethernet = eth.downcast_ref::<Ethernet>().unwrap();
        assert_eq!(ethernet.src_mac().to_string(), "bc:30:5b:e8:d3:49");
        assert_eq!(ethernet.dst_mac().to_string(), "00:00:0c:9f:f0:20");
        assert_eq!(ethernet.ethertype().0, 0x0800);
        assert_eq!(eth.contents(), &bytes[..14]);

        let ip = p.layer(LAYER_TYPE_IPV4).unwrap();
        let ipv4 = ip.downcast_ref::<IPv4>().unwrap();
        assert_eq!(ipv4.version(), 4);
        assert_eq!(ipv4.hdr_len(), 5);
        assert_eq!(ipv4.total_length(), 420);
        assert_eq!(ipv4.id(), 14815);
        assert_eq!(ipv4.flags(), 0x02);
        assert_eq!(ipv4.frag_offset(), 0);
        assert_eq!(ipv4.ttl(), 64);
        assert_eq!(ipv4.protocol(), 6);
        assert_eq!(ipv4.checksum(), 0x555a);
        assert_eq!(ipv4.src_addr().to_string(), "172.17.81.73");
        assert_eq!(ipv4.dst_addr().to_string(), "173.222.254.225");

        let tcp = p.layer(LAYER_TYPE_TCP).unwrap();
        let segment = tcp.downcast_ref::<TCP>().unwrap();
        assert_eq!(segment.src_port(), 50679);
        assert_eq!(segment.dst_port(), 80);
        assert_eq!(segment.seq_no(), 0xc57e0e48);
        assert_eq!(segment.ack_no(), 0x49074232);
        assert_eq!(segment.data_offset(), 8);
        assert_eq!(segment.flags(), 0x18);
        assert_eq!(segment.window_size(), 0x73);
        assert_eq!(segment.checksum(), 0xabb1);
        assert_eq!(
            segment.options(),
            &[
                TcpOption::NOP,
                TcpOption::NOP,
                TcpOption::Timestamp {
                    value: 0x0377379c,
                    echo: 0x42775e3a
                }
            ]
        );
        assert_eq!(tcp.contents().len(), 32);

        let app = p.application_layer().unwrap();
        assert_eq!(app.layer_type(), LAYER_TYPE_PAYLOAD);
        assert_eq!(app.application_data(), Some(HTTP_GET.as_bytes()));
        assert_eq!(app.downcast_ref::<Payload>().unwrap().len(), HTTP_GET.len());

        assert!(p.error_layer().is_none());
        assert!(!p.is_truncated());
        assert_eq!(
            layer_types(&p),
            [
                LAYER_TYPE_ETHERNET,
                LAYER_TYPE_IPV4,
                LAYER_TYPE_TCP,
                LAYER_TYPE_PAYLOAD
            ]
        );
    }
}

#[test]
fn capability_slots() {
    setup();

    let bytes = hex::decode(SIMPLE_TCP_PACKET).unwrap();
    let p = Packet::new(&bytes, LAYER_TYPE_ETHERNET, DecodeOptions::LAZY_NO_COPY);

    let link = p.link_layer().unwrap();
    assert_eq!(
        link.as_link().unwrap().link_flow().to_string(),
        "bc:30:5b:e8:d3:49->00:00:0c:9f:f0:20"
    );

    let network = p.network_layer().unwrap();
    assert_eq!(
        network.as_network().unwrap().network_flow().to_string(),
        "172.17.81.73->173.222.254.225"
    );

    let transport = p.transport_layer().unwrap();
    let flow = transport.as_transport().unwrap().transport_flow();
    assert_eq!(flow.to_string(), "50679->80");
    assert_eq!(flow.reverse().to_string(), "80->50679");
    assert_eq!(flow.fast_hash(), flow.reverse().fast_hash());
}

#[test]
fn small_tcp_packet_has_no_payload() {
    setup();

    let bytes = hex::decode(SMALL_TCP_PACKET).unwrap();
    assert_eq!(bytes.len(), 60);

    for options in ALL_OPTIONS {
        let p = Packet::new(&bytes, LAYER_TYPE_ETHERNET, options);

        assert_eq!(
            layer_types(&p),
            [LAYER_TYPE_ETHERNET, LAYER_TYPE_IPV4, LAYER_TYPE_TCP]
        );
        assert!(p.layer(LAYER_TYPE_PAYLOAD).is_none());
        assert!(p.application_layer().is_none());
        assert!(p.error_layer().is_none());

        // The trailer is dropped along with the IPv4 payload bound.
        let tcp = p.layer(LAYER_TYPE_TCP).unwrap();
        assert!(tcp.payload().is_empty());
        assert_eq!(p.layer(LAYER_TYPE_IPV4).unwrap().payload().len(), 20);
    }
}

#[test]
fn vlan_packet() {
    setup();

    let bytes = hex::decode(VLAN_PACKET).unwrap();
    assert_eq!(bytes.len(), 64);

    let p = Packet::new(&bytes, LAYER_TYPE_ETHERNET, DecodeOptions::DEFAULT);
    assert_eq!(
        layer_types(&p),
        [
            LAYER_TYPE_ETHERNET,
            LAYER_TYPE_DOT1Q,
            LAYER_TYPE_IPV4,
            LAYER_TYPE_TCP
        ]
    );
    assert!(p.error_layer().is_none());

    let dot1q = p.layer(LAYER_TYPE_DOT1Q).unwrap();
    let vlan = dot1q.downcast_ref::<Dot1Q>().unwrap();
    assert_eq!(vlan.vlan_id(), 0x1f7);
    assert_eq!(vlan.priority(), 0);
    assert_eq!(vlan.ethertype().0, 0x0800);
}

#[test]
fn link_type_selects_first_decoder() {
    setup();

    let bytes = hex::decode(VLAN_PACKET).unwrap();
    let p = Packet::from_link_type(&bytes, types::LINK_TYPE_ETHERNET, DecodeOptions::LAZY);
    assert_eq!(p.layers()[0].layer_type(), LAYER_TYPE_ETHERNET);

    let p = Packet::from_link_type(&bytes, LinkType(0xfff0), DecodeOptions::LAZY);
    assert_eq!(layer_types(&p), [LAYER_TYPE_PAYLOAD]);
    assert_eq!(p.layers()[0].contents(), &bytes[..]);
}

#[test]
fn flows_and_endpoints_as_keys() {
    let a = Endpoint::udp_port(53);
    let b = Endpoint::new(ENDPOINT_UDP_PORT, &[0, 53]).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, Endpoint::tcp_port(53));

    let mut endpoints = HashMap::new();
    endpoints.insert(a, "dns");
    assert_eq!(endpoints.get(&b), Some(&"dns"));

    let f1 = Flow::from_endpoints(Endpoint::udp_port(1234), Endpoint::udp_port(53)).unwrap();
    let f2 = Flow::new(ENDPOINT_UDP_PORT, &[0x04, 0xd2], &[0, 53]).unwrap();
    assert_eq!(f1, f2);
    assert_ne!(f1, f1.reverse());
    assert_eq!(f1.fast_hash(), f1.reverse().fast_hash());

    let flows: HashSet<Flow> = [f1, f2, f1.reverse()].into_iter().collect();
    assert_eq!(flows.len(), 2);

    let mut pairs: HashMap<[Flow; 2], usize> = HashMap::new();
    *pairs.entry([f1, f1.reverse()]).or_default() += 1;
    *pairs.entry([f2, f2.reverse()]).or_default() += 1;
    assert_eq!(pairs.get(&[f1, f1.reverse()]), Some(&2));

    assert!(Flow::from_endpoints(Endpoint::udp_port(53), Endpoint::tcp_port(53)).is_err());
}

#[test]
fn options_agree() {
    setup();

    for frame in [SIMPLE_TCP_PACKET, SMALL_TCP_PACKET, VLAN_PACKET] {
        let bytes = hex::decode(frame).unwrap();
        let reference = Packet::new(&bytes, LAYER_TYPE_ETHERNET, DecodeOptions::DEFAULT);
        let expected = serde_json::to_value(&reference).unwrap();

        for options in ALL_OPTIONS {
            let p = Packet::new(&bytes, LAYER_TYPE_ETHERNET, options);
            assert_eq!(layer_types(&p), layer_types(&reference), "{:?}", options);
            assert_eq!(serde_json::to_value(&p).unwrap(), expected, "{:?}", options);
        }
    }
}

#[test]
fn no_copy_borrows_the_buffer() {
    setup();

    let bytes = hex::decode(SIMPLE_TCP_PACKET).unwrap();

    let borrowed = Packet::new(&bytes, LAYER_TYPE_ETHERNET, DecodeOptions::NO_COPY);
    assert_eq!(borrowed.data().as_ptr(), bytes.as_ptr());
    let tcp = borrowed.layer(LAYER_TYPE_TCP).unwrap();
    assert_eq!(tcp.contents().as_ptr(), bytes[34..].as_ptr());

    let copied = Packet::new(&bytes, LAYER_TYPE_ETHERNET, DecodeOptions::DEFAULT);
    assert_ne!(copied.data().as_ptr(), bytes.as_ptr());
    assert_eq!(copied.data(), &bytes[..]);

    let owned = Packet::from_vec(bytes.clone(), LAYER_TYPE_ETHERNET, DecodeOptions::LAZY);
    assert_eq!(layer_types(&owned), layer_types(&copied));
}

#[test]
fn layer_class_queries() {
    setup();

    let bytes = hex::decode(SIMPLE_TCP_PACKET).unwrap();
    let p = Packet::new(&bytes, LAYER_TYPE_ETHERNET, DecodeOptions::LAZY);

    let transport = new_layer_class(&[LAYER_TYPE_TCP, LAYER_TYPE_UDP]);
    assert_eq!(
        p.layer_class(transport.as_ref()).map(|l| l.layer_type()),
        Some(LAYER_TYPE_TCP)
    );

    let network = LayerClassMap::new(&[LAYER_TYPE_IPV6, LAYER_TYPE_IPV4]);
    assert_eq!(
        p.layer_class(&network).map(|l| l.layer_type()),
        Some(LAYER_TYPE_IPV4)
    );

    let absent = LayerClassSlice::new(&[LAYER_TYPE_ARP, LAYER_TYPE_MPLS]);
    assert!(p.layer_class(&absent).is_none());
    assert!(p.layer_class(&LAYER_TYPE_ETHERNET).is_some());
}

#[derive(Debug, Serialize)]
struct Counted {
    length: usize,
}

static COUNTED_DECODES: AtomicUsize = AtomicUsize::new(0);
static COUNTED: OnceLock<LayerType> = OnceLock::new();

const COUNTED_PORT: u16 = 7777;

fn counted() -> LayerType {
    *COUNTED.get_or_init(|| {
        let t = register_layer_type("Counted", decode_counted).unwrap();
        udp::register_app(COUNTED_PORT, t).unwrap();
        t
    })
}

fn decode_counted(bytes: &[u8]) -> Result<Decoded, Error> {
    COUNTED_DECODES.fetch_add(1, Ordering::SeqCst);
    Ok(Decoded::new(Counted { length: bytes.len() }, bytes.len(), bytes.len()).next(NextLayer::Done))
}

impl Layer for Counted {
    fn layer_type(&self) -> LayerType {
        counted()
    }

    fn short_name(&self) -> &'static str {
        "counted"
    }
}

#[test]
fn lazy_decodes_on_demand() {
    setup();
    let counted = counted();

    // Ethernet, IPv4, UDP to port 7777 with four bytes of data.
    let bytes = hex::decode(concat!(
        "00e08100b02800096b8850ef0800",
        "450000200001000040110000c0a80001c0a80002",
        "04d21e61000c0000",
        "61626364"
    ))
    .unwrap();

    let before = COUNTED_DECODES.load(Ordering::SeqCst);
    let p = Packet::new(&bytes, LAYER_TYPE_ETHERNET, DecodeOptions::LAZY);
    assert_eq!(COUNTED_DECODES.load(Ordering::SeqCst), before);

    assert!(p.layer(LAYER_TYPE_IPV4).is_some());
    assert!(p.layer(LAYER_TYPE_UDP).is_some());
    assert_eq!(COUNTED_DECODES.load(Ordering::SeqCst), before);

    let app = p.layer(counted).unwrap();
    assert_eq!(app.contents(), b"abcd");
    assert_eq!(app.downcast_ref::<Counted>().unwrap().length, 4);
    assert_eq!(COUNTED_DECODES.load(Ordering::SeqCst), before + 1);

    assert_eq!(
        layer_types(&p),
        [LAYER_TYPE_ETHERNET, LAYER_TYPE_IPV4, LAYER_TYPE_UDP, counted]
    );
    assert_eq!(COUNTED_DECODES.load(Ordering::SeqCst), before + 1);

    let eager = Packet::new(&bytes, LAYER_TYPE_ETHERNET, DecodeOptions::DEFAULT);
    assert_eq!(COUNTED_DECODES.load(Ordering::SeqCst), before + 2);
    assert_eq!(
        serde_json::to_value(&eager).unwrap()["counted"]["length"],
        4
    );
}

#[test]
fn lazy_packet_shared_between_threads() {
    setup();

    let bytes = hex::decode(SIMPLE_TCP_PACKET).unwrap();
    let p = Packet::new(&bytes, LAYER_TYPE_ETHERNET, DecodeOptions::LAZY_NO_COPY);
    let wanted = [
        LAYER_TYPE_PAYLOAD,
        LAYER_TYPE_TCP,
        LAYER_TYPE_IPV4,
        LAYER_TYPE_ETHERNET,
    ];

    std::thread::scope(|s| {
        for t in wanted {
            let p = &p;
            s.spawn(move || {
                for _ in 0..100 {
                    assert_eq!(p.layer(t).map(|l| l.layer_type()), Some(t));
                }
                assert_eq!(p.layers().len(), 4);
            });
        }
    });

    assert_eq!(
        layer_types(&p),
        [
            LAYER_TYPE_ETHERNET,
            LAYER_TYPE_IPV4,
            LAYER_TYPE_TCP,
            LAYER_TYPE_PAYLOAD
        ]
    );
}

#[test]
fn serialize_packet() {
    setup();

    let bytes = hex::decode(VLAN_PACKET).unwrap();
    let p = Packet::new(&bytes, LAYER_TYPE_ETHERNET, DecodeOptions::LAZY);
    let value = serde_json::to_value(&p).unwrap();

    let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
    for key in ["eth", "dot1q", "ip", "tcp"] {
        assert!(keys.iter().any(|k| k == key), "{} missing in {:?}", key, keys);
    }
    assert_eq!(value["tcp"]["dst_port"], 80);
}

#[test]
fn serialize_stacked_vlan_tags() {
    setup();

    // Q-in-Q: an 802.1ad service tag (vlan 100) around the customer tag (vlan 0x1f7).
    let bytes = hex::decode(VLAN_PACKET.replacen("8100", "88a800648100", 1)).unwrap();
    let p = Packet::new(&bytes, LAYER_TYPE_ETHERNET, DecodeOptions::DEFAULT);
    assert_eq!(
        layer_types(&p),
        [
            LAYER_TYPE_ETHERNET,
            LAYER_TYPE_DOT1Q,
            LAYER_TYPE_DOT1Q,
            LAYER_TYPE_IPV4,
            LAYER_TYPE_TCP
        ]
    );

    let value = serde_json::to_value(&p).unwrap();
    let object = value.as_object().unwrap();
    assert_eq!(object.len(), 5, "{:?}", object.keys().collect::<Vec<_>>());
    assert_eq!(value["dot1q"]["vlan_id"], 100);
    assert_eq!(value["dot1q.1"]["vlan_id"], 0x1f7);
    assert_eq!(value["tcp"]["dst_port"], 80);

    let json = serde_json::to_string(&p).unwrap();
    assert!(json.find("\"dot1q\"").unwrap() < json.find("\"dot1q.1\"").unwrap());
}

#[test]
fn unknown_ip_protocol_keeps_network_layer() {
    setup();

    // IGMP membership query, IP protocol 2.
    let bytes = hex::decode(concat!(
        "01005e00000100096b8850ef0800",
        "4500001c0001000001020000c0a80001e0000001",
        "1164ee9b00000000"
    ))
    .unwrap();

    for options in ALL_OPTIONS {
        let p = Packet::new(&bytes, LAYER_TYPE_ETHERNET, options);
        assert_eq!(
            layer_types(&p),
            [
                LAYER_TYPE_ETHERNET,
                LAYER_TYPE_IPV4,
                LAYER_TYPE_DECODE_FAILURE
            ]
        );

        let network = p.network_layer().unwrap();
        assert_eq!(
            network.as_network().unwrap().network_flow().to_string(),
            "192.168.0.1->224.0.0.1"
        );
        assert!(p.transport_layer().is_none());
        assert!(!p.is_truncated());

        let failure = p.error_layer().unwrap();
        assert_eq!(failure.contents(), &bytes[34..]);
        assert_eq!(failure.contents(), network.payload());
        assert_eq!(
            failure.error(),
            Some(&Error::UnsupportedNextLayer {
                layer: LAYER_TYPE_IPV4,
                value: 2
            })
        );
    }
}

#[test]
fn unknown_ethertype_keeps_link_layer() {
    setup();

    // LLDP, EtherType 0x88cc, chassis id TLV then end of LLDPDU.
    let bytes = hex::decode(concat!(
        "0180c200000e00096b8850ef88cc",
        "020704000c29aabbcc0000"
    ))
    .unwrap();

    let p = Packet::new(&bytes, LAYER_TYPE_ETHERNET, DecodeOptions::LAZY);
    assert_eq!(
        layer_types(&p),
        [LAYER_TYPE_ETHERNET, LAYER_TYPE_DECODE_FAILURE]
    );

    let link = p.link_layer().unwrap();
    assert_eq!(
        link.as_link().unwrap().link_flow().to_string(),
        "00:09:6b:88:50:ef->01:80:c2:00:00:0e"
    );

    let failure = p.error_layer().unwrap();
    assert_eq!(failure.contents(), &bytes[14..]);
    assert_eq!(
        failure.error(),
        Some(&Error::UnsupportedNextLayer {
            layer: LAYER_TYPE_ETHERNET,
            value: 0x88cc
        })
    );
}

#[test]
fn unknown_next_header_keeps_ipv6() {
    setup();

    // ICMPv6 router solicitation, next header 58.
    let bytes = hex::decode(concat!(
        "333300000002000573a007d186dd",
        "6000000000083aff",
        "fe800000000000000000000000000001",
        "ff020000000000000000000000000002",
        "8500000000000000"
    ))
    .unwrap();

    let p = Packet::new(&bytes, LAYER_TYPE_ETHERNET, DecodeOptions::DEFAULT);
    assert_eq!(
        layer_types(&p),
        [
            LAYER_TYPE_ETHERNET,
            LAYER_TYPE_IPV6,
            LAYER_TYPE_DECODE_FAILURE
        ]
    );

    let network = p.network_layer().unwrap();
    assert_eq!(network.layer_type(), LAYER_TYPE_IPV6);
    assert_eq!(
        network.as_network().unwrap().network_flow().to_string(),
        "fe80::1->ff02::2"
    );

    let failure = p.error_layer().unwrap();
    assert_eq!(failure.contents(), &bytes[54..]);
    assert_eq!(
        failure.error(),
        Some(&Error::UnsupportedNextLayer {
            layer: LAYER_TYPE_IPV6,
            value: 58
        })
    );
}

#[test]
fn failure_keeps_earlier_layers() {
    setup();

    let mut bytes = hex::decode(SIMPLE_TCP_PACKET).unwrap();
    bytes.truncate(40);

    let p = Packet::new(&bytes, LAYER_TYPE_ETHERNET, DecodeOptions::LAZY);
    assert_eq!(
        layer_types(&p),
        [
            LAYER_TYPE_ETHERNET,
            LAYER_TYPE_IPV4,
            LAYER_TYPE_DECODE_FAILURE
        ]
    );
    assert!(p.is_truncated());

    let failure = p.error_layer().unwrap();
    assert_eq!(failure.contents(), &bytes[34..]);
    assert!(matches!(
        failure.error(),
        Some(Error::TooShort {
            layer: LAYER_TYPE_TCP,
            ..
        })
    ));
}

// Random bytes of random length in front of every decoder: keep appending bytes until a 1 in
// 100 draw or 256 bytes. BURIN_FUZZ_SEED picks another run than the fixed default.
#[test]
fn random_bytes_never_panic() {
    setup();

    let seed = std::env::var("BURIN_FUZZ_SEED")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(FUZZ_SEED);
    println!("BURIN_FUZZ_SEED={}", seed);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let decoders = [
        LAYER_TYPE_ARP,
        LAYER_TYPE_DOT1Q,
        LAYER_TYPE_ETHERNET,
        LAYER_TYPE_ICMPV4,
        LAYER_TYPE_IPV4,
        LAYER_TYPE_IPV6,
        LAYER_TYPE_PPP,
        LAYER_TYPE_TCP,
        LAYER_TYPE_UDP,
        LAYER_TYPE_MPLS,
        LAYER_TYPE_PPPOE,
    ];

    for first in decoders {
        for _ in 0..1000 {
            let mut bytes = vec![];
            loop {
                bytes.push(rng.gen::<u8>());
                if bytes.len() >= 256 || rng.gen_range(0..100) == 0 {
                    break;
                }
            }

            let p = Packet::new(&bytes, first, DecodeOptions::LAZY_NO_COPY);
            let layers = p.layers();
            assert!(!layers.is_empty(), "{} {}", first, hex::encode(&bytes));
            assert_eq!(layers[0].contents().as_ptr(), bytes.as_ptr());

            match p.error_layer() {
                Some(failure) => {
                    let last = layers.last().unwrap();
                    assert_eq!(last.layer_type(), LAYER_TYPE_DECODE_FAILURE);
                    assert!(failure.error().is_some());
                    assert!(failure.payload().is_empty());
                }
                None => assert!(layers
                    .iter()
                    .all(|l| l.layer_type() != LAYER_TYPE_DECODE_FAILURE)),
            }

            let mut end = 0;
            for l in &layers {
                let start = l.contents().as_ptr() as usize - bytes.as_ptr() as usize;
                assert!(start >= end, "{} {}", first, hex::encode(&bytes));
                end = start + l.contents().len();
                assert!(end <= bytes.len());
            }
        }
    }
}
