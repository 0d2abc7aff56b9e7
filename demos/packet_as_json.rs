//! A simple example demonstrating how to dump a packet as a Json
//!
//! cargo run --example packet_json -- --lazy 000573a007d168a3...

use clap::Parser;

use burin::types::LinkType;
use burin::{DecodeOptions, Packet};

#[derive(Parser, Debug)]
#[command(about = "Decode a hex encoded frame and print it as JSON")]
struct Cli {
    /// Frame bytes as hex.
    #[arg(default_value = "000573a007d168a3c4f949f686dd600000000020064020010470e5bfdead49572174e82c48872607f8b0400c0c03000000000000001af9c7001903a088300000000080022000da4700000204058c0103030801010402")]
    frame: String,

    /// libpcap link type of the frame.
    #[arg(long, default_value_t = 1)]
    link_type: u16,

    /// Decode layers only as they are serialized.
    #[arg(long)]
    lazy: bool,

    /// Decode the bytes in place.
    #[arg(long)]
    no_copy: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // `register_defaults` need to be called to setup decoders.
    burin::register_defaults()?;

    let bytes = hex::decode(cli.frame.trim())?;
    let options = DecodeOptions {
        lazy: cli.lazy,
        no_copy: cli.no_copy,
    };
    let p = Packet::from_link_type(&bytes, LinkType(cli.link_type), options);

    println!("{}", serde_json::to_string_pretty(&p)?);
    if let Some(failure) = p.error_layer() {
        eprintln!("decoding stopped: {}", failure.error().map_or_else(String::new, |e| e.to_string()));
    }

    Ok(())
}
