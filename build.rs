use std::env;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

// This generates the crate level `register_defaults` function. Every module under `src/layers`
// that defines a top level `register_defaults` function gets called from the generated one. A
// layer only needs to define that function to get its decoder and dispatch entries registered.
fn main() -> io::Result<()> {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").map_err(io::Error::other)?;
    let sources_dir = PathBuf::from(manifest_dir).join("src").join("layers");

    println!("cargo:rerun-if-changed=src/layers");

    let mut reg_defaults = Vec::new();
    for entry in walkdir::WalkDir::new(&sources_dir).sort_by_file_name() {
        let entry = entry.map_err(io::Error::other)?;
        if !entry.file_type().is_file() {
            continue;
        }

        let content = fs::read_to_string(entry.path())?;
        let ast = syn::parse_file(&content).map_err(|e| {
            io::Error::other(format!("file: {:?}, Error: {:?}", entry.path(), e))
        })?;

        // Only top level functions count, a `register_defaults` inside `mod tests` is not seen.
        let registers = ast.items.iter().any(|item| {
            matches!(item, syn::Item::Fn(f) if f.sig.ident == "register_defaults")
        });
        if !registers {
            continue;
        }

        if let Some(module_path) = layer_module_path(&sources_dir, entry.path()) {
            reg_defaults.push(format!("crate::layers::{}register_defaults()?;", module_path));
        }
    }

    let output_str = format!(
        r#"

use std::sync::Once;

static INIT: Once = Once::new();

/// Register the default layer types and their decoders.
///
/// Every [`Layer`][`crate::layer::Layer`] in `burin` is produced by a decoder registered for its
/// [`LayerType`][`crate::LayerType`]. Which decoder runs next is decided by a field of the layer
/// below, for example the EtherType of [`Ethernet`][`crate::layers::ethernet::Ethernet`] selects
/// [`IPv4`][`crate::layers::ipv4::IPv4`] for `0x0800`. Each layer registers its decoder and its
/// entries in the dispatch tables of the layers below it.
///
/// Applications should call this function once at startup, before decoding packets. Without it,
/// every packet decodes to a single `Payload` layer. Calling it again is a no-op.
///
/// ```rust
/// # fn main() {{
///
/// let _ = burin::register_defaults();
///
/// let packet_data =
/// hex::decode("000573a007d168a3c4f949f686dd600000000020064020010470e5bfdead49572174e82c48872607f8b0400c0c03000000000000001af9c7001903a088300000000080022000da4700000204058c0103030801010402").unwrap();
///
/// let packet = burin::Packet::new(&packet_data, burin::LAYER_TYPE_ETHERNET, burin::DecodeOptions::DEFAULT);
///
/// assert!(packet.error_layer().is_none());
///
/// # }}
///
/// ```
pub fn register_defaults() -> Result<(), crate::errors::Error> {{

    let mut result: Result<(), crate::errors::Error> = Ok(());

    fn inner() -> Result<(), crate::errors::Error> {{
        // The reserved layer types need to be in place before any layer registers.
        crate::layer_type::register_defaults()?;

        // Now all the layers' `register_defaults`
        {layers_reg_defaults}

        Ok(())
    }}

    INIT.call_once(|| {{
        result = inner();

        if let Err(ref _e) = result {{
            #[cfg(feature = "logging")]
            log::error!("Error during register_defaults: {{:#?}}", _e);
        }}
    }});

    result

}}"#,
        layers_reg_defaults = reg_defaults.join("\n")
    );

    let out_dir = env::var("OUT_DIR").map_err(io::Error::other)?;
    let outfile_path = PathBuf::from(out_dir).join("register_defaults.rs");
    File::create(&outfile_path)?.write_all(output_str.as_bytes())?;

    // Formatting only helps when reading the generated file, a missing `rustfmt` is fine.
    let _ = std::process::Command::new("rustfmt")
        .arg(&outfile_path)
        .output();

    Ok(())
}

// `ethernet/dot1q.rs` -> `ethernet::dot1q::`, `ethernet/mod.rs` -> `ethernet::`. `None` for
// `layers/mod.rs`, which is not a layer.
fn layer_module_path(sources_dir: &Path, file: &Path) -> Option<String> {
    let relative = file.strip_prefix(sources_dir).ok()?;

    let mut parts: Vec<String> = relative
        .iter()
        .map(|part| part.to_string_lossy().trim_end_matches(".rs").to_string())
        .collect();
    if parts.last().map(String::as_str) == Some("mod") {
        parts.pop();
    }
    if parts.is_empty() {
        return None;
    }

    Some(parts.iter().map(|part| format!("{}::", part)).collect())
}
