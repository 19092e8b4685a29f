//! Subcommand implementations.
//!
//! Each command takes its input as text and returns the text to print, so
//! the I/O stays in `main`.

use std::fmt::Write as _;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, bail};
use helios_bind::json::{from_json_str, to_json_string, to_json_string_pretty};
use helios_bind::xml::{
    from_xml_str, marshal_to_xml_string, marshal_to_xml_string_pretty, unmarshal_xml_str,
};
use helios_bind::{Codec, TypeRegistry, registry_from_json_str};
use tracing::{debug, info};

/// Reads and validates a class declaration file.
pub fn load_registry(path: &Path) -> anyhow::Result<TypeRegistry> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read schema {}", path.display()))?;
    let registry = registry_from_json_str(&text)
        .with_context(|| format!("Invalid schema {}", path.display()))?;
    info!(schema = %path.display(), classes = registry.len(), "Loaded schema");
    Ok(registry)
}

/// Reads a whole input file, or stdin when no path is given.
pub fn read_input(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            Ok(text)
        }
    }
}

/// Lists every class, one per line, with its parent and subtypes.
pub fn check(registry: &TypeRegistry) -> anyhow::Result<String> {
    let mut out = String::new();
    for class in registry.classes() {
        let subtypes: Vec<&str> = registry
            .subtypes_of(&class.name)?
            .into_iter()
            .map(|subtype| subtype.name.as_str())
            .collect();

        write!(out, "{}", class.name)?;
        if class.is_abstract {
            out.push_str(" (abstract)");
        }
        if let Some(parent) = &class.parent {
            write!(out, " extends {parent}")?;
        }
        if !subtypes.is_empty() {
            write!(out, " <- {}", subtypes.join(", "))?;
        }
        out.push('\n');
    }
    Ok(out)
}

/// XML document to pretty JSON object view.
pub fn decode(codec: &Codec<'_>, class: &str, xml: &str) -> anyhow::Result<String> {
    let object = unmarshal_xml_str(codec, class, xml)
        .with_context(|| format!("Failed to decode document as {class}"))?;
    debug!(class = %class, runtime = %object.type_name(), "Decoded document");
    Ok(to_json_string_pretty(&object)?)
}

/// JSON object view to XML document.
pub fn encode(
    codec: &Codec<'_>,
    class: &str,
    element: &str,
    json: &str,
    pretty: bool,
) -> anyhow::Result<String> {
    let object = from_json_str(json).context("Failed to parse object JSON")?;
    let xml = if pretty {
        marshal_to_xml_string_pretty(codec, element, class, &object)
    } else {
        marshal_to_xml_string(codec, element, class, &object)
    };
    xml.with_context(|| format!("Failed to encode {} as {class}", object.type_name()))
}

/// Decodes, re-encodes under the same root name and decodes again.
pub fn roundtrip(codec: &Codec<'_>, class: &str, xml: &str) -> anyhow::Result<String> {
    let root = from_xml_str(xml).context("Failed to parse document")?;
    let first = codec
        .unmarshal_root(class, &root)
        .with_context(|| format!("Failed to decode document as {class}"))?;
    let written = marshal_to_xml_string(codec, &root.name, class, &first)
        .context("Failed to re-encode document")?;
    let second = unmarshal_xml_str(codec, class, &written)
        .context("Failed to decode re-encoded document")?;

    if first != second {
        bail!(
            "Round trip changed the object:\nfirst:  {}\nsecond: {}",
            to_json_string(&first)?,
            to_json_string(&second)?
        );
    }
    Ok(format!("{class}: round trip ok\n"))
}
