//! Document metadata read with lopdf.

use super::error::{PdfError, Result};
use crate::types::DocumentMetadata;
use lopdf::{Document, Object};
use std::collections::BTreeMap;

/// Build [`DocumentMetadata`] from a loaded document.
pub fn extract_metadata_from_document(document: &Document) -> Result<DocumentMetadata> {
    Ok(DocumentMetadata {
        info: read_info_dictionary(document)?,
        metadata: read_xmp_packet(document),
        number_of_pages: document.get_pages().len() as u32,
        version: document.version.clone(),
    })
}

/// Entries of the trailer's `/Info` dictionary as display strings.
///
/// A missing dictionary yields an empty map; a dangling reference is an error.
pub fn read_info_dictionary(document: &Document) -> Result<BTreeMap<String, String>> {
    let mut info = BTreeMap::new();

    let dictionary = match document.trailer.get(b"Info") {
        Ok(Object::Reference(id)) => document
            .get_dictionary(*id)
            .map_err(|e| PdfError::MetadataExtractionFailed(format!("Unreadable /Info dictionary: {}", e)))?,
        Ok(Object::Dictionary(dictionary)) => dictionary,
        _ => return Ok(info),
    };

    for (key, value) in dictionary.iter() {
        let value = match value {
            Object::Reference(id) => match document.get_object(*id) {
                Ok(resolved) => resolved,
                Err(_) => continue,
            },
            other => other,
        };

        if let Some(text) = object_to_string(value) {
            info.insert(String::from_utf8_lossy(key).into_owned(), text);
        }
    }

    Ok(info)
}

/// Raw XMP packet referenced from the catalog, if present.
pub fn read_xmp_packet(document: &Document) -> Option<String> {
    let catalog = document.catalog().ok()?;
    let id = catalog.get(b"Metadata").ok()?.as_reference().ok()?;
    let stream = document.get_object(id).ok()?.as_stream().ok()?;

    let content = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());
    let packet = String::from_utf8_lossy(&content).trim().to_string();

    (!packet.is_empty()).then_some(packet)
}

fn object_to_string(object: &Object) -> Option<String> {
    match object {
        Object::String(bytes, _) => Some(decode_text_string(bytes)),
        Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        Object::Integer(i) => Some(i.to_string()),
        Object::Real(r) => Some(r.to_string()),
        Object::Boolean(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Decode a PDF text string: UTF-16BE with BOM, UTF-8 with BOM, otherwise Latin-1.
pub fn decode_text_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(rest).into_owned();
    }

    bytes.iter().map(|&b| b as char).collect()
}
