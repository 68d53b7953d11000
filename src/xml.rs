//! Small helpers over quick-xml event streams.

use crate::error::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};

/// Read an attribute by its full (possibly prefixed) name.
pub(crate) fn attr(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .map(|a| String::from_utf8_lossy(&a.value).to_string())
}

/// Read a namespaced attribute by local name, ignoring unprefixed ones
/// (`r:id` but not `id`).
pub(crate) fn prefixed_attr(e: &BytesStart<'_>, local: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.prefix().is_some() && a.key.local_name().as_ref() == local)
        .map(|a| String::from_utf8_lossy(&a.value).to_string())
}

/// Copy an XML document, dropping every element (with its subtree) for which
/// `keep` returns false. Returns the rewritten XML and the number of
/// elements dropped. Everything else is written back as read.
pub(crate) fn filter_elements<F>(xml: &str, mut keep: F) -> Result<(String, usize)>
where
    F: FnMut(&BytesStart<'_>) -> bool,
{
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len()));
    let mut removed = 0;
    let mut skip_depth = 0usize;

    loop {
        let event = reader.read_event()?;
        if matches!(event, Event::Eof) {
            break;
        }

        if skip_depth > 0 {
            match event {
                Event::Start(_) => skip_depth += 1,
                Event::End(_) => skip_depth -= 1,
                _ => {}
            }
            continue;
        }

        match &event {
            Event::Start(e) if !keep(e) => {
                skip_depth = 1;
                removed += 1;
                continue;
            }
            Event::Empty(e) if !keep(e) => {
                removed += 1;
                continue;
            }
            _ => {}
        }

        writer.write_event(event)?;
    }

    let out = String::from_utf8(writer.into_inner())
        .map_err(|e| Error::XmlParse(e.to_string()))?;
    Ok((out, removed))
}
