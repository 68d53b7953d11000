//! Placeholder resolution over slide XML.
//!
//! A slide is read into an owned event list. Every `a:r` run inside an `a:p`
//! paragraph is located, whether the paragraph sits in a plain shape, a text
//! box, a shape nested in a group or a table cell. Runs of one paragraph form
//! a [`LogicalText`](crate::text::LogicalText) segment; line breaks (`a:br`)
//! and fields (`a:fld`) end a segment. Only the `a:t` payload of changed runs
//! is rewritten, every other event is written back as read.

use crate::deck::Deck;
use crate::error::{Error, Result};
use crate::replacements::ReplacementMap;
use crate::text::replace_in_runs;
use quick_xml::events::{BytesText, Event};
use quick_xml::{Reader, Writer};
use std::collections::HashMap;
use tracing::{debug, info};

#[derive(Debug)]
struct RunSlot {
    /// Index of the `a:r` start event
    open: usize,
    /// Index of the `a:r` end event
    close: usize,
    /// Index of the `a:t` start (or empty) event
    text_open: Option<usize>,
    /// Index of the `a:t` end event
    text_close: usize,
    text: String,
    changed: bool,
}

#[derive(Debug)]
struct Segment {
    paragraph: usize,
    /// Separator that precedes this segment within its paragraph
    separator: &'static str,
    runs: Vec<usize>,
}

/// Text view of one slide part.
#[derive(Debug)]
pub(crate) struct SlideText {
    events: Vec<Event<'static>>,
    runs: Vec<RunSlot>,
    segments: Vec<Segment>,
    paragraph_count: usize,
}

impl SlideText {
    /// Parse slide XML into events and locate its text runs.
    pub(crate) fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);

        let mut events = Vec::new();
        let mut runs = Vec::new();
        let mut segments = Vec::new();
        let mut paragraph_count = 0;

        let mut paragraph: Option<usize> = None;
        let mut current = Segment {
            paragraph: 0,
            separator: "",
            runs: Vec::new(),
        };
        let mut run: Option<RunSlot> = None;
        let mut in_text = false;

        loop {
            let event = reader.read_event()?;
            let idx = events.len();

            match &event {
                Event::Eof => break,
                Event::Start(e) => match e.local_name().as_ref() {
                    b"p" if paragraph.is_none() => {
                        paragraph = Some(paragraph_count);
                        paragraph_count += 1;
                        current = Segment {
                            paragraph: paragraph_count - 1,
                            separator: "",
                            runs: Vec::new(),
                        };
                    }
                    b"r" if paragraph.is_some() && run.is_none() => {
                        run = Some(RunSlot {
                            open: idx,
                            close: idx,
                            text_open: None,
                            text_close: idx,
                            text: String::new(),
                            changed: false,
                        });
                    }
                    b"t" => {
                        if let Some(slot) = run.as_mut() {
                            if slot.text_open.is_none() {
                                slot.text_open = Some(idx);
                                in_text = true;
                            }
                        }
                    }
                    b"fld" if paragraph.is_some() && run.is_none() => {
                        Self::split(&mut segments, &mut current, "");
                    }
                    _ => {}
                },
                Event::Empty(e) => match e.local_name().as_ref() {
                    b"p" if paragraph.is_none() => {
                        paragraph_count += 1;
                    }
                    b"t" => {
                        if let Some(slot) = run.as_mut() {
                            if slot.text_open.is_none() {
                                slot.text_open = Some(idx);
                                slot.text_close = idx;
                            }
                        }
                    }
                    b"br" if paragraph.is_some() && run.is_none() => {
                        Self::split(&mut segments, &mut current, "\n");
                    }
                    b"fld" if paragraph.is_some() && run.is_none() => {
                        Self::split(&mut segments, &mut current, "");
                    }
                    _ => {}
                },
                Event::Text(e) if in_text => {
                    if let Some(slot) = run.as_mut() {
                        slot.text.push_str(&e.unescape()?);
                    }
                }
                Event::CData(e) if in_text => {
                    if let Some(slot) = run.as_mut() {
                        slot.text.push_str(&String::from_utf8_lossy(e));
                    }
                }
                Event::End(e) => match e.local_name().as_ref() {
                    b"t" if in_text => {
                        in_text = false;
                        if let Some(slot) = run.as_mut() {
                            slot.text_close = idx;
                        }
                    }
                    b"r" if run.is_some() => {
                        if let Some(mut slot) = run.take() {
                            slot.close = idx;
                            current.runs.push(runs.len());
                            runs.push(slot);
                        }
                    }
                    b"p" if paragraph.is_some() && run.is_none() => {
                        paragraph = None;
                        let done = std::mem::replace(
                            &mut current,
                            Segment {
                                paragraph: 0,
                                separator: "",
                                runs: Vec::new(),
                            },
                        );
                        segments.push(done);
                    }
                    _ => {}
                },
                _ => {}
            }

            events.push(event.into_owned());
        }

        Ok(Self {
            events,
            runs,
            segments,
            paragraph_count,
        })
    }

    /// Close the current segment and open a new one in the same paragraph.
    fn split(segments: &mut Vec<Segment>, current: &mut Segment, separator: &'static str) {
        let next = Segment {
            paragraph: current.paragraph,
            separator,
            runs: Vec::new(),
        };
        segments.push(std::mem::replace(current, next));
    }

    /// Apply every replacement to every segment. Returns the number of
    /// substitutions made.
    pub(crate) fn apply(&mut self, replacements: &[(&str, String)]) -> usize {
        let mut total = 0;

        for segment in &self.segments {
            if segment.runs.is_empty() {
                continue;
            }
            let mut texts: Vec<String> = segment
                .runs
                .iter()
                .map(|&r| self.runs[r].text.clone())
                .collect();

            let hits: usize = replacements
                .iter()
                .map(|(key, value)| replace_in_runs(&mut texts, key, value))
                .sum();

            if hits > 0 {
                for (&r, text) in segment.runs.iter().zip(texts) {
                    let slot = &mut self.runs[r];
                    if slot.text != text {
                        slot.text = text;
                        slot.changed = true;
                    }
                }
            }
            total += hits;
        }

        total
    }

    /// Logical text of each paragraph, in document order. Line breaks are
    /// rendered as `\n`.
    pub(crate) fn paragraphs(&self) -> Vec<String> {
        let mut out = vec![String::new(); self.paragraph_count];
        for segment in &self.segments {
            if let Some(text) = out.get_mut(segment.paragraph) {
                text.push_str(segment.separator);
                for &r in &segment.runs {
                    text.push_str(&self.runs[r].text);
                }
            }
        }
        out
    }

    /// Serialize the slide, rewriting the text of changed runs. A run whose
    /// text a replacement consumed entirely is dropped.
    pub(crate) fn to_xml(&self) -> Result<String> {
        // event index -> (last event index to skip, run to write in its place)
        let mut actions: HashMap<usize, (usize, Option<&RunSlot>)> = HashMap::new();
        for slot in self.runs.iter().filter(|s| s.changed) {
            if slot.text.is_empty() {
                actions.insert(slot.open, (slot.close, None));
            } else if let Some(text_open) = slot.text_open {
                actions.insert(text_open, (slot.text_close, Some(slot)));
            }
        }

        let mut writer = Writer::new(Vec::new());
        let mut i = 0;
        while i < self.events.len() {
            if let Some(&(last, slot)) = actions.get(&i) {
                if let Some(slot) = slot {
                    let start = match &self.events[i] {
                        Event::Start(e) | Event::Empty(e) => e.borrow(),
                        other => {
                            return Err(Error::XmlParse(format!(
                                "expected text element, found {:?}",
                                other
                            )))
                        }
                    };
                    writer.write_event(Event::Start(start.borrow()))?;
                    writer.write_event(Event::Text(BytesText::new(&slot.text)))?;
                    writer.write_event(Event::End(start.to_end()))?;
                }
                i = last + 1;
                continue;
            }
            writer.write_event(self.events[i].borrow())?;
            i += 1;
        }

        String::from_utf8(writer.into_inner()).map_err(|e| Error::XmlParse(e.to_string()))
    }
}

/// Resolve placeholders in one slide part. Returns `None` when no token
/// matched, so the caller can keep the original bytes.
pub fn resolve_xml(xml: &str, replacements: &ReplacementMap) -> Result<Option<String>> {
    let pairs = replacement_pairs(replacements)?;
    let mut slide = SlideText::parse(xml)?;
    if slide.apply(&pairs) == 0 {
        return Ok(None);
    }
    slide.to_xml().map(Some)
}

/// Validated (token, text) pairs in key order.
fn replacement_pairs(replacements: &ReplacementMap) -> Result<Vec<(&str, String)>> {
    replacements.validate()?;
    Ok(replacements
        .iter()
        .map(|(key, value)| (key, value.to_string()))
        .collect())
}

impl Deck {
    /// Replace placeholder tokens in every slide still in the deck.
    ///
    /// Slides where nothing matched are left byte-for-byte untouched.
    /// Returns the total number of substitutions. A value XML cannot carry
    /// fails with [`InvalidReplacementValue`](crate::Error::InvalidReplacementValue)
    /// before any slide is touched.
    pub fn resolve(&mut self, replacements: &ReplacementMap) -> Result<usize> {
        if replacements.is_empty() {
            return Ok(0);
        }

        let pairs = replacement_pairs(replacements)?;
        let mut total = 0;

        for position in 0..self.slide_count() {
            let part = self.slide_part(position)?;
            let xml = self.package.read_xml(&part)?;

            let mut slide = SlideText::parse(&xml)?;
            let hits = slide.apply(&pairs);
            if hits > 0 {
                self.package.replace(&part, slide.to_xml()?.into_bytes())?;
                debug!(part = %part, substitutions = hits, "resolved placeholders");
            }
            total += hits;
        }

        info!(
            slides = self.slide_count(),
            tokens = replacements.len(),
            substitutions = total,
            "placeholder resolution finished"
        );
        Ok(total)
    }
}
