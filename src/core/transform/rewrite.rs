//! XForm binding rewrite
//!
//! Streams the document once with a namespace-aware reader and splices new
//! start tags in place of the ones whose attributes change. Everything else
//! is copied from the input unchanged, so a second pass over the output is a
//! no-op.

use crate::domain::{FormError, GeodataCategory, Result, XFormId};
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;
use serde::Serialize;
use std::fmt;
use std::path::Path;

pub const XHTML_NS: &str = "http://www.w3.org/1999/xhtml";
pub const ODK_NS: &str = "http://www.opendatakit.org/xforms";
pub const XFORMS_NS: &str = "http://www.w3.org/2002/xforms";

/// Local names of the elements above `instance`
const MODEL_PATH: [&[u8]; 3] = [b"html", b"head", b"model"];

/// Result of [`rewrite_bindings`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewriteReport {
    /// The rewritten document
    pub xml: String,

    /// One entry per `instance` element under `head/model`, in document order
    pub instances: Vec<InstanceRewrite>,
}

impl RewriteReport {
    pub fn skipped(&self) -> impl Iterator<Item = &InstanceRewrite> {
        self.instances
            .iter()
            .filter(|i| matches!(i, InstanceRewrite::Skipped { .. }))
    }

    /// Total number of attributes whose value changed
    pub fn change_count(&self) -> usize {
        self.instances
            .iter()
            .map(|i| match i {
                InstanceRewrite::Rewritten { changes, .. } => changes.len(),
                InstanceRewrite::Skipped { .. } => 0,
            })
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InstanceRewrite {
    /// Processed; `changes` is empty when the instance was already bound
    Rewritten {
        index: usize,
        changes: Vec<AttributeChange>,
    },

    /// Left untouched from the failing element onwards
    Skipped { index: usize, reason: SkipReason },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeChange {
    pub element: String,
    pub attribute: String,
    pub old: String,
    pub new: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// `instance` is not in the XForms namespace
    MissingNamespace,

    /// An attribute could not be parsed or unescaped
    MalformedAttribute(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingNamespace => write!(f, "instance is not in the {XFORMS_NS} namespace"),
            SkipReason::MalformedAttribute(e) => write!(f, "malformed attribute: {e}"),
        }
    }
}

/// Open `instance` element being processed
struct OpenInstance {
    index: usize,
    accepted: bool,
}

/// Bind an XForm to a deployment
///
/// Every `instance` under `html/head/model` whose `src` ends in `.geojson`
/// gets `src="jr://file/{category}.geojson"`, and every `data` child of an
/// instance carrying an `id` gets `id="{form_id}"`. Failures are confined to
/// the instance they occur in.
///
/// # Errors
///
/// `FormError::InvalidXml` if the document is not well-formed.
///
/// # Example
///
/// ```
/// use odk_relay::core::transform::rewrite_bindings;
/// use odk_relay::domain::{GeodataCategory, XFormId};
///
/// let xml = r#"<h:html xmlns="http://www.w3.org/2002/xforms" xmlns:h="http://www.w3.org/1999/xhtml">
/// <h:head><model>
/// <instance><data id="survey"/></instance>
/// <instance id="features" src="jr://file/features.geojson"/>
/// </model></h:head></h:html>"#;
///
/// let report = rewrite_bindings(
///     xml,
///     &XFormId::new("form-42").unwrap(),
///     &GeodataCategory::new("buildings").unwrap(),
/// ).unwrap();
/// assert!(report.xml.contains(r#"<data id="form-42"/>"#));
/// assert!(report.xml.contains(r#"src="jr://file/buildings.geojson""#));
/// ```
pub fn rewrite_bindings(
    xml: &str,
    form_id: &XFormId,
    category: &GeodataCategory,
) -> Result<RewriteReport> {
    let source = xml.as_bytes();
    let new_src = format!("jr://file/{}", category.file_name());

    let mut reader = NsReader::from_str(xml);
    let mut out: Vec<u8> = Vec::with_capacity(source.len());
    let mut copied = 0usize;
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut open_instance: Option<OpenInstance> = None;
    let mut instances: Vec<InstanceRewrite> = Vec::new();

    loop {
        let (in_xforms, event) = match reader.read_resolved_event() {
            Ok((ns, event)) => (is_xforms(&ns), event),
            Err(e) => return Err(FormError::InvalidXml(e.to_string()).into()),
        };
        let end = reader.buffer_position() as usize;

        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let is_empty = matches!(event, Event::Empty(_));
                let local = e.local_name().as_ref().to_vec();

                if local == b"instance" && at_model(&stack) {
                    let index = instances.len();
                    let entry = if !in_xforms {
                        InstanceRewrite::Skipped {
                            index,
                            reason: SkipReason::MissingNamespace,
                        }
                    } else {
                        let decide = |v: &str| {
                            (v.ends_with(".geojson") && v != new_src).then(|| new_src.clone())
                        };
                        match rebuild(e, b"src", decide) {
                            Ok(Some((tag, change))) => {
                                splice(&mut out, source, &mut copied, &tag, e, end, is_empty)?;
                                InstanceRewrite::Rewritten {
                                    index,
                                    changes: vec![change],
                                }
                            }
                            Ok(None) => InstanceRewrite::Rewritten {
                                index,
                                changes: Vec::new(),
                            },
                            Err(reason) => InstanceRewrite::Skipped { index, reason },
                        }
                    };

                    let accepted = matches!(entry, InstanceRewrite::Rewritten { .. });
                    if let InstanceRewrite::Skipped { reason, .. } = &entry {
                        tracing::warn!(index, reason = %reason, "Skipping XForm instance");
                    }
                    instances.push(entry);
                    if !is_empty {
                        open_instance = Some(OpenInstance { index, accepted });
                    }
                } else if local == b"data" && stack.len() == MODEL_PATH.len() + 1 {
                    let accepted_index = open_instance
                        .as_ref()
                        .filter(|o| o.accepted)
                        .map(|o| o.index);
                    if let Some(index) = accepted_index {
                        let decide = |v: &str| (v != form_id.as_str()).then(|| form_id.to_string());
                        match rebuild(e, b"id", decide) {
                            Ok(Some((tag, change))) => {
                                splice(&mut out, source, &mut copied, &tag, e, end, is_empty)?;
                                if let Some(InstanceRewrite::Rewritten { changes, .. }) =
                                    instances.get_mut(index)
                                {
                                    changes.push(change);
                                }
                            }
                            Ok(None) => {}
                            Err(reason) => {
                                tracing::warn!(index, reason = %reason, "Skipping XForm instance");
                                instances[index] = InstanceRewrite::Skipped { index, reason };
                                open_instance = Some(OpenInstance {
                                    index,
                                    accepted: false,
                                });
                            }
                        }
                    }
                }

                if !is_empty {
                    stack.push(local);
                }
            }
            Event::End(_) => {
                stack.pop();
                if stack.len() == MODEL_PATH.len() {
                    open_instance = None;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    out.extend_from_slice(&source[copied..]);
    let xml = String::from_utf8(out).map_err(|e| FormError::InvalidXml(e.to_string()))?;

    for instance in &instances {
        if let InstanceRewrite::Rewritten { index, changes } = instance {
            for change in changes {
                tracing::debug!(
                    index,
                    element = %change.element,
                    attribute = %change.attribute,
                    old = %change.old,
                    new = %change.new,
                    "Rewrote XForm binding"
                );
            }
        }
    }

    Ok(RewriteReport { xml, instances })
}

/// Category names of every GeoJSON attachment the form references
///
/// Taken from the file stem of each `instance` `src` ending in `.geojson`,
/// in document order.
pub fn required_media(xml: &str) -> Result<Vec<String>> {
    let mut reader = NsReader::from_str(xml);
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut media = Vec::new();

    loop {
        let (in_xforms, event) = match reader.read_resolved_event() {
            Ok((ns, event)) => (is_xforms(&ns), event),
            Err(e) => return Err(FormError::InvalidXml(e.to_string()).into()),
        };

        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let local = e.local_name().as_ref().to_vec();
                if local == b"instance" && in_xforms && at_model(&stack) {
                    let src = e
                        .try_get_attribute("src")
                        .map_err(|err| FormError::InvalidXml(err.to_string()))?;
                    if let Some(attr) = src {
                        let value = attr
                            .unescape_value()
                            .map_err(|err| FormError::InvalidXml(err.to_string()))?;
                        if value.ends_with(".geojson") {
                            if let Some(stem) = Path::new(value.as_ref())
                                .file_stem()
                                .and_then(|s| s.to_str())
                            {
                                media.push(stem.to_string());
                            }
                        }
                    }
                }
                if matches!(event, Event::Start(_)) {
                    stack.push(local);
                }
            }
            Event::End(_) => {
                stack.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(media)
}

fn is_xforms(ns: &ResolveResult<'_>) -> bool {
    matches!(ns, ResolveResult::Bound(Namespace(uri)) if *uri == XFORMS_NS.as_bytes())
}

fn at_model(stack: &[Vec<u8>]) -> bool {
    stack.len() == MODEL_PATH.len()
        && stack
            .iter()
            .zip(MODEL_PATH.iter())
            .all(|(open, expected)| open.as_slice() == *expected)
}

/// Rebuild `e` with one attribute replaced
///
/// `decide` sees the unescaped current value and returns the replacement, or
/// `None` to leave the element alone. Other attributes keep their raw bytes
/// and order.
fn rebuild(
    e: &BytesStart<'_>,
    attr_name: &[u8],
    decide: impl Fn(&str) -> Option<String>,
) -> std::result::Result<Option<(BytesStart<'static>, AttributeChange)>, SkipReason> {
    let mut attrs: Vec<(Attribute<'_>, Option<String>)> = Vec::new();
    let mut change = None;

    for attr in e.attributes() {
        let attr = attr.map_err(|err| SkipReason::MalformedAttribute(err.to_string()))?;
        let mut replacement = None;
        if attr.key.as_ref() == attr_name {
            let value = attr
                .unescape_value()
                .map_err(|err| SkipReason::MalformedAttribute(err.to_string()))?;
            if let Some(new) = decide(&value) {
                change = Some((value.into_owned(), new.clone()));
                replacement = Some(new);
            }
        }
        attrs.push((attr, replacement));
    }

    let Some((old, new)) = change else {
        return Ok(None);
    };

    let name = std::str::from_utf8(e.name().as_ref())
        .map_err(|err| SkipReason::MalformedAttribute(err.to_string()))?
        .to_string();
    let attribute = String::from_utf8_lossy(attr_name).into_owned();
    let element = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();

    let mut tag = BytesStart::new(name);
    for (attr, replacement) in attrs {
        match replacement {
            Some(value) => tag.push_attribute((attribute.as_str(), value.as_str())),
            None => tag.push_attribute(attr),
        }
    }

    Ok(Some((
        tag,
        AttributeChange {
            element,
            attribute,
            old,
            new,
        },
    )))
}

/// Replace the raw bytes of `original` (which ended at `end`) with `tag`
fn splice(
    out: &mut Vec<u8>,
    source: &[u8],
    copied: &mut usize,
    tag: &BytesStart<'_>,
    original: &BytesStart<'_>,
    end: usize,
    is_empty: bool,
) -> Result<()> {
    // `<` + content + `>` or `/>`
    let framing = if is_empty { 3 } else { 2 };
    let start = end
        .checked_sub(original.len() + framing)
        .filter(|start| *start >= *copied && source.get(*start) == Some(&b'<'))
        .ok_or_else(|| FormError::InvalidXml(format!("cannot locate element ending at byte {end}")))?;

    out.extend_from_slice(&source[*copied..start]);
    out.push(b'<');
    out.extend_from_slice(tag);
    out.extend_from_slice(if is_empty { b"/>" } else { b">" });
    *copied = end;
    Ok(())
}
