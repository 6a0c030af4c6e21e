//! Workflow document parsing.
//!
//! Extracts the catalog metadata (project name, job name, job-level generic
//! information and variables) from a ProActive job descriptor with a
//! streaming tokenizer. Elements are matched on local names, so namespace
//! prefixes do not matter. Task-level entries (anything after `<taskFlow>`)
//! are not part of the catalog metadata and are skipped.

use indexmap::IndexMap;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use thiserror::Error;

const ELEMENT_JOB: &[u8] = b"job";
const ELEMENT_GENERIC_INFORMATION: &[u8] = b"genericInformation";
const ELEMENT_INFO: &[u8] = b"info";
const ELEMENT_VARIABLES: &[u8] = b"variables";
const ELEMENT_VARIABLE: &[u8] = b"variable";
const ELEMENT_TASK_FLOW: &[u8] = b"taskFlow";

const ATTRIBUTE_NAME: &[u8] = b"name";
const ATTRIBUTE_VALUE: &[u8] = b"value";
const ATTRIBUTE_PROJECT_NAME: &[u8] = b"projectName";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Failure to tokenize a document.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed document: {0}")]
    Malformed(String),
}

/// Metadata extracted from a workflow document.
///
/// Names are optional here; deciding whether their absence is acceptable is
/// up to the caller. Both maps keep document order; a repeated key keeps its
/// first position and its last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedDocument {
    pub project_name: Option<String>,
    pub job_name: Option<String>,
    pub generic_information: IndexMap<String, String>,
    pub variables: IndexMap<String, String>,
}

/// Turns raw document bytes into a [`ParsedDocument`]. Pure, no I/O.
pub trait DocumentParser: Send + Sync {
    fn parse(&self, bytes: &[u8]) -> Result<ParsedDocument, ParseError>;
}

/// Production parser for ProActive XML job descriptors.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlWorkflowParser;

impl XmlWorkflowParser {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentParser for XmlWorkflowParser {
    fn parse(&self, bytes: &[u8]) -> Result<ParsedDocument, ParseError> {
        let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        let mut reader = Reader::from_reader(body);
        let mut scan = Scan::default();

        loop {
            let event = reader
                .read_event()
                .map_err(|e| malformed_at(&reader, e))?;

            match event {
                Event::Start(e) => {
                    scan.element(&e)?;
                    scan.stack.push(e.local_name().as_ref().to_vec());
                }
                Event::Empty(e) => {
                    scan.element(&e)?;
                }
                Event::End(_) => {
                    if scan.stack.pop().is_none() {
                        return Err(ParseError::Malformed(format!(
                            "unmatched end tag at byte {}",
                            reader.buffer_position()
                        )));
                    }
                }
                Event::Text(t) => {
                    t.unescape().map_err(|e| {
                        ParseError::Malformed(format!(
                            "{e} (in text ending at byte {})",
                            reader.buffer_position()
                        ))
                    })?;
                    if scan.stack.is_empty() && !t.iter().all(u8::is_ascii_whitespace) {
                        return Err(ParseError::Malformed(format!(
                            "text outside the root element at byte {}",
                            reader.buffer_position()
                        )));
                    }
                }
                Event::CData(_) if scan.stack.is_empty() => {
                    return Err(ParseError::Malformed(
                        "character data outside the root element".to_string(),
                    ));
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !scan.stack.is_empty() {
            return Err(ParseError::Malformed(format!(
                "unexpected end of document: {} unclosed element(s)",
                scan.stack.len()
            )));
        }
        if !scan.root_seen {
            return Err(ParseError::Malformed("document has no root element".to_string()));
        }

        Ok(scan.document)
    }
}

fn malformed_at(reader: &Reader<&[u8]>, e: quick_xml::Error) -> ParseError {
    ParseError::Malformed(format!("{e} (at byte {})", reader.error_position()))
}

/// Walk state: open elements, and whether the task section has started.
#[derive(Default)]
struct Scan {
    document: ParsedDocument,
    stack: Vec<Vec<u8>>,
    root_seen: bool,
    in_task_flow: bool,
}

impl Scan {
    fn parent(&self) -> Option<&[u8]> {
        self.stack.last().map(Vec::as_slice)
    }

    fn element(&mut self, e: &BytesStart<'_>) -> Result<(), ParseError> {
        if self.stack.is_empty() {
            if self.root_seen {
                return Err(ParseError::Malformed(
                    "more than one root element".to_string(),
                ));
            }
            self.root_seen = true;
        }

        let local = e.local_name();
        let local = local.as_ref();

        // Attribute syntax is validated for every element, recognized or not.
        let attrs = attributes(e)?;

        if local == ELEMENT_JOB && self.stack.is_empty() {
            self.document.job_name = lookup(&attrs, ATTRIBUTE_NAME).filter(|s| !s.is_empty());
            self.document.project_name =
                lookup(&attrs, ATTRIBUTE_PROJECT_NAME).filter(|s| !s.is_empty());
        } else if local == ELEMENT_TASK_FLOW {
            self.in_task_flow = true;
        } else if self.in_task_flow {
            // task-level metadata is not catalogued
        } else if local == ELEMENT_INFO && self.parent() == Some(ELEMENT_GENERIC_INFORMATION) {
            if let Some((key, value)) = entry(&attrs) {
                self.document.generic_information.insert(key, value);
            }
        } else if local == ELEMENT_VARIABLE && self.parent() == Some(ELEMENT_VARIABLES) {
            if let Some((key, value)) = entry(&attrs) {
                self.document.variables.insert(key, value);
            }
        }

        Ok(())
    }
}

fn attributes(e: &BytesStart<'_>) -> Result<Vec<(Vec<u8>, String)>, ParseError> {
    let mut out = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| ParseError::Malformed(format!("invalid attribute: {err}")))?;
        let value = attr
            .unescape_value()
            .map_err(|err| ParseError::Malformed(format!("invalid attribute value: {err}")))?;
        out.push((attr.key.local_name().as_ref().to_vec(), value.into_owned()));
    }
    Ok(out)
}

fn lookup(attrs: &[(Vec<u8>, String)], name: &[u8]) -> Option<String> {
    attrs
        .iter()
        .find(|(key, _)| key.as_slice() == name)
        .map(|(_, value)| value.clone())
}

/// A `name`/`value` pair; entries without a name are dropped.
fn entry(attrs: &[(Vec<u8>, String)]) -> Option<(String, String)> {
    let key = lookup(attrs, ATTRIBUTE_NAME)?;
    let value = lookup(attrs, ATTRIBUTE_VALUE).unwrap_or_default();
    Some((key, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_JOB: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<job xmlns="urn:proactive:jobdescriptor:3.3"
     xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
     name="Replicate" projectName="Genomics" priority="normal">
  <variables>
    <variable name="INPUT" value="/data/in"/>
    <variable name="THREADS" value="8"/>
  </variables>
  <description>Replicates a dataset</description>
  <genericInformation>
    <info name="owner" value="lab-a"/>
    <info name="tier" value="gold"/>
  </genericInformation>
  <taskFlow>
    <task name="split">
      <genericInformation>
        <info name="task-only" value="x"/>
      </genericInformation>
      <variables>
        <variable name="TASK_VAR" value="y"/>
      </variables>
      <scriptExecutable><script><code language="groovy"><![CDATA[ println "hi" ]]></code></script></scriptExecutable>
    </task>
  </taskFlow>
</job>"#;

    fn parse(s: &str) -> Result<ParsedDocument, ParseError> {
        XmlWorkflowParser::new().parse(s.as_bytes())
    }

    #[test]
    fn test_parses_names_and_job_level_entries() {
        let doc = parse(FULL_JOB).unwrap();
        assert_eq!(doc.job_name.as_deref(), Some("Replicate"));
        assert_eq!(doc.project_name.as_deref(), Some("Genomics"));

        let gi: Vec<_> = doc.generic_information.iter().collect();
        assert_eq!(
            gi,
            vec![
                (&"owner".to_string(), &"lab-a".to_string()),
                (&"tier".to_string(), &"gold".to_string())
            ]
        );
        assert_eq!(doc.variables.get("INPUT").map(String::as_str), Some("/data/in"));
        assert_eq!(doc.variables.get("THREADS").map(String::as_str), Some("8"));
    }

    #[test]
    fn test_task_level_entries_are_ignored() {
        let doc = parse(FULL_JOB).unwrap();
        assert!(!doc.generic_information.contains_key("task-only"));
        assert!(!doc.variables.contains_key("TASK_VAR"));
        assert_eq!(doc.generic_information.len(), 2);
        assert_eq!(doc.variables.len(), 2);
    }

    #[test]
    fn test_missing_names_are_not_errors() {
        let doc = parse(r#"<job><variables><variable name="a" value="b"/></variables></job>"#).unwrap();
        assert!(doc.job_name.is_none());
        assert!(doc.project_name.is_none());
        assert_eq!(doc.variables.len(), 1);
    }

    #[test]
    fn test_empty_name_attribute_counts_as_missing() {
        let doc = parse(r#"<job name="" projectName="P"/>"#).unwrap();
        assert!(doc.job_name.is_none());
        assert_eq!(doc.project_name.as_deref(), Some("P"));
    }

    #[test]
    fn test_unknown_root_parses_without_metadata() {
        let doc = parse(r#"<workflow name="x" projectName="y"/>"#).unwrap();
        assert_eq!(doc, ParsedDocument::default());
    }

    #[test]
    fn test_namespace_prefixes_are_ignored() {
        let doc = parse(
            r#"<pa:job xmlns:pa="urn:proactive" name="J" projectName="P">
                 <pa:genericInformation><pa:info name="k" value="v"/></pa:genericInformation>
               </pa:job>"#,
        )
        .unwrap();
        assert_eq!(doc.job_name.as_deref(), Some("J"));
        assert_eq!(doc.generic_information.get("k").map(String::as_str), Some("v"));
    }

    #[test]
    fn test_attribute_values_are_unescaped() {
        let doc = parse(
            r#"<job name="A &amp; B" projectName="P"><variables><variable name="expr" value="x &lt; 3"/></variables></job>"#,
        )
        .unwrap();
        assert_eq!(doc.job_name.as_deref(), Some("A & B"));
        assert_eq!(doc.variables.get("expr").map(String::as_str), Some("x < 3"));
    }

    #[test]
    fn test_duplicate_keys_keep_first_position_last_value() {
        let doc = parse(
            r#"<job name="J" projectName="P"><genericInformation>
                 <info name="a" value="1"/><info name="b" value="2"/><info name="a" value="3"/>
               </genericInformation></job>"#,
        )
        .unwrap();
        let keys: Vec<_> = doc.generic_information.keys().cloned().collect();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(doc.generic_information["a"], "3");
    }

    #[test]
    fn test_entry_without_name_is_skipped_and_missing_value_is_empty() {
        let doc = parse(
            r#"<job name="J" projectName="P"><variables>
                 <variable value="orphan"/><variable name="EMPTY"/>
               </variables></job>"#,
        )
        .unwrap();
        assert_eq!(doc.variables.len(), 1);
        assert_eq!(doc.variables["EMPTY"], "");
    }

    #[test]
    fn test_info_outside_generic_information_is_ignored() {
        let doc = parse(r#"<job name="J" projectName="P"><info name="stray" value="1"/></job>"#).unwrap();
        assert!(doc.generic_information.is_empty());
    }

    #[test]
    fn test_utf8_bom_is_accepted() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(br#"<job name="J" projectName="P"/>"#);
        let doc = XmlWorkflowParser::new().parse(&bytes).unwrap();
        assert_eq!(doc.job_name.as_deref(), Some("J"));
    }

    #[test]
    fn test_rejects_plain_text() {
        assert!(matches!(parse("this is not xml"), Err(ParseError::Malformed(_))));
    }

    #[test]
    fn test_rejects_empty_input() {
        assert!(matches!(parse(""), Err(ParseError::Malformed(_))));
        assert!(matches!(parse("   \n"), Err(ParseError::Malformed(_))));
    }

    #[test]
    fn test_rejects_unclosed_element() {
        assert!(matches!(parse(r#"<job name="J"><variables>"#), Err(ParseError::Malformed(_))));
    }

    #[test]
    fn test_rejects_truncated_tag() {
        assert!(matches!(parse(r#"<job name="J" projectName="P""#), Err(ParseError::Malformed(_))));
    }

    #[test]
    fn test_rejects_mismatched_end_tag() {
        assert!(matches!(parse("<job><variables></job></variables>"), Err(ParseError::Malformed(_))));
    }

    #[test]
    fn test_rejects_multiple_roots() {
        assert!(matches!(parse("<job/><job/>"), Err(ParseError::Malformed(_))));
    }

    #[test]
    fn test_rejects_bad_entity_in_attribute() {
        assert!(matches!(
            parse(r#"<job name="&nope;" projectName="P"/>"#),
            Err(ParseError::Malformed(_))
        ));
    }

    #[test]
    fn test_rejects_duplicate_attribute() {
        assert!(matches!(
            parse(r#"<job name="a" name="b" projectName="P"/>"#),
            Err(ParseError::Malformed(_))
        ));
    }

    #[test]
    fn test_rejects_unknown_entity_in_text() {
        let err = parse(
            r#"<job name="J" projectName="P"><description>&nope; here</description></job>"#,
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::Malformed(_)), "{err:?}");
    }

    #[test]
    fn test_rejects_bare_ampersand_in_text() {
        assert!(matches!(
            parse(r#"<job name="J" projectName="P"><description>a & b</description></job>"#),
            Err(ParseError::Malformed(_))
        ));
    }

    #[test]
    fn test_escaped_text_is_accepted() {
        let doc = parse(
            r#"<job name="J" projectName="P"><description>a &amp; b &lt;&#38;&#x26;</description></job>"#,
        )
        .unwrap();
        assert_eq!(doc.job_name.as_deref(), Some("J"));
    }
}
