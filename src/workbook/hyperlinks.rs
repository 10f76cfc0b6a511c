// src/workbook/hyperlinks.rs
//! Hyperlink targets for the first worksheet, read straight out of the xlsx
//! zip container: `<hyperlink>` nodes in the worksheet XML carry either an
//! `r:id` resolved through the sheet relationships, or an internal location
//! (which has no external target and is skipped).

use anyhow::{anyhow, Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader as XmlReader;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;

struct HyperlinkNode {
    reference: String,
    rid: Option<String>,
    location: Option<String>,
}

/// External link targets keyed by absolute zero-based (row, column).
pub fn sheet_hyperlinks(path: &Path) -> Result<HashMap<(u32, u32), String>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut archive = ZipArchive::new(file)
        .with_context(|| format!("reading xlsx container {}", path.display()))?;

    let workbook_xml = read_entry(&mut archive, "xl/workbook.xml")?
        .ok_or_else(|| anyhow!("xl/workbook.xml missing in {}", path.display()))?;
    let workbook_rels = read_entry(&mut archive, "xl/_rels/workbook.xml.rels")?.unwrap_or_default();

    let sheet_path = first_sheet_rid(&workbook_xml)?
        .and_then(|rid| relationship_targets(&workbook_rels).ok()?.remove(&rid))
        .map(|target| resolve_target(&target))
        .unwrap_or_else(|| "xl/worksheets/sheet1.xml".to_string());

    let sheet_xml = match read_entry(&mut archive, &sheet_path)? {
        Some(xml) => xml,
        None => return Ok(HashMap::new()),
    };
    let nodes = hyperlink_nodes(&sheet_xml)?;
    if nodes.is_empty() {
        return Ok(HashMap::new());
    }

    let sheet_rels = read_entry(&mut archive, &sheet_rels_path(&sheet_path))?.unwrap_or_default();
    let targets = relationship_targets(&sheet_rels)?;

    let mut links = HashMap::new();
    for node in nodes {
        let target = match (&node.rid, &node.location) {
            (Some(rid), _) => match targets.get(rid) {
                Some(target) => target.clone(),
                None => continue,
            },
            // internal link: a location without an external target
            (None, _) => continue,
        };
        // a ref may be a range; the anchor cell carries the link
        let anchor = node.reference.split(':').next().unwrap_or("");
        if let Some(cell) = parse_a1(anchor) {
            links.insert(cell, target);
        }
    }
    Ok(links)
}

fn read_entry(archive: &mut ZipArchive<File>, name: &str) -> Result<Option<String>> {
    match archive.by_name(name) {
        Ok(mut entry) => {
            let mut xml = String::new();
            entry
                .read_to_string(&mut xml)
                .with_context(|| format!("reading container entry {}", name))?;
            Ok(Some(xml))
        }
        Err(zip::result::ZipError::FileNotFound) => Ok(None),
        Err(e) => Err(anyhow::Error::new(e)).with_context(|| format!("accessing {}", name)),
    }
}

/// `r:id` of the first `<sheet>` element in workbook.xml.
fn first_sheet_rid(xml: &str) -> Result<Option<String>> {
    let mut reader = XmlReader::from_reader(xml.as_bytes());
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                if e.name().as_ref() == b"sheet" {
                    return Ok(attr(&e, b"r:id"));
                }
            }
            Ok(Event::Eof) => return Ok(None),
            Err(e) => return Err(anyhow!("parsing workbook.xml: {}", e)),
            _ => {}
        }
        buf.clear();
    }
}

/// Relationship Id → Target map from a .rels part.
fn relationship_targets(xml: &str) -> Result<HashMap<String, String>> {
    let mut targets = HashMap::new();
    if xml.is_empty() {
        return Ok(targets);
    }
    let mut reader = XmlReader::from_reader(xml.as_bytes());
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                if e.name().as_ref() == b"Relationship" {
                    if let (Some(id), Some(target)) = (attr(&e, b"Id"), attr(&e, b"Target")) {
                        targets.insert(id, target);
                    }
                }
            }
            Ok(Event::Eof) => return Ok(targets),
            Err(e) => return Err(anyhow!("parsing relationships: {}", e)),
            _ => {}
        }
        buf.clear();
    }
}

fn hyperlink_nodes(xml: &str) -> Result<Vec<HyperlinkNode>> {
    let mut reader = XmlReader::from_reader(xml.as_bytes());
    let mut buf = Vec::new();
    let mut nodes = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                if e.name().as_ref() == b"hyperlink" {
                    if let Some(reference) = attr(&e, b"ref") {
                        nodes.push(HyperlinkNode {
                            reference,
                            rid: attr(&e, b"r:id"),
                            location: attr(&e, b"location"),
                        });
                    }
                }
            }
            Ok(Event::Eof) => return Ok(nodes),
            Err(e) => return Err(anyhow!("parsing worksheet XML: {}", e)),
            _ => {}
        }
        buf.clear();
    }
}

fn attr(e: &BytesStart, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == name)
        .and_then(|a| a.unescape_value().ok())
        .map(|v| v.into_owned())
}

/// Workbook-relative relationship targets resolve under `xl/`.
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{}", target),
    }
}

fn sheet_rels_path(sheet_path: &str) -> String {
    match sheet_path.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", sheet_path),
    }
}

/// Parse an A1 cell reference into zero-based (row, column).
pub fn parse_a1(reference: &str) -> Option<(u32, u32)> {
    let letters: String = reference
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    let digits = &reference[letters.len()..];
    if letters.is_empty() || digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let mut col: u32 = 0;
    for c in letters.chars() {
        col = col
            .checked_mul(26)?
            .checked_add(c.to_ascii_uppercase() as u32 - 'A' as u32 + 1)?;
    }
    let row: u32 = digits.parse().ok()?;
    if row == 0 {
        return None;
    }
    Some((row - 1, col - 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;
    use zip::write::FileOptions;
    use zip::CompressionMethod;

    #[test]
    fn a1_references_parse_to_zero_based_coordinates() {
        assert_eq!(parse_a1("A1"), Some((0, 0)));
        assert_eq!(parse_a1("N5"), Some((4, 13)));
        assert_eq!(parse_a1("AA10"), Some((9, 26)));
        assert_eq!(parse_a1(""), None);
        assert_eq!(parse_a1("42"), None);
        assert_eq!(parse_a1("B"), None);
    }

    #[test]
    fn rels_path_sits_next_to_the_sheet() {
        assert_eq!(
            sheet_rels_path("xl/worksheets/sheet1.xml"),
            "xl/worksheets/_rels/sheet1.xml.rels"
        );
    }

    #[test]
    fn workbook_relative_targets_resolve_under_xl() {
        assert_eq!(resolve_target("worksheets/sheet1.xml"), "xl/worksheets/sheet1.xml");
        assert_eq!(
            resolve_target("/xl/worksheets/sheet2.xml"),
            "xl/worksheets/sheet2.xml"
        );
    }

    #[test]
    fn links_resolve_through_the_container() -> anyhow::Result<()> {
        let workbook_xml = r#"<?xml version="1.0"?>
<workbook xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <sheets><sheet name="Lista" sheetId="1" r:id="rId1"/></sheets>
</workbook>"#;
        let workbook_rels = r#"<?xml version="1.0"?>
<Relationships>
  <Relationship Id="rId1" Target="worksheets/sheet1.xml"/>
</Relationships>"#;
        let sheet_xml = r#"<?xml version="1.0"?>
<worksheet xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <sheetData/>
  <hyperlinks>
    <hyperlink ref="N5" r:id="rId1"/>
    <hyperlink ref="O5:O6" r:id="rId2"/>
    <hyperlink ref="A2" location="Sheet2!A1"/>
  </hyperlinks>
</worksheet>"#;
        let sheet_rels = r#"<?xml version="1.0"?>
<Relationships>
  <Relationship Id="rId1" Target="https://example.org/permit.pdf" TargetMode="External"/>
  <Relationship Id="rId2" Target="https://example.org/situation.pdf" TargetMode="External"/>
</Relationships>"#;

        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
            let options: FileOptions<'_, ()> =
                FileOptions::default().compression_method(CompressionMethod::Stored);
            for (name, body) in [
                ("xl/workbook.xml", workbook_xml),
                ("xl/_rels/workbook.xml.rels", workbook_rels),
                ("xl/worksheets/sheet1.xml", sheet_xml),
                ("xl/worksheets/_rels/sheet1.xml.rels", sheet_rels),
            ] {
                zip.start_file(name, options)?;
                zip.write_all(body.as_bytes())?;
            }
            zip.finish()?;
        }

        let mut tmp = NamedTempFile::new()?;
        tmp.write_all(&buf)?;

        let links = sheet_hyperlinks(tmp.path())?;
        assert_eq!(links.len(), 2);
        assert_eq!(
            links.get(&(4, 13)).map(String::as_str),
            Some("https://example.org/permit.pdf")
        );
        assert_eq!(
            links.get(&(4, 14)).map(String::as_str),
            Some("https://example.org/situation.pdf")
        );
        // internal location link carries no external target
        assert!(!links.contains_key(&(1, 0)));
        Ok(())
    }
}
