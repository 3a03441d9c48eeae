//! Package-level checks: manifest, relationships and per-entry syntax

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::opc::{
    CONTENT_TYPES_PATH, ContentTypes, MODEL_CONTENT_TYPE, MODEL_PATH, MODEL_REL_TYPE,
    RELS_CONTENT_TYPE, RELS_PATH, parse_relationships, part_name_problems,
};
use crate::package::PackageEntry;
use crate::progress::{ProgressSink, Stage};

use super::ValidationReport;

/// Deepest element nesting accepted in any XML entry
pub(super) const MAX_XML_DEPTH: usize = 64;

/// Check the package skeleton and every entry's syntax
///
/// Returns the path of the entry model document when the root
/// relationships name one that exists.
pub(super) fn validate_structure(
    entries: &[PackageEntry],
    report: &mut ValidationReport,
    progress: &mut ProgressSink<'_>,
) -> Option<String> {
    let content_types = check_content_types(entries, report);

    for (done, entry) in entries.iter().enumerate() {
        let content_type = content_types
            .as_ref()
            .and_then(|ct| ct.content_type_for(&entry.path));
        check_entry_syntax(entry, content_type, report);
        if content_types.is_some() && content_type.is_none() && entry.path != CONTENT_TYPES_PATH {
            report.warning(format!("no content type declared for {}", entry.path));
        }
        progress.report(Stage::Validating, done + 1, entries.len());
    }

    check_relationships(entries, report)
}

fn find<'a>(entries: &'a [PackageEntry], path: &str) -> Option<&'a PackageEntry> {
    entries.iter().find(|e| e.path == path)
}

fn check_content_types(
    entries: &[PackageEntry],
    report: &mut ValidationReport,
) -> Option<ContentTypes> {
    let Some(entry) = find(entries, CONTENT_TYPES_PATH) else {
        report.error(format!("package is missing {}", CONTENT_TYPES_PATH));
        return None;
    };
    let xml = entry.text()?;
    let content_types = match ContentTypes::parse(xml) {
        Ok(content_types) => content_types,
        Err(e) => {
            report.error(format!("{} cannot be read: {}", CONTENT_TYPES_PATH, e));
            return None;
        }
    };

    if !content_types.has_default("rels", RELS_CONTENT_TYPE) {
        report.error(format!(
            "{} does not map the rels extension to {}",
            CONTENT_TYPES_PATH, RELS_CONTENT_TYPE
        ));
    }
    if content_types.content_type_for(MODEL_PATH) != Some(MODEL_CONTENT_TYPE) {
        report.error(format!(
            "{} does not declare {} for the model document",
            CONTENT_TYPES_PATH, MODEL_CONTENT_TYPE
        ));
    }

    Some(content_types)
}

fn is_xml(path: &str, content_type: Option<&str>) -> bool {
    if let Some(ct) = content_type {
        if ct.ends_with("xml") {
            return true;
        }
    }
    matches!(
        path.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()),
        Some(ref ext) if ext == "xml" || ext == "rels" || ext == "model"
    )
}

fn is_text(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| ct.starts_with("text/"))
}

fn check_entry_syntax(entry: &PackageEntry, content_type: Option<&str>, report: &mut ValidationReport) {
    let xml = is_xml(&entry.path, content_type);
    if !xml && !is_text(content_type) {
        return;
    }

    let Some(text) = entry.text() else {
        report.error(format!("{} is not valid UTF-8", entry.path));
        return;
    };

    if xml {
        if let Err(problem) = check_well_formed(text) {
            report.error(format!("{} is not well-formed XML: {}", entry.path, problem));
        }
    }
}

/// Walk every event of `xml`, checking nesting
pub(super) fn check_well_formed(xml: &str) -> Result<(), String> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut depth = 0usize;
    let mut roots = 0usize;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::DocType(_)) => return Err("DTD declarations are not allowed".to_string()),
            Ok(Event::Start(_)) => {
                if depth == 0 {
                    roots += 1;
                }
                depth += 1;
                if depth > MAX_XML_DEPTH {
                    return Err(format!("elements nested deeper than {}", MAX_XML_DEPTH));
                }
            }
            Ok(Event::Empty(_)) => {
                if depth == 0 {
                    roots += 1;
                }
            }
            Ok(Event::End(_)) => depth = depth.saturating_sub(1),
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.to_string()),
            _ => {}
        }
        buf.clear();
    }

    match (roots, depth) {
        (0, _) => Err("no root element".to_string()),
        (_, d) if d > 0 => Err(format!("{} unclosed element(s)", d)),
        (1, _) => Ok(()),
        (n, _) => Err(format!("{} root elements", n)),
    }
}

fn check_relationships(entries: &[PackageEntry], report: &mut ValidationReport) -> Option<String> {
    let Some(entry) = find(entries, RELS_PATH) else {
        report.error(format!("package is missing {}", RELS_PATH));
        return None;
    };
    let xml = entry.text()?;
    let relationships = match parse_relationships(xml) {
        Ok(relationships) => relationships,
        Err(e) => {
            report.error(format!("{} cannot be read: {}", RELS_PATH, e));
            return None;
        }
    };

    for rel in &relationships {
        for problem in part_name_problems(&rel.target) {
            report.error(format!("relationship {}: {}", rel.id, problem));
        }
        let target = rel.target_path();
        if find(entries, &target).is_none() {
            report.error(format!(
                "relationship {} targets {} which is not in the package",
                rel.id, target
            ));
        }
    }

    let model_rels: Vec<_> = relationships
        .iter()
        .filter(|r| r.rel_type == MODEL_REL_TYPE)
        .collect();
    match model_rels.as_slice() {
        [] => {
            report.error(format!("{} has no 3D model relationship", RELS_PATH));
            None
        }
        [rel, rest @ ..] => {
            if !rest.is_empty() {
                report.error(format!(
                    "{} declares {} 3D model relationships; exactly one is allowed",
                    RELS_PATH,
                    model_rels.len()
                ));
            }
            let target = rel.target_path();
            find(entries, &target).map(|e| e.path.clone())
        }
    }
}
