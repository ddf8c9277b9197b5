//! XML codec for project documents.
//!
//! Parses legacy and SDK-style project files into [`ProjectDocument`] trees
//! and serializes mutated trees back out. Top-level elements the converter
//! does not interpret (custom targets, tasks) are carried through verbatim
//! as raw fragments so conversion never destroys what it does not
//! understand.

use crate::document::{
    GroupKind, Import, ItemGroup, ProjectDocument, ProjectItem, ProjectProperty, PropertyGroup,
};
use crate::error_codes;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProjectXmlError {
    #[error("[SDKIFY_XML_001] XML parse error: {0}. Suggestion: check that the file is well-formed XML.")]
    Xml(String),
    #[error("[SDKIFY_XML_002] document root is not a <Project> element. Suggestion: point the converter at a project file.")]
    NotAProject,
    #[error("[SDKIFY_XML_003] XML write error: {0}")]
    Write(String),
}

impl ProjectXmlError {
    pub fn code(&self) -> &'static str {
        match self {
            ProjectXmlError::Xml(_) => error_codes::XML_PARSE,
            ProjectXmlError::NotAProject => error_codes::XML_NOT_PROJECT,
            ProjectXmlError::Write(_) => error_codes::XML_WRITE,
        }
    }
}

fn to_xml_err(e: impl std::fmt::Display) -> ProjectXmlError {
    ProjectXmlError::Xml(e.to_string())
}

fn to_write_err(e: impl std::fmt::Display) -> ProjectXmlError {
    ProjectXmlError::Write(e.to_string())
}

/// Parses a project file. `project_name` is the file stem of the document
/// (used for structural-default checks and reserved properties).
pub fn parse_project(xml: &[u8], project_name: &str) -> Result<ProjectDocument, ProjectXmlError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut doc = ProjectDocument::new(project_name);
    let mut saw_root = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if !saw_root => {
                if e.name().as_ref() != b"Project" {
                    return Err(ProjectXmlError::NotAProject);
                }
                saw_root = true;
                for attr in e.attributes() {
                    let attr = attr.map_err(to_xml_err)?;
                    let value = attr.unescape_value().map_err(to_xml_err)?.into_owned();
                    match attr.key.as_ref() {
                        b"Sdk" => doc.sdk = Some(value),
                        b"ToolsVersion" => doc.tools_version = Some(value),
                        b"DefaultTargets" => doc.default_targets = Some(value),
                        b"xmlns" => doc.xmlns = Some(value),
                        _ => {}
                    }
                }
            }
            Ok(Event::Start(e)) => {
                let owned = e.into_owned();
                match owned.name().as_ref() {
                    b"PropertyGroup" => {
                        let group = parse_property_group(&mut reader, &owned)?;
                        doc.append_group(GroupKind::Properties(group));
                    }
                    b"ItemGroup" => {
                        let group = parse_item_group(&mut reader, &owned)?;
                        doc.append_group(GroupKind::Items(group));
                    }
                    b"Import" => {
                        let import = parse_import(&owned)?;
                        reader.read_to_end(owned.name()).map_err(to_xml_err)?;
                        doc.append_group(GroupKind::Import(import));
                    }
                    _ => {
                        let raw = capture_raw_element(&mut reader, &owned)?;
                        doc.append_group(GroupKind::Raw(raw));
                    }
                }
            }
            Ok(Event::Empty(e)) if saw_root => match e.name().as_ref() {
                b"PropertyGroup" => {
                    let group = PropertyGroup {
                        condition: read_condition(&e)?,
                        properties: Vec::new(),
                    };
                    doc.append_group(GroupKind::Properties(group));
                }
                b"ItemGroup" => {
                    let group = ItemGroup {
                        condition: read_condition(&e)?,
                        items: Vec::new(),
                    };
                    doc.append_group(GroupKind::Items(group));
                }
                b"Import" => {
                    doc.append_group(GroupKind::Import(parse_import(&e)?));
                }
                _ => {
                    let raw = echo_empty_element(&e)?;
                    doc.append_group(GroupKind::Raw(raw));
                }
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(to_xml_err(e)),
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err(ProjectXmlError::NotAProject);
    }
    Ok(doc)
}

fn read_condition(e: &BytesStart<'_>) -> Result<Option<String>, ProjectXmlError> {
    for attr in e.attributes() {
        let attr = attr.map_err(to_xml_err)?;
        if attr.key.as_ref() == b"Condition" {
            return Ok(Some(
                attr.unescape_value().map_err(to_xml_err)?.into_owned(),
            ));
        }
    }
    Ok(None)
}

fn parse_property_group(
    reader: &mut Reader<&[u8]>,
    start: &BytesStart<'_>,
) -> Result<PropertyGroup, ProjectXmlError> {
    let mut group = PropertyGroup {
        condition: read_condition(start)?,
        properties: Vec::new(),
    };
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                let value = reader.read_text(e.name()).map_err(to_xml_err)?.into_owned();
                group.properties.push(ProjectProperty { name, value });
            }
            Ok(Event::Empty(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                group.properties.push(ProjectProperty {
                    name,
                    value: String::new(),
                });
            }
            Ok(Event::End(e)) if e.name().as_ref() == b"PropertyGroup" => break,
            Ok(Event::Eof) => return Err(ProjectXmlError::Xml("unclosed PropertyGroup".into())),
            Err(e) => return Err(to_xml_err(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(group)
}

fn parse_item_group(
    reader: &mut Reader<&[u8]>,
    start: &BytesStart<'_>,
) -> Result<ItemGroup, ProjectXmlError> {
    let mut group = ItemGroup {
        condition: read_condition(start)?,
        items: Vec::new(),
    };
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let owned = e.into_owned();
                let mut item = item_from_start(&owned)?;
                parse_item_metadata(reader, &owned, &mut item)?;
                group.items.push(item);
            }
            Ok(Event::Empty(e)) => {
                group.items.push(item_from_start(&e)?);
            }
            Ok(Event::End(e)) if e.name().as_ref() == b"ItemGroup" => break,
            Ok(Event::Eof) => return Err(ProjectXmlError::Xml("unclosed ItemGroup".into())),
            Err(e) => return Err(to_xml_err(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(group)
}

fn item_from_start(e: &BytesStart<'_>) -> Result<ProjectItem, ProjectXmlError> {
    let item_type = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut item = ProjectItem {
        item_type,
        include: None,
        update: None,
        remove: None,
        metadata: Vec::new(),
    };
    for attr in e.attributes() {
        let attr = attr.map_err(to_xml_err)?;
        let value = attr.unescape_value().map_err(to_xml_err)?.into_owned();
        match attr.key.as_ref() {
            b"Include" => item.include = Some(value),
            b"Update" => item.update = Some(value),
            b"Remove" => item.remove = Some(value),
            _ => {}
        }
    }
    Ok(item)
}

fn parse_item_metadata(
    reader: &mut Reader<&[u8]>,
    item_start: &BytesStart<'_>,
    item: &mut ProjectItem,
) -> Result<(), ProjectXmlError> {
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                let value = reader.read_text(e.name()).map_err(to_xml_err)?.into_owned();
                item.metadata.push((name, value));
            }
            Ok(Event::Empty(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                item.metadata.push((name, String::new()));
            }
            Ok(Event::End(e)) if e.name() == item_start.name() => break,
            Ok(Event::Eof) => {
                return Err(ProjectXmlError::Xml(format!(
                    "unclosed item element {}",
                    String::from_utf8_lossy(item_start.name().as_ref())
                )));
            }
            Err(e) => return Err(to_xml_err(e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(())
}

fn parse_import(e: &BytesStart<'_>) -> Result<Import, ProjectXmlError> {
    let mut project = None;
    let mut condition = None;
    let mut label = None;
    for attr in e.attributes() {
        let attr = attr.map_err(to_xml_err)?;
        let value = attr.unescape_value().map_err(to_xml_err)?.into_owned();
        match attr.key.as_ref() {
            b"Project" => project = Some(value),
            b"Condition" => condition = Some(value),
            b"Label" => label = Some(value),
            _ => {}
        }
    }
    Ok(Import {
        project: project.unwrap_or_default(),
        condition,
        label,
    })
}

/// Echoes an unrecognized element (and everything inside it) back into a
/// string so it can be re-emitted verbatim on write.
fn capture_raw_element(
    reader: &mut Reader<&[u8]>,
    start: &BytesStart<'_>,
) -> Result<String, ProjectXmlError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Start(start.borrow()))
        .map_err(to_write_err)?;

    let end_name = start.name().as_ref().to_vec();
    let mut depth = 0usize;
    let mut buf = Vec::new();
    loop {
        let event = match reader.read_event_into(&mut buf) {
            Ok(event) => event,
            Err(e) => return Err(to_xml_err(e)),
        };
        match &event {
            Event::Start(e) if e.name().as_ref() == end_name.as_slice() => depth += 1,
            Event::End(e) if e.name().as_ref() == end_name.as_slice() => {
                if depth == 0 {
                    writer
                        .write_event(Event::End(BytesEnd::new(
                            String::from_utf8_lossy(&end_name).into_owned(),
                        )))
                        .map_err(to_write_err)?;
                    break;
                }
                depth -= 1;
            }
            Event::Eof => {
                return Err(ProjectXmlError::Xml(format!(
                    "unclosed element {}",
                    String::from_utf8_lossy(&end_name)
                )));
            }
            _ => {}
        }
        writer.write_event(event).map_err(to_write_err)?;
        buf.clear();
    }

    String::from_utf8(writer.into_inner()).map_err(to_write_err)
}

fn echo_empty_element(e: &BytesStart<'_>) -> Result<String, ProjectXmlError> {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Empty(e.borrow()))
        .map_err(to_write_err)?;
    String::from_utf8(writer.into_inner()).map_err(to_write_err)
}

/// Serializes a document. Legacy root attributes (`ToolsVersion`,
/// `DefaultTargets`, `xmlns`) are written only when still set; an SDK-style
/// document carries just the `Sdk` attribute.
pub fn write_project(doc: &ProjectDocument) -> Result<String, ProjectXmlError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    let mut root = BytesStart::new("Project");
    if let Some(sdk) = &doc.sdk {
        root.push_attribute(("Sdk", sdk.as_str()));
    }
    if let Some(tools_version) = &doc.tools_version {
        root.push_attribute(("ToolsVersion", tools_version.as_str()));
    }
    if let Some(default_targets) = &doc.default_targets {
        root.push_attribute(("DefaultTargets", default_targets.as_str()));
    }
    if doc.sdk.is_none() {
        if let Some(xmlns) = &doc.xmlns {
            root.push_attribute(("xmlns", xmlns.as_str()));
        }
    }
    writer
        .write_event(Event::Start(root))
        .map_err(to_write_err)?;

    for id in doc.group_ids() {
        let Some(kind) = doc.group(id) else { continue };
        match kind {
            GroupKind::Properties(group) => write_property_group(&mut writer, group)?,
            GroupKind::Items(group) => write_item_group(&mut writer, group)?,
            GroupKind::Import(import) => write_import(&mut writer, import)?,
            GroupKind::Raw(raw) => {
                writer
                    .write_event(Event::Text(BytesText::from_escaped(raw.as_str())))
                    .map_err(to_write_err)?;
            }
        }
    }

    writer
        .write_event(Event::End(BytesEnd::new("Project")))
        .map_err(to_write_err)?;

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    String::from_utf8(bytes).map_err(to_write_err)
}

fn write_property_group(
    writer: &mut Writer<Vec<u8>>,
    group: &PropertyGroup,
) -> Result<(), ProjectXmlError> {
    let mut start = BytesStart::new("PropertyGroup");
    if let Some(condition) = &group.condition {
        start.push_attribute(("Condition", condition.as_str()));
    }

    if group.properties.is_empty() {
        writer
            .write_event(Event::Empty(start))
            .map_err(to_write_err)?;
        return Ok(());
    }

    writer
        .write_event(Event::Start(start))
        .map_err(to_write_err)?;
    for property in &group.properties {
        if property.value.is_empty() {
            writer
                .write_event(Event::Empty(BytesStart::new(property.name.as_str())))
                .map_err(to_write_err)?;
        } else {
            writer
                .write_event(Event::Start(BytesStart::new(property.name.as_str())))
                .map_err(to_write_err)?;
            writer
                .write_event(Event::Text(BytesText::new(property.value.as_str())))
                .map_err(to_write_err)?;
            writer
                .write_event(Event::End(BytesEnd::new(property.name.as_str())))
                .map_err(to_write_err)?;
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new("PropertyGroup")))
        .map_err(to_write_err)?;
    Ok(())
}

fn write_item_group(
    writer: &mut Writer<Vec<u8>>,
    group: &ItemGroup,
) -> Result<(), ProjectXmlError> {
    let mut start = BytesStart::new("ItemGroup");
    if let Some(condition) = &group.condition {
        start.push_attribute(("Condition", condition.as_str()));
    }

    if group.items.is_empty() {
        writer
            .write_event(Event::Empty(start))
            .map_err(to_write_err)?;
        return Ok(());
    }

    writer
        .write_event(Event::Start(start))
        .map_err(to_write_err)?;
    for item in &group.items {
        let mut elem = BytesStart::new(item.item_type.as_str());
        if let Some(include) = &item.include {
            elem.push_attribute(("Include", include.as_str()));
        }
        if let Some(update) = &item.update {
            elem.push_attribute(("Update", update.as_str()));
        }
        if let Some(remove) = &item.remove {
            elem.push_attribute(("Remove", remove.as_str()));
        }

        if item.metadata.is_empty() {
            writer
                .write_event(Event::Empty(elem))
                .map_err(to_write_err)?;
        } else {
            writer
                .write_event(Event::Start(elem))
                .map_err(to_write_err)?;
            for (name, value) in &item.metadata {
                writer
                    .write_event(Event::Start(BytesStart::new(name.as_str())))
                    .map_err(to_write_err)?;
                writer
                    .write_event(Event::Text(BytesText::new(value.as_str())))
                    .map_err(to_write_err)?;
                writer
                    .write_event(Event::End(BytesEnd::new(name.as_str())))
                    .map_err(to_write_err)?;
            }
            writer
                .write_event(Event::End(BytesEnd::new(item.item_type.as_str())))
                .map_err(to_write_err)?;
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new("ItemGroup")))
        .map_err(to_write_err)?;
    Ok(())
}

fn write_import(writer: &mut Writer<Vec<u8>>, import: &Import) -> Result<(), ProjectXmlError> {
    let mut elem = BytesStart::new("Import");
    elem.push_attribute(("Project", import.project.as_str()));
    if let Some(condition) = &import.condition {
        elem.push_attribute(("Condition", condition.as_str()));
    }
    if let Some(label) = &import.label {
        elem.push_attribute(("Label", label.as_str()));
    }
    writer
        .write_event(Event::Empty(elem))
        .map_err(to_write_err)
}
