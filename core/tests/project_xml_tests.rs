mod common;

use common::{doc_from_xml, legacy_library_xml};
use sdkify::document::GroupKind;
use sdkify::{parse_project, write_project, ProjectXmlError};

#[test]
fn parses_legacy_document_shape() {
    let doc = doc_from_xml(&legacy_library_xml(), "LegacyLib");
    assert_eq!(doc.tools_version.as_deref(), Some("15.0"));
    assert_eq!(doc.default_targets.as_deref(), Some("Build"));
    assert!(doc.sdk.is_none());
    assert_eq!(doc.imports().count(), 2);
    assert_eq!(doc.property_groups().count(), 1);
    assert_eq!(doc.item_groups().count(), 2);
    assert_eq!(
        doc.find_property("OutputType").map(|p| p.value.as_str()),
        Some("Library")
    );
}

#[test]
fn item_metadata_and_attributes_survive_parsing() {
    let xml = r#"<Project>
  <ItemGroup>
    <Reference Include="Newtonsoft.Json, Version=12.0.0.0">
      <HintPath>..\packages\Newtonsoft.Json.12.0.3\lib\net45\Newtonsoft.Json.dll</HintPath>
      <Private>True</Private>
    </Reference>
    <Compile Remove="Generated.cs" />
  </ItemGroup>
</Project>"#;
    let doc = parse_project(xml.as_bytes(), "App").unwrap();
    let (_, group) = doc.item_groups().next().unwrap();
    assert_eq!(group.items.len(), 2);
    assert_eq!(
        group.items[0].metadata_value("HintPath"),
        Some("..\\packages\\Newtonsoft.Json.12.0.3\\lib\\net45\\Newtonsoft.Json.dll")
    );
    assert_eq!(group.items[1].remove.as_deref(), Some("Generated.cs"));
    assert!(group.items[1].include.is_none());
}

#[test]
fn round_trips_through_write_and_parse() {
    let doc = doc_from_xml(&legacy_library_xml(), "LegacyLib");
    let written = write_project(&doc).unwrap();
    let reparsed = parse_project(written.as_bytes(), "LegacyLib").unwrap();

    assert_eq!(reparsed.imports().count(), doc.imports().count());
    assert_eq!(
        reparsed.property_groups().count(),
        doc.property_groups().count()
    );
    let original: Vec<_> = doc.property_groups().map(|(_, g)| g.clone()).collect();
    let round_tripped: Vec<_> = reparsed.property_groups().map(|(_, g)| g.clone()).collect();
    assert_eq!(original, round_tripped);
}

#[test]
fn unknown_top_level_elements_are_preserved_verbatim() {
    let xml = r#"<Project>
  <PropertyGroup>
    <OutputType>Exe</OutputType>
  </PropertyGroup>
  <Target Name="AfterBuild">
    <Message Text="done" Importance="high" />
  </Target>
</Project>"#;
    let doc = parse_project(xml.as_bytes(), "App").unwrap();
    let raw = doc
        .group_ids()
        .into_iter()
        .find_map(|id| match doc.group(id) {
            Some(GroupKind::Raw(raw)) => Some(raw.clone()),
            _ => None,
        })
        .expect("custom target should be captured");
    assert!(raw.contains("Target"));
    assert!(raw.contains("AfterBuild"));
    assert!(raw.contains("Message"));

    let written = write_project(&doc).unwrap();
    assert!(written.contains("AfterBuild"));
    assert!(written.contains(r#"Importance="high""#));
}

#[test]
fn sdk_attribute_wins_over_legacy_root_attributes() {
    let mut doc = doc_from_xml(&legacy_library_xml(), "LegacyLib");
    doc.sdk = Some("Microsoft.NET.Sdk".to_string());
    doc.tools_version = None;
    doc.default_targets = None;
    let written = write_project(&doc).unwrap();
    assert!(written.starts_with(r#"<Project Sdk="Microsoft.NET.Sdk">"#));
    assert!(!written.contains("xmlns"));
    // the imports still mention $(MSBuildToolsVersion); only the root
    // attribute must be gone
    assert!(!written.contains(r#"ToolsVersion=""#));
}

#[test]
fn non_project_root_is_rejected() {
    let err = parse_project(b"<Workbook><Sheet /></Workbook>", "App").unwrap_err();
    assert!(matches!(err, ProjectXmlError::NotAProject));
    assert_eq!(err.code(), "SDKIFY_XML_002");
}

#[test]
fn malformed_xml_is_a_parse_error() {
    let err = parse_project(b"<Project><PropertyGroup>", "App").unwrap_err();
    assert!(matches!(err, ProjectXmlError::Xml(_)));
}
