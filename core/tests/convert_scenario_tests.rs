mod common;

use common::{doc_from_xml, legacy_library_xml, legacy_wpf_xml, GlobbingEvaluator};
use sdkify::evaluate::EvaluatedItem;
use sdkify::{
    parse_packages_config, ConvertError, PackagesManifest, ProjectConverter, ProjectStyle,
    RewriteOp, SimpleEvaluator, StaticVersionTable,
};

fn converter<'a>(
    evaluator: &'a SimpleEvaluator,
    versions: &'a StaticVersionTable,
) -> ProjectConverter<'a> {
    ProjectConverter::new(evaluator, versions)
}

#[test]
fn scenario_a_tuple_reference_is_removed_under_net472() {
    let xml = r#"<Project ToolsVersion="15.0" xmlns="http://schemas.microsoft.com/developer/msbuild/2003">
  <Import Project="$(MSBuildExtensionsPath)\$(MSBuildToolsVersion)\Microsoft.Common.props" />
  <PropertyGroup>
    <OutputType>Library</OutputType>
    <TargetFrameworkVersion>v4.7.2</TargetFrameworkVersion>
  </PropertyGroup>
  <ItemGroup>
    <Reference Include="System" />
    <Reference Include="System.ValueTuple, Version=4.0.3.0, Culture=neutral">
      <HintPath>..\packages\System.ValueTuple.4.5.0\lib\net461\System.ValueTuple.dll</HintPath>
    </Reference>
    <Reference Include="ThirdParty.Widgets" />
  </ItemGroup>
  <Import Project="$(MSBuildToolsPath)\Microsoft.CSharp.targets" />
</Project>"#;
    let doc = doc_from_xml(xml, "TupleLib");
    let evaluator = SimpleEvaluator::new();
    let versions = StaticVersionTable;
    let outcome = converter(&evaluator, &versions).convert(&doc, None).unwrap();

    assert_eq!(outcome.target_framework, "net472");
    let converted = &outcome.document;
    assert!(!converted
        .item_groups()
        .any(|(_, g)| g.items.iter().any(|i| i
            .include
            .as_deref()
            .is_some_and(|inc| inc.starts_with("System.ValueTuple")))));
    // non-default third-party reference survives
    assert!(converted.has_item_include("Reference", "ThirdParty.Widgets"));
    assert!(outcome.report.ops.iter().any(|op| matches!(
        op,
        RewriteOp::ItemRemoved { item_type, include }
            if item_type == "Reference" && include.starts_with("System.ValueTuple")
    )));
}

#[test]
fn scenario_b_manifest_becomes_package_references() {
    let xml = r#"<Project>
  <Import Project="$(MSBuildExtensionsPath)\Microsoft.Common.props" />
  <PropertyGroup>
    <OutputType>Library</OutputType>
    <TargetFrameworkVersion>v4.7.2</TargetFrameworkVersion>
  </PropertyGroup>
  <ItemGroup>
    <None Include="packages.config" />
  </ItemGroup>
  <Import Project="$(MSBuildToolsPath)\Microsoft.CSharp.targets" />
</Project>"#;
    let manifest_xml = br#"<packages>
  <package id="Newtonsoft.Json" version="12.0.3" targetFramework="net472" />
  <package id="System.ValueTuple" version="4.5.0" targetFramework="net472" />
  <package id="Microsoft.Net.Compilers" version="3.6.0" developmentDependency="true" />
</packages>"#;
    let manifest = PackagesManifest {
        path: "packages.config".to_string(),
        entries: parse_packages_config(manifest_xml).unwrap(),
    };

    let doc = doc_from_xml(xml, "JsonLib");
    let evaluator = SimpleEvaluator::new();
    let versions = StaticVersionTable;
    let outcome = converter(&evaluator, &versions)
        .convert(&doc, Some(&manifest))
        .unwrap();

    let converted = &outcome.document;
    assert!(converted.has_item_include("PackageReference", "Newtonsoft.Json"));
    let version = converted
        .item_groups()
        .flat_map(|(_, g)| g.items.iter())
        .find(|i| i.include.as_deref() == Some("Newtonsoft.Json"))
        .and_then(|i| i.metadata_value("Version").map(str::to_string));
    assert_eq!(version.as_deref(), Some("12.0.3"));

    // satisfied-by-TFM and deny-listed entries never become references
    assert!(!converted.has_item_include("PackageReference", "System.ValueTuple"));
    assert!(!converted.has_item_include("PackageReference", "Microsoft.Net.Compilers"));
    // the manifest item is gone and the file is flagged for deletion
    assert!(!converted.has_item_include("None", "packages.config"));
    let obsolete: Vec<_> = outcome.report.obsolete_files().collect();
    assert_eq!(obsolete, vec!["packages.config"]);
}

#[test]
fn scenario_c_wpf_project_gets_flag_and_loses_presentation_references() {
    let doc = doc_from_xml(&legacy_wpf_xml(), "WpfApp");
    let evaluator = SimpleEvaluator::new();
    let versions = StaticVersionTable;
    let outcome = converter(&evaluator, &versions).convert(&doc, None).unwrap();

    assert_eq!(outcome.style.style, ProjectStyle::WindowsDesktop);
    let converted = &outcome.document;
    assert_eq!(converted.sdk.as_deref(), Some("Microsoft.NET.Sdk.WindowsDesktop"));
    assert_eq!(
        converted.find_property("UseWPF").map(|p| p.value.as_str()),
        Some("true")
    );
    for reference in ["PresentationCore", "PresentationFramework", "WindowsBase"] {
        assert!(!converted.has_item_include("Reference", reference));
    }
    // the legacy assembly-info file stays explicit, generation is disabled
    assert_eq!(
        converted
            .find_property("GenerateAssemblyInfo")
            .map(|p| p.value.as_str()),
        Some("false")
    );
}

#[test]
fn scenario_d_identical_conditioned_groups_merge_into_top_level() {
    let xml = r#"<Project>
  <Import Project="$(MSBuildExtensionsPath)\Microsoft.Common.props" />
  <PropertyGroup>
    <OutputType>Library</OutputType>
    <TargetFrameworkVersion>v4.7.2</TargetFrameworkVersion>
  </PropertyGroup>
  <PropertyGroup Condition=" '$(Configuration)|$(Platform)' == 'Debug|AnyCPU' ">
    <LangVersion>latest</LangVersion>
  </PropertyGroup>
  <PropertyGroup Condition=" '$(Configuration)|$(Platform)' == 'Release|AnyCPU' ">
    <LangVersion>latest</LangVersion>
  </PropertyGroup>
  <Import Project="$(MSBuildToolsPath)\Microsoft.CSharp.targets" />
</Project>"#;
    let doc = doc_from_xml(xml, "MergeLib");
    let evaluator = SimpleEvaluator::new();
    let versions = StaticVersionTable;
    let outcome = converter(&evaluator, &versions).convert(&doc, None).unwrap();

    let converted = &outcome.document;
    assert_eq!(converted.property_groups().count(), 1);
    let (_, top) = converted.property_groups().next().unwrap();
    assert!(top.condition.is_none());
    let lang_versions = top
        .properties
        .iter()
        .filter(|p| p.name.eq_ignore_ascii_case("LangVersion"))
        .count();
    assert_eq!(lang_versions, 1);
    assert_eq!(
        top.property("LangVersion").map(|p| p.value.as_str()),
        Some("latest")
    );
}

#[test]
fn custom_style_refuses_before_mutation() {
    let xml = r#"<Project>
  <Import Project="..\build\Company.Custom.targets" />
  <PropertyGroup>
    <OutputType>Library</OutputType>
    <TargetFrameworkVersion>v4.7.2</TargetFrameworkVersion>
  </PropertyGroup>
</Project>"#;
    let doc = doc_from_xml(xml, "CustomLib");
    let evaluator = SimpleEvaluator::new();
    let versions = StaticVersionTable;
    let err = converter(&evaluator, &versions).convert(&doc, None).unwrap_err();
    assert!(matches!(err, ConvertError::UnsupportedStyle { .. }));
    assert_eq!(err.code(), "SDKIFY_CONV_001");
}

#[test]
fn never_needed_and_structural_defaults_are_pruned() {
    let doc = doc_from_xml(&legacy_library_xml(), "LegacyLib");
    let evaluator = SimpleEvaluator::new();
    let versions = StaticVersionTable;
    let outcome = converter(&evaluator, &versions).convert(&doc, None).unwrap();

    let converted = &outcome.document;
    for gone in [
        "ProjectGuid",
        "TargetFrameworkVersion",
        "FileAlignment",
        "Configuration",
        "Platform",
        "RootNamespace",
        "AssemblyName",
    ] {
        assert!(converted.find_property(gone).is_none(), "{gone} should be pruned");
    }
    assert_eq!(
        converted
            .find_property("TargetFramework")
            .map(|p| p.value.as_str()),
        Some("net472")
    );
    // Library is the SDK default output type
    assert!(converted.find_property("OutputType").is_none());
}

#[test]
fn default_build_settings_are_pruned_without_diff_support() {
    let xml = r#"<Project>
  <Import Project="$(MSBuildExtensionsPath)\Microsoft.Common.props" />
  <PropertyGroup>
    <OutputType>Library</OutputType>
    <TargetFrameworkVersion>v4.7.2</TargetFrameworkVersion>
    <PlatformTarget>AnyCPU</PlatformTarget>
    <DocumentationFile>bin\Debug\PlainLib.xml</DocumentationFile>
  </PropertyGroup>
  <PropertyGroup Condition=" '$(Configuration)|$(Platform)' == 'Release|AnyCPU' ">
    <DebugType>pdbonly</DebugType>
    <OutputPath>bin\Release\</OutputPath>
    <DefineConstants>TRACE</DefineConstants>
    <DocumentationFile>bin\Release\PlainLib.xml</DocumentationFile>
  </PropertyGroup>
  <Import Project="$(MSBuildToolsPath)\Microsoft.CSharp.targets" />
</Project>"#;
    let doc = doc_from_xml(xml, "PlainLib");
    let evaluator = SimpleEvaluator::new();
    let versions = StaticVersionTable;
    let outcome = converter(&evaluator, &versions).convert(&doc, None).unwrap();

    let converted = &outcome.document;
    for gone in [
        "PlatformTarget",
        "DocumentationFile",
        "DebugType",
        "OutputPath",
        "DefineConstants",
    ] {
        assert!(
            converted.find_property(gone).is_none(),
            "{gone} should be pruned"
        );
    }
}

#[test]
fn non_default_build_settings_survive_pruning() {
    let xml = r#"<Project>
  <Import Project="$(MSBuildExtensionsPath)\Microsoft.Common.props" />
  <PropertyGroup>
    <OutputType>Library</OutputType>
    <TargetFrameworkVersion>v4.7.2</TargetFrameworkVersion>
    <PlatformTarget>x86</PlatformTarget>
    <DocumentationFile>docs\Api.xml</DocumentationFile>
  </PropertyGroup>
  <Import Project="$(MSBuildToolsPath)\Microsoft.CSharp.targets" />
</Project>"#;
    let doc = doc_from_xml(xml, "PickyLib");
    let evaluator = SimpleEvaluator::new();
    let versions = StaticVersionTable;
    let outcome = converter(&evaluator, &versions).convert(&doc, None).unwrap();

    let converted = &outcome.document;
    assert_eq!(
        converted.find_property("PlatformTarget").map(|p| p.value.as_str()),
        Some("x86")
    );
    assert_eq!(
        converted
            .find_property("DocumentationFile")
            .map(|p| p.value.as_str()),
        Some("docs\\Api.xml")
    );
}

#[test]
fn assembly_info_generation_is_disabled_without_an_assembly_info_item() {
    // legacy_library_xml carries no Properties\AssemblyInfo.cs item; the
    // marker must be inserted anyway, since the legacy build never
    // auto-generated assembly attributes
    let doc = doc_from_xml(&legacy_library_xml(), "LegacyLib");
    let evaluator = SimpleEvaluator::new();
    let versions = StaticVersionTable;
    let outcome = converter(&evaluator, &versions).convert(&doc, None).unwrap();

    assert_eq!(
        outcome
            .document
            .find_property("GenerateAssemblyInfo")
            .map(|p| p.value.as_str()),
        Some("false")
    );
    assert!(outcome.report.ops.iter().any(|op| matches!(
        op,
        RewriteOp::PropertyAdded { name, value }
            if name == "GenerateAssemblyInfo" && value == "false"
    )));
}

#[test]
fn safety_unrecognized_state_is_never_deleted() {
    let xml = r#"<Project>
  <Import Project="$(MSBuildExtensionsPath)\Microsoft.Common.props" />
  <PropertyGroup>
    <OutputType>Exe</OutputType>
    <TargetFrameworkVersion>v4.7.2</TargetFrameworkVersion>
    <LangVersion>8.0</LangVersion>
    <NoWarn>CS1591</NoWarn>
  </PropertyGroup>
  <ItemGroup>
    <Content Include="data\seed.json">
      <CopyToOutputDirectory>PreserveNewest</CopyToOutputDirectory>
    </Content>
  </ItemGroup>
  <Import Project="$(MSBuildToolsPath)\Microsoft.CSharp.targets" />
</Project>"#;
    let doc = doc_from_xml(xml, "SafeApp");
    let evaluator = SimpleEvaluator::new();
    let versions = StaticVersionTable;
    let outcome = converter(&evaluator, &versions).convert(&doc, None).unwrap();

    let converted = &outcome.document;
    assert_eq!(
        converted.find_property("LangVersion").map(|p| p.value.as_str()),
        Some("8.0")
    );
    assert_eq!(
        converted.find_property("NoWarn").map(|p| p.value.as_str()),
        Some("CS1591")
    );
    assert!(converted.has_item_include("Content", "data\\seed.json"));
    // Exe is not the SDK default, so it must survive
    assert_eq!(
        converted.find_property("OutputType").map(|p| p.value.as_str()),
        Some("Exe")
    );
}

#[test]
fn unparseable_condition_leaves_group_untouched() {
    let xml = r#"<Project>
  <Import Project="$(MSBuildExtensionsPath)\Microsoft.Common.props" />
  <PropertyGroup>
    <OutputType>Library</OutputType>
    <TargetFrameworkVersion>v4.7.2</TargetFrameworkVersion>
  </PropertyGroup>
  <PropertyGroup Condition="Exists('local.props')">
    <ProjectGuid>{00000000-0000-0000-0000-000000000000}</ProjectGuid>
  </PropertyGroup>
  <Import Project="$(MSBuildToolsPath)\Microsoft.CSharp.targets" />
</Project>"#;
    let doc = doc_from_xml(xml, "OddApp");
    let evaluator = SimpleEvaluator::new();
    let versions = StaticVersionTable;
    let outcome = converter(&evaluator, &versions).convert(&doc, None).unwrap();

    // even a never-needed property survives when its group's condition is
    // not canonical; guessing would be worse than keeping it
    let kept = outcome
        .document
        .property_groups()
        .any(|(_, g)| g.condition.is_some() && g.property("ProjectGuid").is_some());
    assert!(kept);
}

#[test]
fn introduced_baseline_items_are_negated() {
    let xml = r#"<Project>
  <Import Project="$(MSBuildExtensionsPath)\Microsoft.Common.props" />
  <PropertyGroup>
    <OutputType>Library</OutputType>
    <TargetFrameworkVersion>v4.7.2</TargetFrameworkVersion>
  </PropertyGroup>
  <ItemGroup>
    <Compile Include="Lib.cs" />
  </ItemGroup>
  <Import Project="$(MSBuildToolsPath)\Microsoft.CSharp.targets" />
</Project>"#;
    let doc = doc_from_xml(xml, "GlobbedLib");
    let evaluator = GlobbingEvaluator::new(vec![
        EvaluatedItem::new("Compile", "Lib.cs"),
        EvaluatedItem::new("Compile", "Scratch.cs"),
    ]);
    let versions = StaticVersionTable;
    let outcome = ProjectConverter::new(&evaluator, &versions)
        .convert(&doc, None)
        .unwrap();

    let converted = &outcome.document;
    // the glob covers Lib.cs, so the explicit include goes away
    assert!(!converted.has_item_include("Compile", "Lib.cs"));
    // Scratch.cs was never in the original, so the glob must be suppressed
    assert!(converted.has_item_remove("Compile", "Scratch.cs"));
    assert!(outcome.report.ops.iter().any(|op| matches!(
        op,
        RewriteOp::ItemNegated { item_type, include }
            if item_type == "Compile" && include == "Scratch.cs"
    )));
}

#[test]
fn changed_items_become_metadata_only_updates() {
    let xml = r#"<Project>
  <Import Project="$(MSBuildExtensionsPath)\Microsoft.Common.props" />
  <PropertyGroup>
    <OutputType>Library</OutputType>
    <TargetFrameworkVersion>v4.7.2</TargetFrameworkVersion>
  </PropertyGroup>
  <ItemGroup>
    <Compile Include="Pinned.cs">
      <DependentUpon>Pinned.xaml</DependentUpon>
    </Compile>
  </ItemGroup>
  <Import Project="$(MSBuildToolsPath)\Microsoft.CSharp.targets" />
</Project>"#;
    let doc = doc_from_xml(xml, "UpdateLib");
    let evaluator = GlobbingEvaluator::new(vec![EvaluatedItem::new("Compile", "Pinned.cs")]);
    let versions = StaticVersionTable;
    let outcome = ProjectConverter::new(&evaluator, &versions)
        .convert(&doc, None)
        .unwrap();

    let updated = outcome
        .document
        .item_groups()
        .flat_map(|(_, g)| g.items.iter())
        .find(|i| i.update.as_deref() == Some("Pinned.cs"))
        .expect("changed item should become an update declaration");
    assert!(updated.include.is_none());
    assert_eq!(updated.metadata_value("DependentUpon"), Some("Pinned.xaml"));
}
