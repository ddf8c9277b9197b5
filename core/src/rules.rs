//! Domain knowledge tables for the rewrite engine.
//!
//! Everything the converter "knows" about the build system lives here:
//! which imports are part of the stock legacy boilerplate, which
//! properties and items the SDK supplies implicitly, default property
//! values per configuration, framework moniker mapping, and the package
//! deny/fallback lists.

use crate::configuration::Configuration;
use crate::style::ProjectStyle;

/// SDK identifiers, by project flavor.
pub const SDK_DEFAULT: &str = "Microsoft.NET.Sdk";
pub const SDK_WINDOWS_DESKTOP: &str = "Microsoft.NET.Sdk.WindowsDesktop";
pub const SDK_WEB: &str = "Microsoft.NET.Sdk.Web";

pub fn sdk_for_style(style: ProjectStyle, uses_wpf: bool, uses_winforms: bool) -> &'static str {
    match style {
        ProjectStyle::WindowsDesktop => SDK_WINDOWS_DESKTOP,
        ProjectStyle::Web => SDK_WEB,
        _ if uses_wpf || uses_winforms => SDK_WINDOWS_DESKTOP,
        _ => SDK_DEFAULT,
    }
}

/// Imports that belong to the stock legacy project boilerplate. A project
/// whose imports all resolve to this list (by file name) is a candidate
/// for conversion.
pub const RECOGNIZED_IMPORTS: &[&str] = &[
    "Microsoft.Common.props",
    "Microsoft.CSharp.targets",
    "Microsoft.VisualBasic.targets",
    "Microsoft.FSharp.Targets",
    "Microsoft.Portable.CSharp.targets",
    "Microsoft.WebApplication.targets",
    "Microsoft.TestTools.targets",
    "Xamarin.Android.CSharp.targets",
    "Xamarin.iOS.CSharp.targets",
];

pub const WEB_APPLICATION_TARGETS: &str = "Microsoft.WebApplication.targets";
pub const TEST_TOOLS_TARGETS: &str = "Microsoft.TestTools.targets";
pub const XAMARIN_ANDROID_TARGETS: &str = "Xamarin.Android.CSharp.targets";
pub const XAMARIN_IOS_TARGETS: &str = "Xamarin.iOS.CSharp.targets";

/// References that imply WPF.
pub const WPF_REFERENCES: &[&str] = &["PresentationCore", "PresentationFramework", "WindowsBase"];

/// References that imply Windows Forms.
pub const WINFORMS_REFERENCES: &[&str] = &["System.Windows.Forms"];

/// References that mark an MSTest project.
pub const MSTEST_REFERENCES: &[&str] = &[
    "Microsoft.VisualStudio.QualityTools.UnitTestFramework",
    "Microsoft.VisualStudio.TestPlatform.TestFramework",
];

/// Reference that marks a System.Web project.
pub const WEB_REFERENCE: &str = "System.Web";

/// Properties that never carry meaning in an SDK-style project, whatever
/// their value. Deleted unconditionally.
pub const NEVER_NEEDED_PROPERTIES: &[&str] = &[
    "ProjectGuid",
    "ProjectTypeGuids",
    "TargetFrameworkVersion",
    "TargetFrameworkProfile",
    "FileAlignment",
    "SchemaVersion",
    "ProductVersion",
    "OldToolsVersion",
    "VisualStudioVersion",
    "VSToolsPath",
    "FileUpgradeFlags",
    "UpgradeBackupLocation",
];

/// Properties the rewrite passes must never remove, even when a sloppy
/// rule table would classify them as defaulted.
pub const PROTECTED_PROPERTIES: &[&str] = &["TargetFramework", "UseWPF", "UseWindowsForms"];

/// Assembly references the SDK injects implicitly.
pub const IMPLICIT_FRAMEWORK_REFERENCES: &[&str] = &[
    "mscorlib",
    "System",
    "System.Core",
    "System.Data",
    "System.Drawing",
    "System.IO.Compression.FileSystem",
    "System.Numerics",
    "System.Runtime.Serialization",
    "System.Xml",
    "System.Xml.Linq",
    "Microsoft.CSharp",
];

/// Generated files a desktop template carries explicitly but the SDK
/// globs pick up on its own (compared against include tails).
pub const DESKTOP_GENERATED_FILES: &[&str] = &[
    "Properties\\AssemblyInfo.cs",
    "Properties\\Resources.Designer.cs",
    "Properties\\Settings.Designer.cs",
];

/// Packages that must never survive conversion.
pub const DENIED_PACKAGES: &[&str] = &[
    "Microsoft.Net.Compilers",
    "Microsoft.CodeDom.Providers.DotNetCompilerPlatform",
    "NETStandard.Library",
];

/// Offline version table used when no remote source answers.
pub const FALLBACK_PACKAGE_VERSIONS: &[(&str, &str)] = &[
    ("Newtonsoft.Json", "13.0.3"),
    ("MSTest.TestAdapter", "3.2.0"),
    ("MSTest.TestFramework", "3.2.0"),
    ("Microsoft.NET.Test.Sdk", "17.9.0"),
    ("System.ValueTuple", "4.5.0"),
];

pub fn fallback_package_version(id: &str) -> Option<&'static str> {
    FALLBACK_PACKAGE_VERSIONS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(id))
        .map(|(_, version)| *version)
}

/// True when the target framework already ships the package's surface,
/// making the reference redundant.
pub fn package_satisfied_by_tfm(id: &str, tfm: &str) -> bool {
    if !id.eq_ignore_ascii_case("System.ValueTuple") {
        return false;
    }
    let tfm = tfm.to_ascii_lowercase();
    if let Some(rest) = tfm.strip_prefix("netstandard") {
        return version_at_least(rest, 2, 0);
    }
    if tfm.starts_with("netcoreapp") {
        return true;
    }
    if let Some(rest) = tfm.strip_prefix("net") {
        if rest.contains('.') {
            // net5.0 and later
            return true;
        }
        // classic monikers: net47, net471, net48...
        if let Ok(n) = rest.parse::<u32>() {
            return n >= 47 && n < 100 || n >= 470;
        }
    }
    false
}

fn version_at_least(text: &str, major: u32, minor: u32) -> bool {
    let mut parts = text.split('.');
    let got_major: u32 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    let got_minor: u32 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    (got_major, got_minor) >= (major, minor)
}

/// Maps a legacy `TargetFrameworkVersion` to a short framework moniker.
pub fn tfm_from_framework_version(version: &str) -> Option<String> {
    let digits: String = version
        .trim()
        .trim_start_matches(['v', 'V'])
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return None;
    }
    Some(format!("net{digits}"))
}

/// Properties the SDK defines implicitly, some sensitive to the active
/// configuration. Legacy templates spell these values out; when the
/// legacy value matches, the property can vanish.
pub fn sdk_default_properties(config: &Configuration, project_name: &str) -> Vec<(String, String)> {
    let configuration = config.value_of("Configuration").unwrap_or("Debug");
    let is_debug = configuration.eq_ignore_ascii_case("Debug");

    let mut defaults: Vec<(String, String)> = vec![
        ("OutputPath".into(), format!("bin\\{configuration}\\")),
        ("AssemblyName".into(), project_name.to_string()),
        ("RootNamespace".into(), project_name.to_string()),
        ("PlatformTarget".into(), "AnyCPU".into()),
        ("FileAlignment".into(), "512".into()),
        ("Deterministic".into(), "true".into()),
        ("ErrorReport".into(), "prompt".into()),
        ("WarningLevel".into(), "4".into()),
        ("AutoGenerateBindingRedirects".into(), "true".into()),
        ("Prefer32Bit".into(), "false".into()),
        ("AllowUnsafeBlocks".into(), "false".into()),
    ];

    if is_debug {
        defaults.extend([
            ("DebugSymbols".into(), "true".into()),
            ("DebugType".into(), "full".into()),
            ("Optimize".into(), "false".into()),
            ("DefineConstants".into(), "DEBUG;TRACE".into()),
        ]);
    } else {
        defaults.extend([
            ("DebugType".into(), "pdbonly".into()),
            ("Optimize".into(), "true".into()),
            ("DefineConstants".into(), "TRACE".into()),
        ]);
    }

    defaults
}

pub fn is_never_needed_property(name: &str) -> bool {
    NEVER_NEEDED_PROPERTIES
        .iter()
        .any(|p| p.eq_ignore_ascii_case(name))
}

pub fn is_protected_property(name: &str) -> bool {
    PROTECTED_PROPERTIES
        .iter()
        .any(|p| p.eq_ignore_ascii_case(name))
}

pub fn is_implicit_framework_reference(simple_name: &str) -> bool {
    IMPLICIT_FRAMEWORK_REFERENCES
        .iter()
        .any(|r| r.eq_ignore_ascii_case(simple_name))
}

pub fn is_denied_package(id: &str) -> bool {
    DENIED_PACKAGES.iter().any(|p| p.eq_ignore_ascii_case(id))
}

/// Structural defaults: values the legacy template spells out that the SDK
/// supplies on its own. Config-sensitive entries resolve against the owning
/// group's configuration; an unconditioned group resolves to Debug, the same
/// fallback [`sdk_default_properties`] uses.
pub fn is_structural_default(
    name: &str,
    value: &str,
    project_name: &str,
    config: &Configuration,
) -> bool {
    let configuration = config.value_of("Configuration").unwrap_or("Debug");
    let is_debug = configuration.eq_ignore_ascii_case("Debug");
    match name.to_ascii_lowercase().as_str() {
        "assemblyname" | "rootnamespace" => value.eq_ignore_ascii_case(project_name),
        "configuration" => value.eq_ignore_ascii_case("Debug"),
        "platform" | "platformtarget" => value.eq_ignore_ascii_case("AnyCPU"),
        "debugsymbols" => is_debug && value.eq_ignore_ascii_case("true"),
        "debugtype" => value.eq_ignore_ascii_case(if is_debug { "full" } else { "pdbonly" }),
        "defineconstants" => {
            value.eq_ignore_ascii_case(if is_debug { "DEBUG;TRACE" } else { "TRACE" })
        }
        "outputpath" => {
            normalize_include(value) == normalize_include(&format!("bin\\{configuration}\\"))
        }
        "documentationfile" => {
            normalize_include(value)
                == normalize_include(&format!("bin\\{configuration}\\{project_name}.xml"))
        }
        _ => false,
    }
}

/// Normalizes an include path for comparison (slash direction and case).
pub fn normalize_include(include: &str) -> String {
    include.replace('/', "\\").to_ascii_lowercase()
}

/// True when the hint path points into a `packages\` restore folder,
/// marking the reference as package-supplied rather than framework.
pub fn is_package_hint_path(hint_path: &str) -> bool {
    let normalized = normalize_include(hint_path);
    normalized.starts_with("packages\\") || normalized.contains("\\packages\\")
}

/// True when an import was injected by a package restore (props/targets
/// under the packages folder). They disappear with `packages.config`.
pub fn is_package_injected_import(project: &str) -> bool {
    let normalized = normalize_include(project);
    (normalized.starts_with("packages\\") || normalized.contains("\\packages\\"))
        && (normalized.ends_with(".props") || normalized.ends_with(".targets"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tfm_mapping() {
        assert_eq!(tfm_from_framework_version("v4.7.2").as_deref(), Some("net472"));
        assert_eq!(tfm_from_framework_version("v4.8").as_deref(), Some("net48"));
        assert_eq!(tfm_from_framework_version("v3.5").as_deref(), Some("net35"));
        assert_eq!(tfm_from_framework_version(""), None);
        assert_eq!(tfm_from_framework_version("vNext"), None);
    }

    #[test]
    fn value_tuple_satisfaction() {
        assert!(package_satisfied_by_tfm("System.ValueTuple", "net472"));
        assert!(package_satisfied_by_tfm("System.ValueTuple", "net48"));
        assert!(package_satisfied_by_tfm("System.ValueTuple", "netstandard2.0"));
        assert!(package_satisfied_by_tfm("System.ValueTuple", "net6.0"));
        assert!(!package_satisfied_by_tfm("System.ValueTuple", "net462"));
        assert!(!package_satisfied_by_tfm("Newtonsoft.Json", "net472"));
    }

    #[test]
    fn define_constants_defaults_are_config_sensitive() {
        let debug = Configuration::from_pairs(&[("Configuration", "Debug")]);
        let release = Configuration::from_pairs(&[("Configuration", "Release")]);
        let debug_defaults = sdk_default_properties(&debug, "App");
        let release_defaults = sdk_default_properties(&release, "App");

        let find = |defaults: &[(String, String)], name: &str| {
            defaults
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone())
        };
        assert_eq!(find(&debug_defaults, "DefineConstants").as_deref(), Some("DEBUG;TRACE"));
        assert_eq!(find(&release_defaults, "DefineConstants").as_deref(), Some("TRACE"));
        assert_eq!(find(&debug_defaults, "Optimize").as_deref(), Some("false"));
        assert_eq!(find(&release_defaults, "Optimize").as_deref(), Some("true"));
    }

    #[test]
    fn output_path_pattern() {
        let release = Configuration::from_pairs(&[("Configuration", "Release")]);
        let defaults = sdk_default_properties(&release, "App");
        assert!(defaults
            .iter()
            .any(|(n, v)| n == "OutputPath" && v == "bin\\Release\\"));
    }

    #[test]
    fn project_name_defaults() {
        let config = Configuration::empty();
        assert!(is_structural_default("AssemblyName", "MyApp", "MyApp", &config));
        assert!(is_structural_default("RootNamespace", "myapp", "MyApp", &config));
        assert!(!is_structural_default("AssemblyName", "Other", "MyApp", &config));
    }

    #[test]
    fn build_setting_defaults_follow_the_group_configuration() {
        let debug =
            Configuration::parse("'$(Configuration)|$(Platform)'=='Debug|AnyCPU'").unwrap();
        let release =
            Configuration::parse("'$(Configuration)|$(Platform)'=='Release|AnyCPU'").unwrap();

        assert!(is_structural_default("DebugType", "full", "App", &debug));
        assert!(!is_structural_default("DebugType", "full", "App", &release));
        assert!(is_structural_default("DebugType", "pdbonly", "App", &release));
        assert!(is_structural_default("DefineConstants", "DEBUG;TRACE", "App", &debug));
        assert!(is_structural_default("DefineConstants", "TRACE", "App", &release));
        assert!(is_structural_default("OutputPath", "bin\\Release\\", "App", &release));
        assert!(!is_structural_default("OutputPath", "bin\\Release\\", "App", &debug));
        assert!(is_structural_default("DebugSymbols", "true", "App", &debug));
        assert!(!is_structural_default("DebugSymbols", "true", "App", &release));
    }

    #[test]
    fn platform_target_and_documentation_file_defaults() {
        let debug =
            Configuration::parse("'$(Configuration)|$(Platform)'=='Debug|AnyCPU'").unwrap();
        assert!(is_structural_default("PlatformTarget", "AnyCPU", "App", &debug));
        assert!(!is_structural_default("PlatformTarget", "x86", "App", &debug));
        assert!(is_structural_default(
            "DocumentationFile",
            "bin\\Debug\\App.xml",
            "App",
            &debug
        ));
        assert!(!is_structural_default(
            "DocumentationFile",
            "docs\\Api.xml",
            "App",
            &debug
        ));
        // the unconditioned bucket resolves to Debug
        assert!(is_structural_default(
            "DocumentationFile",
            "bin/Debug/App.xml",
            "App",
            &Configuration::empty()
        ));
    }

    #[test]
    fn package_injected_import_detection() {
        assert!(is_package_injected_import(
            "..\\packages\\Fody.6.0.0\\build\\Fody.targets"
        ));
        assert!(is_package_injected_import("packages/NUnit/build/NUnit.props"));
        assert!(!is_package_injected_import(
            "$(MSBuildToolsPath)\\Microsoft.CSharp.targets"
        ));
    }
}
