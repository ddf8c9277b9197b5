//! Project style classification.
//!
//! Decides whether a legacy project is stock enough to convert, and which
//! flavor of the SDK it maps to. Classification is conservative: any
//! import outside the recognized boilerplate makes the project `Custom`
//! and conversion refuses to touch it.

use serde::Serialize;

use crate::document::ProjectDocument;
use crate::evaluate::EvaluatedProject;
use crate::rules;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStyle {
    /// Stock class library / console project.
    Default,
    /// Stock project missing some of the usual imports (e.g. no
    /// Microsoft.Common.props). Converts like `Default`.
    DefaultSubset,
    /// WPF or Windows Forms.
    WindowsDesktop,
    /// System.Web application.
    Web,
    /// MSTest unit test project.
    MsTest,
    XamarinAndroid,
    XamarinIos,
    /// Imports outside the stock boilerplate; not converted.
    Custom,
}

impl ProjectStyle {
    pub fn is_supported(self) -> bool {
        !matches!(
            self,
            ProjectStyle::Custom | ProjectStyle::XamarinAndroid | ProjectStyle::XamarinIos
        )
    }

    pub fn is_desktop(self) -> bool {
        matches!(self, ProjectStyle::WindowsDesktop)
    }
}

impl std::fmt::Display for ProjectStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            ProjectStyle::Default => "default",
            ProjectStyle::DefaultSubset => "default (subset)",
            ProjectStyle::WindowsDesktop => "windows desktop",
            ProjectStyle::Web => "web",
            ProjectStyle::MsTest => "mstest",
            ProjectStyle::XamarinAndroid => "xamarin android",
            ProjectStyle::XamarinIos => "xamarin ios",
            ProjectStyle::Custom => "custom",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct StyleReport {
    pub style: ProjectStyle,
    pub uses_wpf: bool,
    pub uses_winforms: bool,
}

/// Classifies a project from its imports and evaluated references.
pub fn classify(doc: &ProjectDocument, evaluated: &EvaluatedProject) -> StyleReport {
    // A document already carrying an Sdk attribute is past conversion;
    // classify from the attribute so a re-run stays a no-op instead of
    // refusing over the now-absent imports.
    if let Some(sdk) = &doc.sdk {
        return classify_sdk_document(sdk, evaluated);
    }

    // The WPF signal requires the full reference set; a stray WindowsBase
    // reference alone does not make a desktop project.
    let uses_wpf = rules::WPF_REFERENCES
        .iter()
        .all(|r| evaluated.has_reference(r));
    let uses_winforms = rules::WINFORMS_REFERENCES
        .iter()
        .all(|r| evaluated.has_reference(r));

    // Shared-labelled imports and package-injected props/targets do not
    // count against the project: the former is a linked-files idiom, the
    // latter disappears with packages.config.
    let considered: Vec<&crate::document::Import> = doc
        .imports()
        .map(|(_, import)| import)
        .filter(|import| {
            import.label.as_deref() != Some("Shared")
                && !rules::is_package_injected_import(&import.project)
        })
        .collect();

    if considered.is_empty() {
        return StyleReport {
            style: ProjectStyle::Custom,
            uses_wpf,
            uses_winforms,
        };
    }

    let all_recognized = considered.iter().all(|import| {
        let name = import.file_name();
        rules::RECOGNIZED_IMPORTS
            .iter()
            .any(|known| known.eq_ignore_ascii_case(name))
    });

    let style = if all_recognized {
        refine_recognized(&considered, evaluated, uses_wpf, uses_winforms)
    } else {
        ProjectStyle::Custom
    };

    StyleReport {
        style,
        uses_wpf,
        uses_winforms,
    }
}

fn classify_sdk_document(sdk: &str, evaluated: &EvaluatedProject) -> StyleReport {
    let truthy = |name: &str| {
        evaluated
            .property_value(name)
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    };
    let uses_wpf = truthy("UseWPF");
    let uses_winforms = truthy("UseWindowsForms");
    let style = if sdk.eq_ignore_ascii_case(rules::SDK_WINDOWS_DESKTOP) {
        ProjectStyle::WindowsDesktop
    } else if sdk.eq_ignore_ascii_case(rules::SDK_WEB) {
        ProjectStyle::Web
    } else {
        ProjectStyle::Default
    };
    StyleReport {
        style,
        uses_wpf,
        uses_winforms,
    }
}

fn refine_recognized(
    imports: &[&crate::document::Import],
    evaluated: &EvaluatedProject,
    uses_wpf: bool,
    uses_winforms: bool,
) -> ProjectStyle {
    let has_import = |target: &str| {
        imports
            .iter()
            .any(|import| import.file_name().eq_ignore_ascii_case(target))
    };

    if has_import(rules::XAMARIN_ANDROID_TARGETS) {
        return ProjectStyle::XamarinAndroid;
    }
    if has_import(rules::XAMARIN_IOS_TARGETS) {
        return ProjectStyle::XamarinIos;
    }
    if uses_wpf || uses_winforms {
        return ProjectStyle::WindowsDesktop;
    }
    if rules::MSTEST_REFERENCES
        .iter()
        .any(|r| evaluated.has_reference(r))
        || has_import(rules::TEST_TOOLS_TARGETS)
    {
        return ProjectStyle::MsTest;
    }
    if has_import(rules::WEB_APPLICATION_TARGETS) || evaluated.has_reference(rules::WEB_REFERENCE) {
        return ProjectStyle::Web;
    }
    if imports.len() == 1 {
        return ProjectStyle::DefaultSubset;
    }
    ProjectStyle::Default
}
