//! packages.config migration support.
//!
//! Parses the legacy `packages.config` manifest and resolves versions for
//! the `PackageReference` items the converter emits. Version lookup is
//! behind a trait so a remote feed can be plugged in; the default path is
//! the offline fallback table.

use std::cell::RefCell;

use quick_xml::events::Event;
use quick_xml::Reader;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::error_codes;
use crate::rules;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PackagesError {
    #[error("[SDKIFY_PKG_001] packages.config parse error: {0}. Suggestion: check that the file is well-formed XML.")]
    Xml(String),
    #[error("[SDKIFY_PKG_002] package entry is missing an id attribute.")]
    MissingId,
}

impl PackagesError {
    pub fn code(&self) -> &'static str {
        match self {
            PackagesError::Xml(_) => error_codes::PKG_XML,
            PackagesError::MissingId => error_codes::PKG_MISSING_ID,
        }
    }
}

fn to_xml_err(e: impl std::fmt::Display) -> PackagesError {
    PackagesError::Xml(e.to_string())
}

/// One entry of a packages.config manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageEntry {
    pub id: String,
    pub version: String,
    /// `developmentDependency="true"` entries become PrivateAssets=all.
    pub development_dependency: bool,
}

/// Parses a packages.config document. Unknown elements are ignored.
pub fn parse_packages_config(xml: &[u8]) -> Result<Vec<PackageEntry>, PackagesError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut entries = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.name().as_ref() == b"package" => {
                let mut id = None;
                let mut version = String::new();
                let mut development_dependency = false;
                for attr in e.attributes() {
                    let attr = attr.map_err(to_xml_err)?;
                    let value = attr.unescape_value().map_err(to_xml_err)?.into_owned();
                    match attr.key.as_ref() {
                        b"id" => id = Some(value),
                        b"version" => version = value,
                        b"developmentDependency" => {
                            development_dependency = value.eq_ignore_ascii_case("true");
                        }
                        _ => {}
                    }
                }
                entries.push(PackageEntry {
                    id: id.ok_or(PackagesError::MissingId)?,
                    version,
                    development_dependency,
                });
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(to_xml_err(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(entries)
}

/// Answers "which version should the PackageReference pin" for a package
/// id. `None` means the source does not know the package.
pub trait PackageVersionSource {
    fn resolve(&self, id: &str) -> Option<String>;
}

/// The offline table from [`rules`]. Always available, never stale in a
/// way that breaks conversion (the manifest version wins when present).
#[derive(Debug, Default)]
pub struct StaticVersionTable;

impl PackageVersionSource for StaticVersionTable {
    fn resolve(&self, id: &str) -> Option<String> {
        rules::fallback_package_version(id).map(str::to_string)
    }
}

/// Memoizes another source, including its misses.
pub struct CachedVersionSource<S> {
    inner: S,
    cache: RefCell<FxHashMap<String, Option<String>>>,
}

impl<S: PackageVersionSource> CachedVersionSource<S> {
    pub fn new(inner: S) -> Self {
        CachedVersionSource {
            inner,
            cache: RefCell::new(FxHashMap::default()),
        }
    }
}

impl<S: PackageVersionSource> PackageVersionSource for CachedVersionSource<S> {
    fn resolve(&self, id: &str) -> Option<String> {
        let key = id.to_ascii_lowercase();
        if let Some(cached) = self.cache.borrow().get(&key) {
            return cached.clone();
        }
        let resolved = self.inner.resolve(id);
        self.cache.borrow_mut().insert(key, resolved.clone());
        resolved
    }
}
