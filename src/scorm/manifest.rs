use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::collections::HashMap;
use std::io::{Cursor, Read};

use super::ScormVersion;
use crate::error::ManifestError;

const MANIFEST_FILE: &str = "imsmanifest.xml";

// path-segment encode set (RFC 3986 pchar minus what browsers choke on)
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScoEntry {
    pub identifier: String,
    pub href: String,
    pub parameters: Option<String>,
    pub scorm_type: Option<String>,
}

/// What the player needs from a package's `imsmanifest.xml`.
#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScormPackage {
    pub title: Option<String>,
    pub version: ScormVersion,
    /// Directory of the manifest inside the archive, `""` or ending in `/`.
    pub root: String,
    pub default_launch: String,
    pub scos: Vec<ScoEntry>,
}

#[derive(Default, Debug, Clone)]
struct ResourceInfo {
    href: Option<String>,
    files: Vec<String>,
    scorm_type: Option<String>,
}

impl ResourceInfo {
    fn launch_href(&self) -> Option<&str> {
        self.href.as_deref().or(self.files.first().map(String::as_str))
    }
}

struct ItemRef {
    identifier: String,
    identifierref: String,
    parameters: Option<String>,
    in_default_org: bool,
}

/// Parser state while walking the manifest events.
#[derive(Default)]
struct Walk {
    resources: HashMap<String, ResourceInfo>,
    resource_order: Vec<String>,
    items: Vec<ItemRef>,
    current_resource: Option<String>,
    default_org: Option<String>,
    current_org: Option<String>,
    seen_org: bool,
    item_depth: usize,
    in_title: bool,
    in_schema_version: bool,
    title: Option<String>,
    schema_version: Option<String>,
    namespace_hint: Option<ScormVersion>,
}

impl Walk {
    fn open(&mut self, e: &BytesStart<'_>, empty: bool) {
        match e.local_name().as_ref() {
            b"manifest" => self.namespace_hint = namespace_version(e),
            b"organizations" => self.default_org = attr(e, "default"),
            b"organization" => {
                // without a default attribute the first organization wins
                let id = attr(e, "identifier");
                if self.default_org.is_none() && !self.seen_org {
                    self.default_org = id.clone();
                }
                self.seen_org = true;
                self.current_org = id;
            }
            b"item" => {
                if let (Some(identifier), Some(identifierref)) =
                    (attr(e, "identifier"), attr(e, "identifierref"))
                {
                    self.items.push(ItemRef {
                        identifier,
                        identifierref,
                        parameters: attr(e, "parameters"),
                        in_default_org: self.in_default_org(),
                    });
                }
                if !empty {
                    self.item_depth += 1;
                }
            }
            b"title" if !empty && self.item_depth == 0 && self.in_default_org() => {
                self.in_title = self.title.is_none();
            }
            b"schemaversion" if !empty => self.in_schema_version = true,
            b"resource" => {
                if let Some(id) = attr(e, "identifier") {
                    let info = self.resources.entry(id.clone()).or_default();
                    if let Some(href) = attr(e, "href") {
                        info.href = Some(href);
                    }
                    if let Some(kind) = attr(e, "scormtype") {
                        info.scorm_type = Some(kind);
                    }
                    if !self.resource_order.contains(&id) {
                        self.resource_order.push(id.clone());
                    }
                    if !empty {
                        self.current_resource = Some(id);
                    }
                }
            }
            b"file" => {
                if let (Some(res), Some(href)) = (self.current_resource.as_ref(), attr(e, "href")) {
                    self.resources.entry(res.clone()).or_default().files.push(href);
                }
            }
            _ => {}
        }
    }

    fn in_default_org(&self) -> bool {
        self.current_org.is_some() && self.current_org == self.default_org
    }

    fn close(&mut self, local: &[u8]) {
        match local {
            b"organization" => self.current_org = None,
            b"item" => self.item_depth = self.item_depth.saturating_sub(1),
            b"title" => self.in_title = false,
            b"schemaversion" => self.in_schema_version = false,
            b"resource" => self.current_resource = None,
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if self.in_title {
            self.title = Some(text.to_string());
        } else if self.in_schema_version {
            self.schema_version = Some(text.to_string());
        }
    }

    fn version(&self) -> ScormVersion {
        match self.schema_version.as_deref().map(str::trim) {
            Some("1.2") => ScormVersion::Scorm12,
            Some(v) if v.contains("2004") || v.contains("1.3") => ScormVersion::Scorm2004,
            _ => self.namespace_hint.unwrap_or_default(),
        }
    }

    fn resolve(&self, identifierref: &str) -> Option<String> {
        self.resources
            .get(identifierref)
            .and_then(ResourceInfo::launch_href)
            .map(str::to_owned)
    }

    fn first_resource_href(&self) -> Option<String> {
        self.resource_order.iter().find_map(|id| self.resolve(id))
    }
}

impl ScormPackage {
    pub fn parse(xml: &str) -> Result<Self, ManifestError> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);
        let mut walk = Walk::default();

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => walk.open(&e, false),
                Ok(Event::Empty(e)) => walk.open(&e, true),
                Ok(Event::End(e)) => walk.close(e.local_name().as_ref()),
                Ok(Event::Text(t)) => {
                    let text = t.unescape().map_err(|_| ManifestError::Parse)?;
                    walk.text(&text);
                }
                Ok(Event::Eof) => break,
                Err(err) => {
                    tracing::debug!(error = %err, "manifest xml error");
                    return Err(ManifestError::Parse);
                }
                _ => {}
            }
        }

        let default_item = walk
            .items
            .iter()
            .find(|item| item.in_default_org)
            .or(walk.items.first());
        let default_launch = default_item
            .and_then(|item| walk.resolve(&item.identifierref))
            .or_else(|| walk.first_resource_href())
            .ok_or(ManifestError::NoLaunch)?;

        let scos = walk
            .items
            .iter()
            .filter_map(|item| {
                let href = walk.resolve(&item.identifierref)?;
                Some(ScoEntry {
                    identifier: item.identifier.clone(),
                    href,
                    parameters: item.parameters.clone(),
                    scorm_type: walk
                        .resources
                        .get(&item.identifierref)
                        .and_then(|r| r.scorm_type.clone()),
                })
            })
            .collect();

        Ok(ScormPackage {
            title: walk.title.clone(),
            version: walk.version(),
            root: String::new(),
            default_launch,
            scos,
        })
    }

    /// Reads the shallowest `imsmanifest.xml` of an in-memory zip package.
    pub fn from_zip_bytes(bytes: &[u8]) -> Result<Self, ManifestError> {
        let mut zip = zip::ZipArchive::new(Cursor::new(bytes))?;
        let name = zip
            .file_names()
            .filter(|n| n.rsplit('/').next() == Some(MANIFEST_FILE))
            .min_by_key(|n| n.matches('/').count())
            .map(str::to_owned)
            .ok_or(ManifestError::Missing)?;

        let mut xml = String::new();
        zip.by_name(&name)?.read_to_string(&mut xml)?;

        let mut package = Self::parse(&xml)?;
        package.root = name[..name.len() - MANIFEST_FILE.len()].to_string();
        Ok(package)
    }

    pub fn launch_url(&self, content_base: &str, package_path: &str) -> String {
        launch_url(content_base, package_path, &format!("{}{}", self.root, self.default_launch))
    }
}

/// `{base}/{package_path}/{href}` with path segments percent-encoded; a
/// query string on `href` is kept as is.
pub fn launch_url(content_base: &str, package_path: &str, href: &str) -> String {
    let (path, query) = match href.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (href, None),
    };
    let segments = package_path
        .split('/')
        .chain(path.split('/'))
        .filter(|s| !s.is_empty())
        .map(|s| utf8_percent_encode(s, SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/");
    let mut url = format!("{}/{}", content_base.trim_end_matches('/'), segments);
    if let Some(query) = query {
        url.push('?');
        url.push_str(query);
    }
    url
}

fn attr(e: &BytesStart<'_>, key_local: &str) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == key_local.as_bytes())
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

fn namespace_version(e: &BytesStart<'_>) -> Option<ScormVersion> {
    e.attributes().flatten().find_map(|a| {
        let value = a.unescape_value().ok()?;
        if value.contains("adlcp_rootv1p2") {
            Some(ScormVersion::Scorm12)
        } else if value.contains("adlcp_v1p3") || value.contains("adlseq_v1p3") {
            Some(ScormVersion::Scorm2004)
        } else {
            None
        }
    })
}
