use serde_yaml::Value;

use crate::doc;
use crate::layout::MANIFEST_FILE_NAME;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchKind {
    Git,
    Curl,
}

impl FetchKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FetchKind::Git => "git",
            FetchKind::Curl => "curl",
        }
    }
}

/// Fetch settings forwarded verbatim to the fetcher: `git` entries carry
/// `url` and `rev`, `curl` entries carry `url` and `unpack`. Missing fields
/// forward as empty strings rather than being rejected here.
#[derive(Clone, Debug)]
pub struct FetchSpec {
    pub kind: FetchKind,
    pub properties: Vec<(String, String)>,
}

/// How a dependency's artifacts come to exist: a generated per-target shell
/// recipe, or a nested project built by recursive invocations of this tool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolutionKind {
    Recipe,
    Subproject { manifest_name: String },
}

/// One `dependencies[]` entry. Entries with an empty `name` or `source` are
/// dropped during parsing; entries whose `type` is not a recognized
/// resolution kind keep their fetch settings but resolve to no buildable
/// dependency. The raw node rides along so target-scoped blocks can be
/// resolved later.
#[derive(Clone, Debug)]
pub struct DependencySpec {
    pub name: String,
    pub fetch: Option<FetchSpec>,
    pub kind: Option<ResolutionKind>,
    pub node: Value,
}

pub fn parse_dependency_specs(document: &Value) -> Vec<DependencySpec> {
    let mut specs = Vec::new();
    for node in doc::sequence_at(document, &["dependencies"]) {
        let name = doc::string_at(node, &["name"]);
        let source = doc::string_at(node, &["source"]);
        if name.is_empty() || source.is_empty() {
            continue;
        }
        let fetch = match source.as_str() {
            "git" => Some(FetchSpec {
                kind: FetchKind::Git,
                properties: vec![
                    ("url".to_string(), doc::string_at(node, &["url"])),
                    ("rev".to_string(), doc::string_at(node, &["rev"])),
                ],
            }),
            "curl" => Some(FetchSpec {
                kind: FetchKind::Curl,
                properties: vec![
                    ("url".to_string(), doc::string_at(node, &["url"])),
                    ("unpack".to_string(), doc::string_at(node, &["unpack"])),
                ],
            }),
            _ => None,
        };
        let kind = match doc::string_at(node, &["type"]).as_str() {
            "manual" => Some(ResolutionKind::Recipe),
            "crossforge" => {
                let conf = doc::string_at(node, &["conf"]);
                Some(ResolutionKind::Subproject {
                    manifest_name: if conf.is_empty() {
                        MANIFEST_FILE_NAME.to_string()
                    } else {
                        conf
                    },
                })
            }
            _ => None,
        };
        specs.push(DependencySpec {
            name,
            fetch,
            kind,
            node: node.clone(),
        });
    }
    specs
}
