//! Template loading and parsing
//!
//! Built-in templates are compiled into the binary. A bundle parses all of
//! them once, optionally replacing some from an override directory, and is
//! immutable afterwards.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

static PLACEHOLDER_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"));

/// Every template the generator renders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateId {
    Model,
    ModelPrimaryKey,
    ModelRegistry,
    Data,
    DataLookup,
    DataRegistry,
    Biz,
    BizRegistry,
}

impl TemplateId {
    pub const ALL: [TemplateId; 8] = [
        TemplateId::Model,
        TemplateId::ModelPrimaryKey,
        TemplateId::ModelRegistry,
        TemplateId::Data,
        TemplateId::DataLookup,
        TemplateId::DataRegistry,
        TemplateId::Biz,
        TemplateId::BizRegistry,
    ];

    /// File stem, also used for override files (`<name>.tmpl`)
    pub fn name(&self) -> &'static str {
        match self {
            TemplateId::Model => "model",
            TemplateId::ModelPrimaryKey => "model_primary_key",
            TemplateId::ModelRegistry => "model_mod",
            TemplateId::Data => "data",
            TemplateId::DataLookup => "data_lookup",
            TemplateId::DataRegistry => "data_mod",
            TemplateId::Biz => "biz",
            TemplateId::BizRegistry => "biz_mod",
        }
    }

    fn builtin_source(&self) -> &'static str {
        match self {
            TemplateId::Model => include_str!("templates/model.tmpl"),
            TemplateId::ModelPrimaryKey => include_str!("templates/model_primary_key.tmpl"),
            TemplateId::ModelRegistry => include_str!("templates/model_mod.tmpl"),
            TemplateId::Data => include_str!("templates/data.tmpl"),
            TemplateId::DataLookup => include_str!("templates/data_lookup.tmpl"),
            TemplateId::DataRegistry => include_str!("templates/data_mod.tmpl"),
            TemplateId::Biz => include_str!("templates/biz.tmpl"),
            TemplateId::BizRegistry => include_str!("templates/biz_mod.tmpl"),
        }
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Placeholder delimiters
///
/// The default triple braces do not occur in the generated Rust.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiters {
    pub open: String,
    pub close: String,
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            open: "{{{".to_string(),
            close: "}}}".to_string(),
        }
    }
}

/// A parsed piece of a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Placeholder(String),
}

/// A template split into text and placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub name: String,
    pub segments: Vec<Segment>,
}

impl Template {
    /// Parse `source`; an unclosed tag or a tag that is not an identifier fails
    pub fn parse(name: &str, source: &str, delimiters: &Delimiters) -> Result<Self> {
        if delimiters.open.is_empty() || delimiters.close.is_empty() {
            return Err(Error::template(name, "delimiters must not be empty"));
        }

        let mut segments = Vec::new();
        let mut rest = source;

        while let Some(start) = rest.find(&delimiters.open) {
            if start > 0 {
                segments.push(Segment::Text(rest[..start].to_string()));
            }
            let after_open = &rest[start + delimiters.open.len()..];
            let end = after_open.find(&delimiters.close).ok_or_else(|| {
                Error::template(
                    name,
                    format!(
                        "unterminated '{}' at byte {}",
                        delimiters.open,
                        source.len() - rest.len() + start
                    ),
                )
            })?;

            let tag = after_open[..end].trim();
            if !PLACEHOLDER_NAME.is_match(tag) {
                return Err(Error::template(
                    name,
                    format!("'{}' is not a placeholder name", tag),
                ));
            }
            segments.push(Segment::Placeholder(tag.to_string()));
            rest = &after_open[end + delimiters.close.len()..];
        }

        if !rest.is_empty() {
            segments.push(Segment::Text(rest.to_string()));
        }

        Ok(Self {
            name: name.to_string(),
            segments,
        })
    }

    /// Placeholder names in order of appearance
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Placeholder(name) => Some(name.as_str()),
            Segment::Text(_) => None,
        })
    }
}

/// All templates, parsed once
#[derive(Debug, Clone)]
pub struct TemplateBundle {
    templates: IndexMap<TemplateId, Template>,
}

impl TemplateBundle {
    /// The built-in templates with the default delimiters
    pub fn builtin() -> Result<Self> {
        Self::load(Delimiters::default(), None)
    }

    /// Built-ins, with any `<name>.tmpl` found in `override_dir` taking precedence
    pub fn load(delimiters: Delimiters, override_dir: Option<&Path>) -> Result<Self> {
        let mut templates = IndexMap::with_capacity(TemplateId::ALL.len());

        for id in TemplateId::ALL {
            let custom = match override_dir {
                Some(dir) => read_override(dir, id)?,
                None => None,
            };
            let template = match custom {
                Some(source) => {
                    tracing::debug!(template = %id, "Using template override");
                    Template::parse(id.name(), &source, &delimiters)?
                }
                None => Template::parse(id.name(), id.builtin_source(), &delimiters)?,
            };
            templates.insert(id, template);
        }

        Ok(Self { templates })
    }

    pub fn get(&self, id: TemplateId) -> Result<&Template> {
        self.templates
            .get(&id)
            .ok_or_else(|| Error::template(id.name(), "template not loaded"))
    }
}

fn read_override(dir: &Path, id: TemplateId) -> Result<Option<String>> {
    let path = dir.join(format!("{}.tmpl", id.name()));
    if !path.is_file() {
        return Ok(None);
    }
    fs::read_to_string(&path)
        .map(Some)
        .map_err(|e| Error::file_system(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_parse_segments() {
        let template =
            Template::parse("t", "pub struct {{{ pascal }}} {}}}", &Delimiters::default()).unwrap();
        assert_eq!(
            template.segments,
            vec![
                Segment::Text("pub struct ".to_string()),
                Segment::Placeholder("pascal".to_string()),
                Segment::Text(" {}}}".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_rejects_malformed_tags() {
        let delimiters = Delimiters::default();
        assert!(matches!(
            Template::parse("t", "a {{{ name", &delimiters),
            Err(Error::TemplateError { .. })
        ));
        assert!(Template::parse("t", "{{{ .Name }}}", &delimiters).is_err());
        assert!(Template::parse("t", "{{{}}}", &delimiters).is_err());
    }

    #[test]
    fn test_custom_delimiters() {
        let delimiters = Delimiters {
            open: "<%".to_string(),
            close: "%>".to_string(),
        };
        let template = Template::parse("t", "{{{ x }}} <% y %>", &delimiters).unwrap();
        assert_eq!(template.placeholders().collect::<Vec<_>>(), vec!["y"]);
    }

    #[test]
    fn test_builtin_bundle_parses() {
        let bundle = TemplateBundle::builtin().unwrap();
        for id in TemplateId::ALL {
            assert!(bundle.get(id).unwrap().placeholders().count() > 0, "{}", id);
        }
    }

    #[test]
    fn test_override_directory() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("biz.tmpl"), "// {{{ table }}}\n").unwrap();

        let bundle = TemplateBundle::load(Delimiters::default(), Some(dir.path())).unwrap();
        let biz = bundle.get(TemplateId::Biz).unwrap();
        assert_eq!(biz.placeholders().collect::<Vec<_>>(), vec!["table"]);
        assert!(bundle.get(TemplateId::Model).unwrap().placeholders().count() > 1);
    }
}
