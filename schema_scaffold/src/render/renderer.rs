//! Template rendering

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::render::bundle::{Segment, Template, TemplateBundle, TemplateId};

/// Fills templates from serializable records
///
/// Record fields are looked up by placeholder name. Strings are inserted
/// verbatim, lists of strings one per line, `null` as nothing.
#[derive(Debug, Clone, Copy)]
pub struct Renderer<'a> {
    bundle: &'a TemplateBundle,
}

impl<'a> Renderer<'a> {
    pub fn new(bundle: &'a TemplateBundle) -> Self {
        Self { bundle }
    }

    pub fn render<T: Serialize>(&self, id: TemplateId, data: &T) -> Result<String> {
        let template = self.bundle.get(id)?;
        let value = serde_json::to_value(data)
            .map_err(|e| Error::template(id.name(), format!("unserializable record: {}", e)))?;
        match value {
            Value::Object(record) => render_template(template, &record),
            _ => Err(Error::template(id.name(), "record must be a struct or map")),
        }
    }
}

fn render_template(template: &Template, record: &Map<String, Value>) -> Result<String> {
    let mut out = String::new();
    for segment in &template.segments {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Placeholder(name) => {
                let value = record.get(name).ok_or_else(|| {
                    Error::template(&template.name, format!("no value for '{}'", name))
                })?;
                write_value(&mut out, value)
                    .map_err(|message| Error::template(&template.name, format!("'{}' {}", name, message)))?;
            }
        }
    }
    Ok(out)
}

fn write_value(out: &mut String, value: &Value) -> std::result::Result<(), &'static str> {
    match value {
        Value::Null => Ok(()),
        Value::String(s) => {
            out.push_str(s);
            Ok(())
        }
        Value::Bool(b) => {
            out.push_str(&b.to_string());
            Ok(())
        }
        Value::Number(n) => {
            out.push_str(&n.to_string());
            Ok(())
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push('\n');
                }
                match item {
                    Value::Array(_) | Value::Object(_) => return Err("is a nested list"),
                    scalar => write_value(out, scalar)?,
                }
            }
            Ok(())
        }
        Value::Object(_) => Err("is a map, not a value"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::bundle::Delimiters;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn template(source: &str) -> Template {
        Template::parse("test", source, &Delimiters::default()).unwrap()
    }

    fn record(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_render_values() {
        let t = template("{{{ name }}}|{{{ lines }}}|{{{ none }}}|{{{ n }}}|{{{ flag }}}");
        let data = record(json!({
            "name": "Account",
            "lines": ["a", "b"],
            "none": null,
            "n": 3,
            "flag": true,
        }));
        assert_eq!(render_template(&t, &data).unwrap(), "Account|a\nb||3|true");
    }

    #[test]
    fn test_missing_value_fails() {
        let t = template("{{{ missing }}}");
        let err = render_template(&t, &record(json!({}))).unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_map_value_fails() {
        let t = template("{{{ nested }}}");
        assert!(render_template(&t, &record(json!({ "nested": { "a": 1 } }))).is_err());
    }

    #[test]
    fn test_render_requires_struct_record() {
        let bundle = TemplateBundle::builtin().unwrap();
        let renderer = Renderer::new(&bundle);
        assert!(matches!(
            renderer.render(TemplateId::Biz, &"account"),
            Err(Error::TemplateError { .. })
        ));
    }
}
