//! XML front-end: turns data-file `<record>` elements into descriptor trees.
//!
//! Only records bound to the view, server action and cron registries matter;
//! everything else in a data file (menu items, security rules, plain records)
//! carries no field or method references and is skipped.

use super::ast::{Descriptor, DescriptorKind, DescriptorNode, Snippet};
use super::ParseError;
use crate::graph::Location;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::path::Path;
use tracing::debug;

/// Parser for data XML files
pub struct XmlParser;

impl XmlParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a data file and extract its descriptor records
    pub fn parse(&self, path: &Path, contents: &str) -> Result<Vec<Descriptor>, ParseError> {
        let lines = LineIndex::new(contents);
        let mut reader = Reader::from_str(contents);
        reader.trim_text(true);

        let mut buf = Vec::new();
        let mut stack: Vec<DescriptorNode> = Vec::new();
        let mut descriptors = Vec::new();

        loop {
            let before = reader.buffer_position();
            let event = reader.read_event_into(&mut buf);
            match event {
                Ok(Event::Start(ref e)) => {
                    let line = lines.line_at(tag_start(contents, before, reader.buffer_position()));
                    stack.push(element(e, line));
                }
                Ok(Event::Empty(ref e)) => {
                    let line = lines.line_at(tag_start(contents, before, reader.buffer_position()));
                    let node = element(e, line);
                    self.close(node, path, &mut stack, &mut descriptors);
                }
                Ok(Event::End(_)) => {
                    if let Some(node) = stack.pop() {
                        self.close(node, path, &mut stack, &mut descriptors);
                    }
                }
                Ok(Event::Text(ref t)) => {
                    if let Some(top) = stack.last_mut() {
                        if let Ok(text) = t.unescape() {
                            top.text.push_str(&text);
                        }
                    }
                }
                Ok(Event::CData(ref t)) => {
                    if let Some(top) = stack.last_mut() {
                        top.text.push_str(&String::from_utf8_lossy(t));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(ParseError::xml(path, e.to_string())),
                _ => {}
            }
            buf.clear();
        }

        debug!(
            "Parsed {}: {} descriptors",
            path.display(),
            descriptors.len()
        );
        Ok(descriptors)
    }

    /// A fully built element either becomes a descriptor (records) or a child
    /// of the enclosing element. Elements outside any record are wrappers.
    fn close(
        &self,
        node: DescriptorNode,
        path: &Path,
        stack: &mut Vec<DescriptorNode>,
        descriptors: &mut Vec<Descriptor>,
    ) {
        if node.tag == "record" {
            if let Some(descriptor) = convert_record(node, path) {
                descriptors.push(descriptor);
            }
        } else if let Some(parent) = stack.last_mut() {
            parent.children.push(node);
        }
    }
}

impl Default for XmlParser {
    fn default() -> Self {
        Self::new()
    }
}

fn element(e: &BytesStart, line: usize) -> DescriptorNode {
    let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
    let attrs = e
        .attributes()
        .filter_map(|a| a.ok())
        .map(|attr| {
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            let value = attr
                .unescape_value()
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).to_string());
            (key, value)
        })
        .collect();
    DescriptorNode {
        tag,
        attrs,
        children: Vec::new(),
        text: String::new(),
        line,
    }
}

fn convert_record(node: DescriptorNode, path: &Path) -> Option<Descriptor> {
    let kind = match node.attr("model")? {
        "ir.ui.view" => DescriptorKind::View,
        "ir.actions.server" => DescriptorKind::ServerAction,
        "ir.cron" => DescriptorKind::Cron,
        _ => return None,
    };

    let location = Location::new(path.to_path_buf(), node.line);
    let mut model = None;
    let mut arch = None;
    let mut code = None;

    for child in node.children {
        if child.tag != "field" {
            continue;
        }
        match child.attr("name") {
            Some("model") => {
                let text = child.text.trim();
                if !text.is_empty() {
                    model = Some(text.to_string());
                }
            }
            Some("model_id") => {
                if model.is_none() {
                    model = child.attr("ref").and_then(model_from_ref);
                }
            }
            Some("arch") => {
                let line = child.line;
                arch = Some(DescriptorNode { line, ..child });
            }
            Some("code") => {
                let text = child.text.trim();
                if !text.is_empty() {
                    // CDATA often opens with a newline; the snippet's line is
                    // where the code itself starts, not the tag.
                    let leading = child.text.len() - child.text.trim_start().len();
                    let skipped = child.text[..leading].matches('\n').count();
                    code = Some(Snippet {
                        source: text.to_string(),
                        line: child.line + skipped,
                    });
                }
            }
            _ => {}
        }
    }

    Some(Descriptor {
        kind,
        model,
        arch,
        code,
        location,
    })
}

/// Byte offset of the `<` opening the tag consumed from `from..to`. The reader
/// swallows the whitespace preceding a tag together with the tag itself, and a
/// tag with a long attribute list may span lines; the location must point at
/// the opening line, not the closing `>`.
fn tag_start(contents: &str, from: usize, to: usize) -> usize {
    let to = to.min(contents.len());
    contents[from..to].rfind('<').map_or(from, |i| from + i)
}

/// Derive a model name from an external id like `base.model_res_partner`
fn model_from_ref(reference: &str) -> Option<String> {
    let local = reference.rsplit('.').next()?;
    let technical = local.strip_prefix("model_")?;
    Some(technical.replace('_', "."))
}

/// Byte-offset to 1-indexed line lookup over the raw file contents
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { starts }
    }

    fn line_at(&self, byte: usize) -> usize {
        self.starts.partition_point(|start| *start <= byte)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn parse(contents: &str) -> Vec<Descriptor> {
        XmlParser::new()
            .parse(&PathBuf::from("views/test.xml"), contents)
            .unwrap()
    }

    #[test]
    fn test_view_record() {
        let descriptors = parse(
            r#"<odoo>
    <record id="view_partner_form" model="ir.ui.view">
        <field name="model">res.partner</field>
        <field name="arch" type="xml">
            <form>
                <field name="email"/>
                <button name="action_confirm" type="object"/>
            </form>
        </field>
    </record>
</odoo>"#,
        );

        assert_eq!(descriptors.len(), 1);
        let view = &descriptors[0];
        assert_eq!(view.kind, DescriptorKind::View);
        assert_eq!(view.model.as_deref(), Some("res.partner"));
        let arch = view.arch.as_ref().unwrap();
        let form = &arch.children[0];
        assert_eq!(form.tag, "form");
        assert_eq!(form.children[0].attr("name"), Some("email"));
        assert_eq!(form.children[1].tag, "button");
    }

    #[test]
    fn test_server_action_with_cdata_code() {
        let descriptors = parse(
            r#"<odoo>
    <record id="action_recompute" model="ir.actions.server">
        <field name="model_id" ref="base.model_res_partner"/>
        <field name="state">code</field>
        <field name="code"><![CDATA[
records.write({'score': 0})
]]></field>
    </record>
</odoo>"#,
        );

        let action = &descriptors[0];
        assert_eq!(action.kind, DescriptorKind::ServerAction);
        assert_eq!(action.model.as_deref(), Some("res.partner"));
        let code = action.code.as_ref().unwrap();
        assert!(code.source.contains("records.write"));
        assert_eq!(code.line, 6);
    }

    #[test]
    fn test_multiline_tag_located_at_opening_line() {
        let descriptors = parse(
            r#"<odoo>
    <record id="view_partner_form"
            model="ir.ui.view">
        <field name="model">res.partner</field>
        <field name="arch" type="xml">
            <form>
                <field
                    name="email"
                    widget="email"/>
            </form>
        </field>
    </record>
</odoo>"#,
        );

        let view = &descriptors[0];
        assert_eq!(view.location.line, 2);
        let form = &view.arch.as_ref().unwrap().children[0];
        assert_eq!(form.children[0].line, 7);
    }

    #[test]
    fn test_cron_record() {
        let descriptors = parse(
            r#"<odoo>
    <record id="cron_billing" model="ir.cron">
        <field name="model_id" ref="model_sale_order"/>
        <field name="code">model.run_billing()</field>
    </record>
</odoo>"#,
        );

        let cron = &descriptors[0];
        assert_eq!(cron.kind, DescriptorKind::Cron);
        assert_eq!(cron.model.as_deref(), Some("sale.order"));
        assert_eq!(cron.code.as_ref().unwrap().source, "model.run_billing()");
    }

    #[test]
    fn test_unrelated_records_skipped() {
        let descriptors = parse(
            r#"<odoo>
    <record id="group_user" model="res.groups">
        <field name="name">User</field>
    </record>
    <menuitem id="menu_root" name="Sales"/>
</odoo>"#,
        );
        assert!(descriptors.is_empty());
    }

    #[test]
    fn test_view_without_model_kept_unbound() {
        let descriptors = parse(
            r#"<odoo>
    <record id="view_inherit" model="ir.ui.view">
        <field name="inherit_id" ref="base.view_partner_form"/>
        <field name="arch" type="xml">
            <field name="phone" position="after"/>
        </field>
    </record>
</odoo>"#,
        );
        assert_eq!(descriptors.len(), 1);
        assert!(descriptors[0].model.is_none());
    }

    #[test]
    fn test_invalid_xml_is_an_error() {
        let result = XmlParser::new().parse(&PathBuf::from("bad.xml"), "<odoo><record</odoo>");
        assert!(result.is_err());
    }

    #[test]
    fn test_model_from_ref() {
        assert_eq!(
            model_from_ref("base.model_res_partner").as_deref(),
            Some("res.partner")
        );
        assert_eq!(
            model_from_ref("model_sale_order").as_deref(),
            Some("sale.order")
        );
        assert_eq!(model_from_ref("base.view_partner_form"), None);
    }
}
