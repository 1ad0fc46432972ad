use crate::{Document, NodeData, NodeId};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Render the subtree at `id` as HTML
pub fn to_html(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    write_node(doc, id, false, &mut out);
    out
}

/// Render the whole document, doctype included
pub fn document_to_html(doc: &Document) -> String {
    let mut out = String::from("<!DOCTYPE html>");
    write_node(doc, doc.root(), false, &mut out);
    out
}

fn write_node(doc: &Document, id: NodeId, raw_text: bool, out: &mut String) {
    let Some(node) = doc.get(id) else {
        return;
    };

    match node.data() {
        NodeData::Text(content) if raw_text => out.push_str(content),
        NodeData::Text(content) => escape_text(content, out),
        NodeData::Comment(content) => {
            out.push_str("<!--");
            out.push_str(content);
            out.push_str("-->");
        }
        NodeData::Element(el) => {
            let tag = el.tag();
            out.push('<');
            out.push_str(tag);
            for (name, value) in el.attributes() {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                escape_attribute(value, out);
                out.push('"');
            }
            out.push('>');

            if is_one_of(tag, VOID_ELEMENTS) {
                return;
            }

            let raw = is_one_of(tag, RAW_TEXT_ELEMENTS);
            for child in el.children() {
                write_node(doc, *child, raw, out);
            }

            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
    }
}

fn is_one_of(tag: &str, set: &[&str]) -> bool {
    set.iter().any(|t| t.eq_ignore_ascii_case(tag))
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

fn escape_attribute(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}
