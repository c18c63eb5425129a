//! Title clean-up and description handling for Polarion work items.
//!
//! Descriptions arrive as XHTML embedded in the export. They are kept as the
//! source text of the markup (so entities and attributes survive) and
//! inspected through the parsed nodes.

use std::ops::Range;

use roxmltree::Node;
use serde_json::{json, Value};

const XHTML_NAMESPACE_ATTR: &str = " xmlns=\"http://www.w3.org/1999/xhtml\"";

/// One row of a test step table, as stored in a Matrix steps field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StepRow {
    pub action: String,
    pub expected: String,
}

/// Test step table found in a description, and the description without it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StepTable {
    pub html_without_table: String,
    pub rows: Vec<StepRow>,
}

impl StepTable {
    /// JSON array for the steps field.
    pub fn to_json(&self) -> String {
        let rows = self
            .rows
            .iter()
            .map(|row| json!({ "action": row.action, "expected": row.expected }))
            .collect();
        Value::Array(rows).to_string()
    }
}

/// Description of a work item.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Description {
    pub html: String,
    /// Leading plain text, used to replace elided titles.
    pub lead_text: String,
    pub steps: Option<StepTable>,
}

impl Description {
    /// Reads a `<description>` element. `source` is the whole export.
    pub(crate) fn from_node(source: &str, description: Node<'_, '_>) -> Self {
        let body = description
            .children()
            .find(|child| child.is_element() && child.tag_name().name() == "html")
            .unwrap_or(description);
        let inner = inner_range(body);

        Self {
            html: clean_html(&source[inner.clone()]),
            lead_text: lead_text(body),
            steps: step_table(source, body, inner),
        }
    }
}

/// Drops a leading chapter number (`3.2.1 Title` becomes `Title`).
pub fn remove_numbers(title: &str) -> String {
    if !title.starts_with(|c: char| c.is_ascii_digit()) {
        return title.to_owned();
    }
    match title.find(' ') {
        Some(index) if index > 0 && index < 20 => {
            let rest = title[index + 1..].trim();
            if rest.is_empty() {
                title.to_owned()
            } else {
                rest.to_owned()
            }
        }
        _ => title.to_owned(),
    }
}

/// Title for a folder made from a heading: outline digits stripped.
pub fn heading_title(title: &str) -> String {
    title
        .trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == '-')
        .trim()
        .to_owned()
}

/// First sentence of `text`, cut at the first `.` or `:` (a `::` path
/// separator does not count). Falls back to `fallback` for empty text.
pub fn first_sentence(text: &str, fallback: &str) -> String {
    if text.is_empty() {
        return fallback.to_owned();
    }
    let dot = text.find('.').filter(|&index| index > 0);
    let colon = first_single_colon(text).filter(|&index| index > 0);
    let cut = match (dot, colon) {
        (Some(dot), Some(colon)) => Some(dot.min(colon)),
        (dot, colon) => dot.or(colon),
    };
    match cut {
        Some(cut) => text[..cut].to_owned(),
        None => text.to_owned(),
    }
}

fn first_single_colon(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut from = 0;
    while let Some(offset) = text[from..].find(':') {
        let index = from + offset;
        if bytes.get(index + 1) == Some(&b':') {
            from = index + 2;
            if from >= text.len() {
                return None;
            }
        } else {
            return Some(index);
        }
    }
    None
}

/// Replaces an elided title (`Some long title...`) by the first sentence of
/// the description.
pub fn replace_dots(title: &str, description: &Description) -> String {
    first_sentence(&description.lead_text, title)
}

/// Whitespace-normalized text of a node and its descendants.
pub(crate) fn node_text(node: Node<'_, '_>) -> String {
    let raw: String = node
        .descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect();
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn inner_range(node: Node<'_, '_>) -> Range<usize> {
    match (node.first_child(), node.last_child()) {
        (Some(first), Some(last)) => first.range().start..last.range().end,
        _ => node.range().end..node.range().end,
    }
}

fn clean_html(markup: &str) -> String {
    markup.replace(XHTML_NAMESPACE_ATTR, "").trim().to_owned()
}

fn element_children<'a, 'input>(
    node: Node<'a, 'input>,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(Node::is_element)
}

fn named<'a, 'input>(
    node: Node<'a, 'input>,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.descendants()
        .filter(move |n| n.is_element() && n.tag_name().name() == name)
}

/// Text a replaced title is taken from: the first cell when the description
/// opens with a table, otherwise the first non-empty block among the first
/// three, otherwise the whole text.
fn lead_text(body: Node<'_, '_>) -> String {
    let mut lead = node_text(body);
    for child in element_children(body).take(3) {
        if child.tag_name().name() == "table" {
            if let Some(cell) = named(child, "td").next() {
                let text = node_text(cell);
                if !text.is_empty() {
                    return text;
                }
            }
        } else {
            lead = node_text(child);
            if !lead.is_empty() {
                break;
            }
        }
    }
    lead
}

/// Finds the first table whose first header cell reads `Step` and turns its
/// rows into steps: second column is the action, third the expected result.
fn step_table(source: &str, body: Node<'_, '_>, inner: Range<usize>) -> Option<StepTable> {
    let table = named(body, "table").find(|table| {
        named(*table, "th")
            .next()
            .is_some_and(|th| node_text(th) == "Step")
    })?;

    let rows = named(table, "tr")
        .filter_map(|row| {
            let cells: Vec<_> = element_children(row)
                .filter(|cell| cell.tag_name().name() == "td")
                .collect();
            (cells.len() > 2).then(|| StepRow {
                action: clean_html(&source[inner_range(cells[1])]),
                expected: clean_html(&source[inner_range(cells[2])]),
            })
        })
        .collect();

    let cut = table.range();
    let remaining = format!(
        "{}{}",
        &source[inner.start..cut.start],
        &source[cut.end..inner.end]
    );
    Some(StepTable {
        html_without_table: clean_html(&remaining),
        rows,
    })
}
