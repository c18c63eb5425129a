use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::path::Path;

use roxmltree::{Document, Node};
use tracing::{debug, warn};

use super::text::{heading_title, node_text, Description};
use crate::Result;

/// Link role that places a work item below a heading.
pub const PARENT_ROLE: &str = "parent";

/// Outgoing link of a work item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkedWorkItem {
    pub role: String,
    pub work_item_id: String,
}

/// A work item that sits in a document (it has an outline number).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkItem {
    pub id: String,
    pub module: String,
    pub type_id: String,
    /// `3.2-1` style position in the document.
    pub outline_number: String,
    pub title: String,
    pub description: Description,
    pub links: Vec<LinkedWorkItem>,
}

impl WorkItem {
    /// Headings and info blocks give structure only and are never imported
    /// as items.
    pub fn is_structural(&self) -> bool {
        matches!(self.type_id.as_str(), "heading" | "info")
    }

    pub fn is_heading(&self) -> bool {
        self.type_id == "heading"
    }

    pub fn folder_title(&self) -> String {
        heading_title(&self.title)
    }
}

/// `3.2-1` becomes `[3, 2, 1]`; parts that are not numbers count as 0.
pub fn outline_parts(outline: &str) -> Vec<i64> {
    outline
        .split(['.', '-'])
        .map(|part| part.trim().parse().unwrap_or(0))
        .collect()
}

/// Document order of two outline numbers. A prefix sorts first.
pub fn compare_outline(a: &str, b: &str) -> Ordering {
    outline_parts(a).cmp(&outline_parts(b))
}

/// Work items of a Polarion XML export, ordered by module, then by outline
/// number.
#[derive(Clone, Debug, Default)]
pub struct PolarionExport {
    items: Vec<WorkItem>,
    by_id: HashMap<String, usize>,
}

impl PolarionExport {
    pub fn parse(xml: &str) -> Result<Self> {
        let doc = Document::parse(xml)?;
        let mut items: Vec<WorkItem> = element_children(doc.root_element(), "workItem")
            .filter_map(|node| parse_work_item(xml, node))
            .collect();
        items.sort_by(|a, b| {
            a.module
                .cmp(&b.module)
                .then_with(|| compare_outline(&a.outline_number, &b.outline_number))
        });

        let by_id = items
            .iter()
            .enumerate()
            .map(|(index, item)| (item.id.clone(), index))
            .collect();
        debug!(count = items.len(), "work items read from export");
        Ok(Self { items, by_id })
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let xml = tokio::fs::read_to_string(path).await?;
        Self::parse(&xml)
    }

    pub fn items(&self) -> &[WorkItem] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&WorkItem> {
        self.by_id.get(id).map(|&index| &self.items[index])
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Headings above `item`, outermost first. Follows the first `parent`
    /// link that points at a heading, level by level.
    pub fn heading_path<'a>(&'a self, item: &'a WorkItem) -> Vec<&'a WorkItem> {
        let mut path = Vec::new();
        let mut seen = HashSet::from([item.id.as_str()]);
        let mut current = item;

        while let Some(parent) = current
            .links
            .iter()
            .filter(|link| link.role == PARENT_ROLE)
            .filter_map(|link| self.get(&link.work_item_id))
            .find(|candidate| candidate.is_heading())
        {
            if !seen.insert(parent.id.as_str()) {
                warn!(item = %item.id, "parent links form a cycle");
                break;
            }
            path.push(parent);
            current = parent;
        }

        path.reverse();
        path
    }
}

fn element_children<'a, 'input>(
    node: Node<'a, 'input>,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(move |child| child.is_element() && child.tag_name().name() == name)
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &'static str) -> Option<Node<'a, 'input>> {
    element_children(node, name).next()
}

fn child_text(node: Node<'_, '_>, name: &'static str) -> Option<String> {
    child(node, name).map(node_text)
}

fn parse_work_item(source: &str, node: Node<'_, '_>) -> Option<WorkItem> {
    let fields = child(node, "fields")?;
    let Some(id) = child_text(fields, "id").filter(|id| !id.is_empty()) else {
        warn!("work item without id skipped");
        return None;
    };
    let Some(outline_number) = child_text(fields, "outlineNumber") else {
        debug!(%id, "work item outside any document skipped");
        return None;
    };

    let links = child(fields, "linkedWorkItems")
        .map(|linked| {
            element_children(linked, "linkedWorkItem")
                .filter_map(|link| {
                    let work_item_id = child(link, "workItem")?.attribute("workItemId")?;
                    let role = child(link, "role")?.attribute("id")?;
                    Some(LinkedWorkItem {
                        role: role.to_owned(),
                        work_item_id: work_item_id.to_owned(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Some(WorkItem {
        module: child_text(fields, "module").unwrap_or_default(),
        type_id: child(fields, "type")
            .and_then(|type_node| type_node.attribute("id"))
            .unwrap_or_default()
            .to_owned(),
        title: child_text(fields, "title").unwrap_or_default(),
        description: child(fields, "description")
            .map(|description| Description::from_node(source, description))
            .unwrap_or_default(),
        id,
        outline_number,
        links,
    })
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use super::{compare_outline, outline_parts, PolarionExport};
    use crate::MatrixError;

    const EXPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<workItems xmlns="http://polarion.com/xml-export">
  <workItem>
    <fields>
      <id>ZB-3</id><module>Spec</module><outlineNumber>1.1-1</outlineNumber>
      <type id="softwareRequirement" name="Software Requirement"/>
      <title>1.1-1 Brakes must hold...</title>
      <description><html><p xmlns="http://www.w3.org/1999/xhtml">Brakes hold the car. Always.</p></html></description>
      <linkedWorkItems>
        <linkedWorkItem><role id="parent"/><workItem workItemId="ZB-2" projectId="zb"/></linkedWorkItem>
        <linkedWorkItem><role id="implements"/><workItem workItemId="ZB-9" projectId="zb"/></linkedWorkItem>
      </linkedWorkItems>
    </fields>
  </workItem>
  <workItem>
    <fields>
      <id>ZB-2</id><module>Spec</module><outlineNumber>1.1</outlineNumber>
      <type id="heading"/><title>1.1 Safety</title>
      <linkedWorkItems>
        <linkedWorkItem><role id="parent"/><workItem workItemId="ZB-1" projectId="zb"/></linkedWorkItem>
      </linkedWorkItems>
    </fields>
  </workItem>
  <workItem>
    <fields>
      <id>ZB-1</id><module>Spec</module><outlineNumber>1</outlineNumber>
      <type id="heading"/><title>1 Requirements</title>
    </fields>
  </workItem>
  <workItem>
    <fields>
      <id>ZB-9</id><module>Backlog</module>
      <type id="softwareRequirement"/><title>Loose item</title>
    </fields>
  </workItem>
  <workItem>
    <fields>
      <id>ZB-5</id><module>Arch</module><outlineNumber>2</outlineNumber>
      <type id="info"/><title>Note</title>
    </fields>
  </workItem>
</workItems>"#;

    #[test]
    fn outline_numbers_compare_numerically() {
        assert_eq!(outline_parts("3.2-1"), vec![3, 2, 1]);
        assert_eq!(compare_outline("1.10", "1.9"), Ordering::Greater);
        assert_eq!(compare_outline("1.1", "1.1-1"), Ordering::Less);
        assert_eq!(compare_outline("2", "2"), Ordering::Equal);
    }

    #[test]
    fn parse_orders_by_module_then_outline_and_skips_loose_items() {
        let export = PolarionExport::parse(EXPORT).unwrap();
        let ids: Vec<_> = export.items().iter().map(|item| item.id.as_str()).collect();
        assert_eq!(ids, vec!["ZB-5", "ZB-1", "ZB-2", "ZB-3"]);
        assert!(export.get("ZB-9").is_none());

        let item = export.get("ZB-3").unwrap();
        assert_eq!(item.type_id, "softwareRequirement");
        assert_eq!(item.title, "1.1-1 Brakes must hold...");
        assert_eq!(item.description.html, "<p>Brakes hold the car. Always.</p>");
        assert_eq!(item.links.len(), 2);
        assert_eq!(item.links[1].role, "implements");
        assert_eq!(item.links[1].work_item_id, "ZB-9");
    }

    #[test]
    fn heading_path_runs_from_outermost_heading() {
        let export = PolarionExport::parse(EXPORT).unwrap();
        let item = export.get("ZB-3").unwrap();
        let path: Vec<_> = export
            .heading_path(item)
            .iter()
            .map(|heading| heading.folder_title())
            .collect();
        assert_eq!(path, vec!["Requirements", "Safety"]);
        assert!(export.heading_path(export.get("ZB-1").unwrap()).is_empty());
    }

    #[test]
    fn structural_items_are_flagged() {
        let export = PolarionExport::parse(EXPORT).unwrap();
        assert!(export.get("ZB-5").unwrap().is_structural());
        assert!(export.get("ZB-2").unwrap().is_structural());
        assert!(!export.get("ZB-3").unwrap().is_structural());
    }

    #[test]
    fn malformed_xml_is_an_xml_error() {
        let err = PolarionExport::parse("<workItems><workItem>").unwrap_err();
        assert!(matches!(err, MatrixError::Xml(_)));
    }
}
