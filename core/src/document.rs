//! Mutable project document tree.
//!
//! The rewrite engine repeatedly removes and rewrites nodes, so the tree is
//! an arena: groups live in a flat `Vec` addressed by [`GroupId`], with a
//! separate order list for document order. Removing a group tombstones the
//! node instead of re-indexing, so previously handed-out ids never dangle.

/// Handle to one top-level group in a [`ProjectDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(u32);

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectProperty {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PropertyGroup {
    pub condition: Option<String>,
    pub properties: Vec<ProjectProperty>,
}

impl PropertyGroup {
    pub fn property(&self, name: &str) -> Option<&ProjectProperty> {
        self.properties
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn set_property(&mut self, name: &str, value: &str) {
        if let Some(existing) = self
            .properties
            .iter_mut()
            .find(|p| p.name.eq_ignore_ascii_case(name))
        {
            existing.value = value.to_string();
        } else {
            self.properties.push(ProjectProperty {
                name: name.to_string(),
                value: value.to_string(),
            });
        }
    }

    pub fn remove_property(&mut self, name: &str) -> bool {
        let before = self.properties.len();
        self.properties
            .retain(|p| !p.name.eq_ignore_ascii_case(name));
        self.properties.len() != before
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectItem {
    pub item_type: String,
    pub include: Option<String>,
    pub update: Option<String>,
    pub remove: Option<String>,
    pub metadata: Vec<(String, String)>,
}

impl ProjectItem {
    pub fn include(item_type: &str, include: &str) -> Self {
        Self {
            item_type: item_type.to_string(),
            include: Some(include.to_string()),
            update: None,
            remove: None,
            metadata: Vec::new(),
        }
    }

    pub fn remove_decl(item_type: &str, remove: &str) -> Self {
        Self {
            item_type: item_type.to_string(),
            include: None,
            update: None,
            remove: Some(remove.to_string()),
            metadata: Vec::new(),
        }
    }

    pub fn with_metadata(mut self, name: &str, value: &str) -> Self {
        self.metadata.push((name.to_string(), value.to_string()));
        self
    }

    pub fn metadata_value(&self, name: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ItemGroup {
    pub condition: Option<String>,
    pub items: Vec<ProjectItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    pub project: String,
    pub condition: Option<String>,
    pub label: Option<String>,
}

impl Import {
    /// Final path segment of the imported project, for allow-list matching.
    pub fn file_name(&self) -> &str {
        self.project
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(self.project.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GroupKind {
    Properties(PropertyGroup),
    Items(ItemGroup),
    Import(Import),
    /// Verbatim XML of a top-level element the converter does not interpret
    /// (custom targets, tasks). Preserved untouched on write.
    Raw(String),
}

#[derive(Debug, Clone)]
struct GroupNode {
    kind: GroupKind,
    removed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ProjectDocument {
    /// File stem of the project, e.g. `MyLib` for `MyLib.csproj`.
    pub project_name: String,
    pub sdk: Option<String>,
    pub tools_version: Option<String>,
    pub default_targets: Option<String>,
    pub xmlns: Option<String>,
    nodes: Vec<GroupNode>,
    order: Vec<GroupId>,
}

impl ProjectDocument {
    pub fn new(project_name: &str) -> Self {
        Self {
            project_name: project_name.to_string(),
            ..Self::default()
        }
    }

    pub fn append_group(&mut self, kind: GroupKind) -> GroupId {
        let id = GroupId(self.nodes.len() as u32);
        self.nodes.push(GroupNode {
            kind,
            removed: false,
        });
        self.order.push(id);
        id
    }

    /// Inserts a group before every existing group.
    pub fn prepend_group(&mut self, kind: GroupKind) -> GroupId {
        let id = GroupId(self.nodes.len() as u32);
        self.nodes.push(GroupNode {
            kind,
            removed: false,
        });
        self.order.insert(0, id);
        id
    }

    /// Tombstones a group. The id stays valid; the group no longer appears
    /// in iteration or output.
    pub fn remove_group(&mut self, id: GroupId) {
        if let Some(node) = self.nodes.get_mut(id.0 as usize) {
            node.removed = true;
        }
        self.order.retain(|&g| g != id);
    }

    pub fn group(&self, id: GroupId) -> Option<&GroupKind> {
        let node = self.nodes.get(id.0 as usize)?;
        if node.removed {
            return None;
        }
        Some(&node.kind)
    }

    pub fn group_mut(&mut self, id: GroupId) -> Option<&mut GroupKind> {
        let node = self.nodes.get_mut(id.0 as usize)?;
        if node.removed {
            return None;
        }
        Some(&mut node.kind)
    }

    /// Live group ids in document order.
    pub fn group_ids(&self) -> Vec<GroupId> {
        self.order.clone()
    }

    pub fn property_groups(&self) -> impl Iterator<Item = (GroupId, &PropertyGroup)> {
        self.order
            .iter()
            .filter_map(move |&id| match self.group(id) {
                Some(GroupKind::Properties(group)) => Some((id, group)),
                _ => None,
            })
    }

    pub fn item_groups(&self) -> impl Iterator<Item = (GroupId, &ItemGroup)> {
        self.order
            .iter()
            .filter_map(move |&id| match self.group(id) {
                Some(GroupKind::Items(group)) => Some((id, group)),
                _ => None,
            })
    }

    pub fn imports(&self) -> impl Iterator<Item = (GroupId, &Import)> {
        self.order
            .iter()
            .filter_map(move |&id| match self.group(id) {
                Some(GroupKind::Import(import)) => Some((id, import)),
                _ => None,
            })
    }

    pub fn property_group_mut(&mut self, id: GroupId) -> Option<&mut PropertyGroup> {
        match self.group_mut(id)? {
            GroupKind::Properties(group) => Some(group),
            _ => None,
        }
    }

    pub fn item_group_mut(&mut self, id: GroupId) -> Option<&mut ItemGroup> {
        match self.group_mut(id)? {
            GroupKind::Items(group) => Some(group),
            _ => None,
        }
    }

    /// First unconditioned property group, if any.
    pub fn top_level_property_group(&self) -> Option<GroupId> {
        self.property_groups()
            .find(|(_, group)| group.condition.is_none())
            .map(|(id, _)| id)
    }

    /// First unconditioned property group, created at the front on demand.
    pub fn ensure_top_level_property_group(&mut self) -> GroupId {
        if let Some(id) = self.top_level_property_group() {
            return id;
        }
        self.prepend_group(GroupKind::Properties(PropertyGroup::default()))
    }

    /// Looks a property up across every live property group.
    pub fn find_property(&self, name: &str) -> Option<&ProjectProperty> {
        self.property_groups()
            .find_map(|(_, group)| group.property(name))
    }

    /// Whether any live item carries this include (case-insensitive).
    pub fn has_item_include(&self, item_type: &str, include: &str) -> bool {
        self.item_groups().any(|(_, group)| {
            group.items.iter().any(|item| {
                item.item_type.eq_ignore_ascii_case(item_type)
                    && item
                        .include
                        .as_deref()
                        .is_some_and(|i| i.eq_ignore_ascii_case(include))
            })
        })
    }

    pub fn has_item_remove(&self, item_type: &str, remove: &str) -> bool {
        self.item_groups().any(|(_, group)| {
            group.items.iter().any(|item| {
                item.item_type.eq_ignore_ascii_case(item_type)
                    && item
                        .remove
                        .as_deref()
                        .is_some_and(|r| r.eq_ignore_ascii_case(remove))
            })
        })
    }
}
