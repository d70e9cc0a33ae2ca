use std::collections::HashSet;

use crate::site::{NodeType, VisualNode};

/// Page status filter. Other node types are never filtered by status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Publish,
    Draft,
}

impl StatusFilter {
    pub const ALL: [Self; 3] = [Self::All, Self::Publish, Self::Draft];

    pub fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Publish => "Published",
            Self::Draft => "Drafts",
        }
    }

    fn status(self) -> Option<&'static str> {
        match self {
            Self::All => None,
            Self::Publish => Some("publish"),
            Self::Draft => Some("draft"),
        }
    }

    pub fn admits(self, node: &VisualNode) -> bool {
        if node.node_type != NodeType::Page {
            return true;
        }
        match self.status() {
            None => true,
            Some(wanted) => node.data.status.as_deref() == Some(wanted),
        }
    }
}

pub(super) fn is_visible(
    node: &VisualNode,
    hidden_types: &HashSet<NodeType>,
    status_filter: StatusFilter,
) -> bool {
    !hidden_types.contains(&node.node_type) && status_filter.admits(node)
}
