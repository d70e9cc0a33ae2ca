use crate::site::Edge;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeEmphasis {
    Normal,
    Connected,
    Dimmed,
}

/// Hovering a node lifts its edges and dims the rest.
pub(super) fn emphasis(edge: &Edge, hovered: Option<&str>) -> EdgeEmphasis {
    match hovered {
        None => EdgeEmphasis::Normal,
        Some(id) if edge.touches(id) => EdgeEmphasis::Connected,
        Some(_) => EdgeEmphasis::Dimmed,
    }
}
