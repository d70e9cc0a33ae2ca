use tracing::warn;

use crate::positions::{Position, PositionMap, retain_finite};
use crate::site::{NodeType, VisualNode};

pub const NODE_WIDTH: f64 = 280.0;
pub const NODE_LABEL_HEIGHT: f64 = 24.0;
pub const NODE_BODY_HEIGHT: f64 = 150.0;
pub const NODE_HEIGHT: f64 = NODE_LABEL_HEIGHT + NODE_BODY_HEIGHT;

// Default lanes: fragments on the left, pages in a grid to the right.
const LANE_TOP: f64 = 50.0;
const FRAGMENT_LANE_X: f64 = 50.0;
const PAGE_GRID_X: f64 = 550.0;
const PAGE_GRID_COLUMNS: usize = 3;
const PAGE_COLUMN_STEP: f64 = 350.0;
const DEFAULT_ROW_STEP: f64 = 250.0 + 180.0;

// Organize: three stacked bands.
const ORGANIZE_ORIGIN: f64 = 50.0;
const ORGANIZE_COLUMN_WIDTH: f64 = 400.0;
const ORGANIZE_ROW_HEIGHT: f64 = 220.0 + 150.0 + 80.0;
const PART_COLUMNS: usize = 6;
const PATTERN_COLUMNS: usize = 4;
const PAGE_COLUMNS: usize = 6;

/// Slot 0 belongs to the home node; pages start at slot 1.
pub fn page_grid_position(slot: usize) -> Position {
    let column = slot % PAGE_GRID_COLUMNS;
    let row = slot / PAGE_GRID_COLUMNS;
    Position::new(
        PAGE_GRID_X + column as f64 * PAGE_COLUMN_STEP,
        LANE_TOP + row as f64 * DEFAULT_ROW_STEP,
    )
}

pub fn home_position() -> Position {
    page_grid_position(0)
}

/// Template parts take the first slots of the left lane, patterns continue below.
pub fn fragment_lane_position(slot: usize) -> Position {
    Position::new(FRAGMENT_LANE_X, LANE_TOP + slot as f64 * DEFAULT_ROW_STEP)
}

fn band_rows(count: usize, columns: usize) -> usize {
    count.div_ceil(columns).max(1)
}

fn place_band<'a>(
    nodes: impl Iterator<Item = &'a VisualNode>,
    top: f64,
    columns: usize,
    out: &mut PositionMap,
) {
    for (index, node) in nodes.enumerate() {
        let column = index % columns;
        let row = index / columns;
        out.insert(
            node.id.clone(),
            Position::new(
                ORGANIZE_ORIGIN + column as f64 * ORGANIZE_COLUMN_WIDTH,
                top + row as f64 * ORGANIZE_ROW_HEIGHT,
            ),
        );
    }
}

/// Tidy grid layout: template parts, then patterns, then pages, top to bottom.
///
/// Pure function of the input order. Entries that come out non-finite are left
/// out so callers keep whatever position the node had.
pub fn organize_layout(nodes: &[VisualNode]) -> PositionMap {
    let mut result = PositionMap::new();
    if nodes.is_empty() {
        return result;
    }

    let of_type = |node_type: NodeType| nodes.iter().filter(move |node| node.node_type == node_type);

    let part_count = of_type(NodeType::TemplatePart).count();
    let pattern_count = of_type(NodeType::Pattern).count();

    let parts_top = ORGANIZE_ORIGIN;
    let patterns_top = parts_top + band_rows(part_count, PART_COLUMNS) as f64 * ORGANIZE_ROW_HEIGHT;
    let pages_top =
        patterns_top + band_rows(pattern_count, PATTERN_COLUMNS) as f64 * ORGANIZE_ROW_HEIGHT;

    place_band(of_type(NodeType::TemplatePart), parts_top, PART_COLUMNS, &mut result);
    place_band(of_type(NodeType::Pattern), patterns_top, PATTERN_COLUMNS, &mut result);
    place_band(of_type(NodeType::Page), pages_top, PAGE_COLUMNS, &mut result);

    let dropped = retain_finite(&mut result);
    if dropped > 0 {
        warn!(dropped, "organize produced non-finite positions");
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::NodeData;

    fn node(id: &str, node_type: NodeType) -> VisualNode {
        VisualNode {
            id: id.to_owned(),
            node_type,
            position: Position::default(),
            default_position: Position::default(),
            data: NodeData::default(),
        }
    }

    fn overlaps(a: Position, b: Position) -> bool {
        a.x < b.x + NODE_WIDTH
            && b.x < a.x + NODE_WIDTH
            && a.y < b.y + NODE_HEIGHT
            && b.y < a.y + NODE_HEIGHT
    }

    fn mixed_nodes() -> Vec<VisualNode> {
        let mut nodes = vec![node("template-index", NodeType::Page)];
        nodes.extend((0..8).map(|i| node(&format!("part-{i}"), NodeType::TemplatePart)));
        nodes.extend((0..9).map(|i| node(&format!("pattern-{i}"), NodeType::Pattern)));
        nodes.extend((0..13).map(|i| node(&format!("page-{i}"), NodeType::Page)));
        nodes
    }

    #[test]
    fn empty_input_gives_empty_layout() {
        assert!(organize_layout(&[]).is_empty());
    }

    #[test]
    fn organize_is_deterministic() {
        let nodes = mixed_nodes();

        assert_eq!(organize_layout(&nodes), organize_layout(&nodes));
    }

    #[test]
    fn bands_stack_parts_then_patterns_then_pages() {
        let nodes = mixed_nodes();
        let layout = organize_layout(&nodes);

        assert_eq!(layout.len(), nodes.len());

        let max_y = |prefix: &str| {
            layout
                .iter()
                .filter(|(id, _)| id.starts_with(prefix))
                .map(|(_, position)| position.y)
                .fold(f64::NEG_INFINITY, f64::max)
        };
        let min_y = |prefix: &str| {
            layout
                .iter()
                .filter(|(id, _)| id.starts_with(prefix))
                .map(|(_, position)| position.y)
                .fold(f64::INFINITY, f64::min)
        };

        assert!(max_y("part-") < min_y("pattern-"));
        assert!(max_y("pattern-") < min_y("page-"));
        assert!(max_y("pattern-") < layout["template-index"].y);

        // 9 patterns in 4 columns take 3 rows.
        assert_eq!(layout["pattern-4"], Position::new(50.0, layout["pattern-0"].y + 450.0));
        assert_eq!(layout["pattern-3"].x, 50.0 + 3.0 * 400.0);
    }

    #[test]
    fn empty_bands_still_reserve_a_row() {
        let layout = organize_layout(&[node("page-1", NodeType::Page)]);

        assert_eq!(layout["page-1"], Position::new(50.0, 50.0 + 2.0 * 450.0));
    }

    #[test]
    fn organized_nodes_never_overlap() {
        let layout = organize_layout(&mixed_nodes());
        let positions = layout.values().copied().collect::<Vec<_>>();

        for (i, a) in positions.iter().enumerate() {
            for b in &positions[i + 1..] {
                assert!(!overlaps(*a, *b), "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn default_lanes_keep_fragments_left_of_pages() {
        let fragment_right = fragment_lane_position(40).x + NODE_WIDTH;

        assert!(fragment_right < page_grid_position(0).x);
        assert_eq!(home_position(), Position::new(550.0, 50.0));
        assert_eq!(page_grid_position(4), Position::new(900.0, 480.0));
        assert!(!overlaps(fragment_lane_position(0), fragment_lane_position(1)));
        assert!(!overlaps(page_grid_position(1), page_grid_position(2)));
        assert!(!overlaps(page_grid_position(2), page_grid_position(5)));
    }
}
