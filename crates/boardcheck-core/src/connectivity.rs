//! Copper connectivity and ratsnest.
//!
//! Items of one net that touch on a shared copper layer are merged into
//! islands with a disjoint-set forest. Islands of a net that hold pads are
//! then joined by a minimum spanning tree over their nearest pad pairs; every
//! edge of that tree is a connection still to be routed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::board::{Board, BoardItem, ItemRef, NetCode, NO_NET};
use crate::geometry::{Point, Shape};
use crate::layer::LayerSet;
use crate::predicates::shape_distance;
use crate::spatial::{SpatialEntry, SpatialIndex};

/// Union-find with path halving and union by rank.
#[derive(Debug, Clone)]
pub struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    pub fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
            rank: vec![0; size],
        }
    }

    pub fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Merge the sets of `a` and `b`; false if they were already one set.
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
        true
    }
}

/// A set of same-net copper items that are physically connected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Island {
    pub net: NetCode,
    pub items: Vec<ItemRef>,
}

impl Island {
    pub fn pads(&self) -> impl Iterator<Item = &ItemRef> {
        self.items
            .iter()
            .filter(|r| matches!(r, ItemRef::Pad { .. }))
    }
}

/// One unrouted connection between two islands of a net.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatsnestEdge {
    pub net: NetCode,
    pub from: ItemRef,
    pub to: ItemRef,
    pub from_pos: Point,
    pub to_pos: Point,
    pub length: f64,
}

struct Node {
    item: ItemRef,
    net: NetCode,
    layers: LayerSet,
    shapes: Vec<Shape>,
}

fn conductor(board: &Board, item: ItemRef) -> Option<Node> {
    let resolved = board.item(item)?;
    let layers = match resolved {
        BoardItem::Track(_) | BoardItem::Via(_) => resolved.layers(),
        BoardItem::Pad(_, pad) => pad.copper_layers(),
        BoardItem::Zone(zone) if !zone.is_keepout() => zone.layers.copper(),
        _ => return None,
    };
    let net = resolved.net();
    if net == NO_NET || layers.is_empty() {
        return None;
    }
    Some(Node {
        item,
        net,
        layers,
        shapes: resolved.shapes(),
    })
}

fn touching(a: &Node, b: &Node) -> bool {
    a.layers.intersects(&b.layers)
        && a
            .shapes
            .iter()
            .any(|sa| b.shapes.iter().any(|sb| shape_distance(sa, sb).distance == 0.0))
}

/// Physical connectivity of a board.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Connectivity {
    pub islands: Vec<Island>,
    pub ratsnest: Vec<RatsnestEdge>,
}

impl Connectivity {
    pub fn build(board: &Board) -> Self {
        let nodes: Vec<Node> = board
            .item_refs()
            .into_iter()
            .filter_map(|r| conductor(board, r))
            .collect();
        let slot: BTreeMap<ItemRef, usize> =
            nodes.iter().enumerate().map(|(i, n)| (n.item, i)).collect();

        let index = SpatialIndex::build(
            nodes
                .iter()
                .filter_map(|n| SpatialEntry::of(board, n.item))
                .collect(),
        );

        let mut sets = DisjointSet::new(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            let Some(entry) = SpatialEntry::of(board, node.item) else {
                continue;
            };
            for hit in index.query_region(&entry.bbox, node.layers) {
                let Some(&j) = slot.get(&hit.item) else {
                    continue;
                };
                if j > i && nodes[j].net == node.net && touching(node, &nodes[j]) {
                    sets.union(i, j);
                }
            }
        }

        let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for i in 0..nodes.len() {
            groups.entry(sets.find(i)).or_default().push(i);
        }
        let mut islands: Vec<Island> = groups
            .into_values()
            .map(|members| Island {
                net: nodes[members[0]].net,
                items: members.iter().map(|&m| nodes[m].item).collect(),
            })
            .collect();
        islands.sort_by(|a, b| (a.net, &a.items).cmp(&(b.net, &b.items)));

        let ratsnest = Self::ratsnest(board, &islands);
        log::debug!(
            "Connectivity: {} conductors, {} islands, {} unrouted connections",
            nodes.len(),
            islands.len(),
            ratsnest.len()
        );
        Self { islands, ratsnest }
    }

    fn ratsnest(board: &Board, islands: &[Island]) -> Vec<RatsnestEdge> {
        let pad_pos = |r: &ItemRef| board.item(*r).map(|item| item.position());

        let mut by_net: BTreeMap<NetCode, Vec<&Island>> = BTreeMap::new();
        for island in islands.iter().filter(|i| i.pads().next().is_some()) {
            by_net.entry(island.net).or_default().push(island);
        }

        let mut edges = Vec::new();
        for (net, group) in by_net {
            if group.len() < 2 {
                continue;
            }
            let mut candidates = Vec::new();
            for a in 0..group.len() {
                for b in (a + 1)..group.len() {
                    let mut best: Option<RatsnestEdge> = None;
                    for pa in group[a].pads() {
                        for pb in group[b].pads() {
                            let (Some(from_pos), Some(to_pos)) = (pad_pos(pa), pad_pos(pb)) else {
                                continue;
                            };
                            let length = from_pos.distance_to(&to_pos);
                            if best.as_ref().map_or(true, |e| length < e.length) {
                                best = Some(RatsnestEdge {
                                    net,
                                    from: *pa,
                                    to: *pb,
                                    from_pos,
                                    to_pos,
                                    length,
                                });
                            }
                        }
                    }
                    if let Some(edge) = best {
                        candidates.push((a, b, edge));
                    }
                }
            }
            candidates.sort_by(|x, y| {
                x.2.length
                    .total_cmp(&y.2.length)
                    .then((x.0, x.1).cmp(&(y.0, y.1)))
            });
            let mut joined = DisjointSet::new(group.len());
            for (a, b, edge) in candidates {
                if joined.union(a, b) {
                    edges.push(edge);
                }
            }
        }
        edges
    }

    pub fn island_of(&self, item: ItemRef) -> Option<usize> {
        self.islands.iter().position(|i| i.items.contains(&item))
    }

    pub fn is_connected(&self, a: ItemRef, b: ItemRef) -> bool {
        matches!((self.island_of(a), self.island_of(b)), (Some(x), Some(y)) if x == y)
    }

    pub fn unrouted_count(&self) -> usize {
        self.ratsnest.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Footprint, Pad, Track};
    use crate::geometry::{mm, Size};
    use crate::layer::F_CU;

    fn board_with_pads() -> (Board, u32) {
        let mut board = Board::new("conn");
        let net = board.add_net("SIG");
        let pad = |n: &str, x: f64| Pad::smd(n, Point::new(mm(x), 0), Size::new(mm(1.0), mm(1.0)), F_CU, net);
        board.add_footprint(
            Footprint::new("J1", "", Point::new(0, 0))
                .with_pad(pad("1", 0.0))
                .with_pad(pad("2", 5.0))
                .with_pad(pad("3", 12.0)),
        );
        (board, net)
    }

    #[test]
    fn test_disjoint_set() {
        let mut ds = DisjointSet::new(4);
        assert!(ds.union(0, 1));
        assert!(ds.union(2, 3));
        assert!(!ds.union(1, 0));
        assert_ne!(ds.find(0), ds.find(2));
        ds.union(1, 3);
        assert_eq!(ds.find(0), ds.find(2));
    }

    #[test]
    fn test_unrouted_pads_form_spanning_tree() {
        let (board, _) = board_with_pads();
        let conn = Connectivity::build(&board);
        assert_eq!(conn.islands.len(), 3);
        assert_eq!(conn.ratsnest.len(), 2);
        assert!((conn.ratsnest[0].length - mm(5.0) as f64).abs() < 1e-6);
    }

    #[test]
    fn test_track_joins_pads() {
        let (mut board, net) = board_with_pads();
        board.add_track(Track::new(Point::new(0, 0), Point::new(mm(5.0), 0), mm(0.25), F_CU, net));
        let conn = Connectivity::build(&board);
        assert_eq!(conn.ratsnest.len(), 1);
        assert!(conn.is_connected(
            ItemRef::Pad { footprint: 0, pad: 0 },
            ItemRef::Pad { footprint: 0, pad: 1 }
        ));
        assert!(!conn.is_connected(
            ItemRef::Pad { footprint: 0, pad: 0 },
            ItemRef::Pad { footprint: 0, pad: 2 }
        ));
    }
}
