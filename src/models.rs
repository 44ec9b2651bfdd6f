use serde::{Deserialize, Serialize};

/// Index of a node in the grid graph arena (`row * cols + col`).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct NodeId(pub usize);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct ClusterId(pub usize);

/// Index of an abstraction node. Ids past the permanent arena belong to a
/// query overlay.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct HierNodeId(pub usize);

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileKind {
    #[default]
    Ground,
    Wall,
}

impl TileKind {
    pub fn is_traversable(self) -> bool {
        matches!(self, TileKind::Ground)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub x: f32,
    pub z: f32,
}

impl Location {
    pub fn new(x: f32, z: f32) -> Self {
        Self { x, z }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EdgeKind {
    Intra,
    Inter,
}
