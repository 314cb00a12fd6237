//! Arena layout documents
//!
//! A layout replaces scene discovery: it lists every obstacle and every node
//! with its proximity key up front, so the key mapping can be built and
//! validated once when the field is created. Layouts are stored as versioned
//! JSON files:
//!
//! ```json
//! {
//!   "version": 1,
//!   "diameter": 20.0,
//!   "obstacles": [ { "id": "tree_0", "position": [5.0, 0.0, 0.0] } ],
//!   "nodes": [ { "key": "tree_0/nest_0", "obstacle": "tree_0",
//!                "position": [0.6, 2.0, 0.0], "up": [1.0, 0.3, 0.0] } ]
//! }
//! ```

use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::core::types::ProximityKey;

/// Only layout schema version understood by this crate
pub const LAYOUT_VERSION: u32 = 1;

/// Characteristic diameter of the default arena (distance normalization)
pub const DEFAULT_DIAMETER: f32 = 20.0;

/// Errors that can occur when loading or validating a layout
#[derive(Debug, Error)]
pub enum LayoutError {
    /// JSON parsing failed
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
    /// File I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Unsupported layout version {0} (expected 1)")]
    UnsupportedVersion(u32),
    #[error("Duplicate obstacle id: {0}")]
    DuplicateObstacle(String),
    #[error("Duplicate proximity key: {0}")]
    DuplicateKey(ProximityKey),
    #[error("Node {key} references unknown obstacle {obstacle}")]
    UnknownObstacle { key: ProximityKey, obstacle: String },
    #[error("Node {0} has a zero-length up axis")]
    ZeroUpAxis(ProximityKey),
    #[error("Layout must contain at least one node")]
    NoNodes,
    #[error("Arena diameter must be positive, got {0}")]
    InvalidDiameter(f32),
}

/// Optional metadata for the layout file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LayoutMetadata {
    /// Human-readable name for this arena
    #[serde(default)]
    pub name: Option<String>,
    /// Tool or person that created this file
    #[serde(default)]
    pub created_by: Option<String>,
}

/// A decorative obstacle (a tree); only its orientation changes between matches
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObstaclePlacement {
    pub id: String,
    /// World position of the obstacle's base [x, y, z]
    pub position: [f32; 3],
    /// Radius of the vertical collision cylinder
    #[serde(default = "default_obstacle_radius")]
    pub collider_radius: f32,
    /// Height of the vertical collision cylinder
    #[serde(default = "default_obstacle_height")]
    pub collider_height: f32,
}

/// A resource node (a nest)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NodePlacement {
    /// Key the collision collaborator reports for this node's deposit zone
    pub key: ProximityKey,
    /// Parent obstacle; when set, position and up are in the obstacle's frame
    #[serde(default)]
    pub obstacle: Option<String>,
    /// Center of the deposit zone [x, y, z]
    pub position: [f32; 3],
    /// Direction pointing out of the node's opening
    pub up: [f32; 3],
    /// Radius of the spherical deposit zone
    #[serde(default = "default_zone_radius")]
    pub zone_radius: f32,
}

fn default_obstacle_radius() -> f32 {
    0.35
}

fn default_obstacle_height() -> f32 {
    4.0
}

fn default_zone_radius() -> f32 {
    0.12
}

fn default_diameter() -> f32 {
    DEFAULT_DIAMETER
}

/// Root structure for layout files
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArenaLayout {
    /// Schema version (currently 1)
    pub version: u32,
    #[serde(default)]
    pub metadata: Option<LayoutMetadata>,
    /// Characteristic diameter used to normalize observed distances
    #[serde(default = "default_diameter")]
    pub diameter: f32,
    /// Center of the arena floor
    #[serde(default)]
    pub center: [f32; 3],
    #[serde(default)]
    pub obstacles: Vec<ObstaclePlacement>,
    pub nodes: Vec<NodePlacement>,
}

impl ArenaLayout {
    /// Parse and validate a layout from a JSON string
    pub fn from_json(json: &str) -> Result<Self, LayoutError> {
        let layout: ArenaLayout = serde_json::from_str(json)?;
        layout.validate()?;
        Ok(layout)
    }

    /// Parse and validate a layout file on disk
    pub fn load(path: &Path) -> Result<Self, LayoutError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Check every structural rule the field relies on
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.version != LAYOUT_VERSION {
            return Err(LayoutError::UnsupportedVersion(self.version));
        }
        if !(self.diameter > 0.0) {
            return Err(LayoutError::InvalidDiameter(self.diameter));
        }
        if self.nodes.is_empty() {
            return Err(LayoutError::NoNodes);
        }

        let mut obstacle_ids = AHashSet::new();
        for obstacle in &self.obstacles {
            if !obstacle_ids.insert(obstacle.id.as_str()) {
                return Err(LayoutError::DuplicateObstacle(obstacle.id.clone()));
            }
        }

        let mut keys = AHashSet::new();
        for node in &self.nodes {
            if !keys.insert(&node.key) {
                return Err(LayoutError::DuplicateKey(node.key.clone()));
            }
            if let Some(ref parent) = node.obstacle {
                if !obstacle_ids.contains(parent.as_str()) {
                    return Err(LayoutError::UnknownObstacle {
                        key: node.key.clone(),
                        obstacle: parent.clone(),
                    });
                }
            }
            let [x, y, z] = node.up;
            if x * x + y * y + z * z <= f32::EPSILON {
                return Err(LayoutError::ZeroUpAxis(node.key.clone()));
            }
        }

        Ok(())
    }

    /// Built-in arena: six trees on a ring, two nests per tree facing outward
    pub fn default_layout() -> Self {
        const TREES: usize = 6;
        const RING_RADIUS: f32 = 5.0;

        let mut obstacles = Vec::with_capacity(TREES);
        let mut nodes = Vec::with_capacity(TREES * 2);

        for i in 0..TREES {
            let angle = i as f32 * std::f32::consts::TAU / TREES as f32;
            let id = format!("tree_{i}");
            obstacles.push(ObstaclePlacement {
                id: id.clone(),
                position: [RING_RADIUS * angle.sin(), 0.0, RING_RADIUS * angle.cos()],
                collider_radius: default_obstacle_radius(),
                collider_height: default_obstacle_height(),
            });

            // One nest on each side of the trunk, at different heights
            for (n, side) in [1.0f32, -1.0].into_iter().enumerate() {
                nodes.push(NodePlacement {
                    key: ProximityKey::new(format!("{id}/nest_{n}")),
                    obstacle: Some(id.clone()),
                    position: [0.6 * side, 1.6 + 0.5 * n as f32, 0.0],
                    up: [side, 0.3, 0.0],
                    zone_radius: default_zone_radius(),
                });
            }
        }

        Self {
            version: LAYOUT_VERSION,
            metadata: Some(LayoutMetadata {
                name: Some("Default grove".to_string()),
                created_by: None,
            }),
            diameter: DEFAULT_DIAMETER,
            center: [0.0, 0.0, 0.0],
            obstacles,
            nodes,
        }
    }
}

impl Default for ArenaLayout {
    fn default() -> Self {
        Self::default_layout()
    }
}
