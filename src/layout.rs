//! Grouped grid layout.
//!
//! Services sharing a [`group_key`] are packed into a square-ish grid, and the
//! groups themselves are placed on an outer grid of `groups_per_row` columns.
//! The pass is a pure function of the config's key order.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::classify::group_key;
use crate::compose::ConfigModel;
use crate::error::{Error, Result};

const NODE_WIDTH: f32 = 200.0;
const NODE_HEIGHT: f32 = 50.0;
const NODE_PADDING: f32 = 10.0;
const GROUP_PADDING: f32 = 20.0;
const GROUPS_PER_ROW: usize = 3;

/// Absolute node center
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Bounding box for layout elements
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn union(&self, other: &BBox) -> BBox {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        BBox::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.bottom().max(other.bottom()) - y,
        )
    }
}

/// How the outer grid cell size is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridSpacing {
    /// Each group is placed with the largest group size seen so far,
    /// including itself.
    #[default]
    Running,
    /// Every group is placed with the largest group size overall.
    Uniform,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutParams {
    #[serde(default = "default_node_width")]
    pub node_width: f32,
    #[serde(default = "default_node_height")]
    pub node_height: f32,
    /// Gap between nodes inside a group
    #[serde(default = "default_node_padding")]
    pub node_padding: f32,
    /// Inset of nodes from their group frame, and gap between groups
    #[serde(default = "default_group_padding")]
    pub group_padding: f32,
    #[serde(default = "default_groups_per_row")]
    pub groups_per_row: usize,
    #[serde(default)]
    pub spacing: GridSpacing,
}

fn default_node_width() -> f32 {
    NODE_WIDTH
}
fn default_node_height() -> f32 {
    NODE_HEIGHT
}
fn default_node_padding() -> f32 {
    NODE_PADDING
}
fn default_group_padding() -> f32 {
    GROUP_PADDING
}
fn default_groups_per_row() -> usize {
    GROUPS_PER_ROW
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            node_width: NODE_WIDTH,
            node_height: NODE_HEIGHT,
            node_padding: NODE_PADDING,
            group_padding: GROUP_PADDING,
            groups_per_row: GROUPS_PER_ROW,
            spacing: GridSpacing::Running,
        }
    }
}

impl LayoutParams {
    pub fn from_toml(content: &str) -> Result<Self> {
        let params: Self = toml::from_str(content)
            .map_err(|e| Error::Layout(format!("failed to parse TOML: {}", e)))?;
        params.validate()
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let params: Self = serde_yaml::from_str(content)
            .map_err(|e| Error::Layout(format!("failed to parse YAML: {}", e)))?;
        params.validate()
    }

    /// Load from a `.toml`, `.yaml` or `.yml` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("yaml" | "yml") => Self::from_yaml(&content),
            _ => Self::from_toml(&content),
        }
    }

    pub fn validate(self) -> Result<Self> {
        if self.groups_per_row == 0 {
            return Err(Error::Layout("groups_per_row must be at least 1".into()));
        }
        for (field, value) in [("node_width", self.node_width), ("node_height", self.node_height)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::Layout(format!("{field} must be positive, got {value}")));
            }
        }
        for (field, value) in [
            ("node_padding", self.node_padding),
            ("group_padding", self.group_padding),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::Layout(format!(
                    "{field} must not be negative, got {value}"
                )));
            }
        }
        Ok(self)
    }
}

/// Services sharing a group key, in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub key: String,
    pub members: Vec<String>,
}

/// A placed group: its members plus the frame they are drawn in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupFrame {
    pub key: String,
    pub members: Vec<String>,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub items_per_row: usize,
}

impl GroupFrame {
    pub fn bbox(&self) -> BBox {
        BBox::new(self.x, self.y, self.width, self.height)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Layout {
    pub positions: IndexMap<String, Point>,
    pub groups: Vec<GroupFrame>,
    pub bbox: BBox,
}

/// Partition names by [`group_key`], keeping first-seen order for both the
/// groups and their members.
pub fn group_services<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<Group> {
    let mut groups: IndexMap<&str, Vec<String>> = IndexMap::new();
    for name in names {
        groups
            .entry(group_key(name))
            .or_default()
            .push(name.to_string());
    }
    groups
        .into_iter()
        .map(|(key, members)| Group {
            key: key.to_string(),
            members,
        })
        .collect()
}

/// `ceil(sqrt(count))`, at least 1.
pub fn items_per_row(count: usize) -> usize {
    let mut side = (count as f64).sqrt().ceil() as usize;
    // float rounding can be off by one for very large counts
    while side.saturating_mul(side) < count {
        side += 1;
    }
    while side > 1 && (side - 1) * (side - 1) >= count {
        side -= 1;
    }
    side.max(1)
}

/// Layout engine for service groups
pub struct LayoutEngine {
    pub params: LayoutParams,
}

impl LayoutEngine {
    pub fn new(params: LayoutParams) -> Self {
        Self { params }
    }

    fn group_size(&self, members: usize, per_row: usize) -> (f32, f32) {
        let p = &self.params;
        let rows = members.div_ceil(per_row);
        let width =
            per_row as f32 * (p.node_width + p.node_padding) - p.node_padding + p.group_padding * 2.0;
        let height =
            rows as f32 * (p.node_height + p.node_padding) - p.node_padding + p.group_padding * 2.0;
        (width, height)
    }

    pub fn layout(&self, config: &ConfigModel) -> Layout {
        let groups = group_services(config.keys().map(String::as_str));
        if groups.is_empty() {
            return Layout::default();
        }

        let p = &self.params;
        let sized: Vec<(Group, usize, f32, f32)> = groups
            .into_iter()
            .map(|group| {
                let per_row = items_per_row(group.members.len());
                let (w, h) = self.group_size(group.members.len(), per_row);
                (group, per_row, w, h)
            })
            .collect();

        let (mut max_width, mut max_height) = match p.spacing {
            GridSpacing::Running => (0.0f32, 0.0f32),
            GridSpacing::Uniform => sized.iter().fold((0.0f32, 0.0f32), |(mw, mh), s| {
                (mw.max(s.2), mh.max(s.3))
            }),
        };

        // unvalidated params still lay out, one group per row at least
        let groups_per_row = p.groups_per_row.max(1);
        let mut positions = IndexMap::with_capacity(config.len());
        let mut frames = Vec::with_capacity(sized.len());

        for (index, (group, per_row, width, height)) in sized.into_iter().enumerate() {
            max_width = max_width.max(width);
            max_height = max_height.max(height);

            let row = index / groups_per_row;
            let col = index % groups_per_row;
            let origin_x = col as f32 * (max_width + p.group_padding);
            let origin_y = row as f32 * (max_height + p.group_padding);

            for (i, name) in group.members.iter().enumerate() {
                let r = i / per_row;
                let c = i % per_row;
                let x = origin_x
                    + c as f32 * (p.node_width + p.node_padding)
                    + p.node_width / 2.0
                    + p.group_padding;
                let y = origin_y
                    + r as f32 * (p.node_height + p.node_padding)
                    + p.node_height / 2.0
                    + p.group_padding;
                positions.insert(name.clone(), Point::new(x, y));
            }

            frames.push(GroupFrame {
                key: group.key,
                members: group.members,
                x: origin_x,
                y: origin_y,
                width,
                height,
                items_per_row: per_row,
            });
        }

        let bbox = frames
            .iter()
            .map(GroupFrame::bbox)
            .reduce(|acc, b| acc.union(&b))
            .unwrap_or_default();

        Layout {
            positions,
            groups: frames,
            bbox,
        }
    }
}
