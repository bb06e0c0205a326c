//! Project Model
//!
//! The output hierarchy of a parsed screenplay:
//!
//! - [`Project`]: the root, named after the screenplay file
//! - [`Sequence`]: one scene-heading-delimited unit, with the assets cast in it
//! - [`Asset`]: an entity found in the screenplay (a character for now)
//!
//! A project's children are its sequences and its assets, in insertion order.
//! An asset cast in several sequences is a single project child: assets are
//! values compared by `(name, asset_type)`.
//!
//! The model exports to a JSON tree where every node carries `type`, `name` and
//! `children`. The export is one-directional.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Character,
    /// Uppercase span seen in action lines, never confirmed by a cue
    Undefined,
}

impl AssetType {
    pub fn as_str(self) -> &'static str {
        match self {
            AssetType::Character => "character",
            AssetType::Undefined => "undefined",
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Asset {
    pub name: String,
    pub asset_type: AssetType,
}

impl Asset {
    pub fn new(name: impl Into<String>, asset_type: AssetType) -> Self {
        Asset {
            name: name.into(),
            asset_type,
        }
    }

    pub fn character(name: impl Into<String>) -> Self {
        Asset::new(name, AssetType::Character)
    }

    pub fn undefined(name: impl Into<String>) -> Self {
        Asset::new(name, AssetType::Undefined)
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Asset({} -- {})", self.name, self.asset_type)
    }
}

/// A scene of the screenplay and its casting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Sequence {
    pub name: String,
    pub assets: BTreeSet<Asset>,
}

impl Sequence {
    pub fn new(name: impl Into<String>) -> Self {
        Sequence {
            name: name.into(),
            assets: BTreeSet::new(),
        }
    }

    /// Builder used in tests and comparisons.
    pub fn with_assets(mut self, assets: impl IntoIterator<Item = Asset>) -> Self {
        self.assets.extend(assets);
        self
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sequence({})", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProjectChild {
    Sequence(Sequence),
    Asset(Asset),
}

impl ProjectChild {
    pub fn name(&self) -> &str {
        match self {
            ProjectChild::Sequence(sequence) => &sequence.name,
            ProjectChild::Asset(asset) => &asset.name,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ProjectChild::Sequence(_) => "Sequence",
            ProjectChild::Asset(_) => "Asset",
        }
    }
}

impl fmt::Display for ProjectChild {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectChild::Sequence(sequence) => sequence.fmt(f),
            ProjectChild::Asset(asset) => asset.fmt(f),
        }
    }
}

/// Root of the hierarchy.
///
/// Equality ignores the order of the children.
#[derive(Debug, Clone, Eq)]
pub struct Project {
    pub name: String,
    children: Vec<ProjectChild>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Project {
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn children(&self) -> &[ProjectChild] {
        &self.children
    }

    pub fn sequences(&self) -> impl Iterator<Item = &Sequence> {
        self.children.iter().filter_map(|child| match child {
            ProjectChild::Sequence(sequence) => Some(sequence),
            ProjectChild::Asset(_) => None,
        })
    }

    pub fn assets(&self) -> impl Iterator<Item = &Asset> {
        self.children.iter().filter_map(|child| match child {
            ProjectChild::Asset(asset) => Some(asset),
            ProjectChild::Sequence(_) => None,
        })
    }

    pub(crate) fn sequences_mut(&mut self) -> impl Iterator<Item = &mut Sequence> {
        self.children.iter_mut().filter_map(|child| match child {
            ProjectChild::Sequence(sequence) => Some(sequence),
            ProjectChild::Asset(_) => None,
        })
    }

    /// Append a sequence. The assets it already holds become project children too.
    pub fn add_sequence(&mut self, sequence: Sequence) {
        for asset in &sequence.assets {
            self.add_asset(asset.clone());
        }
        self.children.push(ProjectChild::Sequence(sequence));
    }

    /// Add an asset as a direct child. Returns `false` if it was already there.
    pub fn add_asset(&mut self, asset: Asset) -> bool {
        if self.contains_asset(&asset) {
            return false;
        }
        self.children.push(ProjectChild::Asset(asset));
        true
    }

    pub fn contains_asset(&self, asset: &Asset) -> bool {
        self.assets().any(|known| known == asset)
    }

    /// Remove a direct asset child. Returns `false` if it was not there.
    pub fn remove_asset(&mut self, asset: &Asset) -> bool {
        let before = self.children.len();
        self.children
            .retain(|child| !matches!(child, ProjectChild::Asset(known) if known == asset));
        self.children.len() != before
    }

    /// Cast an asset in the last sequence, adding it to the project as well.
    ///
    /// Returns `false`, leaving the project untouched, when there is no
    /// sequence yet.
    pub fn cast(&mut self, asset: Asset) -> bool {
        let Some(sequence) = self.sequences_mut().last() else {
            return false;
        };
        sequence.assets.insert(asset.clone());
        self.add_asset(asset);
        true
    }

    /// Render the project as a JSON value.
    pub fn to_pmt_dict(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(PmtNode::from(self))
    }

    /// Render the project as a pretty-printed JSON document.
    ///
    /// Asset name lists are sorted, so the output only depends on the
    /// project content.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&PmtNode::from(self))
    }

    fn sorted_children(&self) -> Vec<&ProjectChild> {
        let mut children: Vec<&ProjectChild> = self.children.iter().collect();
        children.sort();
        children
    }
}

impl PartialEq for Project {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.sorted_children() == other.sorted_children()
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Project({})", self.name)
    }
}

/// Serialized shape of a project tree node
#[derive(Serialize)]
#[serde(tag = "type")]
enum PmtNode<'a> {
    Project {
        name: &'a str,
        children: Vec<PmtNode<'a>>,
    },
    Sequence {
        name: &'a str,
        assets: Vec<&'a str>,
        children: Vec<PmtNode<'a>>,
    },
    Asset {
        name: &'a str,
        asset_type: AssetType,
        children: Vec<PmtNode<'a>>,
    },
}

impl<'a> From<&'a Project> for PmtNode<'a> {
    fn from(project: &'a Project) -> Self {
        PmtNode::Project {
            name: &project.name,
            children: project.children.iter().map(PmtNode::from).collect(),
        }
    }
}

impl<'a> From<&'a ProjectChild> for PmtNode<'a> {
    fn from(child: &'a ProjectChild) -> Self {
        match child {
            ProjectChild::Sequence(sequence) => PmtNode::Sequence {
                name: &sequence.name,
                assets: sequence
                    .assets
                    .iter()
                    .map(|asset| asset.name.as_str())
                    .collect(),
                children: Vec::new(),
            },
            ProjectChild::Asset(asset) => PmtNode::Asset {
                name: &asset.name,
                asset_type: asset.asset_type,
                children: Vec::new(),
            },
        }
    }
}
