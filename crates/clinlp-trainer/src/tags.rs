//! # CoNLL-2002 Tags
//!
//! The IOB2 tag set of the Dutch CoNLL-2002 named-entity task.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// IOB2 tags for the four CoNLL entity types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConllTag {
    Outside,
    BeginMisc,
    InsideMisc,
    BeginPer,
    InsidePer,
    BeginOrg,
    InsideOrg,
    BeginLoc,
    InsideLoc,
}

impl ConllTag {
    /// Total number of distinct tags.
    pub const NUM_TAGS: usize = 9;

    /// All tags in label-list order.
    pub fn all_tags() -> &'static [ConllTag] {
        &[
            ConllTag::Outside,
            ConllTag::BeginMisc,
            ConllTag::InsideMisc,
            ConllTag::BeginPer,
            ConllTag::InsidePer,
            ConllTag::BeginOrg,
            ConllTag::InsideOrg,
            ConllTag::BeginLoc,
            ConllTag::InsideLoc,
        ]
    }

    /// Position of the tag in the label list.
    pub fn index(&self) -> usize {
        match self {
            ConllTag::Outside => 0,
            ConllTag::BeginMisc => 1,
            ConllTag::InsideMisc => 2,
            ConllTag::BeginPer => 3,
            ConllTag::InsidePer => 4,
            ConllTag::BeginOrg => 5,
            ConllTag::InsideOrg => 6,
            ConllTag::BeginLoc => 7,
            ConllTag::InsideLoc => 8,
        }
    }

    pub fn from_index(idx: usize) -> Option<Self> {
        Self::all_tags().get(idx).copied()
    }

    pub fn is_begin(&self) -> bool {
        matches!(
            self,
            ConllTag::BeginMisc | ConllTag::BeginPer | ConllTag::BeginOrg | ConllTag::BeginLoc
        )
    }

    pub fn is_inside(&self) -> bool {
        matches!(
            self,
            ConllTag::InsideMisc | ConllTag::InsidePer | ConllTag::InsideOrg | ConllTag::InsideLoc
        )
    }

    pub fn entity_type(&self) -> Option<EntityType> {
        match self {
            ConllTag::BeginMisc | ConllTag::InsideMisc => Some(EntityType::Misc),
            ConllTag::BeginPer | ConllTag::InsidePer => Some(EntityType::Per),
            ConllTag::BeginOrg | ConllTag::InsideOrg => Some(EntityType::Org),
            ConllTag::BeginLoc | ConllTag::InsideLoc => Some(EntityType::Loc),
            ConllTag::Outside => None,
        }
    }

    /// Whether `to` may follow `from` in a well-formed IOB2 sequence.
    ///
    /// An inside tag must continue a chunk of the same type.
    pub fn is_valid_transition(from: ConllTag, to: ConllTag) -> bool {
        if !to.is_inside() {
            return true;
        }
        from.entity_type() == to.entity_type()
    }

    /// Whether the tag may open a sentence.
    pub fn is_valid_start(&self) -> bool {
        !self.is_inside()
    }
}

impl fmt::Display for ConllTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConllTag::Outside => write!(f, "O"),
            ConllTag::BeginMisc => write!(f, "B-MISC"),
            ConllTag::InsideMisc => write!(f, "I-MISC"),
            ConllTag::BeginPer => write!(f, "B-PER"),
            ConllTag::InsidePer => write!(f, "I-PER"),
            ConllTag::BeginOrg => write!(f, "B-ORG"),
            ConllTag::InsideOrg => write!(f, "I-ORG"),
            ConllTag::BeginLoc => write!(f, "B-LOC"),
            ConllTag::InsideLoc => write!(f, "I-LOC"),
        }
    }
}

impl FromStr for ConllTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all_tags()
            .iter()
            .find(|tag| tag.to_string() == s)
            .copied()
            .ok_or_else(|| s.to_string())
    }
}

/// Entity types of the CoNLL task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityType {
    #[serde(rename = "LOC")]
    Loc,
    #[serde(rename = "MISC")]
    Misc,
    #[serde(rename = "ORG")]
    Org,
    #[serde(rename = "PER")]
    Per,
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityType::Loc => "LOC",
            EntityType::Misc => "MISC",
            EntityType::Org => "ORG",
            EntityType::Per => "PER",
        };
        f.write_str(name)
    }
}
