// Luggage Telemetry - Aggregation and status engine
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! View selection layer
//!
//! A render pass resolves its selection once into a [`FilteredView`]; every
//! metric of that pass is computed from the same view.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::record::{LuggageItem, Tag};

/// Wire value of the "all luggage" selection.
pub const ALL_SENTINEL: &str = "All";

/// Current viewing filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Selection {
    /// Aggregate over every item
    #[default]
    All,
    /// One specific item
    Tag(Tag),
}

impl Selection {
    /// Parse the wire string. The literal "All" is the sentinel; anything
    /// else (after trimming) names a tag.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw == ALL_SENTINEL {
            Selection::All
        } else {
            Selection::Tag(Tag::new(raw))
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }

    pub fn tag(&self) -> Option<&Tag> {
        match self {
            Selection::All => None,
            Selection::Tag(tag) => Some(tag),
        }
    }

    /// Whether a record with `tag` belongs to this selection.
    pub fn matches(&self, tag: &Tag) -> bool {
        match self {
            Selection::All => true,
            Selection::Tag(selected) => selected == tag,
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::All => f.write_str(ALL_SENTINEL),
            Selection::Tag(tag) => f.write_str(tag.as_str()),
        }
    }
}

impl From<Tag> for Selection {
    fn from(tag: Tag) -> Self {
        Selection::Tag(tag)
    }
}

impl Serialize for Selection {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Selection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Selection::parse(&raw))
    }
}

/// One entry of the selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionOption {
    pub value: Selection,
    pub label: String,
}

/// Selector entries: the synthetic "All" entry, then one per item in input order.
pub fn selection_options(items: &[LuggageItem]) -> Vec<SelectionOption> {
    let mut options = Vec::with_capacity(items.len() + 1);
    options.push(SelectionOption {
        value: Selection::All,
        label: ALL_SENTINEL.to_string(),
    });
    options.extend(items.iter().map(|item| SelectionOption {
        value: Selection::Tag(item.tag.clone()),
        label: item.display_name().to_string(),
    }));
    options
}

/// A selection resolved against the current item list.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredView<'a> {
    selection: Selection,
    item: Option<&'a LuggageItem>,
    known: bool,
}

impl<'a> FilteredView<'a> {
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// The selected item; `None` for "All" or an unknown tag.
    pub fn item(&self) -> Option<&'a LuggageItem> {
        self.item
    }

    /// False only when a tag was selected that no current item carries.
    pub fn is_known(&self) -> bool {
        self.known
    }

    /// Whether a record with `tag` feeds this view's metrics.
    pub fn matches(&self, tag: &Tag) -> bool {
        self.known && self.selection.matches(tag)
    }
}

/// Resolve `selection` against `items`. Never fails.
pub fn apply_selection<'a>(items: &'a [LuggageItem], selection: &Selection) -> FilteredView<'a> {
    match selection {
        Selection::All => FilteredView {
            selection: Selection::All,
            item: None,
            known: true,
        },
        Selection::Tag(tag) => {
            let item = items.iter().find(|item| &item.tag == tag);
            FilteredView {
                selection: selection.clone(),
                item,
                known: item.is_some(),
            }
        }
    }
}
