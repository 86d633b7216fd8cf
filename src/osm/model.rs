// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use crate::Node;

/// Represents an [OSM way](https://wiki.openstreetmap.org/wiki/Way) with its
/// raw tags, before any routability filtering.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct Way {
    pub id: i64,
    pub nodes: Vec<i64>,
    pub tags: HashMap<String, String>,
}

/// Union over the [OSM elements](https://wiki.openstreetmap.org/wiki/Elements)
/// relevant for routing. Relations are skipped at the parser level.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Feature {
    Node(Node),
    Way(Way),
}

impl Feature {
    /// Applies a `<tag k v>` child element. Nodes only retain their display
    /// name; ways keep every tag for the routability filter.
    pub fn apply_tag(&mut self, k: String, v: String) {
        match self {
            Self::Node(node) => {
                if k == "name" {
                    node.name = Some(v);
                }
            }
            Self::Way(way) => {
                way.tags.insert(k, v);
            }
        }
    }
}
