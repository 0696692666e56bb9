use std::collections::BTreeSet;

use serde::Serialize;

/// Numeric id of an item kind. Items of the same type aggregate into one display entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ItemType(pub u32);

pub type ItemTypeSet = BTreeSet<ItemType>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ModId(pub u16);

/// One stored (or aggregated) stack of items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    pub item_type: ItemType,
    pub name: String,
    pub stack: u32,
    /// `None` for items that ship with the base game.
    pub source_mod: Option<ModId>,
    pub favorited: bool,
}

impl Item {
    pub fn new(item_type: u32, name: impl Into<String>, stack: u32) -> Self {
        Self {
            item_type: ItemType(item_type),
            name: name.into(),
            stack,
            source_mod: None,
            favorited: false,
        }
    }

    pub fn favorited(mut self) -> Self {
        self.favorited = true;
        self
    }

    pub fn from_mod(mut self, source_mod: ModId) -> Self {
        self.source_mod = Some(source_mod);
        self
    }
}

/// Category filter id. Filter options are registered by the sorter, only the
/// two ids below carry meaning for the refresh pipeline itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct FilterMode(pub u16);

impl FilterMode {
    pub const ALL: Self = Self(0);
    pub const RECENT: Self = Self(1);
}

/// Sort option id; `-1` asks the sorter to keep the incoming order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SortMode(pub i32);

impl SortMode {
    pub const UNSPECIFIED: Self = Self(-1);
    pub const DEFAULT: Self = Self(0);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ModFilter {
    #[default]
    AllMods,
    Only(ModId),
}

/// Display-layer selections that parameterize a refresh run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewOptions {
    pub filter: FilterMode,
    pub sort: SortMode,
    pub search_text: String,
    pub mod_filter: ModFilter,
    pub only_favorites: bool,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            filter: FilterMode::ALL,
            sort: SortMode::DEFAULT,
            search_text: String::new(),
            mod_filter: ModFilter::AllMods,
            only_favorites: false,
        }
    }
}

/// What the consumer is showing when a tick processes pending refreshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConsumerMode {
    /// The storage view is not shown; refreshing is meaningless.
    RefreshDisabled,
    /// A crafting view is shown; it runs its own refresh.
    Crafting,
    Storage { item_deletion: bool },
}

impl Default for ConsumerMode {
    fn default() -> Self {
        Self::Storage {
            item_deletion: false,
        }
    }
}
