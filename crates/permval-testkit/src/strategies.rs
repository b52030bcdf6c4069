//! Property test strategies for permval types

use permval_core::{AccessFlag, DisplayMode, ItemGrantRecord};
use proptest::prelude::*;

// Re-export proptest for convenience
pub use proptest;

/// Any access flag
pub fn arb_access_flag() -> impl Strategy<Value = AccessFlag> {
    any::<bool>().prop_map(AccessFlag::from_granted)
}

/// Either display mode
pub fn arb_display_mode() -> impl Strategy<Value = DisplayMode> {
    prop_oneof![Just(DisplayMode::AllAccess), Just(DisplayMode::MissingAccessOnly)]
}

/// Grant record with a small numeric item id and arbitrary flags
pub fn arb_grant_record() -> impl Strategy<Value = ItemGrantRecord> {
    (
        0u32..1000,
        arb_access_flag(),
        arb_access_flag(),
        arb_access_flag(),
        arb_access_flag(),
    )
        .prop_map(|(n, read, create, edit, delete)| ItemGrantRecord {
            item_id: format!("Custom Field.Item_{n}"),
            metadata_type: "Custom Field".to_string(),
            api_name: format!("Item_{n}"),
            label: format!("Item {n}"),
            description: String::new(),
            read,
            create,
            edit,
            delete,
        })
}

/// Up to `max` grant records
pub fn arb_grant_records(max: usize) -> impl Strategy<Value = Vec<ItemGrantRecord>> {
    prop::collection::vec(arb_grant_record(), 0..=max)
}

/// A permutation of `0..len`, for resolving features in arbitrary order
pub fn arb_resolution_order(len: usize) -> impl Strategy<Value = Vec<usize>> {
    Just((0..len).collect::<Vec<_>>()).prop_shuffle()
}
