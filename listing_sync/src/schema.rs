//! Diesel table definitions for the listing cache.

#![allow(missing_docs)]

diesel::table! {
    items (item_id) {
        item_id -> BigInt,
        active -> Text,
        available_quantity -> Integer,
        title -> Text,
        sku -> Text,
        start_date -> Timestamp,
        end_date -> Timestamp,
        category_id -> BigInt,
        category_name -> Text,
        condition_name -> Text,
        condition_description -> Text,
        description -> Text,
        post_id -> Nullable<BigInt>,
    }
}

diesel::table! {
    item_metadata (id) {
        id -> Integer,
        item_id -> BigInt,
        key -> Text,
        value -> Text,
        post_id -> Nullable<BigInt>,
    }
}

diesel::table! {
    sync_cursor (id) {
        id -> Integer,
        requests_today -> Integer,
        pending_item_ids -> Text,
        last_pull_date -> Nullable<Text>,
    }
}

diesel::allow_tables_to_appear_in_same_query!(items, item_metadata, sync_cursor);
