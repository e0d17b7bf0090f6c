mod common;

use chrono::NaiveDate;
use common::{insert_item, setup_db, ts};
use listing_sync::models::NewItem;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[test]
fn upsert_overwrites_without_touching_post_id() {
    let (_db, mut cache) = setup_db();
    insert_item(&mut cache, 1001, "Active", 3, "2020-03-01 10:00:00");
    cache.mark_item_pushed(1001, 50).unwrap();

    let row = NewItem {
        item_id: 1001,
        active: "Completed",
        available_quantity: 0,
        title: "Renamed",
        sku: "SKU-1001",
        start_date: ts("2020-02-01 10:00:00"),
        end_date: ts("2020-02-20 10:00:00"),
        category_id: 11450,
        category_name: "Widgets",
        condition_name: "",
        condition_description: "",
        description: "",
    };
    cache.upsert_item(&row).unwrap();

    // Still one row, refreshed fields, push marker intact.
    assert!(cache.product_data(1001).unwrap().is_none()); // quantity is now 0
    assert_eq!(cache.item_post_id(1001).unwrap(), Some(50));
    let inactive = cache
        .inactive_pushed_item_ids(ts("2020-04-01 00:00:00"))
        .unwrap();
    assert_eq!(inactive, vec![1001]);
}

#[test]
fn metadata_triple_is_stored_once() {
    let (_db, mut cache) = setup_db();
    insert_item(&mut cache, 1001, "Active", 1, "2020-03-01 10:00:00");

    for _ in 0..3 {
        cache
            .upsert_metadata(1001, "picture_url", "https://img.example/a.jpg")
            .unwrap();
    }
    cache
        .upsert_metadata(1001, "picture_url", "https://img.example/b.jpg")
        .unwrap();
    cache.upsert_metadata(1001, "Brand", "Acme").unwrap();

    assert_eq!(cache.image_urls(1001).unwrap().len(), 2);
    assert_eq!(cache.all_metadata(1001).unwrap().len(), 3);
}

#[test]
fn active_ids_exclude_pushed_and_ended_listings() {
    let (_db, mut cache) = setup_db();
    insert_item(&mut cache, 1, "Active", 1, "2020-03-01 10:00:00");
    insert_item(&mut cache, 2, "Active", 1, "2020-03-01 10:00:00");
    insert_item(&mut cache, 3, "Completed", 1, "2020-03-01 10:00:00");
    cache.mark_item_pushed(2, 50).unwrap();

    assert_eq!(cache.active_item_ids().unwrap(), vec![1]);
}

#[test]
fn inactive_pushed_requires_a_push_marker() {
    let (_db, mut cache) = setup_db();
    // Ended but never pushed: not reconciliation work.
    insert_item(&mut cache, 1, "Completed", 0, "2020-02-10 10:00:00");
    // Pushed and status-ended.
    insert_item(&mut cache, 2, "Completed", 0, "2020-02-10 10:00:00");
    cache.mark_item_pushed(2, 50).unwrap();
    // Pushed, still "Active", but past its end date.
    insert_item(&mut cache, 3, "Active", 1, "2020-02-12 10:00:00");
    cache.mark_item_pushed(3, 51).unwrap();
    // Pushed and genuinely live.
    insert_item(&mut cache, 4, "Active", 1, "2020-06-01 10:00:00");
    cache.mark_item_pushed(4, 52).unwrap();

    let ids = cache
        .inactive_pushed_item_ids(ts("2020-02-15 00:00:00"))
        .unwrap();
    assert_eq!(ids, vec![2, 3]);
}

#[test]
fn product_data_hides_unsellable_rows() {
    let (_db, mut cache) = setup_db();
    insert_item(&mut cache, 1, "Active", 0, "2020-03-01 10:00:00");

    assert!(cache.product_data(1).unwrap().is_none());
    assert!(cache.product_data(999).unwrap().is_none());

    insert_item(&mut cache, 2, "Active", 5, "2020-03-01 10:00:00");
    let row = cache.product_data(2).unwrap().unwrap();
    assert_eq!(row.available_quantity, 5);
    assert_eq!(row.sku, "SKU-2");
}

#[test]
fn request_counter_and_checkpoint_round_trip() {
    let (_db, mut cache) = setup_db();
    assert_eq!(cache.request_count().unwrap(), 0);
    cache.increment_request_count().unwrap();
    cache.increment_request_count().unwrap();
    assert_eq!(cache.request_count().unwrap(), 2);

    cache.store_pending_ids(&[5, 6, 7]).unwrap();
    assert_eq!(cache.pending_detail_ids().unwrap(), vec![5, 6, 7]);

    cache.store_pending_ids(&[]).unwrap();
    // Empty checkpoint falls back to the active set.
    insert_item(&mut cache, 9, "Active", 1, "2020-03-01 10:00:00");
    assert_eq!(cache.pending_detail_ids().unwrap(), vec![9]);
}

#[test]
fn same_day_guard_refuses_second_run_and_resets_counter() {
    let (_db, mut cache) = setup_db();
    assert!(cache.try_begin_seller_list_run(d(2020, 3, 1)).unwrap());
    cache.increment_request_count().unwrap();
    cache.increment_request_count().unwrap();

    assert!(!cache.try_begin_seller_list_run(d(2020, 3, 1)).unwrap());
    assert_eq!(cache.request_count().unwrap(), 2);

    assert!(cache.try_begin_seller_list_run(d(2020, 3, 2)).unwrap());
    assert_eq!(cache.request_count().unwrap(), 0);
}

#[test]
fn push_markers_set_and_clear() {
    let (_db, mut cache) = setup_db();
    insert_item(&mut cache, 1, "Active", 1, "2020-03-01 10:00:00");
    cache.upsert_metadata(1, "Brand", "Acme").unwrap();

    cache.mark_item_pushed(1, 50).unwrap();
    assert_eq!(cache.item_post_id(1).unwrap(), Some(50));

    let meta_id = cache.all_metadata(1).unwrap()[0].id;
    cache.mark_metadata_pushed(meta_id, 900).unwrap();
    assert_eq!(cache.all_metadata(1).unwrap()[0].post_id, Some(900));

    cache.clear_item_post_id(1).unwrap();
    assert_eq!(cache.item_post_id(1).unwrap(), None);
}
