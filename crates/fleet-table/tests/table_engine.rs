use std::sync::Arc;

use async_trait::async_trait;
use calamine::{Data, Reader, Xlsx, open_workbook};
use fleet_layout::{MemoryStore, MoveDirection};
use fleet_model::{
    Action, CellValue, ColumnDescriptor, ColumnSet, DataRecord, Mutations, MutationError,
    Record, RecordId, SubmitResponse,
};
use fleet_table::{
    RowAction, SearchScope, SortDirection, TableError, TableViewEngine, perform_row_action,
};
use proptest::prelude::*;

fn vehicle(id: &str, plate: &str, seats: Option<f64>) -> DataRecord {
    DataRecord::new(RecordId::new(id).unwrap())
        .with_field("plate", plate)
        .with_field("seats", seats)
}

fn vehicle_columns() -> ColumnSet<DataRecord> {
    ColumnSet::new(vec![
        ColumnDescriptor::new("plate", "Plate"),
        ColumnDescriptor::new("seats", "Seats"),
        ColumnDescriptor::new("label", "Label")
            .sortable(false)
            .with_render(|record: &DataRecord| {
                CellValue::List(vec![
                    CellValue::from("Vehicle "),
                    record.value("plate"),
                ])
            }),
        ColumnDescriptor::new("notes", "Notes").visible_by_default(false),
    ])
    .unwrap()
}

fn engine_with(records: Vec<DataRecord>) -> TableViewEngine<DataRecord> {
    TableViewEngine::new(vehicle_columns(), Arc::new(MemoryStore::new()), "vehicles")
        .with_records(records)
}

fn ids(records: &[&DataRecord]) -> Vec<String> {
    records.iter().map(|record| record.id().to_string()).collect()
}

#[test]
fn null_sorts_first_ascending_and_last_descending() {
    let mut table = TableViewEngine::new(
        ColumnSet::new(vec![
            ColumnDescriptor::new("name", "Name"),
            ColumnDescriptor::new("age", "Age"),
        ])
        .unwrap(),
        Arc::new(MemoryStore::new()),
        "people",
    )
    .with_records(vec![
        DataRecord::new(RecordId::new("1").unwrap())
            .with_field("name", "Beta")
            .with_field("age", CellValue::Null),
        DataRecord::new(RecordId::new("2").unwrap())
            .with_field("name", "Alpha")
            .with_field("age", 30.0),
    ]);

    table.set_sort("age");
    assert_eq!(ids(&table.sorted_records()), vec!["1", "2"]);
    table.set_sort("age");
    assert_eq!(ids(&table.sorted_records()), vec!["2", "1"]);
}

#[test]
fn twenty_five_records_paginate_as_ten_ten_five() {
    let records = (0..25)
        .map(|n| vehicle(&format!("v-{n:02}"), &format!("P-{n:02}"), Some(4.0)))
        .collect();
    let mut table = engine_with(records);
    assert_eq!(table.total_pages(), 3);

    let mut sizes = Vec::new();
    for page in 1..=3 {
        table.set_page(page);
        sizes.push(table.page_records().len());
    }
    assert_eq!(sizes, vec![10, 10, 5]);

    table.set_page(3);
    table.set_items_per_page(20);
    assert_eq!(table.current_page(), 1);
    assert_eq!(table.total_pages(), 2);
}

#[test]
fn view_projects_visible_columns_in_layout_order() {
    let mut table = engine_with(vec![
        vehicle("v-1", "ZX-9", Some(2.0)),
        vehicle("v-2", "AB-1", None),
    ]);
    table.move_column("seats", MoveDirection::Up);
    table.set_sort("plate");

    let view = table.view();
    let keys: Vec<&str> = view.headers.iter().map(|h| h.key.as_str()).collect();
    assert_eq!(keys, vec!["seats", "plate", "label"]);
    assert_eq!(view.headers[1].sort, Some(SortDirection::Ascending));
    assert_eq!(view.rows[0].id, "v-2");
    assert_eq!(
        view.rows[0].cells,
        vec![
            CellValue::Null,
            CellValue::from("AB-1"),
            CellValue::List(vec![CellValue::from("Vehicle "), CellValue::from("AB-1")]),
        ]
    );
    assert_eq!(view.filtered_count, 2);
    assert_eq!(view.total_count, 2);
}

#[test]
fn search_covers_hidden_fields_unless_column_scoped() {
    let records = vec![
        vehicle("v-1", "AB-1", Some(2.0)).with_field("notes", "needs tyres"),
        vehicle("v-2", "CD-2", Some(5.0)),
    ];
    let mut table = engine_with(records.clone());
    table.set_search_term("TYRES");
    assert_eq!(ids(&table.filtered_records()), vec!["v-1"]);

    let mut scoped = engine_with(records).with_search_scope(SearchScope::VisibleColumns);
    scoped.set_search_term("tyres");
    assert!(scoped.filtered_records().is_empty());
    scoped.set_search_term("vehicle cd");
    assert_eq!(ids(&scoped.filtered_records()), vec!["v-2"]);
}

#[test]
fn view_counts_describe_the_filtered_set() {
    let mut table = engine_with(vec![
        vehicle("v-1", "AB-1", Some(2.0)),
        vehicle("v-2", "CD-2", None),
        vehicle("v-3", "EF-3", Some(4.0)),
    ])
    .with_items_per_page(2);
    table.set_sort("plate");
    table.set_page(2);

    let view = table.view();
    assert_eq!((view.page, view.total_pages), (2, 2));
    assert_eq!((view.filtered_count, view.total_count), (3, 3));
    assert_eq!(view.rows.len(), 1);
    assert_eq!(view.rows[0].id, "v-3");
    assert_eq!(view.rows[0].cells.len(), view.headers.len());
    let plate = &view.headers[0];
    assert_eq!((plate.key.as_str(), plate.label.as_str()), ("plate", "Plate"));
    assert_eq!(plate.sort, Some(SortDirection::Ascending));

    table.set_search_term("zz");
    let empty = table.view();
    assert_eq!((empty.page, empty.total_pages), (1, 0));
    assert_eq!((empty.filtered_count, empty.total_count), (0, 3));
    assert!(empty.rows.is_empty());
}

#[test]
fn layout_is_shared_through_storage_key() {
    let store = Arc::new(MemoryStore::new());
    let mut first = TableViewEngine::<DataRecord>::new(vehicle_columns(), store.clone(), "fleet");
    first.toggle_column("notes");
    first.toggle_column("label");

    let second = TableViewEngine::<DataRecord>::new(vehicle_columns(), store, "fleet");
    let keys: Vec<&str> = second
        .visible_columns()
        .iter()
        .map(|c| c.key.as_str())
        .collect();
    assert_eq!(keys, vec!["plate", "seats", "notes"]);
}

#[test]
fn xlsx_export_round_trips_through_calamine() {
    let mut table = engine_with(vec![
        vehicle("v-1", "AB-1", Some(2.0)),
        vehicle("v-2", "CD-2", None),
    ]);
    table.set_sort("plate");
    table.set_sort("plate");
    let export = table.project_for_export().unwrap();
    assert_eq!(export.headers, vec!["Plate", "Seats", "Label"]);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vehicles.xlsx");
    export.write_xlsx(&path, "Vehicles").unwrap();

    let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
    let range = workbook.worksheet_range("Vehicles").unwrap();
    let rows: Vec<Vec<Data>> = range.rows().map(<[Data]>::to_vec).collect();
    assert_eq!(rows[0][0], Data::String("Plate".to_string()));
    assert_eq!(rows[1][0], Data::String("CD-2".to_string()));
    assert_eq!(rows[1][2], Data::String("Vehicle CD-2".to_string()));
    assert_eq!(rows[2][1], Data::Float(2.0));
}

#[test]
fn csv_export_writes_header_and_rows() {
    let table = engine_with(vec![vehicle("v-1", "AB-1", Some(2.0))]);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vehicles.csv");
    table.project_for_export().unwrap().write_csv(&path).unwrap();
    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(written, "Plate,Seats,Label\nAB-1,2,Vehicle AB-1\n");
}

#[test]
fn filtered_out_export_is_rejected() {
    let mut table = engine_with(vec![vehicle("v-1", "AB-1", Some(2.0))]);
    table.set_search_term("no such vehicle");
    assert!(matches!(
        table.project_for_export(),
        Err(TableError::NothingToExport)
    ));
}

struct RecordingSink;

#[async_trait]
impl Mutations<DataRecord> for RecordingSink {
    async fn add(&self, record: &DataRecord) -> Result<SubmitResponse, MutationError> {
        Ok(SubmitResponse::accepted("added").with_id(record.id()))
    }

    async fn remove(&self, id: &str) -> Result<SubmitResponse, MutationError> {
        Ok(SubmitResponse::accepted(format!("removed {id}")))
    }
}

#[tokio::test]
async fn row_actions_follow_the_capability_oracle() {
    let oracle = Arc::new(|resource: &str, action: Action| {
        resource == "vehicles" && action != Action::Delete
    });
    let table = engine_with(vec![vehicle("v-1", "AB-1", None)])
        .with_capabilities("vehicles", oracle);
    let slots = table.row_actions();
    assert!(slots.can_add && slots.can_edit && !slots.can_delete);

    let record = vehicle("v-9", "NEW-1", None);
    let added = perform_row_action(
        table.capabilities(),
        table.resource_type(),
        &RecordingSink,
        RowAction::Add(&record),
    )
    .await
    .unwrap();
    assert_eq!(added.id.as_deref(), Some("v-9"));

    let denied = perform_row_action(
        table.capabilities(),
        table.resource_type(),
        &RecordingSink,
        RowAction::<DataRecord>::Delete("v-1"),
    )
    .await;
    assert!(matches!(
        denied,
        Err(TableError::Forbidden {
            action: Action::Delete,
            ..
        })
    ));

    let unsupported = perform_row_action(
        table.capabilities(),
        table.resource_type(),
        &RecordingSink,
        RowAction::Edit(&record),
    )
    .await;
    assert!(matches!(
        unsupported,
        Err(TableError::Mutation(MutationError::Unsupported { .. }))
    ));
}

proptest! {
    #[test]
    fn pages_concatenate_to_sorted_set(
        seats in prop::collection::vec(prop::option::of(0u8..20), 0..60),
        per_page in 1usize..15,
        descending in any::<bool>(),
    ) {
        let records: Vec<DataRecord> = seats
            .iter()
            .enumerate()
            .map(|(n, seat)| vehicle(&format!("v-{n}"), "P", seat.map(f64::from)))
            .collect();
        let mut table = engine_with(records).with_items_per_page(per_page);
        table.set_sort("seats");
        if descending {
            table.set_sort("seats");
        }
        let expected = ids(&table.sorted_records());

        let mut collected = Vec::new();
        for page in 1..=table.total_pages() {
            table.set_page(page);
            collected.extend(ids(&table.page_records()));
        }
        prop_assert_eq!(collected, expected);
    }

    #[test]
    fn nulls_are_smallest(
        seats in prop::collection::vec(prop::option::of(0u8..20), 1..40),
    ) {
        let records: Vec<DataRecord> = seats
            .iter()
            .enumerate()
            .map(|(n, seat)| vehicle(&format!("v-{n}"), "P", seat.map(f64::from)))
            .collect();
        let mut table = engine_with(records);
        table.set_sort("seats");
        let ascending: Vec<bool> = table
            .sorted_records()
            .iter()
            .map(|r| r.value("seats").is_null())
            .collect();
        let nulls = ascending.iter().filter(|null| **null).count();
        prop_assert!(ascending[..nulls].iter().all(|null| *null));

        table.set_sort("seats");
        let descending: Vec<bool> = table
            .sorted_records()
            .iter()
            .map(|r| r.value("seats").is_null())
            .collect();
        let split = descending.len() - nulls;
        prop_assert!(descending[split..].iter().all(|null| *null));
    }
}
