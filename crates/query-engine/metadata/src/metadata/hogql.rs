//! The built-in HogQL database: events, persons and the tables that connect them.

use std::sync::OnceLock;

use indexmap::IndexMap;

use super::database::{Database, FieldInfo, FieldType, TableInfo, TablesInfo};

/// The column every built-in table is scoped by.
pub const TEAM_ID_COLUMN: &str = "team_id";

/// The catalog used when the caller does not supply one.
pub fn hogql_database() -> &'static Database {
    static DATABASE: OnceLock<Database> = OnceLock::new();
    DATABASE.get_or_init(build_hogql_database)
}

fn table(storage_table: &str, fields: Vec<(&str, FieldInfo)>) -> TableInfo {
    TableInfo {
        storage_table: storage_table.to_string(),
        fields: fields
            .into_iter()
            .map(|(name, info)| (name.to_string(), info))
            .collect::<IndexMap<_, _>>(),
        scoping_column: Some(TEAM_ID_COLUMN.to_string()),
    }
}

fn build_hogql_database() -> Database {
    use FieldType::{Boolean, DateTime, Integer, Json, String as Text};

    let events = table(
        "events",
        vec![
            ("uuid", FieldInfo::column("uuid", Text)),
            ("event", FieldInfo::column("event", Text)),
            ("properties", FieldInfo::column("properties", Json)),
            ("timestamp", FieldInfo::column("timestamp", DateTime)),
            ("team_id", FieldInfo::column("team_id", Integer)),
            ("distinct_id", FieldInfo::column("distinct_id", Text)),
            ("elements_chain", FieldInfo::column("elements_chain", Text)),
            ("created_at", FieldInfo::column("created_at", DateTime)),
            ("person_id", FieldInfo::column("person_id", Text)),
            (
                "$session_id",
                FieldInfo::property("properties", &["$session_id"], Text),
            ),
            (
                "pdi",
                FieldInfo::lazy_join("person_distinct_ids", "distinct_id", "distinct_id"),
            ),
            ("person", FieldInfo::traverser(&["pdi", "person"])),
        ],
    );

    let persons = table(
        "person",
        vec![
            ("id", FieldInfo::column("id", Text)),
            ("created_at", FieldInfo::column("created_at", DateTime)),
            ("team_id", FieldInfo::column("team_id", Integer)),
            ("properties", FieldInfo::column("properties", Json)),
            ("is_identified", FieldInfo::column("is_identified", Boolean)),
            ("is_deleted", FieldInfo::column("is_deleted", Boolean)),
            ("version", FieldInfo::column("version", Integer)),
        ],
    );

    let person_distinct_ids = table(
        "person_distinct_id2",
        vec![
            ("distinct_id", FieldInfo::column("distinct_id", Text)),
            ("person_id", FieldInfo::column("person_id", Text)),
            ("team_id", FieldInfo::column("team_id", Integer)),
            ("is_deleted", FieldInfo::column("is_deleted", Boolean)),
            ("version", FieldInfo::column("version", Integer)),
            ("person", FieldInfo::lazy_join("persons", "person_id", "id")),
        ],
    );

    let session_recording_events = table(
        "session_recording_events",
        vec![
            ("uuid", FieldInfo::column("uuid", Text)),
            ("timestamp", FieldInfo::column("timestamp", DateTime)),
            ("team_id", FieldInfo::column("team_id", Integer)),
            ("distinct_id", FieldInfo::column("distinct_id", Text)),
            ("session_id", FieldInfo::column("session_id", Text)),
            ("window_id", FieldInfo::column("window_id", Text)),
            ("snapshot_data", FieldInfo::column("snapshot_data", Json)),
            ("created_at", FieldInfo::column("created_at", DateTime)),
            (
                "pdi",
                FieldInfo::lazy_join("person_distinct_ids", "distinct_id", "distinct_id"),
            ),
            ("person", FieldInfo::traverser(&["pdi", "person"])),
        ],
    );

    let cohort_people = table(
        "cohortpeople",
        vec![
            ("person_id", FieldInfo::column("person_id", Text)),
            ("cohort_id", FieldInfo::column("cohort_id", Integer)),
            ("team_id", FieldInfo::column("team_id", Integer)),
            ("sign", FieldInfo::column("sign", Integer)),
            ("version", FieldInfo::column("version", Integer)),
            ("person", FieldInfo::lazy_join("persons", "person_id", "id")),
        ],
    );

    let static_cohort_people = table(
        "person_static_cohort",
        vec![
            ("id", FieldInfo::column("id", Text)),
            ("person_id", FieldInfo::column("person_id", Text)),
            ("cohort_id", FieldInfo::column("cohort_id", Integer)),
            ("team_id", FieldInfo::column("team_id", Integer)),
            ("person", FieldInfo::lazy_join("persons", "person_id", "id")),
        ],
    );

    let groups = table(
        "groups",
        vec![
            ("index", FieldInfo::column("group_type_index", Integer)),
            ("team_id", FieldInfo::column("team_id", Integer)),
            ("key", FieldInfo::column("group_key", Text)),
            ("created_at", FieldInfo::column("created_at", DateTime)),
            ("properties", FieldInfo::column("group_properties", Json)),
        ],
    );

    Database {
        tables: TablesInfo(
            [
                ("events", events),
                ("persons", persons),
                ("person_distinct_ids", person_distinct_ids),
                ("session_recording_events", session_recording_events),
                ("cohort_people", cohort_people),
                ("static_cohort_people", static_cohort_people),
                ("groups", groups),
            ]
            .into_iter()
            .map(|(name, info)| (name.to_string(), info))
            .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_built_in_database_is_valid() {
        assert_eq!(hogql_database().validate(), Ok(()));
    }

    #[test]
    fn test_every_built_in_table_is_scoped() {
        for (name, table) in &hogql_database().tables.0 {
            assert_eq!(
                table.scoping_column.as_deref(),
                Some(TEAM_ID_COLUMN),
                "Table '{name}' is not scoped by team."
            );
            assert_eq!(table.column_for(TEAM_ID_COLUMN), Some(TEAM_ID_COLUMN));
        }
    }

    #[test]
    fn test_events_properties_is_json() {
        let events = hogql_database().get_table("events").unwrap();
        assert_eq!(
            events.get_field("properties"),
            Some(&FieldInfo::column("properties", FieldType::Json))
        );
    }

    #[test]
    fn test_catalog_round_trips_through_json() {
        let json = serde_json::to_value(hogql_database()).unwrap();
        let parsed: Database = serde_json::from_value(json).unwrap();
        similar_asserts::assert_eq!(&parsed, hogql_database());
    }
}
