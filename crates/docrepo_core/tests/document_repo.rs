mod common;

use common::{Person, RecordingSink};
use docrepo_core::db::open_db_in_memory;
use docrepo_core::{
    DocumentRepository, Filter, JsonDocument, QueryOptions, RepoError, SaveOptions, SortOrder,
    SqliteDocumentStore, UpdateOptions, CONFLICT_MESSAGE,
};
use log::Level;
use rusqlite::Connection;
use serde_json::json;
use std::sync::Arc;

fn people(conn: &Connection) -> SqliteDocumentStore<'_> {
    SqliteDocumentStore::try_new(conn, "people").unwrap()
}

#[test]
fn create_update_remove_scenario() {
    let conn = open_db_in_memory().unwrap();
    let store = people(&conn);
    let repo = DocumentRepository::<Person, _>::new(&store);

    let created = repo
        .create(&json!({"name": "a"}), &SaveOptions::default())
        .unwrap();
    assert_eq!(created.name, "a");
    assert_eq!(created.created_at, created.updated_at);
    let id = created.id.to_string();

    let updated = repo
        .update_one_by_id(&id, &json!({"name": "b"}), &UpdateOptions::default())
        .unwrap();
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.name, "b");
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at > created.updated_at);

    assert!(repo.remove_one_by_id(&id).unwrap());
    assert!(repo.get_one_by_id(&id, &QueryOptions::default()).is_none());
}

#[test]
fn created_id_is_stable_across_lookups() {
    let conn = open_db_in_memory().unwrap();
    let store = people(&conn);
    let repo = DocumentRepository::<Person, _>::new(&store);

    let created = repo
        .create(&json!({"name": "ada", "age": 36}), &SaveOptions::default())
        .unwrap();
    assert!(!created.id.to_string().is_empty());

    for _ in 0..2 {
        let loaded = repo
            .get_one_by_id(&created.id.to_string(), &QueryOptions::default())
            .unwrap();
        assert_eq!(loaded, created);
    }
}

#[test]
fn duplicate_unique_key_yields_conflict_and_first_survives() {
    let conn = open_db_in_memory().unwrap();
    let store = people(&conn);
    store.ensure_unique_index(&["email"]).unwrap();
    let repo = DocumentRepository::<Person, _>::new(&store);

    let first = repo
        .create(&json!({"name": "a", "email": "a@x.io"}), &SaveOptions::default())
        .unwrap();
    let err = repo
        .create(&json!({"name": "b", "email": "a@x.io"}), &SaveOptions::default())
        .unwrap_err();

    assert!(matches!(err, RepoError::Conflict(ref message) if message == CONFLICT_MESSAGE));
    let loaded = repo
        .get_one_by_id(&first.id.to_string(), &QueryOptions::default())
        .unwrap();
    assert_eq!(loaded.name, "a");
    assert_eq!(repo.count(&Filter::all()).unwrap(), 1);
}

#[test]
fn duplicate_explicit_id_yields_conflict() {
    let conn = open_db_in_memory().unwrap();
    let store = people(&conn);
    let repo = DocumentRepository::<Person, _>::new(&store);

    let first = repo
        .create(&json!({"name": "a"}), &SaveOptions::default())
        .unwrap();
    let err = repo
        .create(
            &json!({"_id": first.id.to_string(), "name": "b"}),
            &SaveOptions::default(),
        )
        .unwrap_err();
    assert!(matches!(err, RepoError::Conflict(_)));
}

#[test]
fn documents_without_the_unique_field_do_not_collide() {
    let conn = open_db_in_memory().unwrap();
    let store = people(&conn);
    store.ensure_unique_index(&["email"]).unwrap();
    let repo = DocumentRepository::<Person, _>::new(&store);

    repo.create(&json!({"name": "a"}), &SaveOptions::default())
        .unwrap();
    repo.create(&json!({"name": "b"}), &SaveOptions::default())
        .unwrap();
    assert_eq!(repo.count(&Filter::all()).unwrap(), 2);
}

#[test]
fn update_missing_id_returns_not_found_without_mutation() {
    let conn = open_db_in_memory().unwrap();
    let store = people(&conn);
    let repo = DocumentRepository::<Person, _>::new(&store);
    let existing = repo
        .create(&json!({"name": "a"}), &SaveOptions::default())
        .unwrap();

    let missing = docrepo_core::DocumentId::new();
    let err = repo
        .update_one_by_id(
            &missing.to_string(),
            &json!({"name": "ghost"}),
            &UpdateOptions::default(),
        )
        .unwrap_err();

    assert!(matches!(err, RepoError::NotFound(id) if id == missing));
    assert_eq!(repo.count(&Filter::all()).unwrap(), 1);
    let reloaded = repo
        .get_one_by_id(&existing.id.to_string(), &QueryOptions::default())
        .unwrap();
    assert_eq!(reloaded, existing);
}

#[test]
fn update_ignores_envelope_fields_in_patch() {
    let conn = open_db_in_memory().unwrap();
    let store = people(&conn);
    let repo = DocumentRepository::<Person, _>::new(&store);
    let created = repo
        .create(&json!({"name": "a"}), &SaveOptions::default())
        .unwrap();

    let updated = repo
        .update_one_by_id(
            &created.id.to_string(),
            &json!({
                "_id": docrepo_core::DocumentId::new().to_string(),
                "createdAt": 1,
                "updatedAt": 1,
                "age": 40,
            }),
            &UpdateOptions::default(),
        )
        .unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at > created.updated_at);
    assert_eq!(updated.age, Some(40));

    let reloaded = repo
        .get_one_by_id(&created.id.to_string(), &QueryOptions::default())
        .unwrap();
    assert_eq!(reloaded, updated);
}

#[test]
fn updated_at_strictly_increases_across_rapid_updates() {
    let conn = open_db_in_memory().unwrap();
    let store = people(&conn);
    let repo = DocumentRepository::<Person, _>::new(&store);
    let created = repo
        .create(&json!({"name": "a"}), &SaveOptions::default())
        .unwrap();

    let mut previous = created.updated_at;
    for age in 0..5 {
        let updated = repo
            .update_one_by_id(
                &created.id.to_string(),
                &json!({"age": age}),
                &UpdateOptions::default(),
            )
            .unwrap();
        assert!(updated.updated_at > previous);
        previous = updated.updated_at;
    }
}

#[test]
fn update_null_removes_field() {
    let conn = open_db_in_memory().unwrap();
    let store = people(&conn);
    let repo = DocumentRepository::<Person, _>::new(&store);
    let created = repo
        .create(&json!({"name": "a", "age": 3}), &SaveOptions::default())
        .unwrap();

    let updated = repo
        .update_one_by_id(
            &created.id.to_string(),
            &json!({"age": null}),
            &UpdateOptions::default(),
        )
        .unwrap();
    assert_eq!(updated.age, None);
    assert_eq!(
        repo.count(&Filter::exists("age", true)).unwrap(),
        0
    );
}

#[test]
fn update_conflict_leaves_document_unchanged() {
    let conn = open_db_in_memory().unwrap();
    let store = people(&conn);
    store.ensure_unique_index(&["email"]).unwrap();
    let repo = DocumentRepository::<Person, _>::new(&store);

    repo.create(&json!({"name": "a", "email": "a@x.io"}), &SaveOptions::default())
        .unwrap();
    let second = repo
        .create(&json!({"name": "b", "email": "b@x.io"}), &SaveOptions::default())
        .unwrap();

    let err = repo
        .update_one_by_id(
            &second.id.to_string(),
            &json!({"email": "a@x.io"}),
            &UpdateOptions::default(),
        )
        .unwrap_err();
    assert!(matches!(err, RepoError::Conflict(_)));

    let reloaded = repo
        .get_one_by_id(&second.id.to_string(), &QueryOptions::default())
        .unwrap();
    assert_eq!(reloaded, second);
}

#[test]
fn update_that_breaks_document_type_is_rolled_back() {
    let conn = open_db_in_memory().unwrap();
    let store = people(&conn);
    let repo = DocumentRepository::<Person, _>::new(&store);
    let created = repo
        .create(&json!({"name": "a", "age": 3}), &SaveOptions::default())
        .unwrap();

    let err = repo
        .update_one_by_id(
            &created.id.to_string(),
            &json!({"age": "three"}),
            &UpdateOptions::default(),
        )
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));

    let reloaded = repo
        .get_one_by_id(&created.id.to_string(), &QueryOptions::default())
        .unwrap();
    assert_eq!(reloaded, created);
}

#[test]
fn update_projection_shapes_returned_document() {
    let conn = open_db_in_memory().unwrap();
    let store = people(&conn);
    let repo = DocumentRepository::<Person, _>::new(&store);
    let created = repo
        .create(&json!({"name": "a", "age": 3, "email": "a@x.io"}), &SaveOptions::default())
        .unwrap();

    let options = UpdateOptions {
        projection: Some(vec!["age".to_string()]),
    };
    let updated = repo
        .update_one_by_id(&created.id.to_string(), &json!({"age": 4}), &options)
        .unwrap();
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.age, Some(4));
    assert_eq!(updated.name, "");
    assert_eq!(updated.email, None);

    let full = repo
        .get_one_by_id(&created.id.to_string(), &QueryOptions::default())
        .unwrap();
    assert_eq!(full.email.as_deref(), Some("a@x.io"));
}

#[test]
fn projected_update_still_validates_the_whole_document() {
    let conn = open_db_in_memory().unwrap();
    let store = people(&conn);
    let repo = DocumentRepository::<Person, _>::new(&store);
    let created = repo
        .create(&json!({"name": "a", "age": 3}), &SaveOptions::default())
        .unwrap();

    let name_only = UpdateOptions {
        projection: Some(vec!["name".to_string()]),
    };
    for options in [name_only, UpdateOptions::default()] {
        let err = repo
            .update_one_by_id(&created.id.to_string(), &json!({"age": "old"}), &options)
            .unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)), "options {options:?}");
    }

    let reloaded = repo
        .get_one_by_id(&created.id.to_string(), &QueryOptions::default())
        .unwrap();
    assert_eq!(reloaded, created);
}

#[test]
fn nested_object_equality_survives_merge_patch() {
    let conn = open_db_in_memory().unwrap();
    let store = people(&conn);
    let repo = DocumentRepository::<JsonDocument, _>::new(&store);
    let created = repo
        .create(&json!({"address": {"zip": "1"}, "tags": ["a", "b"]}), &SaveOptions::default())
        .unwrap();
    repo.update_one_by_id(
        &created.id.to_string(),
        &json!({"address": {"city": "x"}}),
        &UpdateOptions::default(),
    )
    .unwrap();

    let same = Filter::eq("address", json!({"city": "x", "zip": "1"}));
    assert_eq!(repo.count(&same).unwrap(), 1);
    assert_eq!(repo.get_all(&same, &QueryOptions::default()).len(), 1);

    // Extra, missing or differently typed members do not match.
    for other in [
        json!({"city": "x"}),
        json!({"city": "x", "zip": "1", "street": "y"}),
        json!({"city": "x", "zip": 1}),
    ] {
        assert_eq!(repo.count(&Filter::eq("address", other.clone())).unwrap(), 0, "{other}");
        assert_eq!(repo.count(&Filter::ne("address", other.clone())).unwrap(), 1, "{other}");
    }

    assert_eq!(repo.count(&Filter::eq("tags", json!(["a", "b"]))).unwrap(), 1);
    assert_eq!(repo.count(&Filter::eq("tags", json!(["b", "a"]))).unwrap(), 0);
    assert_eq!(
        repo.count(&Filter::is_in("address", [json!({"zip": "1", "city": "x"}), json!("x")]))
            .unwrap(),
        1
    );
    assert_eq!(
        repo.count(&Filter::not_in("address", [json!({"zip": "1", "city": "x"})]))
            .unwrap(),
        0
    );
}

#[test]
fn validate_object_ids_handles_lists_past_the_parameter_limit() {
    let conn = open_db_in_memory().unwrap();
    let store = people(&conn);
    let repo = DocumentRepository::<Person, _>::new(&store);

    let tx = conn.unchecked_transaction().unwrap();
    let ids: Vec<String> = (0..33_000)
        .map(|_| {
            repo.create(&json!({}), &SaveOptions::default())
                .unwrap()
                .id
                .to_string()
        })
        .collect();
    tx.commit().unwrap();

    assert!(repo.validate_object_ids(&ids));

    let mut with_unknown = ids.clone();
    with_unknown.push(docrepo_core::DocumentId::new().to_string());
    assert!(!repo.validate_object_ids(&with_unknown));
}

#[test]
fn write_paths_reject_malformed_ids() {
    let conn = open_db_in_memory().unwrap();
    let store = people(&conn);
    let repo = DocumentRepository::<Person, _>::new(&store);

    assert!(matches!(
        repo.update_one_by_id("not-an-id", &json!({"name": "x"}), &UpdateOptions::default()),
        Err(RepoError::InvalidId(_))
    ));
    assert!(matches!(
        repo.remove_one_by_id("not-an-id"),
        Err(RepoError::InvalidId(_))
    ));
    assert!(matches!(
        repo.create(&json!({"_id": "not-an-id", "name": "x"}), &SaveOptions::default()),
        Err(RepoError::InvalidId(_))
    ));
}

#[test]
fn create_rejects_non_object_and_mistyped_input() {
    let conn = open_db_in_memory().unwrap();
    let store = people(&conn);
    let repo = DocumentRepository::<Person, _>::new(&store);

    assert!(matches!(
        repo.create(&json!(["name"]), &SaveOptions::default()),
        Err(RepoError::Validation(_))
    ));
    assert!(matches!(
        repo.create(&json!({"name": 5}), &SaveOptions::default()),
        Err(RepoError::Validation(_))
    ));
    assert_eq!(repo.count(&Filter::all()).unwrap(), 0);
}

#[test]
fn get_all_on_empty_collection_is_empty() {
    let conn = open_db_in_memory().unwrap();
    let store = people(&conn);
    let repo = DocumentRepository::<Person, _>::new(&store);

    assert!(repo
        .get_all(&Filter::all(), &QueryOptions::default())
        .is_empty());
}

#[test]
fn get_all_defaults_to_created_at_descending_and_sort_overrides() {
    let conn = open_db_in_memory().unwrap();
    let store = people(&conn);
    let repo = DocumentRepository::<Person, _>::new(&store);
    let keep = SaveOptions { timestamps: false };

    repo.create(&json!({"name": "b", "createdAt": 2_000}), &keep)
        .unwrap();
    repo.create(&json!({"name": "c", "createdAt": 3_000}), &keep)
        .unwrap();
    repo.create(&json!({"name": "a", "createdAt": 1_000}), &keep)
        .unwrap();

    let names = |docs: Vec<Person>| docs.into_iter().map(|doc| doc.name).collect::<Vec<_>>();

    assert_eq!(
        names(repo.get_all(&Filter::all(), &QueryOptions::default())),
        vec!["c", "b", "a"]
    );
    assert_eq!(
        names(repo.get_all(
            &Filter::all(),
            &QueryOptions::default().sort_by("name", SortOrder::Asc)
        )),
        vec!["a", "b", "c"]
    );
    assert_eq!(
        names(repo.get_all(
            &Filter::all(),
            &QueryOptions::default().sort_by("createdAt", SortOrder::Asc)
        )),
        vec!["a", "b", "c"]
    );
}

#[test]
fn default_order_breaks_created_at_ties_by_newest_insert() {
    let conn = open_db_in_memory().unwrap();
    let store = people(&conn);
    let repo = DocumentRepository::<Person, _>::new(&store);
    let keep = SaveOptions { timestamps: false };

    for name in ["first", "second", "third"] {
        repo.create(&json!({"name": name, "createdAt": 5}), &keep)
            .unwrap();
    }

    let names: Vec<String> = repo
        .get_all(&Filter::all(), &QueryOptions::default())
        .into_iter()
        .map(|doc| doc.name)
        .collect();
    assert_eq!(names, vec!["third", "second", "first"]);
}

#[test]
fn save_without_timestamps_keeps_caller_values() {
    let conn = open_db_in_memory().unwrap();
    let store = people(&conn);
    let repo = DocumentRepository::<Person, _>::new(&store);

    let imported = repo
        .create(
            &json!({"name": "old", "createdAt": 100, "updatedAt": 200}),
            &SaveOptions { timestamps: false },
        )
        .unwrap();
    assert_eq!(imported.created_at, 100);
    assert_eq!(imported.updated_at, 200);

    let defaulted = repo
        .create(&json!({"name": "new", "createdAt": 100}), &SaveOptions { timestamps: false })
        .unwrap();
    assert_eq!(defaulted.updated_at, 100);

    let stamped = repo
        .create(&json!({"name": "now", "createdAt": 100}), &SaveOptions::default())
        .unwrap();
    assert!(stamped.created_at > 100);

    assert!(matches!(
        repo.create(&json!({"name": "bad", "createdAt": "yesterday"}), &SaveOptions { timestamps: false }),
        Err(RepoError::Validation(_))
    ));
}

#[test]
fn count_matches_get_all_length_for_filters() {
    let conn = open_db_in_memory().unwrap();
    let store = people(&conn);
    let repo = DocumentRepository::<Person, _>::new(&store);

    for (name, age) in [("a", 10), ("b", 20), ("c", 30), ("d", 40)] {
        repo.create(&json!({"name": name, "age": age}), &SaveOptions::default())
            .unwrap();
    }
    repo.create(&json!({"name": "e"}), &SaveOptions::default())
        .unwrap();

    let filters = [
        Filter::all(),
        Filter::eq("name", "a"),
        Filter::gte("age", 20),
        Filter::lt("age", 20),
        Filter::is_in("name", ["a", "c", "z"]),
        Filter::not_in("name", ["a"]),
        Filter::ne("age", 10),
        Filter::exists("age", false),
        Filter::any_of([Filter::eq("name", "a"), Filter::gt("age", 35)]),
        Filter::gt("age", 10).and(Filter::lt("age", 40)),
    ];
    let expected = [5, 1, 3, 1, 2, 4, 4, 1, 2, 2];

    for (filter, expected) in filters.iter().zip(expected) {
        let listed = repo.get_all(filter, &QueryOptions::default()).len() as u64;
        let counted = repo.count(filter).unwrap();
        assert_eq!(counted, listed, "filter {filter:?}");
        assert_eq!(counted, expected, "filter {filter:?}");
    }
}

#[test]
fn pagination_applies_after_sort() {
    let conn = open_db_in_memory().unwrap();
    let store = people(&conn);
    let repo = DocumentRepository::<Person, _>::new(&store);

    for name in ["a", "b", "c", "d"] {
        repo.create(&json!({"name": name}), &SaveOptions::default())
            .unwrap();
    }

    let by_name = QueryOptions::default().sort_by("name", SortOrder::Asc);
    let page: Vec<String> = repo
        .get_all(&Filter::all(), &by_name.clone().skip(1).limit(2))
        .into_iter()
        .map(|doc| doc.name)
        .collect();
    assert_eq!(page, vec!["b", "c"]);

    let tail: Vec<String> = repo
        .get_all(&Filter::all(), &by_name.skip(3))
        .into_iter()
        .map(|doc| doc.name)
        .collect();
    assert_eq!(tail, vec!["d"]);
}

#[test]
fn projection_keeps_envelope_and_selected_fields() {
    let conn = open_db_in_memory().unwrap();
    let store = people(&conn);
    let repo = DocumentRepository::<Person, _>::new(&store);
    let created = repo
        .create(&json!({"name": "a", "age": 3, "email": "a@x.io"}), &SaveOptions::default())
        .unwrap();

    let found = repo
        .get_one_where(
            &Filter::eq("name", "a"),
            &QueryOptions::default().select(["email"]),
        )
        .unwrap();
    assert_eq!(found.id, created.id);
    assert_eq!(found.created_at, created.created_at);
    assert_eq!(found.email.as_deref(), Some("a@x.io"));
    assert_eq!(found.name, "");
    assert_eq!(found.age, None);
}

#[test]
fn get_one_where_returns_first_under_sort() {
    let conn = open_db_in_memory().unwrap();
    let store = people(&conn);
    let repo = DocumentRepository::<Person, _>::new(&store);
    for (name, age) in [("young", 10), ("old", 90), ("mid", 50)] {
        repo.create(&json!({"name": name, "age": age}), &SaveOptions::default())
            .unwrap();
    }

    let oldest = repo
        .get_one_where(
            &Filter::all(),
            &QueryOptions::default().sort_by("age", SortOrder::Desc),
        )
        .unwrap();
    assert_eq!(oldest.name, "old");
    assert!(repo
        .get_one_where(&Filter::eq("name", "nobody"), &QueryOptions::default())
        .is_none());
}

#[test]
fn get_one_by_id_with_malformed_id_is_none_and_logged() {
    let conn = open_db_in_memory().unwrap();
    let store = people(&conn);
    let sink = Arc::new(RecordingSink::default());
    let repo = DocumentRepository::<Person, _>::new(&store).with_sink(sink.clone());

    assert!(repo
        .get_one_by_id("not-an-id", &QueryOptions::default())
        .is_none());
    assert!(sink.has(Level::Warn, "event=document_get_one_by_id"));
}

#[test]
fn validate_object_ids_contract() {
    let conn = open_db_in_memory().unwrap();
    let store = people(&conn);
    let repo = DocumentRepository::<Person, _>::new(&store);
    let a = repo
        .create(&json!({"name": "a"}), &SaveOptions::default())
        .unwrap()
        .id
        .to_string();
    let b = repo
        .create(&json!({"name": "b"}), &SaveOptions::default())
        .unwrap()
        .id
        .to_string();
    let unknown = docrepo_core::DocumentId::new().to_string();

    let empty: [&str; 0] = [];
    assert!(!repo.validate_object_ids(&empty));
    assert!(repo.validate_object_ids(&[a.as_str(), b.as_str()]));
    assert!(!repo.validate_object_ids(&[a.as_str(), "not-an-id"]));
    assert!(!repo.validate_object_ids(&[a.as_str(), unknown.as_str()]));
    // Duplicates collapse before lookup.
    assert!(repo.validate_object_ids(&[a.clone(), a.clone()]));
    assert!(!repo.validate_object_ids(&[unknown.clone(), unknown.clone()]));
}

#[test]
fn remove_acknowledges_once_then_reports_no_op() {
    let conn = open_db_in_memory().unwrap();
    let store = people(&conn);
    let repo = DocumentRepository::<Person, _>::new(&store);
    let id = repo
        .create(&json!({"name": "a"}), &SaveOptions::default())
        .unwrap()
        .id
        .to_string();

    assert!(repo.remove_one_by_id(&id).unwrap());
    assert!(repo.get_one_by_id(&id, &QueryOptions::default()).is_none());
    assert!(!repo.remove_one_by_id(&id).unwrap());
}

#[test]
fn collections_share_storage_but_not_documents() {
    let conn = open_db_in_memory().unwrap();
    let people_store = people(&conn);
    let staff_store = SqliteDocumentStore::try_new(&conn, "staff").unwrap();
    people_store.ensure_unique_index(&["email"]).unwrap();

    let people_repo = DocumentRepository::<Person, _>::new(&people_store);
    let staff_repo = DocumentRepository::<Person, _>::new(&staff_store);

    let person = people_repo
        .create(&json!({"name": "a", "email": "a@x.io"}), &SaveOptions::default())
        .unwrap();
    // Unique index is scoped to `people`.
    staff_repo
        .create(&json!({"name": "a", "email": "a@x.io"}), &SaveOptions::default())
        .unwrap();

    assert_eq!(people_repo.count(&Filter::all()).unwrap(), 1);
    assert_eq!(staff_repo.count(&Filter::all()).unwrap(), 1);
    assert!(staff_repo
        .get_one_by_id(&person.id.to_string(), &QueryOptions::default())
        .is_none());
    assert!(!staff_repo.validate_object_ids(&[person.id.to_string()]));
}

#[test]
fn successful_writes_are_logged_through_the_sink() {
    let conn = open_db_in_memory().unwrap();
    let store = people(&conn);
    let sink = Arc::new(RecordingSink::default());
    let repo = DocumentRepository::<Person, _>::new(&store).with_sink(sink.clone());

    let created = repo
        .create(&json!({"name": "a"}), &SaveOptions::default())
        .unwrap();
    repo.update_one_by_id(
        &created.id.to_string(),
        &json!({"_id": "ignored", "name": "b"}),
        &UpdateOptions::default(),
    )
    .unwrap();
    repo.remove_one_by_id(&created.id.to_string()).unwrap();

    assert!(sink.has(Level::Info, "event=document_create module=repo status=ok collection=people"));
    assert!(sink.has(Level::Debug, "ignored_fields=_id"));
    assert!(sink.has(Level::Info, "event=document_update module=repo status=ok"));
    assert!(sink.has(Level::Info, "acknowledged=true"));
}
