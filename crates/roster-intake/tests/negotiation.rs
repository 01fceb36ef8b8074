use std::sync::Arc;

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use roster_core::audit::AuditStamp;
use roster_intake::{Intake, IntakeError, IntakeState, Outcome, Session};
use roster_sheets::{MemorySheets, Operation, StoreCall};

fn stamp() -> AuditStamp {
    AuditStamp {
        at: Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap(),
        actor: "alice".into(),
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}

fn students() -> Arc<MemorySheets> {
    Arc::new(MemorySheets::new().with_table(
        "Students",
        [vec!["name", "age"], vec!["", "regex:^[0-9]{1,3}$"]],
    ))
}

async fn open(store: &Arc<MemorySheets>, table: &str) -> (Intake, Session) {
    let intake = Intake::new(store.clone());
    let mut session = Session::default();
    intake.select_or_create_table(&mut session, table).await.unwrap();
    store.clear_calls();
    (intake, session)
}

fn append(values: &[&str]) -> StoreCall {
    StoreCall::AppendRow {
        table: "Students".into(),
        values: strings(values),
    }
}

#[tokio::test]
async fn known_columns_commit_in_one_append() {
    let store = students();
    let (intake, mut session) = open(&store, "Students").await;

    let outcome = intake
        .submit_record(&mut session, "age: 9\nname: Ali", &stamp())
        .await
        .unwrap();

    assert_eq!(
        outcome,
        Outcome::Committed {
            table: "Students".into(),
            record: [("name", "Ali"), ("age", "9")].into_iter().collect(),
        }
    );
    assert_eq!(store.writes(), vec![append(&["Ali", "9"])]);
    assert_eq!(store.snapshot("Students").unwrap()[2], strings(&["Ali", "9"]));
    assert_eq!(session.state, IntakeState::AwaitingFreeForm);
}

#[tokio::test]
async fn unknown_column_opens_negotiation_without_writing() {
    let store = students();
    let (intake, mut session) = open(&store, "Students").await;

    let outcome = intake
        .submit_record(&mut session, "name: Ali\nage: 9\nphone: 555", &stamp())
        .await
        .unwrap();

    assert_eq!(
        outcome,
        Outcome::AskColumn {
            table: "Students".into(),
            column: "phone".into(),
            value: "555".into(),
            step: 0,
            remaining: 1,
        }
    );
    assert_eq!(session.negotiation().unwrap().pending, vec!["phone"]);
    assert!(store.writes().is_empty());
}

#[tokio::test]
async fn accepting_adds_the_column_then_appends() {
    let store = students();
    let (intake, mut session) = open(&store, "Students").await;
    intake
        .submit_record(&mut session, "name: Ali\nage: 9\nphone: 555", &stamp())
        .await
        .unwrap();

    let outcome = intake
        .submit_column_decision(&mut session, 0, true)
        .await
        .unwrap();

    assert!(matches!(outcome, Outcome::Committed { .. }));
    assert_eq!(
        store.writes(),
        vec![
            StoreCall::UpdateRow {
                table: "Students".into(),
                row: 1,
                values: strings(&["name", "age", "phone"]),
            },
            append(&["Ali", "9", "555"]),
        ]
    );
    assert_eq!(session.state, IntakeState::AwaitingFreeForm);
}

#[tokio::test]
async fn declining_drops_the_field_and_leaves_header_alone() {
    let store = students();
    let (intake, mut session) = open(&store, "Students").await;
    intake
        .submit_record(&mut session, "name: Ali\nage: 9\nphone: 555", &stamp())
        .await
        .unwrap();

    let outcome = intake
        .submit_column_decision(&mut session, 0, false)
        .await
        .unwrap();

    assert_eq!(
        outcome,
        Outcome::Committed {
            table: "Students".into(),
            record: [("name", "Ali"), ("age", "9")].into_iter().collect(),
        }
    );
    assert_eq!(store.writes(), vec![append(&["Ali", "9"])]);
    assert_eq!(store.snapshot("Students").unwrap()[0], strings(&["name", "age"]));
}

#[tokio::test]
async fn columns_are_negotiated_in_submission_order() {
    let store = students();
    let (intake, mut session) = open(&store, "Students").await;
    intake
        .submit_record(&mut session, "phone: 555\nname: Ali\ngroup: B", &stamp())
        .await
        .unwrap();

    let next = intake
        .submit_column_decision(&mut session, 0, false)
        .await
        .unwrap();
    assert_eq!(
        next,
        Outcome::AskColumn {
            table: "Students".into(),
            column: "group".into(),
            value: "B".into(),
            step: 1,
            remaining: 1,
        }
    );

    intake
        .submit_column_decision(&mut session, 1, true)
        .await
        .unwrap();
    assert_eq!(
        store.snapshot("Students").unwrap(),
        vec![
            strings(&["name", "age", "group"]),
            strings(&["", "regex:^[0-9]{1,3}$"]),
            strings(&["Ali", "", "B"]),
        ]
    );
}

#[tokio::test]
async fn second_submission_is_refused_while_negotiating() {
    let store = students();
    let (intake, mut session) = open(&store, "Students").await;
    intake
        .submit_record(&mut session, "name: Ali\nphone: 555", &stamp())
        .await
        .unwrap();
    let before = session.clone();

    let err = intake
        .submit_record(&mut session, "name: Omar", &stamp())
        .await
        .unwrap_err();

    match err {
        IntakeError::NegotiationInProgress { table, pending } => {
            assert_eq!(table, "Students");
            assert_eq!(pending, vec!["phone"]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(session, before);
    assert!(store.writes().is_empty());
}

#[tokio::test]
async fn stale_and_orphan_decisions_are_rejected() {
    let store = students();
    let (intake, mut session) = open(&store, "Students").await;

    let err = intake
        .submit_column_decision(&mut session, 0, true)
        .await
        .unwrap_err();
    assert!(matches!(err, IntakeError::NoNegotiation));

    intake
        .submit_record(&mut session, "phone: 555\ngroup: B", &stamp())
        .await
        .unwrap();
    intake
        .submit_column_decision(&mut session, 0, true)
        .await
        .unwrap();

    let err = intake
        .submit_column_decision(&mut session, 0, true)
        .await
        .unwrap_err();
    assert!(matches!(err, IntakeError::StaleDecision));
    assert_eq!(session.negotiation().unwrap().pending, vec!["group"]);
}

#[tokio::test]
async fn button_from_an_earlier_negotiation_is_stale() {
    let store = students();
    let (intake, mut session) = open(&store, "Students").await;
    intake
        .submit_record(&mut session, "name: Ali\nphone: 555", &stamp())
        .await
        .unwrap();
    intake
        .submit_column_decision(&mut session, 0, true)
        .await
        .unwrap();

    let second = intake
        .submit_record(&mut session, "name: Omar\nemail: o@x", &stamp())
        .await
        .unwrap();
    let Outcome::AskColumn { step, .. } = second else {
        panic!("expected a column question, got {second:?}");
    };
    assert_ne!(step, 0);

    let err = intake
        .submit_column_decision(&mut session, 0, false)
        .await
        .unwrap_err();
    assert!(matches!(err, IntakeError::StaleDecision));
    let open = session.negotiation().unwrap();
    assert_eq!(open.pending, vec!["email"]);
    assert_eq!(open.record.get("email"), Some("o@x"));
    assert_eq!(store.snapshot("Students").unwrap().len(), 3);

    intake
        .submit_column_decision(&mut session, step, true)
        .await
        .unwrap();
    assert_eq!(
        store.snapshot("Students").unwrap()[3],
        strings(&["Omar", "", "", "o@x"])
    );
}

#[tokio::test]
async fn failed_header_write_leaves_the_question_open() {
    let store = students();
    let (intake, mut session) = open(&store, "Students").await;
    intake
        .submit_record(&mut session, "name: Ali\nphone: 555", &stamp())
        .await
        .unwrap();
    let before = session.clone();
    store.fail_on(Operation::UpdateRow);

    let err = intake
        .submit_column_decision(&mut session, 0, true)
        .await
        .unwrap_err();

    assert!(!err.is_user_error());
    assert_eq!(session, before);
    assert_eq!(store.snapshot("Students").unwrap()[0], strings(&["name", "age"]));

    store.recover();
    let outcome = intake
        .submit_column_decision(&mut session, 0, true)
        .await
        .unwrap();
    assert!(matches!(outcome, Outcome::Committed { .. }));
    assert_eq!(
        store.snapshot("Students").unwrap()[2],
        strings(&["Ali", "", "555"])
    );
}

#[tokio::test]
async fn failed_commit_keeps_negotiation_for_retry() {
    let store = students();
    let (intake, mut session) = open(&store, "Students").await;
    intake
        .submit_record(&mut session, "name: Ali\nphone: 555", &stamp())
        .await
        .unwrap();
    store.fail_on(Operation::AppendRow);

    let err = intake
        .submit_column_decision(&mut session, 0, true)
        .await
        .unwrap_err();
    assert!(!err.is_user_error());
    let open = session.negotiation().unwrap();
    assert!(open.pending.is_empty());
    assert_eq!(open.record.get("phone"), Some("555"));

    store.recover();
    let outcome = intake.resume_commit(&mut session, &stamp()).await.unwrap();

    assert!(matches!(outcome, Outcome::Committed { .. }));
    assert_eq!(
        store.snapshot("Students").unwrap()[2],
        strings(&["Ali", "", "555"])
    );
    assert_eq!(session.state, IntakeState::AwaitingFreeForm);
}

#[tokio::test]
async fn declining_the_only_field_still_commits() {
    let store = students();
    let (intake, mut session) = open(&store, "Students").await;
    intake
        .submit_record(&mut session, "nickname: Al", &stamp())
        .await
        .unwrap();

    let outcome = intake
        .submit_column_decision(&mut session, 0, false)
        .await
        .unwrap();

    assert_eq!(
        outcome,
        Outcome::Committed {
            table: "Students".into(),
            record: roster_core::record::Record::new(),
        }
    );
    assert_eq!(store.writes(), vec![append(&["", ""])]);
}

#[tokio::test]
async fn invalid_values_are_all_reported_and_nothing_is_written() {
    let store = Arc::new(MemorySheets::new().with_table(
        "Students",
        [
            vec!["name", "age", "status"],
            vec!["", "regex:^[0-9]{1,3}$", "list:active,inactive"],
        ],
    ));
    let (intake, mut session) = open(&store, "Students").await;

    let err = intake
        .submit_record(&mut session, "name: Ali\nage: nine\nstatus: gone", &stamp())
        .await
        .unwrap_err();

    let IntakeError::ValidationFailed(failures) = err else {
        panic!("expected validation failure");
    };
    let columns: Vec<_> = failures.iter().map(|f| f.column.as_str()).collect();
    assert_eq!(columns, vec!["age", "status"]);
    assert_eq!(
        failures[1].message,
        "'gone' is not allowed for status. Allowed values: active, inactive"
    );
    assert!(store.writes().is_empty());
    assert_eq!(session.state, IntakeState::AwaitingFreeForm);
}

#[tokio::test]
async fn audit_columns_are_stamped_and_override_submitted_values() {
    let store = Arc::new(MemorySheets::new().with_table(
        "Log",
        [vec![
            "name",
            "created",
            "created_by",
            "last_modified",
            "last_modified_by",
        ]],
    ));
    let (intake, mut session) = open(&store, "Log").await;

    intake
        .submit_record(&mut session, "name: Ali\ncreated_by: mallory", &stamp())
        .await
        .unwrap();

    assert_eq!(
        store.snapshot("Log").unwrap()[2],
        strings(&[
            "Ali",
            "2026-03-01T09:30:00Z",
            "alice",
            "2026-03-01T09:30:00Z",
            "alice",
        ])
    );
}

#[tokio::test]
async fn audit_fields_without_columns_are_not_negotiated() {
    let store = students();
    let (intake, mut session) = open(&store, "Students").await;

    let outcome = intake
        .submit_record(&mut session, "name: Ali\ncreated_by: mallory", &stamp())
        .await
        .unwrap();

    assert_eq!(
        outcome,
        Outcome::Committed {
            table: "Students".into(),
            record: [("name", "Ali")].into_iter().collect(),
        }
    );
    assert_eq!(store.writes(), vec![append(&["Ali", ""])]);
}

#[tokio::test]
async fn submitting_without_a_table_fails() {
    let intake = Intake::new(students());
    let mut session = Session::default();

    let err = intake
        .submit_record(&mut session, "name: Ali", &stamp())
        .await
        .unwrap_err();
    assert!(matches!(err, IntakeError::NoTableSelected));
}

#[tokio::test]
async fn cancel_discards_the_negotiation() {
    let store = students();
    let (intake, mut session) = open(&store, "Students").await;
    intake
        .submit_record(&mut session, "phone: 555", &stamp())
        .await
        .unwrap();

    assert_eq!(intake.cancel(&mut session), Outcome::Cancelled { discarded: true });
    assert_eq!(session.state, IntakeState::AwaitingFreeForm);
    assert_eq!(intake.cancel(&mut session), Outcome::Cancelled { discarded: false });
    assert!(store.writes().is_empty());
}
