use std::io;

use serde_json::{Value, json};

use form_spec::{
    ChangeEvent, DefaultValidator, FieldDefinition, FormDefinition, FormSession, SessionError,
    SubmitError, SubmitOutcome, SubmitTarget, ValidationOutcome, ValueStore, ViewStatus,
};

const CAMPAIGN_BRIEF: &str = include_str!("../tests/fixtures/campaign_brief.json");
const PUBLISHER_SIGNUP: &str = include_str!("../tests/fixtures/publisher_signup.json");

/// Records every submission and answers with a canned result.
#[derive(Default)]
struct RecordingTarget {
    calls: Vec<ValueStore>,
    fail: bool,
}

impl SubmitTarget for RecordingTarget {
    fn submit(&mut self, values: &ValueStore) -> Result<Value, SubmitError> {
        self.calls.push(values.clone());
        if self.fail {
            Err(SubmitError::with_source(
                "server unavailable",
                io::Error::other("connection reset"),
            ))
        } else {
            Ok(json!({ "id": "sub_1" }))
        }
    }
}

fn session(raw: &str) -> FormSession {
    FormSession::new(FormDefinition::from_json(raw).expect("fixture"))
}

#[test]
fn hidden_required_field_does_not_block_submit() {
    let mut session = session(CAMPAIGN_BRIEF);
    session
        .apply_change("a", ChangeEvent::Input("no".into()))
        .expect("change");
    let visible: Vec<_> = session
        .visible_fields()
        .into_iter()
        .map(|field| field.id.clone())
        .collect();
    assert_eq!(visible, vec!["a"]);

    let mut target = RecordingTarget::default();
    let outcome = session
        .submit(&DefaultValidator, &mut target)
        .expect("submit");
    assert_eq!(outcome, SubmitOutcome::Accepted(json!({ "id": "sub_1" })));
    assert_eq!(target.calls, vec![json!({ "a": "no" }).as_object().cloned().expect("object")]);
    assert!(session.is_submitted());
    assert!(session.values().is_empty());
}

#[test]
fn shown_required_field_blocks_submit() {
    let mut session = session(CAMPAIGN_BRIEF);
    session
        .apply_change("a", ChangeEvent::Input("yes".into()))
        .expect("change");
    assert_eq!(session.visible_fields().len(), 2);

    let mut target = RecordingTarget::default();
    let outcome = session
        .submit(&DefaultValidator, &mut target)
        .expect("submit");
    match outcome {
        SubmitOutcome::Rejected { errors, focus } => {
            assert_eq!(errors.keys().collect::<Vec<_>>(), vec!["b"]);
            assert_eq!(focus.as_deref(), Some("b"));
        }
        other => panic!("expected rejection, got {other:?}"),
    }
    assert!(target.calls.is_empty());
    assert_eq!(
        session.errors().get("b").map(String::as_str),
        Some("Monthly budget is required")
    );
    assert_eq!(session.focus_field(), Some("b"));
    assert!(!session.is_submitted());
}

#[test]
fn empty_required_field_never_reaches_the_target() {
    let mut session = session(CAMPAIGN_BRIEF);
    let mut target = RecordingTarget::default();
    let outcome = session
        .submit(&DefaultValidator, &mut target)
        .expect("submit");
    assert!(matches!(outcome, SubmitOutcome::Rejected { .. }));
    assert!(target.calls.is_empty());
    assert!(session.errors().contains_key("a"));
    assert!(!session.is_submitting());
}

#[test]
fn editing_clears_only_that_fields_error() {
    let raw = json!({
        "title": "Two required",
        "fields": [
            { "id": "first", "type": "text", "label": "First", "required": true },
            { "id": "second", "type": "text", "label": "Second", "required": true }
        ]
    })
    .to_string();
    let mut session = session(&raw);
    let mut target = RecordingTarget::default();
    session
        .submit(&DefaultValidator, &mut target)
        .expect("submit");
    assert_eq!(session.errors().len(), 2);
    assert_eq!(session.focus_field(), Some("first"));

    session
        .on_field_change("first", json!(""))
        .expect("change");
    assert!(!session.errors().contains_key("first"));
    assert!(session.errors().contains_key("second"));
}

#[test]
fn editing_the_focused_field_drops_the_focus() {
    let raw = json!({
        "title": "Two required",
        "fields": [
            { "id": "first", "type": "text", "label": "First", "required": true },
            { "id": "second", "type": "text", "label": "Second", "required": true }
        ]
    })
    .to_string();
    let mut session = session(&raw);
    let mut target = RecordingTarget::default();
    session
        .submit(&DefaultValidator, &mut target)
        .expect("submit");
    assert_eq!(session.view().focus_field.as_deref(), Some("first"));

    session
        .on_field_change("second", json!("later"))
        .expect("change");
    assert_eq!(session.focus_field(), Some("first"));

    session
        .on_field_change("first", json!("now"))
        .expect("change");
    assert_eq!(session.focus_field(), None);
    assert_eq!(session.view().focus_field, None);
}

#[test]
fn failed_submit_keeps_values_for_retry() {
    let mut session = session(CAMPAIGN_BRIEF);
    session.on_field_change("a", json!("no")).expect("change");

    let mut target = RecordingTarget {
        fail: true,
        ..RecordingTarget::default()
    };
    let err = session
        .submit(&DefaultValidator, &mut target)
        .unwrap_err();
    assert!(matches!(err, SessionError::Submit(_)));
    assert!(!session.is_submitting());
    assert!(!session.is_submitted());
    assert_eq!(session.values().get("a"), Some(&json!("no")));

    target.fail = false;
    let outcome = session
        .submit(&DefaultValidator, &mut target)
        .expect("retry");
    assert!(matches!(outcome, SubmitOutcome::Accepted(_)));
    assert_eq!(target.calls.len(), 2);
}

#[test]
fn submitted_session_is_terminal() {
    let mut session = session(CAMPAIGN_BRIEF);
    session.on_field_change("a", json!("no")).expect("change");
    let mut target = RecordingTarget::default();
    session
        .submit(&DefaultValidator, &mut target)
        .expect("submit");

    assert_eq!(session.status(), ViewStatus::Submitted);
    assert!(matches!(
        session.on_field_change("a", json!("yes")),
        Err(SessionError::AlreadySubmitted)
    ));
    assert!(matches!(
        session.submit(&DefaultValidator, &mut target),
        Err(SessionError::AlreadySubmitted)
    ));
    assert_eq!(target.calls.len(), 1);
}

#[test]
fn radio_changes_store_numbers_for_numeric_options() {
    let mut session = session(PUBLISHER_SIGNUP);
    let stored = session
        .apply_change("ad_slots", ChangeEvent::Input("2".into()))
        .expect("change")
        .clone();
    assert_eq!(stored, json!(2));
    let stored = session
        .apply_change("ad_slots", ChangeEvent::Input("flexible".into()))
        .expect("change")
        .clone();
    assert_eq!(stored, json!("flexible"));
}

#[test]
fn unknown_fields_are_rejected() {
    let mut session = session(CAMPAIGN_BRIEF);
    assert!(matches!(
        session.on_field_change("nope", json!(1)),
        Err(SessionError::UnknownField(id)) if id == "nope"
    ));
}

#[test]
fn custom_validator_is_consulted() {
    let mut session = session(CAMPAIGN_BRIEF);
    session.on_field_change("a", json!("no")).expect("change");
    let strict = |fields: &[&FieldDefinition], _values: &ValueStore| {
        let errors = fields
            .iter()
            .map(|field| (field.id.clone(), "closed for submissions".to_string()))
            .collect();
        ValidationOutcome::from_errors(errors)
    };
    let mut target = RecordingTarget::default();
    let outcome = session.submit(&strict, &mut target).expect("submit");
    assert!(matches!(outcome, SubmitOutcome::Rejected { .. }));
    assert!(target.calls.is_empty());
}

#[test]
fn progress_tracks_visible_fields() {
    let mut session = session(PUBLISHER_SIGNUP);
    let before = session.progress();
    session
        .apply_change("name", ChangeEvent::Input("Ada".into()))
        .expect("change");
    let after = session.progress();
    assert_eq!(after.completed, before.completed + 1);
    assert_eq!(after.total, before.total);

    session
        .apply_change("audience", ChangeEvent::Slide(300.0))
        .expect("slide");
    session
        .apply_change("channels", ChangeEvent::Toggle("social".into()))
        .expect("toggle");
    let with_gate = session.progress();
    assert_eq!(with_gate.total, before.total + 1);
}
