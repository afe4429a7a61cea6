//! Tests for the criterion model and details payload.

use super::*;
use crate::domain::errors::CriteriaError;
use crate::domain::types::IdentityRef;

#[test]
fn test_new_criterion_starts_new_with_validated_title() {
    let criterion = Criterion::new(CriterionKind::Text, "Page loads under one second", None)
        .expect("valid title");

    assert_eq!(criterion.state, CriterionState::New);
    assert!(criterion.approval.is_none());
    assert!(criterion.required_approver.is_none());
    assert!(criterion.order.is_none());
}

#[test]
fn test_title_shorter_than_minimum_is_rejected() {
    let result = Criterion::new(CriterionKind::Text, "abc", None);
    assert!(matches!(result, Err(CriteriaError::InvalidTitle { .. })));
}

#[test]
fn test_empty_title_is_rejected() {
    let result = Criterion::new(CriterionKind::Text, "", None);
    assert!(matches!(result, Err(CriteriaError::InvalidTitle { .. })));
}

#[test]
fn test_title_longer_than_maximum_is_rejected() {
    let title = "x".repeat(TITLE_MAX_CHARS + 1);
    let result = Criterion::new(CriterionKind::Text, title, None);
    assert!(matches!(result, Err(CriteriaError::InvalidTitle { .. })));
}

#[test]
fn test_title_boundaries_are_inclusive() {
    assert!(Criterion::new(CriterionKind::Text, "x".repeat(TITLE_MIN_CHARS), None).is_ok());
    assert!(Criterion::new(CriterionKind::Text, "x".repeat(TITLE_MAX_CHARS), None).is_ok());
}

#[test]
fn test_with_order_sets_display_order() {
    let criterion = Criterion::new(CriterionKind::Text, "Ordered criterion", None)
        .expect("valid title")
        .with_order(3);
    assert_eq!(criterion.order, Some(3));
}

#[test]
fn test_payload_kind_matches_tag() {
    let text = CriterionPayload::Text {
        description: "free text".to_string(),
    };
    let checklist = CriterionPayload::Checklist {
        criterias: Vec::new(),
    };
    let scenario = CriterionPayload::Scenario {
        scenario: "Login".to_string(),
        criterias: Vec::new(),
    };

    assert_eq!(text.kind(), CriterionKind::Text);
    assert_eq!(checklist.kind(), CriterionKind::Checklist);
    assert_eq!(scenario.kind(), CriterionKind::Scenario);
}

#[test]
fn test_empty_payload_for_each_kind() {
    for kind in [
        CriterionKind::Text,
        CriterionKind::Checklist,
        CriterionKind::Scenario,
    ] {
        assert_eq!(CriterionPayload::empty(kind).kind(), kind);
    }
}

#[test]
fn test_details_mismatch_is_detected() {
    let criterion = Criterion::new(
        CriterionKind::Checklist,
        "Checklist-backed criterion",
        Some(IdentityRef::new("user-1", "Alex")),
    )
    .expect("valid title");

    let details = CriterionDetails::new(
        criterion.id.clone(),
        CriterionPayload::Text {
            description: "wrong shape".to_string(),
        },
    );

    let err = details
        .ensure_matches(&criterion)
        .expect_err("mismatch expected");
    assert!(matches!(err, CriteriaError::DetailsMismatch { .. }));

    let matching = CriterionDetails::new(
        criterion.id.clone(),
        CriterionPayload::Checklist {
            criterias: vec![ChecklistItem {
                id: "1".to_string(),
                completed: false,
                text: "first".to_string(),
            }],
        },
    );
    assert!(matching.ensure_matches(&criterion).is_ok());
}

#[test]
fn test_details_serialization_shape() {
    let details = CriterionDetails::new(
        CriterionId::new(),
        CriterionPayload::Scenario {
            scenario: "Checkout".to_string(),
            criterias: vec![ScenarioStep {
                id: "1".to_string(),
                kind: StepKind::Given,
                text: "a cart with one item".to_string(),
            }],
        },
    );

    let value = serde_json::to_value(&details).expect("serializes");
    assert_eq!(value["type"], "scenario");
    assert_eq!(value["__etag"], -1);
    assert_eq!(value["criterias"][0]["kind"], "given");

    let back: CriterionDetails = serde_json::from_value(value).expect("round trips");
    assert_eq!(back, details);
}
