mod common;

use common::{MemoryService, ctx};
use exportdesk::{
    BatchRepair, ComplianceIssue, ExValue, FieldPath, GroupRules, SaveOutcome, SmartRepair,
    SurfaceError, statics,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

fn product() -> Arc<MemoryService> {
    MemoryService::with_records(
        statics::ENTITY_PRODUCT,
        vec![json!({
            "id": "p-1",
            "name": "Wool scarf",
            "hs_code": "",
            "quality_specs": { "origin": "local" },
            "dimensions_l_w_h": { "length": 0, "width": 30 }
        })],
    )
}

fn report() -> ExValue {
    ExValue::from(json!({
        "issues": [
            { "field": "hs_code", "label": "HS code", "message": "HS code is required",
              "suggestion": "6117.10" },
            { "field": "dimensions_l_w_h.length", "label": "Length", "kind": "numeric",
              "message": "Length must be positive", "suggestion": 180 },
            { "field": "description", "message": "Add a description" }
        ]
    }))
}

#[tokio::test]
async fn batch_repair_applies_suggestions_in_one_update() {
    let service = product();
    let issues = ComplianceIssue::from_report(&report());
    let mut repair = BatchRepair::new(service.clone(), "p-1", issues, GroupRules::default());

    repair.open(&ctx()).await.expect("open");
    assert_eq!(repair.apply_suggestions().expect("session open"), 2);

    let session = repair.session_mut().expect("session");
    let row = session
        .add_new(statics::REC_GROUP_QUALITY_SPECS)
        .expect("dynamic group");
    session.set_key(row, "Fiber Grade").expect("key");

    let outcome = repair.save(&ctx()).await.expect("save");
    let SaveOutcome::Saved { payload } = outcome else {
        panic!("expected a saved outcome");
    };
    assert_eq!(
        payload.to_json(),
        json!({
            "hs_code": "6117.10",
            "dimensions_l_w_h": { "length": 180.0, "width": 30 }
        })
    );
    assert_eq!(service.updates().len(), 1);

    // The half-filled specification row is still there for the next save.
    let session = repair.view().session().expect("still editing");
    let staged: Vec<&str> = session
        .entries()
        .iter()
        .filter(|e| e.is_new())
        .map(|e| e.key())
        .collect();
    assert_eq!(staged, vec!["Fiber Grade"]);
    assert!(!session.has_changes());
}

#[tokio::test]
async fn smart_repair_closes_after_saving_one_field() {
    let service = product();
    let issues = ComplianceIssue::from_report(&report());
    let mut repair = SmartRepair::new(service.clone(), "p-1", &issues[0], GroupRules::default());
    assert_eq!(repair.field(), &FieldPath::top("hs_code"));

    assert_eq!(repair.open(&ctx()).await.expect("open"), "");
    assert!(repair.is_open());
    repair.set_value("6117.10").expect("set");
    assert_eq!(repair.value(), Some("6117.10"));

    repair.save(&ctx()).await.expect("save");
    assert!(!repair.is_open());
    assert_eq!(
        service.record("p-1").and_then(|r| r.get("hs_code").cloned()),
        Some(ExValue::from("6117.10"))
    );
    assert_eq!(
        service.updates()[0].payload.to_json(),
        json!({ "hs_code": "6117.10" })
    );
}

#[tokio::test]
async fn smart_repair_needs_an_open_editor() {
    let service = product();
    let issues = ComplianceIssue::from_report(&report());
    let mut repair = SmartRepair::new(service, "p-1", &issues[2], GroupRules::default());

    assert_eq!(repair.set_value("x"), Err(SurfaceError::NoSession));
    assert!(matches!(
        repair.save(&ctx()).await,
        Err(SurfaceError::NoSession)
    ));
}
