//! Email pipeline integration tests.
//!
//! These run the full five stages against mock backends and a dry-run
//! transport.

mod common;

use std::sync::Arc;

use coldmail_agent::{GuardrailMode, ManagerConfig, PipelineResult};
use coldmail_llm::RoutingMockBackend;
use common::*;

const PROMPT: &str = "Write a cold sales email for ComplAI, our SOC2 compliance automation platform.";

#[tokio::test]
async fn test_pipeline_selects_and_sends() {
    let backend = email_backend(
        &sales_email("Professional", "Dear CTO, audits are slow.", 10.0),
        &sales_email("Engaging", "Hey! Audits are slow.", 30.0),
        &sales_email("Busy", "Audits slow? 15 minutes.", 20.0),
    );
    let (services, transport) = dry_run_services();
    let manager = manager(Arc::new(backend), &services, ManagerConfig::new("gpt-4o-mini"));

    let result = manager.run_prompt(PROMPT).await;
    assert!(result.is_success(), "{:?}", result);

    let PipelineResult::Email(email) = &result else {
        panic!("expected an email result, got {:?}", result);
    };
    // Analyses are identical, so the highest response rate wins.
    assert_eq!(email.selected_agent, "Engaging Sales Agent (Structured)");
    assert_eq!(email.selected.body, "Hey! Audits are slow.");
    assert_eq!(email.subject.primary_subject, "Cut your SOC2 prep time");
    assert_eq!(email.html, "<p>Hello from ComplAI</p>");

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].is_html);
    assert_eq!(sent[0].subject, "Cut your SOC2 prep time");
    assert_eq!(sent[0].body, "<p>Hello from ComplAI</p>");

    let json = result.to_json();
    assert_eq!(json["status"], "success");
    assert_eq!(json["selected_email"]["subject"], "Cut your SOC2 prep time");
    assert_eq!(json["selected_email"]["expected_response_rate"], 30.0);
    assert_eq!(json["analysis"]["personalization_level"], "medium");
    assert_eq!(json["subject_options"]["predicted_open_rate"], 35.0);
}

#[tokio::test]
async fn test_malformed_sales_email_uses_fallback() {
    let backend = email_backend(
        "Dear CTO, this is not JSON at all.",
        "Also {not json",
        "Nor this",
    );
    let (services, transport) = dry_run_services();
    let manager = manager(Arc::new(backend), &services, ManagerConfig::new("gpt-4o-mini"));

    let PipelineResult::Email(email) = manager.run_prompt(PROMPT).await else {
        panic!("expected an email result");
    };

    // Fallbacks all score the same, so the first persona wins.
    assert_eq!(email.selected.subject, "Generated Email");
    assert_eq!(email.selected.body, "Dear CTO, this is not JSON at all.");
    assert_eq!(email.selected.expected_response_rate, 10.0);
    assert_eq!(transport.sent().len(), 1);
}

#[tokio::test]
async fn test_blank_prompt_is_an_error_result() {
    let backend = Arc::new(email_backend("x", "y", "z"));
    let (services, transport) = dry_run_services();
    let manager = manager(backend.clone(), &services, ManagerConfig::new("gpt-4o-mini"));

    let result = manager.run_prompt("   ").await;
    let json = result.to_json();
    assert_eq!(json["status"], "error");
    assert_eq!(json["error_type"], "InvalidArgument");
    assert_eq!(backend.request_count(), 0);
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn test_failed_checker_does_not_block_send() {
    let backend = email_roles(
        &sales_email("P", "Body one", 10.0),
        &sales_email("E", "Body two", 10.0),
        &sales_email("B", "Body three", 10.0),
    )
    .route_error(SAFETY_CHECKER)
    .route_text(CONTEXT_CHECKER, CLEAN_CHECK)
    .route_text(DATA_CHECKER, CLEAN_CHECK);
    let (services, transport) = dry_run_services();
    let config = ManagerConfig::new("gpt-4o-mini").with_guardrail_mode(GuardrailMode::Enforcing);
    let manager = manager(Arc::new(backend), &services, config);

    let result = manager.run_prompt(PROMPT).await;
    assert!(result.is_success(), "{:?}", result);
    assert_eq!(transport.sent().len(), 1);
}

const NAMES_JOHN: &str =
    r#"{"is_safe": false, "contains_personal_names": true, "reason": "names John", "confidence": 0.9}"#;

fn tripping_backend() -> RoutingMockBackend {
    email_roles(
        &sales_email("P", "Hi John", 10.0),
        &sales_email("E", "Hi John", 10.0),
        &sales_email("B", "Hi John", 10.0),
    )
    .route_text(SAFETY_CHECKER, CLEAN_CHECK)
    .route_text(CONTEXT_CHECKER, CLEAN_CHECK)
    .route_text(DATA_CHECKER, NAMES_JOHN)
}

#[tokio::test]
async fn test_advisory_guardrails_keep_tripped_variants() {
    let (services, transport) = dry_run_services();
    let manager = manager(
        Arc::new(tripping_backend()),
        &services,
        ManagerConfig::new("gpt-4o-mini"),
    );

    assert!(manager.run_prompt(PROMPT).await.is_success());
    assert_eq!(transport.sent().len(), 1);
}

#[tokio::test]
async fn test_enforcing_guardrails_reject_when_every_variant_trips() {
    let (services, transport) = dry_run_services();
    let config = ManagerConfig::new("gpt-4o-mini").with_guardrail_mode(GuardrailMode::Enforcing);
    let manager = manager(Arc::new(tripping_backend()), &services, config);

    let result = manager.run_prompt(PROMPT).await;
    let json = result.to_json();
    assert_eq!(json["status"], "error");
    assert_eq!(json["error_type"], "GuardrailRejected");
    assert!(json["message"].as_str().unwrap().contains("personal_data: names John"));
    assert!(transport.sent().is_empty());
}
