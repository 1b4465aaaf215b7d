//! Unit tests for the small building blocks: errors, statuses, ids and formatting.
mod common;
use common::*;
use sentaku::error::{ErrorBody, display_path};
use sentaku::prelude::*;
use sentaku::session::is_filled;
use serde_json::json;
use std::str::FromStr;

#[cfg(test)]
mod error_tests {
    use super::*;

    #[test]
    fn test_display_path() {
        assert_eq!(display_path::<&str>(&[]), "<root>");
        assert_eq!(display_path(&["PRO", "TMT10", "MS2"]), "PRO/TMT10/MS2");
    }

    #[test]
    fn test_error_messages() {
        let invalid = WizardError::InvalidChoice {
            choice: "XYZ".to_string(),
            options: vec!["HLA".to_string(), "PRO".to_string()],
        };
        assert_eq!(invalid.to_string(), "Invalid choice 'XYZ', available options: [HLA, PRO]");

        let incomplete = WizardError::IncompleteSubmission {
            missing: vec!["database".to_string(), "out_dir".to_string()],
        };
        assert_eq!(incomplete.to_string(), "Missing required inputs: database, out_dir");

        let dead_end = WizardError::NoFurtherOptions { path: vec![] };
        assert_eq!(dead_end.to_string(), "No further options at '<root>'");
    }

    #[test]
    fn test_kinds_and_status_codes() {
        let id = SessionId::new();
        let cases = [
            (WizardError::NotFound(id), "not_found", 404),
            (WizardError::AlreadySubmitted(id), "already_submitted", 409),
            (WizardError::Conflict { id }, "conflict", 409),
            (WizardError::NoProfileResolved, "no_profile_resolved", 400),
            (
                WizardError::Storage(StoreError::Io("disk full".to_string())),
                "storage_error",
                500,
            ),
            (
                WizardError::Job(JobError::Rejected("closed".to_string())),
                "job_error",
                502,
            ),
        ];
        for (error, kind, status) in cases {
            assert_eq!(error.kind(), kind);
            assert_eq!(error.status_code(), status, "{}", error);
        }
    }

    #[test]
    fn test_store_errors_map_to_wizard_errors() {
        let id = SessionId::new();
        assert_eq!(
            WizardError::from(StoreError::NotFound(id)),
            WizardError::NotFound(id)
        );
        assert_eq!(
            WizardError::from(StoreError::Conflict {
                id,
                expected: 3,
                found: 4
            }),
            WizardError::Conflict { id }
        );
        assert!(matches!(
            WizardError::from(StoreError::AlreadyExists(id)),
            WizardError::Storage(StoreError::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_resolve_errors_map_to_wizard_errors() {
        let path_err = PathError {
            step: "X".to_string(),
            valid_prefix: vec!["A".to_string()],
        };
        assert_eq!(
            WizardError::from(ResolveError::Path(path_err.clone())),
            WizardError::Path(path_err)
        );
        let cycle = WizardError::from(ResolveError::DefaultCycle {
            path: vec!["A".to_string()],
        });
        assert_eq!(cycle.kind(), "default_cycle");
    }

    #[test]
    fn test_error_body() {
        let body = WizardError::InvalidChoice {
            choice: "XYZ".to_string(),
            options: vec!["HLA".to_string()],
        }
        .body();
        assert_eq!(
            body,
            ErrorBody {
                error: "Invalid choice 'XYZ', available options: [HLA]".to_string(),
                kind: "invalid_choice",
                options: Some(vec!["HLA".to_string()]),
                missing: None,
            }
        );

        let json = serde_json::to_value(WizardError::NoProfileResolved.body()).unwrap();
        assert_eq!(
            json,
            json!({
                "error": "Wizard session not complete (no profile resolved)",
                "kind": "no_profile_resolved"
            })
        );
    }
}

#[cfg(test)]
mod session_tests {
    use super::*;

    #[test]
    fn test_status_parse_and_display() {
        for status in [SessionStatus::Draft, SessionStatus::Ready, SessionStatus::Submitted] {
            assert_eq!(SessionStatus::from_str(&status.to_string()).unwrap(), status);
        }
        assert!(SessionStatus::from_str("done").is_err());
        assert!(SessionStatus::Submitted.is_terminal());
        assert!(!SessionStatus::Ready.is_terminal());
        assert_eq!(SessionStatus::for_profile(Some("P")), SessionStatus::Ready);
        assert_eq!(SessionStatus::for_profile(None), SessionStatus::Draft);
    }

    #[test]
    fn test_session_id_parse() {
        let id = SessionId::new();
        assert_eq!(id.to_string().parse::<SessionId>().unwrap(), id);
        assert_eq!(format!(" {} ", id).parse::<SessionId>().unwrap(), id);
        assert!("42".parse::<SessionId>().is_err());
        assert_ne!(SessionId::new(), id);
    }

    #[test]
    fn test_is_filled() {
        for empty in [json!(null), json!(false), json!(0), json!(0.0), json!(""), json!([]), json!({})] {
            assert!(!is_filled(&empty), "{} should count as missing", empty);
        }
        for filled in [json!(true), json!(7), json!(-1.5), json!("x"), json!([0]), json!({"a": null})] {
            assert!(is_filled(&filled), "{} should count as present", filled);
        }
    }

    #[test]
    fn test_session_document_shape() {
        let service = lab_service();
        let session = service.create().unwrap();
        let json = serde_json::to_value(&session).unwrap();

        assert_eq!(json["status"], "draft");
        assert_eq!(json["path"], json!([]));
        assert_eq!(json["profile"], json!(null));
        assert!(json["created_at"].is_string());

        let restored: WizardSession = serde_json::from_value(json).unwrap();
        assert_eq!(restored, session);
    }
}

#[cfg(test)]
mod formatter_tests {
    use super::*;

    #[test]
    fn test_format_draft_view() {
        let service = lab_service();
        let session = service.create().unwrap();
        let text = ViewFormatter::format_view(&service.describe(&session).unwrap());

        assert!(text.starts_with(&format!("Session {} (draft, v0)", session.id())));
        assert!(text.contains("Path: <root>"));
        assert!(text.contains("Step: Choose analysis type"));
        assert!(text.contains("Profile: (none resolved)"));
        assert!(text.contains("Options: HLA, PRO"));
    }

    #[test]
    fn test_format_ready_view() {
        let service = lab_service();
        let id = service.create().unwrap().id();
        service.choose(id, "HLA").unwrap();
        service.choose(id, "LF").unwrap();
        let session = service
            .set_inputs(id, inputs(json!({"database": "human.fasta", "out_dir": "/out"})))
            .unwrap();
        let text = ViewFormatter::format_view(&service.describe(&session).unwrap());

        assert!(text.contains("Path: HLA/LF"));
        assert!(text.contains("Profile: HLA_LF"));
        assert!(text.contains("  database = human.fasta"));
        assert!(text.contains("Missing: mzml_input_dir"));
        assert!(text.contains("Optional: HLA"));
        assert!(!text.contains("Options:"));

        let session = service.set_inputs(id, complete_lab_inputs()).unwrap();
        let text = ViewFormatter::format_view(&service.describe(&session).unwrap());
        assert!(text.contains("Ready to submit."));
    }
}
