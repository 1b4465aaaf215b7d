//! Tree loading, validation and the read-only queries.
mod common;
use common::*;
use sentaku::prelude::*;
use sentaku::tree::{DEFAULT_KEY, NodeDefinition, TreeDefinition};

fn load_err(json: &str) -> TreeError {
    DecisionTree::from_json_str(json).expect_err("tree should be rejected")
}

#[cfg(test)]
mod loading_tests {
    use super::*;

    #[test]
    fn test_shipped_tree_loads() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/data/wizard_tree.json");
        let tree = DecisionTree::from_json_file(path).expect("shipped tree is valid");

        let profiles: Vec<String> = tree.profiles().into_iter().map(|(_, p)| p).collect();
        assert_eq!(profiles.len(), 9);
        assert!(profiles.contains(&"HLA_LF".to_string()));
        assert!(profiles.contains(&"PRO_TMT10MS2_SEMI".to_string()));
        assert_eq!(tree.root().label(), "Choose analysis type");
    }

    #[test]
    fn test_profiles_lists_shortest_paths() {
        let tree = lab_tree();
        let profiles = tree.profiles();
        assert_eq!(
            profiles[0],
            (vec!["HLA".to_string(), "LF".to_string()], "HLA_LF".to_string())
        );
        assert!(profiles.contains(&(
            vec!["PRO".into(), "TMT10".into(), "MS2".into(), "SEMI".into()],
            "PRO_TMT10MS2_SEMI".to_string()
        )));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = DecisionTree::from_json_file("does/not/exist.json").unwrap_err();
        assert!(matches!(err, TreeError::Io { .. }));
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        assert!(matches!(load_err("{ not json"), TreeError::Parse(_)));
        assert!(matches!(load_err(r#"{"options": []}"#), TreeError::Parse(_)));
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let err = load_err(
            r#"{"label": "r", "options": {"A": {"profile": "X"}, "A": {"profile": "Y"}}}"#,
        );
        assert_eq!(
            err,
            TreeError::DuplicateKey {
                node: "<root>".to_string(),
                key: "A".to_string()
            }
        );
    }

    #[test]
    fn test_empty_key_rejected() {
        let err = load_err(r#"{"options": {"A": {"options": {"": {"profile": "X"}}}}}"#);
        assert_eq!(err, TreeError::EmptyKey { node: "A".to_string() });
    }

    #[test]
    fn test_dangling_default_rejected() {
        let err = load_err(
            r#"{"options": {"A": {"default": "missing", "options": {"B": {"profile": "X"}}}}}"#,
        );
        assert_eq!(
            err,
            TreeError::DanglingDefault {
                node: "A".to_string(),
                key: "missing".to_string()
            }
        );
    }

    #[test]
    fn test_default_key_beside_explicit_default_rejected() {
        let err = load_err(
            r#"{"options": {"A": {"default": "b", "options": {
                "_DEFAULT": {"profile": "A_HIDDEN"},
                "b": {"profile": "A_B"}
            }}}}"#,
        );
        assert_eq!(
            err,
            TreeError::ShadowedDefaultKey {
                node: "A".to_string(),
                default: "b".to_string()
            }
        );
    }

    #[test]
    fn test_explicit_default_key_accepted() {
        let tree = DecisionTree::from_json_str(
            r#"{"options": {"A": {"default": "_DEFAULT", "options": {
                "_DEFAULT": {"profile": "A_STD"},
                "b": {"profile": "A_B"}
            }}}}"#,
        )
        .unwrap();
        assert_eq!(tree.options_at(&["A"]).unwrap(), vec!["b"]);
    }

    #[test]
    fn test_default_cycle_rejected() {
        let err = load_err(
            r#"{"options": {"A": {"default": "next", "options": {
                "next": {"default": "again", "options": {"again": {"link": ["A"]}}}
            }}}}"#,
        );
        assert!(matches!(err, TreeError::DefaultCycle { .. }), "got {:?}", err);
    }

    #[test]
    fn test_choice_cycle_rejected() {
        let err = load_err(r#"{"options": {"A": {"options": {"again": {"link": ["A"]}}}}}"#);
        assert_eq!(
            err,
            TreeError::CyclicLink {
                node: "A".to_string(),
                key: "again".to_string()
            }
        );
    }

    #[test]
    fn test_bad_links_rejected() {
        let unresolved = load_err(r#"{"options": {"A": {"link": ["B", "C"]}}}"#);
        assert_eq!(
            unresolved,
            TreeError::UnresolvedLink {
                node: "A".to_string(),
                target: "B/C".to_string()
            }
        );

        let decorated = load_err(
            r#"{"options": {"B": {"profile": "X"}, "A": {"link": ["B"], "profile": "Y"}}}"#,
        );
        assert!(matches!(decorated, TreeError::InvalidLink { .. }));

        let root = load_err(r#"{"link": ["A"]}"#);
        assert!(matches!(root, TreeError::InvalidLink { .. }));
    }

    #[test]
    fn test_links_share_subtrees() {
        let tree = DecisionTree::from_json_str(
            r#"{"options": {
                "HLA": {"options": {"TMT10": {"link": ["PRO", "TMT10"]}}},
                "PRO": {"options": {"TMT10": {"options": {"MS2": {"profile": "TMT10MS2"}}}}}
            }}"#,
        )
        .unwrap();

        assert_eq!(tree.options_at(&["HLA", "TMT10"]).unwrap(), vec!["MS2"]);
        let resolution = tree.resolve_profile(&["HLA", "TMT10", "MS2"]).unwrap();
        assert_eq!(resolution.profile.as_deref(), Some("TMT10MS2"));
        assert_eq!(
            tree.walk(&["HLA", "TMT10"]).unwrap(),
            tree.walk(&["PRO", "TMT10"]).unwrap()
        );
    }

    #[test]
    fn test_default_child_alias_and_empty_profile() {
        let tree = DecisionTree::from_json_str(
            r#"{"options": {"A": {"profile": "", "default_child": "B", "options": {"B": {"profile": "X"}}}}}"#,
        )
        .unwrap();
        let node = tree.node_at(&["A"]).unwrap();
        assert_eq!(node.profile(), None);
        assert_eq!(node.default_child(), Some("B"));
    }

    #[test]
    fn test_implicit_default_key() {
        let tree = defaults_tree();
        assert_eq!(tree.node_at(&["QC"]).unwrap().default_child(), Some(DEFAULT_KEY));
        assert_eq!(tree.node_at(&["DIA"]).unwrap().default_child(), Some("library_free"));
    }

    #[test]
    fn test_definition_round_trips_through_json() {
        let definition: TreeDefinition = serde_json::from_str(DEFAULTS_TREE_JSON).unwrap();
        let json = serde_json::to_string(&definition).unwrap();
        let again: TreeDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(definition, again);
        assert_eq!(
            DecisionTree::from_definition(again).unwrap(),
            defaults_tree()
        );
    }

    #[test]
    fn test_custom_source_through_into_tree() {
        struct Presets(Vec<(&'static str, &'static str)>);

        impl IntoTree for Presets {
            fn into_tree(self) -> std::result::Result<TreeDefinition, TreeError> {
                let mut root = NodeDefinition {
                    label: "Presets".to_string(),
                    ..Default::default()
                };
                for (key, profile) in self.0 {
                    if profile.is_empty() {
                        return Err(TreeError::Conversion(format!("preset '{}' has no profile", key)));
                    }
                    root.options.push((
                        key.to_string(),
                        NodeDefinition {
                            profile: Some(profile.to_string()),
                            ..Default::default()
                        },
                    ));
                }
                Ok(TreeDefinition { root })
            }
        }

        let tree = DecisionTree::from_definition(Presets(vec![("b", "B"), ("a", "A")])).unwrap();
        assert_eq!(tree.options_at(ROOT).unwrap(), vec!["a", "b"]);

        let err = DecisionTree::from_definition(Presets(vec![("a", "")])).unwrap_err();
        assert!(matches!(err, TreeError::Conversion(_)));
    }

    #[test]
    fn test_builder_rejects_dangling_default() {
        let err = TreeBuilder::new(
            NodeBuilder::new("root")
                .default_child("nowhere")
                .option("A", NodeBuilder::new("a").profile("X")),
        )
        .build()
        .unwrap_err();
        assert!(matches!(err, TreeError::DanglingDefault { .. }));
    }
}

#[cfg(test)]
mod query_tests {
    use super::*;

    #[test]
    fn test_options_at_root_sorted() {
        let tree = defaults_tree();
        assert_eq!(tree.options_at(ROOT).unwrap(), vec!["DDA", "DIA", "QC"]);
    }

    #[test]
    fn test_options_exclude_default_key() {
        let tree = defaults_tree();
        assert!(tree.options_at(&["QC"]).unwrap().is_empty());
        assert_eq!(tree.options_at(&["DIA"]).unwrap(), vec!["library"]);
    }

    #[test]
    fn test_options_empty_at_profile_node() {
        let tree = lab_tree();
        assert!(tree.options_at(&["HLA", "LF"]).unwrap().is_empty());
        assert!(tree.options_at(&["PRO", "TMT10", "MS2"]).unwrap().is_empty());
    }

    #[test]
    fn test_specializations_at() {
        let tree = lab_tree();
        assert_eq!(
            tree.specializations_at(&["PRO", "TMT10", "MS2"]).unwrap(),
            vec!["SEMI"]
        );
        assert!(tree.specializations_at(&["PRO", "TMT10"]).unwrap().is_empty());
        assert!(tree.specializations_at(&["HLA", "LF"]).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_step_reports_prefix() {
        let tree = lab_tree();
        let err = tree.options_at(&["PRO", "TMT11", "MS2"]).unwrap_err();
        assert_eq!(err.step, "TMT11");
        assert_eq!(err.valid_prefix, vec!["PRO"]);
        assert_eq!(err.to_string(), "Invalid path step 'TMT11' after 'PRO'");

        let at_root = tree.resolve_profile(&["NOPE"]).unwrap_err();
        assert!(matches!(at_root, ResolveError::Path(ref e) if e.valid_prefix.is_empty()));
    }

    #[test]
    fn test_resolve_profile_at_profile_node() {
        let tree = lab_tree();
        let resolution = tree.resolve_profile(&["HLA", "LF"]).unwrap();
        assert_eq!(resolution.profile.as_deref(), Some("HLA_LF"));
        assert_eq!(resolution.path, vec!["HLA", "LF"]);
    }

    #[test]
    fn test_resolve_profile_without_profile() {
        let tree = lab_tree();
        let resolution = tree.resolve_profile(&["PRO"]).unwrap();
        assert_eq!(resolution.profile, None);
        assert_eq!(resolution.path, vec!["PRO"]);
    }

    #[test]
    fn test_resolve_profile_chases_defaults_once_each() {
        let tree = defaults_tree();

        let qc = tree.resolve_profile(&["QC"]).unwrap();
        assert_eq!(qc.profile.as_deref(), Some("QC_STD"));
        assert_eq!(qc.path, vec!["QC", DEFAULT_KEY]);

        let dia = tree.resolve_profile(&["DIA"]).unwrap();
        assert_eq!(dia.profile.as_deref(), Some("DIA_LIBFREE"));
        assert_eq!(dia.path, vec!["DIA", "library_free", DEFAULT_KEY]);
    }

    #[test]
    fn test_resolve_profile_is_idempotent() {
        let tree = defaults_tree();
        for start in [vec!["QC"], vec!["DIA"], vec!["DIA", "library"], vec!["DDA"], vec![]] {
            let first = tree.resolve_profile(&start).unwrap();
            let second = tree.resolve_profile(&first.path).unwrap();
            assert_eq!(first, second, "resolving {:?} twice", start);
        }
    }

    #[test]
    fn test_options_never_offer_default_key() {
        let tree = defaults_tree();
        let mut pending = vec![Vec::<String>::new()];
        while let Some(path) = pending.pop() {
            let options = tree.options_at(&path).unwrap();
            assert!(!options.contains(&DEFAULT_KEY.to_string()), "at {:?}", path);
            for option in options {
                let mut next = path.clone();
                next.push(option);
                pending.push(tree.resolve_profile(&next).unwrap().path);
            }
        }
    }

    #[test]
    fn test_step_back() {
        let tree = defaults_tree();
        assert!(tree.step_back(ROOT).unwrap().is_empty());
        assert!(tree.step_back(&["QC", DEFAULT_KEY]).unwrap().is_empty());
        assert!(
            tree.step_back(&["DIA", "library_free", DEFAULT_KEY])
                .unwrap()
                .is_empty()
        );
        assert_eq!(tree.step_back(&["DIA", "library"]).unwrap(), vec!["DIA"]);

        let lab = lab_tree();
        assert_eq!(
            lab.step_back(&["PRO", "TMT10", "MS2", "SEMI"]).unwrap(),
            vec!["PRO", "TMT10", "MS2"]
        );
    }

    #[test]
    fn test_node_accessors() {
        let tree = lab_tree();
        let node = tree.node_at(&["HLA", "LF"]).unwrap();
        assert_eq!(node.label(), "Label-free");
        assert_eq!(node.required_inputs(), LAB_INPUTS);
        assert_eq!(node.optional_inputs(), ["HLA"]);
        assert!(node.is_terminal());
        assert_eq!(tree.root().keys(), vec!["HLA", "PRO"]);
    }
}
