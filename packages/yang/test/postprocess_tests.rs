//! §4.4 post-processor duties, driven through the public `compile_from_buffer`
//! entry point so each test reads as a realistic multi-module scenario rather
//! than a hand-assembled tree, the same style `resolver_tests.rs` uses.

use pretty_assertions::assert_eq;
use yang_schema::flags::NodeFlags;
use yang_schema::model::NodePayload;
use yang_schema::{
    compile_from_buffer, feature_enable, feature_state, main_module, node_module, parent, set_private,
    CompileOptions, Context, ErrorKind, FeatureState,
};

fn compile(ctx: &mut Context, src: &str) -> (yang_schema::ModuleId, yang_schema::DiagnosticBag) {
    compile_from_buffer(ctx, src.as_bytes(), &CompileOptions::default()).expect("parses and builds")
}

mod augment_splice {
    use super::*;

    #[test]
    fn a_cross_module_augment_grafts_into_the_target_with_its_own_module_of() {
        // §8 scenario 3.
        let mut ctx = Context::with_builtins();
        let (y_id, bag) = compile(
            &mut ctx,
            r#"module y {
                namespace "urn:y";
                prefix y;
                container root;
            }"#,
        );
        assert!(!bag.has_errors());

        let (x_id, bag) = compile(
            &mut ctx,
            r#"module x {
                namespace "urn:x";
                prefix x;
                import y { prefix y; }
                augment "/y:root" {
                    leaf z { type string; }
                }
            }"#,
        );
        assert!(!bag.has_errors());

        let y_root = ctx.iter_siblings(ctx.module(y_id).data_head).next().unwrap();
        let z = ctx
            .iter_siblings(ctx.node(y_root).child_head)
            .find(|h| ctx.node(*h).name.as_str() == "z")
            .expect("augmented leaf 'z' spliced into y:root");
        assert_eq!(z.module, x_id);
        assert_eq!(node_module(&ctx, z), x_id);
        assert_eq!(parent(&ctx, z), Some(y_root));
    }

    #[test]
    fn a_resolved_augment_is_never_reapplied_on_a_second_postprocess_run() {
        let mut ctx = Context::with_builtins();
        let (module_id, bag) = compile(
            &mut ctx,
            r#"module m {
                namespace "urn:m";
                prefix m;
                container root;
                augment "/m:root" {
                    leaf z { type string; }
                }
            }"#,
        );
        assert!(!bag.has_errors());

        let second_bag = yang_schema::postprocess::run(&mut ctx, module_id);
        assert!(!second_bag.has_errors());
        let root = ctx.iter_siblings(ctx.module(module_id).data_head).next().unwrap();
        let zs: Vec<_> = ctx
            .iter_siblings(ctx.node(root).child_head)
            .filter(|h| ctx.node(*h).name.as_str() == "z")
            .collect();
        assert_eq!(zs.len(), 1);
    }

    #[test]
    fn duplicate_augment_target_children_are_rejected() {
        let mut ctx = Context::with_builtins();
        let (_module_id, bag) = compile(
            &mut ctx,
            r#"module m {
                namespace "urn:m";
                prefix m;
                container root {
                    leaf z { type string; }
                }
                augment "/m:root" {
                    leaf z { type uint8; }
                }
            }"#,
        );
        assert!(bag.has_errors());
        assert!(bag.iter().any(|d| d.kind == ErrorKind::DuplicateId));
    }
}

mod deviation {
    use super::*;

    #[test]
    fn not_supported_unlinks_the_target_and_records_a_direct_deviator_import() {
        // §8 scenario 5.
        let mut ctx = Context::with_builtins();
        let (a_id, bag) = compile(
            &mut ctx,
            r#"module a {
                namespace "urn:a";
                prefix a;
                container x;
            }"#,
        );
        assert!(!bag.has_errors());

        let (dev_id, bag) = compile(
            &mut ctx,
            r#"module devmod {
                namespace "urn:dev";
                prefix d;
                import a { prefix a; }
                deviation "/a:x" { deviate not-supported; }
            }"#,
        );
        assert!(!bag.has_errors());

        assert!(ctx.iter_siblings(ctx.module(a_id).data_head).next().is_none());
        assert!(ctx.module(a_id).is_deviated);
        let back_import = ctx
            .module(a_id)
            .imports
            .iter()
            .find(|imp| imp.resolved == Some(dev_id))
            .expect("back-import recorded");
        assert_eq!(back_import.external, yang_schema::model::ExternalFlag::DirectDeviator);
    }

    #[test]
    fn not_supported_on_a_list_key_leaf_is_rejected() {
        let mut ctx = Context::with_builtins();
        let (_module_id, bag) = compile(
            &mut ctx,
            r#"module m {
                namespace "urn:m";
                prefix m;
                list l {
                    key "a";
                    leaf a { type string; }
                }
                deviation "/m:l/m:a" { deviate not-supported; }
            }"#,
        );
        assert!(bag.has_errors());
        assert!(bag.iter().any(|d| d.kind == ErrorKind::IncompatibleDeviation));
    }

    #[test]
    fn deviate_replace_overrides_and_resolves_the_target_type() {
        let mut ctx = Context::with_builtins();
        let (module_id, bag) = compile(
            &mut ctx,
            r#"module m {
                namespace "urn:m";
                prefix m;
                leaf l { type uint8; }
                deviation "/m:l" { deviate replace { type string; } }
            }"#,
        );
        assert!(!bag.has_errors());
        let l = ctx.iter_siblings(ctx.module(module_id).data_head).next().unwrap();
        match &ctx.node(l).payload {
            NodePayload::Leaf(d) => {
                assert!(d.ty.is_resolved());
                assert!(matches!(
                    d.ty.der,
                    yang_schema::model::Derivation::Base(yang_schema::model::BaseType::String)
                ));
            }
            _ => panic!("expected a leaf"),
        }
    }

    #[test]
    fn deviate_replace_type_to_a_typedef_resolves_through_the_importing_modules_prefix() {
        let mut ctx = Context::with_builtins();
        let (t_id, bag) = compile(
            &mut ctx,
            r#"module t {
                namespace "urn:t";
                prefix t;
                typedef percent {
                    type uint8 {
                        range "0..100";
                    }
                }
            }"#,
        );
        assert!(!bag.has_errors());

        let (module_id, bag) = compile(
            &mut ctx,
            r#"module m {
                namespace "urn:m";
                prefix m;
                import t { prefix t; }
                leaf l { type string; }
                deviation "/m:l" { deviate replace { type t:percent; } }
            }"#,
        );
        assert!(!bag.has_errors());
        let l = ctx.iter_siblings(ctx.module(module_id).data_head).next().unwrap();
        match &ctx.node(l).payload {
            NodePayload::Leaf(d) => {
                assert!(d.ty.is_resolved());
                match &d.ty.der {
                    yang_schema::model::Derivation::Typedef(r) => assert_eq!(r.module, t_id),
                    other => panic!("expected a typedef derivation, got {other:?}"),
                }
            }
            _ => panic!("expected a leaf"),
        }
    }

    #[test]
    fn disabling_then_reenabling_a_deviation_restores_the_deviated_state() {
        let mut ctx = Context::with_builtins();
        let (module_id, bag) = compile(
            &mut ctx,
            r#"module m {
                namespace "urn:m";
                prefix m;
                leaf l { type uint8; default "1"; }
                deviation "/m:l" { deviate replace { default "2"; } }
            }"#,
        );
        assert!(!bag.has_errors());
        let l = ctx.iter_siblings(ctx.module(module_id).data_head).next().unwrap();
        let default_of = |ctx: &Context, l: yang_schema::NodeHandle| match &ctx.node(l).payload {
            NodePayload::Leaf(d) => d.default.as_ref().map(|s| s.to_string()),
            _ => panic!("expected a leaf"),
        };
        assert_eq!(default_of(&ctx, l).as_deref(), Some("2"));

        let mut bag = yang_schema::DiagnosticBag::new();
        yang_schema::postprocess::set_deviations_disabled(&mut ctx, module_id, true, &mut bag);
        assert!(!bag.has_errors());
        assert_eq!(default_of(&ctx, l).as_deref(), Some("1"));

        yang_schema::postprocess::set_deviations_disabled(&mut ctx, module_id, false, &mut bag);
        assert!(!bag.has_errors());
        assert_eq!(default_of(&ctx, l).as_deref(), Some("2"));
    }

    #[test]
    fn disabling_then_reenabling_a_not_supported_deviation_relinks_the_target() {
        let mut ctx = Context::with_builtins();
        let (module_id, bag) = compile(
            &mut ctx,
            r#"module m {
                namespace "urn:m";
                prefix m;
                container root {
                    leaf before { type string; }
                    leaf gone { type string; }
                    leaf after { type string; }
                }
                deviation "/m:root/m:gone" { deviate not-supported; }
            }"#,
        );
        assert!(!bag.has_errors());
        let root = ctx.iter_siblings(ctx.module(module_id).data_head).next().unwrap();
        let names = |ctx: &Context, root: yang_schema::NodeHandle| -> Vec<String> {
            ctx.iter_siblings(ctx.node(root).child_head)
                .map(|h| ctx.node(h).name.to_string())
                .collect()
        };
        assert_eq!(names(&ctx, root), vec!["before", "after"]);

        let mut bag = yang_schema::DiagnosticBag::new();
        yang_schema::postprocess::set_deviations_disabled(&mut ctx, module_id, true, &mut bag);
        assert!(!bag.has_errors());
        assert_eq!(names(&ctx, root), vec!["before", "gone", "after"]);

        yang_schema::postprocess::set_deviations_disabled(&mut ctx, module_id, false, &mut bag);
        assert!(!bag.has_errors());
        assert_eq!(names(&ctx, root), vec!["before", "after"]);
    }

    #[test]
    fn disabling_then_reenabling_a_deviate_add_default_is_not_rejected_as_a_duplicate() {
        let mut ctx = Context::with_builtins();
        let (module_id, bag) = compile(
            &mut ctx,
            r#"module m {
                namespace "urn:m";
                prefix m;
                leaf l { type uint8; }
                deviation "/m:l" { deviate add { default "1"; } }
            }"#,
        );
        assert!(!bag.has_errors());
        let l = ctx.iter_siblings(ctx.module(module_id).data_head).next().unwrap();
        let default_of = |ctx: &Context, l: yang_schema::NodeHandle| match &ctx.node(l).payload {
            NodePayload::Leaf(d) => d.default.as_ref().map(|s| s.to_string()),
            _ => panic!("expected a leaf"),
        };
        assert_eq!(default_of(&ctx, l).as_deref(), Some("1"));

        let mut bag = yang_schema::DiagnosticBag::new();
        yang_schema::postprocess::set_deviations_disabled(&mut ctx, module_id, true, &mut bag);
        assert!(!bag.has_errors());
        assert_eq!(default_of(&ctx, l), None);

        yang_schema::postprocess::set_deviations_disabled(&mut ctx, module_id, false, &mut bag);
        assert!(!bag.has_errors(), "re-enabling 'deviate add' must not see a stale 'already present' state: {bag:?}");
        assert_eq!(default_of(&ctx, l).as_deref(), Some("1"));
    }
}

mod access_control_and_status {
    use super::*;

    #[test]
    fn access_control_propagates_to_structural_descendants_but_not_through_groupings() {
        let mut ctx = Context::with_builtins();
        let (module_id, bag) = compile(
            &mut ctx,
            r#"module m {
                namespace "urn:m";
                prefix m;
                grouping g {
                    leaf inside_grouping { type string; }
                }
                container c {
                    leaf a { type string; }
                    uses g;
                }
            }"#,
        );
        assert!(!bag.has_errors());
        let c = ctx.iter_siblings(ctx.module(module_id).data_head).next().unwrap();
        ctx.node_mut(c).flags.insert(NodeFlags::ACCESS_CONTROL);
        let mut again = yang_schema::DiagnosticBag::new();
        again.extend(yang_schema::postprocess::run(&mut ctx, module_id));

        let a = ctx
            .iter_siblings(ctx.node(c).child_head)
            .find(|h| ctx.node(*h).name.as_str() == "a")
            .unwrap();
        assert!(ctx.node(a).flags.contains(NodeFlags::ACCESS_CONTROL));
    }

    #[test]
    fn a_config_false_leaf_marks_its_container_ancestor() {
        let mut ctx = Context::with_builtins();
        let (module_id, bag) = compile(
            &mut ctx,
            r#"module m {
                namespace "urn:m";
                prefix m;
                container c {
                    leaf a { type string; config false; }
                }
            }"#,
        );
        assert!(!bag.has_errors());
        let c = ctx.iter_siblings(ctx.module(module_id).data_head).next().unwrap();
        assert!(ctx.node(c).flags.contains(NodeFlags::HAS_STATE_DESCENDANT));
    }

    #[test]
    fn a_fully_config_true_tree_has_no_state_descendant_marker() {
        let mut ctx = Context::with_builtins();
        let (module_id, bag) = compile(
            &mut ctx,
            r#"module m {
                namespace "urn:m";
                prefix m;
                container c {
                    leaf a { type string; }
                }
            }"#,
        );
        assert!(!bag.has_errors());
        let c = ctx.iter_siblings(ctx.module(module_id).data_head).next().unwrap();
        assert!(!ctx.node(c).flags.contains(NodeFlags::HAS_STATE_DESCENDANT));
    }
}

mod features {
    use super::*;

    #[test]
    fn enabling_a_dependent_feature_transitively_enables_its_predicate() {
        // §8 scenario 2.
        let mut ctx = Context::with_builtins();
        let (module_id, bag) = compile(
            &mut ctx,
            r#"module m {
                namespace "urn:m";
                prefix m;
                feature A;
                feature B { if-feature A; }
            }"#,
        );
        assert!(!bag.has_errors());
        feature_enable(&mut ctx, module_id, "B").unwrap();
        assert_eq!(feature_state(&ctx, module_id, "A"), Some(FeatureState::Enabled));
        assert_eq!(feature_state(&ctx, module_id, "B"), Some(FeatureState::Enabled));
    }

    #[test]
    fn a_feature_whose_predicate_is_not_enabled_is_effectively_disabled() {
        let mut ctx = Context::with_builtins();
        let (module_id, bag) = compile(
            &mut ctx,
            r#"module m {
                namespace "urn:m";
                prefix m;
                feature A;
                feature B { if-feature A; }
            }"#,
        );
        assert!(!bag.has_errors());
        yang_schema::postprocess::enable_feature(&mut ctx, module_id, "B").unwrap();
        yang_schema::postprocess::disable_feature(&mut ctx, module_id, "A").unwrap();
        assert_eq!(feature_state(&ctx, module_id, "B"), Some(FeatureState::Disabled));
    }

    #[test]
    fn a_node_guarded_by_a_disabled_feature_reports_is_disabled() {
        let mut ctx = Context::with_builtins();
        let (module_id, bag) = compile(
            &mut ctx,
            r#"module m {
                namespace "urn:m";
                prefix m;
                feature A;
                leaf l { type string; if-feature A; }
            }"#,
        );
        assert!(!bag.has_errors());
        let l = ctx.iter_siblings(ctx.module(module_id).data_head).next().unwrap();
        let disabling = yang_schema::is_disabled(&ctx, l, yang_schema::Recursive::None);
        assert_eq!(disabling, Some(l));

        feature_enable(&mut ctx, module_id, "A").unwrap();
        assert_eq!(yang_schema::is_disabled(&ctx, l, yang_schema::Recursive::None), None);
    }
}

mod context_surface {
    use super::*;

    #[test]
    fn parent_across_an_augment_returns_the_target_not_the_augment_node() {
        let mut ctx = Context::with_builtins();
        let (module_id, bag) = compile(
            &mut ctx,
            r#"module m {
                namespace "urn:m";
                prefix m;
                container root;
                augment "/m:root" {
                    leaf z { type string; }
                }
            }"#,
        );
        assert!(!bag.has_errors());
        let root = ctx.iter_siblings(ctx.module(module_id).data_head).next().unwrap();
        let z = ctx
            .iter_siblings(ctx.node(root).child_head)
            .find(|h| ctx.node(*h).name.as_str() == "z")
            .unwrap();
        assert_eq!(parent(&ctx, z), Some(root));
        assert_eq!(main_module(&ctx, module_id), module_id);
    }

    #[test]
    fn set_private_returns_the_previous_value() {
        let mut ctx = Context::with_builtins();
        let (module_id, bag) = compile(
            &mut ctx,
            r#"module m {
                namespace "urn:m";
                prefix m;
                leaf l { type string; }
            }"#,
        );
        assert!(!bag.has_errors());
        let l = ctx.iter_siblings(ctx.module(module_id).data_head).next().unwrap();
        assert_eq!(set_private(&mut ctx, l, Some(42)), None);
        assert_eq!(set_private(&mut ctx, l, Some(43)), Some(42));
    }
}
