//! §3/§6 `Context` registry and query surface: module lookup, the
//! `node-module`/`main-module`/`parent`/`set-private`/`is-disabled` family,
//! and the sibling cyclic-prev ring invariant.

use yang_schema::{compile_from_buffer, is_disabled, CompileOptions, Context, Recursive};

fn compile(ctx: &mut Context, src: &str) -> (yang_schema::ModuleId, yang_schema::DiagnosticBag) {
    compile_from_buffer(ctx, src.as_bytes(), &CompileOptions::default()).expect("parses and builds")
}

mod module_registry {
    use super::*;

    #[test]
    fn find_module_by_name_returns_the_implemented_revision() {
        let mut ctx = Context::with_builtins();
        let (module_id, bag) = compile(
            &mut ctx,
            r#"module m {
                namespace "urn:m";
                prefix m;
                revision 2020-01-01;
            }"#,
        );
        assert!(!bag.has_errors());
        assert_eq!(ctx.find_module("m", None), Some(module_id));
        assert_eq!(ctx.find_implemented("m"), Some(module_id));
    }

    #[test]
    fn find_module_by_an_unregistered_name_is_none() {
        let ctx = Context::with_builtins();
        assert_eq!(ctx.find_module("does-not-exist", None), None);
    }

    #[test]
    fn implementing_a_second_revision_of_an_already_implemented_module_is_rejected() {
        let mut ctx = Context::with_builtins();
        let (_module_id, bag) = compile(
            &mut ctx,
            r#"module m {
                namespace "urn:m";
                prefix m;
                revision 2020-01-01;
            }"#,
        );
        assert!(!bag.has_errors());

        let err = compile_from_buffer(
            &mut ctx,
            br#"module m {
                namespace "urn:m";
                prefix m;
                revision 2021-06-01;
            }"#,
            &CompileOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, yang_schema::CompileError::Diagnostic(_)));
    }

    #[test]
    fn module_count_and_module_ids_track_every_inserted_module() {
        let mut ctx = Context::with_builtins();
        let before = ctx.module_count();
        compile(&mut ctx, r#"module one { namespace "urn:one"; prefix o; }"#);
        compile(&mut ctx, r#"module two { namespace "urn:two"; prefix t; }"#);
        assert_eq!(ctx.module_count(), before + 2);
        assert_eq!(ctx.module_ids().count(), ctx.module_count());
    }

    #[test]
    fn module_names_reports_distinct_names_in_load_order() {
        let mut ctx = Context::new();
        compile(&mut ctx, r#"module one { namespace "urn:one"; prefix o; }"#);
        compile(&mut ctx, r#"module two { namespace "urn:two"; prefix t; }"#);
        assert_eq!(ctx.module_names().collect::<Vec<_>>(), vec!["one", "two"]);
    }
}

mod submodules {
    use super::*;

    #[test]
    fn a_submodules_data_nodes_are_grafted_into_the_main_module_and_report_it_as_node_module() {
        let mut ctx = Context::with_builtins();
        let (main_id, bag) = compile(
            &mut ctx,
            r#"module m {
                namespace "urn:m";
                prefix m;
                include sub;
            }"#,
        );
        assert!(!bag.has_errors());

        let (sub_id, bag) = compile(
            &mut ctx,
            r#"submodule sub {
                belongs-to m {
                    prefix m;
                }
                leaf from_sub { type string; }
            }"#,
        );
        assert!(!bag.has_errors());

        assert_eq!(yang_schema::main_module(&ctx, sub_id), main_id);
        let leaf = ctx
            .iter_siblings(ctx.module(main_id).data_head)
            .find(|h| ctx.node(*h).name.as_str() == "from_sub")
            .expect("submodule leaf grafted into the main module's data list");
        assert_eq!(yang_schema::node_module(&ctx, leaf), main_id);
    }
}

mod parent_and_augments {
    use super::*;

    #[test]
    fn a_top_level_node_has_no_parent() {
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
        assert_eq!(ctx.parent(l), None);
    }

    #[test]
    fn a_nested_leafs_parent_is_its_container() {
        let mut ctx = Context::with_builtins();
        let (module_id, bag) = compile(
            &mut ctx,
            r#"module m {
                namespace "urn:m";
                prefix m;
                container c {
                    leaf l { type string; }
                }
            }"#,
        );
        assert!(!bag.has_errors());
        let c = ctx.iter_siblings(ctx.module(module_id).data_head).next().unwrap();
        let l = ctx.iter_siblings(ctx.node(c).child_head).next().unwrap();
        assert_eq!(ctx.parent(l), Some(c));
    }
}

mod is_disabled {
    use super::*;

    #[test]
    fn recursive_none_only_checks_the_node_itself() {
        let mut ctx = Context::with_builtins();
        let (module_id, bag) = compile(
            &mut ctx,
            r#"module m {
                namespace "urn:m";
                prefix m;
                feature extra;
                container c {
                    if-feature extra;
                    leaf l { type string; }
                }
            }"#,
        );
        assert!(!bag.has_errors());
        let c = ctx.iter_siblings(ctx.module(module_id).data_head).next().unwrap();
        let l = ctx.iter_siblings(ctx.node(c).child_head).next().unwrap();
        // `l` itself carries no if-feature, so Recursive::None sees nothing,
        // even though its ancestor `c` is disabled.
        assert_eq!(is_disabled(&ctx, l, Recursive::None), None);
        assert_eq!(is_disabled(&ctx, c, Recursive::None), Some(c));
    }

    #[test]
    fn recursive_all_climbs_through_disabled_ancestors() {
        let mut ctx = Context::with_builtins();
        let (module_id, bag) = compile(
            &mut ctx,
            r#"module m {
                namespace "urn:m";
                prefix m;
                feature extra;
                container c {
                    if-feature extra;
                    leaf l { type string; }
                }
            }"#,
        );
        assert!(!bag.has_errors());
        let c = ctx.iter_siblings(ctx.module(module_id).data_head).next().unwrap();
        let l = ctx.iter_siblings(ctx.node(c).child_head).next().unwrap();
        assert_eq!(is_disabled(&ctx, l, Recursive::All), Some(c));
    }

    #[test]
    fn an_enabled_tree_is_never_disabled() {
        let mut ctx = Context::with_builtins();
        let (module_id, bag) = compile(
            &mut ctx,
            r#"module m {
                namespace "urn:m";
                prefix m;
                container c {
                    leaf l { type string; }
                }
            }"#,
        );
        assert!(!bag.has_errors());
        let c = ctx.iter_siblings(ctx.module(module_id).data_head).next().unwrap();
        let l = ctx.iter_siblings(ctx.node(c).child_head).next().unwrap();
        assert_eq!(is_disabled(&ctx, l, Recursive::All), None);
    }

    #[test]
    fn data_only_stops_climbing_past_the_nearest_data_ancestor() {
        let mut ctx = Context::with_builtins();
        let (module_id, bag) = compile(
            &mut ctx,
            r#"module m {
                namespace "urn:m";
                prefix m;
                feature extra;
                container c {
                    if-feature extra;
                    container inner {
                        leaf l { type string; }
                    }
                }
            }"#,
        );
        assert!(!bag.has_errors());
        let c = ctx.iter_siblings(ctx.module(module_id).data_head).next().unwrap();
        let inner = ctx.iter_siblings(ctx.node(c).child_head).next().unwrap();
        let l = ctx.iter_siblings(ctx.node(inner).child_head).next().unwrap();
        // `inner` is itself a data node one hop up from `l`; DataOnly stops
        // there without ever reaching the disabled `c` above it.
        assert_eq!(is_disabled(&ctx, l, Recursive::DataOnly), None);
    }
}

mod private_pointer {
    use super::*;

    #[test]
    fn set_private_starts_at_none_and_returns_the_previous_value_on_each_call() {
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
        assert_eq!(ctx.set_private(l, Some(7)), None);
        assert_eq!(ctx.set_private(l, Some(8)), Some(7));
        assert_eq!(ctx.set_private(l, None), Some(8));
    }
}

mod sibling_ring {
    use super::*;

    #[test]
    fn the_ring_is_cyclic_head_prev_is_tail_tail_next_is_none() {
        let mut ctx = Context::with_builtins();
        let (module_id, bag) = compile(
            &mut ctx,
            r#"module m {
                namespace "urn:m";
                prefix m;
                leaf a { type string; }
                leaf b { type string; }
                leaf c { type string; }
            }"#,
        );
        assert!(!bag.has_errors());
        let head = ctx.module(module_id).data_head.unwrap();
        let names: Vec<_> = ctx.iter_siblings(Some(head)).map(|h| ctx.node(h).name.to_string()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);

        let tail = ctx.iter_siblings(Some(head)).last().unwrap();
        assert_eq!(ctx.node(tail).next, None);
        assert_eq!(ctx.node(head).prev, Some(tail));
    }

    #[test]
    fn a_single_child_ring_is_its_own_prev() {
        let mut ctx = Context::with_builtins();
        let (module_id, bag) = compile(
            &mut ctx,
            r#"module m {
                namespace "urn:m";
                prefix m;
                leaf only { type string; }
            }"#,
        );
        assert!(!bag.has_errors());
        let head = ctx.module(module_id).data_head.unwrap();
        assert_eq!(ctx.node(head).prev, Some(head));
        assert_eq!(ctx.node(head).next, None);
    }
}
