//! §4.3 resolution rules and the boundary cases §8 calls out explicitly,
//! driven through the public `compile_from_buffer` entry point so each test
//! reads as a realistic module rather than a hand-built unres entry.

use pretty_assertions::assert_eq;
use yang_schema::{compile_from_buffer, CompileOptions, Context, ErrorKind};

/// The resolver's pass/discharge bookkeeping (SPEC_FULL §B) emits
/// `tracing` spans; wiring up a subscriber here means a failing test's
/// `cargo test -- --nocapture` shows the actual fixed-point trace instead of
/// just the final diagnostic. `try_init` since every test in the binary
/// calls this and only the first one may succeed.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn compiles(src: &str) -> (yang_schema::ModuleId, yang_schema::DiagnosticBag, Context) {
    init_tracing();
    let mut ctx = Context::with_builtins();
    let (module_id, bag) =
        compile_from_buffer(&mut ctx, src.as_bytes(), &CompileOptions::default()).expect("parses and builds");
    (module_id, bag, ctx)
}

fn first_error_kind(bag: &yang_schema::DiagnosticBag) -> ErrorKind {
    bag.iter().find(|d| d.is_fatal()).expect("at least one error diagnostic").kind
}

mod type_der {
    use super::*;

    #[test]
    fn a_typedef_chain_resolves_to_its_built_in_base() {
        let (module_id, bag, ctx) = compiles(
            r#"module m {
                namespace "urn:m";
                prefix m;
                typedef percent {
                    type uint8 { range "0..100"; }
                }
                leaf p { type percent; }
            }"#,
        );
        assert!(!bag.has_errors());
        let module = ctx.module(module_id);
        let leaf = ctx.iter_siblings(module.data_head).next().unwrap();
        let ty = match &ctx.node(leaf).payload {
            yang_schema::model::NodePayload::Leaf(d) => &d.ty,
            _ => panic!("expected a leaf"),
        };
        assert!(ty.is_resolved());
        assert_eq!(&ty.range.as_ref().unwrap().ranges[..], &[(0, 100)]);
    }

    #[test]
    fn a_typedef_self_loop_is_a_cycle() {
        let (_module_id, bag, _ctx) = compiles(
            r#"module m {
                namespace "urn:m";
                prefix m;
                typedef t { type t; }
                leaf l { type t; }
            }"#,
        );
        assert!(bag.has_errors());
        assert_eq!(first_error_kind(&bag), ErrorKind::CycleDetected);
    }

    #[test]
    fn length_on_a_numeric_base_is_an_incompatible_facet() {
        let (_module_id, bag, _ctx) = compiles(
            r#"module m {
                namespace "urn:m";
                prefix m;
                leaf l { type uint8 { length "0..10"; } }
            }"#,
        );
        assert!(bag.has_errors());
        assert_eq!(first_error_kind(&bag), ErrorKind::IncompatibleFacet);
    }

    #[test]
    fn fraction_digits_one_and_eighteen_are_accepted() {
        let (_module_id, bag, _ctx) = compiles(
            r#"module m {
                namespace "urn:m";
                prefix m;
                leaf a { type decimal64 { fraction-digits "1"; } }
                leaf b { type decimal64 { fraction-digits "18"; } }
            }"#,
        );
        assert!(!bag.has_errors());
    }

    #[test]
    fn fraction_digits_zero_is_rejected() {
        let (_module_id, bag, _ctx) = compiles(
            r#"module m {
                namespace "urn:m";
                prefix m;
                leaf a { type decimal64 { fraction-digits "0"; } }
            }"#,
        );
        assert!(bag.has_errors());
        assert_eq!(first_error_kind(&bag), ErrorKind::InvalidArgument);
    }

    #[test]
    fn fraction_digits_nineteen_is_rejected() {
        let (_module_id, bag, _ctx) = compiles(
            r#"module m {
                namespace "urn:m";
                prefix m;
                leaf a { type decimal64 { fraction-digits "19"; } }
            }"#,
        );
        assert!(bag.has_errors());
        assert_eq!(first_error_kind(&bag), ErrorKind::InvalidArgument);
    }
}

mod leafref {
    use super::*;

    #[test]
    fn a_relative_path_resolves_to_its_sibling_leaf_and_records_the_backlink() {
        let (module_id, bag, ctx) = compiles(
            r#"module m {
                namespace "urn:m";
                prefix m;
                leaf k { type uint32; }
                leaf l { type leafref { path "../k"; } }
            }"#,
        );
        assert!(!bag.has_errors());
        let module = ctx.module(module_id);
        let siblings: Vec<_> = ctx.iter_siblings(module.data_head).collect();
        let k = siblings[0];
        let l = siblings[1];
        let l_ty = match &ctx.node(l).payload {
            yang_schema::model::NodePayload::Leaf(d) => &d.ty,
            _ => panic!("expected a leaf"),
        };
        assert_eq!(l_ty.leafref.target, Some(k));
        let k_backlinks = match &ctx.node(k).payload {
            yang_schema::model::NodePayload::Leaf(d) => &d.leafref_backlinks,
            _ => panic!("expected a leaf"),
        };
        assert_eq!(k_backlinks.as_slice(), &[l]);
    }

    #[test]
    fn a_leafref_pointing_at_itself_is_a_cycle() {
        let (_module_id, bag, _ctx) = compiles(
            r#"module m {
                namespace "urn:m";
                prefix m;
                leaf l { type leafref { path "/m:l"; } }
            }"#,
        );
        assert!(bag.has_errors());
        assert_eq!(first_error_kind(&bag), ErrorKind::CycleDetected);
    }
}

mod list_keys {
    use super::*;

    #[test]
    fn a_repeated_key_name_is_a_duplicate_key() {
        let (_module_id, bag, _ctx) = compiles(
            r#"module m {
                namespace "urn:m";
                prefix m;
                list l {
                    key "a a";
                    leaf a { type string; }
                }
            }"#,
        );
        assert!(bag.has_errors());
        assert_eq!(first_error_kind(&bag), ErrorKind::InvalidArgument);
    }

    #[test]
    fn distinct_keys_resolve_to_their_leaves_in_order() {
        let (module_id, bag, ctx) = compiles(
            r#"module m {
                namespace "urn:m";
                prefix m;
                list l {
                    key "a b";
                    leaf a { type string; }
                    leaf b { type string; }
                }
            }"#,
        );
        assert!(!bag.has_errors());
        let module = ctx.module(module_id);
        let list = ctx.iter_siblings(module.data_head).next().unwrap();
        let keys = match &ctx.node(list).payload {
            yang_schema::model::NodePayload::List(d) => d.keys.clone(),
            _ => panic!("expected a list"),
        };
        let names: Vec<_> = keys.iter().map(|k| ctx.node(*k).name.to_string()).collect();
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
    }
}

mod union_members {
    use super::*;

    #[test]
    fn every_member_resolves_independently() {
        let (module_id, bag, ctx) = compiles(
            r#"module m {
                namespace "urn:m";
                prefix m;
                typedef percent { type uint8 { range "0..100"; } }
                leaf u {
                    type union {
                        type percent;
                        type string;
                    }
                }
            }"#,
        );
        assert!(!bag.has_errors());
        let module = ctx.module(module_id);
        let leaf = ctx.iter_siblings(module.data_head).next().unwrap();
        let ty = match &ctx.node(leaf).payload {
            yang_schema::model::NodePayload::Leaf(d) => &d.ty,
            _ => panic!("expected a leaf"),
        };
        assert_eq!(ty.union_members.len(), 2);
        assert!(ty.union_members.iter().all(|m| m.is_resolved()));
    }

    #[test]
    fn empty_is_rejected_as_a_union_member() {
        let (_module_id, bag, _ctx) = compiles(
            r#"module m {
                namespace "urn:m";
                prefix m;
                leaf u {
                    type union {
                        type empty;
                        type string;
                    }
                }
            }"#,
        );
        assert!(bag.has_errors());
        assert_eq!(first_error_kind(&bag), ErrorKind::IncompatibleFacet);
    }

    #[test]
    fn leafref_is_rejected_as_a_union_member() {
        let (_module_id, bag, _ctx) = compiles(
            r#"module m {
                namespace "urn:m";
                prefix m;
                leaf x { type string; }
                leaf u {
                    type union {
                        type leafref { path "../x"; }
                        type string;
                    }
                }
            }"#,
        );
        assert!(bag.has_errors());
        assert_eq!(first_error_kind(&bag), ErrorKind::IncompatibleFacet);
    }
}
