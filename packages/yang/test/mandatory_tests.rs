//! §4.6 mandatory-presence checker, exercised against schema trees built
//! through `compile_from_buffer` and a small hand-rolled `DataPresence`
//! oracle standing in for a real data-validation collaborator.

use std::collections::HashMap;

use yang_schema::mandatory::{check, NoData, ViolationReason};
use yang_schema::{compile_from_buffer, CompileOptions, Context, NodeHandle};

fn compile(ctx: &mut Context, src: &str) -> (yang_schema::ModuleId, yang_schema::DiagnosticBag) {
    compile_from_buffer(ctx, src.as_bytes(), &CompileOptions::default()).expect("parses and builds")
}

fn root_of(ctx: &Context, module_id: yang_schema::ModuleId) -> NodeHandle {
    ctx.iter_siblings(ctx.module(module_id).data_head).next().unwrap()
}

fn child_named(ctx: &Context, parent: NodeHandle, name: &str) -> NodeHandle {
    ctx.iter_siblings(ctx.node(parent).child_head)
        .find(|h| ctx.node(*h).name.as_str() == name)
        .unwrap_or_else(|| panic!("no child named '{name}'"))
}

/// Reports a fixed instance count per node and a fixed selected case per
/// choice, set up by each test to model one data tree.
#[derive(Default)]
struct FakeData {
    counts: HashMap<NodeHandle, usize>,
    cases: HashMap<NodeHandle, NodeHandle>,
}

impl yang_schema::mandatory::DataPresence for FakeData {
    fn instance_count(&self, node: NodeHandle, _parent_instance: Option<&str>) -> usize {
        self.counts.get(&node).copied().unwrap_or(0)
    }
    fn selected_case(&self, choice: NodeHandle, _parent_instance: Option<&str>) -> Option<NodeHandle> {
        self.cases.get(&choice).copied()
    }
}

mod leaf_and_anyxml {
    use super::*;

    #[test]
    fn a_missing_mandatory_leaf_is_reported() {
        let mut ctx = Context::with_builtins();
        let (module_id, bag) = compile(
            &mut ctx,
            r#"module m {
                namespace "urn:m";
                prefix m;
                leaf l { type string; mandatory true; }
            }"#,
        );
        assert!(!bag.has_errors());
        let l = root_of(&ctx, module_id);
        let v = check(&ctx, l, None, &NoData).expect("violation");
        assert_eq!(v.node, l);
        assert_eq!(v.reason, ViolationReason::MissingMandatory);
    }

    #[test]
    fn a_present_mandatory_leaf_satisfies_the_constraint() {
        let mut ctx = Context::with_builtins();
        let (module_id, bag) = compile(
            &mut ctx,
            r#"module m {
                namespace "urn:m";
                prefix m;
                leaf l { type string; mandatory true; }
            }"#,
        );
        assert!(!bag.has_errors());
        let l = root_of(&ctx, module_id);
        let mut data = FakeData::default();
        data.counts.insert(l, 1);
        assert_eq!(check(&ctx, l, None, &data), None);
    }

    #[test]
    fn a_non_mandatory_leaf_never_violates_even_when_absent() {
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
        let l = root_of(&ctx, module_id);
        assert_eq!(check(&ctx, l, None, &NoData), None);
    }

    #[test]
    fn a_missing_mandatory_anyxml_is_reported() {
        let mut ctx = Context::with_builtins();
        let (module_id, bag) = compile(
            &mut ctx,
            r#"module m {
                namespace "urn:m";
                prefix m;
                anyxml a { mandatory true; }
            }"#,
        );
        assert!(!bag.has_errors());
        let a = root_of(&ctx, module_id);
        let v = check(&ctx, a, None, &NoData).expect("violation");
        assert_eq!(v.reason, ViolationReason::MissingMandatory);
    }
}

mod cardinality {
    use super::*;

    #[test]
    fn a_leaf_list_under_min_elements_is_reported() {
        let mut ctx = Context::with_builtins();
        let (module_id, bag) = compile(
            &mut ctx,
            r#"module m {
                namespace "urn:m";
                prefix m;
                leaf-list l { type string; min-elements 2; }
            }"#,
        );
        assert!(!bag.has_errors());
        let l = root_of(&ctx, module_id);
        let mut data = FakeData::default();
        data.counts.insert(l, 1);
        let v = check(&ctx, l, None, &data).expect("violation");
        assert_eq!(v.reason, ViolationReason::TooFewElements { min: 2, found: 1 });
    }

    #[test]
    fn a_leaf_list_over_max_elements_is_reported() {
        let mut ctx = Context::with_builtins();
        let (module_id, bag) = compile(
            &mut ctx,
            r#"module m {
                namespace "urn:m";
                prefix m;
                leaf-list l { type string; max-elements 2; }
            }"#,
        );
        assert!(!bag.has_errors());
        let l = root_of(&ctx, module_id);
        let mut data = FakeData::default();
        data.counts.insert(l, 3);
        let v = check(&ctx, l, None, &data).expect("violation");
        assert_eq!(v.reason, ViolationReason::TooManyElements { max: 2, found: 3 });
    }

    #[test]
    fn a_list_within_bounds_satisfies_the_constraint() {
        let mut ctx = Context::with_builtins();
        let (module_id, bag) = compile(
            &mut ctx,
            r#"module m {
                namespace "urn:m";
                prefix m;
                list l {
                    key "k";
                    min-elements 1;
                    max-elements 5;
                    leaf k { type string; }
                }
            }"#,
        );
        assert!(!bag.has_errors());
        let l = root_of(&ctx, module_id);
        let mut data = FakeData::default();
        data.counts.insert(l, 3);
        assert_eq!(check(&ctx, l, None, &data), None);
    }

    #[test]
    fn a_mandatory_descendant_of_a_list_is_only_checked_once_against_the_shared_schema() {
        let mut ctx = Context::with_builtins();
        let (module_id, bag) = compile(
            &mut ctx,
            r#"module m {
                namespace "urn:m";
                prefix m;
                list l {
                    key "k";
                    leaf k { type string; }
                    leaf required { type string; mandatory true; }
                }
            }"#,
        );
        assert!(!bag.has_errors());
        let l = root_of(&ctx, module_id);
        let required = child_named(&ctx, l, "required");
        let v = check(&ctx, l, None, &NoData).expect("violation");
        assert_eq!(v.node, required);
        assert_eq!(v.reason, ViolationReason::MissingMandatory);
    }
}

mod containers {
    use super::*;

    #[test]
    fn an_absent_presence_container_vacuously_satisfies_its_descendants() {
        let mut ctx = Context::with_builtins();
        let (module_id, bag) = compile(
            &mut ctx,
            r#"module m {
                namespace "urn:m";
                prefix m;
                container c {
                    presence "optional feature";
                    leaf required { type string; mandatory true; }
                }
            }"#,
        );
        assert!(!bag.has_errors());
        let c = root_of(&ctx, module_id);
        assert_eq!(check(&ctx, c, None, &NoData), None);
    }

    #[test]
    fn a_present_presence_container_still_enforces_its_descendants() {
        let mut ctx = Context::with_builtins();
        let (module_id, bag) = compile(
            &mut ctx,
            r#"module m {
                namespace "urn:m";
                prefix m;
                container c {
                    presence "optional feature";
                    leaf required { type string; mandatory true; }
                }
            }"#,
        );
        assert!(!bag.has_errors());
        let c = root_of(&ctx, module_id);
        let required = child_named(&ctx, c, "required");
        let mut data = FakeData::default();
        data.counts.insert(c, 1);
        let v = check(&ctx, c, None, &data).expect("violation");
        assert_eq!(v.node, required);
    }

    #[test]
    fn a_non_presence_container_always_enforces_its_descendants() {
        let mut ctx = Context::with_builtins();
        let (module_id, bag) = compile(
            &mut ctx,
            r#"module m {
                namespace "urn:m";
                prefix m;
                container c {
                    leaf required { type string; mandatory true; }
                }
            }"#,
        );
        assert!(!bag.has_errors());
        let c = root_of(&ctx, module_id);
        let v = check(&ctx, c, None, &NoData).expect("violation");
        assert_eq!(v.reason, ViolationReason::MissingMandatory);
    }
}

mod choices {
    use super::*;

    #[test]
    fn a_mandatory_choice_with_no_case_selected_is_reported() {
        let mut ctx = Context::with_builtins();
        let (module_id, bag) = compile(
            &mut ctx,
            r#"module m {
                namespace "urn:m";
                prefix m;
                choice c {
                    mandatory true;
                    case a {
                        leaf x { type string; }
                    }
                    case b {
                        leaf y { type string; }
                    }
                }
            }"#,
        );
        assert!(!bag.has_errors());
        let c = root_of(&ctx, module_id);
        let v = check(&ctx, c, None, &NoData).expect("violation");
        assert_eq!(v.reason, ViolationReason::ChoiceNotSelected);
    }

    #[test]
    fn a_non_mandatory_choice_with_no_case_selected_is_fine() {
        let mut ctx = Context::with_builtins();
        let (module_id, bag) = compile(
            &mut ctx,
            r#"module m {
                namespace "urn:m";
                prefix m;
                choice c {
                    case a {
                        leaf x { type string; }
                    }
                }
            }"#,
        );
        assert!(!bag.has_errors());
        let c = root_of(&ctx, module_id);
        assert_eq!(check(&ctx, c, None, &NoData), None);
    }

    #[test]
    fn a_selected_case_still_enforces_its_own_mandatory_descendants() {
        let mut ctx = Context::with_builtins();
        let (module_id, bag) = compile(
            &mut ctx,
            r#"module m {
                namespace "urn:m";
                prefix m;
                choice c {
                    mandatory true;
                    case a {
                        leaf x { type string; mandatory true; }
                    }
                }
            }"#,
        );
        assert!(!bag.has_errors());
        let c = root_of(&ctx, module_id);
        let a = child_named(&ctx, c, "a");
        let x = child_named(&ctx, a, "x");
        let mut data = FakeData::default();
        data.cases.insert(c, a);
        let v = check(&ctx, c, None, &data).expect("violation");
        assert_eq!(v.node, x);
    }
}

mod feature_gating {
    use super::*;

    #[test]
    fn a_node_disabled_by_an_unsatisfied_if_feature_contributes_no_constraint() {
        let mut ctx = Context::with_builtins();
        let (module_id, bag) = compile(
            &mut ctx,
            r#"module m {
                namespace "urn:m";
                prefix m;
                feature extra;
                container c {
                    leaf required { type string; mandatory true; if-feature extra; }
                }
            }"#,
        );
        assert!(!bag.has_errors());
        let c = root_of(&ctx, module_id);
        assert_eq!(check(&ctx, c, None, &NoData), None);
    }
}
