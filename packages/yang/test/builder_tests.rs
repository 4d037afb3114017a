//! Exercises `Builder` directly, without running the resolver or
//! post-processor, per `lower::lower_module`'s "split exists so tests can
//! exercise the builder stage in isolation".

use yang_schema::builder::{Builder, SizeHints};
use yang_schema::context::Context;
use yang_schema::model::{BaseType, Type};

mod sibling_ring {
    use super::*;

    #[test]
    fn a_lone_child_is_its_own_prev_and_has_no_next() {
        let mut ctx = Context::new();
        let mut b = Builder::begin_module(&mut ctx, "m", SizeHints::default()).unwrap();
        let leaf = b.add_leaf(None, "a", Type::builtin(BaseType::String)).unwrap();
        b.finish();

        let node = ctx.node(leaf);
        assert_eq!(node.prev, Some(leaf));
        assert_eq!(node.next, None);
    }

    #[test]
    fn head_prev_always_points_at_the_current_tail() {
        let mut ctx = Context::new();
        let mut b = Builder::begin_module(&mut ctx, "m", SizeHints::default()).unwrap();
        let first = b.add_leaf(None, "a", Type::builtin(BaseType::String)).unwrap();
        let second = b.add_leaf(None, "b", Type::builtin(BaseType::String)).unwrap();
        let third = b.add_leaf(None, "c", Type::builtin(BaseType::String)).unwrap();
        b.finish();

        assert_eq!(ctx.node(first).prev, Some(third));
        assert_eq!(ctx.node(first).next, Some(second));
        assert_eq!(ctx.node(second).next, Some(third));
        assert_eq!(ctx.node(third).next, None);
        assert_eq!(ctx.module(ctx_module_id(&ctx)).data_head, Some(first));
    }

    fn ctx_module_id(ctx: &Context) -> yang_schema::ModuleId {
        ctx.module_ids().next().expect("one module was inserted")
    }

    #[test]
    fn duplicate_sibling_names_are_rejected() {
        let mut ctx = Context::new();
        let mut b = Builder::begin_module(&mut ctx, "m", SizeHints::default()).unwrap();
        b.add_leaf(None, "a", Type::builtin(BaseType::String)).unwrap();
        let err = b.add_leaf(None, "a", Type::builtin(BaseType::Uint8)).unwrap_err();
        assert_eq!(err.kind, yang_schema::ErrorKind::DuplicateId);
    }
}

mod config_inheritance {
    use super::*;

    #[test]
    fn a_child_with_no_explicit_config_inherits_its_parent() {
        let mut ctx = Context::new();
        let mut b = Builder::begin_module(&mut ctx, "m", SizeHints::default()).unwrap();
        let container = b.add_container(None, "c", None).unwrap();
        b.set_config(container, false);
        let leaf = b.add_leaf(Some(container), "a", Type::builtin(BaseType::String)).unwrap();
        b.finish();

        assert!(!ctx.node(leaf).flags.is_config());
        assert!(!ctx.node(leaf).flags.has_explicit_config());
    }

    #[test]
    fn explicit_config_survives_attach() {
        let mut ctx = Context::new();
        let mut b = Builder::begin_module(&mut ctx, "m", SizeHints::default()).unwrap();
        let container = b.add_container(None, "c", None).unwrap();
        b.set_config(container, false);
        let leaf = b.add_leaf(Some(container), "a", Type::builtin(BaseType::String)).unwrap();
        b.set_config(leaf, true);
        b.finish();

        assert!(ctx.node(leaf).flags.is_config());
        assert!(ctx.node(leaf).flags.has_explicit_config());
    }

    #[test]
    fn structural_parents_propagate_nothing() {
        // A `uses`/`grouping` node isn't a data node, so a child attached
        // under it doesn't inherit a config value from it — it falls back
        // to the default of `true` instead.
        let mut ctx = Context::new();
        let mut b = Builder::begin_module(&mut ctx, "m", SizeHints::default()).unwrap();
        let grouping = b.add_grouping(None, "g").unwrap();
        b.set_config(grouping, false);
        let leaf = b.add_leaf(Some(grouping), "a", Type::builtin(BaseType::String)).unwrap();
        b.finish();

        assert!(ctx.node(leaf).flags.is_config());
    }
}

mod duplicate_statements {
    use super::*;

    #[test]
    fn a_second_namespace_statement_is_rejected() {
        let mut ctx = Context::new();
        let mut b = Builder::begin_module(&mut ctx, "m", SizeHints::default()).unwrap();
        b.set_namespace("urn:m").unwrap();
        let err = b.set_namespace("urn:m2").unwrap_err();
        assert_eq!(err.kind, yang_schema::ErrorKind::MisplacedStatement);
    }

    #[test]
    fn a_second_description_on_a_node_is_rejected() {
        let mut ctx = Context::new();
        let mut b = Builder::begin_module(&mut ctx, "m", SizeHints::default()).unwrap();
        let leaf = b.add_leaf(None, "a", Type::builtin(BaseType::String)).unwrap();
        b.set_node_description(leaf, "first").unwrap();
        assert!(b.set_node_description(leaf, "second").is_err());
    }
}

mod identifiers {
    use super::*;

    #[test]
    fn an_invalid_module_name_is_rejected_before_anything_is_inserted() {
        let mut ctx = Context::new();
        let err = Builder::begin_module(&mut ctx, "1bad", SizeHints::default()).unwrap_err();
        assert_eq!(err.kind, yang_schema::ErrorKind::InvalidChar);
        assert_eq!(ctx.module_count(), 0);
    }

    #[test]
    fn the_reserved_xml_prefix_is_rejected() {
        let mut ctx = Context::new();
        let mut b = Builder::begin_module(&mut ctx, "m", SizeHints::default()).unwrap();
        let err = b.add_leaf(None, "xmlThing", Type::builtin(BaseType::String)).unwrap_err();
        assert_eq!(err.kind, yang_schema::ErrorKind::InvalidChar);
    }
}

mod deferred_obligations {
    use super::*;

    #[test]
    fn a_leaf_queues_exactly_one_type_der_obligation() {
        let mut ctx = Context::new();
        let mut b = Builder::begin_module(&mut ctx, "m", SizeHints::default()).unwrap();
        b.add_leaf(None, "a", Type::builtin(BaseType::String)).unwrap();
        let unres = b.finish();
        assert_eq!(unres.len(), 1);
    }

    #[test]
    fn a_list_with_a_key_argument_queues_a_list_keys_obligation() {
        let mut ctx = Context::new();
        let mut b = Builder::begin_module(&mut ctx, "m", SizeHints::default()).unwrap();
        let list = b.add_list(None, "l", Some("a")).unwrap();
        b.add_leaf(Some(list), "a", Type::builtin(BaseType::String)).unwrap();
        let unres = b.finish();
        // one `type-der` for the key leaf, one `list-keys` for the list itself
        assert_eq!(unres.len(), 2);
    }

    #[test]
    fn a_list_without_a_key_argument_queues_no_list_keys_obligation() {
        let mut ctx = Context::new();
        let mut b = Builder::begin_module(&mut ctx, "m", SizeHints::default()).unwrap();
        b.add_list(None, "l", None).unwrap();
        let unres = b.finish();
        assert!(unres.is_empty());
    }
}
