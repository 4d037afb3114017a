//! Built-in module bootstrap
//!
//! Corresponds to SPEC_FULL.md §C.1. `tree_schema.c` preloads a fixed set
//! of library modules into the context at construction so that an ordinary
//! module's `import ietf-yang-types { prefix yang; }`-style statement has
//! something to resolve against without the embedder loading it from disk
//! first. This crate doesn't carry the real IETF module text (that's a
//! front-end/data concern, §1), just a minimal stand-in with the handful of
//! typedefs test modules actually reach for.

use crate::builder::Builder;
use crate::context::Context;
use crate::model::{BaseType, LengthRestriction, PatternRestriction, Restriction, Type};

pub fn register(ctx: &mut Context) {
    register_yang_types(ctx);
    register_inet_types(ctx);
}

fn register_yang_types(ctx: &mut Context) {
    let mut builder = Builder::begin_module(ctx, "ietf-yang-types", Default::default())
        .expect("built-in module name is a valid identifier");
    builder.set_namespace("urn:ietf:params:xml:ns:yang:ietf-yang-types").unwrap();
    builder.set_prefix("yang").unwrap();
    builder.set_organization("IETF NETMOD (Network Modeling) Working Group").unwrap();
    builder.add_revision("2013-07-15", None, None);
    builder.set_implemented(true);

    let mut yang_identifier = Type::builtin(BaseType::String);
    yang_identifier.length = Some(LengthRestriction { ranges: smallvec::smallvec![(1, 255)] });
    yang_identifier.patterns.push(PatternRestriction {
        regex: ctx_intern(&mut builder, "[^\\x00-\\x1f:]*"),
        inverted: false,
        restriction: Restriction::new(ctx_intern(&mut builder, "yang-identifier-pattern")),
    });
    builder.add_typedef("yang-identifier", yang_identifier).unwrap();

    let counter32 = Type::builtin(BaseType::Uint32);
    builder.add_typedef("counter32", counter32).unwrap();

    let counter64 = Type::builtin(BaseType::Uint64);
    builder.add_typedef("counter64", counter64).unwrap();

    let gauge32 = Type::builtin(BaseType::Uint32);
    builder.add_typedef("gauge32", gauge32).unwrap();

    let date_and_time = Type::builtin(BaseType::String);
    builder.add_typedef("date-and-time", date_and_time).unwrap();

    let unres = builder.finish();
    debug_assert!(unres.is_empty(), "built-in typedefs never defer to the resolver");
}

fn register_inet_types(ctx: &mut Context) {
    let mut builder = Builder::begin_module(ctx, "ietf-inet-types", Default::default())
        .expect("built-in module name is a valid identifier");
    builder.set_namespace("urn:ietf:params:xml:ns:yang:ietf-inet-types").unwrap();
    builder.set_prefix("inet").unwrap();
    builder.set_organization("IETF NETMOD (Network Modeling) Working Group").unwrap();
    builder.add_revision("2013-07-15", None, None);
    builder.set_implemented(true);

    builder.add_typedef("ip-address", Type::builtin(BaseType::String)).unwrap();
    builder.add_typedef("ipv4-address", Type::builtin(BaseType::String)).unwrap();
    builder.add_typedef("ipv6-address", Type::builtin(BaseType::String)).unwrap();
    builder.add_typedef("port-number", Type::builtin(BaseType::Uint16)).unwrap();
    builder.add_typedef("domain-name", Type::builtin(BaseType::String)).unwrap();
    builder.add_typedef("uri", Type::builtin(BaseType::String)).unwrap();

    let unres = builder.finish();
    debug_assert!(unres.is_empty(), "built-in typedefs never defer to the resolver");
}

fn ctx_intern(builder: &mut Builder<'_>, text: &str) -> crate::intern::YangStr {
    builder.intern(text)
}
