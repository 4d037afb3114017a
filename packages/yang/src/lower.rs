//! Statement-tree lowering
//!
//! Walks the generic tree [`crate::front::parser`] produces and drives
//! [`crate::builder::Builder`] — the "token/production callbacks to the
//! builder" §1 describes the front end as delivering, just inlined as
//! direct calls instead of crossing a crate boundary. One function per
//! statement family, the way a recursive-descent lowering pass visits one
//! AST node kind per function.

use crate::builder::{Builder, SizeHints};
use crate::diagnostics::{BuildResult, Diagnostic, ErrorKind};
use crate::flags::Status;
use crate::front::Stmt;
use crate::model::node::Refine;
use crate::model::{BaseType, Deviate, ModuleId, NodeHandle};
use crate::unres::TypeLocation;

/// Builds a module from its parsed statement tree and hands back the
/// deferred-work set the front end accumulated, still undischarged. Callers
/// never invoke this directly for a full compile — [`compile`] is the real
/// entry point, running the resolver and post-processor afterward; this
/// split exists so tests can exercise the builder stage in isolation.
pub fn lower_module(
    ctx: &mut crate::context::Context,
    stmt: &Stmt,
    implement: bool,
) -> BuildResult<(ModuleId, crate::unres::UnresSet)> {
    let name = stmt.arg();
    let is_submodule = stmt.keyword == "submodule";
    let mut builder = Builder::begin_module(ctx, name, SizeHints::default())?;
    builder.set_implemented(implement);

    if is_submodule {
        if let Some(belongs) = stmt.find("belongs-to") {
            builder.set_belongs_to(belongs.arg())?;
        }
    } else if let Some(ns) = stmt.find("namespace") {
        builder.set_namespace(ns.arg())?;
    }
    if let Some(p) = stmt.find("prefix") {
        builder.set_prefix(p.arg())?;
    }
    if let Some(s) = stmt.find("organization") {
        builder.set_organization(s.arg())?;
    }
    if let Some(s) = stmt.find("contact") {
        builder.set_contact(s.arg())?;
    }
    if let Some(s) = stmt.find("description") {
        builder.set_description(s.arg())?;
    }
    if let Some(s) = stmt.find("reference") {
        builder.set_reference(s.arg())?;
    }
    for rev in stmt.find_all("revision") {
        builder.add_revision(
            rev.arg(),
            rev.find("description").map(Stmt::arg),
            rev.find("reference").map(Stmt::arg),
        );
    }
    for imp in stmt.find_all("import") {
        let prefix = imp.find("prefix").map(Stmt::arg).unwrap_or("");
        builder.add_import(imp.arg(), prefix, imp.find("revision-date").map(Stmt::arg))?;
    }
    for inc in stmt.find_all("include") {
        builder.add_include(inc.arg(), inc.find("revision-date").map(Stmt::arg));
    }

    for td in stmt.find_all("typedef") {
        lower_typedef(&mut builder, td)?;
    }
    for ident in stmt.find_all("identity") {
        lower_identity(&mut builder, ident)?;
    }
    for feat in stmt.find_all("feature") {
        lower_feature(&mut builder, feat)?;
    }
    for grp in stmt.find_all("grouping") {
        lower_grouping(&mut builder, None, grp)?;
    }
    lower_data_children(&mut builder, None, &stmt.substatements)?;
    for aug in stmt.find_all("augment") {
        lower_augment(&mut builder, aug)?;
    }
    for dev in stmt.find_all("deviation") {
        lower_deviation(&mut builder, dev)?;
    }

    let module_id = builder.module_id();
    let unres = builder.finish();
    Ok((module_id, unres))
}

/// Full pipeline for a single module: build, run the deferred-work set to a
/// fixed point, then splice augments/deviations and propagate derived flags
/// (§4 builder -> resolver -> post-processor). Structural errors the
/// builder can catch immediately (malformed identifiers, duplicate names,
/// wrong-context statements) abort with `Err` before any resolver work
/// starts; everything the resolver and post-processor find is instead
/// collected into the returned bag, since a module with residual diagnostics
/// is still a real, queryable module per §7 "Propagation".
pub fn compile(
    ctx: &mut crate::context::Context,
    stmt: &Stmt,
    implement: bool,
) -> BuildResult<(ModuleId, crate::diagnostics::DiagnosticBag)> {
    let (module_id, unres) = lower_module(ctx, stmt, implement)?;
    let mut bag = crate::resolver::Resolver::new(ctx, module_id).run(unres);
    bag.extend(crate::postprocess::run(ctx, module_id));
    Ok((module_id, bag))
}

const DATA_KEYWORDS: &[&str] = &[
    "container", "leaf", "leaf-list", "list", "anyxml", "anydata", "choice", "case", "uses", "rpc",
    "notification", "action",
];

fn lower_data_children(builder: &mut Builder<'_>, parent: Option<NodeHandle>, stmts: &[Stmt]) -> BuildResult<()> {
    for stmt in stmts {
        if !DATA_KEYWORDS.contains(&stmt.keyword.as_str()) {
            continue;
        }
        lower_one_data_node(builder, parent, stmt)?;
    }
    Ok(())
}

fn lower_one_data_node(builder: &mut Builder<'_>, parent: Option<NodeHandle>, stmt: &Stmt) -> BuildResult<()> {
    match stmt.keyword.as_str() {
        "container" => {
            let presence = stmt.find("presence").map(Stmt::arg);
            let handle = builder.add_container(parent, stmt.arg(), presence)?;
            apply_common_fields(builder, handle, stmt)?;
            if let Some(cfg) = stmt.find("config") {
                builder.set_config(handle, parse_bool(cfg.arg()));
            }
            for td in stmt.find_all("typedef") {
                lower_typedef(builder, td)?;
            }
            for grp in stmt.find_all("grouping") {
                lower_grouping(builder, Some(handle), grp)?;
            }
            lower_data_children(builder, Some(handle), &stmt.substatements)?;
        }
        "leaf" => {
            let ty = lower_type_stmt_freestanding(builder, stmt.find("type").ok_or_else(missing_type)?)?;
            let handle = builder.add_leaf(parent, stmt.arg(), ty)?;
            bind_type_unres(builder, handle, stmt.find("type").unwrap());
            apply_common_fields(builder, handle, stmt)?;
            if let Some(cfg) = stmt.find("config") {
                builder.set_config(handle, parse_bool(cfg.arg()));
            }
            if let Some(m) = stmt.find("mandatory") {
                builder.set_mandatory(handle, parse_bool(m.arg()));
            }
            if let Some(u) = stmt.find("units") {
                builder.set_units(handle, u.arg())?;
            }
            if let Some(d) = stmt.find("default") {
                builder.set_leaf_default(handle, d.arg())?;
            }
        }
        "leaf-list" => {
            let ty = lower_type_stmt_freestanding(builder, stmt.find("type").ok_or_else(missing_type)?)?;
            let handle = builder.add_leaf_list(parent, stmt.arg(), ty)?;
            bind_type_unres(builder, handle, stmt.find("type").unwrap());
            apply_common_fields(builder, handle, stmt)?;
            if let Some(cfg) = stmt.find("config") {
                builder.set_config(handle, parse_bool(cfg.arg()));
            }
            if let Some(u) = stmt.find("units") {
                builder.set_units(handle, u.arg())?;
            }
            for d in stmt.find_all("default") {
                builder.set_leaf_default(handle, d.arg())?;
            }
        }
        "list" => {
            let keys = stmt.find("key").map(Stmt::arg);
            let handle = builder.add_list(parent, stmt.arg(), keys)?;
            apply_common_fields(builder, handle, stmt)?;
            if let Some(cfg) = stmt.find("config") {
                builder.set_config(handle, parse_bool(cfg.arg()));
            }
            for uniq in stmt.find_all("unique") {
                builder.add_list_unique(handle, uniq.arg());
            }
            for td in stmt.find_all("typedef") {
                lower_typedef(builder, td)?;
            }
            for grp in stmt.find_all("grouping") {
                lower_grouping(builder, Some(handle), grp)?;
            }
            lower_data_children(builder, Some(handle), &stmt.substatements)?;
        }
        "anyxml" | "anydata" => {
            let handle = builder.add_anyxml(parent, stmt.arg())?;
            apply_common_fields(builder, handle, stmt)?;
            if let Some(cfg) = stmt.find("config") {
                builder.set_config(handle, parse_bool(cfg.arg()));
            }
            if let Some(m) = stmt.find("mandatory") {
                builder.set_anyxml_mandatory(handle, parse_bool(m.arg()));
            }
        }
        "choice" => {
            let default = stmt.find("default").map(Stmt::arg);
            let handle = builder.add_choice(parent, stmt.arg(), default)?;
            apply_common_fields(builder, handle, stmt)?;
            if let Some(cfg) = stmt.find("config") {
                builder.set_config(handle, parse_bool(cfg.arg()));
            }
            if let Some(m) = stmt.find("mandatory") {
                builder.set_mandatory(handle, parse_bool(m.arg()));
            }
            for case in stmt.find_all("case") {
                lower_one_data_node(builder, Some(handle), case)?;
            }
            // A "short case" — a container/leaf/... directly under choice
            // without an explicit `case` wrapper — is itself a branch.
            for short in stmt.substatements.iter().filter(|s| {
                DATA_KEYWORDS.contains(&s.keyword.as_str()) && s.keyword != "case"
            }) {
                lower_one_data_node(builder, Some(handle), short)?;
            }
        }
        "case" => {
            let handle = builder.add_case(parent.ok_or_else(|| {
                Diagnostic::error(ErrorKind::MisplacedStatement, "'case' outside a 'choice'")
            })?, stmt.arg())?;
            apply_common_fields(builder, handle, stmt)?;
            lower_data_children(builder, Some(handle), &stmt.substatements)?;
        }
        "uses" => {
            let handle = builder.add_uses(parent, stmt.arg())?;
            apply_common_fields(builder, handle, stmt)?;
            for refine in stmt.find_all("refine") {
                builder.add_uses_refine(handle, lower_refine(builder, refine));
            }
        }
        "rpc" | "action" => {
            let handle = builder.add_rpc(parent, stmt.arg())?;
            apply_common_fields(builder, handle, stmt)?;
            if let Some(input) = stmt.find("input") {
                let in_handle = builder.add_input(handle)?;
                for td in input.find_all("typedef") {
                    lower_typedef(builder, td)?;
                }
                for grp in input.find_all("grouping") {
                    lower_grouping(builder, Some(in_handle), grp)?;
                }
                lower_data_children(builder, Some(in_handle), &input.substatements)?;
            }
            if let Some(output) = stmt.find("output") {
                let out_handle = builder.add_output(handle)?;
                for td in output.find_all("typedef") {
                    lower_typedef(builder, td)?;
                }
                for grp in output.find_all("grouping") {
                    lower_grouping(builder, Some(out_handle), grp)?;
                }
                lower_data_children(builder, Some(out_handle), &output.substatements)?;
            }
        }
        "notification" => {
            let handle = builder.add_notification(parent, stmt.arg())?;
            apply_common_fields(builder, handle, stmt)?;
            for td in stmt.find_all("typedef") {
                lower_typedef(builder, td)?;
            }
            for grp in stmt.find_all("grouping") {
                lower_grouping(builder, Some(handle), grp)?;
            }
            lower_data_children(builder, Some(handle), &stmt.substatements)?;
        }
        _ => {}
    }
    Ok(())
}

fn missing_type() -> Diagnostic {
    Diagnostic::error(ErrorKind::InvalidSubstatement, "missing required 'type' substatement")
}

fn parse_bool(s: &str) -> bool {
    s == "true"
}

fn apply_common_fields(builder: &mut Builder<'_>, handle: NodeHandle, stmt: &Stmt) -> BuildResult<()> {
    if let Some(d) = stmt.find("description") {
        builder.set_node_description(handle, d.arg())?;
    }
    if let Some(r) = stmt.find("reference") {
        builder.set_node_reference(handle, r.arg())?;
    }
    if let Some(s) = stmt.find("status") {
        let status = match s.arg() {
            "deprecated" => Status::Deprecated,
            "obsolete" => Status::Obsolete,
            _ => Status::Current,
        };
        builder.set_status(handle, status);
    }
    if let Some(w) = stmt.find("when") {
        builder.set_when(handle, lower_restriction(builder, w));
    }
    for m in stmt.find_all("must") {
        builder.add_must(handle, lower_restriction(builder, m));
    }
    for f in stmt.find_all("if-feature") {
        builder.add_feature_predicate_on_node(handle, f.arg());
    }
    Ok(())
}

fn lower_restriction(builder: &Builder<'_>, stmt: &Stmt) -> crate::model::Restriction {
    let mut r = crate::model::Restriction::new(builder.intern(stmt.arg()));
    r.description = stmt.find("description").map(|s| builder.intern(s.arg()));
    r.reference = stmt.find("reference").map(|s| builder.intern(s.arg()));
    r.error_app_tag = stmt.find("error-app-tag").map(|s| builder.intern(s.arg()));
    r.error_message = stmt.find("error-message").map(|s| builder.intern(s.arg()));
    r
}

fn lower_refine(builder: &Builder<'_>, stmt: &Stmt) -> Refine {
    Refine {
        target_path: builder.intern(stmt.arg()),
        description: stmt.find("description").map(|s| builder.intern(s.arg())),
        reference: stmt.find("reference").map(|s| builder.intern(s.arg())),
        config: stmt.find("config").map(|s| parse_bool(s.arg())),
        mandatory: stmt.find("mandatory").map(|s| parse_bool(s.arg())),
        presence: stmt.find("presence").map(|s| builder.intern(s.arg())),
        default: stmt.find("default").map(|s| builder.intern(s.arg())),
        min_elements: stmt.find("min-elements").and_then(|s| s.arg().parse().ok()),
        max_elements: stmt.find("max-elements").and_then(|s| s.arg().parse().ok()),
        added_must: stmt.find_all("must").map(|m| lower_restriction(builder, m)).collect(),
    }
}

// ---------------------------------------------------------------------
// Typedef / identity / feature / grouping
// ---------------------------------------------------------------------

fn lower_typedef(builder: &mut Builder<'_>, stmt: &Stmt) -> BuildResult<()> {
    let type_stmt = stmt.find("type").ok_or_else(missing_type)?;
    let ty = lower_type_stmt_freestanding(builder, type_stmt)?;
    let id = builder.add_typedef(stmt.arg(), ty)?;
    bind_typedef_type_unres(builder, id, type_stmt);
    // `default`/`units` on a typedef are its own attributes (§3 "Typedef"),
    // distinct from `Type.default` which the resolver uses for the separate
    // facet-inheritance mechanism in `inherit_facets` — a leaf using this
    // typedef without its own `default` inherits the typedef's value via
    // that mechanism, but the typedef's own textual default is recorded
    // here regardless of whether a derived type ever overrides it.
    if let Some(d) = stmt.find("default") {
        let interned = builder.intern(d.arg());
        builder.set_typedef_default(id, interned.clone());
        builder.typedef_type_mut(id).default = Some(interned);
    }
    if let Some(u) = stmt.find("units") {
        let interned = builder.intern(u.arg());
        builder.set_typedef_units(id, interned);
    }
    Ok(())
}

fn lower_identity(builder: &mut Builder<'_>, stmt: &Stmt) -> BuildResult<()> {
    let id = builder.add_identity(stmt.arg())?;
    for base in stmt.find_all("base") {
        builder.add_identity_base(id, base.arg());
    }
    Ok(())
}

fn lower_feature(builder: &mut Builder<'_>, stmt: &Stmt) -> BuildResult<()> {
    let id = builder.add_feature(stmt.arg())?;
    for iff in stmt.find_all("if-feature") {
        builder.add_feature_predicate_on_feature(id, iff.arg());
    }
    Ok(())
}

fn lower_grouping(builder: &mut Builder<'_>, parent: Option<NodeHandle>, stmt: &Stmt) -> BuildResult<()> {
    let handle = builder.add_grouping(parent, stmt.arg())?;
    apply_common_fields(builder, handle, stmt)?;
    for td in stmt.find_all("typedef") {
        lower_typedef(builder, td)?;
    }
    for grp in stmt.find_all("grouping") {
        lower_grouping(builder, Some(handle), grp)?;
    }
    lower_data_children(builder, Some(handle), &stmt.substatements)?;
    Ok(())
}

// ---------------------------------------------------------------------
// Augment / deviation
// ---------------------------------------------------------------------

fn lower_augment(builder: &mut Builder<'_>, stmt: &Stmt) -> BuildResult<()> {
    let handle = builder.add_augment(stmt.arg())?;
    apply_common_fields(builder, handle, stmt)?;
    lower_data_children(builder, Some(handle), &stmt.substatements)?;
    Ok(())
}

fn lower_deviation(builder: &mut Builder<'_>, stmt: &Stmt) -> BuildResult<()> {
    let idx = builder.add_deviation(stmt.arg())?;
    for dev in stmt.find_all("deviate") {
        let deviate = lower_deviate(builder, dev)?;
        builder.add_deviate(idx, deviate);
    }
    Ok(())
}

fn lower_deviate(builder: &mut Builder<'_>, stmt: &Stmt) -> BuildResult<Deviate> {
    use crate::flags::{DeviateFields, DeviateKind};
    let mut deviate = Deviate::default();
    deviate.kind = Some(match stmt.arg() {
        "not-supported" => DeviateKind::NotSupported,
        "add" => DeviateKind::Add,
        "replace" => DeviateKind::Replace,
        "delete" => DeviateKind::Delete,
        other => {
            return Err(Diagnostic::error(ErrorKind::InvalidArgument, format!("unknown deviate kind '{other}'")))
        }
    });
    if let Some(u) = stmt.find("units") {
        deviate.fields.insert(DeviateFields::UNITS);
        deviate.units = Some(builder.intern(u.arg()));
    }
    if let Some(d) = stmt.find("default") {
        deviate.fields.insert(DeviateFields::DEFAULT);
        deviate.default = Some(builder.intern(d.arg()));
    }
    if let Some(c) = stmt.find("config") {
        deviate.fields.insert(DeviateFields::CONFIG);
        deviate.config = Some(parse_bool(c.arg()));
    }
    if let Some(m) = stmt.find("mandatory") {
        deviate.fields.insert(DeviateFields::MANDATORY);
        deviate.mandatory = Some(parse_bool(m.arg()));
    }
    if let Some(m) = stmt.find("min-elements") {
        deviate.fields.insert(DeviateFields::MIN_ELEMENTS);
        deviate.min_elements = m.arg().parse().ok();
    }
    if let Some(m) = stmt.find("max-elements") {
        deviate.fields.insert(DeviateFields::MAX_ELEMENTS);
        deviate.max_elements = m.arg().parse().ok();
    }
    if let Some(t) = stmt.find("type") {
        deviate.fields.insert(DeviateFields::TYPE);
        deviate.ty = Some(lower_type_stmt_freestanding(builder, t)?);
    }
    for m in stmt.find_all("must") {
        deviate.added_must.push(lower_restriction(builder, m));
    }
    for u in stmt.find_all("unique") {
        deviate.added_unique.push(builder.intern(u.arg()));
    }
    Ok(deviate)
}

// ---------------------------------------------------------------------
// Type facets
// ---------------------------------------------------------------------

/// Built-in type keywords recognized without a typedef lookup (§4.3
/// "a bare built-in keyword resolves its base kind immediately").
fn known_base_type(name: &str) -> Option<BaseType> {
    Some(match name {
        "binary" => BaseType::Binary,
        "bits" => BaseType::Bits,
        "boolean" => BaseType::Boolean,
        "decimal64" => BaseType::Decimal64,
        "empty" => BaseType::Empty,
        "enumeration" => BaseType::Enumeration,
        "identityref" => BaseType::Identityref,
        "instance-identifier" => BaseType::InstanceIdentifier,
        "int8" => BaseType::Int8,
        "int16" => BaseType::Int16,
        "int32" => BaseType::Int32,
        "int64" => BaseType::Int64,
        "uint8" => BaseType::Uint8,
        "uint16" => BaseType::Uint16,
        "uint32" => BaseType::Uint32,
        "uint64" => BaseType::Uint64,
        "leafref" => BaseType::Leafref,
        "string" => BaseType::String,
        "union" => BaseType::Union,
        _ => return None,
    })
}

/// Builds a [`crate::model::Type`] value for a `type` statement that isn't
/// yet embedded in its owning leaf/leaf-list/typedef — the caller still
/// needs to call [`bind_type_unres`]/[`bind_typedef_type_unres`] afterward
/// so leafref/identityref/union-member facets queue their own unres entries
/// against the real, now-addressable location.
fn lower_type_stmt_freestanding(builder: &mut Builder<'_>, stmt: &Stmt) -> BuildResult<crate::model::Type> {
    let name = stmt.arg();
    let known = known_base_type(name);
    let mut ty = crate::model::Type::pending(builder.intern(name), known);
    apply_type_facets(builder, &mut ty, stmt)?;
    Ok(ty)
}

fn apply_type_facets(builder: &mut Builder<'_>, ty: &mut crate::model::Type, stmt: &Stmt) -> BuildResult<()> {
    if let Some(len) = stmt.find("length") {
        ty.length = Some(crate::model::LengthRestriction { ranges: parse_u64_ranges(len.arg()) });
    }
    if let Some(rng) = stmt.find("range") {
        ty.range = Some(crate::model::RangeRestriction { ranges: parse_i128_ranges(rng.arg()) });
    }
    for pat in stmt.find_all("pattern") {
        ty.patterns.push(crate::model::PatternRestriction {
            regex: builder.intern(pat.arg()),
            inverted: pat.find("modifier").map(Stmt::arg) == Some("invert-match"),
            restriction: lower_restriction(builder, pat),
        });
    }
    if let Some(fd) = stmt.find("fraction-digits") {
        if let Ok(digits) = fd.arg().parse::<u8>() {
            ty.fraction_digits = Some((digits, 10u64.pow(digits as u32)));
        }
    }
    for (i, e) in stmt.find_all("enum").enumerate() {
        let value = e.find("value").and_then(|v| v.arg().parse().ok()).unwrap_or(i as i32);
        ty.enums.push(crate::model::EnumValue {
            name: builder.intern(e.arg()),
            value,
            flags: Default::default(),
        });
    }
    for (i, b) in stmt.find_all("bit").enumerate() {
        let position = b.find("position").and_then(|v| v.arg().parse().ok()).unwrap_or(i as u32);
        ty.bits.push(crate::model::BitValue {
            name: builder.intern(b.arg()),
            position,
            flags: Default::default(),
        });
    }
    if let Some(path) = stmt.find("path") {
        ty.leafref.raw_path = Some(builder.intern(path.arg()));
        ty.leafref.require_instance =
            stmt.find("require-instance").map(|s| parse_bool(s.arg())).unwrap_or(true);
    }
    for base in stmt.find_all("base") {
        ty.identityref.raw_bases.push(builder.intern(base.arg()));
    }
    for member in stmt.find_all("type") {
        let member_ty = lower_type_stmt_freestanding(builder, member)?;
        ty.union_members.push(member_ty);
    }
    Ok(())
}

fn parse_u64_ranges(text: &str) -> smallvec::SmallVec<[(u64, u64); 2]> {
    text.split('|')
        .filter_map(|part| {
            let part = part.trim();
            match part.split_once("..") {
                Some((lo, hi)) => {
                    let lo = lo.trim().parse().unwrap_or(0);
                    let hi = if hi.trim() == "max" { u64::MAX } else { hi.trim().parse().unwrap_or(lo) };
                    Some((lo, hi))
                }
                None => part.parse().ok().map(|v| (v, v)),
            }
        })
        .collect()
}

fn parse_i128_ranges(text: &str) -> smallvec::SmallVec<[(i128, i128); 2]> {
    text.split('|')
        .filter_map(|part| {
            let part = part.trim();
            match part.split_once("..") {
                Some((lo, hi)) => {
                    let lo = if lo.trim() == "min" { i128::MIN } else { lo.trim().parse().unwrap_or(0) };
                    let hi = if hi.trim() == "max" { i128::MAX } else { hi.trim().parse().unwrap_or(lo) };
                    Some((lo, hi))
                }
                None => part.parse().ok().map(|v| (v, v)),
            }
        })
        .collect()
}

/// After a leaf/leaf-list's `Type` value (already built by
/// [`lower_type_stmt_freestanding`] and handed to `add_leaf`/`add_leaf_list`)
/// is addressable by [`NodeHandle`], queue the unres entries that need a
/// real location: leafref path resolution, identityref base resolution, and
/// one `type-der` per union member (§4.2, §8 "a union resolves by
/// recursively resolving each member").
fn bind_type_unres(builder: &mut Builder<'_>, handle: NodeHandle, stmt: &Stmt) {
    if stmt.find("path").is_some() {
        builder.push_leafref_unres(handle);
    }
    for base in stmt.find_all("base") {
        builder.push_identref_unres(handle, base.arg());
    }
    for (i, _) in stmt.find_all("type").enumerate() {
        builder.push_union_member_unres(handle, i);
    }
}

/// Typedef bodies never resolve their own leafref path / identityref bases
/// (§4.3 "if the leafref is not inside a typedef ... resolve the path") —
/// only the `type-der-tpdf` entry `add_typedef` already queued applies.
/// Union members nested in a typedef's own type do still need their own
/// `type-der`, queued directly against the typedef's [`TypeLocation`]
/// since `push_union_member_unres` only knows how to address a leaf.
fn bind_typedef_type_unres(builder: &mut Builder<'_>, id: crate::model::TypedefId, stmt: &Stmt) {
    for (i, _) in stmt.find_all("type").enumerate() {
        builder.push_typedef_union_member_unres(id, i);
    }
}
