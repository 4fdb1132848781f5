//! Path walker (spec §4.4): root dispatch, then the segment loop.
//!
//! The walker is written as one pure-ish function per root form plus a
//! shared segment loop, with the multi-match mirror (`MultiMatchState`)
//! threaded alongside the main walk and projected through the same
//! alias-construction rules -- one mapper, applied twice, per the design
//! recorded in DESIGN.md.

use super::join::{json_each_case, Join};
use super::multimatch::MultiMatchState;
use super::path::{PathRoot, TokenizedPath};
use super::result::{email_visibility_guard, ResolverResult};
use super::RecordFieldResolver;
use crate::error::{Error, Result};
use crate::request::RequestData;
use crate::schema::{Field, FieldType, REQUEST_AUTH_SIMPLE_FIELDS};
use indexmap::IndexMap;
use recordpath_sql::{bracket_ident, columnify, SqlParam};
use serde_json::Value;

/// State threaded through one segment loop: the collection/alias pair the
/// walk is currently indexing into, the visibility/nullify flags that
/// apply for the remainder of this path, and the multi-match mirror.
struct WalkCtx {
    collection: crate::schema::Collection,
    alias: String,
    allow_hidden_fields: bool,
    nullify_missing: bool,
    mm: MultiMatchState,
}

pub(crate) fn resolve_tokenized(
    resolver: &mut RecordFieldResolver,
    tokenized: TokenizedPath,
) -> Result<ResolverResult> {
    match tokenized.root {
        PathRoot::Plain => {
            let base = resolver.base_collection.clone();
            let ctx = WalkCtx {
                mm: MultiMatchState::new(&base.name),
                collection: base.clone(),
                alias: base.name.clone(),
                allow_hidden_fields: resolver.allow_hidden_fields,
                nullify_missing: false,
            };
            walk_segments(resolver, ctx, &tokenized.segments)
        }
        PathRoot::RequestMethod => {
            if resolver.request.is_none() {
                return Ok(ResolverResult::null());
            }
            resolver.resolve_request_method()
        }
        PathRoot::RequestQuery => {
            if resolver.request.is_none() {
                return Ok(ResolverResult::null());
            }
            let map = resolver.request.as_ref().unwrap().query.clone();
            resolver.resolve_request_map_path(&map, &tokenized.segments)
        }
        PathRoot::RequestData => resolve_request_data(resolver, tokenized.segments),
        PathRoot::RequestAuth => resolve_request_auth(resolver, tokenized.segments),
        PathRoot::Collection { name } => resolve_collection_root(resolver, name, tokenized.segments),
    }
}

/// `@collection.<name>.<rest...>`: fan out over every row of `name`,
/// unconditionally enabling the multi-match mirror (spec §4.4).
fn resolve_collection_root(
    resolver: &mut RecordFieldResolver,
    name: String,
    segments: Vec<String>,
) -> Result<ResolverResult> {
    let collection = resolver.load_collection(&name)?;
    let alias = format!("__collection_{}", name);
    resolver
        .joins
        .register(Join::new(collection.name.clone(), alias.clone(), None));

    let mut mm = MultiMatchState::new(&resolver.base_collection.name.clone());
    mm.activate();
    mm.push_join(Join::new(
        collection.name.clone(),
        format!("__mm__collection_{}", name),
        None,
    ));

    let ctx = WalkCtx {
        collection,
        alias,
        allow_hidden_fields: true,
        nullify_missing: false,
        mm,
    };
    walk_segments(resolver, ctx, &segments)
}

/// `@request.data.<...>`: special-cases a relation field or a
/// `<selectField>.each` suffix before falling back to the static
/// evaluator for everything else.
fn resolve_request_data(resolver: &mut RecordFieldResolver, segments: Vec<String>) -> Result<ResolverResult> {
    let request = match resolver.request.clone() {
        Some(r) => r,
        None => return Ok(ResolverResult::null()),
    };

    if let Some(first) = segments.first().cloned() {
        if let Some(field) = resolver.base_collection.get_field(&first).cloned() {
            match &field.field_type {
                FieldType::Relation {
                    collection_id,
                    max_select,
                } => {
                    return resolve_request_data_relation(
                        resolver,
                        &request,
                        collection_id.clone(),
                        *max_select,
                        &segments,
                    );
                }
                FieldType::Select { max_select } if segments.len() == 2 && segments[1] == "each" => {
                    return resolve_request_data_select_each(resolver, &request, &first, *max_select);
                }
                _ => {}
            }
        }
    }

    resolver.resolve_request_map_path(&request.data.clone(), &segments)
}

fn collect_ids(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect(),
        _ => vec![],
    }
}

fn resolve_request_data_relation(
    resolver: &mut RecordFieldResolver,
    request: &RequestData,
    collection_id: String,
    max_select: Option<i32>,
    segments: &[String],
) -> Result<ResolverResult> {
    let field_name = &segments[0];
    let rest = &segments[1..];
    let ids = collect_ids(request.data.get(field_name));
    if ids.is_empty() {
        return Ok(ResolverResult::null());
    }

    let referenced = resolver.load_collection(&collection_id)?;
    let alias = format!("__data_{}", referenced.name);
    let placeholder = resolver.next_placeholder_name();
    let ids_param = SqlParam::Array(ids.into_iter().map(SqlParam::Text).collect());
    let mut params = IndexMap::new();
    params.insert(placeholder.clone(), ids_param.clone());
    let on = format!("{} IN ({{:{}}})", bracket_ident(&alias, "id"), placeholder);
    resolver.joins.register(Join::new(referenced.name.clone(), alias.clone(), Some(on)));

    let mut mm = MultiMatchState::new(&resolver.base_collection.name.clone());
    let mm_alias = format!("__data_mm_{}", referenced.name);
    let mm_on = format!("{} IN ({{:{}}})", bracket_ident(&mm_alias, "id"), placeholder);
    mm.push_join(Join::new(referenced.name.clone(), mm_alias, Some(mm_on)));
    mm.bind_param(placeholder, ids_param);
    if !matches!(max_select, Some(1)) {
        mm.activate();
    }
    let ctx = WalkCtx {
        collection: referenced,
        alias,
        allow_hidden_fields: true,
        nullify_missing: true,
        mm,
    };
    let mut result = walk_segments(resolver, ctx, rest)?;
    for (k, v) in params {
        result.params.insert(k, v);
    }
    Ok(result)
}

fn resolve_request_data_select_each(
    resolver: &mut RecordFieldResolver,
    request: &RequestData,
    field_name: &str,
    max_select: Option<i32>,
) -> Result<ResolverResult> {
    let raw = request.data.get(field_name).cloned().unwrap_or(Value::Null);
    let array = match raw {
        Value::Array(items) => Value::Array(items),
        Value::Null => Value::Array(vec![]),
        other => Value::Array(vec![other]),
    };
    let json_str = serde_json::to_string(&array).unwrap_or_default();
    let placeholder = resolver.next_placeholder_name();
    let mut params = IndexMap::new();
    params.insert(placeholder.clone(), SqlParam::Text(json_str));

    let alias = format!("__dataSelect_{}_je", field_name);
    resolver.joins.register(Join::raw_expr(
        format!("json_each({{:{}}})", placeholder),
        alias.clone(),
        None,
    ));

    let mut result = ResolverResult::identifier(bracket_ident(&alias, "value")).with_params(params);

    if !matches!(max_select, Some(1)) {
        let mut mm = MultiMatchState::new(&resolver.base_collection.name.clone());
        mm.activate();
        let mm_alias = format!("__mm_{}", alias);
        mm.push_join(Join::raw_expr(
            format!("json_each({{:{}}})", result.params.keys().next().cloned().unwrap_or_default()),
            mm_alias.clone(),
            None,
        ));
        let subquery = mm.into_subquery(bracket_ident(&mm_alias, "value"));
        result = result.with_multi_match(subquery);
    }

    Ok(result)
}

/// `@request.auth.<...>`: the fixed simple-field list delegates to the
/// static evaluator; anything else joins the auth collection on its id.
fn resolve_request_auth(resolver: &mut RecordFieldResolver, segments: Vec<String>) -> Result<ResolverResult> {
    if segments.len() == 1 && REQUEST_AUTH_SIMPLE_FIELDS.contains(&segments[0].as_str()) {
        if resolver.request.is_none() {
            return Ok(ResolverResult::null());
        }
        return resolver.resolve_request_auth_simple(&segments[0]);
    }

    let auth = match resolver.request.as_ref().and_then(|r| r.auth_record.clone()) {
        Some(a) => a,
        None => return Ok(ResolverResult::null()),
    };

    let alias = format!("__auth_{}", auth.collection.name);
    let placeholder = resolver.next_placeholder_name();
    let mut params = IndexMap::new();
    params.insert(placeholder.clone(), SqlParam::Text(auth.id.clone()));
    let on = format!("{} = {{:{}}}", bracket_ident(&alias, "id"), placeholder);
    resolver
        .joins
        .register(Join::new(auth.collection.name.clone(), alias.clone(), Some(on)));

    let mm = MultiMatchState::new(&resolver.base_collection.name.clone());
    let ctx = WalkCtx {
        collection: auth.collection,
        alias,
        allow_hidden_fields: true,
        nullify_missing: true,
        mm,
    };
    let mut result = walk_segments(resolver, ctx, &segments)?;
    for (k, v) in params {
        result.params.insert(k, v);
    }
    Ok(result)
}

/// The segment loop shared by every root form (spec §4.4, rules 1-7).
fn walk_segments(resolver: &mut RecordFieldResolver, mut ctx: WalkCtx, segments: &[String]) -> Result<ResolverResult> {
    if segments.is_empty() {
        return Err(Error::InvalidPath("field path has no remaining segments".into()));
    }

    let mut i = 0;
    loop {
        let segment = &segments[i];
        let is_last = i == segments.len() - 1;

        // Rule 1: last segment names a system field.
        if is_last && ctx.collection.is_system_field(segment) {
            let identifier = bracket_ident(&ctx.alias, segment);
            let mm_value = bracket_ident(ctx.mm.current_alias(), segment);
            let mut result = ResolverResult::identifier(identifier);
            if segment == "email" && !ctx.allow_hidden_fields {
                result = result.with_after_build(email_visibility_guard(&ctx.alias));
            }
            return Ok(finish(ctx, result, mm_value));
        }

        // Rule 2: look up the schema field.
        let field: Field = match ctx.collection.get_field(segment) {
            Some(f) => f.clone(),
            None => {
                if ctx.nullify_missing {
                    return Ok(ResolverResult::null());
                }
                return Err(Error::UnknownField {
                    collection: ctx.collection.name.clone(),
                    field: segment.clone(),
                });
            }
        };

        // Rule 3: found and last segment.
        if is_last {
            let identifier = bracket_ident(&ctx.alias, &field.name);
            let mm_value = bracket_ident(ctx.mm.current_alias(), &field.name);
            let result = ResolverResult::identifier(identifier);
            return Ok(finish(ctx, result, mm_value));
        }

        let next_is_last = i + 1 == segments.len() - 1;

        // Rule 4: `<selectField>.each` as the final two segments.
        if next_is_last && segments[i + 1] == "each" {
            if let FieldType::Select { max_select } = &field.field_type {
                let max_select = *max_select;
                let col_ref = bracket_ident(&ctx.alias, &field.name);
                let je_alias = format!("{}_{}_je", ctx.alias, field.name);
                resolver
                    .joins
                    .register(Join::raw_expr(json_each_case(&col_ref), je_alias.clone(), None));

                let mm_col_ref = bracket_ident(ctx.mm.current_alias(), &field.name);
                let mm_je_alias = format!("{}_{}_je", ctx.mm.current_alias(), field.name);
                ctx.mm
                    .push_join(Join::raw_expr(json_each_case(&mm_col_ref), mm_je_alias.clone(), None));
                if !matches!(max_select, Some(1)) {
                    ctx.mm.activate();
                }
                let mm_value = bracket_ident(&mm_je_alias, "value");

                let result = ResolverResult::identifier(bracket_ident(&je_alias, "value"));
                return Ok(finish(ctx, result, mm_value));
            }
        }

        match &field.field_type {
            // Rule 5: json field, consume every remaining segment.
            FieldType::Json => {
                let rest = &segments[i + 1..];
                let path = build_json_path(rest);
                let identifier = format!("JSON_EXTRACT({}, '${}')", bracket_ident(&ctx.alias, &field.name), path);
                let mm_identifier = format!(
                    "JSON_EXTRACT({}, '${}')",
                    bracket_ident(ctx.mm.current_alias(), &field.name),
                    path
                );
                let result = ResolverResult::identifier(identifier);
                return Ok(finish(ctx, result, mm_identifier));
            }
            // Rule 6: relation field, hop and continue.
            FieldType::Relation {
                collection_id,
                max_select,
            } => {
                let collection_id = collection_id.clone();
                let max_select = *max_select;
                hop_relation(resolver, &mut ctx, &field, &collection_id, max_select)?;
                i += 1;
                continue;
            }
            // Rule 7: anything else before the last segment.
            _ => {
                return Err(Error::NotARelation {
                    collection: ctx.collection.name.clone(),
                    field: segment.clone(),
                });
            }
        }
    }
}

fn finish(ctx: WalkCtx, mut result: ResolverResult, mm_value_identifier: String) -> ResolverResult {
    if ctx.mm.is_active() {
        result = result.with_multi_match(ctx.mm.into_subquery(mm_value_identifier));
    }
    result
}

/// Advance `ctx` across a relation hop, registering both the main join
/// pair and its multi-match mirror unconditionally -- a single-valued
/// hop still needs to be mirrored so that a later multi-valued hop's
/// mirrored joins point at the right alias. Only whether the finished
/// subquery gets attached depends on `is_active()` (see `finish`).
fn hop_relation(
    resolver: &mut RecordFieldResolver,
    ctx: &mut WalkCtx,
    field: &Field,
    collection_id: &str,
    max_select: Option<i32>,
) -> Result<()> {
    let referenced = resolver.load_collection(collection_id)?;

    let col_ref = bracket_ident(&ctx.alias, &field.name);
    let je_alias = format!("{}_{}_je", ctx.alias, field.name);
    resolver
        .joins
        .register(Join::raw_expr(json_each_case(&col_ref), je_alias.clone(), None));

    let new_alias = format!("{}_{}", ctx.alias, field.name);
    let on = format!(
        "{} = {}",
        bracket_ident(&new_alias, "id"),
        bracket_ident(&je_alias, "value")
    );
    resolver
        .joins
        .register(Join::new(referenced.name.clone(), new_alias.clone(), Some(on)));

    let mm_col_ref = bracket_ident(ctx.mm.current_alias(), &field.name);
    let mm_je_alias = format!("{}_{}_je", ctx.mm.current_alias(), field.name);
    let mm_new_alias = format!("{}_{}", ctx.mm.current_alias(), field.name);
    let mm_on = format!(
        "{} = {}",
        bracket_ident(&mm_new_alias, "id"),
        bracket_ident(&mm_je_alias, "value")
    );
    ctx.mm
        .push_join(Join::raw_expr(json_each_case(&mm_col_ref), mm_je_alias, None));
    ctx.mm
        .push_join(Join::new(referenced.name.clone(), mm_new_alias, Some(mm_on)));
    if !matches!(max_select, Some(1)) {
        ctx.mm.activate();
    }

    ctx.collection = referenced;
    ctx.alias = new_alias;
    Ok(())
}

/// Build a `JSON_EXTRACT` path suffix from the trailing segments of a
/// json-field path: purely numeric segments become `[n]`, everything
/// else becomes `.name` (columnified).
fn build_json_path(segments: &[String]) -> String {
    let mut path = String::new();
    for seg in segments {
        if !seg.is_empty() && seg.chars().all(|c| c.is_ascii_digit()) {
            path.push('[');
            path.push_str(seg);
            path.push(']');
        } else {
            path.push('.');
            path.push_str(&columnify(seg));
        }
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::InMemoryDao;
    use crate::schema::{Collection, Field};

    fn demo4() -> Collection {
        Collection::new("demo4_id", "demo4", false)
            .with_field(Field::scalar("title"))
            .with_field(Field::relation("self_rel_one", "demo4_id", Some(1)))
            .with_field(Field::relation("self_rel_many", "demo4_id", None))
            .with_field(Field::select("tags", None))
            .with_field(Field::json("meta"))
    }

    #[test]
    fn test_single_relation_hop_sets_distinct_join() {
        let dao = InMemoryDao::new().with_collection(demo4());
        let mut resolver = RecordFieldResolver::new(&dao, demo4(), None, false);
        let result = resolver.resolve("self_rel_one.title").unwrap();
        assert_eq!(result.identifier, "[[demo4_self_rel_one.title]]");
        assert_eq!(resolver.joins().len(), 2);
        assert!(result.multi_match_subquery.is_none());
    }

    #[test]
    fn test_multi_valued_hop_attaches_multi_match() {
        let dao = InMemoryDao::new().with_collection(demo4());
        let mut resolver = RecordFieldResolver::new(&dao, demo4(), None, false);
        let result = resolver.resolve("self_rel_many.title").unwrap();
        let mm = result.multi_match_subquery.expect("expected multi-match subquery");
        assert_eq!(mm.from_alias, "__mm_demo4");
        assert_eq!(mm.value_identifier, "[[__mm_demo4_self_rel_many.title]]");
    }

    #[test]
    fn test_single_valued_hop_before_multi_valued_is_still_mirrored() {
        let dao = InMemoryDao::new().with_collection(demo4());
        let mut resolver = RecordFieldResolver::new(&dao, demo4(), None, false);
        let result = resolver.resolve("self_rel_one.self_rel_many.title").unwrap();
        assert_eq!(
            result.identifier,
            "[[demo4_self_rel_one_self_rel_many.title]]"
        );
        let mm = result.multi_match_subquery.expect("expected multi-match subquery");
        // The single-valued `self_rel_one` hop must still appear in the mirror
        // chain so the `self_rel_many` hop that follows it joins off the
        // correct (mirrored) alias rather than the base row's column.
        assert_eq!(mm.joins.len(), 4);
        assert_eq!(
            mm.value_identifier,
            "[[__mm_demo4_self_rel_one_self_rel_many.title]]"
        );
    }

    #[test]
    fn test_nested_relation_chain() {
        let dao = InMemoryDao::new().with_collection(demo4());
        let mut resolver = RecordFieldResolver::new(&dao, demo4(), None, false);
        let result = resolver
            .resolve("self_rel_many.self_rel_one.self_rel_many.self_rel_one.title")
            .unwrap();
        assert_eq!(
            result.identifier,
            "[[demo4_self_rel_many_self_rel_one_self_rel_many_self_rel_one.title]]"
        );
        assert_eq!(resolver.joins().len(), 8);
    }

    #[test]
    fn test_select_each() {
        let dao = InMemoryDao::new().with_collection(demo4());
        let mut resolver = RecordFieldResolver::new(&dao, demo4(), None, false);
        let result = resolver.resolve("tags.each").unwrap();
        assert_eq!(result.identifier, "[[demo4_tags_je.value]]");
        assert!(result.multi_match_subquery.is_some());
    }

    #[test]
    fn test_json_field_path() {
        let dao = InMemoryDao::new().with_collection(demo4());
        let mut resolver = RecordFieldResolver::new(&dao, demo4(), None, false);
        let result = resolver.resolve("meta.address.0.city").unwrap();
        assert_eq!(result.identifier, "JSON_EXTRACT([[demo4.meta]], '$.address[0].city')");
    }

    #[test]
    fn test_scalar_field_before_last_segment_errors() {
        let dao = InMemoryDao::new().with_collection(demo4());
        let mut resolver = RecordFieldResolver::new(&dao, demo4(), None, false);
        assert!(resolver.resolve("title.nope").is_err());
    }

    #[test]
    fn test_collection_root_joins_without_on() {
        let demo1 = Collection::new("demo1_id", "demo1", false).with_field(Field::scalar("text"));
        let dao = InMemoryDao::new().with_collection(demo4()).with_collection(demo1);
        let mut resolver = RecordFieldResolver::new(&dao, demo4(), None, false);
        let result = resolver.resolve("@collection.demo1.text").unwrap();
        assert_eq!(result.identifier, "[[__collection_demo1.text]]");
        let j = resolver.joins().iter().next().unwrap();
        assert_eq!(j.table_alias, "__collection_demo1");
        assert!(j.on.is_none());
        assert!(result.multi_match_subquery.is_some());
    }

    #[test]
    fn test_request_data_relation_hop_mirrors_seed_join() {
        use crate::request::RequestData;

        let leaf = Collection::new("leaf_id", "leaf", false).with_field(Field::scalar("title"));
        let related = Collection::new("related_id", "related", false)
            .with_field(Field::relation("sub_many", "leaf_id", None));
        let demo4b = Collection::new("demo4b_id", "demo4b", false).with_field(Field::relation(
            "data_rel",
            "related_id",
            Some(1),
        ));

        let dao = InMemoryDao::new()
            .with_collection(demo4b.clone())
            .with_collection(related)
            .with_collection(leaf);
        let data = serde_json::json!({"data_rel": "rec1"}).as_object().unwrap().clone();
        let request = RequestData::new("GET").with_data(data);
        let mut resolver = RecordFieldResolver::new(&dao, demo4b, Some(request), false);

        let result = resolver.resolve("@request.data.data_rel.sub_many.title").unwrap();
        assert_eq!(result.identifier, "[[__data_related_sub_many.title]]");

        let mm = result.multi_match_subquery.expect("expected multi-match subquery");
        // The `__data_related` seed join must be in the mirror chain too, so
        // the `sub_many` hop that follows mirrors off the joined row, not the
        // base request row.
        assert_eq!(mm.joins.len(), 3);
        assert_eq!(mm.value_identifier, "[[__data_mm_related_sub_many.title]]");
        assert!(mm.params.contains_key("f0"));
    }

    #[test]
    fn test_email_visibility_guard_via_walker() {
        let users = Collection::new("_pb_users", "users", true);
        let dao = InMemoryDao::new().with_collection(users.clone());
        let mut resolver = RecordFieldResolver::new(&dao, users.clone(), None, false);
        let result = resolver.resolve("email").unwrap();
        assert_eq!(
            result.build_expr("[[users.email]] > 1"),
            "([[users.email]] > 1) AND ([[users.emailVisibility]] = TRUE)"
        );

        let mut resolver = RecordFieldResolver::new(&dao, users, None, true);
        let result = resolver.resolve("email").unwrap();
        assert_eq!(result.build_expr("[[users.email]] > 1"), "[[users.email]] > 1");
    }
}
