//! Identifier reconciliation for lookups.
//!
//! Caller-supplied ids arrive in drifting textual encodings: surrounding
//! whitespace, mixed case, hyphenated vs. simple hex form. Rather than trust
//! one representation, resolution degrades gracefully through an ordered
//! strategy cascade, shared by every record kind instead of re-implemented
//! per service.

use sea_orm::sea_query::{Alias, Expr};
use sea_orm::{ConnectionTrait, EntityTrait, PrimaryKeyTrait, QueryFilter};
use uuid::Uuid;

use crate::entity::{categories, orders, products};
use crate::error::{AppError, AppResult};

/// A collection whose records can be resolved from a raw identifier string.
pub trait Resolvable: EntityTrait {
    /// Record kind used in not-found messages ("Product", "Order", ...).
    const KIND: &'static str;

    fn record_id(model: &Self::Model) -> Uuid;
    fn id_column() -> Self::Column;
}

impl Resolvable for products::Entity {
    const KIND: &'static str = "Product";

    fn record_id(model: &Self::Model) -> Uuid {
        model.id
    }

    fn id_column() -> Self::Column {
        products::Column::Id
    }
}

impl Resolvable for categories::Entity {
    const KIND: &'static str = "Category";

    fn record_id(model: &Self::Model) -> Uuid {
        model.id
    }

    fn id_column() -> Self::Column {
        categories::Column::Id
    }
}

impl Resolvable for orders::Entity {
    const KIND: &'static str = "Order";

    fn record_id(model: &Self::Model) -> Uuid {
        model.id
    }

    fn id_column() -> Self::Column {
        orders::Column::Id
    }
}

fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Parse the canonical binary identifier from any hex encoding uuid accepts
/// (hyphenated, simple, braced, urn).
pub fn parse_canonical(raw: &str) -> Option<Uuid> {
    Uuid::try_parse(raw.trim()).ok()
}

/// First candidate whose identifier matches the input by exact string,
/// trimmed+lowercased string, or canonical binary equality.
pub fn first_match<M>(raw: &str, candidates: Vec<M>, id_of: impl Fn(&M) -> Uuid) -> Option<M> {
    let wanted_norm = normalize(raw);
    let wanted_canonical = parse_canonical(raw);
    candidates.into_iter().find(|candidate| {
        let id = id_of(candidate);
        let stored = id.to_string();
        stored == raw
            || normalize(&stored) == wanted_norm
            || wanted_canonical.is_some_and(|wanted| wanted == id)
    })
}

/// Resolve a raw identifier against a collection, trying each strategy in
/// order until one produces a record.
///
/// The leading full scan is O(n) per lookup; acceptable only because catalog
/// and order volumes are small here.
pub async fn resolve<E, C>(db: &C, raw: &str) -> Result<Option<E::Model>, sea_orm::DbErr>
where
    E: Resolvable,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<Uuid>,
    C: ConnectionTrait,
{
    // Strategy 1: scan the collection and compare representations.
    let candidates = E::find().all(db).await?;
    if let Some(found) = first_match(raw, candidates, |m| E::record_id(m)) {
        return Ok(Some(found));
    }

    // Strategy 2: indexed point lookup by the canonical identifier.
    if let Some(id) = parse_canonical(raw) {
        if let Some(found) = E::find_by_id(id).one(db).await? {
            return Ok(Some(found));
        }
    }

    // Strategy 3: last resort, treat the input as the stored textual key.
    E::find()
        .filter(
            Expr::col(E::id_column())
                .cast_as(Alias::new("text"))
                .eq(raw.trim()),
        )
        .one(db)
        .await
}

/// Resolve or fail with a not-found error echoing the offending identifier.
pub async fn resolve_required<E, C>(db: &C, raw: &str) -> AppResult<E::Model>
where
    E: Resolvable,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<Uuid>,
    C: ConnectionTrait,
{
    resolve::<E, C>(db, raw)
        .await?
        .ok_or_else(|| AppError::not_found(E::KIND, raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> Vec<Uuid> {
        vec![
            Uuid::parse_str("0d64b1c1-53f5-4f0a-9a04-57e64f5d4f9f").unwrap(),
            Uuid::parse_str("7c9e6679-7425-40de-944b-e07fc1f90ae7").unwrap(),
        ]
    }

    #[test]
    fn matches_exact_stored_form() {
        let candidates = ids();
        let found = first_match("7c9e6679-7425-40de-944b-e07fc1f90ae7", candidates, |id| *id);
        assert_eq!(
            found,
            Some(Uuid::parse_str("7c9e6679-7425-40de-944b-e07fc1f90ae7").unwrap())
        );
    }

    #[test]
    fn matches_whitespace_and_case_variants() {
        let candidates = ids();
        let found = first_match(
            "  7C9E6679-7425-40DE-944B-E07FC1F90AE7  ",
            candidates,
            |id| *id,
        );
        assert!(found.is_some());
    }

    #[test]
    fn matches_canonical_simple_hex_form() {
        let candidates = ids();
        let found = first_match("7c9e6679742540de944be07fc1f90ae7", candidates, |id| *id);
        assert!(found.is_some());
    }

    #[test]
    fn no_match_yields_none() {
        let candidates = ids();
        assert!(first_match("ffffffff-ffff-ffff-ffff-ffffffffffff", candidates, |id| *id).is_none());
        assert!(first_match("not-an-id", ids(), |id| *id).is_none());
    }

    #[test]
    fn parse_canonical_accepts_hex_forms_only() {
        assert!(parse_canonical(" 7c9e6679742540de944be07fc1f90ae7 ").is_some());
        assert!(parse_canonical("7c9e6679-7425-40de-944b-e07fc1f90ae7").is_some());
        assert!(parse_canonical("#1001").is_none());
    }
}
