//! Fallback chain resolution shared by every bundle source.
//!
//! Search order for a request of `pl-PL` with default `en-US`:
//!
//! ```text
//! pl_PL -> pl -> en_US -> en -> <base>
//! ```
//!
//! The first catalog found is the resolved locale. Its entries are layered
//! over its less-specific parents (`pl_PL` over `pl` over `<base>`), so a
//! child catalog only needs the keys it overrides.

use crate::{Entries, ResolvedBundle};
use hearth_core::error::{HearthError, HearthResult};
use hearth_core::{Locale, OwnerId};

/// Ordered, de-duplicated list of locales to try, ending with root.
pub fn search_order(requested: &Locale, default: &Locale) -> Vec<Locale> {
    let mut order: Vec<Locale> = Vec::new();
    for locale in requested
        .candidates()
        .into_iter()
        .chain(default.candidates())
        .chain(std::iter::once(Locale::ROOT))
    {
        if !order.contains(&locale) {
            order.push(locale);
        }
    }
    order
}

/// Resolves a bundle using `fetch` to read a single catalog.
///
/// `fetch` returns `Ok(None)` when no catalog exists for that exact locale.
pub fn resolve<F>(
    owner: &OwnerId,
    requested: &Locale,
    default: &Locale,
    mut fetch: F,
) -> HearthResult<ResolvedBundle>
where
    F: FnMut(&Locale) -> HearthResult<Option<Entries>>,
{
    for candidate in search_order(requested, default) {
        let Some(own) = fetch(&candidate)? else {
            continue;
        };

        // Layer parents least-specific first so children win.
        let mut parents: Vec<Locale> = candidate.candidates().into_iter().skip(1).collect();
        if !candidate.is_root() {
            parents.push(Locale::ROOT);
        }

        let mut entries = Entries::new();
        for parent in parents.iter().rev() {
            if let Some(layer) = fetch(parent)? {
                entries.extend(layer);
            }
        }
        entries.extend(own);

        tracing::debug!(
            owner = %owner,
            requested = %requested,
            resolved = %candidate,
            keys = entries.len(),
            "bundle resolved"
        );
        return Ok(ResolvedBundle {
            locale: candidate,
            entries,
        });
    }

    Err(HearthError::ResourceNotFound {
        owner: owner.to_string(),
        locale: requested.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn loc(s: &str) -> Locale {
        s.parse().unwrap()
    }

    #[test]
    fn order_dedups_shared_language() {
        let order: Vec<String> = search_order(&loc("en-GB"), &loc("en-US"))
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(order, ["en-GB", "en", "en-US", ""]);
    }

    #[test]
    fn children_override_parents() {
        let mut catalogs: HashMap<Locale, Entries> = HashMap::new();
        catalogs.insert(
            Locale::ROOT,
            Entries::from([("a".into(), "base".into()), ("b".into(), "base".into())]),
        );
        catalogs.insert(loc("pl"), Entries::from([("a".into(), "pl".into())]));

        let owner = OwnerId::from("x");
        let got = resolve(&owner, &loc("pl-PL"), &loc("en"), |l| {
            Ok(catalogs.get(l).cloned())
        })
        .unwrap();

        assert_eq!(got.locale, loc("pl"));
        assert_eq!(got.entries["a"], "pl");
        assert_eq!(got.entries["b"], "base");
    }

    #[test]
    fn nothing_found_is_not_found() {
        let owner = OwnerId::from("x");
        let err = resolve(&owner, &loc("fr"), &loc("en"), |_| Ok(None)).unwrap_err();
        assert!(matches!(err, HearthError::ResourceNotFound { .. }));
    }

    #[test]
    fn fetch_errors_abort_resolution() {
        let owner = OwnerId::from("x");
        let err = resolve(&owner, &loc("fr"), &loc("en"), |_| {
            Err(HearthError::ResourceLoad {
                owner: "x".into(),
                reason: "broken".into(),
            })
        })
        .unwrap_err();
        assert!(matches!(err, HearthError::ResourceLoad { .. }));
    }
}
