//! Category filtering and priority ordering of a game's resources.
//!
//! Categories are inferred from the resource name, using the markers the
//! catalogue itself writes into names. Ordering is a stable sort on a small
//! integer score so sources keep their own order among equally good entries.

use crate::models::Resource;
use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Substring marking a patch resource
pub const PATCH_MARKER: &str = "补丁";

/// Substring marking a save-data resource
pub const SAVE_MARKER: &str = "存档";

/// Host of the official distribution channel
pub const OFFICIAL_HOST: &str = "pan.touchgal.net";

/// Score of a resource served from [`OFFICIAL_HOST`]
pub const SCORE_OFFICIAL: u8 = 10;
/// Score of a link that comes with a password
pub const SCORE_WITH_PASSWORD: u8 = 2;
/// Score of a plain link
pub const SCORE_LINK: u8 = 1;
/// Score of a resource missing its name or link
pub const SCORE_MALFORMED: u8 = 0;

/// Which kind of resource a detail view is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Category {
    /// The game itself
    #[default]
    Base,
    Patch,
    Save,
}

impl Category {
    pub const ALL: [Self; 3] = [Self::Base, Self::Patch, Self::Save];

    /// Category a resource belongs to; every resource has exactly one
    #[must_use]
    pub fn of(resource: &Resource) -> Self {
        let name = resource.name();
        if name.contains(PATCH_MARKER) {
            Self::Patch
        } else if name.contains(SAVE_MARKER) {
            Self::Save
        } else {
            Self::Base
        }
    }

    /// Whether `resource` is shown under this category.
    ///
    /// A name carrying both markers is a patch, never a save.
    #[must_use]
    pub fn matches(self, resource: &Resource) -> bool {
        Self::of(resource) == self
    }

    /// Label used by the catalogue's own UI
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Base => "游戏本体",
            Self::Patch => "补丁资源",
            Self::Save => "存档资源",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Base => "base",
            Self::Patch => "patch",
            Self::Save => "save",
        };
        f.write_str(name)
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let value = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.to_string().eq_ignore_ascii_case(value) || c.label() == value)
            .ok_or_else(|| Error::InvalidInput {
                field: "category".to_string(),
                reason: format!("unknown category '{value}', expected base, patch or save"),
            })
    }
}

/// Priority of a resource; higher sorts first
#[must_use]
pub fn score(resource: &Resource) -> u8 {
    let content = resource.primary_content();
    if resource.name().is_empty() || content.is_empty() {
        SCORE_MALFORMED
    } else if content.contains(OFFICIAL_HOST) {
        SCORE_OFFICIAL
    } else if resource.password().is_some() {
        SCORE_WITH_PASSWORD
    } else {
        SCORE_LINK
    }
}

/// Keep the resources of `category` and order them by descending score.
///
/// Equal scores keep their input order.
#[must_use]
pub fn rank_resources(resources: Vec<Resource>, category: Category) -> Vec<Resource> {
    let mut filtered: Vec<Resource> = resources
        .into_iter()
        .filter(|r| category.matches(r))
        .collect();
    // sort_by_key is stable
    filtered.sort_by_key(|r| std::cmp::Reverse(score(r)));
    filtered
}

/// Ranked resources, distinguishing why a list is empty
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RankedResources {
    /// The game has no resources at all
    NoResources,
    /// The game has resources, none of them in the requested category
    NoneInCategory,
    Ranked(Vec<Resource>),
}

impl RankedResources {
    /// The ranked list, empty for either empty outcome
    #[must_use]
    pub fn into_vec(self) -> Vec<Resource> {
        match self {
            Self::Ranked(resources) => resources,
            Self::NoResources | Self::NoneInCategory => Vec::new(),
        }
    }
}

/// Filter and order `resources`, reporting which kind of empty result occurred
#[must_use]
pub fn rank(resources: Vec<Resource>, category: Category) -> RankedResources {
    if resources.is_empty() {
        return RankedResources::NoResources;
    }

    let ranked = rank_resources(resources, category);
    if ranked.is_empty() {
        RankedResources::NoneInCategory
    } else {
        RankedResources::Ranked(ranked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(name: &str, content: &str, password: Option<&str>) -> Resource {
        Resource {
            name: Some(name.to_string()),
            content: Some(content.into()),
            password: password.map(str::to_string),
            kind: None,
        }
    }

    #[test]
    fn test_scores() {
        assert_eq!(score(&resource("", "x", None)), 0);
        assert_eq!(score(&resource("x", "", None)), 0);
        assert_eq!(score(&resource("x", "https://pan.touchgal.net/abc", None)), 10);
        assert_eq!(score(&resource("x", "https://pan.touchgal.net/abc", Some("p"))), 10);
        assert_eq!(score(&resource("x", "https://example.com/f", Some("p"))), 2);
        assert_eq!(score(&resource("x", "https://example.com/f", Some(""))), 1);
        assert_eq!(score(&resource("x", "https://example.com/f", None)), 1);
        assert_eq!(score(&Resource::default()), 0);
    }

    #[test]
    fn test_category_filter() {
        let resources = vec![
            resource("本体 PC", "a", None),
            resource("汉化补丁", "b", None),
            resource("通关存档", "c", None),
            resource("补丁+存档", "d", None),
        ];

        let names = |category| -> Vec<String> {
            rank_resources(resources.clone(), category)
                .into_iter()
                .map(|r| r.name().to_string())
                .collect()
        };

        assert_eq!(names(Category::Base), vec!["本体 PC"]);
        assert_eq!(names(Category::Patch), vec!["汉化补丁", "补丁+存档"]);
        assert_eq!(names(Category::Save), vec!["通关存档"]);
    }

    #[test]
    fn test_ordering_is_stable() {
        let resources = vec![
            resource("a", "https://example.com/1", None),
            resource("b", "https://example.com/2", Some("pw")),
            resource("c", "", None),
            resource("d", "https://pan.touchgal.net/1", None),
            resource("e", "https://example.com/3", None),
            resource("f", "https://example.com/4", Some("pw")),
        ];

        let order: Vec<String> = rank_resources(resources, Category::Base)
            .into_iter()
            .map(|r| r.name().to_string())
            .collect();
        assert_eq!(order, vec!["d", "b", "f", "a", "e", "c"]);
    }

    #[test]
    fn test_rank_distinguishes_empty_outcomes() {
        assert_eq!(rank(Vec::new(), Category::Base), RankedResources::NoResources);
        assert_eq!(
            rank(vec![resource("本体", "a", None)], Category::Save),
            RankedResources::NoneInCategory
        );
        assert_eq!(
            rank(vec![resource("本体", "a", None)], Category::Base).into_vec().len(),
            1
        );
    }

    #[test]
    fn test_category_parsing() {
        assert_eq!("patch".parse::<Category>().unwrap(), Category::Patch);
        assert_eq!("SAVE".parse::<Category>().unwrap(), Category::Save);
        assert_eq!("游戏本体".parse::<Category>().unwrap(), Category::Base);
        assert!("dlc".parse::<Category>().is_err());
        assert_eq!(Category::default(), Category::Base);
    }
}
