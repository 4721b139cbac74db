//! Keyword rules mapping a free-text object label to a recyclability category.
//!
//! Evaluation order is part of the contract:
//!
//! 1. special cases, in insertion order, first match wins
//! 2. recyclable keywords
//! 3. non-recyclable keywords
//! 4. default: non-recyclable, flagged uncertain
//!
//! Because step 2 runs before step 3, a label containing both a recyclable and
//! a non-recyclable keyword (`"pizza box"` contains `"box"`) is recyclable.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use super::error::RecyclingError;
use super::Category;

const RECYCLABLE_KEYWORDS: &[&str] = &[
    "bottle", "can", "jar", "box", "paper", "cardboard", "newspaper",
    "magazine", "envelope", "carton", "container", "aluminum", "glass",
    "plastic", "metal", "tin", "steel", "beverage", "soda", "water",
    "milk jug", "mail",
];

const NON_RECYCLABLE_KEYWORDS: &[&str] = &[
    "food", "trash", "garbage", "waste", "diaper", "styrofoam",
    "plastic bag", "wrap", "straw", "utensil", "cigarette", "ceramic",
    "mirror", "light bulb", "window", "pizza box", "tissue", "napkin",
    "paper towel", "wax paper", "photograph", "aerosol", "hazardous",
    "medical", "syringe", "needle", "battery",
    "banana", "apple", "orange", "pizza", "cake", "sandwich", "hotdog",
    "donut", "bread", "foam", "wrapper", "chip bag", "crisp packet",
    "coffee cup", "lid", "takeout container",
];

lazy_static! {
    static ref STANDARD_RULES: RuleSet = RuleSet {
        special_cases: vec![
            SpecialCase::ContainsExcept {
                term: "carton".to_string(),
                except: "egg".to_string(),
                category: Category::Recyclable,
            },
            SpecialCase::ContainsAny {
                terms: vec!["packet".to_string(), "bag".to_string()],
                category: Category::NonRecyclable,
            },
        ],
        recyclable: RECYCLABLE_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        non_recyclable: NON_RECYCLABLE_KEYWORDS.iter().map(|k| k.to_string()).collect(),
    };
}

/// A predicate checked before generic keyword matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpecialCase {
    /// Label contains `term` but not `except`
    ContainsExcept {
        term: String,
        except: String,
        category: Category,
    },
    /// Label contains at least one of `terms`
    ContainsAny {
        terms: Vec<String>,
        category: Category,
    },
}

impl SpecialCase {
    fn matches(&self, label: &str) -> bool {
        match self {
            Self::ContainsExcept { term, except, .. } => label.contains(term.as_str()) && !label.contains(except.as_str()),
            Self::ContainsAny { terms, .. } => terms.iter().any(|t| label.contains(t.as_str())),
        }
    }

    pub fn category(&self) -> Category {
        match self {
            Self::ContainsExcept { category, .. } | Self::ContainsAny { category, .. } => *category,
        }
    }

    fn normalized(self) -> Result<Self, RecyclingError> {
        match self {
            Self::ContainsExcept { term, except, category } => Ok(Self::ContainsExcept {
                term: normalize_keyword(&term)?,
                except: normalize_keyword(&except)?,
                category,
            }),
            Self::ContainsAny { terms, category } => {
                if terms.is_empty() {
                    return Err(RecyclingError::InvalidRule("Special case needs at least one term".into()));
                }
                let terms = terms.iter().map(|t| normalize_keyword(t)).collect::<Result<_, _>>()?;
                Ok(Self::ContainsAny { terms, category })
            }
        }
    }
}

/// Which rule decided a label's category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", content = "value", rename_all = "snake_case")]
pub enum MatchedRule {
    /// Index into the rule set's special cases
    SpecialCase(usize),
    RecyclableKeyword(String),
    NonRecyclableKeyword(String),
    /// Nothing matched; category fell back to non-recyclable
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelMatch {
    pub category: Category,
    pub rule: MatchedRule,
}

impl LabelMatch {
    /// True when no rule recognized the label
    pub fn is_uncertain(&self) -> bool {
        self.rule == MatchedRule::Default
    }
}

/// Ordered special cases plus the recyclable and non-recyclable keyword
/// tables. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    special_cases: Vec<SpecialCase>,
    recyclable: Vec<String>,
    non_recyclable: Vec<String>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::standard().clone()
    }
}

impl RuleSet {
    /// The process-wide default rules, built on first use.
    pub fn standard() -> &'static RuleSet {
        &STANDARD_RULES
    }

    /// Starts an empty rule set
    pub fn builder() -> RuleSetBuilder {
        RuleSetBuilder::default()
    }

    pub fn special_cases(&self) -> &[SpecialCase] {
        &self.special_cases
    }

    pub fn recyclable_keywords(&self) -> &[String] {
        &self.recyclable
    }

    pub fn non_recyclable_keywords(&self) -> &[String] {
        &self.non_recyclable
    }

    /// Maps a classifier label to a category, case-insensitively.
    ///
    /// # Errors
    /// `InvalidLabel` if the label is empty or only whitespace.
    ///
    /// # Example
    /// ```
    /// use recyclens::{Category, RuleSet};
    ///
    /// let rules = RuleSet::standard();
    /// assert_eq!(rules.classify_label("Plastic Bottle")?.category, Category::Recyclable);
    /// assert_eq!(rules.classify_label("plastic bag")?.category, Category::NonRecyclable);
    /// # Ok::<(), recyclens::RecyclingError>(())
    /// ```
    pub fn classify_label(&self, label: &str) -> Result<LabelMatch, RecyclingError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(RecyclingError::InvalidLabel("Label cannot be empty".into()));
        }
        let label = label.to_lowercase();

        if let Some((idx, case)) = self.special_cases.iter().enumerate().find(|(_, c)| c.matches(&label)) {
            return Ok(LabelMatch {
                category: case.category(),
                rule: MatchedRule::SpecialCase(idx),
            });
        }
        if let Some(keyword) = find_keyword(&self.recyclable, &label) {
            return Ok(LabelMatch {
                category: Category::Recyclable,
                rule: MatchedRule::RecyclableKeyword(keyword.to_string()),
            });
        }
        if let Some(keyword) = find_keyword(&self.non_recyclable, &label) {
            return Ok(LabelMatch {
                category: Category::NonRecyclable,
                rule: MatchedRule::NonRecyclableKeyword(keyword.to_string()),
            });
        }
        Ok(LabelMatch {
            category: Category::NonRecyclable,
            rule: MatchedRule::Default,
        })
    }
}

fn find_keyword<'a>(keywords: &'a [String], label: &str) -> Option<&'a str> {
    keywords.iter().map(String::as_str).find(|k| label.contains(k))
}

fn normalize_keyword(keyword: &str) -> Result<String, RecyclingError> {
    let keyword = keyword.trim();
    if keyword.is_empty() {
        return Err(RecyclingError::InvalidRule("Keyword cannot be empty".into()));
    }
    Ok(keyword.to_lowercase())
}

/// Fluent construction of a custom [`RuleSet`]. Keywords are trimmed and
/// lowercased; order of insertion is evaluation order.
#[derive(Debug, Default, Clone)]
pub struct RuleSetBuilder {
    special_cases: Vec<SpecialCase>,
    recyclable: Vec<String>,
    non_recyclable: Vec<String>,
}

impl RuleSetBuilder {
    /// Starts from the standard rules so callers can extend them
    pub fn from_standard() -> Self {
        let standard = RuleSet::standard();
        Self {
            special_cases: standard.special_cases.clone(),
            recyclable: standard.recyclable.clone(),
            non_recyclable: standard.non_recyclable.clone(),
        }
    }

    pub fn special_case(mut self, case: SpecialCase) -> Self {
        self.special_cases.push(case);
        self
    }

    pub fn recyclable<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.recyclable.extend(keywords.into_iter().map(Into::into));
        self
    }

    pub fn non_recyclable<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.non_recyclable.extend(keywords.into_iter().map(Into::into));
        self
    }

    pub fn build(self) -> Result<RuleSet, RecyclingError> {
        if self.recyclable.is_empty() && self.non_recyclable.is_empty() && self.special_cases.is_empty() {
            return Err(RecyclingError::InvalidRule("Rule set has no rules".into()));
        }
        Ok(RuleSet {
            special_cases: self.special_cases
                .into_iter()
                .map(SpecialCase::normalized)
                .collect::<Result<_, _>>()?,
            recyclable: self.recyclable.iter().map(|k| normalize_keyword(k)).collect::<Result<_, _>>()?,
            non_recyclable: self.non_recyclable.iter().map(|k| normalize_keyword(k)).collect::<Result<_, _>>()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(label: &str) -> Category {
        RuleSet::standard().classify_label(label).unwrap().category
    }

    #[test]
    fn test_recyclable_keyword() {
        assert_eq!(category("pop bottle"), Category::Recyclable);
        assert_eq!(category("Beer Can"), Category::Recyclable);
    }

    #[test]
    fn test_recyclable_wins_over_non_recyclable() {
        let matched = RuleSet::standard().classify_label("pizza box").unwrap();
        assert_eq!(matched.category, Category::Recyclable);
        assert_eq!(matched.rule, MatchedRule::RecyclableKeyword("box".into()));
    }

    #[test]
    fn test_special_case_precedes_keywords() {
        // "plastic" is a recyclable keyword but the bag special case runs first
        let matched = RuleSet::standard().classify_label("plastic bag").unwrap();
        assert_eq!(matched.category, Category::NonRecyclable);
        assert_eq!(matched.rule, MatchedRule::SpecialCase(1));
    }

    #[test]
    fn test_unknown_label_defaults_negative() {
        let matched = RuleSet::standard().classify_label("golden retriever").unwrap();
        assert_eq!(matched.category, Category::NonRecyclable);
        assert!(matched.is_uncertain());
    }

    #[test]
    fn test_blank_label_rejected() {
        assert!(matches!(
            RuleSet::standard().classify_label("   "),
            Err(RecyclingError::InvalidLabel(_))
        ));
    }

    #[test]
    fn test_builder_normalizes_keywords() {
        let rules = RuleSet::builder()
            .recyclable(vec!["  Yogurt Cup "])
            .build()
            .unwrap();
        assert_eq!(rules.recyclable_keywords(), &["yogurt cup".to_string()]);
        assert_eq!(rules.classify_label("YOGURT CUP").unwrap().category, Category::Recyclable);
    }

    #[test]
    fn test_builder_rejects_empty_keyword() {
        let result = RuleSet::builder().non_recyclable(vec![""]).build();
        assert!(matches!(result, Err(RecyclingError::InvalidRule(_))));
    }

    #[test]
    fn test_builder_rejects_empty_rule_set() {
        assert!(RuleSet::builder().build().is_err());
    }
}
