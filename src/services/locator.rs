//! Element location inside collection-like widgets.
//!
//! Lists, tables, trees, menus and drop-downs all answer the same four
//! questions through [`ElementSource`]: how many elements, what does element
//! `i` read as, scroll element `i` into view, and where is element `i` now.
//! [`RetryingLocator`] is written once against that interface:
//!
//! 1. the first element (in index order) accepted by the matcher wins
//! 2. nothing matched: report the widget contents alongside the matcher
//! 3. already selected and no pointer action needed: no coordinate
//! 4. otherwise scroll, then measure again, since scrolling invalidates every
//!    position observed before it
//!
//! All of this runs inside a single UI-thread query, so the widget cannot
//! change between the match and the measurement.

use regex::Regex;
use std::fmt;
use std::sync::Arc;

use crate::error::{LookupFailure, PreconditionFailure, Result, RobotError};
use crate::metrics::Metrics;
use crate::models::Point;
use crate::services::format::quote;
use crate::ui::bridge::WidgetAccess;
use crate::ui::executor::UiExecutor;
use crate::widgets::Component;

/// Capability interface of a collection-like widget, used on the UI thread only
pub trait ElementSource: Component {
    fn element_count(&self) -> usize;

    /// Text of element `index` as a user would read it
    fn value_at(&self, index: usize) -> Option<String>;

    fn is_selected(&self, index: usize) -> bool;

    /// Bring element `index` into view
    fn scroll_to_element(&mut self, index: usize);

    /// Screen coordinate a click on element `index` should target
    fn coordinate_of(&self, index: usize) -> Point;

    fn contents(&self) -> Vec<Option<String>> {
        (0..self.element_count()).map(|i| self.value_at(i)).collect()
    }
}

/// Decides which element text is wanted
pub trait TextMatcher: Send + Sync + fmt::Debug {
    fn is_matching(&self, text: Option<&str>) -> bool;

    /// Human readable description, e.g. `value "Charlie"`
    fn description(&self) -> String;
}

pub type SharedMatcher = Arc<dyn TextMatcher>;

/// Matches elements equal to one of the given values
#[derive(Debug, Clone)]
pub struct ExactText {
    values: Vec<String>,
}

impl ExactText {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            values: vec![value.into()],
        }
    }

    pub fn any_of<I, S>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return Err(PreconditionFailure::InvalidArgument(
                "at least one value to match is required".into(),
            )
            .into());
        }
        Ok(Self { values })
    }
}

impl TextMatcher for ExactText {
    fn is_matching(&self, text: Option<&str>) -> bool {
        text.is_some_and(|t| self.values.iter().any(|v| v == t))
    }

    fn description(&self) -> String {
        describe_values(&self.values, "value", "values")
    }
}

/// Matches elements whose whole text matches one of the given regular expressions
#[derive(Debug, Clone)]
pub struct PatternText {
    patterns: Vec<Regex>,
    sources: Vec<String>,
}

impl PatternText {
    pub fn new(pattern: &str) -> Result<Self> {
        Self::any_of([pattern])
    }

    pub fn any_of<'a, I>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let sources: Vec<String> = patterns.into_iter().map(str::to_string).collect();
        if sources.is_empty() {
            return Err(PreconditionFailure::InvalidArgument(
                "at least one pattern to match is required".into(),
            )
            .into());
        }
        let patterns = sources
            .iter()
            .map(|p| {
                Regex::new(&format!("^(?:{p})$")).map_err(|e| {
                    PreconditionFailure::InvalidArgument(format!("invalid pattern {p:?}: {e}"))
                })
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { patterns, sources })
    }
}

impl TextMatcher for PatternText {
    fn is_matching(&self, text: Option<&str>) -> bool {
        text.is_some_and(|t| self.patterns.iter().any(|p| p.is_match(t)))
    }

    fn description(&self) -> String {
        describe_values(&self.sources, "pattern", "patterns")
    }
}

fn describe_values(values: &[String], singular: &str, plural: &str) -> String {
    match values {
        [one] => format!("{singular} {}", quote(one)),
        many => {
            let quoted: Vec<String> = many.iter().map(|v| quote(v)).collect();
            format!("{plural} [{}]", quoted.join(", "))
        }
    }
}

/// Shorthand for an exact-value matcher
pub fn value(text: impl Into<String>) -> SharedMatcher {
    Arc::new(ExactText::new(text))
}

/// Shorthand for a regular-expression matcher
pub fn pattern(regex: &str) -> Result<SharedMatcher> {
    Ok(Arc::new(PatternText::new(regex)?))
}

/// Whether an already selected element still needs pointer input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollPolicy {
    /// Always scroll and measure (clicks, drags, popups)
    Always,
    /// Skip an element that is already selected (selection)
    UnlessSelected,
}

/// A located element
///
/// `coordinate` is `None` when the element was already in the desired state and
/// no pointer input must be generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementMatch {
    pub index: usize,
    pub coordinate: Option<Point>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    NotFound,
    Found(ElementMatch),
}

impl MatchResult {
    pub fn is_found(&self) -> bool {
        matches!(self, MatchResult::Found(_))
    }

    pub fn index(&self) -> Option<usize> {
        match self {
            MatchResult::Found(m) => Some(m.index),
            MatchResult::NotFound => None,
        }
    }

    pub fn coordinate(&self) -> Option<Point> {
        match self {
            MatchResult::Found(m) => m.coordinate,
            MatchResult::NotFound => None,
        }
    }
}

/// First element accepted by `matcher`, brought into view per `policy`
pub fn locate_in<S>(source: &mut S, matcher: &dyn TextMatcher, policy: ScrollPolicy) -> MatchResult
where
    S: ElementSource + ?Sized,
{
    let found = (0..source.element_count())
        .find(|&i| matcher.is_matching(source.value_at(i).as_deref()));
    match found {
        Some(index) => MatchResult::Found(bring_into_view(source, index, policy)),
        None => MatchResult::NotFound,
    }
}

fn bring_into_view<S>(source: &mut S, index: usize, policy: ScrollPolicy) -> ElementMatch
where
    S: ElementSource + ?Sized,
{
    if policy == ScrollPolicy::UnlessSelected && source.is_selected(index) {
        tracing::debug!("{} element {} already selected", source.describe(), index);
        return ElementMatch {
            index,
            coordinate: None,
        };
    }
    source.scroll_to_element(index);
    // Measured after the scroll: positions taken before it are stale
    let coordinate = source.coordinate_of(index);
    tracing::debug!(
        "{} element {} in view at {}",
        source.describe(),
        index,
        coordinate
    );
    ElementMatch {
        index,
        coordinate: Some(coordinate),
    }
}

fn require_enabled_and_showing<S: ElementSource + ?Sized>(source: &S) -> Result<()> {
    if !source.is_showing() {
        return Err(PreconditionFailure::NotShowing(source.describe()).into());
    }
    if !source.is_enabled() {
        return Err(PreconditionFailure::NotEnabled(source.describe()).into());
    }
    Ok(())
}

fn lookup_failure<S: ElementSource + ?Sized>(
    source: &S,
    matcher: &dyn TextMatcher,
) -> LookupFailure {
    LookupFailure {
        widget: source.describe(),
        matcher: matcher.description(),
        contents: source.contents(),
    }
}

/// Finds elements of collection-like widgets and prepares them for pointer input
#[derive(Clone)]
pub struct RetryingLocator {
    executor: UiExecutor,
    metrics: Arc<Metrics>,
}

impl RetryingLocator {
    pub fn new(executor: UiExecutor, metrics: Arc<Metrics>) -> Self {
        Self { executor, metrics }
    }

    /// Locate the first element accepted by `matcher`
    ///
    /// A miss is reported as [`MatchResult::NotFound`]; use
    /// [`locate_or_fail`](Self::locate_or_fail) to get a diagnostic instead.
    pub fn locate<W>(
        &self,
        widget: &W,
        matcher: SharedMatcher,
        policy: ScrollPolicy,
    ) -> Result<MatchResult>
    where
        W: WidgetAccess,
        W::Target: ElementSource,
    {
        let widget = widget.clone();
        let metrics = self.metrics.clone();
        self.executor.query(move || {
            widget.with_mut(|source| -> Result<MatchResult> {
                require_enabled_and_showing(source)?;
                let result = locate_in(source, matcher.as_ref(), policy);
                record(&metrics, result);
                Ok(result)
            })?
        })
    }

    /// Locate the first element accepted by `matcher` or fail with the widget contents
    pub fn locate_or_fail<W>(
        &self,
        widget: &W,
        matcher: SharedMatcher,
        policy: ScrollPolicy,
    ) -> Result<ElementMatch>
    where
        W: WidgetAccess,
        W::Target: ElementSource,
    {
        let widget = widget.clone();
        let metrics = self.metrics.clone();
        self.executor.query(move || {
            widget.with_mut(|source| -> Result<ElementMatch> {
                require_enabled_and_showing(source)?;
                let result = locate_in(source, matcher.as_ref(), policy);
                record(&metrics, result);
                match result {
                    MatchResult::Found(found) => Ok(found),
                    MatchResult::NotFound => {
                        Err(lookup_failure(source, matcher.as_ref()).into())
                    }
                }
            })?
        })
    }

    /// Bring the element at `index` into view
    pub fn locate_index<W>(
        &self,
        widget: &W,
        index: usize,
        policy: ScrollPolicy,
    ) -> Result<ElementMatch>
    where
        W: WidgetAccess,
        W::Target: ElementSource,
    {
        let widget = widget.clone();
        let metrics = self.metrics.clone();
        self.executor.query(move || {
            widget.with_mut(|source| -> Result<ElementMatch> {
                require_enabled_and_showing(source)?;
                let count = source.element_count();
                if index >= count {
                    return Err(PreconditionFailure::IndexOutOfBounds { index, count }.into());
                }
                let found = bring_into_view(source, index, policy);
                record(&metrics, MatchResult::Found(found));
                Ok(found)
            })?
        })
    }

    /// Index of the first element accepted by `matcher`, without scrolling
    pub fn index_of<W>(&self, widget: &W, matcher: SharedMatcher) -> Result<usize>
    where
        W: WidgetAccess,
        W::Target: ElementSource,
    {
        let widget = widget.clone();
        self.executor.query(move || {
            widget.with(|source| -> Result<usize> {
                (0..source.element_count())
                    .find(|&i| matcher.is_matching(source.value_at(i).as_deref()))
                    .ok_or_else(|| RobotError::from(lookup_failure(source, matcher.as_ref())))
            })?
        })
    }

    /// Snapshot of every element's text
    pub fn contents<W>(&self, widget: &W) -> Result<Vec<Option<String>>>
    where
        W: WidgetAccess,
        W::Target: ElementSource,
    {
        let widget = widget.clone();
        self.executor.query(move || widget.with(|source| source.contents()))
    }
}

fn record(metrics: &Metrics, result: MatchResult) {
    metrics.record_lookup(result.is_found());
    if result.coordinate().is_some() {
        metrics.record_scroll();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Rect;
    use proptest::prelude::*;

    /// Ten-pixel rows, three visible, scroll offset in rows
    struct FakeList {
        items: Vec<String>,
        selected: Option<usize>,
        offset: usize,
        scroll_calls: usize,
    }

    impl FakeList {
        fn new(items: &[&str]) -> Self {
            Self {
                items: items.iter().map(|s| s.to_string()).collect(),
                selected: None,
                offset: 0,
                scroll_calls: 0,
            }
        }
    }

    impl Component for FakeList {
        fn kind(&self) -> &'static str {
            "FakeList"
        }

        fn bounds(&self) -> Rect {
            Rect::new(0, 0, 100, 30)
        }
    }

    impl ElementSource for FakeList {
        fn element_count(&self) -> usize {
            self.items.len()
        }

        fn value_at(&self, index: usize) -> Option<String> {
            self.items.get(index).cloned()
        }

        fn is_selected(&self, index: usize) -> bool {
            self.selected == Some(index)
        }

        fn scroll_to_element(&mut self, index: usize) {
            self.scroll_calls += 1;
            if index >= self.offset + 3 {
                self.offset = index - 2;
            } else if index < self.offset {
                self.offset = index;
            }
        }

        fn coordinate_of(&self, index: usize) -> Point {
            Point::new(50, (index as i32 - self.offset as i32) * 10 + 5)
        }
    }

    #[test]
    fn test_first_match_wins() {
        let mut list = FakeList::new(&["A", "B", "A"]);
        let result = locate_in(&mut list, &ExactText::new("A"), ScrollPolicy::Always);
        assert_eq!(result.index(), Some(0));
    }

    #[test]
    fn test_not_found_has_no_coordinate() {
        let mut list = FakeList::new(&["A", "B", "C"]);
        let result = locate_in(&mut list, &ExactText::new("Z"), ScrollPolicy::Always);
        assert_eq!(result, MatchResult::NotFound);
        assert_eq!(result.coordinate(), None);
        assert_eq!(list.scroll_calls, 0);
    }

    #[test]
    fn test_selected_element_needs_no_input_every_time() {
        let mut list = FakeList::new(&["A", "B", "C"]);
        list.selected = Some(1);

        for _ in 0..2 {
            let result = locate_in(&mut list, &ExactText::new("B"), ScrollPolicy::UnlessSelected);
            assert_eq!(result.index(), Some(1));
            assert_eq!(result.coordinate(), None);
        }
        assert_eq!(list.scroll_calls, 0);
    }

    #[test]
    fn test_coordinate_is_measured_after_scrolling() {
        let mut list = FakeList::new(&["A", "B", "C", "D", "E", "F"]);
        let before_scroll = list.coordinate_of(5);

        let result = locate_in(&mut list, &ExactText::new("F"), ScrollPolicy::Always);

        assert_eq!(list.scroll_calls, 1);
        let coordinate = result.coordinate().unwrap();
        assert_ne!(coordinate, before_scroll);
        assert_eq!(coordinate, Point::new(50, 25));
    }

    #[test]
    fn test_pattern_matches_whole_text() {
        let matcher = PatternText::new("Ch.*").unwrap();
        assert!(matcher.is_matching(Some("Charlie")));
        assert!(!matcher.is_matching(Some("Rich")));
        assert!(!matcher.is_matching(None));
        assert_eq!(matcher.description(), "pattern \"Ch.*\"");
    }

    #[test]
    fn test_invalid_pattern_is_a_precondition_failure() {
        let err = PatternText::new("(").unwrap_err();
        assert_eq!(err.kind(), crate::error::FailureKind::Precondition);
    }

    #[test]
    fn test_matcher_descriptions() {
        assert_eq!(ExactText::new("Zed").description(), "value \"Zed\"");
        assert_eq!(
            ExactText::any_of(["A", "B"]).unwrap().description(),
            "values [\"A\", \"B\"]"
        );
        assert!(ExactText::any_of(Vec::<String>::new()).is_err());
    }

    proptest! {
        #[test]
        fn prop_locate_returns_lowest_matching_index(
            items in proptest::collection::vec("[abc]", 0..12),
            wanted in "[abc]",
        ) {
            let refs: Vec<&str> = items.iter().map(String::as_str).collect();
            let mut list = FakeList::new(&refs);
            let matcher = ExactText::new(wanted.clone());
            let result = locate_in(&mut list, &matcher, ScrollPolicy::Always);
            let expected = items.iter().position(|i| *i == wanted);
            prop_assert_eq!(result.index(), expected);
            prop_assert_eq!(result.coordinate().is_some(), expected.is_some());
        }
    }
}
