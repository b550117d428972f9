use autofill_driver::Locator;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug)]
pub struct SelectParams {
    /// Human name of the field, used in progress lines
    pub field: String,
    /// Element that opens the dropdown; `None` when it is already open
    pub trigger: Option<Locator>,
    /// All option elements of the open dropdown
    pub options: Locator,
    pub target: String,
}

impl SelectParams {
    pub fn new(field: impl Into<String>, options: Locator, target: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            trigger: None,
            options,
            target: target.into(),
        }
    }

    pub fn with_trigger(mut self, trigger: Locator) -> Self {
        self.trigger = Some(trigger);
        self
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Fuzzy,
    FirstVisible,
}

impl MatchKind {
    pub fn label(self) -> &'static str {
        match self {
            MatchKind::Exact => "exact",
            MatchKind::Fuzzy => "fuzzy",
            MatchKind::FirstVisible => "first visible",
        }
    }
}

/// One option as observed during the scan, in DOM order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OptionView {
    pub index: usize,
    pub visible: bool,
    pub text: String,
}

impl OptionView {
    pub fn new(index: usize, visible: bool, text: impl Into<String>) -> Self {
        Self {
            index,
            visible,
            text: text.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoOptions,
    NoneVisible,
    NoMatch,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SelectOutcome {
    Selected {
        kind: MatchKind,
        index: usize,
        text: String,
    },
    Skipped(SkipReason),
}

/// Picks an option: exact match first, then the first substring match, then
/// the first visible option. Option text is trimmed, the target is compared
/// as given. Hidden options never win.
pub fn choose_option(
    options: &[OptionView],
    target: &str,
    fallback: bool,
) -> Result<(MatchKind, usize), SkipReason> {
    if options.is_empty() {
        return Err(SkipReason::NoOptions);
    }
    let mut fuzzy = None;
    let mut first_visible = None;
    for (position, option) in options.iter().enumerate() {
        if !option.visible {
            continue;
        }
        first_visible.get_or_insert(position);
        let text = option.text.trim();
        if text == target {
            return Ok((MatchKind::Exact, position));
        }
        if fuzzy.is_none() && !target.is_empty() && text.contains(target) {
            fuzzy = Some(position);
        }
    }
    if let Some(position) = fuzzy {
        return Ok((MatchKind::Fuzzy, position));
    }
    match first_visible {
        None => Err(SkipReason::NoneVisible),
        Some(position) if fallback => Ok((MatchKind::FirstVisible, position)),
        Some(_) => Err(SkipReason::NoMatch),
    }
}
