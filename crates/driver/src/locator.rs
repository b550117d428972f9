//! Lazily evaluated element locators.
//!
//! A [`Locator`] is a chain of [`Selector`]s, each step scoped to the elements
//! matched by the previous one. Nothing is resolved until a driver acts on it,
//! so the same value can be counted, waited on and clicked in turn. The
//! rendered form (`Display`) is also the key the scripted driver indexes by.

use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Selector {
    /// Accessibility role with accessible name
    Role { role: String, name: String },
    /// Visible text, exact or substring
    Text { text: String, exact: bool },
    /// Keep only matches that contain the given text somewhere inside
    HasText(String),
    Placeholder(String),
    Css(String),
    /// Immediately following sibling matching the css selector
    NextSibling(String),
    Parent,
    Nth(usize),
    Last,
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Role { role, name } => write!(f, "role={role}[name=\"{name}\"]"),
            Selector::Text { text, exact: true } => write!(f, "text=\"{text}\""),
            Selector::Text { text, exact: false } => write!(f, "text={text}"),
            Selector::HasText(text) => write!(f, "has-text=\"{text}\""),
            Selector::Placeholder(text) => write!(f, "placeholder=\"{text}\""),
            Selector::Css(css) => write!(f, "css={css}"),
            Selector::NextSibling(css) => write!(f, "sibling={css}"),
            Selector::Parent => f.write_str(".."),
            Selector::Nth(index) => write!(f, "nth={index}"),
            Selector::Last => f.write_str("last"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Locator {
    chain: Vec<Selector>,
}

impl Locator {
    pub fn by_role(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self::root(Selector::Role {
            role: role.into(),
            name: name.into(),
        })
    }

    pub fn by_text(text: impl Into<String>, exact: bool) -> Self {
        Self::root(Selector::Text {
            text: text.into(),
            exact,
        })
    }

    pub fn by_placeholder(text: impl Into<String>) -> Self {
        Self::root(Selector::Placeholder(text.into()))
    }

    pub fn css(css: impl Into<String>) -> Self {
        Self::root(Selector::Css(css.into()))
    }

    pub(crate) fn from_selectors(chain: Vec<Selector>) -> Self {
        Self { chain }
    }

    fn root(selector: Selector) -> Self {
        Self {
            chain: vec![selector],
        }
    }

    fn then(&self, selector: Selector) -> Self {
        let mut chain = self.chain.clone();
        chain.push(selector);
        Self { chain }
    }

    pub fn find(&self, css: impl Into<String>) -> Self {
        self.then(Selector::Css(css.into()))
    }

    pub fn placeholder(&self, text: impl Into<String>) -> Self {
        self.then(Selector::Placeholder(text.into()))
    }

    pub fn text(&self, text: impl Into<String>, exact: bool) -> Self {
        self.then(Selector::Text {
            text: text.into(),
            exact,
        })
    }

    pub fn has_text(&self, text: impl Into<String>) -> Self {
        self.then(Selector::HasText(text.into()))
    }

    pub fn next_sibling(&self, css: impl Into<String>) -> Self {
        self.then(Selector::NextSibling(css.into()))
    }

    pub fn parent(&self) -> Self {
        self.then(Selector::Parent)
    }

    pub fn nth(&self, index: usize) -> Self {
        self.then(Selector::Nth(index))
    }

    pub fn first(&self) -> Self {
        self.nth(0)
    }

    pub fn last(&self) -> Self {
        self.then(Selector::Last)
    }

    pub fn selectors(&self) -> &[Selector] {
        &self.chain
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, selector) in self.chain.iter().enumerate() {
            if index > 0 {
                f.write_str(" >> ")?;
            }
            write!(f, "{selector}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_chain() {
        let locator = Locator::css("div.el-table__header-wrapper")
            .has_text("费用名称")
            .next_sibling("div")
            .find("tr")
            .nth(1)
            .find("td")
            .nth(4);
        assert_eq!(
            locator.to_string(),
            "css=div.el-table__header-wrapper >> has-text=\"费用名称\" >> sibling=div >> css=tr >> nth=1 >> css=td >> nth=4"
        );
    }

    #[test]
    fn chaining_leaves_base_untouched() {
        let base = Locator::css(".el-select-dropdown__item");
        let exact = base.text("差旅", true);
        let fuzzy = base.text("差旅", false);
        assert_eq!(base.selectors().len(), 1);
        assert_ne!(exact, fuzzy);
        assert_eq!(fuzzy.to_string(), "css=.el-select-dropdown__item >> text=差旅");
        assert_eq!(
            Locator::by_role("button", "登录").to_string(),
            "role=button[name=\"登录\"]"
        );
    }
}
