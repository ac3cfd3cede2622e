use indexmap::IndexSet;
use std::fmt;

/// Ordered set of class tokens handed to class-set operators.
///
/// Tokens keep insertion order so the serialized attribute is stable.
/// Empty tokens are dropped when serializing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassList(IndexSet<String>);

impl ClassList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Splits a class attribute value on ASCII whitespace.
    pub fn parse(value: &str) -> Self {
        Self(value.split_ascii_whitespace().map(str::to_string).collect())
    }

    /// Returns `true` if the token was not present.
    pub fn add(&mut self, class: &str) -> bool {
        self.0.insert(class.to_string())
    }

    /// Returns `true` if the token was present.
    pub fn remove(&mut self, class: &str) -> bool {
        self.0.shift_remove(class)
    }

    /// Adds the token if absent, removes it otherwise. Returns whether it is
    /// present afterwards.
    pub fn toggle(&mut self, class: &str) -> bool {
        if self.remove(class) {
            false
        } else {
            self.add(class)
        }
    }

    pub fn contains(&self, class: &str) -> bool {
        self.0.contains(class)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl fmt::Display for ClassList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for class in self.0.iter().filter(|c| !c.is_empty()) {
            if !first {
                f.write_str(" ")?;
            }
            f.write_str(class)?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display_normalize_whitespace() {
        let list = ClassList::parse("  text \t green  text");
        assert_eq!(list.len(), 2);
        assert_eq!(list.to_string(), "text green");
    }

    #[test]
    fn remove_preserves_order_of_remaining_tokens() {
        let mut list = ClassList::parse("a b c");
        assert!(list.remove("b"));
        assert!(!list.remove("b"));
        list.add("d");
        assert_eq!(list.to_string(), "a c d");
    }

    #[test]
    fn empty_tokens_are_not_serialized() {
        let mut list = ClassList::new();
        list.add("");
        list.add("x");
        assert_eq!(list.to_string(), "x");
    }

    #[test]
    fn toggle_flips_membership() {
        let mut list = ClassList::parse("on");
        assert!(!list.toggle("on"));
        assert!(list.toggle("on"));
        assert!(list.contains("on"));
    }
}
