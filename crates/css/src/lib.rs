pub mod matching;
pub mod selector;

// Re-exports so other crates can just use `css::...` nicely.
pub use matching::{matches, query_all, query_first};
pub use selector::{
    Combinator, ComplexSelector, Compound, Selector, SelectorError, SelectorList,
    parse_selector_list,
};
