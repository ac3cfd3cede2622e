//! Selector syntax.
//!
//! Supported grammar (a practical subset of Selectors Level 3):
//!
//! ```text
//! list      := complex ( ',' complex )*
//! complex   := compound ( ( ' ' | '>' ) compound )*
//! compound  := ( tag | '*' )? ( '#' ident | '.' ident | '[' ident ( '=' value )? ']' )*
//! ```
//!
//! Type selectors are matched ASCII case-insensitively; ids, classes and
//! attribute values are case-sensitive.

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,
    #[error("unexpected {found:?} in selector {selector:?}")]
    Unexpected { selector: String, found: char },
    #[error("combinator without a selector on both sides in {0:?}")]
    DanglingCombinator(String),
    #[error("unterminated attribute selector in {0:?}")]
    UnterminatedAttribute(String),
}

/// One simple selector inside a compound.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selector {
    Universal,
    Type(String),
    Id(String),
    Class(String),
    Attribute { name: String, value: Option<String> },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Combinator {
    Descendant,
    Child,
}

/// Simple selectors that must all match the same element.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Compound(pub Vec<Selector>);

/// Compounds joined by combinators, leftmost first. `combinators[i]` joins
/// `compounds[i]` and `compounds[i + 1]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComplexSelector {
    pub compounds: Vec<Compound>,
    pub combinators: Vec<Combinator>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectorList(pub Vec<ComplexSelector>);

pub fn parse_selector_list(input: &str) -> Result<SelectorList, SelectorError> {
    let mut list = Vec::new();
    for group in split_outside_brackets(input, ',') {
        let group = group.trim();
        if group.is_empty() {
            return Err(if input.trim().is_empty() {
                SelectorError::Empty
            } else {
                SelectorError::Unexpected {
                    selector: input.to_string(),
                    found: ',',
                }
            });
        }
        list.push(parse_complex(group)?);
    }
    Ok(SelectorList(list))
}

fn split_outside_brackets(input: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, ch) in input.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            c if c == sep && depth == 0 => {
                parts.push(&input[start..i]);
                start = i + ch.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

fn parse_complex(input: &str) -> Result<ComplexSelector, SelectorError> {
    let mut compounds = Vec::new();
    let mut combinators = Vec::new();
    let mut pending: Option<Combinator> = None;
    let mut current = String::new();
    let mut depth = 0usize;

    let flush = |current: &mut String,
                 pending: &mut Option<Combinator>,
                 compounds: &mut Vec<Compound>,
                 combinators: &mut Vec<Combinator>|
     -> Result<(), SelectorError> {
        if current.is_empty() {
            return Ok(());
        }
        let compound = parse_compound(current, input)?;
        if !compounds.is_empty() {
            combinators.push(pending.take().unwrap_or(Combinator::Descendant));
        }
        compounds.push(compound);
        current.clear();
        Ok(())
    };

    for ch in input.chars() {
        match ch {
            '[' => {
                depth += 1;
                current.push(ch);
            }
            ']' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            '>' if depth == 0 => {
                flush(&mut current, &mut pending, &mut compounds, &mut combinators)?;
                if compounds.is_empty() || pending.is_some() {
                    return Err(SelectorError::DanglingCombinator(input.to_string()));
                }
                pending = Some(Combinator::Child);
            }
            c if c.is_ascii_whitespace() && depth == 0 => {
                flush(&mut current, &mut pending, &mut compounds, &mut combinators)?;
            }
            _ => current.push(ch),
        }
    }
    if depth != 0 {
        return Err(SelectorError::UnterminatedAttribute(input.to_string()));
    }
    flush(&mut current, &mut pending, &mut compounds, &mut combinators)?;
    if pending.is_some() {
        return Err(SelectorError::DanglingCombinator(input.to_string()));
    }
    if compounds.is_empty() {
        return Err(SelectorError::Empty);
    }
    Ok(ComplexSelector {
        compounds,
        combinators,
    })
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

fn take_ident(chars: &[char], mut i: usize) -> (String, usize) {
    let start = i;
    while i < chars.len() && is_ident_char(chars[i]) {
        i += 1;
    }
    (chars[start..i].iter().collect(), i)
}

fn parse_compound(part: &str, selector: &str) -> Result<Compound, SelectorError> {
    let chars: Vec<char> = part.chars().collect();
    let unexpected = |found: char| SelectorError::Unexpected {
        selector: selector.to_string(),
        found,
    };
    let mut out = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];
        match ch {
            '*' if i == 0 => {
                out.push(Selector::Universal);
                i += 1;
            }
            '#' | '.' => {
                let (ident, next) = take_ident(&chars, i + 1);
                if ident.is_empty() {
                    return Err(unexpected(ch));
                }
                out.push(if ch == '#' {
                    Selector::Id(ident)
                } else {
                    Selector::Class(ident)
                });
                i = next;
            }
            '[' => {
                let close = chars[i..]
                    .iter()
                    .position(|c| *c == ']')
                    .map(|rel| i + rel)
                    .ok_or_else(|| SelectorError::UnterminatedAttribute(selector.to_string()))?;
                let body: String = chars[i + 1..close].iter().collect();
                out.push(parse_attribute(&body, selector)?);
                i = close + 1;
            }
            c if i == 0 && is_ident_char(c) => {
                let (ident, next) = take_ident(&chars, i);
                out.push(Selector::Type(ident.to_ascii_lowercase()));
                i = next;
            }
            _ => return Err(unexpected(ch)),
        }
    }
    Ok(Compound(out))
}

fn parse_attribute(body: &str, selector: &str) -> Result<Selector, SelectorError> {
    let (name, value) = match body.split_once('=') {
        Some((name, value)) => {
            let value = value.trim();
            let unquoted = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(value);
            (name.trim(), Some(unquoted.to_string()))
        }
        None => (body.trim(), None),
    };
    if name.is_empty() || !name.chars().all(|c| is_ident_char(c) || c == ':') {
        return Err(SelectorError::Unexpected {
            selector: selector.to_string(),
            found: '[',
        });
    }
    Ok(Selector::Attribute {
        name: name.to_ascii_lowercase(),
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_compound_with_every_simple_selector() {
        let list = parse_selector_list("div#main.a.b[data-x][title='t']").unwrap();
        assert_eq!(list.0.len(), 1);
        assert_eq!(
            list.0[0].compounds[0].0,
            vec![
                Selector::Type("div".to_string()),
                Selector::Id("main".to_string()),
                Selector::Class("a".to_string()),
                Selector::Class("b".to_string()),
                Selector::Attribute {
                    name: "data-x".to_string(),
                    value: None
                },
                Selector::Attribute {
                    name: "title".to_string(),
                    value: Some("t".to_string())
                },
            ]
        );
    }

    #[test]
    fn parses_combinators_and_groups() {
        let list = parse_selector_list("ul > li a, H1").unwrap();
        assert_eq!(list.0.len(), 2);
        assert_eq!(
            list.0[0].combinators,
            vec![Combinator::Child, Combinator::Descendant]
        );
        assert_eq!(list.0[1].compounds[0].0, vec![Selector::Type("h1".to_string())]);
    }

    #[test]
    fn child_combinator_without_spaces() {
        let list = parse_selector_list("div>p").unwrap();
        assert_eq!(list.0[0].compounds.len(), 2);
        assert_eq!(list.0[0].combinators, vec![Combinator::Child]);
    }

    #[test]
    fn rejects_malformed_selectors() {
        assert_eq!(parse_selector_list("  "), Err(SelectorError::Empty));
        assert!(matches!(
            parse_selector_list("> p"),
            Err(SelectorError::DanglingCombinator(_))
        ));
        assert!(matches!(
            parse_selector_list("div >"),
            Err(SelectorError::DanglingCombinator(_))
        ));
        assert!(matches!(
            parse_selector_list("a[href"),
            Err(SelectorError::UnterminatedAttribute(_))
        ));
        assert!(matches!(
            parse_selector_list("p:hover"),
            Err(SelectorError::Unexpected { found: ':', .. })
        ));
        assert!(parse_selector_list("a,,b").is_err());
    }
}
