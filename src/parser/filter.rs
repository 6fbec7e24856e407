// Grammar for attribute filter expressions
//
//   name = value
//   name = [v1, v2, ...]

use super::lexer::ws;
use crate::error::{ConvertError, Result};
use nom::{
    bytes::complete::take_till,
    character::complete::char,
    combinator::{all_consuming, map},
    multi::separated_list1,
    sequence::separated_pair,
    IResult,
};

/// One parsed `name = values` expression, before merging.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterExpression {
    pub name: String,
    pub values: Vec<String>,
}

/// Exactly one `=`, splitting the raw name and value segments.
fn assignment(input: &str) -> IResult<&str, (&str, &str)> {
    all_consuming(separated_pair(
        take_till(|c: char| c == '='),
        ws(char('=')),
        take_till(|c: char| c == '='),
    ))(input)
}

/// Comma separated items of a bracketed list (brackets already removed).
fn list_items(input: &str) -> IResult<&str, Vec<&str>> {
    all_consuming(separated_list1(
        ws(char(',')),
        map(take_till(|c: char| c == ','), str::trim),
    ))(input)
}

/// Parse a single filter expression.
///
/// List items are trimmed and must be non-empty: `NAME = []` and
/// `NAME = [a,,b]` fail with `EmptyFilterComponent` instead of matching an
/// empty attribute value.
pub fn parse_filter_expression(input: &str) -> Result<FilterExpression> {
    let (_, (name, value)) = assignment(input)
        .map_err(|_| ConvertError::InvalidFilterExpression(input.to_string()))?;

    let name = name.trim();
    let value = value.trim();
    if name.is_empty() || value.is_empty() {
        return Err(ConvertError::EmptyFilterComponent(input.to_string()));
    }

    let values = if value.len() >= 2 && value.starts_with('[') && value.ends_with(']') {
        let (_, items) = list_items(&value[1..value.len() - 1])
            .map_err(|_| ConvertError::InvalidFilterExpression(input.to_string()))?;
        if items.iter().any(|item| item.is_empty()) {
            return Err(ConvertError::EmptyFilterComponent(input.to_string()));
        }
        items.into_iter().map(str::to_string).collect()
    } else {
        vec![value.to_string()]
    };

    Ok(FilterExpression {
        name: name.to_string(),
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_value() {
        let expr = parse_filter_expression("NAME = France").unwrap();
        assert_eq!(expr.name, "NAME");
        assert_eq!(expr.values, vec!["France"]);
    }

    #[test]
    fn test_parse_list() {
        let expr = parse_filter_expression("  ISO_A2=[ FR , DE,IT ]").unwrap();
        assert_eq!(expr.name, "ISO_A2");
        assert_eq!(expr.values, vec!["FR", "DE", "IT"]);
    }

    #[test]
    fn test_value_keeps_inner_spaces() {
        let expr = parse_filter_expression("NAME = United Kingdom").unwrap();
        assert_eq!(expr.values, vec!["United Kingdom"]);
    }

    #[test]
    fn test_unbalanced_bracket_is_a_plain_value() {
        let expr = parse_filter_expression("CODE = [A").unwrap();
        assert_eq!(expr.values, vec!["[A"]);
    }

    #[test]
    fn test_no_equals_sign() {
        let result = parse_filter_expression("NAME France");
        assert!(matches!(result, Err(ConvertError::InvalidFilterExpression(_))));
    }

    #[test]
    fn test_too_many_equals_signs() {
        let result = parse_filter_expression("a = b = c");
        assert!(matches!(result, Err(ConvertError::InvalidFilterExpression(_))));
    }

    #[test]
    fn test_missing_name() {
        let result = parse_filter_expression(" = France");
        assert!(matches!(result, Err(ConvertError::EmptyFilterComponent(_))));
    }

    #[test]
    fn test_missing_value() {
        let result = parse_filter_expression("NAME =   ");
        assert!(matches!(result, Err(ConvertError::EmptyFilterComponent(_))));
    }

    #[test]
    fn test_empty_list_items() {
        assert!(matches!(
            parse_filter_expression("NAME = []"),
            Err(ConvertError::EmptyFilterComponent(_))
        ));
        assert!(matches!(
            parse_filter_expression("NAME = [a,,b]"),
            Err(ConvertError::EmptyFilterComponent(_))
        ));
    }
}
