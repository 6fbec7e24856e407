// Attribute filters: merged predicates over record fields

use crate::error::Result;
use crate::parser::parse_filter_expression;
use crate::source::Field;

/// Accepted values for one attribute field.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub name: String,
    pub values: Vec<String>,
}

impl Filter {
    /// True if `field` has this filter's name and one of the accepted values.
    pub fn accepts(&self, field: &Field) -> bool {
        field.name == self.name && self.values.iter().any(|v| field.matches(v))
    }
}

/// All filters of one run, at most one per field name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    filters: Vec<Filter>,
}

impl FilterSet {
    /// Parse and merge filter expressions.
    ///
    /// Expressions naming the same field are merged into a single filter holding
    /// the union of their values. Filters keep the order in which their name
    /// first appeared.
    pub fn parse<S: AsRef<str>>(expressions: &[S]) -> Result<Self> {
        let mut filters: Vec<Filter> = Vec::new();
        for raw in expressions {
            let expr = parse_filter_expression(raw.as_ref())?;
            match filters.iter_mut().find(|f| f.name == expr.name) {
                Some(existing) => existing.values.extend(expr.values),
                None => filters.push(Filter {
                    name: expr.name,
                    values: expr.values,
                }),
            }
        }
        Ok(Self { filters })
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Filter> {
        self.filters.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Filter> {
        self.filters.iter().find(|f| f.name == name)
    }

    /// Retention decision for one record's fields.
    ///
    /// An empty set keeps everything. Otherwise the first field accepted by any
    /// filter keeps the record.
    pub fn retains(&self, fields: &[Field]) -> bool {
        if self.filters.is_empty() {
            return true;
        }
        fields
            .iter()
            .any(|field| self.filters.iter().any(|filter| filter.accepts(field)))
    }
}
