use sqlparser::dialect::BigQueryDialect;
use sqlparser::tokenizer::{Token, Tokenizer};

use crate::error::{DriverError, DriverResult};
use crate::schema::FieldType;
use crate::value::{DriverValue, NamedValue};

#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    Value(DriverValue),
    /// A NULL of the given type.
    /// The warehouse cannot infer the type of an untyped NULL parameter.
    Null(FieldType),
}

/// A query parameter as sent to the warehouse.
/// A parameter without a name is positional.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParameter {
    pub name: Option<String>,
    pub value: ParameterValue,
}

/// Converts one call argument into a query parameter.
///
/// A NULL nullable float is sent as a typed NULL. No other nullable
/// argument type is rewritten; add cases here when more are needed.
pub fn build_parameter(arg: NamedValue) -> QueryParameter {
    let name = arg.name.filter(|x| !x.is_empty());
    let value = match arg.value {
        DriverValue::NullableFloat64(None) => ParameterValue::Null(FieldType::Float),
        value => ParameterValue::Value(value),
    };
    QueryParameter { name, value }
}

pub fn build_parameters(args: Vec<NamedValue>) -> Vec<QueryParameter> {
    args.into_iter().map(build_parameter).collect()
}

/// Counts the positional (`?`) and named (`@name`) parameters in the SQL text.
/// System variables (`@@name`) are not parameters.
pub fn count_query_parameters(sql: &str) -> DriverResult<usize> {
    let dialect = BigQueryDialect {};
    let tokens = Tokenizer::new(&dialect, sql)
        .tokenize()
        .map_err(|e| DriverError::invalid(e.to_string()))?;
    let mut count = 0;
    let mut previous: Option<&Token> = None;
    for token in tokens.iter() {
        match token {
            Token::Placeholder(p) if p.starts_with('?') || p.starts_with('@') => count += 1,
            Token::Word(w) if w.quote_style.is_some() => {}
            Token::Word(w) if w.value.starts_with('@') && !w.value.starts_with("@@") => {
                count += 1
            }
            Token::Word(_) if matches!(previous, Some(Token::AtSign)) => count += 1,
            _ => {}
        }
        previous = match token {
            Token::AtSign if matches!(previous, Some(Token::AtSign)) => None,
            Token::Whitespace(_) => None,
            _ => Some(token),
        };
    }
    Ok(count)
}
