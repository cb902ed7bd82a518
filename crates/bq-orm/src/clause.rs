use bq_driver::value::{DriverValue, NamedValue};

/// A value that the ORM knows how to bind into SQL text.
#[derive(Debug, Clone, PartialEq)]
pub enum BindVar {
    /// A named argument, written as `@name`.
    Named { name: String, value: DriverValue },
    Column(String),
    Table(String),
    /// Raw SQL text where each `?` is replaced by the next variable.
    Expr { sql: String, vars: Vec<BindVar> },
    Value(DriverValue),
    Bytes(Vec<u8>),
    /// A list of variables, written as `(v1,v2,...)`.
    List(Vec<BindVar>),
    /// A sub-query, written in parentheses.
    SubQuery { sql: String, vars: Vec<BindVar> },
}

impl BindVar {
    pub fn expr(sql: impl Into<String>, vars: Vec<BindVar>) -> Self {
        BindVar::Expr {
            sql: sql.into(),
            vars,
        }
    }

    pub fn named(name: impl Into<String>, value: impl Into<DriverValue>) -> Self {
        BindVar::Named {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// One value of a row in an `INSERT ... VALUES` clause.
///
/// The variant decides how the value is rendered and is chosen when the
/// value is constructed.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertValue {
    /// A value of a kind the ORM binds natively.
    Passthrough(BindVar),
    /// A sequence rendered as a warehouse array literal `[v1,v2,...]`.
    Sequence(Vec<BindVar>),
    Scalar(DriverValue),
}

impl InsertValue {
    pub fn scalar(value: impl Into<DriverValue>) -> Self {
        InsertValue::Scalar(value.into())
    }

    pub fn sequence<T: Into<DriverValue>>(items: impl IntoIterator<Item = T>) -> Self {
        InsertValue::Sequence(
            items
                .into_iter()
                .map(|x| BindVar::Value(x.into()))
                .collect(),
        )
    }

    pub fn bytes(value: Vec<u8>) -> Self {
        InsertValue::Passthrough(BindVar::Bytes(value))
    }
}

impl From<BindVar> for InsertValue {
    fn from(value: BindVar) -> Self {
        InsertValue::Passthrough(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Values {
    pub columns: Vec<String>,
    pub values: Vec<Vec<InsertValue>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClauseExpression {
    Insert { table: String },
    Values(Values),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub name: String,
    pub expression: Option<ClauseExpression>,
}

impl Clause {
    pub fn new(name: impl Into<String>, expression: ClauseExpression) -> Self {
        Self {
            name: name.into(),
            expression: Some(expression),
        }
    }
}

/// The sink clause builders write SQL text and variables into.
pub trait ClauseBuilder {
    fn write_str(&mut self, s: &str);
    fn write_char(&mut self, c: char);
    /// Writes a column or table name as a quoted identifier.
    fn write_quoted(&mut self, name: &str);
    fn add_var(&mut self, var: &BindVar);
}

/// A clause builder that accumulates SQL text and the bound arguments
/// in the order the placeholders appear.
#[derive(Debug, Default)]
pub struct SqlBuilder {
    sql: String,
    args: Vec<NamedValue>,
}

impl SqlBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn args(&self) -> &[NamedValue] {
        &self.args
    }

    pub fn into_parts(self) -> (String, Vec<NamedValue>) {
        (self.sql, self.args)
    }

    fn push_positional(&mut self, value: DriverValue) {
        self.sql.push('?');
        let ordinal = self.args.len() + 1;
        self.args.push(NamedValue::positional(ordinal, value));
    }

    fn write_expr(&mut self, sql: &str, vars: &[BindVar]) {
        let mut vars = vars.iter();
        for c in sql.chars() {
            match (c, vars.len()) {
                ('?', n) if n > 0 => {
                    if let Some(var) = vars.next() {
                        self.add_var(var);
                    }
                }
                _ => self.sql.push(c),
            }
        }
    }
}

impl ClauseBuilder for SqlBuilder {
    fn write_str(&mut self, s: &str) {
        self.sql.push_str(s);
    }

    fn write_char(&mut self, c: char) {
        self.sql.push(c);
    }

    fn write_quoted(&mut self, name: &str) {
        for (i, part) in name.split('.').enumerate() {
            if i > 0 {
                self.sql.push('.');
            }
            self.sql.push('`');
            self.sql.push_str(&part.replace('`', "\\`"));
            self.sql.push('`');
        }
    }

    fn add_var(&mut self, var: &BindVar) {
        match var {
            BindVar::Named { name, value } => {
                self.sql.push('@');
                self.sql.push_str(name);
                let ordinal = self.args.len() + 1;
                let arg = NamedValue::named(name.clone(), ordinal, value.clone());
                self.args.push(arg);
            }
            BindVar::Column(name) | BindVar::Table(name) => self.write_quoted(name),
            BindVar::Expr { sql, vars } => self.write_expr(sql, vars),
            BindVar::Value(value) => self.push_positional(value.clone()),
            BindVar::Bytes(value) => self.push_positional(DriverValue::Bytes(value.clone())),
            BindVar::List(vars) => {
                self.sql.push('(');
                for (i, var) in vars.iter().enumerate() {
                    if i > 0 {
                        self.sql.push(',');
                    }
                    self.add_var(var);
                }
                self.sql.push(')');
            }
            BindVar::SubQuery { sql, vars } => {
                self.sql.push('(');
                self.write_expr(sql, vars);
                self.sql.push(')');
            }
        }
    }
}
