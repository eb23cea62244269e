// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Runtime statement assembly.
//!
//! Statements whose text is fully known at compile time are emitted as a
//! `const` string. Everything else (runtime predicates, sort lists, `IN`
//! lists, dynamic fragments, batch rows, conditional blocks) is assembled by a
//! [`StatementBuilder`], which keeps marker numbering and parameter
//! de-duplication consistent with the dialect's parameter style.

use crate::{
    AsyncCommand, Command, Dialect, Entity, Error, Predicate, Sort, ToValue, Value,
    dialect::DialectSpec
};

/// One bound parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Logical, dialect-independent name.
    pub name: String,

    /// Bound value.
    pub value: Value
}

/// Statement text plus its parameters in marker order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statement {
    /// SQL text.
    pub text: String,

    /// Parameters in marker order.
    pub parameters: Vec<Parameter>
}

impl Statement {
    /// Copy text and parameters onto a synchronous command.
    pub fn bind<C: Command>(&self, command: &mut C) {
        command.set_text(&self.text);
        for parameter in &self.parameters {
            command.add_parameter(&parameter.name, parameter.value.clone());
        }
    }

    /// Copy text and parameters onto an asynchronous command.
    pub fn bind_async<C: AsyncCommand>(&self, command: &mut C) {
        command.set_text(&self.text);
        for parameter in &self.parameters {
            command.add_parameter(&parameter.name, parameter.value.clone());
        }
    }
}

/// Incremental statement writer.
///
/// ```rust
/// use sqlstencil_core::{Dialect, StatementBuilder};
///
/// let mut builder = StatementBuilder::new(Dialect::Postgres);
/// builder.push_sql("SELECT 1 WHERE a = ");
/// builder.push_param("a", 1_i64);
/// builder.push_sql(" OR b = ");
/// builder.push_param("a", 1_i64);
/// let statement = builder.finish();
/// assert_eq!(statement.text, "SELECT 1 WHERE a = $1 OR b = $1");
/// assert_eq!(statement.parameters.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct StatementBuilder {
    dialect: Dialect,
    spec:    &'static DialectSpec,
    text:    String,
    params:  Vec<Parameter>,
    markers: Vec<(String, String)>
}

impl StatementBuilder {
    /// Start an empty statement.
    #[must_use]
    pub fn new(dialect: Dialect) -> Self {
        Self::with_capacity(dialect, 128)
    }

    /// Start an empty statement with preallocated text capacity.
    #[must_use]
    pub fn with_capacity(dialect: Dialect, capacity: usize) -> Self {
        Self {
            dialect,
            spec: dialect.spec(),
            text: String::with_capacity(capacity),
            params: Vec::new(),
            markers: Vec::new()
        }
    }

    /// Target dialect.
    #[must_use]
    pub const fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Number of parameters bound so far.
    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.params.len()
    }

    /// Append literal SQL.
    pub fn push_sql(&mut self, sql: &str) -> &mut Self {
        self.text.push_str(sql);
        self
    }

    /// Append a marker bound to `value` under `name`.
    ///
    /// Positional and named styles reuse the marker of an earlier parameter
    /// with the same name; the anonymous style binds every occurrence.
    pub fn push_param<V: ToValue>(&mut self, name: &str, value: V) -> &mut Self {
        if !self.spec.repeats_parameters()
            && let Some((_, marker)) = self.markers.iter().find(|(n, _)| n == name)
        {
            self.text.push_str(marker);
            return self;
        }
        let marker = self.spec.marker(name, self.params.len() + 1);
        self.text.push_str(&marker);
        self.params.push(Parameter {
            name:  name.to_string(),
            value: value.to_value()
        });
        self.markers.push((name.to_string(), marker));
        self
    }

    /// Append a marker for the `index`-th value of a repeated parameter.
    pub fn push_indexed_param<V: ToValue>(
        &mut self,
        name: &str,
        index: usize,
        value: V
    ) -> &mut Self {
        let name = format!("{name}_{index}");
        self.push_param(&name, value)
    }

    /// Append a marker under a name derived from `base` that no earlier
    /// parameter uses.
    pub fn push_fresh_param<V: ToValue>(&mut self, base: &str, value: V) -> &mut Self {
        let name = self.fresh_name(base);
        self.push_param(&name, value)
    }

    /// Append `column IN (…)` for `values`, or a constant predicate when
    /// `values` is empty.
    pub fn push_in<I>(&mut self, column: &str, name: &str, values: I, negated: bool) -> &mut Self
    where
        I: IntoIterator,
        I::Item: ToValue
    {
        let values: Vec<Value> = values.into_iter().map(|v| v.to_value()).collect();
        self.push_in_values(column, name, values, negated)
    }

    pub(crate) fn push_in_values(
        &mut self,
        column: &str,
        name: &str,
        values: Vec<Value>,
        negated: bool
    ) -> &mut Self {
        if values.is_empty() {
            let constant = self.spec.constant_predicate(negated);
            return self.push_sql(constant);
        }
        self.text.push_str(column);
        self.text.push_str(if negated { " NOT IN (" } else { " IN (" });
        for (index, value) in values.into_iter().enumerate() {
            if index > 0 {
                self.text.push_str(", ");
            }
            self.push_fresh_param(&format!("{name}_{index}"), value);
        }
        self.text.push(')');
        self
    }

    /// Append a runtime predicate, binding one parameter per value.
    ///
    /// `columns` holds the rendered column for every mapped member, in member
    /// order.
    ///
    /// # Errors
    ///
    /// [`Error::ColumnNotFound`] when the predicate references a member
    /// outside `columns`.
    pub fn push_predicate<E: Entity>(
        &mut self,
        name: &str,
        predicate: &Predicate<E>,
        columns: &[&str]
    ) -> Result<&mut Self, Error> {
        predicate.render(self, name, columns)?;
        Ok(self)
    }

    /// Append `ORDER BY …` for a runtime sort; nothing for an empty sort.
    ///
    /// # Errors
    ///
    /// [`Error::ColumnNotFound`] when the sort references a member outside
    /// `columns`.
    pub fn push_sort<E: Entity>(
        &mut self,
        sort: &Sort<E>,
        columns: &[&str]
    ) -> Result<&mut Self, Error> {
        sort.render(self, columns)?;
        Ok(self)
    }

    /// Append the escape clause for a generated `LIKE`.
    pub fn push_like_escape(&mut self) -> &mut Self {
        self.push_sql(self.spec.like_escape)
    }

    /// Text written so far.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Finish the statement.
    #[must_use]
    pub fn finish(self) -> Statement {
        Statement {
            text:       self.text,
            parameters: self.params
        }
    }

    fn fresh_name(&self, base: &str) -> String {
        if !self.is_taken(base) {
            return base.to_string();
        }
        let mut suffix = 1_usize;
        loop {
            let candidate = format!("{base}_{suffix}");
            if !self.is_taken(&candidate) {
                return candidate;
            }
            suffix += 1;
        }
    }

    fn is_taken(&self, name: &str) -> bool {
        self.params.iter().any(|p| p.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_markers_dedupe() {
        let mut b = StatementBuilder::new(Dialect::SqlServer);
        b.push_sql("a = ").push_param("x", 1_i64);
        b.push_sql(" AND b = ").push_param("x", 1_i64);
        let s = b.finish();
        assert_eq!(s.text, "a = @x AND b = @x");
        assert_eq!(s.parameters.len(), 1);
    }

    #[test]
    fn anonymous_markers_repeat() {
        let mut b = StatementBuilder::new(Dialect::MySql);
        b.push_sql("a = ").push_param("x", 1_i64);
        b.push_sql(" AND b = ").push_param("x", 1_i64);
        let s = b.finish();
        assert_eq!(s.text, "a = ? AND b = ?");
        assert_eq!(s.parameters.len(), 2);
        assert!(s.parameters.iter().all(|p| p.name == "x"));
    }

    #[test]
    fn positional_markers_number_in_order() {
        let mut b = StatementBuilder::new(Dialect::Postgres);
        b.push_param("a", 1_i64).push_sql(", ").push_param("b", 2_i64);
        assert_eq!(b.finish().text, "$1, $2");
    }

    #[test]
    fn empty_in_list_is_constant() {
        let mut b = StatementBuilder::new(Dialect::Postgres);
        b.push_in("\"id\"", "ids", Vec::<i64>::new(), false);
        assert_eq!(b.text(), "1 = 0");
        let mut b = StatementBuilder::new(Dialect::Postgres);
        b.push_in("\"id\"", "ids", Vec::<i64>::new(), true);
        assert_eq!(b.text(), "1 = 1");
    }

    #[test]
    fn in_list_binds_each_value() {
        let mut b = StatementBuilder::new(Dialect::Oracle);
        b.push_in("\"ID\"", "ids", [3_i64, 4], false);
        let s = b.finish();
        assert_eq!(s.text, "\"ID\" IN (:ids_0, :ids_1)");
        assert_eq!(s.parameters[1].value, Value::Int(4));
    }

    #[test]
    fn fresh_names_avoid_collisions() {
        let mut b = StatementBuilder::new(Dialect::Sqlite);
        b.push_param("v", 1_i64);
        b.push_sql(" ").push_fresh_param("v", 2_i64);
        let s = b.finish();
        assert_eq!(s.text, "@v @v_1");
        assert_eq!(s.parameters.len(), 2);
    }

    #[test]
    fn indexed_params_are_distinct() {
        let mut b = StatementBuilder::new(Dialect::Postgres);
        b.push_indexed_param("name", 0, "a");
        b.push_sql(", ").push_indexed_param("name", 1, "b");
        let s = b.finish();
        assert_eq!(s.text, "$1, $2");
        assert_eq!(s.parameters[0].name, "name_0");
    }
}
