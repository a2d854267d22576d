//! Rendering conditions as DynamoDB expressions.
//!
//! Attribute names always go through `#n<i>` placeholders and values through
//! `:v<i>`, so reserved words and arbitrary values are safe.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue as DynamoValue;
use microposts_core::storage::Condition;

use super::conversions::value_to_dynamo;

/// A rendered expression and its placeholder bindings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expression {
    pub text: String,
    pub names: HashMap<String, String>,
    pub values: HashMap<String, DynamoValue>,
}

impl Expression {
    /// Renders `condition` with fresh placeholders.
    pub fn from_condition(condition: &Condition) -> Self {
        let mut builder = ExpressionBuilder::default();
        let text = builder.render(condition);
        builder.finish(text)
    }

    /// Placeholder values, or `None` when the expression binds none.
    pub fn values(&self) -> Option<HashMap<String, DynamoValue>> {
        (!self.values.is_empty()).then(|| self.values.clone())
    }
}

#[derive(Debug, Default)]
struct ExpressionBuilder {
    names: HashMap<String, String>,
    values: HashMap<String, DynamoValue>,
}

impl ExpressionBuilder {
    fn name(&mut self, attribute: &str) -> String {
        if let Some((placeholder, _)) = self.names.iter().find(|(_, a)| *a == attribute) {
            return placeholder.clone();
        }
        let placeholder = format!("#n{}", self.names.len());
        self.names.insert(placeholder.clone(), attribute.to_string());
        placeholder
    }

    fn value(&mut self, value: DynamoValue) -> String {
        let placeholder = format!(":v{}", self.values.len());
        self.values.insert(placeholder.clone(), value);
        placeholder
    }

    fn render(&mut self, condition: &Condition) -> String {
        match condition {
            Condition::AttributeExists(attribute) => {
                format!("attribute_exists({})", self.name(attribute))
            }
            Condition::AttributeNotExists(attribute) => {
                format!("attribute_not_exists({})", self.name(attribute))
            }
            Condition::Equals(attribute, value) => {
                let name = self.name(attribute);
                let value = self.value(value_to_dynamo(value));
                format!("{name} = {value}")
            }
            Condition::BeginsWith(attribute, prefix) => {
                let name = self.name(attribute);
                let value = self.value(DynamoValue::S(prefix.clone()));
                format!("begins_with({name}, {value})")
            }
            Condition::And(parts) => self.join(parts, " AND "),
            Condition::Or(parts) => self.join(parts, " OR "),
        }
    }

    fn join(&mut self, parts: &[Condition], separator: &str) -> String {
        let rendered: Vec<String> = parts.iter().map(|part| self.render(part)).collect();
        format!("({})", rendered.join(separator))
    }

    fn finish(self, text: String) -> Expression {
        Expression {
            text,
            names: self.names,
            values: self.values,
        }
    }
}
