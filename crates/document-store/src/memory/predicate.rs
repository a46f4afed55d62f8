//! Equality predicates understood by the in-memory store.
//!
//! Supported grammar (keywords are case-insensitive):
//!
//! ```text
//! SELECT * FROM <alias> [WHERE <alias>.<field> = <operand> (AND <alias>.<field> = <operand>)*]
//! operand := @<param> | '<literal>' | "<literal>"
//! ```
//!
//! Quoted literals may contain spaces and `=`; they cannot contain their own
//! quote character.

use crate::error::StoreError;
use crate::query::QuerySpec;
use serde_json::Value;

/// A conjunction of `field = value` conditions with parameters bound.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    conditions: Vec<(String, Value)>,
}

impl Predicate {
    /// Parse a query and bind its parameters.
    pub fn parse(spec: &QuerySpec) -> Result<Self, StoreError> {
        let owned = tokenize(&spec.query)?;
        let tokens: Vec<&str> = owned.iter().map(String::as_str).collect();

        let alias = match tokens.as_slice() {
            [select, star, from, alias, ..]
                if select.eq_ignore_ascii_case("SELECT")
                    && *star == "*"
                    && from.eq_ignore_ascii_case("FROM") =>
            {
                *alias
            }
            _ => return Err(bad(&spec.query, "expected SELECT * FROM <alias>")),
        };

        let rest = &tokens[4..];
        if rest.is_empty() {
            return Ok(Self {
                conditions: Vec::new(),
            });
        }
        if !rest[0].eq_ignore_ascii_case("WHERE") {
            return Err(bad(&spec.query, "expected WHERE"));
        }

        let mut conditions = Vec::new();
        for (i, clause) in rest[1..].split(|t| t.eq_ignore_ascii_case("AND")).enumerate() {
            let [field, "=", operand] = clause else {
                return Err(bad(
                    &spec.query,
                    &format!("condition {} is not of the form <alias>.<field> = <operand>", i + 1),
                ));
            };

            let field = field
                .strip_prefix(alias)
                .and_then(|f| f.strip_prefix('.'))
                .filter(|f| !f.is_empty())
                .ok_or_else(|| bad(&spec.query, &format!("unknown field reference '{field}'")))?;

            conditions.push((field.to_string(), resolve_operand(spec, operand)?));
        }

        Ok(Self { conditions })
    }

    /// Whether a document satisfies every condition.
    pub fn matches(&self, document: &Value) -> bool {
        self.conditions
            .iter()
            .all(|(field, expected)| document.get(field) == Some(expected))
    }

    /// Field names referenced by the predicate.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.conditions.iter().map(|(f, _)| f.as_str())
    }
}

/// Split on whitespace, with `=` as its own token and quoted literals kept
/// whole (quotes included).
fn tokenize(query: &str) -> Result<Vec<String>, StoreError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = query.chars();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                current.push(c);
                loop {
                    match chars.next() {
                        Some(next) => {
                            current.push(next);
                            if next == c {
                                break;
                            }
                        }
                        None => return Err(bad(query, "unterminated string literal")),
                    }
                }
            }
            '=' => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                tokens.push("=".to_string());
            }
            c if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    Ok(tokens)
}

fn resolve_operand(spec: &QuerySpec, operand: &str) -> Result<Value, StoreError> {
    if operand.starts_with('@') {
        return spec
            .get_param(operand)
            .cloned()
            .ok_or_else(|| bad(&spec.query, &format!("parameter {operand} is not bound")));
    }

    for quote in ['\'', '"'] {
        if let Some(literal) = operand
            .strip_prefix(quote)
            .and_then(|o| o.strip_suffix(quote))
        {
            return Ok(Value::String(literal.to_string()));
        }
    }

    Err(bad(&spec.query, &format!("unsupported operand '{operand}'")))
}

fn bad(query: &str, reason: &str) -> StoreError {
    StoreError::BadRequest(format!("unsupported query '{query}': {reason}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_select_all() {
        let predicate = Predicate::parse(&QuerySpec::new("SELECT * FROM c")).unwrap();
        assert!(predicate.matches(&json!({"id": "x"})));
        assert_eq!(predicate.fields().count(), 0);
    }

    #[test]
    fn test_parameters() {
        let spec = QuerySpec::new(
            "SELECT * FROM c WHERE c.tenantId = @tenantId AND c.userId = @userId",
        )
        .param("@tenantId", "LocalShops-SME")
        .param("@userId", "user-42");
        let predicate = Predicate::parse(&spec).unwrap();

        assert_eq!(predicate.fields().collect::<Vec<_>>(), vec!["tenantId", "userId"]);
        assert!(predicate.matches(&json!({"tenantId": "LocalShops-SME", "userId": "user-42"})));
        assert!(!predicate.matches(&json!({"tenantId": "LocalShops-SME", "userId": "user-43"})));
        assert!(!predicate.matches(&json!({"tenantId": "LocalShops-SME"})));
    }

    #[test]
    fn test_literals_and_spacing() {
        let spec = QuerySpec::new("select * from s where s.activity='login'");
        let predicate = Predicate::parse(&spec).unwrap();
        assert!(predicate.matches(&json!({"activity": "login"})));
    }

    #[test]
    fn test_literals_with_spaces_and_equals() {
        let spec = QuerySpec::new("SELECT * FROM c WHERE c.tenantId = 'Big Co' AND c.activity=\"a=b\"");
        let predicate = Predicate::parse(&spec).unwrap();

        assert!(predicate.matches(&json!({"tenantId": "Big Co", "activity": "a=b"})));
        assert!(!predicate.matches(&json!({"tenantId": "Big", "activity": "a=b"})));
    }

    #[test]
    fn test_rejects_unterminated_literal() {
        let spec = QuerySpec::new("SELECT * FROM c WHERE c.tenantId = 'Big Co");
        assert!(matches!(Predicate::parse(&spec), Err(StoreError::BadRequest(_))));
    }

    #[test]
    fn test_rejects_unsupported_queries() {
        let cases = [
            QuerySpec::new("SELECT c.id FROM c"),
            QuerySpec::new("SELECT * FROM c ORDER BY c.ts"),
            QuerySpec::new("SELECT * FROM c WHERE c.tenantId > @t").param("@t", "x"),
            QuerySpec::new("SELECT * FROM c WHERE d.tenantId = @t").param("@t", "x"),
            QuerySpec::new("SELECT * FROM c WHERE c.tenantId = @missing"),
            QuerySpec::new("SELECT * FROM c WHERE c.tenantId = @t OR c.userId = @t").param("@t", "x"),
        ];

        for spec in cases {
            assert!(
                matches!(Predicate::parse(&spec), Err(StoreError::BadRequest(_))),
                "accepted {}",
                spec.query
            );
        }
    }
}
