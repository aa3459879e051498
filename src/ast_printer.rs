use crate::expr::{Expr, Lambda, LiteralValue};
use crate::stmt::Stmt;

/// Renders syntax trees in parenthesized prefix form, e.g. `(+ 1.0 (group x))`.
/// Absent optional parts print as `_`.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(expr: &Expr) -> String {
        match expr {
            // ── literals ────────────────────────────────────────────────
            Expr::Literal(lit) => match lit {
                LiteralValue::True => "true".into(),

                LiteralValue::False => "false".into(),

                LiteralValue::Nil => "nil".into(),

                LiteralValue::Str(s) => s.to_string(),

                LiteralValue::Number(n) => {
                    if n.fract() == 0.0 {
                        // 3 → 3.0
                        format!("{:.1}", n)
                    } else {
                        n.to_string()
                    }
                }
            },

            Expr::Group(inner) => format!("(group {})", Self::print(inner)),

            Expr::Unary { operator, right } => {
                format!("({} {})", operator.lexeme, Self::print(right))
            }

            Expr::Binary {
                left,
                operator,
                right,
            } => format!(
                "({} {} {})",
                operator.lexeme,
                Self::print(left),
                Self::print(right)
            ),

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
                ..
            } => format!(
                "(?: {} {} {})",
                Self::print(condition),
                Self::print(then_branch),
                Self::print(else_branch)
            ),

            Expr::Variable(name) => name.lexeme.to_string(),

            Expr::Assignment { name, value } => {
                format!("(= {} {})", name.lexeme, Self::print(value))
            }

            Expr::Call {
                callee, arguments, ..
            } => Self::list(
                format!("call {}", Self::print(callee)),
                arguments.iter().map(Self::print),
            ),

            Expr::Get { object, name } => format!("(. {} {})", Self::print(object), name.lexeme),

            Expr::Set {
                object,
                name,
                value,
            } => format!(
                "(.= {} {} {})",
                Self::print(object),
                name.lexeme,
                Self::print(value)
            ),

            Expr::Lambda(lambda) => Self::lambda(lambda),

            Expr::Prototype(prototype) => {
                let head: String = match &prototype.parent {
                    Some(parent) => format!("prototype from {}", Self::print(parent)),
                    None => "prototype".to_owned(),
                };

                Self::list(
                    head,
                    prototype
                        .members
                        .iter()
                        .map(|m| {
                            let marker: &str = if m.private { "private " } else { "" };

                            format!("({}{} {})", marker, m.name.lexeme, Self::print(&m.value))
                        }),
                )
            }
        }
    }

    pub fn print_stmt(stmt: &Stmt) -> String {
        match stmt {
            Stmt::Expression(expr) => format!("(; {})", Self::print(expr)),

            Stmt::Variable {
                name,
                initializer,
                constant,
            } => format!(
                "({} {} {})",
                if *constant { "const" } else { "var" },
                name.lexeme,
                Self::optional(initializer.as_ref())
            ),

            Stmt::Scope(statements) => {
                Self::list("scope".to_owned(), statements.iter().map(Self::print_stmt))
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => format!(
                "(if {} {} {})",
                Self::print(condition),
                Self::print_stmt(then_branch),
                else_branch
                    .as_deref()
                    .map_or_else(|| "_".to_owned(), Self::print_stmt)
            ),

            Stmt::For {
                initializer,
                condition,
                increment,
                body,
            } => format!(
                "(for {} {} {} {})",
                initializer
                    .as_deref()
                    .map_or_else(|| "_".to_owned(), Self::print_stmt),
                Self::optional(condition.as_ref()),
                Self::optional(increment.as_ref()),
                Self::print_stmt(body)
            ),

            Stmt::Return { value, .. } => format!("(return {})", Self::optional(value.as_ref())),
        }
    }

    /// One line per top-level statement.
    pub fn print_program(statements: &[Stmt]) -> String {
        statements
            .iter()
            .map(Self::print_stmt)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn lambda(lambda: &Lambda) -> String {
        let params: Vec<String> = lambda
            .params
            .iter()
            .map(|p| match &p.default {
                Some(default) => format!("{}={}", p.name.lexeme, Self::print(default)),
                None => p.name.lexeme.to_string(),
            })
            .collect();

        Self::list(
            format!("lambda ({})", params.join(" ")),
            lambda.body.iter().map(Self::print_stmt),
        )
    }

    fn optional(expr: Option<&Expr>) -> String {
        expr.map_or_else(|| "_".to_owned(), Self::print)
    }

    fn list(head: String, items: impl Iterator<Item = String>) -> String {
        let mut s: String = format!("({}", head);
        for item in items {
            s.push(' ');
            s.push_str(&item);
        }
        s.push(')');
        s
    }
}
