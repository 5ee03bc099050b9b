use std::collections::HashMap;
use std::sync::Arc;

use typelens_common::{Diagnostic, Span, TypeAlias, TypeParam};

use super::Parser;
use crate::lexer::TokenKind;

/// Declared aliases visible to subsequent expressions.
///
/// References resolve against aliases declared earlier in the input;
/// re-declaring a name is an error. An alias whose body cannot be resolved
/// is constructed programmatically via [`TypeAlias::undefined`]; the textual
/// surface always produces defined bodies.
#[derive(Debug, Default)]
pub(super) struct AliasTable {
    entries: HashMap<String, (Arc<TypeAlias>, Span)>,
}

impl AliasTable {
    /// Register an alias. Returns `Err` with the previous declaration's span
    /// on duplicate.
    pub(super) fn define(&mut self, alias: Arc<TypeAlias>, span: Span) -> Result<(), Span> {
        if let Some((_, prev)) = self.entries.get(&alias.name) {
            return Err(*prev);
        }
        self.entries.insert(alias.name.clone(), (alias, span));
        Ok(())
    }

    pub(super) fn get(&self, name: &str) -> Option<&Arc<TypeAlias>> {
        self.entries.get(name).map(|(alias, _)| alias)
    }
}

impl Parser {
    /// Parse `type Name[params] = value;`.
    pub(super) fn parse_alias_decl(&mut self) -> Option<Arc<TypeAlias>> {
        self.expect(TokenKind::Type)?;
        let (name, name_span) = {
            let token = self.expect(TokenKind::Identifier)?;
            (token.lexeme.clone(), token.span)
        };

        // Parameters enter scope as they are parsed, so a default may
        // reference parameters declared before it.
        self.type_params.clear();
        if self.eat(TokenKind::LeftBracket) {
            while self.peek() != TokenKind::RightBracket {
                let param = self.parse_type_param()?;
                self.type_params.push(param);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RightBracket)?;
        }

        self.expect(TokenKind::Equal)?;
        let value = self.parse_expr();
        let params = std::mem::take(&mut self.type_params);
        let value = value?;
        self.expect(TokenKind::Semicolon)?;

        let alias = Arc::new(TypeAlias::new(name, params, value));
        if let Err(prev) = self.aliases.define(alias.clone(), name_span) {
            self.diagnostics.report(
                Diagnostic::error(format!("type alias '{}' is already declared", alias.name))
                    .with_span(name_span)
                    .with_related(prev, "first declared here"),
            );
        }
        Some(alias)
    }

    fn parse_type_param(&mut self) -> Option<TypeParam> {
        let param = if self.eat(TokenKind::StarStar) {
            let name = self.expect(TokenKind::Identifier)?.lexeme.clone();
            TypeParam::param_spec(name)
        } else if self.eat(TokenKind::Star) {
            let name = self.expect(TokenKind::Identifier)?.lexeme.clone();
            TypeParam::type_var_tuple(name)
        } else {
            let name = self.expect(TokenKind::Identifier)?.lexeme.clone();
            TypeParam::type_var(name)
        };

        if self.eat(TokenKind::Equal) {
            let default = self.parse_expr()?;
            Some(param.with_default(default))
        } else {
            Some(param)
        }
    }
}

#[cfg(test)]
mod tests {
    use typelens_common::{TypeExpr, TypeParamKind};

    use crate::lexer::Lexer;
    use crate::parser::Parser;

    #[test]
    fn alias_with_params_and_default() {
        let (tokens, _) = Lexer::new("type Pair[T, U = int] = dict[T, U];").tokenize();
        let (module, diags) = Parser::new(tokens).parse();
        assert!(!diags.has_errors(), "{:?}", diags.diagnostics());

        let alias = &module.aliases[0];
        assert_eq!(alias.name, "Pair");
        assert_eq!(alias.type_params.len(), 2);
        assert_eq!(alias.type_params[0].kind, TypeParamKind::TypeVar);
        assert!(alias.type_params[0].default.is_none());
        assert_eq!(
            alias.type_params[1].default.as_deref(),
            Some(&TypeExpr::name("int"))
        );
    }

    #[test]
    fn variadic_and_param_spec_params() {
        let (tokens, _) = Lexer::new("type F[*Ts, **P] = tuple[Ts, P];").tokenize();
        let (module, diags) = Parser::new(tokens).parse();
        assert!(!diags.has_errors(), "{:?}", diags.diagnostics());

        let alias = &module.aliases[0];
        assert_eq!(alias.type_params[0].kind, TypeParamKind::TypeVarTuple);
        assert_eq!(alias.type_params[1].kind, TypeParamKind::ParamSpec);
    }

    #[test]
    fn default_may_reference_earlier_param() {
        let (tokens, _) = Lexer::new("type M[K, V = K] = dict[K, V];").tokenize();
        let (module, diags) = Parser::new(tokens).parse();
        assert!(!diags.has_errors(), "{:?}", diags.diagnostics());

        let alias = &module.aliases[0];
        match alias.type_params[1].default.as_deref() {
            Some(TypeExpr::TypeParam(p)) => assert_eq!(p.name, "K"),
            other => panic!("expected type parameter default, got {:?}", other),
        }
    }

    #[test]
    fn duplicate_alias_is_reported() {
        let (tokens, _) = Lexer::new("type A = int; type A = str;").tokenize();
        let (_, diags) = Parser::new(tokens).parse();
        assert!(diags.has_errors());
        let diag = &diags.diagnostics()[0];
        assert!(diag.message.contains("already declared"));
        assert_eq!(diag.related.len(), 1);
    }

    #[test]
    fn missing_semicolon_is_reported() {
        let (tokens, _) = Lexer::new("type A = int").tokenize();
        let (_, diags) = Parser::new(tokens).parse();
        assert!(diags.has_errors());
    }
}
