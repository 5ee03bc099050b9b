use serde_json::Value;

use typelens_common::{
    legacy_origin, LiteralMember, LiteralValue, Qualifier, Span, TypeExpr, TypeParamKind,
};

use super::Parser;
use crate::lexer::TokenKind;

impl Parser {
    /// Parse a full annotation expression. `|` binds loosest and builds a
    /// union by pairwise combination.
    pub(super) fn parse_expr(&mut self) -> Option<TypeExpr> {
        let first = self.parse_unary()?;
        if self.peek() != TokenKind::Pipe {
            return Some(first);
        }
        let mut alternatives = vec![first];
        while self.eat(TokenKind::Pipe) {
            alternatives.push(self.parse_unary()?);
        }
        Some(TypeExpr::union_of(alternatives))
    }

    fn parse_unary(&mut self) -> Option<TypeExpr> {
        if self.eat(TokenKind::Star) {
            let inner = self.parse_unary()?;
            return Some(TypeExpr::Unpacked(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Option<TypeExpr> {
        match self.peek() {
            TokenKind::Ellipsis => {
                self.advance();
                Some(TypeExpr::Ellipsis)
            }
            TokenKind::LeftBracket => {
                self.advance();
                let items = self.parse_args()?;
                Some(TypeExpr::ArgList(items))
            }
            // A quoted string in type position is a forward reference.
            TokenKind::StringLiteral => {
                let name = self.advance().lexeme.clone();
                Some(TypeExpr::forward_ref(name))
            }
            TokenKind::None => {
                self.advance();
                Some(TypeExpr::name("None"))
            }
            TokenKind::Identifier => self.parse_name(),
            _ => {
                let span = self.current_span();
                self.diagnostics.error(
                    format!("expected a type expression, found {:?}", self.peek()),
                    span,
                );
                None
            }
        }
    }

    fn parse_name(&mut self) -> Option<TypeExpr> {
        let first = self.advance().lexeme.clone();
        let mut segments = vec![first];
        while self.peek() == TokenKind::Dot {
            self.advance();
            let segment = self.expect(TokenKind::Identifier)?.lexeme.clone();
            segments.push(segment);
        }

        let mut expr = self.resolve_name(segments);
        while self.peek() == TokenKind::LeftBracket {
            expr = self.parse_subscript(expr)?;
        }
        Some(expr)
    }

    /// Resolve a (possibly dotted) name against the parameter scope, the
    /// alias table, the special forms and the legacy-alias table, in that
    /// order.
    fn resolve_name(&mut self, segments: Vec<String>) -> TypeExpr {
        if segments.len() == 1 {
            let name = segments.into_iter().next().unwrap();
            if let Some(param) = self.type_params.iter().find(|p| p.name == name) {
                return TypeExpr::TypeParam(param.clone());
            }
            if name == "Any" {
                return TypeExpr::Any;
            }
            if name == "Generic" {
                return TypeExpr::GenericMarker;
            }
            if let Some(qualifier) = Qualifier::from_surface(&name) {
                return TypeExpr::BareQualifier(qualifier);
            }
            if let Some(alias) = self.aliases.get(&name) {
                return TypeExpr::Alias(alias.clone());
            }
            if legacy_origin(&name).is_some() {
                return TypeExpr::LegacyAlias(name);
            }
            return TypeExpr::Name(name);
        }

        // `P.args` / `P.kwargs` capture forms of an in-scope parameter
        // specification.
        if segments.len() == 2 {
            let is_param_spec = self
                .type_params
                .iter()
                .any(|p| p.name == segments[0] && p.kind == TypeParamKind::ParamSpec);
            if is_param_spec {
                match segments[1].as_str() {
                    "args" => return TypeExpr::ParamSpecArgs(segments[0].clone()),
                    "kwargs" => return TypeExpr::ParamSpecKwargs(segments[0].clone()),
                    _ => {}
                }
            }
        }
        TypeExpr::Name(segments.join("."))
    }

    /// Parse one subscription layer. The opening bracket has not been
    /// consumed yet; how the arguments are read depends on the head.
    fn parse_subscript(&mut self, head: TypeExpr) -> Option<TypeExpr> {
        let open_span = self.current_span();
        self.expect(TokenKind::LeftBracket)?;

        match head {
            TypeExpr::BareQualifier(qualifier) => {
                let args = self.parse_args()?;
                if args.len() != 1 {
                    self.diagnostics.error(
                        format!("{} expects exactly one argument", qualifier.surface()),
                        open_span,
                    );
                    return Option::None;
                }
                Some(TypeExpr::qualified(
                    qualifier,
                    args.into_iter().next().unwrap(),
                ))
            }
            TypeExpr::Name(name) if name == "Annotated" => self.parse_annotated_args(open_span),
            TypeExpr::Name(name) if name == "Literal" => self.parse_literal_args(),
            TypeExpr::Name(name) if name == "Union" => {
                let args = self.parse_args()?;
                Some(TypeExpr::union_of(args))
            }
            TypeExpr::Name(name) if name == "Optional" => {
                let args = self.parse_args()?;
                if args.len() != 1 {
                    self.diagnostics
                        .error("Optional expects exactly one argument", open_span);
                    return Option::None;
                }
                Some(TypeExpr::union_of(vec![
                    args.into_iter().next().unwrap(),
                    TypeExpr::name("None"),
                ]))
            }
            // A subscripted legacy alias lowers to its modern origin.
            TypeExpr::LegacyAlias(name) => {
                let args = self.parse_args()?;
                let origin = legacy_origin(&name).map(str::to_owned).unwrap_or(name);
                Some(TypeExpr::generic(TypeExpr::Name(origin), args))
            }
            other => {
                let args = self.parse_args()?;
                Some(TypeExpr::generic(other, args))
            }
        }
    }

    /// Parse a comma-separated expression list up to the closing bracket.
    fn parse_args(&mut self) -> Option<Vec<TypeExpr>> {
        let mut args = Vec::new();
        if self.peek() != TokenKind::RightBracket {
            loop {
                args.push(self.parse_expr()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
                if self.peek() == TokenKind::RightBracket {
                    break;
                }
            }
        }
        self.expect(TokenKind::RightBracket)?;
        Some(args)
    }

    fn parse_annotated_args(&mut self, open_span: Span) -> Option<TypeExpr> {
        let inner = self.parse_expr()?;
        let mut metadata = Vec::new();
        while self.eat(TokenKind::Comma) {
            if self.peek() == TokenKind::RightBracket {
                break;
            }
            metadata.push(self.parse_metadata_value()?);
        }
        self.expect(TokenKind::RightBracket)?;
        if metadata.is_empty() {
            self.diagnostics.error(
                "Annotated requires a type and at least one metadata argument",
                open_span,
            );
            return Option::None;
        }
        Some(TypeExpr::annotated(inner, metadata))
    }

    /// Metadata arguments are arbitrary values, not type expressions; the
    /// textual surface admits scalars.
    fn parse_metadata_value(&mut self) -> Option<Value> {
        match self.peek() {
            TokenKind::IntLiteral => {
                let (lexeme, span) = self.advance_lexeme();
                match lexeme.parse::<i64>() {
                    Ok(n) => Some(Value::from(n)),
                    Err(_) => {
                        self.diagnostics.error("integer literal out of range", span);
                        Option::None
                    }
                }
            }
            TokenKind::FloatLiteral => {
                let (lexeme, span) = self.advance_lexeme();
                match lexeme.parse::<f64>() {
                    Ok(n) => Some(Value::from(n)),
                    Err(_) => {
                        self.diagnostics.error("invalid float literal", span);
                        Option::None
                    }
                }
            }
            TokenKind::StringLiteral => {
                let (lexeme, _) = self.advance_lexeme();
                Some(Value::String(lexeme))
            }
            TokenKind::True => {
                self.advance();
                Some(Value::Bool(true))
            }
            TokenKind::False => {
                self.advance();
                Some(Value::Bool(false))
            }
            TokenKind::None => {
                self.advance();
                Some(Value::Null)
            }
            _ => {
                let span = self.current_span();
                self.diagnostics.error(
                    "expected a metadata value (number, string, True, False or None)",
                    span,
                );
                Option::None
            }
        }
    }

    fn parse_literal_args(&mut self) -> Option<TypeExpr> {
        let mut members = Vec::new();
        if self.peek() != TokenKind::RightBracket {
            loop {
                members.push(self.parse_literal_member()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
                if self.peek() == TokenKind::RightBracket {
                    break;
                }
            }
        }
        self.expect(TokenKind::RightBracket)?;
        Some(TypeExpr::Literal(members))
    }

    /// Literal arguments are values: numbers, strings, bytes, booleans,
    /// `None`/`NoneType`, dotted enum members, or alias references.
    fn parse_literal_member(&mut self) -> Option<LiteralMember> {
        match self.peek() {
            TokenKind::IntLiteral => {
                let (lexeme, span) = self.advance_lexeme();
                match lexeme.parse::<i64>() {
                    Ok(n) => Some(LiteralMember::Value(LiteralValue::Int(n))),
                    Err(_) => {
                        self.diagnostics.error("integer literal out of range", span);
                        Option::None
                    }
                }
            }
            TokenKind::FloatLiteral => {
                let (lexeme, span) = self.advance_lexeme();
                match lexeme.parse::<f64>() {
                    Ok(n) => Some(LiteralMember::Value(LiteralValue::Float(n))),
                    Err(_) => {
                        self.diagnostics.error("invalid float literal", span);
                        Option::None
                    }
                }
            }
            TokenKind::StringLiteral => {
                let (lexeme, _) = self.advance_lexeme();
                Some(LiteralMember::Value(LiteralValue::Str(lexeme)))
            }
            TokenKind::BytesLiteral => {
                let (lexeme, _) = self.advance_lexeme();
                Some(LiteralMember::Value(LiteralValue::Bytes(
                    lexeme.into_bytes(),
                )))
            }
            TokenKind::True => {
                self.advance();
                Some(LiteralMember::Value(LiteralValue::Bool(true)))
            }
            TokenKind::False => {
                self.advance();
                Some(LiteralMember::Value(LiteralValue::Bool(false)))
            }
            TokenKind::None => {
                self.advance();
                Some(LiteralMember::Value(LiteralValue::None))
            }
            TokenKind::Identifier => {
                let (first, span) = self.advance_lexeme();
                if self.peek() == TokenKind::Dot {
                    let mut segments = vec![first];
                    while self.eat(TokenKind::Dot) {
                        let segment = self.expect(TokenKind::Identifier)?.lexeme.clone();
                        segments.push(segment);
                    }
                    let member = segments.pop().unwrap();
                    return Some(LiteralMember::Value(LiteralValue::EnumMember {
                        type_name: segments.join("."),
                        member,
                    }));
                }
                if first == "NoneType" {
                    return Some(LiteralMember::NoneType);
                }
                if let Some(alias) = self.aliases.get(&first) {
                    return Some(LiteralMember::Alias(alias.clone()));
                }
                self.diagnostics
                    .error(format!("'{}' is not a valid literal member", first), span);
                Option::None
            }
            _ => {
                let span = self.current_span();
                self.diagnostics.error("expected a literal value", span);
                Option::None
            }
        }
    }

    fn advance_lexeme(&mut self) -> (String, Span) {
        let token = self.advance();
        (token.lexeme.clone(), token.span)
    }
}
