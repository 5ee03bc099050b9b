use std::fs;
use std::path::PathBuf;
use std::process;

use ariadne::{Color, Label, Report, ReportKind, Source};
use clap::Parser as ClapParser;

use typelens_common::AnnotationSource;
use typelens_inspect::lexer::Lexer;
use typelens_inspect::parser::Parser;
use typelens_inspect::{extract_literal_values, inspect_annotation, AliasPolicy};

/// Annotation inspector.
///
/// Parses a type annotation and reduces it to a normalized form.
#[derive(ClapParser)]
#[command(
    name = "typelens",
    version,
    about,
    long_about = "Annotation inspector.\n\nParses an annotation expression (optionally preceded by `type Name = ...;`\nalias declarations) and prints the unwrapped type, its qualifiers and its\nmetadata as JSON.\n\nExamples:\n  typelens \"Final[Annotated[int, 'unit']]\"\n  typelens --source class \"ClassVar[list[int]]\"\n  typelens --literals \"Literal[1, 2, None]\"\n  typelens --file field.ann --aliases lenient"
)]
struct Cli {
    /// Annotation expression to inspect.
    expr: Option<String>,

    /// Read the annotation from a file instead.
    #[arg(short, long, conflicts_with = "expr")]
    file: Option<PathBuf>,

    /// Annotation source context, controlling which qualifiers are allowed
    /// (assignment, class, typed_dict, named_tuple, function, any, bare).
    #[arg(short, long, default_value = "any", value_parser = parse_source)]
    source: AnnotationSource,

    /// Lazy type alias handling: keep, lenient or eager.
    #[arg(long, default_value = "eager", value_parser = parse_aliases)]
    aliases: AliasPolicy,

    /// Extract the values of a literal set instead of inspecting the
    /// annotation.
    #[arg(long)]
    literals: bool,

    /// With --literals, check values against the legal literal kinds.
    #[arg(long = "type-check")]
    type_check: bool,

    /// Emit the token stream to stdout (debug).
    #[arg(long = "emit-tokens")]
    emit_tokens: bool,

    /// Emit the parsed expression tree to stdout (debug).
    #[arg(long = "emit-expr")]
    emit_expr: bool,
}

fn parse_source(s: &str) -> Result<AnnotationSource, String> {
    s.parse()
}

fn parse_aliases(s: &str) -> Result<AliasPolicy, String> {
    s.parse()
}

fn main() {
    let cli = Cli::parse();

    let (source_text, input_name) = match (&cli.expr, &cli.file) {
        (Some(expr), _) => (expr.clone(), "<annotation>".to_string()),
        (_, Some(path)) => match fs::read_to_string(path) {
            Ok(text) => (text, path.display().to_string()),
            Err(e) => {
                eprintln!("error: could not read '{}': {}", path.display(), e);
                process::exit(1);
            }
        },
        (Option::None, Option::None) => {
            eprintln!("error: provide an annotation expression or --file");
            process::exit(1);
        }
    };

    // === Lexer ===
    let (tokens, lex_diags) = Lexer::new(&source_text).tokenize();

    if lex_diags.has_errors() {
        for diag in lex_diags.diagnostics() {
            print_diagnostic(diag, &source_text, &input_name);
        }
        process::exit(1);
    }

    if cli.emit_tokens {
        for token in &tokens {
            println!(
                "{:>3}:{:<3} {:?} {:?}",
                token.span.start.line, token.span.start.column, token.kind, token.lexeme,
            );
        }
        return;
    }

    // === Parser ===
    let (module, parse_diags) = Parser::new(tokens).parse();

    if parse_diags.has_errors() {
        for diag in parse_diags.diagnostics() {
            print_diagnostic(diag, &source_text, &input_name);
        }
        process::exit(1);
    }

    for diag in parse_diags.diagnostics() {
        if !diag.is_error() {
            print_diagnostic(diag, &source_text, &input_name);
        }
    }

    let Some(expr) = module.expr else {
        eprintln!("error: input contains no annotation expression");
        process::exit(1);
    };

    if cli.emit_expr {
        println!("{:#?}", expr);
        return;
    }

    // === Inspection ===
    if cli.literals {
        match extract_literal_values(&expr, cli.type_check, cli.aliases) {
            Ok(values) => print_json(&values),
            Err(e) => {
                eprintln!("error: {}", e);
                process::exit(1);
            }
        }
    } else {
        match inspect_annotation(&expr, cli.source, cli.aliases) {
            Ok(result) => print_json(&result),
            Err(e) => {
                eprintln!("error: {}", e);
                process::exit(1);
            }
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("error: failed to serialize result: {}", e);
            process::exit(1);
        }
    }
}

fn print_diagnostic(diag: &typelens_common::Diagnostic, source: &str, input_name: &str) {
    let kind = if diag.is_error() {
        ReportKind::Error
    } else {
        ReportKind::Warning
    };

    if let Some(ref span) = diag.span {
        let start = span.start.offset as usize;
        let end = (span.end.offset as usize).max(start + 1);

        let color = if diag.is_error() {
            Color::Red
        } else {
            Color::Yellow
        };

        let mut report = Report::build(kind, input_name, start)
            .with_message(&diag.message)
            .with_label(
                Label::new((input_name, start..end))
                    .with_message(&diag.message)
                    .with_color(color),
            );

        for related in &diag.related {
            let rs = related.span.start.offset as usize;
            let re = (related.span.end.offset as usize).max(rs + 1);
            report = report.with_label(
                Label::new((input_name, rs..re))
                    .with_message(&related.message)
                    .with_color(Color::Blue),
            );
        }

        if let Some(ref suggestion) = diag.suggestion {
            report = report.with_help(suggestion);
        }

        let _ = report
            .finish()
            .eprint((input_name, Source::from(source)));
    } else {
        eprintln!("{}", diag);
    }
}
