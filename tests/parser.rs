use pretty_assertions::assert_eq;

use wick::ast_printer::AstPrinter;
use wick::diagnostics::{ErrorReporter, Stage};
use wick::parser::Parser;
use wick::scanner::scan_tokens;
use wick::stmt::Stmt;

fn parse(source: &str) -> (Vec<Stmt>, ErrorReporter) {
    let mut reporter = ErrorReporter::new();
    let tokens = scan_tokens(source, 1, &mut reporter);
    let statements = Parser::new(tokens, &mut reporter).parse();

    (statements, reporter)
}

/// Parses without errors and renders one line per statement.
fn render(source: &str) -> String {
    let (statements, reporter) = parse(source);

    assert!(
        reporter.diagnostics().is_empty(),
        "unexpected diagnostics: {:?}",
        reporter.diagnostics()
    );

    AstPrinter::print_program(&statements)
}

fn messages(reporter: &ErrorReporter) -> Vec<String> {
    reporter.diagnostics().iter().map(|d| d.to_string()).collect()
}

#[test]
fn factor_binds_tighter_than_term() {
    assert_eq!(render("1 + 2 * 3;"), "(; (+ 1.0 (* 2.0 3.0)))");
}

#[test]
fn binary_levels_are_left_associative() {
    assert_eq!(render("1 - 2 - 3;"), "(; (- (- 1.0 2.0) 3.0))");
    assert_eq!(render("a or b or c;"), "(; (or (or a b) c))");
}

#[test]
fn ternary_and_assignment_are_right_associative() {
    assert_eq!(render("a ? b : c ? d : e;"), "(; (?: a b (?: c d e)))");
    assert_eq!(render("a = b = 1;"), "(; (= a (= b 1.0)))");
}

#[test]
fn ternary_binds_looser_than_or() {
    assert_eq!(render("a or b ? 1 : 2;"), "(; (?: (or a b) 1.0 2.0))");
}

#[test]
fn unary_and_mod_keyword() {
    assert_eq!(render("-a * !b;"), "(; (* (- a) (! b)))");
    assert_eq!(render("7 mod 2;"), "(; (mod 7.0 2.0))");
}

#[test]
fn calls_and_gets_chain_left_to_right() {
    assert_eq!(render("a.b().c;"), "(; (. (call (. a b)) c))");
    assert_eq!(render("f(1)(2, 3);"), "(; (call (call f 1.0) 2.0 3.0))");
}

#[test]
fn property_assignment_becomes_set() {
    assert_eq!(render("a.b.c = 1;"), "(; (.= (. a b) c 1.0))");
}

#[test]
fn arrow_lambda_with_expression_body() {
    assert_eq!(
        render("var f = (a, b) -> a + b;"),
        "(var f (lambda (a b) (return (+ a b))))"
    );
    assert_eq!(render("var g = () -> 1;"), "(var g (lambda () (return 1.0)))");
}

#[test]
fn arrow_lambda_with_block_body() {
    assert_eq!(
        render("var f = (x) -> { return x; };"),
        "(var f (lambda (x) (return x)))"
    );
}

#[test]
fn parenthesized_identifier_is_a_group() {
    assert_eq!(render("(a);"), "(; (group a))");
}

#[test]
fn lambda_keyword_form() {
    assert_eq!(
        render("var f = lambda (x, y = 2) { return x * y; };"),
        "(var f (lambda (x y=2.0) (return (* x y))))"
    );
}

#[test]
fn subroutine_declaration_is_variable_sugar() {
    assert_eq!(
        render("subroutine add(a, b = 2) { return a + b; }"),
        "(var add (lambda (a b=2.0) (return (+ a b))))"
    );
}

#[test]
fn prototype_declaration_with_parent_and_members() {
    assert_eq!(
        render(
            "prototype Dog from Animal { var legs = 4; var name; subroutine bark() { print(\"woof\"); } }"
        ),
        "(var Dog (prototype from Animal (legs 4.0) (name nil) (bark (lambda () (; (call print woof))))))"
    );
}

#[test]
fn anonymous_prototype_expression() {
    assert_eq!(render("var p = prototype { var a = 1; };"), "(var p (prototype (a 1.0)))");
}

#[test]
fn const_declaration() {
    assert_eq!(render("const k = 3;"), "(const k 3.0)");
}

#[test]
fn while_is_desugared_into_for() {
    assert_eq!(
        render("while (x) x = x - 1;"),
        "(for _ x _ (; (= x (- x 1.0))))"
    );
}

#[test]
fn for_with_all_clauses() {
    assert_eq!(
        render("for (var i = 0; i < 3; i = i + 1) print(i);"),
        "(for (var i 0.0) (< i 3.0) (= i (+ i 1.0)) (; (call print i)))"
    );
    assert_eq!(render("for (;;) {}"), "(for _ _ _ (scope))");
}

#[test]
fn if_else_and_blocks() {
    assert_eq!(render("if (a) b; else { c; }"), "(if a (; b) (scope (; c)))");
    assert_eq!(render("if (a) return;"), "(if a (return _) _)");
}

#[test]
fn one_malformed_statement_yields_one_error() {
    let (statements, reporter) = parse("var = 1; print(1); print(2);");

    assert_eq!(statements.len(), 2);
    assert_eq!(reporter.count(Stage::Syntax), 1);
    assert_eq!(
        messages(&reporter),
        vec!["[line 1] Error at '=': Expected variable name."]
    );
}

#[test]
fn recovery_resumes_at_statement_keyword() {
    let (statements, reporter) = parse("print(1 +;\nvar ok = 2;\nfor (;;) {}");

    assert_eq!(reporter.count(Stage::Syntax), 1);
    assert_eq!(statements.len(), 2);
}

#[test]
fn errors_inside_blocks_keep_the_rest_of_the_block() {
    let (statements, reporter) = parse("{ var = 1; print(2); }");

    assert_eq!(reporter.count(Stage::Syntax), 1);
    assert_eq!(AstPrinter::print_program(&statements), "(scope (; (call print 2.0)))");
}

#[test]
fn missing_semicolon_reports_at_end() {
    let (_, reporter) = parse("print(1)");

    assert_eq!(
        messages(&reporter),
        vec!["[line 1] Error at end: Expected ';' after expression."]
    );
}

#[test]
fn invalid_assignment_target() {
    let (_, reporter) = parse("1 = 2;");

    assert_eq!(
        messages(&reporter),
        vec!["[line 1] Error at '=': Invalid assignment target."]
    );
}

#[test]
fn defaults_must_trail() {
    let (_, reporter) = parse("subroutine f(a = 1, b) {}");

    assert_eq!(
        messages(&reporter),
        vec!["[line 1] Error at 'b': Parameters with defaults must come last."]
    );
}

#[test]
fn const_requires_initializer() {
    let (_, reporter) = parse("const k;");

    assert_eq!(
        messages(&reporter),
        vec!["[line 1] Error at ';': Expected '=' after constant name."]
    );
}

#[test]
fn too_many_arguments() {
    let args: Vec<String> = (0..256).map(|i| i.to_string()).collect();
    let source: String = format!("f({});", args.join(", "));

    let (_, reporter) = parse(&source);

    assert_eq!(reporter.count(Stage::Syntax), 1);
    assert_eq!(
        reporter.diagnostics()[0].message,
        "Can't have more than 255 arguments."
    );
}

#[test]
fn exactly_255_arguments_is_fine() {
    let args: Vec<String> = (0..255).map(|i| i.to_string()).collect();
    let (statements, reporter) = parse(&format!("f({});", args.join(", ")));

    assert!(reporter.diagnostics().is_empty());
    assert_eq!(statements.len(), 1);
}

#[test]
fn prototype_body_rejects_other_statements() {
    let (statements, reporter) = parse("prototype P { print(1); }");

    assert_eq!(statements.len(), 1);
    assert_eq!(
        messages(&reporter),
        vec!["[line 1] Error at 'print': Expected 'var' or 'subroutine' in prototype body."]
    );
}

#[test]
fn malformed_member_keeps_the_rest_of_the_prototype() {
    let (statements, reporter) = parse("prototype P { oops; var y = 2; } print(1); print(2);");

    assert_eq!(statements.len(), 3);
    assert_eq!(reporter.count(Stage::Syntax), 1);
    assert_eq!(
        messages(&reporter),
        vec!["[line 1] Error at 'oops': Expected 'var' or 'subroutine' in prototype body."]
    );
    assert_eq!(
        AstPrinter::print_stmt(&statements[0]),
        "(var P (prototype (y 2.0)))"
    );
}

#[test]
fn bad_property_initializer_resumes_at_next_subroutine() {
    let (statements, reporter) =
        parse("var o = prototype { var a = ; subroutine m() { return 1; } }; print(1);");

    assert_eq!(statements.len(), 2);
    assert_eq!(
        messages(&reporter),
        vec!["[line 1] Error at ';': Expected expression."]
    );
    assert_eq!(
        AstPrinter::print_stmt(&statements[0]),
        "(var o (prototype (m (lambda () (return 1.0)))))"
    );
}

#[test]
fn member_recovery_skips_nested_braces() {
    let (statements, reporter) = parse("prototype P { var a = { var z = 1; }; var b = 1; }");

    assert_eq!(reporter.count(Stage::Syntax), 1);
    assert_eq!(
        AstPrinter::print_stmt(&statements[0]),
        "(var P (prototype (b 1.0)))"
    );
}

#[test]
fn visibility_labels_mark_members() {
    assert_eq!(
        render("prototype P { var a = 1; private: var s = 2; subroutine h() {} public: var b = 3; }"),
        "(var P (prototype (a 1.0) (private s 2.0) (private h (lambda ())) (b 3.0)))"
    );
}

#[test]
fn visibility_label_needs_a_colon() {
    let (statements, reporter) = parse("prototype P { private var s = 1; var t = 2; }");

    assert_eq!(
        messages(&reporter),
        vec!["[line 1] Error at 'var': Expected ':' after visibility label."]
    );
    assert_eq!(
        AstPrinter::print_stmt(&statements[0]),
        "(var P (prototype (private s 1.0) (private t 2.0)))"
    );
}

#[test]
fn parse_expression_requires_whole_input() {
    let mut reporter = ErrorReporter::new();
    let tokens = scan_tokens("1 + 2", 1, &mut reporter);
    let expr = Parser::new(tokens, &mut reporter).parse_expression();

    assert_eq!(expr.as_ref().map(AstPrinter::print).as_deref(), Some("(+ 1.0 2.0)"));

    let tokens = scan_tokens("1 2", 1, &mut reporter);
    let expr = Parser::new(tokens, &mut reporter).parse_expression();

    assert!(expr.is_none());
    assert_eq!(
        reporter.diagnostics()[0].message,
        "Expected end of expression."
    );
}

#[test]
fn parser_tolerates_missing_eof() {
    let mut reporter = ErrorReporter::new();
    let statements = Parser::new(Vec::new(), &mut reporter).parse();

    assert!(statements.is_empty());
    assert!(reporter.diagnostics().is_empty());
}
