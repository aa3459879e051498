use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use pretty_assertions::assert_eq;

use wick::callable::Arity;
use wick::error::RuntimeErrorKind;
use wick::interpreter::{Interpreter, Options};
use wick::session::{RunReport, Session};
use wick::value::Value;

/// Program output sink that the test can read back after the run.
#[derive(Clone, Default)]
struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn session_with(options: Options) -> (Session, SharedBuffer) {
    let buffer = SharedBuffer::default();
    let session = Session::with_output(options, Box::new(buffer.clone()));

    (session, buffer)
}

struct Outcome {
    output: String,
    report: RunReport,
    messages: Vec<String>,
}

fn run_with(options: Options, source: &str) -> Outcome {
    let (mut session, buffer) = session_with(options);
    let report = session.run(source);

    Outcome {
        output: buffer.contents(),
        report,
        messages: session
            .reporter()
            .diagnostics()
            .iter()
            .map(|d| d.to_string())
            .collect(),
    }
}

fn run(source: &str) -> Outcome {
    run_with(Options::default(), source)
}

/// Runs a program that must finish without any diagnostics.
fn output_of(source: &str) -> String {
    let outcome = run(source);

    assert!(
        outcome.report.is_clean(),
        "unexpected diagnostics: {:?}",
        outcome.messages
    );

    outcome.output
}

// ───────────────────────────── basics ─────────────────────────────

#[test]
fn prints_primitive_values() {
    assert_eq!(
        output_of("print(7); print(\"a\"); print(true); print(nil); print(3.5);"),
        "7\na\ntrue\nnil\n3.5\n"
    );
}

#[test]
fn arithmetic_precedence_and_modulo() {
    assert_eq!(
        output_of("print(1 + 2 * 3); print((1 + 2) * 3); print(7 mod 3); print(7 % 4); print(-2 - 3);"),
        "7\n9\n1\n3\n-5\n"
    );
}

#[test]
fn string_concatenation_with_any_operand() {
    assert_eq!(
        output_of("print(\"n=\" + 1); print(1 + \"a\"); print(\"a\" + true);"),
        "n=1\n1a\natrue\n"
    );
}

#[test]
fn equality_and_comparison() {
    assert_eq!(
        output_of(
            "print(1 == 1); print(\"a\" == \"a\"); print(nil == false); print(2 >= 3); print(1 != 2);"
        ),
        "true\ntrue\nfalse\nfalse\ntrue\n"
    );
}

#[test]
fn logical_operators_yield_the_deciding_operand() {
    assert_eq!(
        output_of("print(nil or \"x\"); print(1 and 2); print(false and 1); print(nil or false);"),
        "x\n2\nfalse\nfalse\n"
    );
}

#[test]
fn ternary_picks_one_branch() {
    assert_eq!(
        output_of("print(true ? \"y\" : \"n\"); print(nil ? 1 : 0 ? 2 : 3);"),
        "y\n2\n"
    );
}

#[test]
fn skipped_operands_have_no_side_effects() {
    assert_eq!(
        output_of(
            "false and print(\"x\"); true or print(\"x\"); true ? 1 : print(\"x\"); false ? print(\"x\") : 2;"
        ),
        ""
    );
    assert_eq!(
        output_of("true and print(\"a\"); false or print(\"b\"); false ? 1 : print(\"c\");"),
        "a\nb\nc\n"
    );
}

#[test]
fn negative_zero_prints_as_zero() {
    assert_eq!(
        output_of("print(-0); print(0 * -1); print(-0.5); print(\"\" + -0);"),
        "0\n0\n-0.5\n0\n"
    );
}

#[test]
fn loops() {
    let source = "
var sum = 0;
for (var i = 0; i < 5; i = i + 1) sum = sum + i;
print(sum);
var n = 3;
while (n > 0) n = n - 1;
print(n);
";

    assert_eq!(output_of(source), "10\n0\n");
}

#[test]
fn block_shadowing() {
    let source = "
var a = 1;
{
  var a = 2;
  print(a);
}
print(a);
";

    assert_eq!(output_of(source), "2\n1\n");
}

// ──────────────────────────── runtime errors ─────────────────────────────

#[test]
fn division_by_zero_is_an_error() {
    for source in ["print(1 / 0);", "print(1 % 0);", "print(0 / 0);"] {
        let outcome = run(source);

        assert_eq!(outcome.output, "");
        assert_eq!(outcome.report.runtime, 1);
        assert_eq!(
            outcome.messages,
            vec!["[line 1] Runtime error: Division by zero."]
        );
    }
}

#[test]
fn runtime_error_aborts_only_its_statement() {
    let outcome = run("print(1);\nprint(nil + 1);\nprint(2);");

    assert_eq!(outcome.output, "1\n2\n");
    assert_eq!(outcome.report.runtime, 1);
    assert_eq!(outcome.report.exit_code(), 70);
    assert_eq!(
        outcome.messages,
        vec!["[line 2] Runtime error: Cannot add nil and number."]
    );
}

#[test]
fn runtime_error_reports_operator_line() {
    let outcome = run("var a = 1;\n\nprint(a - nil);");

    assert_eq!(
        outcome.messages,
        vec!["[line 3] Runtime error: Operands must be numbers, not number and nil."]
    );
}

#[test]
fn negating_a_string_is_a_type_error() {
    let outcome = run("print(-\"a\");");

    assert_eq!(
        outcome.messages,
        vec!["[line 1] Runtime error: Operand must be a number, not string."]
    );
}

#[test]
fn undefined_variable() {
    let outcome = run("print(nope);");

    assert_eq!(
        outcome.messages,
        vec!["[line 1] Runtime error: Undefined variable 'nope'."]
    );
}

#[test]
fn assigning_to_undeclared_global_fails() {
    let outcome = run("nope = 1;");

    assert_eq!(outcome.report.runtime, 1);
}

#[test]
fn constants_cannot_be_reassigned() {
    let outcome = run("const k = 1;\nk = 2;\nprint(k);\nPI = 3;");

    assert_eq!(outcome.output, "1\n");
    assert_eq!(
        outcome.messages,
        vec![
            "[line 2] Runtime error: Cannot assign to constant 'k'.",
            "[line 4] Runtime error: Cannot assign to constant 'PI'.",
        ]
    );
}

#[test]
fn local_constants_cannot_be_reassigned() {
    let outcome = run("{ const k = 1; k = 2; }");

    assert_eq!(
        outcome.messages,
        vec!["[line 1] Runtime error: Cannot assign to constant 'k'."]
    );
}

#[test]
fn calling_a_number_fails() {
    let outcome = run("var x = 1;\nx();");

    assert_eq!(
        outcome.messages,
        vec!["[line 2] Runtime error: Can only call subroutines and prototypes."]
    );
}

#[test]
fn properties_need_objects() {
    let outcome = run("var x = 1;\nprint(x.y);\nx.y = 2;");

    assert_eq!(
        outcome.messages,
        vec![
            "[line 2] Runtime error: Only objects have properties.",
            "[line 3] Runtime error: Only objects have properties.",
        ]
    );
}

#[test]
fn missing_property() {
    let outcome = run("prototype P {}\nprint(P.missing);");

    assert_eq!(
        outcome.messages,
        vec!["[line 2] Runtime error: Undefined property 'missing'."]
    );
}

// ─────────────────────────── static errors ───────────────────────────

#[test]
fn syntax_error_prevents_execution() {
    let outcome = run("print(1);\nvar = 2;");

    assert_eq!(outcome.output, "");
    assert_eq!(outcome.report.syntax, 1);
    assert!(!outcome.report.executed);
    assert_eq!(outcome.report.exit_code(), 65);
}

#[test]
fn lexical_error_prevents_execution() {
    let outcome = run("print(1); $");

    assert_eq!(outcome.output, "");
    assert_eq!(outcome.report.lexical, 1);
    assert_eq!(outcome.report.exit_code(), 65);
}

#[test]
fn top_level_return_is_a_static_error() {
    let outcome = run("print(1);\nreturn 1;");

    assert_eq!(outcome.output, "");
    assert_eq!(outcome.report.resolve, 1);
    assert_eq!(
        outcome.messages,
        vec!["[line 2] Error at 'return': Can't return from top-level code."]
    );
}

#[test]
fn this_outside_subroutine_is_a_static_error() {
    let outcome = run("print(this);");

    assert_eq!(outcome.report.exit_code(), 65);
    assert_eq!(
        outcome.messages,
        vec!["[line 1] Error at 'this': Can't use 'this' outside of a subroutine."]
    );
}

#[test]
fn clean_run_exits_zero() {
    let outcome = run("print(1);");

    assert!(outcome.report.executed);
    assert_eq!(outcome.report.exit_code(), 0);
}

// ─────────────────────────── subroutines ───────────────────────────

#[test]
fn recursion_through_globals() {
    let source = "
subroutine fib(n) {
  if (n < 2) return n;
  return fib(n - 1) + fib(n - 2);
}
print(fib(10));
";

    assert_eq!(output_of(source), "55\n");
}

#[test]
fn local_subroutine_sees_itself() {
    let source = "
{
  subroutine fact(n) { return n <= 1 ? 1 : n * fact(n - 1); }
  print(fact(5));
}
";

    assert_eq!(output_of(source), "120\n");
}

#[test]
fn mutual_recursion_between_globals() {
    let source = "
subroutine isEven(n) { if (n == 0) return true; return isOdd(n - 1); }
subroutine isOdd(n) { if (n == 0) return false; return isEven(n - 1); }
print(isEven(10));
";

    assert_eq!(output_of(source), "true\n");
}

#[test]
fn default_parameters() {
    let source = "
subroutine greet(name, greeting = \"hello\") { return greeting + \" \" + name; }
print(greet(\"bob\"));
print(greet(\"bob\", \"hi\"));
subroutine twice(a, b = a * 2) { return b; }
print(twice(3));
";

    assert_eq!(output_of(source), "hello bob\nhi bob\n6\n");
}

#[test]
fn arity_mismatch_does_not_run_the_body() {
    let source = "
var ran = false;
subroutine two(a, b) { ran = true; }
two(1);
print(ran);
two(1, 2, 3);
";

    let outcome = run(source);

    assert_eq!(outcome.output, "false\n");
    assert_eq!(outcome.report.runtime, 2);
    assert_eq!(
        outcome.messages[0],
        "[line 4] Runtime error: Expected 2 arguments but got 1."
    );
}

#[test]
fn arity_range_in_message() {
    let outcome = run("subroutine f(a, b = 1) {}\nf();");

    assert_eq!(
        outcome.messages,
        vec!["[line 2] Runtime error: Expected 1 to 2 arguments but got 0."]
    );
}

#[test]
fn return_from_inside_a_loop() {
    let source = "
subroutine first() {
  for (var i = 0; i < 10; i = i + 1) {
    if (i == 3) return i;
  }
  return -1;
}
print(first());
";

    assert_eq!(output_of(source), "3\n");
}

#[test]
fn subroutine_without_return_yields_nil() {
    assert_eq!(output_of("subroutine f() {} print(f());"), "nil\n");
}

#[test]
fn arrow_and_keyword_lambdas() {
    let source = "
var add = (a, b) -> a + b;
var sq = lambda (x) { return x * x; };
var apply = (f, v) -> f(v);
print(add(1, 2));
print(apply(sq, 4));
";

    assert_eq!(output_of(source), "3\n16\n");
}

#[test]
fn runaway_recursion_overflows_cleanly() {
    let options = Options { max_call_depth: 16 };
    let source = "
subroutine down(n) { return down(n + 1); }
down(0);
print(\"after\");
";

    let outcome = run_with(options, source);

    assert_eq!(outcome.output, "after\n");
    assert_eq!(outcome.report.runtime, 1);
    assert_eq!(
        outcome.messages,
        vec!["[line 2] Runtime error: Stack overflow: call depth exceeded 16."]
    );
}

// ──────────────────────────── closures ────────────────────────────

#[test]
fn closure_sees_later_assignment() {
    let source = "
{
  var x = 1;
  subroutine show() { print(x); }
  x = 2;
  show();
}
";

    assert_eq!(output_of(source), "2\n");
}

#[test]
fn closure_ignores_later_shadowing_declaration() {
    let source = "
var a = \"global\";
{
  subroutine showA() { print(a); }
  showA();
  var a = \"block\";
  showA();
}
";

    assert_eq!(output_of(source), "global\nglobal\n");
}

#[test]
fn counter_keeps_its_state() {
    let source = "
subroutine makeCounter() {
  var i = 0;
  subroutine count() { i = i + 1; print(i); }
  return count;
}
var counter = makeCounter();
counter();
counter();
var other = makeCounter();
other();
";

    assert_eq!(output_of(source), "1\n2\n1\n");
}

// ──────────────────────────── prototypes ────────────────────────────

#[test]
fn instance_properties_shadow_the_prototype() {
    let source = "
prototype P { var x = 1; }
var c = P();
print(c.x);
c.x = 2;
print(c.x);
print(P.x);
";

    assert_eq!(output_of(source), "1\n2\n1\n");
}

#[test]
fn constructor_and_methods() {
    let source = "
prototype Point {
  subroutine constructor(x, y) { this.x = x; this.y = y; }
  subroutine sum() { return this.x + this.y; }
}
var p = Point(3, 4);
print(p.sum());
print(p.x);
var m = p.sum;
print(m());
";

    assert_eq!(output_of(source), "7\n3\n7\n");
}

#[test]
fn inherited_methods_see_the_receiver() {
    let source = "
prototype Animal {
  var sound = \"...\";
  subroutine speak() { return this.name + \" says \" + this.sound; }
}
prototype Dog from Animal { var sound = \"woof\"; }
var rex = Dog();
rex.name = \"Rex\";
print(rex.speak());
";

    assert_eq!(output_of(source), "Rex says woof\n");
}

#[test]
fn constructing_without_constructor_takes_no_arguments() {
    let outcome = run("prototype P {}\nP(1);");

    assert_eq!(
        outcome.messages,
        vec!["[line 2] Runtime error: Expected 0 arguments but got 1."]
    );
}

#[test]
fn inheriting_from_a_number_fails() {
    let outcome = run("var n = 1;\nprototype P from n {}");

    assert_eq!(
        outcome.messages,
        vec!["[line 2] Runtime error: Can only inherit from prototypes, not number."]
    );
}

#[test]
fn private_members_are_visible_through_this() {
    let source = "
prototype Account {
  var owner = \"ann\";
  private:
  var balance = 10;
  subroutine audit() { return \"audited\"; }
  public:
  subroutine deposit(n) { this.balance = this.balance + n; return this.audit(); }
  subroutine total() { return this.balance; }
}
var a = Account();
print(a.deposit(5));
print(a.total());
print(Account.total());
print(a);
";

    assert_eq!(output_of(source), "audited\n15\n10\n{}\n");
}

#[test]
fn private_members_are_hidden_from_outside() {
    let source = "prototype Safe {
  private: var code = 1; subroutine open() {}
  public: subroutine peek(other) { return other.code; } subroutine mine() { return this.code; }
}
var s = Safe();
print(s.code);
s.code = 2;
s.open();
print(s.mine());
print(s.peek(s));";

    let outcome = run(source);

    assert_eq!(outcome.output, "1\n");
    assert_eq!(
        outcome.messages,
        vec![
            "[line 6] Runtime error: Property 'code' is private.",
            "[line 7] Runtime error: Property 'code' is private.",
            "[line 8] Runtime error: Property 'open' is private.",
            "[line 3] Runtime error: Property 'code' is private.",
        ]
    );
}

#[test]
fn bound_methods_compare_by_method_and_receiver() {
    let source = "
prototype P { subroutine m() { return 1; } }
var o = P();
var q = P();
var f = o.m;
print(o.m == o.m);
print(f == o.m);
print(o.m == q.m);
print(o.m == P.m);
q.n = o.m;
print(q.n == q.m);
subroutine make() { return () -> 1; }
print(make() == make());
print(make == make);
print(clock == clock);
";

    assert_eq!(
        output_of(source),
        "true\ntrue\nfalse\nfalse\ntrue\nfalse\ntrue\ntrue\n"
    );
}

// ─────────────────────────── display ───────────────────────────

#[test]
fn callables_and_objects_display() {
    let source = "
subroutine f() {}
print(f);
print(() -> 1);
print(lambda () {});
print(clock);
prototype O { var b = 2; var a = \"x\"; }
print(O);
";

    assert_eq!(
        output_of(source),
        "<subroutine f>\n<lambda>\n<lambda>\n<native clock>\n{a: x, b: 2}\n"
    );
}

// ─────────────────────────── natives ───────────────────────────

#[test]
fn math_natives() {
    assert_eq!(
        output_of(
            "print(max(1, 2)); print(min(1, 2)); print(pow(2, 10)); print(sqrt(16)); print(abs(-3)); print(floor(2.7)); print(hypotenuse(3, 4));"
        ),
        "2\n1\n1024\n4\n3\n2\n5\n"
    );
}

#[test]
fn native_type_errors() {
    let outcome = run("print(sqrt(\"x\"));");

    assert_eq!(
        outcome.messages,
        vec!["[line 1] Runtime error: Expected a number but got string."]
    );
}

#[test]
fn native_arity_is_checked() {
    let outcome = run("print(1, 2);");

    assert_eq!(
        outcome.messages,
        vec!["[line 1] Runtime error: Expected 1 arguments but got 2."]
    );
}

#[test]
fn clock_returns_a_number() {
    assert_eq!(output_of("print(clock() >= 0);"), "true\n");
}

fn double(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeErrorKind> {
    match args {
        [Value::Number(n)] => Ok(Value::Number(n * 2.0)),
        _ => Err(RuntimeErrorKind::type_error("double wants a number")),
    }
}

#[test]
fn host_defined_native() {
    let (mut session, buffer) = session_with(Options::default());
    session
        .interpreter()
        .define_native("double", Arity::exact(1), double);

    let report = session.run("print(double(21));");

    assert!(report.is_clean());
    assert_eq!(buffer.contents(), "42\n");
}

// ─────────────────────────── sessions ───────────────────────────

#[test]
fn evaluate_single_expression() {
    let (mut session, _) = session_with(Options::default());

    let (value, report) = session.evaluate("1 + 2 * 3");
    assert_eq!(value, Some(Value::Number(7.0)));
    assert!(report.is_clean());

    let (value, report) = session.evaluate("1 / 0");
    assert_eq!(value, None);
    assert_eq!(report.runtime, 1);
    assert_eq!(report.exit_code(), 70);
}

#[test]
fn globals_persist_across_runs() {
    let (mut session, buffer) = session_with(Options::default());

    assert!(session.run("var x = 40;").is_clean());
    assert!(session
        .run("subroutine add(a, b) { return a + b; }")
        .is_clean());
    assert!(session.run("print(add(x, 2));").is_clean());

    assert_eq!(buffer.contents(), "42\n");
}

#[test]
fn a_failed_run_does_not_poison_the_session() {
    let (mut session, buffer) = session_with(Options::default());

    assert_eq!(session.run("var = ;").exit_code(), 65);
    assert_eq!(session.run("print(undefinedThing);").exit_code(), 70);
    assert_eq!(session.run("print(\"ok\");").exit_code(), 0);

    assert_eq!(buffer.contents(), "ok\n");
}

#[test]
fn closures_from_earlier_runs_keep_their_resolutions() {
    let (mut session, buffer) = session_with(Options::default());

    assert!(session
        .run("subroutine make() { var n = 5; return () -> n; }\nvar g = make();")
        .is_clean());
    let after_first: usize = session.interpreter().resolution_count();
    assert!(after_first > 0);

    assert!(session.run("{ var t = 1; print(t); }").is_clean());
    assert!(session.run("print(g());").is_clean());

    assert!(session.interpreter().resolution_count() > after_first);
    assert_eq!(buffer.contents(), "1\n5\n");
}
