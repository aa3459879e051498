//! Host-implemented globals: I/O, clocks, math, and numeric constants.

use std::io::{self, BufRead, Write};
use std::rc::Rc;

use chrono::Utc;
use log::{debug, info};

use crate::callable::{Arity, NativeFn, NativeFunction};
use crate::environment::Environment;
use crate::error::RuntimeErrorKind;
use crate::interpreter::Interpreter;
use crate::token::Token;
use crate::value::Value;

type NativeResult = Result<Value, RuntimeErrorKind>;

const NATIVES: &[(&str, Arity, NativeFn)] = &[
    ("print", Arity::exact(1), print),
    ("input", Arity::range(0, 1), input),
    ("time", Arity::exact(0), time),
    ("clock", Arity::exact(0), clock),
    ("min", Arity::exact(2), |_, a| binary(a, f64::min)),
    ("max", Arity::exact(2), |_, a| binary(a, f64::max)),
    ("pow", Arity::exact(2), |_, a| binary(a, f64::powf)),
    ("hypotenuse", Arity::range(2, 3), hypotenuse),
    ("arctan", Arity::range(1, 2), arctan),
    ("abs", Arity::exact(1), |_, a| unary(a, f64::abs)),
    ("round", Arity::exact(1), |_, a| unary(a, f64::round)),
    ("floor", Arity::exact(1), |_, a| unary(a, f64::floor)),
    ("ceil", Arity::exact(1), |_, a| unary(a, f64::ceil)),
    ("truncate", Arity::exact(1), |_, a| unary(a, f64::trunc)),
    ("exp", Arity::exact(1), |_, a| unary(a, f64::exp)),
    ("sqrt", Arity::exact(1), |_, a| unary(a, f64::sqrt)),
    ("cbrt", Arity::exact(1), |_, a| unary(a, f64::cbrt)),
    ("log", Arity::exact(1), |_, a| unary(a, f64::log10)),
    ("lg", Arity::exact(1), |_, a| unary(a, f64::log2)),
    ("ln", Arity::exact(1), |_, a| unary(a, f64::ln)),
    ("sin", Arity::exact(1), |_, a| unary(a, f64::sin)),
    ("cos", Arity::exact(1), |_, a| unary(a, f64::cos)),
    ("tan", Arity::exact(1), |_, a| unary(a, f64::tan)),
    ("sinh", Arity::exact(1), |_, a| unary(a, f64::sinh)),
    ("cosh", Arity::exact(1), |_, a| unary(a, f64::cosh)),
    ("tanh", Arity::exact(1), |_, a| unary(a, f64::tanh)),
    ("arcsin", Arity::exact(1), |_, a| unary(a, f64::asin)),
    ("arccos", Arity::exact(1), |_, a| unary(a, f64::acos)),
    ("arcsinh", Arity::exact(1), |_, a| unary(a, f64::asinh)),
    ("arccosh", Arity::exact(1), |_, a| unary(a, f64::acosh)),
    ("arctanh", Arity::exact(1), |_, a| unary(a, f64::atanh)),
    ("isnan", Arity::exact(1), |_, a| Ok(Value::Bool(number(a, 0)?.is_nan()))),
];

const CONSTANTS: &[(&str, f64)] = &[
    ("PI", std::f64::consts::PI),
    ("E_V", std::f64::consts::E),
    ("MIN_VALUE", f64::MIN_POSITIVE),
    ("MAX_VALUE", f64::MAX),
    ("NaN", f64::NAN),
];

/// Defines every native subroutine and constant in `globals`.
pub fn install(globals: &mut Environment) {
    for &(name, arity, func) in NATIVES {
        globals.define(
            Token::global(name),
            Value::Callable(Rc::new(NativeFunction::new(name, arity, func))),
        );
    }

    for &(name, value) in CONSTANTS {
        globals.define_constant(Token::global(name), Value::Number(value));
    }

    info!(
        "Installed {} natives and {} constants",
        NATIVES.len(),
        CONSTANTS.len()
    );
}

fn number(args: &[Value], index: usize) -> Result<f64, RuntimeErrorKind> {
    match args.get(index) {
        Some(Value::Number(n)) => Ok(*n),
        Some(other) => Err(RuntimeErrorKind::type_error(format!(
            "Expected a number but got {}.",
            other.type_name()
        ))),
        None => Err(RuntimeErrorKind::type_error("Missing numeric argument.")),
    }
}

fn unary(args: &[Value], op: fn(f64) -> f64) -> NativeResult {
    Ok(Value::Number(op(number(args, 0)?)))
}

fn binary(args: &[Value], op: fn(f64, f64) -> f64) -> NativeResult {
    Ok(Value::Number(op(number(args, 0)?, number(args, 1)?)))
}

fn host_error(err: io::Error) -> RuntimeErrorKind {
    RuntimeErrorKind::Native(err.to_string())
}

fn print(interpreter: &mut Interpreter, args: &[Value]) -> NativeResult {
    let value: &Value = args.first().unwrap_or(&Value::Nil);

    writeln!(interpreter.output(), "{}", value).map_err(host_error)?;

    Ok(Value::Nil)
}

/// Reads one line from stdin, without its terminator. `nil` at end of input.
fn input(interpreter: &mut Interpreter, args: &[Value]) -> NativeResult {
    if let Some(prompt) = args.first() {
        let out: &mut dyn Write = interpreter.output();
        write!(out, "{}", prompt).map_err(host_error)?;
        out.flush().map_err(host_error)?;
    }

    let mut line: String = String::new();
    let read: usize = io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(host_error)?;

    if read == 0 {
        debug!("input() reached end of stdin");
        return Ok(Value::Nil);
    }

    let trimmed: &str = line.trim_end_matches(['\n', '\r']);

    Ok(Value::Str(Rc::from(trimmed)))
}

/// Whole seconds since the Unix epoch.
fn time(_: &mut Interpreter, _: &[Value]) -> NativeResult {
    Ok(Value::Number(Utc::now().timestamp() as f64))
}

/// Fractional seconds since the Unix epoch.
fn clock(_: &mut Interpreter, _: &[Value]) -> NativeResult {
    Ok(Value::Number(
        Utc::now().timestamp_micros() as f64 / 1_000_000.0,
    ))
}

fn hypotenuse(_: &mut Interpreter, args: &[Value]) -> NativeResult {
    let a: f64 = number(args, 0)?;
    let b: f64 = number(args, 1)?;

    let result: f64 = if args.len() == 3 {
        let c: f64 = number(args, 2)?;
        (a * a + b * b + c * c).sqrt()
    } else {
        a.hypot(b)
    };

    Ok(Value::Number(result))
}

fn arctan(_: &mut Interpreter, args: &[Value]) -> NativeResult {
    let y: f64 = number(args, 0)?;

    let result: f64 = if args.len() == 2 {
        y.atan2(number(args, 1)?)
    } else {
        y.atan()
    };

    Ok(Value::Number(result))
}
